// End-to-end editing sessions against the headless host

#[path = "fixtures/sample_diagrams.rs"]
mod sample_diagrams;

use assert_matches::assert_matches;
use graph_style_editor::*;
use pretty_assertions::assert_eq;
use sample_diagrams::*;
use tempfile::TempDir;
use tiny_skia::Pixmap;

fn session_with(document: &str) -> Session<HeadlessHost> {
    let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());
    session.load(document).unwrap();
    session
}

fn edge_pairs(elements: &ElementSet) -> Vec<(String, String)> {
    let mut pairs: Vec<_> = elements
        .edges()
        .iter()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();
    pairs.sort();
    pairs
}

fn pair(source: &str, target: &str) -> (String, String) {
    (source.to_string(), target.to_string())
}

#[test]
fn test_delete_middle_of_chain() {
    let mut session = session_with(&chain_document());

    session
        .handle(Interaction::Tap(ElementRef::node("B")))
        .unwrap();
    let deletion = session.delete_selected().unwrap().unwrap();

    let report = match deletion {
        Deletion::Node(report) => report,
        other => panic!("expected a node deletion, got {:?}", other),
    };
    assert_eq!(report.node, "B");
    assert_eq!(report.removed_edges, vec!["AB".to_string(), "BC".to_string()]);
    assert_eq!(report.bypass_edges.len(), 1);

    let elements = session.elements().unwrap();
    assert!(!elements.contains_node("B"));
    assert!(elements.edges().iter().all(|e| !e.involves("B")));
    assert_eq!(edge_pairs(elements), vec![pair("A", "C")]);

    let bypass = elements.edge(&report.bypass_edges[0]).unwrap();
    assert_eq!(bypass.kind, EdgeKind::Bypass);
    assert!(bypass.id.starts_with('e'));

    // host and session agree, and nothing is left selected
    assert_eq!(&session.host().current_elements(), elements);
    assert_eq!(session.selection(), None);
    assert!(session.delete_selected().unwrap().is_none());

    assert_matches!(
        session.events().last().map(|e| &e.event),
        Some(EventType::NodeDeleted { id, .. }) if id == "B"
    );
}

#[test]
fn test_delete_fan_node_skips_existing_pairs() {
    let mut session = session_with(&fan_document());

    session
        .handle(Interaction::Tap(ElementRef::node("M")))
        .unwrap();
    let deletion = session.delete_selected().unwrap().unwrap();
    assert_matches!(&deletion, Deletion::Node(report) if report.bypass_edges.len() == 3);

    let elements = session.elements().unwrap();
    assert_eq!(
        edge_pairs(elements),
        vec![pair("X", "P"), pair("X", "Q"), pair("Y", "P"), pair("Y", "Q")]
    );
    // the pre-existing shortcut is untouched
    assert_eq!(elements.edge("XP").unwrap().kind, EdgeKind::Normal);
}

#[test]
fn test_delete_never_creates_self_loops() {
    let mut session = session_with(&round_trip_document());

    session
        .handle(Interaction::Tap(ElementRef::node("B")))
        .unwrap();
    session.delete_selected().unwrap();

    let elements = session.elements().unwrap();
    assert_eq!(elements.node_count(), 1);
    assert_eq!(elements.edge_count(), 0);
}

#[test]
fn test_delete_selected_edge() {
    let mut session = session_with(&chain_document());

    session
        .handle(Interaction::Tap(ElementRef::edge("BC")))
        .unwrap();
    assert_eq!(
        session.delete_selected().unwrap(),
        Some(Deletion::Edge("BC".to_string()))
    );

    let elements = session.elements().unwrap();
    assert_eq!(elements.node_count(), 3);
    assert_eq!(edge_pairs(elements), vec![pair("A", "B")]);
}

#[test]
fn test_export_after_load_round_trips() {
    let document = chain_document();
    let mut session = session_with(&document);
    let loaded_rules = parse_rules(&document);

    let html = session.export_document().unwrap().unwrap();

    let mut reloaded = Session::new(HeadlessHost::new(), EditorConfig::default());
    reloaded.load(&html).unwrap();

    assert_eq!(reloaded.elements(), session.elements());
    assert_eq!(
        reloaded.elements().unwrap().node("C").unwrap().position,
        Position::new(200.0, 50.0)
    );
    assert_eq!(
        reloaded.export_document().unwrap().unwrap(),
        html,
        "export is stable across reloads"
    );

    let exported = loader::parse_document(&html).unwrap();
    assert_eq!(exported.style, loaded_rules);
    assert!(exported.layout.is_preset());
}

#[test]
fn test_export_keeps_authored_stylesheet_and_flags() {
    let mut session = session_with(&authored_document());
    let a = ElementRef::node("A");

    assert_eq!(
        session.host().resolved_style_value(&a, "background-color"),
        Some(StyleValue::from("#0f0"))
    );
    assert_eq!(
        session.host().resolved_style_value(&a, "border-width"),
        Some(StyleValue::Number(3.0))
    );

    let html = session.export_document().unwrap().unwrap();
    let exported = loader::parse_document(&html).unwrap();

    let selectors: Vec<String> = exported.style.iter().map(|r| r.selector.to_string()).collect();
    assert_eq!(selectors, vec!["edge", ".hot", "node"]);

    let node_rule = &exported.style[2].style;
    let names: Vec<&str> = node_rule.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["background-color", "label"]);
    assert_eq!(node_rule["background-color"], StyleValue::from("#0f0"));
    assert_eq!(node_rule["label"], StyleValue::from("data(id)"));

    assert_eq!(
        exported.style[0].style["line-dash-pattern"],
        StyleValue::Other(serde_json::json!([6, 3]))
    );

    let node = &exported.nodes[0];
    assert_eq!(node.extra["locked"], serde_json::json!(true));
    assert_eq!(node.extra["grabbable"], serde_json::json!(false));
    assert_eq!(exported.edges[0].extra["selectable"], serde_json::json!(false));

    // the merged sheet is already stable
    let mut reloaded = Session::new(HeadlessHost::new(), EditorConfig::default());
    reloaded.load(&html).unwrap();
    assert_eq!(reloaded.export_document().unwrap().unwrap(), html);
}

fn parse_rules(document: &str) -> Vec<StyleRule> {
    loader::parse_document(document).unwrap().style
}

#[test]
fn test_export_drops_highlight_but_keeps_element_rules() {
    let mut session = session_with(&chain_document());

    session
        .handle(Interaction::Tap(ElementRef::node("A")))
        .unwrap();
    let index = session.current_rule().unwrap();
    session.set_property(index, "shape", "diamond").unwrap();

    let html = session.export_document().unwrap().unwrap();
    assert!(!html.contains("active-node"));
    assert!(!html.contains("active-edge"));
    assert_eq!(session.selection(), None);

    let exported = loader::parse_document(&html).unwrap();
    assert_eq!(exported.style.len(), 3);
    assert_eq!(exported.style[2].selector.to_string(), "node#A");
    assert_eq!(exported.style[2].style["shape"], StyleValue::from("diamond"));
    assert!(exported.nodes.iter().all(|n| n.classes.is_empty()));
}

#[test]
fn test_image_export_is_padded() {
    let mut session = session_with(&chain_document());

    let raw = session.host().rasterize(2.0, "#ffffff").unwrap();
    let raw = Pixmap::decode_png(&raw).unwrap();
    let padded = session.export_image().unwrap().unwrap();
    let padded = Pixmap::decode_png(&padded).unwrap();

    assert_eq!(padded.width(), raw.width() + 500);
    assert_eq!(padded.height(), raw.height() + 500);

    let corner = padded.pixel(0, 0).unwrap();
    assert_eq!((corner.red(), corner.green(), corner.blue()), (255, 255, 255));
}

#[test]
fn test_failed_load_keeps_previous_diagram() {
    let mut session = session_with(&chain_document());
    session
        .handle(Interaction::Tap(ElementRef::node("A")))
        .unwrap();
    let before = session.elements().cloned();
    let rules_before = session.rules().map(<[StyleRule]>::to_vec);

    let err = session.load("<html>no diagram here</html>").unwrap_err();
    assert_matches!(err, LoadError::ConfigNotFound);
    assert_eq!(err.user_message(), LOAD_FAILURE_MESSAGE);

    let err = session.load(&dangling_document()).unwrap_err();
    assert_matches!(err, LoadError::Invalid(message) if message.contains("AZ"));

    assert_eq!(session.elements().cloned(), before);
    assert_eq!(session.rules().map(<[StyleRule]>::to_vec), rules_before);
    assert_eq!(session.selection(), Some(&ElementRef::node("A")));
    assert!(session.host().is_constructed());
    assert_eq!(session.host().stats().constructed, 1);
    assert_eq!(session.host().stats().destroyed, 0);
}

#[test]
fn test_snap_while_shift_is_held() {
    let mut session = session_with(&chain_document());
    let drag = |x, y| Interaction::Drag {
        node: "B".to_string(),
        position: Position::new(x, y),
    };

    assert_matches!(
        session.handle(drag(107.0, 63.0)).unwrap(),
        InteractionOutcome::Moved { snapped: false, .. }
    );
    assert_eq!(
        session.elements().unwrap().node("B").unwrap().position,
        Position::new(107.0, 63.0)
    );

    assert_eq!(
        session.handle(Interaction::KeyDown(Key::Shift)).unwrap(),
        InteractionOutcome::Modifier { active: true }
    );
    session.handle(drag(107.0, 63.0)).unwrap();
    assert_eq!(
        session.elements().unwrap().node("B").unwrap().position,
        Position::new(100.0, 75.0)
    );
    assert_eq!(
        session.host().current_elements().node("B").unwrap().position,
        Position::new(100.0, 75.0)
    );

    session.handle(Interaction::KeyDown(Key::from_name("a"))).unwrap();
    session.handle(Interaction::KeyUp(Key::Shift)).unwrap();
    session.handle(drag(12.0, 13.0)).unwrap();
    assert_eq!(
        session.elements().unwrap().node("B").unwrap().position,
        Position::new(12.0, 13.0)
    );

    assert_eq!(
        session
            .handle(Interaction::Drag {
                node: "AB".to_string(),
                position: Position::default(),
            })
            .unwrap(),
        InteractionOutcome::Ignored
    );
}

#[test]
fn test_reload_does_not_duplicate_handlers_or_highlight_rules() {
    let document = chain_document();
    let mut session = session_with(&document);
    let rule_count = session.rules().unwrap().len();

    assert_eq!(session.attach_handlers(), 0);
    assert_eq!(session.handlers().len(), 2);

    session.load(&document).unwrap();
    assert_eq!(session.handlers().len(), 2);
    assert_eq!(session.rules().unwrap().len(), rule_count);
    assert_eq!(session.host().stats().constructed, 2);
    assert_eq!(session.host().stats().destroyed, 1);

    // a document that already carries the highlight rules keeps them once
    let with_highlight = sample_diagrams::document(
        "[]",
        "[{ selector: 'node.active-node', style: { 'border-width': 1 } }]",
    );
    session.load(&with_highlight).unwrap();
    let selectors: Vec<String> = session
        .rules()
        .unwrap()
        .iter()
        .map(|r| r.selector.to_string())
        .collect();
    assert_eq!(selectors, vec!["node.active-node", "edge.active-edge"]);
}

#[test]
fn test_element_rule_is_resolved_once() {
    let mut session = session_with(&chain_document());

    let first = session.resolve_element_rule(ElementKind::Edge, "AB").unwrap();
    let count = session.rules().unwrap().len();
    let second = session.resolve_element_rule(ElementKind::Edge, "AB").unwrap();

    assert_eq!(first, second);
    assert_eq!(session.rules().unwrap().len(), count);
    assert_eq!(
        session.rules().unwrap()[first].style["width"],
        StyleValue::Number(2.0)
    );
}

#[test]
fn test_save_artifacts() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = session_with(&chain_document());

    let html_path = session.save_document(temp_dir.path()).unwrap().unwrap();
    let png_path = session.save_image(temp_dir.path()).unwrap().unwrap();

    assert!(html_path.ends_with("edited_scheme.html"));
    assert!(png_path.ends_with("scheme.png"));

    let html = std::fs::read_to_string(&html_path).unwrap();
    assert!(loader::parse_document(&html).is_ok());
    assert!(Pixmap::decode_png(&std::fs::read(&png_path).unwrap()).is_ok());

    let kinds: Vec<_> = session
        .events()
        .iter()
        .map(|e| std::mem::discriminant(&e.event))
        .collect();
    assert!(kinds.contains(&std::mem::discriminant(&EventType::DocumentExported { bytes: 0 })));
    assert!(kinds.contains(&std::mem::discriminant(&EventType::ImageExported { bytes: 0 })));
}
