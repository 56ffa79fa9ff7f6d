//! The editing session: the single owner of everything that changes while a
//! diagram is open.
//!
//! A session holds at most one loaded diagram. Loading parses and validates
//! the new document before anything is torn down, so a rejected document
//! leaves the current diagram in place.

use crate::catalog::{self, PropertySpec};
use crate::config::EditorConfig;
use crate::error::{LoadError, StyleError};
use crate::export;
use crate::loader::{parse_document, Layout};
use crate::snap::{GridSnap, Key};
use crate::validation::{ValidationIssue, Validator};
use crate::{
    DeletionReport, ElementKind, ElementRef, ElementSet, EventType, GraphEvent, Position,
    PropertyChange, RenderHost, Selector, StyleRule, StyleSheet, StyleValue,
};
use anyhow::{anyhow, Result};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Event handlers the session wires to a loaded diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Handler {
    /// Tap to select an element and edit its own rule
    ElementEditing,
    /// Modifier-gated grid snapping of dragged nodes
    SnapToGrid,
}

/// User input forwarded by the host
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Tap(ElementRef),
    Drag { node: String, position: Position },
    KeyDown(Key),
    KeyUp(Key),
    /// Middle click on the canvas
    CenterView,
}

/// What an interaction did
#[derive(Debug, Clone, PartialEq)]
pub enum InteractionOutcome {
    Ignored,
    Selected { element: ElementRef, rule: usize },
    Moved {
        node: String,
        position: Position,
        snapped: bool,
    },
    Modifier { active: bool },
    Centered,
}

/// Result of a successful load
#[derive(Debug, Clone)]
pub struct LoadSummary {
    pub nodes: usize,
    pub edges: usize,
    /// Rules in the stylesheet, injected highlight rules included
    pub rules: usize,
    /// Non-fatal validation findings
    pub warnings: Vec<ValidationIssue>,
}

/// What a delete action removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deletion {
    Node(DeletionReport),
    Edge(String),
}

/// One editable property of a rule, as a control panel would show it
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyField {
    pub spec: &'static PropertySpec,
    /// Value set by the rule itself, if any
    pub value: Option<StyleValue>,
}

#[derive(Debug)]
struct LiveDiagram {
    elements: ElementSet,
    style: StyleSheet,
    layout: Layout,
}

/// An editing session bound to a rendering host
pub struct Session<H: RenderHost> {
    config: EditorConfig,
    host: H,
    diagram: Option<LiveDiagram>,
    selection: Option<ElementRef>,
    /// Rule shown in the style editor
    current_rule: Option<usize>,
    snap: GridSnap,
    handlers: BTreeSet<Handler>,
    events: Vec<GraphEvent>,
}

impl<H: RenderHost> Session<H> {
    pub fn new(host: H, config: EditorConfig) -> Self {
        let snap = GridSnap::new(config.grid_size, config.snap_modifier.clone());
        Self {
            config,
            host,
            diagram: None,
            selection: None,
            current_rule: None,
            snap,
            handlers: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    // ========== Lifecycle ==========

    /// Load a diagram document, replacing the current diagram.
    ///
    /// Parsing and validation happen first; on failure nothing changes.
    pub fn load(&mut self, text: &str) -> Result<LoadSummary, LoadError> {
        let (elements, style, layout, warnings) = match prepare(text) {
            Ok(prepared) => prepared,
            Err(err) => {
                warn!(error = %err, "diagram load failed");
                return Err(err);
            }
        };

        self.teardown();

        self.host
            .construct(&elements, style.rules(), &layout)
            .map_err(|err| LoadError::Host(format!("{:#}", err)))?;

        let elements = self.host.current_elements();
        let mut style = style;
        self.attach_handlers();
        if style.ensure_highlight_rules(&self.config.highlight) {
            debug!("injected selection highlight rules");
        }
        self.host.apply_style(style.rules());

        let summary = LoadSummary {
            nodes: elements.node_count(),
            edges: elements.edge_count(),
            rules: style.len(),
            warnings,
        };
        self.current_rule = if style.is_empty() { None } else { Some(0) };
        self.diagram = Some(LiveDiagram {
            elements,
            style,
            layout,
        });

        info!(
            nodes = summary.nodes,
            edges = summary.edges,
            rules = summary.rules,
            "diagram loaded"
        );
        self.record(EventType::DiagramLoaded {
            nodes: summary.nodes,
            edges: summary.edges,
            rules: summary.rules,
        });
        Ok(summary)
    }

    /// Attach the interaction handlers; already attached ones are kept as is.
    ///
    /// Returns how many handlers were newly attached.
    pub fn attach_handlers(&mut self) -> usize {
        [Handler::ElementEditing, Handler::SnapToGrid]
            .into_iter()
            .filter(|handler| self.handlers.insert(*handler))
            .count()
    }

    /// Destroy the host instance and drop the diagram
    pub fn teardown(&mut self) {
        self.host.destroy();
        self.handlers.clear();
        self.selection = None;
        self.current_rule = None;
        if self.diagram.take().is_some() {
            debug!("diagram torn down");
            self.record(EventType::DiagramTornDown);
        }
    }

    // ========== Interaction ==========

    /// Dispatch one user interaction
    pub fn handle(&mut self, interaction: Interaction) -> Result<InteractionOutcome> {
        match interaction {
            Interaction::Tap(element) => self.select(element),
            Interaction::Drag { node, position } => self.drag(node, position),
            Interaction::KeyDown(key) => {
                self.snap.key_down(&key);
                Ok(InteractionOutcome::Modifier {
                    active: self.snap.is_active(),
                })
            }
            Interaction::KeyUp(key) => {
                self.snap.key_up(&key);
                Ok(InteractionOutcome::Modifier {
                    active: self.snap.is_active(),
                })
            }
            Interaction::CenterView => {
                if self.diagram.is_none() {
                    return Ok(InteractionOutcome::Ignored);
                }
                self.host.fit();
                Ok(InteractionOutcome::Centered)
            }
        }
    }

    fn select(&mut self, element: ElementRef) -> Result<InteractionOutcome> {
        if !self.handlers.contains(&Handler::ElementEditing) {
            return Ok(InteractionOutcome::Ignored);
        }
        let Some(diagram) = self.diagram.as_mut() else {
            return Ok(InteractionOutcome::Ignored);
        };
        if diagram.elements.element(&element).is_none() {
            warn!(element = %element, "tap on unknown element");
            return Ok(InteractionOutcome::Ignored);
        }

        clear_highlight(&mut diagram.elements);
        self.host.sync_elements(&diagram.elements);

        let rule = self
            .resolve_element_rule(element.kind, &element.id)
            .ok_or_else(|| anyhow!("Element not found: {}", element))?;

        let diagram = self
            .diagram
            .as_mut()
            .ok_or_else(|| anyhow!("No diagram loaded"))?;
        diagram
            .elements
            .add_class(&element, element.kind.active_class())?;
        self.host.sync_elements(&diagram.elements);

        self.selection = Some(element.clone());
        self.current_rule = Some(rule);
        debug!(element = %element, rule, "element selected");
        self.record(EventType::ElementSelected {
            element: element.clone(),
        });
        Ok(InteractionOutcome::Selected { element, rule })
    }

    fn drag(&mut self, node: String, position: Position) -> Result<InteractionOutcome> {
        let Some(diagram) = self.diagram.as_mut() else {
            return Ok(InteractionOutcome::Ignored);
        };
        if !diagram.elements.contains_node(&node) {
            return Ok(InteractionOutcome::Ignored);
        }

        let snapped = self.handlers.contains(&Handler::SnapToGrid) && self.snap.is_active();
        let position = if snapped {
            self.snap.apply(position)
        } else {
            position
        };

        diagram.elements.set_position(&node, position)?;
        self.host.set_position(&node, position)?;

        self.record(EventType::NodeMoved {
            id: node.clone(),
            position,
            snapped,
        });
        Ok(InteractionOutcome::Moved {
            node,
            position,
            snapped,
        })
    }

    // ========== Style Editing ==========

    /// Index of the rule that targets exactly one element, creating it from
    /// the element's currently effective style if it does not exist yet.
    ///
    /// Returns `None` when no diagram is loaded or the element is unknown.
    pub fn resolve_element_rule(&mut self, kind: ElementKind, id: &str) -> Option<usize> {
        let diagram = self.diagram.as_mut()?;
        let element = ElementRef {
            kind,
            id: id.to_string(),
        };
        diagram.elements.element(&element)?;

        let selector = Selector::element(kind, id);
        if let Some(index) = diagram.style.find_rule_index(&selector) {
            return Some(index);
        }

        let selector_text = selector.to_string();
        let mut rule = StyleRule::new(selector);
        for spec in catalog::properties(kind) {
            if let Some(value) = self.host.resolved_style_value(&element, spec.name) {
                rule.style.insert(spec.name.to_string(), value);
            }
        }

        let index = diagram.style.append(rule);
        self.host.apply_style(diagram.style.rules());

        debug!(selector = %selector_text, index, "created element rule");
        self.events.push(GraphEvent::new(EventType::RuleAppended {
            index,
            selector: selector_text,
        }));
        Some(index)
    }

    /// Edit one property of rule `index` and restyle.
    ///
    /// Returns `Ok(None)` when no diagram is loaded.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not name an existing rule.
    pub fn set_property(
        &mut self,
        index: usize,
        property: &str,
        raw: &str,
    ) -> Result<Option<PropertyChange>, StyleError> {
        let Some(diagram) = self.diagram.as_mut() else {
            return Ok(None);
        };

        let change = match diagram.style.set_property(index, property, raw) {
            Ok(change) => change,
            Err(err) => {
                warn!(error = %err, index, "style edit refused");
                return Err(err);
            }
        };
        self.host.apply_style(diagram.style.rules());

        let value = match &change {
            PropertyChange::Set(value) => Some(value.clone()),
            PropertyChange::Cleared => None,
        };
        debug!(index, property, ?value, "style property changed");
        self.record(EventType::PropertyChanged {
            index,
            property: property.to_string(),
            value,
        });
        Ok(Some(change))
    }

    /// Add an empty rule for user-supplied selector text and make it current.
    ///
    /// An existing selector is not duplicated; its index is returned instead.
    pub fn add_selector(&mut self, text: &str) -> Option<usize> {
        let diagram = self.diagram.as_mut()?;

        let before = diagram.style.len();
        let index = diagram.style.add_selector(text);
        let appended = diagram.style.len() > before;
        if appended {
            self.host.apply_style(diagram.style.rules());
        }

        self.current_rule = Some(index);
        if appended {
            self.record(EventType::RuleAppended {
                index,
                selector: text.to_string(),
            });
        }
        Some(index)
    }

    /// Catalog properties of rule `index` with the values the rule sets
    pub fn property_fields(&self, index: usize) -> Option<Vec<PropertyField>> {
        let rule = self.diagram.as_ref()?.style.get(index)?;
        let fields = catalog::properties(rule.selector.kind_hint())
            .iter()
            .map(|spec| PropertyField {
                spec,
                value: rule.style.get(spec.name).cloned(),
            })
            .collect();
        Some(fields)
    }

    // ========== Topology Editing ==========

    /// Delete the selected element. A node is deleted with rewiring.
    ///
    /// Returns `Ok(None)` when nothing is selected.
    pub fn delete_selected(&mut self) -> Result<Option<Deletion>> {
        let Some(diagram) = self.diagram.as_mut() else {
            return Ok(None);
        };
        let Some(selected) = self.selection.take() else {
            return Ok(None);
        };

        clear_highlight(&mut diagram.elements);
        let deletion = match selected.kind {
            ElementKind::Node => Deletion::Node(diagram.elements.delete_node(&selected.id)?),
            ElementKind::Edge => {
                let edge = diagram.elements.delete_edge(&selected.id)?;
                Deletion::Edge(edge.id)
            }
        };

        self.host.sync_elements(&diagram.elements);
        diagram.elements = self.host.current_elements();

        let event = match &deletion {
            Deletion::Node(report) => {
                info!(
                    node = %report.node,
                    removed = report.removed_edges.len(),
                    bypassed = report.bypass_edges.len(),
                    "node deleted"
                );
                EventType::NodeDeleted {
                    id: report.node.clone(),
                    removed_edges: report.removed_edges.clone(),
                    bypass_edges: report.bypass_edges.clone(),
                }
            }
            Deletion::Edge(id) => {
                info!(edge = %id, "edge deleted");
                EventType::EdgeDeleted { id: id.clone() }
            }
        };
        self.record(event);
        Ok(Some(deletion))
    }

    // ========== Export ==========

    /// Render the diagram as a standalone document.
    ///
    /// Clears the selection first. Returns `Ok(None)` when no diagram is loaded.
    pub fn export_document(&mut self) -> Result<Option<String>> {
        let Some(diagram) = self.diagram.as_mut() else {
            return Ok(None);
        };

        if clear_highlight(&mut diagram.elements) > 0 {
            self.host.sync_elements(&diagram.elements);
        }
        self.selection = None;

        let html = export::render_document(
            &diagram.elements,
            &diagram.style.exported_rules(),
            &self.config.export,
        )?;

        info!(bytes = html.len(), "document exported");
        self.record(EventType::DocumentExported { bytes: html.len() });
        Ok(Some(html))
    }

    /// Rasterize the full diagram and pad it. Returns `Ok(None)` when no
    /// diagram is loaded.
    pub fn export_image(&mut self) -> Result<Option<Vec<u8>>> {
        if self.diagram.is_none() {
            return Ok(None);
        }

        let settings = &self.config.export;
        let raw = self
            .host
            .rasterize(settings.scale, &settings.background)?;
        let png = export::pad_png(&raw, settings.padding_px(), &settings.background)?;

        info!(bytes = png.len(), "image exported");
        self.record(EventType::ImageExported { bytes: png.len() });
        Ok(Some(png))
    }

    /// Export the document into `dir` under the configured file name
    pub fn save_document(&mut self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(html) = self.export_document()? else {
            return Ok(None);
        };
        let path = dir.join(&self.config.export.document_file_name);
        export::write_document(&path, &html)?;
        Ok(Some(path))
    }

    /// Export the image into `dir` under the configured file name
    pub fn save_image(&mut self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(png) = self.export_image()? else {
            return Ok(None);
        };
        let path = dir.join(&self.config.export.image_file_name);
        export::write_image(&path, &png)?;
        Ok(Some(path))
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_loaded(&self) -> bool {
        self.diagram.is_some()
    }

    pub fn elements(&self) -> Option<&ElementSet> {
        self.diagram.as_ref().map(|d| &d.elements)
    }

    /// Full stylesheet as applied to the host
    pub fn rules(&self) -> Option<&[StyleRule]> {
        self.diagram.as_ref().map(|d| d.style.rules())
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.diagram.as_ref().map(|d| &d.layout)
    }

    pub fn selection(&self) -> Option<&ElementRef> {
        self.selection.as_ref()
    }

    pub fn current_rule(&self) -> Option<usize> {
        self.current_rule
    }

    pub fn handlers(&self) -> &BTreeSet<Handler> {
        &self.handlers
    }

    pub fn snap(&self) -> &GridSnap {
        &self.snap
    }

    /// Edit log, oldest first
    pub fn events(&self) -> &[GraphEvent] {
        &self.events
    }

    fn record(&mut self, event: EventType) {
        self.events.push(GraphEvent::new(event));
    }
}

type Prepared = (ElementSet, StyleSheet, Layout, Vec<ValidationIssue>);

/// Parse, validate and build a diagram without touching any session state
fn prepare(text: &str) -> Result<Prepared, LoadError> {
    let source = parse_document(text)?;

    let validation = Validator::validate(&source.nodes, &source.edges, &source.style);
    if validation.has_errors() {
        return Err(LoadError::Invalid(validation.error_summary()));
    }
    for issue in &validation.issues {
        debug!(severity = ?issue.severity, "{}", issue.message);
    }

    let elements = ElementSet::from_parts(source.nodes, source.edges)
        .map_err(|err| LoadError::Invalid(err.to_string()))?;
    let style = StyleSheet::new(source.style);
    let warnings = validation.issues;

    Ok((elements, style, source.layout, warnings))
}

/// Remove selection classes from every element; returns how many were cleared
fn clear_highlight(elements: &mut ElementSet) -> usize {
    [ElementKind::Node, ElementKind::Edge]
        .into_iter()
        .map(|kind| elements.clear_class(kind, kind.active_class()))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HeadlessHost;
    use assert_matches::assert_matches;

    const DIAGRAM: &str = r#"
        <script>
          cytoscape({
            container: document.getElementById('cy'),
            elements: [
              { data: { id: 'a' }, position: { x: 0, y: 0 } },
              { data: { id: 'b' }, position: { x: 100, y: 0 } },
              { data: { id: 'ab', source: 'a', target: 'b' } },
            ],
            style: [
              { selector: 'node', style: { 'background-color': '#336699' } },
              { selector: 'edge', style: { 'line-style': 'wavy' } },
            ],
            layout: { name: 'preset' },
          });
        </script>"#;

    fn loaded() -> Session<HeadlessHost> {
        let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());
        session.load(DIAGRAM).unwrap();
        session
    }

    #[test]
    fn test_load_summary() {
        let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());
        let summary = session.load(DIAGRAM).unwrap();

        assert_eq!(summary.nodes, 2);
        assert_eq!(summary.edges, 1);
        assert_eq!(summary.rules, 4);
        assert_eq!(summary.warnings.len(), 1);
        assert_eq!(session.current_rule(), Some(0));
        assert!(session.layout().unwrap().is_preset());
        assert_eq!(session.host().applied_rules().len(), 4);
    }

    #[test]
    fn test_operations_without_diagram_are_noops() {
        let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());

        assert_eq!(
            session.handle(Interaction::Tap(ElementRef::node("a"))).unwrap(),
            InteractionOutcome::Ignored
        );
        assert_eq!(
            session.handle(Interaction::CenterView).unwrap(),
            InteractionOutcome::Ignored
        );
        assert_eq!(session.set_property(0, "label", "x"), Ok(None));
        assert_eq!(session.add_selector("node"), None);
        assert!(session.delete_selected().unwrap().is_none());
        assert!(session.export_document().unwrap().is_none());
        assert!(session.export_image().unwrap().is_none());
        assert!(session.events().is_empty());
    }

    #[test]
    fn test_tap_moves_highlight() {
        let mut session = loaded();

        let outcome = session
            .handle(Interaction::Tap(ElementRef::node("a")))
            .unwrap();
        assert_matches!(outcome, InteractionOutcome::Selected { rule: 4, .. });
        assert!(session.elements().unwrap().node("a").unwrap().has_class("active-node"));

        session
            .handle(Interaction::Tap(ElementRef::edge("ab")))
            .unwrap();
        let elements = session.elements().unwrap();
        assert!(!elements.node("a").unwrap().has_class("active-node"));
        assert!(elements.edge("ab").unwrap().has_class("active-edge"));
        assert_eq!(session.selection(), Some(&ElementRef::edge("ab")));
        assert_eq!(session.current_rule(), Some(5));

        // the host sees the same classes
        assert!(session
            .host()
            .current_elements()
            .edge("ab")
            .unwrap()
            .has_class("active-edge"));
    }

    #[test]
    fn test_element_rule_copies_effective_style() {
        let mut session = loaded();
        let index = session.resolve_element_rule(ElementKind::Node, "b").unwrap();

        let rule = &session.rules().unwrap()[index];
        assert_eq!(rule.selector.to_string(), "node#b");
        assert_eq!(rule.style["background-color"], StyleValue::from("#336699"));
        assert_eq!(rule.style["shape"], StyleValue::from("ellipse"));
        assert_eq!(rule.style.len(), catalog::properties(ElementKind::Node).len());

        assert_eq!(session.resolve_element_rule(ElementKind::Node, "b"), Some(index));
        assert_eq!(session.resolve_element_rule(ElementKind::Node, "zz"), None);
    }

    #[test]
    fn test_element_rule_sees_kindless_and_grouped_selectors() {
        let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());
        session
            .load(
                r#"cytoscape({
                  elements: [ { data: { id: 'a' }, classes: 'hot' }, { data: { id: 'b' } } ],
                  style: [
                    { selector: 'node', style: { 'background-color': '#336699' } },
                    { selector: '.hot', style: { 'background-color': '#ff0000' } },
                    { selector: 'node, edge', style: { 'border-width': 4 } },
                    { selector: '#a', style: { label: 'A' } },
                    { selector: '*', style: { 'border-color': '#123456' } },
                  ],
                })"#,
            )
            .unwrap();

        let index = session.resolve_element_rule(ElementKind::Node, "a").unwrap();
        let rule = &session.rules().unwrap()[index];
        assert_eq!(rule.style["background-color"], StyleValue::from("#ff0000"));
        assert_eq!(rule.style["border-width"], StyleValue::Number(4.0));
        assert_eq!(rule.style["label"], StyleValue::from("A"));
        assert_eq!(rule.style["border-color"], StyleValue::from("#123456"));

        let index = session.resolve_element_rule(ElementKind::Node, "b").unwrap();
        let rule = &session.rules().unwrap()[index];
        assert_eq!(rule.style["background-color"], StyleValue::from("#336699"));
        assert_eq!(rule.style["label"], StyleValue::from(""));
    }

    #[test]
    fn test_set_property_restyles_host() {
        let mut session = loaded();
        let index = session.resolve_element_rule(ElementKind::Node, "a").unwrap();

        let change = session.set_property(index, "border-width", "3.5").unwrap();
        assert_eq!(change, Some(PropertyChange::Set(StyleValue::Number(3.5))));
        assert_eq!(
            session
                .host()
                .resolved_style_value(&ElementRef::node("a"), "border-width"),
            Some(StyleValue::Number(3.5))
        );

        assert_matches!(
            session.set_property(index, "shape", "blob"),
            Err(StyleError::InvalidChoice { .. })
        );
    }

    #[test]
    fn test_property_fields() {
        let mut session = loaded();
        let fields = session.property_fields(1).unwrap();

        assert_eq!(fields.len(), 6);
        assert_eq!(fields[1].spec.name, "line-style");
        assert_eq!(fields[1].value, Some(StyleValue::from("wavy")));
        assert_eq!(fields[0].value, None);
        assert!(session.property_fields(99).is_none());

        let index = session.add_selector("edge:selected").unwrap();
        assert_eq!(session.current_rule(), Some(index));
        assert_eq!(session.add_selector("edge:selected"), Some(index));
    }

    #[test]
    fn test_center_view_fits_host() {
        let mut session = loaded();
        assert_eq!(
            session.handle(Interaction::CenterView).unwrap(),
            InteractionOutcome::Centered
        );
        assert_eq!(session.host().stats().fitted, 1);
    }

    #[test]
    fn test_teardown() {
        let mut session = loaded();
        session.teardown();

        assert!(!session.is_loaded());
        assert!(session.handlers().is_empty());
        assert!(!session.host().is_constructed());
        assert_matches!(
            session.events().last().map(|e| &e.event),
            Some(EventType::DiagramTornDown)
        );
    }
}
