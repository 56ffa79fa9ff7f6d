/// Example: A complete editing session against the headless host
///
/// This example demonstrates:
/// - Loading a diagram document
/// - Selecting an element and editing its own style rule
/// - Dragging a node with grid snapping
/// - Deleting a node with automatic rewiring
/// - Exporting the result as a document and a padded image
///
/// Set `RUST_LOG=debug` to see the session's log output.

use anyhow::{anyhow, Result};
use graph_style_editor::*;
use std::path::PathBuf;

const DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<body>
  <div id="cy"></div>
  <script>
    cytoscape({
      container: document.getElementById('cy'),
      elements: [
        { data: { id: 'fetch', label: 'Fetch' }, position: { x: 0, y: 0 } },
        { data: { id: 'parse', label: 'Parse' }, position: { x: 150, y: 0 } },
        { data: { id: 'store', label: 'Store' }, position: { x: 300, y: 0 } },
        { data: { id: 'audit', label: 'Audit' }, position: { x: 300, y: 120 } },
        { data: { id: 'fp', source: 'fetch', target: 'parse' } },
        { data: { id: 'ps', source: 'parse', target: 'store' } },
        { data: { id: 'pa', source: 'parse', target: 'audit' } }
      ],
      style: [
        { selector: 'node', style: { 'background-color': '#0074d9', label: 'data(label)' } },
        { selector: 'edge', style: { width: 2, 'curve-style': 'bezier', 'target-arrow-shape': 'triangle' } }
      ],
      layout: { name: 'dagre' }
    });
  </script>
</body>
</html>"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    println!("=== Graph Style Editor: Edit Session Example ===\n");

    // Step 1: Load the diagram
    println!("Step 1: Loading diagram...");
    let mut session = Session::new(HeadlessHost::new(), EditorConfig::default());
    let summary = session.load(DOCUMENT).map_err(|err| {
        eprintln!("{}", err.user_message());
        anyhow!(err)
    })?;
    println!(
        "  ✓ {} nodes, {} edges, {} style rules",
        summary.nodes, summary.edges, summary.rules
    );
    for warning in &summary.warnings {
        println!("  ⚠ {}", warning.message);
    }

    // Step 2: Select a node and restyle it
    println!("\nStep 2: Restyling 'store'...");
    let outcome = session.handle(Interaction::Tap(ElementRef::node("store")))?;
    let InteractionOutcome::Selected { rule, .. } = outcome else {
        return Err(anyhow!("tap did not select 'store'"));
    };
    session.set_property(rule, "shape", "round-rectangle")?;
    session.set_property(rule, "background-color", "#2ecc40")?;
    session.set_property(rule, "border-width", "2")?;
    println!("  ✓ Rule #{} now reads:", rule);
    if let Some(fields) = session.property_fields(rule) {
        for field in fields {
            if let Some(value) = field.value {
                println!("     {}: {}", field.spec.name, value);
            }
        }
    }

    // Step 3: Drag with Shift held
    println!("\nStep 3: Dragging 'audit' with Shift held...");
    session.handle(Interaction::KeyDown(Key::Shift))?;
    let moved = session.handle(Interaction::Drag {
        node: "audit".to_string(),
        position: Position::new(311.0, 131.0),
    })?;
    session.handle(Interaction::KeyUp(Key::Shift))?;
    if let InteractionOutcome::Moved { position, .. } = moved {
        println!("  ✓ Snapped to ({}, {})", position.x, position.y);
    }

    // Step 4: Delete the middle node
    println!("\nStep 4: Deleting 'parse'...");
    session.handle(Interaction::Tap(ElementRef::node("parse")))?;
    if let Some(Deletion::Node(report)) = session.delete_selected()? {
        println!("  ✓ Removed edges: {}", report.removed_edges.join(", "));
        println!("  ✓ Bypass edges: {}", report.bypass_edges.len());
    }
    if let Some(elements) = session.elements() {
        for edge in elements.edges() {
            println!("     {} → {}", edge.source, edge.target);
        }
    }

    // Step 5: Export
    println!("\nStep 5: Exporting...");
    let out_dir = PathBuf::from("/tmp/graph_style_editor");
    std::fs::create_dir_all(&out_dir)?;
    if let Some(path) = session.save_document(&out_dir)? {
        println!("  ✓ Document written to {}", path.display());
    }
    if let Some(path) = session.save_image(&out_dir)? {
        println!("  ✓ Image written to {}", path.display());
    }

    println!("\nEdit log:");
    for event in session.events() {
        println!("  {} {:?}", event.timestamp.format("%H:%M:%S%.3f"), event.event);
    }

    session.teardown();
    println!("\n=== Example completed successfully! ===");
    Ok(())
}
