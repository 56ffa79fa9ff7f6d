// Helper functions to build diagram documents for the integration tests

/// Wrap an `elements` and a `style` literal into a host document
pub fn document(elements: &str, style: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<body>
  <div id="cy"></div>
  <script>
    var cy = cytoscape({{
      container: document.getElementById('cy'),
      elements: {elements},
      style: {style},
      layout: {{ name: 'preset' }}
    }});
  </script>
</body>
</html>"#
    )
}

/// A -> B -> C, laid out left to right
pub fn chain_document() -> String {
    document(
        r#"[
          { data: { id: 'A', label: 'Start' }, position: { x: 0, y: 0 } },
          { data: { id: 'B' }, position: { x: 100, y: 0 } },
          { data: { id: 'C' }, position: { x: 200, y: 50 } },
          { data: { id: 'AB', source: 'A', target: 'B' } },
          { data: { id: 'BC', source: 'B', target: 'C' } }
        ]"#,
        r#"[
          { selector: 'node', style: { 'background-color': '#0074d9', label: 'data(label)' } },
          { selector: 'edge', style: { width: 2, 'target-arrow-shape': 'triangle' } }
        ]"#,
    )
}

/// X, Y -> M -> P, Q with an existing X -> P shortcut
pub fn fan_document() -> String {
    document(
        r#"{
          nodes: [
            { data: { id: 'X' }, position: { x: 0, y: 0 } },
            { data: { id: 'Y' }, position: { x: 0, y: 100 } },
            { data: { id: 'M' }, position: { x: 100, y: 50 } },
            { data: { id: 'P' }, position: { x: 200, y: 0 } },
            { data: { id: 'Q' }, position: { x: 200, y: 100 } }
          ],
          edges: [
            { data: { id: 'XM', source: 'X', target: 'M' } },
            { data: { id: 'YM', source: 'Y', target: 'M' } },
            { data: { id: 'MP', source: 'M', target: 'P' } },
            { data: { id: 'MQ', source: 'M', target: 'Q' } },
            { data: { id: 'XP', source: 'X', target: 'P' } }
          ]
        }"#,
        "[]",
    )
}

/// A <-> B round trip; deleting B must not loop A onto itself
pub fn round_trip_document() -> String {
    document(
        r#"[
          { data: { id: 'A' }, position: { x: 0, y: 0 } },
          { data: { id: 'B' }, position: { x: 50, y: 0 } },
          { data: { id: 'AB', source: 'A', target: 'B' } },
          { data: { id: 'BA', source: 'B', target: 'A' } }
        ]"#,
        "[]",
    )
}

/// An edge pointing at a node that does not exist
pub fn dangling_document() -> String {
    document(
        r#"[
          { data: { id: 'A' }, position: { x: 0, y: 0 } },
          { data: { id: 'AZ', source: 'A', target: 'Z' } }
        ]"#,
        "[]",
    )
}

/// Hand-written stylesheet: a repeated selector, a list-valued property,
/// kind-less selectors and element-level flags
pub fn authored_document() -> String {
    document(
        r#"[
          { data: { id: 'A' }, position: { x: 0, y: 0 }, classes: 'hot', locked: true, grabbable: false },
          { data: { id: 'B' }, position: { x: 100, y: 0 } },
          { data: { id: 'AB', source: 'A', target: 'B' }, selectable: false }
        ]"#,
        r#"[
          { selector: 'node', style: { 'background-color': '#f00' } },
          { selector: 'edge', style: { 'line-style': 'dashed', 'line-dash-pattern': [6, 3] } },
          { selector: '.hot', style: { 'border-width': 3 } },
          { selector: 'node', style: { label: 'data(id)', 'background-color': '#0f0' } }
        ]"#,
    )
}
