//! Standalone document and padded image export.

use crate::config::ExportConfig;
use crate::host::parse_color;
use crate::{ElementKind, ElementRecord, ElementSet, ElementsWire, StyleRule};
use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tiny_skia::{Pixmap, PixmapPaint, Transform};
use tracing::debug;

/// Render a self-contained HTML document that shows the diagram with its
/// current positions (`preset` layout) and the given rules.
///
/// Selection highlight classes are never written out.
pub fn render_document(
    elements: &ElementSet,
    rules: &[StyleRule],
    config: &ExportConfig,
) -> Result<String> {
    let mut elements = elements.clone();
    for kind in [ElementKind::Node, ElementKind::Edge] {
        elements.clear_class(kind, kind.active_class());
    }

    let wire = ElementsWire::Grouped {
        nodes: elements.nodes().iter().map(ElementRecord::from_node).collect(),
        edges: elements.edges().iter().map(ElementRecord::from_edge).collect(),
    };
    let elements_json = script_safe(
        &serde_json::to_string_pretty(&wire).context("Failed to serialize elements")?,
    );
    let style_json = script_safe(
        &serde_json::to_string_pretty(rules).context("Failed to serialize style rules")?,
    );

    Ok(format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head><meta charset="utf-8"></head>
<body>
  <div id="{container}" style="width:100%;height:100vh;"></div>
  <script src="{library}"></script>
  <script>
    cytoscape({{
      container : document.getElementById('{container}'),
      elements  : {elements},
      layout    : {{ name : 'preset' }},
      style     : {style}
    }}).ready(function(){{ this.fit(); }});
  </script>
</body></html>
"#,
        lang = config.lang,
        container = config.container_id,
        library = config.library_url,
        elements = elements_json,
        style = style_json,
    ))
}

/// JSON embedded in a `<script>` must not contain `</`
fn script_safe(json: &str) -> String {
    json.replace("</", "<\\u002F")
}

/// Composite a PNG onto a larger canvas with `padding` pixels of
/// `background` on every side
pub fn pad_png(raw: &[u8], padding: u32, background: &str) -> Result<Vec<u8>> {
    let source = Pixmap::decode_png(raw)
        .map_err(|err| anyhow!("failed to decode rasterized diagram: {err}"))?;
    let color = parse_color(background)
        .ok_or_else(|| anyhow!("Unsupported background color: {}", background))?;

    let width = padding
        .checked_mul(2)
        .and_then(|p| p.checked_add(source.width()))
        .ok_or_else(|| anyhow!("padded width overflows"))?;
    let height = padding
        .checked_mul(2)
        .and_then(|p| p.checked_add(source.height()))
        .ok_or_else(|| anyhow!("padded height overflows"))?;
    let offset = i32::try_from(padding).context("padding does not fit the canvas")?;

    let mut canvas = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("failed to allocate {width}x{height} surface for PNG export"))?;
    canvas.fill(color);
    canvas.draw_pixmap(
        offset,
        offset,
        source.as_ref(),
        &PixmapPaint::default(),
        Transform::identity(),
        None,
    );

    debug!(
        raw_width = source.width(),
        raw_height = source.height(),
        width,
        height,
        "padded raster export"
    );

    canvas
        .encode_png()
        .map_err(|err| anyhow!("failed to encode PNG output: {err}"))
}

/// Write an exported document
pub fn write_document(path: &Path, html: &str) -> Result<()> {
    write_bytes(path, html.as_bytes())
        .with_context(|| format!("Failed to write document to: {}", path.display()))
}

/// Write an exported image
pub fn write_image(path: &Path, png: &[u8]) -> Result<()> {
    write_bytes(path, png)
        .with_context(|| format!("Failed to write image to: {}", path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
