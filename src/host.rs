//! The rendering engine seam.
//!
//! A [`RenderHost`] owns the live view of a diagram: it lays elements out,
//! resolves their effective style and rasterizes them. The session drives it
//! and keeps its own copy of the element set in sync.
//!
//! [`HeadlessHost`] is an in-memory host: style resolution follows the rule
//! cascade and rasterization draws plain shapes with tiny-skia.

use crate::{
    cascade, Element, ElementRef, ElementSet, Layout, Node, Position, StyleRule, StyleValue,
};
use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use tiny_skia::{
    Color, FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, StrokeDash, Transform,
};
use tracing::{debug, warn};

/// Operations the editor needs from a rendering engine
pub trait RenderHost {
    /// Build a live view of a diagram
    fn construct(&mut self, elements: &ElementSet, style: &[StyleRule], layout: &Layout)
        -> Result<()>;

    /// Drop the live view; a no-op when nothing is constructed
    fn destroy(&mut self);

    fn is_constructed(&self) -> bool;

    /// Effective value of a style property for an element, as the engine sees it
    fn resolved_style_value(&self, element: &ElementRef, property: &str) -> Option<StyleValue>;

    /// Replace the whole stylesheet and restyle
    fn apply_style(&mut self, rules: &[StyleRule]);

    /// Replace the element set (after a topology edit)
    fn sync_elements(&mut self, elements: &ElementSet);

    /// The engine's element set, classes and positions included
    fn current_elements(&self) -> ElementSet;

    fn set_position(&mut self, node_id: &str, position: Position) -> Result<()>;

    /// Fit the viewport to the whole diagram
    fn fit(&mut self);

    /// Render the full diagram to PNG bytes
    fn rasterize(&self, scale: f32, background: &str) -> Result<Vec<u8>>;
}

/// Calls observed by a [`HeadlessHost`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub constructed: usize,
    pub destroyed: usize,
    pub styled: usize,
    pub synced: usize,
    pub fitted: usize,
}

#[derive(Debug, Clone)]
struct LiveView {
    elements: ElementSet,
    rules: Vec<StyleRule>,
}

/// In-memory rendering host
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    view: Option<LiveView>,
    stats: HostStats,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> HostStats {
        self.stats
    }

    /// Stylesheet currently applied to the view
    pub fn applied_rules(&self) -> &[StyleRule] {
        self.view.as_ref().map(|v| v.rules.as_slice()).unwrap_or(&[])
    }

    fn view(&self) -> Result<&LiveView> {
        self.view
            .as_ref()
            .ok_or_else(|| anyhow!("Render host has no diagram"))
    }
}

impl RenderHost for HeadlessHost {
    fn construct(
        &mut self,
        elements: &ElementSet,
        style: &[StyleRule],
        layout: &Layout,
    ) -> Result<()> {
        if self.view.is_some() {
            bail!("Render host already holds a diagram");
        }
        if !layout.is_preset() {
            warn!(layout = %layout.name, "headless host keeps stored positions for non-preset layout");
        }

        self.view = Some(LiveView {
            elements: elements.clone(),
            rules: style.to_vec(),
        });
        self.stats.constructed += 1;
        Ok(())
    }

    fn destroy(&mut self) {
        if self.view.take().is_some() {
            self.stats.destroyed += 1;
        }
    }

    fn is_constructed(&self) -> bool {
        self.view.is_some()
    }

    fn resolved_style_value(&self, element: &ElementRef, property: &str) -> Option<StyleValue> {
        let view = self.view.as_ref()?;
        let element = view.elements.element(element)?;
        cascade(&view.rules, element, property)
    }

    fn apply_style(&mut self, rules: &[StyleRule]) {
        if let Some(view) = self.view.as_mut() {
            view.rules = rules.to_vec();
            self.stats.styled += 1;
        }
    }

    fn sync_elements(&mut self, elements: &ElementSet) {
        if let Some(view) = self.view.as_mut() {
            view.elements = elements.clone();
            self.stats.synced += 1;
        }
    }

    fn current_elements(&self) -> ElementSet {
        self.view
            .as_ref()
            .map(|v| v.elements.clone())
            .unwrap_or_default()
    }

    fn set_position(&mut self, node_id: &str, position: Position) -> Result<()> {
        let view = self
            .view
            .as_mut()
            .ok_or_else(|| anyhow!("Render host has no diagram"))?;
        view.elements.set_position(node_id, position)
    }

    fn fit(&mut self) {
        if self.view.is_some() {
            self.stats.fitted += 1;
        }
    }

    fn rasterize(&self, scale: f32, background: &str) -> Result<Vec<u8>> {
        let view = self.view()?;
        if !scale.is_finite() || scale <= 0.0 {
            bail!("Invalid raster scale: {}", scale);
        }

        let background = parse_color(background)
            .ok_or_else(|| anyhow!("Unsupported background color: {}", background))?;
        let shapes: Vec<NodeShape> = view
            .elements
            .nodes()
            .iter()
            .map(|node| NodeShape::resolve(node, &view.rules))
            .collect();

        let Some(bounds) = bounding_box(&shapes) else {
            debug!("rasterizing empty diagram");
            let mut pixmap =
                Pixmap::new(1, 1).ok_or_else(|| anyhow!("failed to allocate 1x1 surface"))?;
            pixmap.fill(background);
            return pixmap
                .encode_png()
                .map_err(|err| anyhow!("failed to encode PNG output: {err}"));
        };

        let width = (bounds.width() * scale).ceil().max(1.0);
        let height = (bounds.height() * scale).ceil().max(1.0);
        if width > u32::MAX as f32 || height > u32::MAX as f32 {
            bail!("scaled dimensions exceed supported limits; try a smaller scale factor");
        }
        let (width, height) = (width as u32, height as u32);

        let mut pixmap = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("failed to allocate {width}x{height} surface for PNG export"))?;
        pixmap.fill(background);

        let transform = Transform::from_row(
            scale,
            0.0,
            0.0,
            scale,
            -bounds.left() * scale,
            -bounds.top() * scale,
        );

        for edge in view.elements.edges() {
            let (Some(source), Some(target)) = (
                view.elements.node(&edge.source),
                view.elements.node(&edge.target),
            ) else {
                continue;
            };
            let style = |property: &str| cascade(&view.rules, Element::Edge(edge), property);

            let mut builder = PathBuilder::new();
            builder.move_to(source.position.x as f32, source.position.y as f32);
            builder.line_to(target.position.x as f32, target.position.y as f32);
            let Some(path) = builder.finish() else {
                continue;
            };

            let width = style("width").and_then(|v| v.as_f64()).unwrap_or(3.0) as f32;
            let dash = match style("line-style").as_ref().and_then(StyleValue::as_str) {
                Some("dashed") => StrokeDash::new(vec![width * 3.0, width * 2.0], 0.0),
                Some("dotted") => StrokeDash::new(vec![width, width], 0.0),
                _ => None,
            };
            let stroke = Stroke {
                width,
                dash,
                ..Stroke::default()
            };
            let paint = solid_paint(style("line-color").as_ref());
            pixmap.stroke_path(&path, &paint, &stroke, transform, None);
        }

        for shape in &shapes {
            let Some(path) = shape.path() else {
                continue;
            };
            pixmap.fill_path(
                &path,
                &solid_paint(Some(&shape.fill)),
                FillRule::Winding,
                transform,
                None,
            );
            if shape.border_width > 0.0 {
                let stroke = Stroke {
                    width: shape.border_width,
                    ..Stroke::default()
                };
                pixmap.stroke_path(&path, &solid_paint(Some(&shape.border)), &stroke, transform, None);
            }
        }

        pixmap
            .encode_png()
            .map_err(|err| anyhow!("failed to encode PNG output: {err}"))
    }
}

// ========== Rasterization Helpers ==========

/// A node's resolved geometry and paint
#[derive(Debug, Clone)]
struct NodeShape {
    center: Position,
    width: f32,
    height: f32,
    shape: String,
    fill: StyleValue,
    border: StyleValue,
    border_width: f32,
}

impl NodeShape {
    fn resolve(node: &Node, rules: &[StyleRule]) -> Self {
        let element = Element::Node(node);
        let style = |property: &str| cascade(rules, element, property);

        Self {
            center: node.position,
            width: dimension(style("width"), node),
            height: dimension(style("height"), node),
            shape: style("shape")
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_else(|| "ellipse".to_string()),
            fill: style("background-color").unwrap_or_else(|| StyleValue::from("#999999")),
            border: style("border-color").unwrap_or_else(|| StyleValue::from("#000000")),
            border_width: style("border-width")
                .and_then(|v| v.as_f64())
                .unwrap_or(0.0)
                .max(0.0) as f32,
        }
    }

    /// Extent including half of the border stroke
    fn bounds(&self) -> (f32, f32, f32, f32) {
        let half_w = self.width / 2.0 + self.border_width / 2.0;
        let half_h = self.height / 2.0 + self.border_width / 2.0;
        let (x, y) = (self.center.x as f32, self.center.y as f32);
        (x - half_w, y - half_h, x + half_w, y + half_h)
    }

    fn path(&self) -> Option<Path> {
        let (x, y) = (self.center.x as f32, self.center.y as f32);
        let rect = Rect::from_xywh(
            x - self.width / 2.0,
            y - self.height / 2.0,
            self.width,
            self.height,
        )?;

        match self.shape.as_str() {
            "ellipse" => PathBuilder::from_oval(rect),
            "diamond" => polygon(&[
                (x, rect.top()),
                (rect.right(), y),
                (x, rect.bottom()),
                (rect.left(), y),
            ]),
            "triangle" => polygon(&[
                (x, rect.top()),
                (rect.right(), rect.bottom()),
                (rect.left(), rect.bottom()),
            ]),
            _ => Some(PathBuilder::from_rect(rect)),
        }
    }
}

fn polygon(points: &[(f32, f32)]) -> Option<Path> {
    let (first, rest) = points.split_first()?;
    let mut builder = PathBuilder::new();
    builder.move_to(first.0, first.1);
    for (x, y) in rest {
        builder.line_to(*x, *y);
    }
    builder.close();
    builder.finish()
}

fn bounding_box(shapes: &[NodeShape]) -> Option<Rect> {
    let mut bounds = shapes.iter().map(NodeShape::bounds);
    let first = bounds.next()?;
    let (left, top, right, bottom) = bounds.fold(first, |acc, b| {
        (acc.0.min(b.0), acc.1.min(b.1), acc.2.max(b.2), acc.3.max(b.3))
    });
    Rect::from_ltrb(left, top, right, bottom)
}

/// Node size in diagram units: a number, `"40px"`, or a `data(key)` mapper
fn dimension(value: Option<StyleValue>, node: &Node) -> f32 {
    const FALLBACK: f64 = 30.0;

    let size = match &value {
        Some(StyleValue::Text(text)) if text.starts_with("data(") => text
            .strip_prefix("data(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|key| node.data.get(key.trim()))
            .and_then(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().trim_end_matches("px").parse().ok(),
                _ => None,
            }),
        Some(value) => value.as_f64(),
        None => None,
    };

    size.filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or(FALLBACK) as f32
}

fn solid_paint(color: Option<&StyleValue>) -> Paint<'static> {
    let color = color
        .and_then(StyleValue::as_str)
        .and_then(parse_color)
        .unwrap_or_else(|| Color::from_rgba8(0x99, 0x99, 0x99, 0xff));

    let mut paint = Paint::default();
    paint.set_color(color);
    paint.anti_alias = true;
    paint
}

/// Parse `#rgb`, `#rrggbb` or a handful of named colors
pub fn parse_color(text: &str) -> Option<Color> {
    let text = text.trim();
    if let Some(hex) = text.strip_prefix('#') {
        let digits: Vec<u8> = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<_>>()?;
        let (r, g, b) = match digits.as_slice() {
            [r, g, b] => (r * 17, g * 17, b * 17),
            [r1, r2, g1, g2, b1, b2] => (r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2),
            _ => return None,
        };
        return Some(Color::from_rgba8(r, g, b, 0xff));
    }

    let (r, g, b) = match text.to_ascii_lowercase().as_str() {
        "white" => (0xff, 0xff, 0xff),
        "black" => (0x00, 0x00, 0x00),
        "red" => (0xff, 0x00, 0x00),
        "green" => (0x00, 0x80, 0x00),
        "blue" => (0x00, 0x00, 0xff),
        "gray" | "grey" => (0x80, 0x80, 0x80),
        "orange" => (0xff, 0xa5, 0x00),
        "yellow" => (0xff, 0xff, 0x00),
        "transparent" => return Some(Color::TRANSPARENT),
        _ => return None,
    };
    Some(Color::from_rgba8(r, g, b, 0xff))
}
