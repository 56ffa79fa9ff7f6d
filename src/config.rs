use crate::snap::Key;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Editor settings. Every field has a default, so partial files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Grid step used while snapping, in diagram units
    pub grid_size: f64,

    /// Key that must be held for drags to snap
    pub snap_modifier: Key,

    pub export: ExportConfig,

    pub highlight: HighlightStyle,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_size: 25.0,
            snap_modifier: Key::Shift,
            export: ExportConfig::default(),
            highlight: HighlightStyle::default(),
        }
    }
}

/// Settings for document and image export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Script URL of the rendering library embedded in exported documents
    pub library_url: String,

    /// `lang` attribute of exported documents
    pub lang: String,

    /// Id of the container element in exported documents
    pub container_id: String,

    /// Supersampling factor for raster export
    pub scale: f32,

    /// Blank border per side, in diagram units (multiplied by `scale`)
    pub padding: f32,

    /// Background and border color of raster export
    pub background: String,

    pub document_file_name: String,

    pub image_file_name: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            library_url: "https://unpkg.com/cytoscape@3.27.0/dist/cytoscape.min.js".to_string(),
            lang: "ru".to_string(),
            container_id: "cy".to_string(),
            scale: 2.0,
            padding: 125.0,
            background: "#ffffff".to_string(),
            document_file_name: "edited_scheme.html".to_string(),
            image_file_name: "scheme.png".to_string(),
        }
    }
}

impl ExportConfig {
    /// Border width in output pixels
    pub fn padding_px(&self) -> u32 {
        (self.padding * self.scale).round().max(0.0) as u32
    }
}

/// Look of the selection highlight rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightStyle {
    /// Border color of a selected node and line color of a selected edge
    pub color: String,
    pub node_border_width: f64,
    pub overlay_color: String,
    pub overlay_opacity: f64,
    pub edge_width: f64,
}

impl Default for HighlightStyle {
    fn default() -> Self {
        Self {
            color: "#ff9800".to_string(),
            node_border_width: 6.0,
            overlay_color: "#ffb74d".to_string(),
            overlay_opacity: 0.25,
            edge_width: 6.0,
        }
    }
}

impl EditorConfig {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open editor config: {}", path.display()))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse editor config from: {}", path.display()))
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create editor config: {}", path.display()))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)
            .with_context(|| format!("Failed to write editor config to: {}", path.display()))?;
        Ok(())
    }
}
