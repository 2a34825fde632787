//! Configuration types for schema diagram layout, styling and export.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! TOML by the command-line front-end. Every field is optional; missing
//! fields take the defaults documented on each accessor.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining the three sections.
//! - [`LayoutConfig`] - Box metrics, spacing and alignment of the tree layout.
//! - [`StyleConfig`] - Colors used by every rendering backend.
//! - [`ExportConfig`] - Output format defaults and raster limits.
//!
//! # Example
//!
//! ```
//! # use xsdiagram::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.export().large_image_threshold(), 10_000);
//! assert!(config.style().background_color().is_ok());
//! ```

use serde::Deserialize;

use xsdiagram_core::color::Color;

use crate::diagram::Alignment;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,

    /// Export configuration section.
    #[serde(default)]
    export: ExportConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its three sections.
    pub fn new(layout: LayoutConfig, style: StyleConfig, export: ExportConfig) -> Self {
        Self {
            layout,
            style,
            export,
        }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    /// Returns the export configuration.
    pub fn export(&self) -> &ExportConfig {
        &self.export
    }

    /// Returns the layout configuration for modification, e.g. to apply
    /// command-line overrides.
    pub fn layout_mut(&mut self) -> &mut LayoutConfig {
        &mut self.layout
    }
}

/// How label extents are measured during layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMetricsMode {
    /// Shape text against the system fonts.
    #[default]
    Font,
    /// Fixed per-character advance; identical on every machine.
    Estimated,
}

/// Tree layout parameters, all in unscaled diagram units.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    alignment: Alignment,
    padding: f32,
    spacing: f32,
    connector_length: f32,
    label_padding: f32,
    glyph_size: f32,
    min_box_width: f32,
    min_box_height: f32,
    text_metrics: TextMetricsMode,
    font_family: String,
    font_size: u16,
}

impl LayoutConfig {
    /// Alignment of a parent box against its children. Default: center.
    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    /// Margin around the whole diagram. Default: 10.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Vertical gap between sibling subtrees and between roots. Default: 10.
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    /// Horizontal gap between a parent box and its children. Default: 20.
    pub fn connector_length(&self) -> f32 {
        self.connector_length
    }

    /// Space between a box border and its label. Default: 6.
    pub fn label_padding(&self) -> f32 {
        self.label_padding
    }

    /// Side length of the expand glyph. Default: 10.
    pub fn glyph_size(&self) -> f32 {
        self.glyph_size
    }

    /// Smallest box width. Default: 50.
    pub fn min_box_width(&self) -> f32 {
        self.min_box_width
    }

    /// Smallest box height. Default: 25.
    pub fn min_box_height(&self) -> f32 {
        self.min_box_height
    }

    pub fn text_metrics(&self) -> TextMetricsMode {
        self.text_metrics
    }

    pub fn set_text_metrics(&mut self, mode: TextMetricsMode) {
        self.text_metrics = mode;
    }

    /// Label font family. Default: Arial.
    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Label font size in points. Default: 10.
    pub fn font_size(&self) -> u16 {
        self.font_size
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            alignment: Alignment::default(),
            padding: 10.0,
            spacing: 10.0,
            connector_length: 20.0,
            label_padding: 6.0,
            glyph_size: 10.0,
            min_box_width: 50.0,
            min_box_height: 25.0,
            text_metrics: TextMetricsMode::default(),
            font_family: "Arial".to_string(),
            font_size: 10,
        }
    }
}

/// Colors of rendered diagrams, as CSS color strings.
///
/// Fields that are not set fall back to the defaults returned by the
/// accessors.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default)]
    background_color: Option<String>,
    #[serde(default)]
    element_fill: Option<String>,
    #[serde(default)]
    type_fill: Option<String>,
    #[serde(default)]
    group_fill: Option<String>,
    #[serde(default)]
    box_stroke: Option<String>,
    #[serde(default)]
    connector_color: Option<String>,
    #[serde(default)]
    text_color: Option<String>,
    #[serde(default)]
    hint_color: Option<String>,
}

impl StyleConfig {
    /// Canvas background. Default: white.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color. The
    /// other color accessors behave the same way.
    pub fn background_color(&self) -> Result<Color, String> {
        parse_color("background_color", self.background_color.as_deref(), "white")
    }

    /// Fill of element and wildcard boxes. Default: `#fffbe6`.
    pub fn element_fill(&self) -> Result<Color, String> {
        parse_color("element_fill", self.element_fill.as_deref(), "#fffbe6")
    }

    /// Fill of complex and simple type boxes. Default: `#eef3fb`.
    pub fn type_fill(&self) -> Result<Color, String> {
        parse_color("type_fill", self.type_fill.as_deref(), "#eef3fb")
    }

    /// Fill of group and compositor boxes. Default: `#f2f2f2`.
    pub fn group_fill(&self) -> Result<Color, String> {
        parse_color("group_fill", self.group_fill.as_deref(), "#f2f2f2")
    }

    /// Box borders and glyphs. Default: black.
    pub fn box_stroke(&self) -> Result<Color, String> {
        parse_color("box_stroke", self.box_stroke.as_deref(), "black")
    }

    /// Connector lines. Default: `#404040`.
    pub fn connector_color(&self) -> Result<Color, String> {
        parse_color("connector_color", self.connector_color.as_deref(), "#404040")
    }

    /// Labels. Default: black.
    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text_color", self.text_color.as_deref(), "black")
    }

    /// Bounding box hints. Default: `#b0b0b0`.
    pub fn hint_color(&self) -> Result<Color, String> {
        parse_color("hint_color", self.hint_color.as_deref(), "#b0b0b0")
    }
}

fn parse_color(field: &str, value: Option<&str>, default: &str) -> Result<Color, String> {
    Color::new(value.unwrap_or(default)).map_err(|err| format!("Invalid {field} in config: {err}"))
}

/// Export defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    large_image_threshold: u32,
    jpeg_quality: u8,
    default_format: String,
}

impl ExportConfig {
    /// Raster width or height above which confirmation is requested.
    /// Default: 10000 pixels.
    pub fn large_image_threshold(&self) -> u32 {
        self.large_image_threshold
    }

    /// JPEG encoder quality, 1 to 100. Default: 90.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Format used when the output path has no extension. Default: `svg`.
    pub fn default_format(&self) -> &str {
        &self.default_format
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            large_image_threshold: 10_000,
            jpeg_quality: 90,
            default_format: "svg".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_layout_defaults() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.alignment(), Alignment::Center);
        assert_approx_eq!(f32, layout.padding(), 10.0);
        assert_approx_eq!(f32, layout.min_box_height(), 25.0);
        assert_eq!(layout.text_metrics(), TextMetricsMode::Font);
        assert_eq!(layout.font_family(), "Arial");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [layout]
            alignment = "near"
            spacing = 4.0
            text_metrics = "estimated"

            [style]
            background_color = "ivory"

            [export]
            jpeg_quality = 75
            "#,
        )
        .unwrap();

        assert_eq!(config.layout().alignment(), Alignment::Near);
        assert_approx_eq!(f32, config.layout().spacing(), 4.0);
        assert_approx_eq!(f32, config.layout().connector_length(), 20.0);
        assert_eq!(config.layout().text_metrics(), TextMetricsMode::Estimated);
        assert_eq!(config.export().jpeg_quality(), 75);
        assert_eq!(config.export().large_image_threshold(), 10_000);
        assert_eq!(
            config.style().background_color().unwrap(),
            Color::new("ivory").unwrap()
        );
    }

    #[test]
    fn test_invalid_color_is_reported() {
        let config: AppConfig = toml::from_str("[style]\nbox_stroke = \"nope\"").unwrap();
        let err = config.style().box_stroke().unwrap_err();
        assert!(err.contains("box_stroke"), "unexpected message: {err}");
        assert!(config.style().text_color().is_ok());
    }
}
