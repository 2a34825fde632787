//! xsdiagram - Collapsible box-and-connector diagrams of XML schemas.
//!
//! A [`Diagram`](diagram::Diagram) is a tree of boxes grown on demand from a
//! schema graph: elements, groups, types and compositors, each expandable to
//! its child content. The [`LayoutEngine`](layout::LayoutEngine) places the
//! visible boxes, [`Diagram::hit_test`](diagram::Diagram::hit_test) maps
//! points back to them, and the [`render`] backends and
//! [`DiagramExporter`](export::DiagramExporter) turn the result into SVG,
//! PDF, PNG or JPEG.

pub mod config;
pub mod diagram;
pub mod export;
pub mod layout;
pub mod render;

mod error;
#[cfg(test)]
mod testing;

pub use xsdiagram_core::{color, draw, geometry, schema};
pub use xsdiagram_schema::SchemaGraph;

pub use error::XsDiagramError;
pub use hit_test::HitTestRegion;

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use config::{AppConfig, TextMetricsMode};
use diagram::Diagram;
use draw::{EstimatedMetrics, FontMetrics, TextDefinition, TextMeasure};
use export::{Confirm, DiagramExporter, ExportFormat, ExportOutcome};
use layout::LayoutEngine;
use render::RenderStyle;

/// Builder for loading schemas and laying out, rendering and exporting
/// their diagrams with one configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use xsdiagram::{DiagramBuilder, config::AppConfig};
///
/// let builder = DiagramBuilder::new(AppConfig::default());
/// let graph = builder.load_file("purchase-order.xsd").expect("Failed to load");
///
/// let mut diagram = builder.new_diagram();
/// diagram.add_all(&graph, graph.top_level_elements());
/// diagram.expand_levels(&graph, 2);
///
/// let svg = builder.render_svg(&mut diagram).expect("Failed to render");
/// println!("{svg}");
/// ```
#[derive(Default)]
pub struct DiagramBuilder {
    config: AppConfig,
}

impl DiagramBuilder {
    /// Create a new diagram builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Read and load the schema at `path`, following its includes.
    ///
    /// # Errors
    ///
    /// Returns [`XsDiagramError::Io`] when the file cannot be read and
    /// [`XsDiagramError::Load`] when it is not a readable schema.
    pub fn load_file(&self, path: impl AsRef<Path>) -> Result<SchemaGraph, XsDiagramError> {
        let path = path.as_ref();
        info!(path:? = path; "Loading schema");
        let source = fs::read_to_string(path)?;
        let graph = xsdiagram_schema::load_with_base(&source, path)
            .map_err(|err| XsDiagramError::new_load_error(err, source.as_str()))?;
        Self::log_loaded(&graph);
        Ok(graph)
    }

    /// Load a schema from memory. Includes cannot be followed.
    ///
    /// # Errors
    ///
    /// Returns [`XsDiagramError::Load`] when `source` is not a readable
    /// schema.
    pub fn load_str(&self, source: &str) -> Result<SchemaGraph, XsDiagramError> {
        let graph = xsdiagram_schema::load_str(source)
            .map_err(|err| XsDiagramError::new_load_error(err, source))?;
        Self::log_loaded(&graph);
        Ok(graph)
    }

    /// An empty diagram with the configured alignment and padding.
    pub fn new_diagram(&self) -> Diagram {
        let layout = self.config.layout();
        let mut diagram = Diagram::new();
        diagram.set_alignment(layout.alignment());
        diagram.set_padding(layout.padding());
        diagram
    }

    /// Label measurement as configured.
    pub fn text_measure(&self) -> Box<dyn TextMeasure> {
        let layout = self.config.layout();
        let mut definition = TextDefinition::new();
        definition.set_font_family(layout.font_family());
        definition.set_font_size(layout.font_size());
        match layout.text_metrics() {
            TextMetricsMode::Font => Box::new(FontMetrics::new(definition)),
            TextMetricsMode::Estimated => Box::new(EstimatedMetrics::new(definition)),
        }
    }

    /// # Errors
    ///
    /// Returns [`XsDiagramError::Layout`] for invalid layout lengths.
    pub fn layout_engine(&self) -> Result<LayoutEngine, XsDiagramError> {
        LayoutEngine::from_config(self.config.layout())
    }

    /// # Errors
    ///
    /// Returns [`XsDiagramError::Export`] when a configured color is invalid.
    pub fn render_style(&self) -> Result<RenderStyle, XsDiagramError> {
        RenderStyle::from_config(self.config.style())
            .map_err(|err| export::Error::Render(err).into())
    }

    /// Lay out the visible items of `diagram`.
    ///
    /// # Errors
    ///
    /// Returns [`XsDiagramError::Layout`] for invalid layout lengths.
    pub fn layout(&self, diagram: &mut Diagram) -> Result<(), XsDiagramError> {
        let engine = self.layout_engine()?;
        engine.layout(diagram, self.text_measure().as_ref());
        Ok(())
    }

    /// Render `diagram` to an SVG string at scale 1.0. The diagram scale is
    /// restored afterwards.
    ///
    /// # Errors
    ///
    /// Returns `XsDiagramError` for invalid configuration or rendering
    /// failures.
    pub fn render_svg(&self, diagram: &mut Diagram) -> Result<String, XsDiagramError> {
        let mut buffer = Vec::new();
        self.with_exporter(|exporter| {
            exporter.export_to_writer(diagram, &mut buffer, ExportFormat::Svg, None)
        })?;
        let svg = String::from_utf8(buffer).map_err(|err| XsDiagramError::Export(Box::new(err)))?;
        debug!(bytes = svg.len(); "SVG rendered");
        Ok(svg)
    }

    /// Export `diagram` to `path`; see
    /// [`DiagramExporter::export_to_path`].
    ///
    /// # Errors
    ///
    /// Returns `XsDiagramError` for invalid configuration, I/O, rendering or
    /// encoding failures.
    pub fn export(
        &self,
        diagram: &mut Diagram,
        path: &Path,
        format_hint: Option<&str>,
        confirm: Option<Confirm<'_>>,
    ) -> Result<(ExportOutcome, PathBuf), XsDiagramError> {
        let hint = format_hint.or_else(|| {
            path.extension()
                .is_none()
                .then(|| self.config.export().default_format())
        });
        let result = self.with_exporter(|exporter| {
            exporter.export_to_path(diagram, path, hint, confirm)
        })?;
        match result.0 {
            ExportOutcome::Written => info!(path:? = result.1; "Export finished"),
            ExportOutcome::Declined => warn!(path:? = result.1; "Export declined"),
        }
        Ok(result)
    }

    fn with_exporter<T>(
        &self,
        run: impl FnOnce(&DiagramExporter<'_>) -> Result<T, export::Error>,
    ) -> Result<T, XsDiagramError> {
        let engine = self.layout_engine()?;
        let style = self.render_style()?;
        let measure = self.text_measure();
        let exporter = DiagramExporter::new(&engine, measure.as_ref(), &style)
            .with_large_image_threshold(self.config.export().large_image_threshold())
            .with_jpeg_quality(self.config.export().jpeg_quality());
        Ok(run(&exporter)?)
    }

    fn log_loaded(graph: &SchemaGraph) {
        info!(
            nodes = graph.len(),
            elements = graph.top_level_elements().len(),
            warnings = graph.warnings().len();
            "Schema loaded"
        );
        for warning in graph.warnings() {
            debug!(warning:%; "Schema warning");
        }
    }
}
