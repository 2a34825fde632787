//! Visual definitions shared by every rendering backend.
//!
//! - [`StrokeDefinition`] and [`StrokeStyle`] describe box borders, connectors and hints
//! - [`TextDefinition`] and the [`TextMeasure`] implementations measure box labels
//! - [`RenderLayer`] and [`LayeredOutput`] give SVG output a stable z-order

mod layer;
mod stroke;
mod text;

pub use layer::{LayeredOutput, RenderLayer, SvgNode};
pub use stroke::{StrokeDefinition, StrokeStyle};
pub use text::{EstimatedMetrics, FontMetrics, TextDefinition, TextMeasure};
