//! XSD Diagram Core Types and Definitions
//!
//! Foundational types shared by the schema loader, the diagram engine and
//! the renderers:
//!
//! - **Geometry**: points, sizes, bounds and insets ([`geometry`] module)
//! - **Colors**: CSS color parsing and conversion ([`color::Color`])
//! - **Draw**: strokes, text measurement and SVG layers ([`draw`] module)
//! - **Schema**: the read-only schema graph contract ([`schema`] module)

pub mod color;
pub mod draw;
pub mod geometry;
pub mod schema;
