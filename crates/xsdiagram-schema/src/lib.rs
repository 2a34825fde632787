//! XML Schema loading for xsdiagram.
//!
//! The loader reads `.xsd` documents with `roxmltree` and builds a
//! [`SchemaGraph`]: an arena of declarations and particles that implements
//! [`SchemaGraphView`](xsdiagram_core::schema::SchemaGraphView), which is all
//! the diagram needs.
//!
//! ```
//! use xsdiagram_core::schema::SchemaGraphView;
//!
//! let graph = xsdiagram_schema::load_str(
//!     r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
//!          <xs:element name="note" type="xs:string"/>
//!        </xs:schema>"#,
//! )
//! .unwrap();
//!
//! let roots = graph.top_level_elements();
//! assert_eq!(graph.node(roots[0]).unwrap().name, "note");
//! ```

mod attributes;
pub mod error;
mod graph;
mod loader;
mod span;

pub use graph::{SchemaGraph, XS_NAMESPACE};
pub use loader::{load_file, load_str, load_with_base};
pub use span::Span;
