//! Diagnostics reported while loading a schema.
//!
//! Loading is lenient: structural oddities and unresolved references become
//! warnings, only unreadable documents are errors. Everything is collected in
//! a [`DiagnosticCollector`] owned by the load call, and handed back either as
//! [`SchemaGraph::warnings`](crate::SchemaGraph::warnings) or inside a
//! [`LoadError`].

mod collector;
mod diagnostic;
mod error_code;
mod label;
mod load_error;
mod severity;

pub use collector::DiagnosticCollector;
pub use diagnostic::Diagnostic;
pub use error_code::ErrorCode;
pub use label::Label;
pub use load_error::LoadError;
pub use severity::Severity;
