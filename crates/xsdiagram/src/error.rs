//! Error types for xsdiagram operations.
//!
//! This module provides the main error type [`XsDiagramError`] which wraps
//! the error conditions of loading, laying out and exporting a diagram.

use std::io;

use thiserror::Error;

use xsdiagram_schema::error::LoadError;

/// The main error type for xsdiagram operations.
///
/// # Diagnostic Variants
///
/// The `Load` variant keeps the schema source next to the loader
/// diagnostics, whose labels carry byte spans into it. Front-ends use both
/// for source-annotated reports.
#[derive(Debug, Error)]
pub enum XsDiagramError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Load { err: LoadError, src: String },

    #[error("Layout error: {0}")]
    Layout(String),

    #[error("Export error: {0}")]
    Export(Box<dyn std::error::Error>),
}

impl From<crate::export::Error> for XsDiagramError {
    fn from(error: crate::export::Error) -> Self {
        Self::Export(Box::new(error))
    }
}

impl XsDiagramError {
    /// Create a new `Load` error with the associated schema source.
    pub fn new_load_error(err: LoadError, src: impl Into<String>) -> Self {
        Self::Load {
            err,
            src: src.into(),
        }
    }
}
