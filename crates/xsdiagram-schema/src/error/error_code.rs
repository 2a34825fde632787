//! Error codes for schema loading diagnostics.
//!
//! - `E0xx` - Document errors
//! - `E1xx` - Declaration warnings
//! - `E2xx` - Reference and include warnings

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Malformed XML.
    E001,
    /// Document root is not `xs:schema`.
    E002,
    /// Schema file cannot be read.
    E003,

    /// Global declaration without a `name`.
    E100,
    /// Global declaration defined more than once; the later one wins.
    E101,
    /// Invalid `minOccurs`/`maxOccurs` value.
    E102,

    /// Reference to an undeclared element, type, group or attribute.
    E200,
    /// `include`/`import` not followed.
    E201,
    /// Included document could not be loaded.
    E202,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
