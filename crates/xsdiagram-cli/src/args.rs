//! Command-line argument definitions for the xsdiagram CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments select the schema and the declarations to show,
//! control expansion, scale and output, and pick the configuration file and
//! logging verbosity.

use clap::Parser;

/// Command-line arguments for the xsdiagram tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input schema
    #[arg(help = "Path to the input .xsd file")]
    pub input: String,

    /// Local name of a top-level declaration to show; repeatable
    #[arg(short, long = "root", value_name = "NAME")]
    pub roots: Vec<String>,

    /// Show every top-level element
    #[arg(short, long)]
    pub all: bool,

    /// Number of levels to expand below the roots
    #[arg(short, long, default_value_t = 1)]
    pub expand_level: usize,

    /// Path to the output file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Output format (svg, pdf, png, jpeg); defaults to the output extension
    #[arg(short, long)]
    pub format: Option<String>,

    /// Display scale, used for raster output
    #[arg(short, long, default_value_t = 1.0)]
    pub scale: f32,

    /// Parent alignment against its children (near, center, far)
    #[arg(long)]
    pub alignment: Option<String>,

    /// Draw the bounding box of every expanded subtree
    #[arg(long)]
    pub hints: bool,

    /// Generate oversized images without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Arguments for rendering `input` to `output` with defaults otherwise.
    pub fn new(input: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            roots: Vec::new(),
            all: false,
            expand_level: 1,
            output: output.into(),
            format: None,
            scale: 1.0,
            alignment: None,
            hints: false,
            yes: false,
            config: None,
            log_level: "info".to_string(),
        }
    }
}
