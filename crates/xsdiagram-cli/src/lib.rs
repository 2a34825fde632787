//! CLI logic for the xsdiagram tool.
//!
//! This module contains the core CLI logic: load a schema, pick the root
//! declarations, expand them and export the diagram.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    io::{self, BufRead, IsTerminal, Write},
    path::Path,
};

use log::{info, warn};

use xsdiagram::{
    DiagramBuilder, SchemaGraph, XsDiagramError,
    diagram::{Alignment, Diagram},
    export::{Confirm, ExportOutcome},
    schema::{DeclarationKind, NodeId, SchemaGraphView},
};

use config::ConfigError;

/// Run the xsdiagram CLI application
///
/// Loads the input schema, adds the requested roots, expands them
/// `expand_level` levels and writes the diagram to the output file.
///
/// # Errors
///
/// Returns `XsDiagramError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Schema loading errors
/// - Layout errors
/// - Export errors
pub fn run(args: &Args) -> Result<(), XsDiagramError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing schema"
    );

    let mut app_config = config::load_config(args.config.as_ref())?;
    if let Some(alignment) = &args.alignment {
        let alignment: Alignment = alignment.parse().map_err(ConfigError::Validation)?;
        app_config.layout_mut().set_alignment(alignment);
    }

    let builder = DiagramBuilder::new(app_config);
    let graph = builder.load_file(&args.input)?;

    let mut diagram = builder.new_diagram();
    diagram.set_show_bounding_box_hints(args.hints);
    seed_roots(&mut diagram, &graph, args);
    if diagram.is_empty() {
        warn!("No diagram roots selected; the output will be empty");
    }
    diagram.expand_levels(&graph, args.expand_level);
    diagram.set_scale(args.scale);
    builder.layout(&mut diagram)?;

    // Without a callback oversized images are written as is.
    let mut confirm = ask;
    let interactive = !args.yes && io::stdin().is_terminal();
    let (outcome, written) = builder.export(
        &mut diagram,
        Path::new(&args.output),
        args.format.as_deref(),
        interactive.then_some(&mut confirm as Confirm<'_>),
    )?;

    match outcome {
        ExportOutcome::Written => {
            info!(output_file:? = written; "Diagram exported successfully")
        }
        ExportOutcome::Declined => warn!(output_file:? = written; "Nothing written"),
    }

    Ok(())
}

/// Adds the roots named on the command line, or every top-level element
/// when none are named.
fn seed_roots(diagram: &mut Diagram, graph: &SchemaGraph, args: &Args) {
    if args.all || args.roots.is_empty() {
        diagram.add_all(graph, graph.top_level_elements());
    }

    for name in &args.roots {
        let found = find_root(graph, name);
        if found.is_empty() {
            warn!(name; "No top-level declaration with this name");
            continue;
        }
        diagram.add_all(graph, found);
    }
}

/// Elements by local name first, then types and groups.
fn find_root(graph: &SchemaGraph, name: &str) -> Vec<NodeId> {
    let elements = graph.find_elements_by_local_name(name);
    if !elements.is_empty() {
        return elements;
    }

    [
        DeclarationKind::ComplexType,
        DeclarationKind::SimpleType,
        DeclarationKind::Group,
    ]
    .into_iter()
    .flat_map(|kind| graph.top_level(kind))
    .filter(|id| graph.node(*id).is_some_and(|node| node.name == name))
    .collect()
}

/// Asks on the terminal; anything but `y`/`yes` declines.
fn ask(title: &str, message: &str) -> bool {
    let stdin = io::stdin();
    let mut stderr = io::stderr();
    if write!(stderr, "{title}: {message} [y/N] ").is_err() || stderr.flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if stdin.lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
