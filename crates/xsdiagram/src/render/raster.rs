//! Helpers shared by the pixmap backends and the PDF conversion.

use std::sync::{Arc, OnceLock};

use log::{debug, info};

use xsdiagram_core::{color::Color, geometry::Bounds};

use crate::export::Error;

/// Loads the system fonts once per process.
fn font_database() -> Arc<usvg::fontdb::Database> {
    static FONTS: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    let fonts = FONTS.get_or_init(|| {
        let mut database = usvg::fontdb::Database::new();
        database.load_system_fonts();
        info!(faces = database.len(); "Loaded system fonts");
        Arc::new(database)
    });
    Arc::clone(fonts)
}

/// SVG parsing options backed by the shared font database.
pub(crate) fn usvg_options(font_family: &str) -> usvg::Options<'static> {
    let mut options = usvg::Options::default();
    options.fontdb = font_database();
    options.font_family = font_family.to_string();
    options
}

pub(crate) fn parse_svg(svg: &str, options: &usvg::Options) -> Result<usvg::Tree, Error> {
    usvg::Tree::from_str(svg, options)
        .map_err(|err| Error::Render(format!("failed to parse SVG: {err}")))
}

/// Whole pixels covering `bounds` at `scale`, at least one in each direction.
pub(crate) fn pixel_size(bounds: Bounds, scale: f32) -> (u32, u32) {
    let extent = |length: f32| (length * scale).ceil().max(1.0) as u32;
    (extent(bounds.width()), extent(bounds.height()))
}

pub(crate) fn new_pixmap(width: u32, height: u32) -> Result<tiny_skia::Pixmap, Error> {
    debug!(width, height; "Allocating pixmap");
    tiny_skia::Pixmap::new(width, height).ok_or(Error::PixmapAlloc { width, height })
}

pub(crate) fn skia_color(color: Color) -> tiny_skia::Color {
    let [r, g, b, a] = color.to_rgba8();
    tiny_skia::Color::from_rgba8(r, g, b, a)
}

/// Converts an SVG document to a single-page PDF sized to the document.
pub(crate) fn pdf_from_svg(svg: &str, font_family: &str) -> Result<Vec<u8>, Error> {
    let mut options = svg2pdf::usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    options.font_family = font_family.to_string();

    let tree = svg2pdf::usvg::Tree::from_str(svg, &options)
        .map_err(|err| Error::Pdf(format!("failed to parse SVG: {err}")))?;

    svg2pdf::to_pdf(
        &tree,
        svg2pdf::ConversionOptions::default(),
        svg2pdf::PageOptions::default(),
    )
    .map_err(|_| Error::Pdf("conversion failed".to_string()))
}
