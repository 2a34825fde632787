//! Off-screen raster backend.

use log::debug;

use xsdiagram_core::{
    draw::TextMeasure,
    geometry::{Bounds, Point, Size},
};

use super::{
    BoxVisual, ExpandGlyphState, RenderStyle, Renderer, SvgRenderer,
    raster::{new_pixmap, parse_svg, pixel_size, usvg_options},
};
use crate::export::Error;

/// Renders the whole diagram into a pixmap sized to the scaled bounding
/// box, on a white background.
///
/// Primitives go through the vector backend first and are rasterized with
/// resvg, so a snapshot looks exactly like the exported SVG.
pub struct SnapshotRenderer<'a> {
    document: SvgRenderer<'a>,
}

impl<'a> SnapshotRenderer<'a> {
    pub fn new(style: &'a RenderStyle, measure: &'a dyn TextMeasure) -> Self {
        Self {
            document: SvgRenderer::new(style, measure),
        }
    }

    /// Pixel size of the snapshot for the current frame.
    pub fn pixel_size(&self) -> (u32, u32) {
        pixel_size(self.document.canvas(), self.document.scale())
    }

    /// Rasterizes the frame.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PixmapAlloc`] when the pixmap is too large and
    /// [`Error::Render`] when the intermediate document cannot be parsed.
    pub fn finish(self) -> Result<tiny_skia::Pixmap, Error> {
        let (width, height) = self.pixel_size();
        let options = usvg_options(self.document.font_family());
        let svg = self.document.finish().to_string();
        let tree = parse_svg(&svg, &options)?;

        let mut pixmap = new_pixmap(width, height)?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, tiny_skia::Transform::identity(), &mut pixmap.as_mut());
        debug!(width, height; "Snapshot rasterized");
        Ok(pixmap)
    }
}

impl Renderer for SnapshotRenderer<'_> {
    fn begin(&mut self, canvas: Bounds, scale: f32) {
        self.document.begin(canvas, scale);
    }

    fn draw_box(&mut self, rect: Bounds, visual: &BoxVisual) {
        self.document.draw_box(rect, visual);
    }

    fn draw_connector(&mut self, from: Point, to: Point) {
        self.document.draw_connector(from, to);
    }

    fn draw_expand_glyph(&mut self, rect: Bounds, state: ExpandGlyphState) {
        self.document.draw_expand_glyph(rect, state);
    }

    fn draw_bounding_hint(&mut self, rect: Bounds) {
        self.document.draw_bounding_hint(rect);
    }

    fn measure_text(&self, text: &str) -> Size {
        self.document.measure_text(text)
    }
}

/// Encodes a pixmap as PNG.
pub fn encode_png(pixmap: &tiny_skia::Pixmap) -> Result<Vec<u8>, Error> {
    pixmap.encode_png().map_err(|err| Error::Encode {
        format: "PNG",
        message: err.to_string(),
    })
}

/// Encodes a pixmap as baseline JPEG; `quality` is clamped to 1..=100.
///
/// Snapshots are opaque, so the alpha channel is dropped.
pub fn encode_jpeg(pixmap: &tiny_skia::Pixmap, quality: u8) -> Result<Vec<u8>, Error> {
    let (width, height) = (pixmap.width(), pixmap.height());
    let mut rgb = vec![0u8; (width as usize) * (height as usize) * 3];
    for (src, dst) in pixmap.data().chunks_exact(4).zip(rgb.chunks_exact_mut(3)) {
        dst.copy_from_slice(&src[..3]);
    }

    let mut out = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
    encoder
        .encode(&rgb, width, height, image::ExtendedColorType::Rgb8)
        .map_err(|err| Error::Encode {
            format: "JPEG",
            message: err.to_string(),
        })?;
    Ok(out)
}
