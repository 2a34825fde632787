//! Writing diagrams to files and streams.
//!
//! Vector formats are always produced at scale 1.0: the exporter saves the
//! diagram scale, lays out at 1.0, renders, and restores the saved scale
//! (with a fresh layout) when the [`ScaleGuard`] drops, on success and on
//! failure alike. Raster formats are produced at the current scale; images
//! wider or taller than the configured threshold need confirmation when a
//! callback is supplied.

use std::{
    fmt,
    io::{self, Write},
    ops::{Deref, DerefMut},
    path::{Path, PathBuf},
};

use log::{debug, info, warn};
use thiserror::Error;

use xsdiagram_core::draw::TextMeasure;

use crate::{
    diagram::Diagram,
    layout::LayoutEngine,
    render::{
        RenderStyle, SnapshotRenderer, SvgRenderer, encode_jpeg, encode_png, paint,
        pdf_from_svg,
    },
};

/// Title passed to the confirmation callback for oversized raster output.
pub const LARGE_IMAGE_TITLE: &str = "Huge image generation";

/// Errors produced while rendering or writing an export.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Render error: {0}")]
    Render(String),

    #[error("failed to allocate a {width}x{height} pixmap")]
    PixmapAlloc { width: u32, height: u32 },

    #[error("failed to encode {format}: {message}")]
    Encode {
        format: &'static str,
        message: String,
    },

    #[error("failed to convert to PDF: {0}")]
    Pdf(String),
}

/// Output format of an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Svg,
    Pdf,
    Png,
    Jpeg,
}

impl ExportFormat {
    /// Parses a file-extension-like tag such as `png`, `.JPG` or `svg`.
    ///
    /// Unknown or empty tags select SVG.
    ///
    /// ```
    /// # use xsdiagram::export::ExportFormat;
    /// assert_eq!(ExportFormat::from_hint(".JPG"), ExportFormat::Jpeg);
    /// assert_eq!(ExportFormat::from_hint("emf"), ExportFormat::Svg);
    /// ```
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.trim();
        let hint = hint.strip_prefix('.').unwrap_or(hint);
        match hint.to_ascii_lowercase().as_str() {
            "pdf" => Self::Pdf,
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "svg" => Self::Svg,
            other => {
                if !other.is_empty() {
                    debug!(hint = other; "Unknown export format, using SVG");
                }
                Self::Svg
            }
        }
    }

    /// Format selected by the extension of `path`, SVG when it has none.
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_hint)
            .unwrap_or_default()
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Pdf => "pdf",
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// SVG and PDF are rendered at scale 1.0.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg | Self::Pdf)
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Result of an export that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    Written,
    /// The confirmation callback refused an oversized image; nothing was
    /// written.
    Declined,
}

/// Confirmation callback: receives a title and a message, returns whether
/// to proceed.
pub type Confirm<'c> = &'c mut dyn FnMut(&str, &str) -> bool;

/// Forces a diagram to scale 1.0 and a fresh layout for as long as it lives.
///
/// Dropping the guard restores the saved scale and lays the diagram out
/// again.
pub struct ScaleGuard<'d, 'e> {
    diagram: &'d mut Diagram,
    saved_scale: f32,
    engine: &'e LayoutEngine,
    measure: &'e dyn TextMeasure,
}

impl<'d, 'e> ScaleGuard<'d, 'e> {
    pub fn new(
        diagram: &'d mut Diagram,
        engine: &'e LayoutEngine,
        measure: &'e dyn TextMeasure,
    ) -> Self {
        let saved_scale = diagram.scale();
        diagram.set_scale(1.0);
        engine.layout(diagram, measure);
        Self {
            diagram,
            saved_scale,
            engine,
            measure,
        }
    }
}

impl Deref for ScaleGuard<'_, '_> {
    type Target = Diagram;

    fn deref(&self) -> &Self::Target {
        self.diagram
    }
}

impl DerefMut for ScaleGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.diagram
    }
}

impl Drop for ScaleGuard<'_, '_> {
    fn drop(&mut self) {
        self.diagram.set_scale(self.saved_scale);
        self.engine.layout(self.diagram, self.measure);
        debug!(scale = self.saved_scale; "Diagram scale restored");
    }
}

/// Renders diagrams in any [`ExportFormat`] and writes them out.
pub struct DiagramExporter<'a> {
    engine: &'a LayoutEngine,
    measure: &'a dyn TextMeasure,
    style: &'a RenderStyle,
    large_image_threshold: u32,
    jpeg_quality: u8,
}

impl<'a> DiagramExporter<'a> {
    pub fn new(
        engine: &'a LayoutEngine,
        measure: &'a dyn TextMeasure,
        style: &'a RenderStyle,
    ) -> Self {
        Self {
            engine,
            measure,
            style,
            large_image_threshold: 10_000,
            jpeg_quality: 90,
        }
    }

    /// Width or height in pixels above which raster output needs
    /// confirmation.
    pub fn with_large_image_threshold(mut self, threshold: u32) -> Self {
        self.large_image_threshold = threshold;
        self
    }

    pub fn with_jpeg_quality(mut self, quality: u8) -> Self {
        self.jpeg_quality = quality;
        self
    }

    /// Exports `diagram` to `path`.
    ///
    /// The format comes from `format_hint` when given, otherwise from the
    /// path extension. A path without an extension gets the extension of
    /// the chosen format. Output goes to a temporary file next to the
    /// destination that replaces it only once complete.
    ///
    /// Returns the outcome and the path actually written.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] for I/O, rendering or encoding failures. The
    /// destination is left untouched in that case.
    pub fn export_to_path(
        &self,
        diagram: &mut Diagram,
        path: &Path,
        format_hint: Option<&str>,
        confirm: Option<Confirm<'_>>,
    ) -> Result<(ExportOutcome, PathBuf), Error> {
        let format =
            format_hint.map_or_else(|| ExportFormat::from_path(path), ExportFormat::from_hint);
        let path = if path.extension().is_none() {
            path.with_extension(format.extension())
        } else {
            path.to_path_buf()
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut temp = create_temp_file(dir)?;
        let outcome = self.export_to_writer(diagram, &mut temp, format, confirm)?;
        if outcome == ExportOutcome::Written {
            // Replacing a file keeps its mode.
            if let Ok(existing) = std::fs::metadata(&path) {
                temp.as_file().set_permissions(existing.permissions())?;
            }
            temp.as_file_mut().sync_all()?;
            temp.persist(&path).map_err(|err| Error::Io(err.error))?;
            info!(path:? = path, format:%; "Diagram exported");
        }
        Ok((outcome, path))
    }

    /// Renders `diagram` as `format` into `writer`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] for I/O, rendering or encoding failures.
    pub fn export_to_writer(
        &self,
        diagram: &mut Diagram,
        writer: &mut impl Write,
        format: ExportFormat,
        confirm: Option<Confirm<'_>>,
    ) -> Result<ExportOutcome, Error> {
        if format.is_vector() {
            let guard = ScaleGuard::new(diagram, self.engine, self.measure);
            let svg = self.render_svg(&guard);
            let bytes = match format {
                ExportFormat::Pdf => pdf_from_svg(&svg, self.font_family())?,
                _ => svg.into_bytes(),
            };
            writer.write_all(&bytes)?;
            writer.flush()?;
            return Ok(ExportOutcome::Written);
        }

        self.engine.layout(diagram, self.measure);
        let mut renderer = SnapshotRenderer::new(self.style, self.measure);
        paint(diagram, &mut renderer);

        let (width, height) = renderer.pixel_size();
        if width > self.large_image_threshold || height > self.large_image_threshold {
            if let Some(confirm) = confirm {
                let message = format!("Do you agree to generate a {width}x{height} image?");
                if !confirm(LARGE_IMAGE_TITLE, &message) {
                    warn!(width, height; "Oversized image declined");
                    return Ok(ExportOutcome::Declined);
                }
            }
        }

        let pixmap = renderer.finish()?;
        let bytes = match format {
            ExportFormat::Jpeg => encode_jpeg(&pixmap, self.jpeg_quality)?,
            _ => encode_png(&pixmap)?,
        };
        writer.write_all(&bytes)?;
        writer.flush()?;
        Ok(ExportOutcome::Written)
    }

    /// Renders the current layout of `diagram` as an SVG string.
    pub fn render_svg(&self, diagram: &Diagram) -> String {
        let mut renderer = SvgRenderer::new(self.style, self.measure);
        paint(diagram, &mut renderer);
        renderer.finish().to_string()
    }

    fn font_family(&self) -> &str {
        self.measure.definition().font_family()
    }
}

/// Creates the staging file next to the destination with the permissions a
/// plain `File::create` would give it (0666 minus the umask).
#[cfg(unix)]
fn create_temp_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
    use std::{fs::Permissions, os::unix::fs::PermissionsExt};

    tempfile::Builder::new()
        .prefix(".xsdiagram")
        .permissions(Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn create_temp_file(dir: &Path) -> io::Result<tempfile::NamedTempFile> {
    tempfile::Builder::new().prefix(".xsdiagram").tempfile_in(dir)
}
