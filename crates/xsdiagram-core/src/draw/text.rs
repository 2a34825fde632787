//! Text styling and measurement for box labels.
//!
//! Layout never talks to a renderer: it only needs the extent of a label.
//! That capability is the [`TextMeasure`] trait, with two implementations:
//!
//! - [`FontMetrics`] shapes text with cosmic-text against the system fonts,
//!   giving the same extents the SVG and raster backends will draw with.
//! - [`EstimatedMetrics`] uses a fixed per-character advance. It needs no
//!   fonts, so it is deterministic across machines and used for headless
//!   runs and tests.
//!
//! ```
//! # use xsdiagram_core::draw::{EstimatedMetrics, TextDefinition, TextMeasure};
//! let metrics = EstimatedMetrics::new(TextDefinition::new());
//! let size = metrics.measure("purchaseOrder");
//! assert!(size.width() > 0.0);
//! ```

use std::sync::{Mutex, OnceLock, PoisonError};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

use crate::geometry::Size;

/// Points to pixels at standard DPI.
const POINT_TO_PIXEL: f32 = 1.33;
/// Line height relative to the pixel font size.
const LINE_HEIGHT_FACTOR: f32 = 1.15;
/// Average glyph advance relative to the pixel font size.
const AVERAGE_ADVANCE_FACTOR: f32 = 0.55;

/// Font family and size of rendered labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TextDefinition {
    font_family: String,
    font_size: u16,
}

impl TextDefinition {
    /// Creates a new text definition with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the font size in points.
    pub fn set_font_size(&mut self, size: u16) {
        self.font_size = size;
    }

    /// Sets the font family (e.g. "Arial", "monospace").
    pub fn set_font_family(&mut self, family: &str) {
        self.font_family = family.to_string();
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    /// Font size converted from points to pixels.
    pub fn font_size_px(&self) -> f32 {
        self.font_size as f32 * POINT_TO_PIXEL
    }

    /// Height of a single line in pixels.
    pub fn line_height(&self) -> f32 {
        self.font_size_px() * LINE_HEIGHT_FACTOR
    }
}

impl Default for TextDefinition {
    fn default() -> Self {
        Self {
            font_family: "Arial".to_string(),
            font_size: 10,
        }
    }
}

/// Measures the unpadded extent of a label.
///
/// Implementations must be pure: the same text always yields the same size,
/// which is what makes layout deterministic.
pub trait TextMeasure {
    /// Returns the size of `text`, with one line per `\n`-separated line.
    fn measure(&self, text: &str) -> Size;

    /// Returns the definition the text is measured with.
    fn definition(&self) -> &TextDefinition;
}

/// Character-count based measurement.
#[derive(Debug, Clone, Default)]
pub struct EstimatedMetrics {
    definition: TextDefinition,
}

impl EstimatedMetrics {
    pub fn new(definition: TextDefinition) -> Self {
        Self { definition }
    }
}

impl TextMeasure for EstimatedMetrics {
    fn measure(&self, text: &str) -> Size {
        if text.is_empty() {
            return Size::default();
        }
        let advance = self.definition.font_size_px() * AVERAGE_ADVANCE_FACTOR;
        let (lines, widest) = text
            .lines()
            .fold((0usize, 0usize), |(count, widest), line| {
                (count + 1, widest.max(line.chars().count()))
            });
        Size::new(
            widest as f32 * advance,
            lines.max(1) as f32 * self.definition.line_height(),
        )
    }

    fn definition(&self) -> &TextDefinition {
        &self.definition
    }
}

/// Measurement using shaped glyph runs from the system fonts.
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    definition: TextDefinition,
}

impl FontMetrics {
    pub fn new(definition: TextDefinition) -> Self {
        Self { definition }
    }
}

impl TextMeasure for FontMetrics {
    fn measure(&self, text: &str) -> Size {
        TEXT_MANAGER
            .get_or_init(TextManager::new)
            .calculate_text_size(text, &self.definition)
    }

    fn definition(&self) -> &TextDefinition {
        &self.definition
    }
}

/// Owns the process-wide `FontSystem`, which is expensive to create.
struct TextManager {
    font_system: Mutex<FontSystem>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Mutex::new(FontSystem::new()),
        }
    }

    /// Shapes `text` and returns the extent of its layout runs.
    ///
    /// Falls back to the average-advance estimate when shaping produces no
    /// runs, e.g. when no font matches the requested family.
    fn calculate_text_size(&self, text: &str, text_def: &TextDefinition) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        // A panic in another measurement leaves the font system usable.
        let mut font_system = self
            .font_system
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let font_size_px = text_def.font_size_px();
        let metrics = Metrics::new(font_size_px, text_def.line_height());

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);
        let attrs = Attrs::new().family(Family::Name(text_def.font_family()));

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;
        let mut runs = 0;
        for run in buffer.layout_runs() {
            if let Some(last) = run.glyphs.last() {
                max_width = max_width.max(last.x + last.w);
            }
            total_height += metrics.line_height;
            runs += 1;
        }

        if runs == 0 {
            return EstimatedMetrics::new(text_def.clone()).measure(text);
        }

        Size::new(max_width, total_height)
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();
