//! Stroke definitions for box borders, connectors and hint rectangles.
//!
//! A [`StrokeDefinition`] is consumed by two very different sinks: the SVG
//! backend maps it onto `stroke-*` attributes through
//! [`apply_stroke!`](crate::apply_stroke!), and the raster backends read
//! [`StrokeStyle::dash_pattern`] to build a tiny-skia dash.
//!
//! ```
//! use xsdiagram_core::color::Color;
//! use xsdiagram_core::draw::StrokeDefinition;
//! use svg::node::element as svg_element;
//!
//! let stroke = StrokeDefinition::dashed(Color::new("gray").unwrap(), 1.0);
//! let rect = svg_element::Rectangle::new().set("width", 10).set("height", 10);
//! let rect = xsdiagram_core::apply_stroke!(rect, &stroke);
//! ```

use crate::color::Color;

/// Line pattern of a stroke.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum StrokeStyle {
    #[default]
    Solid,
    /// 5 units on, 5 units off
    Dashed,
}

impl StrokeStyle {
    /// Returns the dash/gap lengths of this style, or `None` for solid lines.
    pub fn dash_pattern(&self) -> Option<[f32; 2]> {
        match self {
            Self::Solid => None,
            Self::Dashed => Some([5.0, 5.0]),
        }
    }

    /// Returns the SVG `stroke-dasharray` value, or `None` for solid lines.
    pub fn to_svg_value(&self) -> Option<String> {
        self.dash_pattern()
            .map(|[on, off]| format!("{on},{off}"))
    }
}

/// Color, width and pattern of a stroked outline or line.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokeDefinition {
    color: Color,
    width: f32,
    style: StrokeStyle,
}

impl StrokeDefinition {
    /// Creates a solid stroke with the given color and width.
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width,
            style: StrokeStyle::Solid,
        }
    }

    pub fn solid(color: Color, width: f32) -> Self {
        Self::new(color, width)
    }

    pub fn dashed(color: Color, width: f32) -> Self {
        Self {
            style: StrokeStyle::Dashed,
            ..Self::new(color, width)
        }
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }
}

impl Default for StrokeDefinition {
    fn default() -> Self {
        Self::new(Color::default(), 1.0)
    }
}

/// Apply color, opacity, width and dash pattern of a [`StrokeDefinition`] to an SVG element.
#[macro_export]
macro_rules! apply_stroke {
    ($element:expr, $stroke:expr) => {{
        let mut elem = $element
            .set("stroke", $stroke.color().to_string())
            .set("stroke-opacity", $stroke.color().alpha())
            .set("stroke-width", $stroke.width());

        if let Some(dasharray) = $stroke.style().to_svg_value() {
            elem = elem.set("stroke-dasharray", dasharray);
        }

        elem
    }};
}
