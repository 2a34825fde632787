//! Drawing primitives and the backends that implement them.
//!
//! [`paint`] walks the visible tree once and issues primitives through the
//! [`Renderer`] trait, so no backend repeats layout logic. Rectangles and
//! points are always handed over in unscaled diagram units; each backend
//! applies the scale it received in [`Renderer::begin`].
//!
//! Backends:
//!
//! - [`SvgRenderer`] - vector document with z-ordered layers.
//! - [`SurfaceRenderer`] - anti-aliased pixmap for a scrolled viewport.
//! - [`SnapshotRenderer`] - off-screen pixmap of the whole diagram, encoded
//!   as PNG or JPEG.

mod document;
mod raster;
mod snapshot;
mod surface;

pub use document::SvgRenderer;
pub use snapshot::{SnapshotRenderer, encode_jpeg, encode_png};
pub use surface::{SurfaceRenderer, Viewport};

pub(crate) use raster::pdf_from_svg;

use log::debug;
use svg::node::{Text as SvgText, element as svg_element};

use xsdiagram_core::{
    color::Color,
    draw::{StrokeDefinition, TextDefinition},
    geometry::{Bounds, Point, Size},
};

use crate::{
    config::StyleConfig,
    diagram::{Diagram, DiagramItem, ItemKind},
};

/// Corner radius of rounded boxes.
const CORNER_RADIUS: f32 = 4.0;
/// Offset of the stacked copy behind repeated particles.
const SHADOW_OFFSET: f32 = 3.0;
/// Size of the reference arrow in the lower-left box corner.
const REFERENCE_MARKER_SIZE: f32 = 6.0;

/// Outline of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoxShape {
    /// Elements, attributes and wildcards.
    Rectangle,
    /// Types and groups.
    Rounded,
    /// Compositors: a rectangle with clipped corners.
    Octagon,
}

/// Which configured fill a box uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRole {
    Element,
    Type,
    Group,
}

/// How a box is drawn, derived from its item.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxVisual {
    pub lines: Vec<String>,
    pub shape: BoxShape,
    pub fill: FillRole,
    /// `minOccurs = 0`: dashed outline.
    pub optional: bool,
    /// `maxOccurs > 1`: a stacked copy behind the box.
    pub repeated: bool,
    /// References get an arrow marker.
    pub reference: bool,
    /// Abstract declarations get an italic label.
    pub is_abstract: bool,
    /// Area the label is centered in, left of the expand glyph.
    pub text_rect: Bounds,
}

impl BoxVisual {
    pub fn from_item(item: &DiagramItem) -> Self {
        let kind = item.kind();
        let (shape, fill) = match kind {
            ItemKind::Element { .. } | ItemKind::Attribute | ItemKind::Any => {
                (BoxShape::Rectangle, FillRole::Element)
            }
            ItemKind::ComplexType { .. } | ItemKind::SimpleType => {
                (BoxShape::Rounded, FillRole::Type)
            }
            ItemKind::Group { .. } => (BoxShape::Rounded, FillRole::Group),
            ItemKind::Compositor(_) => (BoxShape::Octagon, FillRole::Group),
        };

        let box_rect = item.box_rect();
        let text_rect = match item.expand_glyph_rect() {
            Some(glyph) => Bounds::new_from_top_left(
                box_rect.min_point(),
                Size::new(glyph.min_x() - box_rect.min_x(), box_rect.height()),
            ),
            None => box_rect,
        };

        Self {
            lines: item.label_lines(),
            shape,
            fill,
            optional: item.occurs().is_optional(),
            repeated: item.occurs().is_repeated(),
            reference: kind.is_reference(),
            is_abstract: kind.is_abstract(),
            text_rect,
        }
    }
}

/// State of an expand glyph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpandGlyphState {
    /// Children hidden or not fetched yet: a plus sign.
    Collapsed,
    /// Children shown: a minus sign.
    Expanded,
    /// Fetched but nothing to show: an empty square.
    Leaf,
}

impl ExpandGlyphState {
    pub fn of(item: &DiagramItem) -> Self {
        if item.is_materialized() && item.children().is_empty() {
            Self::Leaf
        } else if !item.is_materialized() || !item.show_children() {
            Self::Collapsed
        } else {
            Self::Expanded
        }
    }
}

/// The drawing contract shared by every backend.
pub trait Renderer {
    /// Starts a frame covering `canvas` at `scale`.
    fn begin(&mut self, canvas: Bounds, scale: f32);

    fn draw_box(&mut self, rect: Bounds, visual: &BoxVisual);

    /// Draws an elbow connector between two box borders.
    fn draw_connector(&mut self, from: Point, to: Point);

    fn draw_expand_glyph(&mut self, rect: Bounds, state: ExpandGlyphState);

    /// Draws the dashed subtree band of an expanded item.
    fn draw_bounding_hint(&mut self, rect: Bounds);

    fn measure_text(&self, text: &str) -> Size;
}

/// Issues the primitives for every visible item of `diagram`.
///
/// Hints come first, then per item the connectors to its children, its box
/// and its glyph, in pre-order.
pub fn paint(diagram: &Diagram, renderer: &mut dyn Renderer) {
    renderer.begin(diagram.bounding_box(), diagram.scale());

    let visible = diagram.visible_items();
    if diagram.show_bounding_box_hints() {
        for item in visible.iter().filter_map(|id| diagram.item(*id)) {
            if item.children_visible() {
                renderer.draw_bounding_hint(item.subtree_rect());
            }
        }
    }

    for id in &visible {
        let Some(item) = diagram.item(*id) else {
            continue;
        };
        let from = item.box_rect().right_center();
        for child in diagram.visible_children(*id) {
            if let Some(child) = diagram.item(*child) {
                renderer.draw_connector(from, child.box_rect().left_center());
            }
        }

        renderer.draw_box(item.box_rect(), &BoxVisual::from_item(item));
        if let Some(glyph) = item.expand_glyph_rect() {
            renderer.draw_expand_glyph(glyph, ExpandGlyphState::of(item));
        }
    }

    debug!(items = visible.len(); "Diagram painted");
}

/// Resolved colors of a rendered diagram.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    background: Color,
    element_fill: Color,
    type_fill: Color,
    group_fill: Color,
    box_stroke: Color,
    connector_color: Color,
    text_color: Color,
    hint_color: Color,
}

impl RenderStyle {
    /// # Errors
    ///
    /// Returns the message of the first invalid color.
    pub fn from_config(config: &StyleConfig) -> Result<Self, String> {
        Ok(Self {
            background: config.background_color()?,
            element_fill: config.element_fill()?,
            type_fill: config.type_fill()?,
            group_fill: config.group_fill()?,
            box_stroke: config.box_stroke()?,
            connector_color: config.connector_color()?,
            text_color: config.text_color()?,
            hint_color: config.hint_color()?,
        })
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn fill(&self, role: FillRole) -> Color {
        match role {
            FillRole::Element => self.element_fill,
            FillRole::Type => self.type_fill,
            FillRole::Group => self.group_fill,
        }
    }

    pub fn text_color(&self) -> Color {
        self.text_color
    }

    /// Outline of a box; dashed for optional particles.
    pub fn box_stroke(&self, optional: bool) -> StrokeDefinition {
        if optional {
            StrokeDefinition::dashed(self.box_stroke, 1.0)
        } else {
            StrokeDefinition::solid(self.box_stroke, 1.0)
        }
    }

    pub fn glyph_stroke(&self) -> StrokeDefinition {
        StrokeDefinition::solid(self.box_stroke, 1.0)
    }

    pub fn connector_stroke(&self) -> StrokeDefinition {
        StrokeDefinition::solid(self.connector_color, 1.0)
    }

    pub fn hint_stroke(&self) -> StrokeDefinition {
        StrokeDefinition::dashed(self.hint_color, 1.0)
    }
}

/// Orthogonal path between two borders: horizontal to the middle column,
/// vertical to the target row, then horizontal into the target.
pub(crate) fn elbow(from: Point, to: Point) -> [Point; 4] {
    let mid_x = from.x() + (to.x() - from.x()) * 0.5;
    [
        from,
        Point::new(mid_x, from.y()),
        Point::new(mid_x, to.y()),
        to,
    ]
}

/// Corners of a box with the four corners clipped.
pub(crate) fn octagon(rect: Bounds) -> [Point; 8] {
    let cut = (rect.height() * 0.25).min(rect.width() * 0.25);
    let (left, top, right, bottom) = (rect.min_x(), rect.min_y(), rect.max_x(), rect.max_y());
    [
        Point::new(left + cut, top),
        Point::new(right - cut, top),
        Point::new(right, top + cut),
        Point::new(right, bottom - cut),
        Point::new(right - cut, bottom),
        Point::new(left + cut, bottom),
        Point::new(left, bottom - cut),
        Point::new(left, top + cut),
    ]
}

/// Sign strokes inside an expand glyph.
pub(crate) fn glyph_sign(rect: Bounds, state: ExpandGlyphState) -> Vec<(Point, Point)> {
    let inset = rect.width() * 0.25;
    let center = rect.center();
    let horizontal = (
        Point::new(rect.min_x() + inset, center.y()),
        Point::new(rect.max_x() - inset, center.y()),
    );
    let vertical = (
        Point::new(center.x(), rect.min_y() + inset),
        Point::new(center.x(), rect.max_y() - inset),
    );
    match state {
        ExpandGlyphState::Collapsed => vec![horizontal, vertical],
        ExpandGlyphState::Expanded => vec![horizontal],
        ExpandGlyphState::Leaf => Vec::new(),
    }
}

/// Arrow strokes marking a reference, in the lower-left corner of `rect`.
pub(crate) fn reference_marker(rect: Bounds) -> Vec<(Point, Point)> {
    let size = REFERENCE_MARKER_SIZE.min(rect.height() * 0.5);
    let base = Point::new(rect.min_x() + 2.0, rect.max_y() - 2.0);
    let tip = Point::new(base.x() + size, base.y() - size);
    let head = size * 0.5;
    vec![
        (base, tip),
        (Point::new(tip.x() - head, tip.y()), tip),
        (Point::new(tip.x(), tip.y() + head), tip),
    ]
}

/// Label of a box as an SVG text element, centered in `rect`.
pub(crate) fn label_node(
    rect: Bounds,
    lines: &[String],
    definition: &TextDefinition,
    color: Color,
    italic: bool,
) -> svg_element::Text {
    let position = rect.center();
    let line_height = definition.line_height();
    let total_height = line_height * lines.len() as f32;
    let y_offset = -(total_height + line_height) / 2.0;

    let mut text = svg_element::Text::new("")
        .set("x", position.x())
        .set("y", position.y() + y_offset)
        .set("text-anchor", "middle")
        .set("dominant-baseline", "central")
        .set("font-family", definition.font_family())
        .set("font-size", definition.font_size_px())
        .set("fill", color.to_string())
        .set("fill-opacity", color.alpha());
    if italic {
        text = text.set("font-style", "italic");
    }

    for line in lines {
        let tspan = svg_element::TSpan::new("")
            .set("x", position.x())
            .set("dy", line_height)
            .add(SvgText::new(line.as_str()));
        text = text.add(tspan);
    }
    text
}
