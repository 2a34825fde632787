//! Interactive surface backend.
//!
//! Shapes are filled and stroked with tiny-skia directly; labels are
//! collected as SVG text and composited on top with resvg in
//! [`SurfaceRenderer::finish`], so glyph shaping matches the other
//! backends.

use log::debug;
use svg::Document;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Stroke, StrokeDash, Transform};

use xsdiagram_core::{
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, TextMeasure},
    geometry::{Bounds, Point, Size},
};

use super::{
    BoxShape, BoxVisual, CORNER_RADIUS, ExpandGlyphState, RenderStyle, Renderer, SHADOW_OFFSET,
    elbow, glyph_sign, label_node, octagon, reference_marker,
    raster::{new_pixmap, parse_svg, pixel_size, skia_color, usvg_options},
};
use crate::export::Error;

/// Visible part of a scaled diagram: the scroll offset and the client size,
/// both in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scroll: Point,
    pub size: Size,
}

impl Viewport {
    pub fn new(scroll: Point, size: Size) -> Self {
        Self { scroll, size }
    }

    /// The viewport in view pixels.
    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.scroll, self.size)
    }
}

/// Draws into an anti-aliased pixmap covering a [`Viewport`].
///
/// Primitives entirely outside the viewport are skipped.
pub struct SurfaceRenderer<'a> {
    style: &'a RenderStyle,
    measure: &'a dyn TextMeasure,
    viewport: Viewport,
    scale: f32,
    pixmap: Pixmap,
    labels: LayeredOutput,
    drawn_boxes: usize,
}

impl<'a> SurfaceRenderer<'a> {
    /// # Errors
    ///
    /// Returns [`Error::PixmapAlloc`] when the viewport pixmap cannot be
    /// allocated.
    pub fn new(
        style: &'a RenderStyle,
        measure: &'a dyn TextMeasure,
        viewport: Viewport,
    ) -> Result<Self, Error> {
        let view = Bounds::new_from_top_left(Point::default(), viewport.size);
        let (width, height) = pixel_size(view, 1.0);
        Ok(Self {
            style,
            measure,
            viewport,
            scale: 1.0,
            pixmap: new_pixmap(width, height)?,
            labels: LayeredOutput::new(),
            drawn_boxes: 0,
        })
    }

    /// Boxes drawn in the current frame, after culling.
    pub fn drawn_boxes(&self) -> usize {
        self.drawn_boxes
    }

    /// Composites the labels and returns the finished pixmap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] when the label overlay cannot be parsed.
    pub fn finish(mut self) -> Result<Pixmap, Error> {
        if !self.labels.is_empty() {
            let scroll = self.viewport.scroll.scale(1.0 / self.scale);
            let size = self.viewport.size.scale(1.0 / self.scale);
            let mut doc = Document::new()
                .set("viewBox", (scroll.x(), scroll.y(), size.width(), size.height()))
                .set("width", self.viewport.size.width())
                .set("height", self.viewport.size.height());
            for node in self.labels.render() {
                doc = doc.add(node);
            }

            let options = usvg_options(self.measure.definition().font_family());
            let tree = parse_svg(&doc.to_string(), &options)?;
            resvg::render(&tree, Transform::identity(), &mut self.pixmap.as_mut());
        }
        debug!(boxes = self.drawn_boxes; "Surface frame finished");
        Ok(self.pixmap)
    }

    fn transform(&self) -> Transform {
        Transform::from_row(
            self.scale,
            0.0,
            0.0,
            self.scale,
            -self.viewport.scroll.x(),
            -self.viewport.scroll.y(),
        )
    }

    fn is_visible(&self, rect: Bounds) -> bool {
        rect.scale(self.scale).intersects(&self.viewport.bounds())
    }

    fn fill(&mut self, path: &tiny_skia::Path, color: Color) {
        let mut paint = Paint::default();
        paint.set_color(skia_color(color));
        paint.anti_alias = true;
        let transform = self.transform();
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, transform, None);
    }

    fn stroke(&mut self, path: &tiny_skia::Path, definition: &StrokeDefinition) {
        let mut paint = Paint::default();
        paint.set_color(skia_color(definition.color()));
        paint.anti_alias = true;

        let mut stroke = Stroke {
            width: definition.width(),
            ..Stroke::default()
        };
        if let Some([on, off]) = definition.style().dash_pattern() {
            stroke.dash = StrokeDash::new(vec![on, off], 0.0);
        }
        let transform = self.transform();
        self.pixmap.stroke_path(path, &paint, &stroke, transform, None);
    }

    fn stroke_segments(&mut self, segments: &[(Point, Point)], definition: &StrokeDefinition) {
        let mut builder = PathBuilder::new();
        for (from, to) in segments {
            builder.move_to(from.x(), from.y());
            builder.line_to(to.x(), to.y());
        }
        if let Some(path) = builder.finish() {
            self.stroke(&path, definition);
        }
    }
}

impl Renderer for SurfaceRenderer<'_> {
    fn begin(&mut self, _canvas: Bounds, scale: f32) {
        self.scale = scale;
        self.labels = LayeredOutput::new();
        self.drawn_boxes = 0;
        self.pixmap.fill(skia_color(self.style.background()));
    }

    fn draw_box(&mut self, rect: Bounds, visual: &BoxVisual) {
        let shadow = visual
            .repeated
            .then(|| rect.translate(Point::new(SHADOW_OFFSET, SHADOW_OFFSET)));
        let extent = shadow.map_or(rect, |shadow| rect.merge(&shadow));
        if !self.is_visible(extent) {
            return;
        }
        self.drawn_boxes += 1;

        let fill = self.style.fill(visual.fill);
        let stroke = self.style.box_stroke(visual.optional);
        for outline in shadow.into_iter().chain(Some(rect)) {
            if let Some(path) = box_path(outline, visual.shape) {
                self.fill(&path, fill);
                self.stroke(&path, &stroke);
            }
        }

        if visual.reference {
            self.stroke_segments(&reference_marker(rect), &self.style.glyph_stroke());
        }

        let label = label_node(
            visual.text_rect,
            &visual.lines,
            self.measure.definition(),
            self.style.text_color(),
            visual.is_abstract,
        );
        self.labels.add_to_layer(RenderLayer::Text, Box::new(label));
    }

    fn draw_connector(&mut self, from: Point, to: Point) {
        let points = elbow(from, to);
        let extent = points[1..]
            .iter()
            .fold(Bounds::new_from_top_left(points[0], Size::default()), |acc, point| {
                acc.merge(&Bounds::new_from_top_left(*point, Size::default()))
            });
        if !self.is_visible(extent) {
            return;
        }

        let mut builder = PathBuilder::new();
        builder.move_to(points[0].x(), points[0].y());
        for point in &points[1..] {
            builder.line_to(point.x(), point.y());
        }
        if let Some(path) = builder.finish() {
            self.stroke(&path, &self.style.connector_stroke());
        }
    }

    fn draw_expand_glyph(&mut self, rect: Bounds, state: ExpandGlyphState) {
        if !self.is_visible(rect) {
            return;
        }
        if let Some(path) = box_path(rect, BoxShape::Rectangle) {
            self.fill(&path, self.style.background());
            self.stroke(&path, &self.style.glyph_stroke());
        }
        self.stroke_segments(&glyph_sign(rect, state), &self.style.glyph_stroke());
    }

    fn draw_bounding_hint(&mut self, rect: Bounds) {
        if !self.is_visible(rect) {
            return;
        }
        if let Some(path) = box_path(rect, BoxShape::Rectangle) {
            self.stroke(&path, &self.style.hint_stroke());
        }
    }

    fn measure_text(&self, text: &str) -> Size {
        self.measure.measure(text)
    }
}

fn box_path(rect: Bounds, shape: BoxShape) -> Option<tiny_skia::Path> {
    match shape {
        BoxShape::Rectangle => {
            let rect = tiny_skia::Rect::from_xywh(
                rect.min_x(),
                rect.min_y(),
                rect.width(),
                rect.height(),
            )?;
            Some(PathBuilder::from_rect(rect))
        }
        BoxShape::Rounded => {
            let r = CORNER_RADIUS.min(rect.width() / 2.0).min(rect.height() / 2.0);
            let (left, top) = (rect.min_x(), rect.min_y());
            let (right, bottom) = (rect.max_x(), rect.max_y());
            let mut builder = PathBuilder::new();
            builder.move_to(left + r, top);
            builder.line_to(right - r, top);
            builder.quad_to(right, top, right, top + r);
            builder.line_to(right, bottom - r);
            builder.quad_to(right, bottom, right - r, bottom);
            builder.line_to(left + r, bottom);
            builder.quad_to(left, bottom, left, bottom - r);
            builder.line_to(left, top + r);
            builder.quad_to(left, top, left + r, top);
            builder.close();
            builder.finish()
        }
        BoxShape::Octagon => {
            let points = octagon(rect);
            let mut builder = PathBuilder::new();
            builder.move_to(points[0].x(), points[0].y());
            for point in &points[1..] {
                builder.line_to(point.x(), point.y());
            }
            builder.close();
            builder.finish()
        }
    }
}
