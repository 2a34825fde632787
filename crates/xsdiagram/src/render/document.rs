//! Vector document backend.

use svg::{Document, node::element as svg_element};

use xsdiagram_core::{
    apply_stroke,
    color::Color,
    draw::{LayeredOutput, RenderLayer, StrokeDefinition, SvgNode, TextMeasure},
    geometry::{Bounds, Point, Size},
};

use super::{
    BoxShape, BoxVisual, CORNER_RADIUS, ExpandGlyphState, RenderStyle, Renderer, SHADOW_OFFSET,
    elbow, glyph_sign, label_node, octagon, reference_marker,
};

/// Serializes primitives into an SVG document.
///
/// The `viewBox` is the unscaled canvas; `width` and `height` carry the
/// scale, so the geometry matches the pixmap backends exactly.
pub struct SvgRenderer<'a> {
    style: &'a RenderStyle,
    measure: &'a dyn TextMeasure,
    canvas: Bounds,
    scale: f32,
    output: LayeredOutput,
}

impl<'a> SvgRenderer<'a> {
    pub fn new(style: &'a RenderStyle, measure: &'a dyn TextMeasure) -> Self {
        Self {
            style,
            measure,
            canvas: Bounds::default(),
            scale: 1.0,
            output: LayeredOutput::new(),
        }
    }

    pub fn canvas(&self) -> Bounds {
        self.canvas
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn font_family(&self) -> &str {
        self.measure.definition().font_family()
    }

    /// Consumes the renderer and assembles the document.
    pub fn finish(self) -> Document {
        let canvas = self.canvas;
        let mut doc = Document::new()
            .set(
                "viewBox",
                (canvas.min_x(), canvas.min_y(), canvas.width(), canvas.height()),
            )
            .set("width", canvas.width() * self.scale)
            .set("height", canvas.height() * self.scale);

        for node in self.output.render() {
            doc = doc.add(node);
        }
        doc
    }

    fn add(&mut self, layer: RenderLayer, node: SvgNode) {
        self.output.add_to_layer(layer, node);
    }
}

impl Renderer for SvgRenderer<'_> {
    fn begin(&mut self, canvas: Bounds, scale: f32) {
        self.canvas = canvas;
        self.scale = scale;
        self.output = LayeredOutput::new();

        let background = self.style.background();
        let bg = svg_element::Rectangle::new()
            .set("x", canvas.min_x())
            .set("y", canvas.min_y())
            .set("width", canvas.width())
            .set("height", canvas.height())
            .set("fill", &background)
            .set("fill-opacity", background.alpha());
        self.add(RenderLayer::Background, Box::new(bg));
    }

    fn draw_box(&mut self, rect: Bounds, visual: &BoxVisual) {
        let fill = self.style.fill(visual.fill);
        let stroke = self.style.box_stroke(visual.optional);

        if visual.repeated {
            let shadow = rect.translate(Point::new(SHADOW_OFFSET, SHADOW_OFFSET));
            self.add(
                RenderLayer::Box,
                outline(shadow, visual.shape, fill, &stroke),
            );
        }
        self.add(RenderLayer::Box, outline(rect, visual.shape, fill, &stroke));

        if visual.reference {
            let marker = svg_element::Path::new()
                .set("d", segments_path(&reference_marker(rect)))
                .set("fill", "none");
            let marker = apply_stroke!(marker, &self.style.glyph_stroke());
            self.add(RenderLayer::Glyph, Box::new(marker));
        }

        let label = label_node(
            visual.text_rect,
            &visual.lines,
            self.measure.definition(),
            self.style.text_color(),
            visual.is_abstract,
        );
        self.add(RenderLayer::Text, Box::new(label));
    }

    fn draw_connector(&mut self, from: Point, to: Point) {
        let [start, first, second, end] = elbow(from, to);
        let data = format!(
            "M {} {} L {} {} L {} {} L {} {}",
            start.x(),
            start.y(),
            first.x(),
            first.y(),
            second.x(),
            second.y(),
            end.x(),
            end.y()
        );
        let path = svg_element::Path::new().set("d", data).set("fill", "none");
        let path = apply_stroke!(path, &self.style.connector_stroke());
        self.add(RenderLayer::Connector, Box::new(path));
    }

    fn draw_expand_glyph(&mut self, rect: Bounds, state: ExpandGlyphState) {
        let background = self.style.background();
        let square = svg_element::Rectangle::new()
            .set("x", rect.min_x())
            .set("y", rect.min_y())
            .set("width", rect.width())
            .set("height", rect.height())
            .set("fill", &background);
        let square = apply_stroke!(square, &self.style.glyph_stroke());
        self.add(RenderLayer::Glyph, Box::new(square));

        let sign = glyph_sign(rect, state);
        if !sign.is_empty() {
            let path = svg_element::Path::new()
                .set("d", segments_path(&sign))
                .set("fill", "none");
            let path = apply_stroke!(path, &self.style.glyph_stroke());
            self.add(RenderLayer::Glyph, Box::new(path));
        }
    }

    fn draw_bounding_hint(&mut self, rect: Bounds) {
        let hint = svg_element::Rectangle::new()
            .set("x", rect.min_x())
            .set("y", rect.min_y())
            .set("width", rect.width())
            .set("height", rect.height())
            .set("fill", "none");
        let hint = apply_stroke!(hint, &self.style.hint_stroke());
        self.add(RenderLayer::Hint, Box::new(hint));
    }

    fn measure_text(&self, text: &str) -> Size {
        self.measure.measure(text)
    }
}

fn outline(rect: Bounds, shape: BoxShape, fill: Color, stroke: &StrokeDefinition) -> SvgNode {
    match shape {
        BoxShape::Rectangle | BoxShape::Rounded => {
            let mut node = svg_element::Rectangle::new()
                .set("x", rect.min_x())
                .set("y", rect.min_y())
                .set("width", rect.width())
                .set("height", rect.height())
                .set("fill", &fill)
                .set("fill-opacity", fill.alpha());
            if shape == BoxShape::Rounded {
                node = node.set("rx", CORNER_RADIUS).set("ry", CORNER_RADIUS);
            }
            Box::new(apply_stroke!(node, stroke))
        }
        BoxShape::Octagon => {
            let points = octagon(rect)
                .iter()
                .map(|point| format!("{},{}", point.x(), point.y()))
                .collect::<Vec<_>>()
                .join(" ");
            let node = svg_element::Polygon::new()
                .set("points", points)
                .set("fill", &fill)
                .set("fill-opacity", fill.alpha());
            Box::new(apply_stroke!(node, stroke))
        }
    }
}

fn segments_path(segments: &[(Point, Point)]) -> String {
    segments
        .iter()
        .map(|(from, to)| format!("M {} {} L {} {}", from.x(), from.y(), to.x(), to.y()))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use xsdiagram_core::{
        draw::EstimatedMetrics,
        schema::{MaxOccurs, NodeKind, Occurs, SchemaNode},
    };

    use super::*;
    use crate::{
        config::StyleConfig,
        diagram::Diagram,
        layout::LayoutEngine,
        render::{FillRole, paint},
        testing::TreeView,
    };

    fn render(diagram: &Diagram) -> String {
        let style = RenderStyle::from_config(&StyleConfig::default()).unwrap();
        let measure = EstimatedMetrics::default();
        let mut renderer = SvgRenderer::new(&style, &measure);
        paint(diagram, &mut renderer);
        renderer.finish().to_string()
    }

    fn diagram(scale: f32) -> Diagram {
        let mut view = TreeView::new();
        let order = view.add(
            SchemaNode::new(
                NodeKind::Element {
                    type_name: None,
                    is_reference: false,
                    is_abstract: false,
                },
                "order",
                "",
            ),
            None,
        );
        let mut line = SchemaNode::new(
            NodeKind::Element {
                type_name: None,
                is_reference: true,
                is_abstract: false,
            },
            "line",
            "",
        );
        line.occurs = Occurs::new(0, MaxOccurs::Bounded(5));
        view.add(line, Some(order));

        let mut diagram = Diagram::new();
        diagram.add(&view, order);
        diagram.expand_levels(&view, 1);
        diagram.set_scale(scale);
        LayoutEngine::new().layout(&mut diagram, &EstimatedMetrics::default());
        diagram
    }

    #[test]
    fn test_document_layers() {
        let svg = render(&diagram(1.0));
        assert!(svg.starts_with("<svg"));
        for layer in ["background", "connector", "box", "glyph", "text"] {
            assert!(
                svg.contains(&format!("data-layer=\"{layer}\"")),
                "missing {layer} layer"
            );
        }
        assert!(!svg.contains("data-layer=\"hint\""));
    }

    #[test]
    fn test_optional_repeated_reference_styling() {
        let svg = render(&diagram(1.0));
        // One dashed outline plus its stacked copy.
        assert_eq!(svg.matches("stroke-dasharray=\"5,5\"").count(), 2);
        assert!(svg.contains("0..5"));
        assert!(svg.contains(">line<"));
    }

    #[test]
    fn test_size_carries_scale() {
        let diagram = diagram(2.0);
        let bounds = diagram.bounding_box();
        let svg = render(&diagram);
        assert!(svg.contains(&format!("width=\"{}\"", bounds.width() * 2.0)));
        assert!(svg.contains(&format!(
            "viewBox=\"{} {} {} {}\"",
            bounds.min_x(),
            bounds.min_y(),
            bounds.width(),
            bounds.height()
        )));
    }

    #[test]
    fn test_octagon_outline() {
        let style = RenderStyle::from_config(&StyleConfig::default()).unwrap();
        let rect = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(40.0, 20.0));
        let node = outline(
            rect,
            BoxShape::Octagon,
            style.fill(FillRole::Group),
            &style.box_stroke(false),
        )
        .to_string();
        assert!(node.starts_with("<polygon"));
        assert!(node.contains("points=\"5,0 35,0 40,5"));
    }
}
