//! Layer-based grouping for SVG output.
//!
//! Diagram primitives are emitted in tree order, but their paint order must
//! not depend on it: connectors go under boxes, glyphs and labels go on top.
//! [`LayeredOutput`] collects nodes per [`RenderLayer`] and emits one `<g>`
//! per non-empty layer, bottom to top.
//!
//! # Example
//!
//! ```
//! # use xsdiagram_core::draw::{RenderLayer, LayeredOutput};
//! # use svg::node::element::{Line, Rectangle};
//! let mut output = LayeredOutput::new();
//! output.add_to_layer(RenderLayer::Box, Box::new(Rectangle::new()));
//! output.add_to_layer(RenderLayer::Connector, Box::new(Line::new()));
//!
//! let groups = output.render();
//! assert_eq!(groups.len(), 2);
//! ```

use svg::node::element as svg_element;

/// Type alias for boxed SVG nodes.
pub type SvgNode = Box<dyn svg::Node>;

/// Rendering layers, bottom to top in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RenderLayer {
    /// Canvas background fill
    Background,
    /// Dashed subtree bounding-box hints
    Hint,
    /// Elbow connectors between a parent and its children
    Connector,
    /// Element, group, type and compositor boxes
    Box,
    /// Expand/collapse glyphs
    Glyph,
    /// Labels and cardinality annotations
    Text,
}

impl RenderLayer {
    /// Returns the value written to the `data-layer` attribute.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Hint => "hint",
            Self::Connector => "connector",
            Self::Box => "box",
            Self::Glyph => "glyph",
            Self::Text => "text",
        }
    }
}

/// SVG nodes tagged with the layer they belong to.
#[derive(Debug, Default)]
pub struct LayeredOutput {
    items: Vec<(RenderLayer, SvgNode)>,
}

impl LayeredOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a node to `layer`. Nodes keep insertion order within a layer.
    pub fn add_to_layer(&mut self, layer: RenderLayer, node: SvgNode) {
        self.items.push((layer, node));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the number of collected nodes across all layers.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Consumes the output and returns one `<g data-layer="...">` per
    /// non-empty layer in paint order.
    pub fn render(mut self) -> Vec<SvgNode> {
        if self.is_empty() {
            return Vec::new();
        }

        // Stable sort keeps tree order inside each layer.
        self.items.sort_by_key(|(layer, _)| *layer);

        let mut result = Vec::new();
        let mut current_layer = self.items[0].0;
        let mut current_group = svg_element::Group::new().set("data-layer", current_layer.name());

        for (layer, node) in self.items {
            if layer != current_layer {
                result.push(Box::new(current_group) as SvgNode);
                current_layer = layer;
                current_group = svg_element::Group::new().set("data-layer", layer.name());
            }
            current_group = current_group.add(node);
        }
        result.push(Box::new(current_group) as SvgNode);

        result
    }
}

#[cfg(test)]
mod tests {
    use svg::node::element::Rectangle;

    use super::*;

    #[test]
    fn test_layered_output_new_is_empty() {
        let output = LayeredOutput::new();
        assert!(output.is_empty());
        assert_eq!(output.len(), 0);
        assert!(output.render().is_empty());
    }

    #[test]
    fn test_layered_output_groups_by_layer() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Text, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Box, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Text, Box::new(Rectangle::new()));
        assert_eq!(output.len(), 3);

        let nodes = output.render();
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_layered_output_paint_order() {
        let mut output = LayeredOutput::new();
        output.add_to_layer(RenderLayer::Glyph, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Connector, Box::new(Rectangle::new()));
        output.add_to_layer(RenderLayer::Background, Box::new(Rectangle::new()));

        let rendered: Vec<String> = output.render().iter().map(|n| n.to_string()).collect();
        assert!(rendered[0].contains("data-layer=\"background\""));
        assert!(rendered[1].contains("data-layer=\"connector\""));
        assert!(rendered[2].contains("data-layer=\"glyph\""));
    }

    #[test]
    fn test_render_layer_ordering() {
        assert!(RenderLayer::Background < RenderLayer::Hint);
        assert!(RenderLayer::Connector < RenderLayer::Box);
        assert!(RenderLayer::Box < RenderLayer::Glyph);
        assert!(RenderLayer::Glyph < RenderLayer::Text);
    }
}
