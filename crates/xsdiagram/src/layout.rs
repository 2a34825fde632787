//! Tree layout of the visible diagram items.
//!
//! Boxes are placed left to right by depth and top to bottom by insertion
//! order. Each item first gets an intrinsic box size from its label, then a
//! subtree size from its visible children:
//!
//! ```text
//! height = max(own height, sum of child subtree heights + spacing * (n - 1))
//! width  = own width + connector length + widest child subtree
//! ```
//!
//! Roots are stacked at the left margin. A parent box is aligned against the
//! span of its children's boxes according to the diagram's
//! [`Alignment`], clamped into its own band. When the parent is taller than
//! its children, the children are shifted inside the band so the same
//! alignment still holds.
//!
//! Layout writes unscaled rectangles only. Scaling is a separate, pure
//! transform ([`Diagram::scale_rectangle`]).

use std::collections::HashMap;

use log::{debug, info};

use xsdiagram_core::{
    draw::TextMeasure,
    geometry::{Bounds, Insets, Point, Size},
};

use crate::{
    config::LayoutConfig,
    diagram::{Alignment, Diagram, DiagramItem, ItemId},
    error::XsDiagramError,
};

#[derive(Debug, Clone, Copy)]
struct Measured {
    own: Size,
    subtree: Size,
    /// Height of the stacked child subtrees, zero when collapsed.
    children_height: f32,
}

/// Computes box rectangles for a [`Diagram`].
///
/// # Examples
///
/// ```
/// # use xsdiagram::layout::LayoutEngine;
/// # use xsdiagram_core::geometry::Size;
/// let engine = LayoutEngine::new()
///     .with_spacing(8.0)
///     .with_connector_length(24.0)
///     .with_min_box_size(Size::new(40.0, 20.0));
/// assert_eq!(engine.spacing(), 8.0);
/// ```
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    spacing: f32,
    connector_length: f32,
    label_padding: f32,
    glyph_size: f32,
    min_box_size: Size,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            spacing: 10.0,
            connector_length: 20.0,
            label_padding: 6.0,
            glyph_size: 10.0,
            min_box_size: Size::new(50.0, 25.0),
        }
    }

    /// Builds an engine from the layout section of the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`XsDiagramError::Layout`] when a length is negative or not
    /// finite.
    pub fn from_config(config: &LayoutConfig) -> Result<Self, XsDiagramError> {
        let lengths = [
            ("padding", config.padding()),
            ("spacing", config.spacing()),
            ("connector_length", config.connector_length()),
            ("label_padding", config.label_padding()),
            ("glyph_size", config.glyph_size()),
            ("min_box_width", config.min_box_width()),
            ("min_box_height", config.min_box_height()),
        ];
        for (name, value) in lengths {
            if !value.is_finite() || value < 0.0 {
                return Err(XsDiagramError::Layout(format!(
                    "`{name}` must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(Self::new()
            .with_spacing(config.spacing())
            .with_connector_length(config.connector_length())
            .with_label_padding(config.label_padding())
            .with_glyph_size(config.glyph_size())
            .with_min_box_size(Size::new(config.min_box_width(), config.min_box_height())))
    }

    pub fn with_spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn with_connector_length(mut self, length: f32) -> Self {
        self.connector_length = length;
        self
    }

    pub fn with_label_padding(mut self, padding: f32) -> Self {
        self.label_padding = padding;
        self
    }

    pub fn with_glyph_size(mut self, size: f32) -> Self {
        self.glyph_size = size;
        self
    }

    pub fn with_min_box_size(mut self, size: Size) -> Self {
        self.min_box_size = size;
        self
    }

    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    pub fn connector_length(&self) -> f32 {
        self.connector_length
    }

    /// Intrinsic size of an item's box: the label plus padding, plus room
    /// for the expand glyph.
    pub fn box_size(&self, item: &DiagramItem, measure: &dyn TextMeasure) -> Size {
        let text = measure.measure(&item.label_lines().join("\n"));
        let mut size = text.add_padding(Insets::uniform(self.label_padding));
        if item.has_expand_glyph() {
            size = Size::new(
                size.width() + self.glyph_size + self.label_padding,
                size.height().max(self.glyph_size + 2.0 * self.label_padding),
            );
        }
        size.max(self.min_box_size)
    }

    /// Lays out every visible item and updates the diagram bounding box.
    pub fn layout(&self, diagram: &mut Diagram, measure: &dyn TextMeasure) {
        let mut sizes = HashMap::new();
        let roots = diagram.roots().to_vec();
        for root in &roots {
            self.measure(diagram, *root, measure, &mut sizes);
        }

        let padding = diagram.padding();
        let mut band_top = padding;
        for root in &roots {
            self.place(diagram, *root, padding, band_top, &sizes);
            if let Some(measured) = sizes.get(root) {
                band_top += measured.subtree.height() + self.spacing;
            }
        }

        let visible = diagram.visible_items();
        let bounding_box = visible
            .iter()
            .filter_map(|id| diagram.item(*id).map(DiagramItem::box_rect))
            .reduce(|acc, rect| acc.merge(&rect))
            .map(|content| content.add_padding(Insets::uniform(padding)))
            .unwrap_or_default();
        diagram.set_bounding_box(bounding_box);

        info!(
            items = visible.len(),
            width = bounding_box.width(),
            height = bounding_box.height();
            "Layout calculated"
        );
    }

    fn measure(
        &self,
        diagram: &Diagram,
        id: ItemId,
        measure: &dyn TextMeasure,
        sizes: &mut HashMap<ItemId, Measured>,
    ) -> Measured {
        let Some(item) = diagram.item(id) else {
            return Measured {
                own: Size::default(),
                subtree: Size::default(),
                children_height: 0.0,
            };
        };
        let own = self.box_size(item, measure);

        let children = diagram.visible_children(id);
        let mut children_height = 0.0;
        let mut widest_child: f32 = 0.0;
        for (index, child) in children.iter().enumerate() {
            let child = self.measure(diagram, *child, measure, sizes);
            if index > 0 {
                children_height += self.spacing;
            }
            children_height += child.subtree.height();
            widest_child = widest_child.max(child.subtree.width());
        }

        let subtree = if children.is_empty() {
            own
        } else {
            Size::new(
                own.width() + self.connector_length + widest_child,
                own.height().max(children_height),
            )
        };

        let measured = Measured {
            own,
            subtree,
            children_height,
        };
        sizes.insert(id, measured);
        measured
    }

    fn place(
        &self,
        diagram: &mut Diagram,
        id: ItemId,
        x: f32,
        band_top: f32,
        sizes: &HashMap<ItemId, Measured>,
    ) {
        let Some(measured) = sizes.get(&id).copied() else {
            return;
        };
        let children = diagram.visible_children(id).to_vec();

        let box_top = if children.is_empty() {
            band_top
        } else {
            let child_x = x + measured.own.width() + self.connector_length;
            let slack = (measured.own.height() - measured.children_height).max(0.0);
            let offset = match diagram.alignment() {
                Alignment::Near => 0.0,
                Alignment::Center => slack / 2.0,
                Alignment::Far => slack,
            };
            let mut cursor = band_top + offset;
            for child in &children {
                self.place(diagram, *child, child_x, cursor, sizes);
                if let Some(child_measured) = sizes.get(child) {
                    cursor += child_measured.subtree.height() + self.spacing;
                }
            }

            let first_top = children
                .first()
                .and_then(|child| diagram.item(*child))
                .map_or(band_top, |child| child.box_rect().min_y());
            let last_bottom = children
                .last()
                .and_then(|child| diagram.item(*child))
                .map_or(band_top, |child| child.box_rect().max_y());
            let height = measured.own.height();
            let top = match diagram.alignment() {
                Alignment::Near => first_top,
                Alignment::Center => (first_top + last_bottom) / 2.0 - height / 2.0,
                Alignment::Far => last_bottom - height,
            };
            let lowest = band_top + measured.subtree.height() - height;
            top.min(lowest).max(band_top)
        };

        let box_rect = Bounds::new_from_top_left(Point::new(x, box_top), measured.own);
        let glyph_size = self.glyph_size;
        let label_padding = self.label_padding;
        if let Some(item) = diagram.item_mut(id) {
            item.box_rect = box_rect;
            item.subtree_rect =
                Bounds::new_from_top_left(Point::new(x, band_top), measured.subtree);
            item.expand_glyph_rect = item.has_expand_glyph().then(|| {
                Bounds::new_from_center(
                    Point::new(
                        box_rect.max_x() - label_padding - glyph_size / 2.0,
                        box_rect.center().y(),
                    ),
                    Size::new(glyph_size, glyph_size),
                )
            });
            debug!(full_name = item.full_name(), box_rect:?; "Item placed");
        }
    }
}
