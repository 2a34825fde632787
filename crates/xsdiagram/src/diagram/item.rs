//! A single box of the diagram.

use xsdiagram_core::{
    geometry::Bounds,
    schema::{CompositorKind, NodeId, NodeKind, Occurs, SchemaNode},
};

/// Handle to an item of a [`Diagram`](super::Diagram).
///
/// Handles carry the generation of their arena slot: once an item is
/// removed, or the diagram is cleared, old handles stop resolving even if
/// the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId {
    index: u32,
    generation: u32,
}

impl ItemId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        Self {
            index: index as u32,
            generation,
        }
    }

    pub(crate) fn index(self) -> usize {
        self.index as usize
    }

    pub(crate) fn generation(self) -> u32 {
        self.generation
    }
}

/// What an item shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Element { is_reference: bool, is_abstract: bool },
    Attribute,
    ComplexType { is_abstract: bool },
    SimpleType,
    Group { is_reference: bool },
    Compositor(CompositorKind),
    Any,
}

impl ItemKind {
    /// Maps a schema node kind to an item kind. Attribute groups are never
    /// drawn as boxes.
    pub fn from_node_kind(kind: &NodeKind) -> Option<Self> {
        let kind = match kind {
            NodeKind::Element {
                is_reference,
                is_abstract,
                ..
            } => Self::Element {
                is_reference: *is_reference,
                is_abstract: *is_abstract,
            },
            NodeKind::ComplexType { is_abstract } => Self::ComplexType {
                is_abstract: *is_abstract,
            },
            NodeKind::SimpleType => Self::SimpleType,
            NodeKind::Group { is_reference } => Self::Group {
                is_reference: *is_reference,
            },
            NodeKind::Compositor(kind) => Self::Compositor(*kind),
            NodeKind::Any => Self::Any,
            NodeKind::Attribute => Self::Attribute,
            NodeKind::AttributeGroup => return None,
        };
        Some(kind)
    }

    /// True for kinds that may be added as diagram roots.
    pub fn is_root_kind(&self) -> bool {
        matches!(
            self,
            Self::Element { .. } | Self::Group { .. } | Self::ComplexType { .. } | Self::SimpleType
        )
    }

    pub fn is_element(&self) -> bool {
        matches!(self, Self::Element { .. })
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self,
            Self::Element {
                is_reference: true,
                ..
            } | Self::Group { is_reference: true }
        )
    }

    pub fn is_abstract(&self) -> bool {
        matches!(
            self,
            Self::Element {
                is_abstract: true,
                ..
            } | Self::ComplexType { is_abstract: true }
        )
    }
}

/// A visual node. Identity and schema data are fixed at creation; the
/// expansion flags belong to the diagram and the rectangles to the layout
/// engine.
#[derive(Debug, Clone)]
pub struct DiagramItem {
    kind: ItemKind,
    name: String,
    namespace: String,
    full_name: String,
    node: NodeId,
    occurs: Occurs,

    pub(crate) parent: Option<ItemId>,
    pub(crate) children: Vec<ItemId>,
    pub(crate) has_child_elements: bool,
    pub(crate) materialized: bool,
    pub(crate) show_children: bool,

    pub(crate) box_rect: Bounds,
    pub(crate) expand_glyph_rect: Option<Bounds>,
    pub(crate) subtree_rect: Bounds,
}

impl DiagramItem {
    pub(crate) fn new(
        kind: ItemKind,
        node_id: NodeId,
        node: &SchemaNode,
        parent: Option<ItemId>,
        has_child_elements: bool,
    ) -> Self {
        Self {
            kind,
            name: node.name.clone(),
            namespace: node.namespace.clone(),
            full_name: node.full_name(),
            node: node_id,
            occurs: node.occurs,
            parent,
            children: Vec::new(),
            has_child_elements,
            materialized: false,
            show_children: false,
            box_rect: Bounds::default(),
            expand_glyph_rect: None,
            subtree_rect: Bounds::default(),
        }
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns `namespace:kind:name`, the key of the declaration this item
    /// shows. Several items may share it.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// The schema node behind this item.
    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn occurs(&self) -> Occurs {
        self.occurs
    }

    pub fn parent(&self) -> Option<ItemId> {
        self.parent
    }

    /// Children in display order. May be non-empty while hidden.
    pub fn children(&self) -> &[ItemId] {
        &self.children
    }

    /// True when the schema node has child content, whether or not it has
    /// been fetched.
    pub fn has_child_elements(&self) -> bool {
        self.has_child_elements
    }

    /// True when the box carries an expand glyph: the node has child
    /// elements, or its content was fetched and nothing in it is drawable.
    pub fn has_expand_glyph(&self) -> bool {
        self.has_child_elements || (self.materialized && self.children.is_empty())
    }

    /// True once the children were fetched from the schema.
    pub fn is_materialized(&self) -> bool {
        self.materialized
    }

    pub fn show_children(&self) -> bool {
        self.show_children
    }

    /// True when the children are part of the visible tree.
    pub fn children_visible(&self) -> bool {
        self.show_children && self.has_child_elements && !self.children.is_empty()
    }

    /// Box rectangle from the last layout pass, unscaled.
    pub fn box_rect(&self) -> Bounds {
        self.box_rect
    }

    /// Expand glyph rectangle; see [`has_expand_glyph`](Self::has_expand_glyph).
    pub fn expand_glyph_rect(&self) -> Option<Bounds> {
        self.expand_glyph_rect
    }

    /// Band occupied by the item and its visible descendants.
    pub fn subtree_rect(&self) -> Bounds {
        self.subtree_rect
    }

    /// Lines drawn inside the box: the name, then the cardinality when it
    /// is not `1..1`.
    pub fn label_lines(&self) -> Vec<String> {
        let title = match self.kind {
            ItemKind::Compositor(kind) => kind.as_str().to_string(),
            ItemKind::Any => "any".to_string(),
            _ if self.name.is_empty() => "(anonymous)".to_string(),
            _ => self.name.clone(),
        };
        let mut lines = vec![title];
        lines.extend(self.occurs.cardinality());
        lines
    }
}

#[cfg(test)]
mod tests {
    use xsdiagram_core::schema::MaxOccurs;

    use super::*;

    fn element(name: &str) -> SchemaNode {
        SchemaNode::new(
            NodeKind::Element {
                type_name: None,
                is_reference: false,
                is_abstract: false,
            },
            name,
            "urn:t",
        )
    }

    #[test]
    fn test_item_kind_mapping() {
        let group = ItemKind::from_node_kind(&NodeKind::Group { is_reference: true }).unwrap();
        assert!(group.is_reference());
        assert!(group.is_root_kind());

        let compositor =
            ItemKind::from_node_kind(&NodeKind::Compositor(CompositorKind::All)).unwrap();
        assert!(!compositor.is_root_kind());
        assert_eq!(ItemKind::from_node_kind(&NodeKind::AttributeGroup), None);
        assert!(!ItemKind::Attribute.is_root_kind());
    }

    #[test]
    fn test_full_names() {
        let node = element("order");
        let kind = ItemKind::from_node_kind(&node.kind).unwrap();
        let item = DiagramItem::new(kind, NodeId::new(0), &node, None, false);
        assert_eq!(item.full_name(), "urn:t:element:order");

        let choice = SchemaNode::new(NodeKind::Compositor(CompositorKind::Choice), "", "urn:t");
        let item = DiagramItem::new(
            ItemKind::Compositor(CompositorKind::Choice),
            NodeId::new(1),
            &choice,
            None,
            true,
        );
        assert_eq!(item.full_name(), "urn:t:choice");
    }

    #[test]
    fn test_label_lines() {
        let mut node = element("line");
        node.occurs = Occurs::new(0, MaxOccurs::Unbounded);
        let kind = ItemKind::from_node_kind(&node.kind).unwrap();
        let item = DiagramItem::new(kind, NodeId::new(0), &node, None, false);
        assert_eq!(item.label_lines(), ["line", "0..∞"]);

        let unnamed = element("");
        let item = DiagramItem::new(kind, NodeId::new(0), &unnamed, None, false);
        assert_eq!(item.label_lines(), ["(anonymous)"]);
    }

    #[test]
    fn test_new_item_is_collapsed() {
        let node = element("a");
        let kind = ItemKind::from_node_kind(&node.kind).unwrap();
        let item = DiagramItem::new(kind, NodeId::new(3), &node, None, true);
        assert!(item.has_child_elements());
        assert!(!item.is_materialized());
        assert!(!item.show_children());
        assert!(!item.children_visible());
        assert_eq!(item.node(), NodeId::new(3));
    }
}
