//! The visualized subset of a schema.
//!
//! A [`Diagram`] owns an arena of [`DiagramItem`]s addressed by [`ItemId`].
//! Roots are added by schema node; children are fetched from the
//! [`SchemaGraphView`] the first time an item is expanded and kept when it is
//! collapsed again. Nothing here computes geometry: after any structural
//! change, run a [`LayoutEngine`](crate::layout::LayoutEngine) pass before
//! hit-testing or rendering.
//!
//! Expansion is always explicit and one level at a time, so recursive
//! schemas never expand without bound.

mod item;

pub use item::{DiagramItem, ItemId, ItemKind};

use std::{fmt, str::FromStr};

use log::{debug, info, warn};
use serde::Deserialize;

use xsdiagram_core::{
    geometry::{Bounds, Point},
    schema::{AttributeDescriptor, DeclarationKind, NodeId, QualifiedName, SchemaGraphView},
};

/// Smallest display scale accepted by [`Diagram::set_scale`].
pub const MIN_SCALE: f32 = 0.1;
/// Largest display scale accepted by [`Diagram::set_scale`].
pub const MAX_SCALE: f32 = 10.0;

/// Placement of a parent box against the span of its children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Parent top on the first child's top.
    Near,
    /// Parent centered on the children's span.
    #[default]
    Center,
    /// Parent bottom on the last child's bottom.
    Far,
}

impl FromStr for Alignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "near" => Ok(Self::Near),
            "center" => Ok(Self::Center),
            "far" => Ok(Self::Far),
            other => Err(format!(
                "unknown alignment `{other}` (expected near, center or far)"
            )),
        }
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Near => "near",
            Self::Center => "center",
            Self::Far => "far",
        })
    }
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    item: Option<DiagramItem>,
}

/// Aggregate root of the diagram tree.
#[derive(Debug)]
pub struct Diagram {
    slots: Vec<Slot>,
    free: Vec<usize>,
    roots: Vec<ItemId>,
    scale: f32,
    alignment: Alignment,
    padding: f32,
    show_bounding_box_hints: bool,
    bounding_box: Bounds,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagram {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            scale: 1.0,
            alignment: Alignment::default(),
            padding: 10.0,
            show_bounding_box_hints: false,
            bounding_box: Bounds::default(),
        }
    }

    /// Root items in stacking order.
    pub fn roots(&self) -> &[ItemId] {
        &self.roots
    }

    /// Resolves a handle; `None` for removed items and stale handles.
    pub fn item(&self, id: ItemId) -> Option<&DiagramItem> {
        self.slots
            .get(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.item.as_ref())
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut DiagramItem> {
        self.slots
            .get_mut(id.index())
            .filter(|slot| slot.generation == id.generation())
            .and_then(|slot| slot.item.as_mut())
    }

    /// Number of live items, visible or not.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|slot| slot.item.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Sets the display scale, clamped to [`MIN_SCALE`]..=[`MAX_SCALE`].
    /// Non-finite values are ignored.
    pub fn set_scale(&mut self, scale: f32) {
        if !scale.is_finite() {
            warn!(scale; "Ignoring non-finite scale");
            return;
        }
        self.scale = scale.clamp(MIN_SCALE, MAX_SCALE);
    }

    pub fn alignment(&self) -> Alignment {
        self.alignment
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        self.alignment = alignment;
    }

    /// Margin around the diagram content, in unscaled units.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    pub fn set_padding(&mut self, padding: f32) {
        self.padding = padding.max(0.0);
    }

    pub fn show_bounding_box_hints(&self) -> bool {
        self.show_bounding_box_hints
    }

    pub fn set_show_bounding_box_hints(&mut self, show: bool) {
        self.show_bounding_box_hints = show;
    }

    /// Extent of the last layout pass, unscaled and padded. Empty at the
    /// origin for an empty diagram.
    pub fn bounding_box(&self) -> Bounds {
        self.bounding_box
    }

    pub(crate) fn set_bounding_box(&mut self, bounds: Bounds) {
        self.bounding_box = bounds;
    }

    /// Adds a top-level declaration as a root item.
    ///
    /// Adding a declaration that is already a root returns the existing
    /// item. Only elements, groups and types can be roots; anything else is
    /// refused with `None`.
    pub fn add(&mut self, view: &dyn SchemaGraphView, node_id: NodeId) -> Option<ItemId> {
        let Some(node) = view.node(node_id) else {
            warn!(node = node_id.index(); "Unknown schema node not added");
            return None;
        };
        let kind = match ItemKind::from_node_kind(&node.kind) {
            Some(kind) if kind.is_root_kind() => kind,
            _ => {
                warn!(full_name = node.full_name(); "Declaration cannot be a diagram root");
                return None;
            }
        };

        let full_name = node.full_name();
        if let Some(existing) = self.roots.iter().copied().find(|root| {
            self.item(*root)
                .is_some_and(|item| item.full_name() == full_name)
        }) {
            debug!(full_name; "Root already present");
            return Some(existing);
        }

        let item = DiagramItem::new(kind, node_id, node, None, view.has_child_content(node_id));
        let id = self.insert(item);
        self.roots.push(id);
        info!(full_name; "Root added");
        Some(id)
    }

    /// Adds every given declaration; returns the root items in order,
    /// skipping declarations that cannot be roots.
    pub fn add_all(
        &mut self,
        view: &dyn SchemaGraphView,
        nodes: impl IntoIterator<Item = NodeId>,
    ) -> Vec<ItemId> {
        nodes
            .into_iter()
            .filter_map(|node| self.add(view, node))
            .collect()
    }

    /// Detaches `id` from its parent (or from the roots) and frees its
    /// subtree. A parent losing its last child becomes unmaterialized and
    /// collapsed. Returns `false` for unknown handles.
    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(parent) = self.item(id).map(|item| item.parent) else {
            return false;
        };

        match parent {
            Some(parent_id) => {
                if let Some(parent) = self.item_mut(parent_id) {
                    parent.children.retain(|child| *child != id);
                    if parent.children.is_empty() {
                        parent.materialized = false;
                        parent.show_children = false;
                    }
                }
            }
            None => self.roots.retain(|root| *root != id),
        }

        let freed = self.free_subtree(id);
        debug!(freed; "Item removed");
        true
    }

    /// Removes every item. All previously issued handles become stale.
    pub fn remove_all(&mut self) {
        self.free.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.item.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(index);
        }
        self.roots.clear();
        self.bounding_box = Bounds::default();
        info!("Diagram cleared");
    }

    /// Alias of [`remove_all`](Self::remove_all).
    pub fn clear(&mut self) {
        self.remove_all();
    }

    /// Fetches the children of `id` from the schema, once.
    ///
    /// Attributes never become boxes. References that do not resolve simply
    /// produce no children. Does nothing for materialized items.
    pub fn expand_children(&mut self, view: &dyn SchemaGraphView, id: ItemId) {
        let Some(item) = self.item(id) else {
            return;
        };
        if item.materialized {
            return;
        }
        let node = item.node();

        let mut children = Vec::new();
        for child_node in view.child_content(node) {
            let Some(schema_node) = view.node(child_node) else {
                debug!(node = child_node.index(); "Dangling child content skipped");
                continue;
            };
            let kind = match ItemKind::from_node_kind(&schema_node.kind) {
                Some(ItemKind::Attribute) | None => continue,
                Some(kind) => kind,
            };
            let has_child_elements = view.has_child_content(child_node);
            let child =
                DiagramItem::new(kind, child_node, schema_node, Some(id), has_child_elements);
            children.push(self.insert(child));
        }

        if let Some(item) = self.item_mut(id) {
            debug!(
                full_name = item.full_name(),
                children = children.len();
                "Children materialized"
            );
            item.has_child_elements = !children.is_empty();
            item.children = children;
            item.materialized = true;
        }
    }

    /// Shows or hides the children of `id`. Showing materializes first;
    /// items without child elements stay collapsed.
    pub fn set_show_children(&mut self, view: &dyn SchemaGraphView, id: ItemId, show: bool) {
        let Some(item) = self.item(id) else {
            return;
        };
        if !show {
            if let Some(item) = self.item_mut(id) {
                item.show_children = false;
            }
            return;
        }
        if !item.has_child_elements {
            return;
        }
        if !item.materialized {
            self.expand_children(view, id);
        }
        if let Some(item) = self.item_mut(id) {
            item.show_children = !item.children.is_empty();
        }
    }

    /// Click on an expand glyph: materialize and show on first use,
    /// otherwise flip visibility.
    pub fn toggle_children(&mut self, view: &dyn SchemaGraphView, id: ItemId) {
        let Some(item) = self.item(id) else {
            return;
        };
        let show = !item.materialized || item.children.is_empty() || !item.show_children;
        self.set_show_children(view, id, show);
    }

    /// Expands every visible collapsed item by exactly one level.
    ///
    /// Children created by this call are not expanded by it.
    pub fn expand_one_level(&mut self, view: &dyn SchemaGraphView) {
        let pending: Vec<ItemId> = self
            .visible_items()
            .into_iter()
            .filter(|id| {
                self.item(*id)
                    .is_some_and(|item| item.has_child_elements && !item.show_children)
            })
            .collect();

        for id in &pending {
            self.expand_children(view, *id);
        }
        for id in &pending {
            if let Some(item) = self.item_mut(*id) {
                item.show_children = !item.children.is_empty();
            }
        }
        debug!(expanded = pending.len(); "Expanded one level");
    }

    /// Runs [`expand_one_level`](Self::expand_one_level) `levels` times.
    pub fn expand_levels(&mut self, view: &dyn SchemaGraphView, levels: usize) {
        for _ in 0..levels {
            self.expand_one_level(view);
        }
    }

    /// Visible items in pre-order: each item before its children, roots in
    /// stacking order.
    pub fn visible_items(&self) -> Vec<ItemId> {
        let mut out = Vec::new();
        let mut stack: Vec<ItemId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(item) = self.item(id) else {
                continue;
            };
            out.push(id);
            if item.children_visible() {
                stack.extend(item.children.iter().rev().copied());
            }
        }
        out
    }

    /// Visible children of `id`, empty when collapsed.
    pub fn visible_children(&self, id: ItemId) -> &[ItemId] {
        match self.item(id) {
            Some(item) if item.children_visible() => &item.children,
            _ => &[],
        }
    }

    /// Returns `/a/b/c`, the names of the named element items from the root
    /// down to `id`. Groups, types and compositors are skipped.
    pub fn element_path(&self, id: ItemId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(item) = current.and_then(|id| self.item(id)) {
            if item.kind().is_element() && !item.name().is_empty() {
                names.push(item.name());
            }
            current = item.parent;
        }
        names
            .iter()
            .rev()
            .map(|name| format!("/{name}"))
            .collect()
    }

    /// Annotation text of the item's declaration. Element references
    /// without their own annotation use the referenced element's.
    pub fn documentation_of(&self, view: &dyn SchemaGraphView, id: ItemId) -> Option<String> {
        let item = self.item(id)?;
        let node = view.node(item.node())?;
        if let Some(documentation) = &node.documentation {
            return Some(documentation.clone());
        }
        if !item.kind().is_reference() || !item.kind().is_element() {
            return None;
        }
        let target = view.resolve(
            DeclarationKind::Element,
            &QualifiedName::new(item.namespace(), item.name()),
        )?;
        view.node(target)?.documentation.clone()
    }

    /// Attribute panel rows for the item.
    pub fn attributes_of(
        &self,
        view: &dyn SchemaGraphView,
        id: ItemId,
    ) -> Vec<AttributeDescriptor> {
        self.item(id)
            .map(|item| view.attributes(item.node()))
            .unwrap_or_default()
    }

    /// Enumeration facets of the simple type behind the item.
    pub fn enumerations_of(&self, view: &dyn SchemaGraphView, id: ItemId) -> Vec<String> {
        self.item(id)
            .map(|item| view.enumerations(item.node()))
            .unwrap_or_default()
    }

    /// Applies the display scale to a diagram-space point.
    pub fn scale_point(&self, point: Point) -> Point {
        point.scale(self.scale)
    }

    /// Applies the display scale to a diagram-space rectangle.
    pub fn scale_rectangle(&self, bounds: Bounds) -> Bounds {
        bounds.scale(self.scale)
    }

    /// Converts a point on a scrolled, scaled view to unscaled diagram space.
    pub fn view_to_diagram(&self, view_point: Point, scroll: Point) -> Point {
        view_point.add_point(scroll).scale(1.0 / self.scale)
    }

    fn insert(&mut self, item: DiagramItem) -> ItemId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.item = Some(item);
                ItemId::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    item: Some(item),
                });
                ItemId::new(self.slots.len() - 1, 0)
            }
        }
    }

    fn free_subtree(&mut self, id: ItemId) -> usize {
        let mut freed = 0;
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index())
                .filter(|slot| slot.generation == id.generation())
            else {
                continue;
            };
            if let Some(item) = slot.item.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(id.index());
                stack.extend(item.children);
                freed += 1;
            }
        }
        freed
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;
    use xsdiagram_core::schema::{CompositorKind, MaxOccurs, NodeKind, Occurs, SchemaNode};

    use super::*;
    use crate::testing::TreeView;

    fn element(kind_ref: bool) -> NodeKind {
        NodeKind::Element {
            type_name: None,
            is_reference: kind_ref,
            is_abstract: false,
        }
    }

    /// root(a(x, y), b), other
    fn sample() -> (TreeView, NodeId, NodeId) {
        let mut view = TreeView::new();
        let root = view.add(SchemaNode::new(element(false), "root", "urn:t"), None);
        let seq = view.add(
            SchemaNode::new(NodeKind::Compositor(CompositorKind::Sequence), "", "urn:t"),
            Some(root),
        );
        let a = view.add(SchemaNode::new(element(false), "a", "urn:t"), Some(seq));
        view.add(SchemaNode::new(element(false), "x", "urn:t"), Some(a));
        view.add(SchemaNode::new(element(false), "y", "urn:t"), Some(a));
        view.add(SchemaNode::new(element(false), "b", "urn:t"), Some(seq));
        let other = view.add(SchemaNode::new(element(false), "other", "urn:t"), None);
        (view, root, other)
    }

    fn names(diagram: &Diagram, ids: &[ItemId]) -> Vec<String> {
        ids.iter()
            .map(|id| diagram.item(*id).unwrap().label_lines()[0].clone())
            .collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let (view, root, other) = sample();
        let mut diagram = Diagram::new();

        let first = diagram.add(&view, root).unwrap();
        let second = diagram.add(&view, root).unwrap();
        assert_eq!(first, second);
        assert_eq!(diagram.roots().len(), 1);

        diagram.add(&view, other);
        assert_eq!(diagram.roots().len(), 2);
    }

    #[test]
    fn test_add_refuses_particles() {
        let (view, root, _) = sample();
        let seq = view.child_content(root)[0];
        let mut diagram = Diagram::new();
        assert_eq!(diagram.add(&view, seq), None);
        assert!(diagram.is_empty());
    }

    #[test]
    fn test_expand_one_level_does_not_cascade() {
        let (view, root, _) = sample();
        let mut diagram = Diagram::new();
        let root_item = diagram.add(&view, root).unwrap();

        diagram.expand_one_level(&view);
        assert_eq!(names(&diagram, &diagram.visible_items()), ["root", "sequence"]);
        let seq = diagram.item(root_item).unwrap().children()[0];
        assert!(!diagram.item(seq).unwrap().is_materialized());

        diagram.expand_levels(&view, 2);
        assert_eq!(
            names(&diagram, &diagram.visible_items()),
            ["root", "sequence", "a", "x", "y", "b"]
        );
    }

    #[test]
    fn test_collapse_keeps_children() {
        let (view, root, _) = sample();
        let mut diagram = Diagram::new();
        let root_item = diagram.add(&view, root).unwrap();

        diagram.toggle_children(&view, root_item);
        let children = diagram.item(root_item).unwrap().children().to_vec();
        assert!(diagram.item(root_item).unwrap().show_children());

        diagram.toggle_children(&view, root_item);
        let item = diagram.item(root_item).unwrap();
        assert!(!item.show_children());
        assert!(item.is_materialized());
        assert_eq!(item.children(), children.as_slice());
        assert_eq!(diagram.visible_items(), [root_item]);

        diagram.toggle_children(&view, root_item);
        assert_eq!(diagram.item(root_item).unwrap().children(), children.as_slice());
    }

    #[test]
    fn test_expand_one_level_reshows_collapsed_items() {
        let (view, root, _) = sample();
        let mut diagram = Diagram::new();
        let root_item = diagram.add(&view, root).unwrap();
        diagram.expand_one_level(&view);
        diagram.set_show_children(&view, root_item, false);

        diagram.expand_one_level(&view);
        assert!(diagram.item(root_item).unwrap().show_children());
        assert_eq!(diagram.visible_items().len(), 2);
    }

    #[test]
    fn test_leaf_cannot_be_shown() {
        let (view, _, other) = sample();
        let mut diagram = Diagram::new();
        let leaf = diagram.add(&view, other).unwrap();

        diagram.set_show_children(&view, leaf, true);
        let item = diagram.item(leaf).unwrap();
        assert!(!item.show_children());
        assert!(!item.has_child_elements());
    }

    #[test]
    fn test_remove_last_child_resets_parent() {
        let (view, root, _) = sample();
        let mut diagram = Diagram::new();
        let root_item = diagram.add(&view, root).unwrap();
        diagram.expand_levels(&view, 1);

        let seq = diagram.item(root_item).unwrap().children()[0];
        assert!(diagram.remove(seq));
        assert!(diagram.item(seq).is_none());

        let item = diagram.item(root_item).unwrap();
        assert!(!item.is_materialized());
        assert!(!item.show_children());
        assert!(item.has_child_elements());
        assert!(!diagram.remove(seq));
    }

    #[test]
    fn test_remove_frees_subtree() {
        let (view, root, other) = sample();
        let mut diagram = Diagram::new();
        let root_item = diagram.add(&view, root).unwrap();
        diagram.add(&view, other);
        diagram.expand_levels(&view, 3);
        assert_eq!(diagram.len(), 7);

        diagram.remove(root_item);
        assert_eq!(diagram.len(), 1);
        assert_eq!(diagram.roots().len(), 1);

        // The freed slots are reused without reviving old handles.
        let again = diagram.add(&view, root).unwrap();
        assert_ne!(again, root_item);
        assert!(diagram.item(root_item).is_none());
    }

    #[test]
    fn test_remove_all_invalidates_handles() {
        let (view, root, other) = sample();
        let mut diagram = Diagram::new();
        let ids = diagram.add_all(&view, [root, other]);
        assert_eq!(ids.len(), 2);

        diagram.remove_all();
        assert!(diagram.is_empty());
        assert_eq!(diagram.len(), 0);
        assert!(ids.iter().all(|id| diagram.item(*id).is_none()));
        assert!(diagram.bounding_box().is_empty());
    }

    #[test]
    fn test_element_path_skips_compositors() {
        let (view, root, _) = sample();
        let mut diagram = Diagram::new();
        diagram.add(&view, root);
        diagram.expand_levels(&view, 3);

        let visible = diagram.visible_items();
        let x = visible[3];
        assert_eq!(diagram.element_path(x), "/root/a/x");
        assert_eq!(diagram.element_path(visible[1]), "/root");
    }

    #[test]
    fn test_documentation_of_reference_falls_back() {
        let mut view = TreeView::new();
        let mut target = SchemaNode::new(element(false), "item", "urn:t");
        target.documentation = Some("An item.".to_string());
        view.add(target, None);
        let holder = view.add(SchemaNode::new(element(false), "holder", "urn:t"), None);
        let mut reference = SchemaNode::new(element(true), "item", "urn:t");
        reference.occurs = Occurs::new(0, MaxOccurs::Unbounded);
        view.add(reference, Some(holder));

        let mut diagram = Diagram::new();
        let holder_item = diagram.add(&view, holder).unwrap();
        diagram.expand_one_level(&view);
        let reference_item = diagram.item(holder_item).unwrap().children()[0];

        assert_eq!(
            diagram.documentation_of(&view, reference_item).as_deref(),
            Some("An item.")
        );
        assert_eq!(diagram.documentation_of(&view, holder_item), None);
    }

    #[test]
    fn test_scale_is_clamped() {
        let mut diagram = Diagram::new();
        diagram.set_scale(50.0);
        assert_approx_eq!(f32, diagram.scale(), MAX_SCALE);
        diagram.set_scale(0.0);
        assert_approx_eq!(f32, diagram.scale(), MIN_SCALE);
        diagram.set_scale(f32::NAN);
        assert_approx_eq!(f32, diagram.scale(), MIN_SCALE);
    }

    #[test]
    fn test_view_to_diagram() {
        let mut diagram = Diagram::new();
        diagram.set_scale(2.0);
        let point = diagram.view_to_diagram(Point::new(10.0, 20.0), Point::new(30.0, 40.0));
        assert_approx_eq!(f32, point.x(), 20.0);
        assert_approx_eq!(f32, point.y(), 30.0);
        let back = diagram.scale_point(point);
        assert_approx_eq!(f32, back.x(), 40.0);
    }

    #[test]
    fn test_alignment_from_str() {
        assert_eq!("Near".parse::<Alignment>(), Ok(Alignment::Near));
        assert_eq!("far".parse::<Alignment>(), Ok(Alignment::Far));
        assert!("middle".parse::<Alignment>().is_err());
        assert_eq!(Alignment::Center.to_string(), "center");
    }
}
