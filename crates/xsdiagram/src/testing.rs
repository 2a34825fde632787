//! In-memory [`SchemaGraphView`] for unit tests.

use xsdiagram_core::schema::{
    AttributeDescriptor, DeclarationKind, NodeId, QualifiedName, SchemaGraphView, SchemaNode,
};

/// A plain tree of schema nodes: child content is exactly the nodes added
/// under a parent. Parentless nodes are the global declarations.
#[derive(Debug, Default)]
pub(crate) struct TreeView {
    nodes: Vec<SchemaNode>,
    children: Vec<Vec<NodeId>>,
    globals: Vec<NodeId>,
}

impl TreeView {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, node: SchemaNode, parent: Option<NodeId>) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(node);
        self.children.push(Vec::new());
        match parent {
            Some(parent) => self.children[parent.index()].push(id),
            None => self.globals.push(id),
        }
        id
    }
}

impl SchemaGraphView for TreeView {
    fn resolve(&self, kind: DeclarationKind, name: &QualifiedName) -> Option<NodeId> {
        self.globals.iter().copied().find(|id| {
            let node = &self.nodes[id.index()];
            node.kind.declaration_kind() == Some(kind)
                && node.name == name.local_name()
                && node.namespace == name.namespace()
        })
    }

    fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.index())
    }

    fn child_content(&self, id: NodeId) -> Vec<NodeId> {
        self.children.get(id.index()).cloned().unwrap_or_default()
    }

    fn attributes(&self, _id: NodeId) -> Vec<AttributeDescriptor> {
        Vec::new()
    }

    fn enumerations(&self, _id: NodeId) -> Vec<String> {
        Vec::new()
    }

    fn top_level(&self, kind: DeclarationKind) -> Vec<NodeId> {
        self.globals
            .iter()
            .copied()
            .filter(|id| self.nodes[id.index()].kind.declaration_kind() == Some(kind))
            .collect()
    }
}
