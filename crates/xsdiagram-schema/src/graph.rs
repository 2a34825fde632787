//! In-memory schema graph.
//!
//! Every declaration and particle of every loaded document is a node in one
//! arena. Global declarations are additionally indexed by symbol space and
//! qualified name. References are stored by name and resolved on each query,
//! so the arena itself is acyclic even when the schema is recursive.

use std::{collections::HashSet, path::PathBuf};

use indexmap::IndexMap;
use log::debug;

use xsdiagram_core::schema::{
    AttributeDescriptor, AttributeUse, DeclarationKind, NodeId, QualifiedName,
    SchemaGraphView, SchemaNode,
};

use crate::{attributes, error::Diagnostic, span::Span};

/// Namespace of the XML Schema language itself; built-in types live here.
pub const XS_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Derivation {
    Extension,
    Restriction,
}

/// Attribute declarations in the order they appear inside a type or group.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeList {
    pub(crate) items: Vec<AttributeItem>,
    /// Namespace constraint of an `anyAttribute`, if present.
    pub(crate) any_attribute: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) enum AttributeItem {
    Attribute(NodeId),
    GroupRef(QualifiedName, Option<Span>),
}

#[derive(Debug, Clone, Default)]
pub(crate) struct TypeDetail {
    pub(crate) derivation: Option<(Derivation, QualifiedName)>,
    /// Top-level particle: a compositor or a group reference.
    pub(crate) content: Option<NodeId>,
    pub(crate) attributes: AttributeList,
}

#[derive(Debug, Clone)]
pub(crate) enum Detail {
    Element {
        element_ref: Option<QualifiedName>,
        type_ref: Option<QualifiedName>,
        inline_type: Option<NodeId>,
    },
    ComplexType(TypeDetail),
    SimpleType {
        base: Option<QualifiedName>,
        item_type: Option<QualifiedName>,
        enumerations: Vec<String>,
    },
    Group {
        group_ref: Option<QualifiedName>,
        content: Option<NodeId>,
    },
    Compositor {
        particles: Vec<NodeId>,
    },
    Any,
    Attribute {
        attribute_ref: Option<QualifiedName>,
        type_ref: Option<QualifiedName>,
        inline_type: Option<NodeId>,
        use_: Option<AttributeUse>,
        default_value: Option<String>,
        fixed_value: Option<String>,
    },
    AttributeGroup {
        attributes: AttributeList,
    },
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) summary: SchemaNode,
    pub(crate) detail: Detail,
    /// Location in the root document; `None` for included documents.
    pub(crate) span: Option<Span>,
}

/// A loaded schema: declarations from the root document and everything it
/// includes or imports.
#[derive(Debug, Default)]
pub struct SchemaGraph {
    nodes: Vec<NodeData>,
    globals: IndexMap<(&'static str, QualifiedName), NodeId>,
    files: Vec<PathBuf>,
    warnings: Vec<Diagnostic>,
}

impl SchemaGraph {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(
        &mut self,
        summary: SchemaNode,
        detail: Detail,
        span: Option<Span>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeData {
            summary,
            detail,
            span,
        });
        id
    }

    /// Registers a global declaration. A later declaration with the same
    /// name replaces the earlier one; the replaced id is returned.
    pub(crate) fn register(
        &mut self,
        kind: DeclarationKind,
        name: QualifiedName,
        id: NodeId,
    ) -> Option<NodeId> {
        self.globals.insert((kind.symbol_space(), name), id)
    }

    pub(crate) fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub(crate) fn iter_data(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.iter()
    }

    pub(crate) fn add_file(&mut self, path: PathBuf) {
        self.files.push(path);
    }

    pub(crate) fn set_warnings(&mut self, warnings: Vec<Diagnostic>) {
        self.warnings = warnings;
    }

    /// Number of nodes, declarations and particles alike.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Warnings collected while loading.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    /// Schema files read from disk, root first. Empty for in-memory sources.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Global element declarations in document order.
    pub fn top_level_elements(&self) -> Vec<NodeId> {
        self.top_level(DeclarationKind::Element)
    }

    /// Global elements whose local name is `name`, in any namespace.
    pub fn find_elements_by_local_name(&self, name: &str) -> Vec<NodeId> {
        self.globals
            .iter()
            .filter(|((space, qname), _)| {
                *space == DeclarationKind::Element.symbol_space() && qname.local_name() == name
            })
            .map(|(_, id)| *id)
            .collect()
    }

    /// Resolves the type an element uses, following `ref=` first.
    pub(crate) fn element_type(
        &self,
        id: NodeId,
        visiting: &mut HashSet<NodeId>,
    ) -> Option<NodeId> {
        if !visiting.insert(id) {
            return None;
        }
        match &self.data(id)?.detail {
            Detail::Element {
                element_ref: Some(target),
                ..
            } => {
                let target = self.resolve(DeclarationKind::Element, target)?;
                self.element_type(target, visiting)
            }
            Detail::Element {
                inline_type: Some(inline),
                ..
            } => Some(*inline),
            Detail::Element {
                type_ref: Some(type_ref),
                ..
            } => self.resolve(DeclarationKind::ComplexType, type_ref),
            _ => None,
        }
    }

    fn collect_content(&self, id: NodeId, visiting: &mut HashSet<NodeId>, out: &mut Vec<NodeId>) {
        if !visiting.insert(id) {
            debug!(node = id.index(); "Content cycle cut");
            return;
        }
        let Some(data) = self.data(id) else {
            return;
        };
        match &data.detail {
            Detail::Element { .. } => {
                if let Some(ty) = self.element_type(id, &mut HashSet::new()) {
                    self.collect_content(ty, visiting, out);
                }
            }
            Detail::ComplexType(detail) => {
                if let Some((Derivation::Extension, base)) = &detail.derivation {
                    if let Some(base) = self.resolve(DeclarationKind::ComplexType, base) {
                        self.collect_content(base, visiting, out);
                    }
                }
                out.extend(detail.content);
            }
            Detail::Group {
                group_ref: Some(target),
                ..
            } => {
                if let Some(target) = self.resolve(DeclarationKind::Group, target) {
                    self.collect_content(target, visiting, out);
                }
            }
            Detail::Group { content, .. } => out.extend(*content),
            Detail::Compositor { particles } => out.extend(particles.iter().copied()),
            Detail::SimpleType { .. }
            | Detail::Any
            | Detail::Attribute { .. }
            | Detail::AttributeGroup { .. } => {}
        }
    }
}

impl SchemaGraphView for SchemaGraph {
    fn resolve(&self, kind: DeclarationKind, name: &QualifiedName) -> Option<NodeId> {
        self.globals
            .get(&(kind.symbol_space(), name.clone()))
            .copied()
    }

    fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.data(id).map(|data| &data.summary)
    }

    fn child_content(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_content(id, &mut HashSet::new(), &mut out);
        out
    }

    fn attributes(&self, id: NodeId) -> Vec<AttributeDescriptor> {
        attributes::collect(self, id)
    }

    fn enumerations(&self, id: NodeId) -> Vec<String> {
        let ty = match self.data(id).map(|data| &data.detail) {
            Some(Detail::Element { .. }) => self.element_type(id, &mut HashSet::new()),
            Some(detail @ Detail::Attribute { .. }) => {
                return attributes::attribute_type(self, detail).1;
            }
            Some(_) => Some(id),
            None => None,
        };
        ty.and_then(|ty| self.data(ty))
            .map(|data| attributes::enumerations_of(&data.detail))
            .unwrap_or_default()
    }

    fn top_level(&self, kind: DeclarationKind) -> Vec<NodeId> {
        self.globals
            .iter()
            .filter(|((space, _), _)| *space == kind.symbol_space())
            .map(|(_, id)| *id)
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|node| node.kind.declaration_kind() == Some(kind))
            })
            .collect()
    }
}

/// True for references into the XML Schema namespace, which never resolve
/// to a user declaration and are not worth a warning.
pub(crate) fn is_builtin(name: &QualifiedName) -> bool {
    name.namespace() == XS_NAMESPACE
}
