//! Attribute panel data for elements and types.
//!
//! Collection order is base type first, then the type's own declarations in
//! document order, with attribute group references expanded in place and an
//! `anyAttribute` wildcard last. A restriction cannot remove an inherited
//! attribute from the list: `use="prohibited"` marks every inherited entry
//! of that name instead, and any other redeclaration replaces the inherited
//! entry in place.

use std::collections::HashSet;

use log::debug;

use xsdiagram_core::schema::{
    AttributeDescriptor, AttributeUse, DeclarationKind, NodeId, SchemaGraphView,
};

use crate::graph::{AttributeItem, AttributeList, Derivation, Detail, SchemaGraph};

/// Returns the attributes of an element (through its type) or of a type.
pub(crate) fn collect(graph: &SchemaGraph, id: NodeId) -> Vec<AttributeDescriptor> {
    let mut out = Vec::new();
    let mut visiting = HashSet::new();

    let target = match graph.data(id).map(|data| &data.detail) {
        Some(Detail::Element { .. }) => graph.element_type(id, &mut HashSet::new()),
        Some(_) => Some(id),
        None => None,
    };
    if let Some(target) = target {
        collect_node(graph, target, &mut visiting, &mut out);
    }
    out
}

fn collect_node(
    graph: &SchemaGraph,
    id: NodeId,
    visiting: &mut HashSet<NodeId>,
    out: &mut Vec<AttributeDescriptor>,
) {
    if !visiting.insert(id) {
        debug!(node = id.index(); "Attribute cycle cut");
        return;
    }
    let Some(data) = graph.data(id) else {
        return;
    };

    match &data.detail {
        Detail::ComplexType(detail) => match &detail.derivation {
            Some((derivation, base)) => {
                if let Some(base) = graph.resolve(DeclarationKind::ComplexType, base) {
                    collect_node(graph, base, visiting, out);
                }
                let mut own = Vec::new();
                collect_list(graph, &detail.attributes, visiting, &mut own);
                match derivation {
                    Derivation::Extension => out.extend(own),
                    Derivation::Restriction => apply_restriction(out, own),
                }
            }
            None => collect_list(graph, &detail.attributes, visiting, out),
        },
        Detail::AttributeGroup { attributes } => collect_list(graph, attributes, visiting, out),
        _ => {}
    }
    // Only the current chain is guarded; the same group may appear twice.
    visiting.remove(&id);
}

fn collect_list(
    graph: &SchemaGraph,
    list: &AttributeList,
    visiting: &mut HashSet<NodeId>,
    out: &mut Vec<AttributeDescriptor>,
) {
    for item in &list.items {
        match item {
            AttributeItem::Attribute(id) => {
                if let Some(descriptor) = describe(graph, *id) {
                    out.push(descriptor);
                }
            }
            AttributeItem::GroupRef(name, _) => {
                match graph.resolve(DeclarationKind::AttributeGroup, name) {
                    Some(group) => collect_node(graph, group, visiting, out),
                    None => debug!(group:% = name; "Unresolved attribute group skipped"),
                }
            }
        }
    }

    if let Some(namespace) = &list.any_attribute {
        out.push(AttributeDescriptor {
            name: "*".to_string(),
            namespace: namespace.clone(),
            is_wildcard: true,
            ..AttributeDescriptor::default()
        });
    }
}

fn apply_restriction(inherited: &mut Vec<AttributeDescriptor>, own: Vec<AttributeDescriptor>) {
    for attribute in own {
        if attribute.use_ == AttributeUse::Prohibited {
            for existing in inherited.iter_mut().filter(|a| a.name == attribute.name) {
                existing.use_ = AttributeUse::Prohibited;
            }
            continue;
        }
        match inherited.iter_mut().find(|a| a.name == attribute.name) {
            Some(existing) => *existing = attribute,
            None => inherited.push(attribute),
        }
    }
}

/// Builds the descriptor of one attribute declaration or reference.
///
/// Values set on a referencing declaration (`use`, `default`, `fixed`)
/// override those of the referenced global. An unresolved reference still
/// yields a row named after the reference.
fn describe(graph: &SchemaGraph, id: NodeId) -> Option<AttributeDescriptor> {
    let data = graph.data(id)?;
    let Detail::Attribute {
        attribute_ref,
        use_,
        default_value,
        fixed_value,
        ..
    } = &data.detail
    else {
        return None;
    };

    let mut descriptor = match attribute_ref {
        Some(target) => {
            let resolved = graph
                .resolve(DeclarationKind::Attribute, target)
                .and_then(|global| describe(graph, global));
            let mut descriptor = resolved.unwrap_or_else(|| AttributeDescriptor {
                name: target.local_name().to_string(),
                namespace: target.namespace().to_string(),
                ..AttributeDescriptor::default()
            });
            descriptor.is_reference = true;
            descriptor
        }
        None => {
            let (type_name, enumerations) = attribute_type(graph, &data.detail);
            AttributeDescriptor {
                name: data.summary.name.clone(),
                namespace: data.summary.namespace.clone(),
                type_name,
                enumerations,
                documentation: data.summary.documentation.clone(),
                ..AttributeDescriptor::default()
            }
        }
    };

    if let Some(use_) = use_ {
        descriptor.use_ = *use_;
    }
    if default_value.is_some() {
        descriptor.default_value = default_value.clone();
    }
    if fixed_value.is_some() {
        descriptor.fixed_value = fixed_value.clone();
    }
    Some(descriptor)
}

/// Type name and enumeration facets of an attribute: from `type=`, or from
/// the base or list item type of an inline simple type.
pub(crate) fn attribute_type(
    graph: &SchemaGraph,
    detail: &Detail,
) -> (Option<String>, Vec<String>) {
    let Detail::Attribute {
        type_ref,
        inline_type,
        ..
    } = detail
    else {
        return (None, Vec::new());
    };

    if let Some(type_ref) = type_ref {
        let enumerations = graph
            .resolve(DeclarationKind::SimpleType, type_ref)
            .and_then(|ty| graph.data(ty))
            .map(|data| enumerations_of(&data.detail))
            .unwrap_or_default();
        return (Some(type_ref.local_name().to_string()), enumerations);
    }

    let Some(inline) = inline_type.and_then(|ty| graph.data(ty)) else {
        return (None, Vec::new());
    };
    match &inline.detail {
        Detail::SimpleType {
            base, item_type, ..
        } => {
            let name = base
                .as_ref()
                .or(item_type.as_ref())
                .map(|name| name.local_name().to_string());
            (name, enumerations_of(&inline.detail))
        }
        _ => (None, Vec::new()),
    }
}

pub(crate) fn enumerations_of(detail: &Detail) -> Vec<String> {
    match detail {
        Detail::SimpleType { enumerations, .. } => enumerations.clone(),
        _ => Vec::new(),
    }
}
