//! Read-only view of a loaded XML schema.
//!
//! The diagram never owns schema data. It holds [`NodeId`]s into whatever
//! graph implements [`SchemaGraphView`] and asks it for child content and
//! attributes on demand. Unresolved references are not errors at this
//! boundary: lookups simply come back empty and the diagram draws a leaf.

use std::fmt;

/// Handle to a node of a schema graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        Self(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Kind of a named, globally addressable declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Element,
    Attribute,
    AttributeGroup,
    ComplexType,
    SimpleType,
    Group,
}

impl DeclarationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Element => "element",
            Self::Attribute => "attribute",
            Self::AttributeGroup => "attributeGroup",
            Self::ComplexType => "complexType",
            Self::SimpleType => "simpleType",
            Self::Group => "group",
        }
    }

    /// Name of the symbol space the declaration lives in. Complex and simple
    /// types share the `type` space, so a type name resolves to either.
    pub fn symbol_space(&self) -> &'static str {
        match self {
            Self::ComplexType | Self::SimpleType => "type",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespace-qualified name. An empty namespace means "no namespace".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedName {
    namespace: String,
    local_name: String,
}

impl QualifiedName {
    pub fn new(namespace: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_name: local_name.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }
}

impl fmt::Display for QualifiedName {
    /// Formats in Clark notation, `{namespace}local`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.local_name)
        } else {
            write!(f, "{{{}}}{}", self.namespace, self.local_name)
        }
    }
}

/// Builds the global lookup key `namespace:space:name` of a declaration.
///
/// ```
/// # use xsdiagram_core::schema::{full_name, DeclarationKind};
/// assert_eq!(
///     full_name("urn:po", DeclarationKind::Element, "order"),
///     "urn:po:element:order"
/// );
/// assert_eq!(
///     full_name("urn:po", DeclarationKind::SimpleType, "sku"),
///     "urn:po:type:sku"
/// );
/// ```
pub fn full_name(namespace: &str, kind: DeclarationKind, name: &str) -> String {
    format!("{namespace}:{}:{name}", kind.symbol_space())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompositorKind {
    Sequence,
    Choice,
    All,
}

impl CompositorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sequence => "sequence",
            Self::Choice => "choice",
            Self::All => "all",
        }
    }
}

/// Upper occurrence bound of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxOccurs {
    Bounded(u32),
    Unbounded,
}

/// `minOccurs`/`maxOccurs` of a particle; `1..1` when not a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Occurs {
    min: u32,
    max: MaxOccurs,
}

impl Occurs {
    pub fn new(min: u32, max: MaxOccurs) -> Self {
        Self { min, max }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> MaxOccurs {
        self.max
    }

    /// True when the particle may be absent.
    pub fn is_optional(&self) -> bool {
        self.min == 0
    }

    /// True when the particle may occur more than once.
    pub fn is_repeated(&self) -> bool {
        match self.max {
            MaxOccurs::Bounded(max) => max > 1,
            MaxOccurs::Unbounded => true,
        }
    }

    /// Returns the cardinality label drawn under a box, e.g. `0..∞`, or
    /// `None` for the default `1..1`.
    ///
    /// ```
    /// # use xsdiagram_core::schema::{MaxOccurs, Occurs};
    /// assert_eq!(Occurs::default().cardinality(), None);
    /// assert_eq!(
    ///     Occurs::new(0, MaxOccurs::Unbounded).cardinality().as_deref(),
    ///     Some("0..∞")
    /// );
    /// ```
    pub fn cardinality(&self) -> Option<String> {
        if *self == Self::default() {
            return None;
        }
        let max = match self.max {
            MaxOccurs::Bounded(max) => max.to_string(),
            MaxOccurs::Unbounded => "∞".to_string(),
        };
        Some(format!("{}..{}", self.min, max))
    }
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: MaxOccurs::Bounded(1),
        }
    }
}

/// What a schema node is, with the flags the diagram draws.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Element {
        /// Declared or inline-derived type name, shown in the side panel.
        type_name: Option<QualifiedName>,
        /// `<element ref="..."/>` particle.
        is_reference: bool,
        is_abstract: bool,
    },
    ComplexType {
        is_abstract: bool,
    },
    SimpleType,
    Group {
        /// `<group ref="..."/>` particle.
        is_reference: bool,
    },
    Compositor(CompositorKind),
    Any,
    Attribute,
    AttributeGroup,
}

impl NodeKind {
    /// Declaration kind used for full names; `None` for anonymous particles.
    pub fn declaration_kind(&self) -> Option<DeclarationKind> {
        match self {
            Self::Element { .. } => Some(DeclarationKind::Element),
            Self::ComplexType { .. } => Some(DeclarationKind::ComplexType),
            Self::SimpleType => Some(DeclarationKind::SimpleType),
            Self::Group { .. } => Some(DeclarationKind::Group),
            Self::Attribute => Some(DeclarationKind::Attribute),
            Self::AttributeGroup => Some(DeclarationKind::AttributeGroup),
            Self::Compositor(_) | Self::Any => None,
        }
    }
}

/// Diagram-facing summary of one schema node.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub kind: NodeKind,
    /// Local name; for references, the referenced local name.
    pub name: String,
    /// Target namespace of the declaration (or of the `any` wildcard).
    pub namespace: String,
    pub occurs: Occurs,
    pub documentation: Option<String>,
}

impl SchemaNode {
    pub fn new(kind: NodeKind, name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            namespace: namespace.into(),
            occurs: Occurs::default(),
            documentation: None,
        }
    }

    /// Returns `namespace:kind:name`, or the compositor/wildcard tag for
    /// anonymous particles.
    pub fn full_name(&self) -> String {
        match self.kind.declaration_kind() {
            Some(kind) => full_name(&self.namespace, kind, &self.name),
            None => match &self.kind {
                NodeKind::Compositor(kind) => format!("{}:{}", self.namespace, kind.as_str()),
                _ => format!("{}:any", self.namespace),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AttributeUse {
    #[default]
    Optional,
    Required,
    /// Inherited through a restriction that forbids it. Kept, not removed.
    Prohibited,
}

impl AttributeUse {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Optional => "optional",
            Self::Required => "required",
            Self::Prohibited => "prohibited",
        }
    }
}

/// One row of the attribute panel of an element or type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeDescriptor {
    pub name: String,
    pub namespace: String,
    pub type_name: Option<String>,
    pub use_: AttributeUse,
    pub default_value: Option<String>,
    pub fixed_value: Option<String>,
    /// Declared via `ref=` (resolved or not).
    pub is_reference: bool,
    /// Comes from `anyAttribute`; `name` is `*`.
    pub is_wildcard: bool,
    pub enumerations: Vec<String>,
    pub documentation: Option<String>,
}

/// Capability exposed by a loaded schema.
pub trait SchemaGraphView {
    /// Looks up a global declaration.
    fn resolve(&self, kind: DeclarationKind, name: &QualifiedName) -> Option<NodeId>;

    fn node(&self, id: NodeId) -> Option<&SchemaNode>;

    /// Returns the particles shown as children of `id`, in document order.
    ///
    /// Element and group references are followed; types contribute their
    /// base type content before their own. Unresolvable content is empty.
    fn child_content(&self, id: NodeId) -> Vec<NodeId>;

    /// Returns the attributes of an element or type, base type first.
    fn attributes(&self, id: NodeId) -> Vec<AttributeDescriptor>;

    /// Returns the enumeration facets of a simple type, or of the simple
    /// type an element or attribute uses. Empty for everything else.
    fn enumerations(&self, id: NodeId) -> Vec<String>;

    /// Returns the global declarations of `kind` in document order.
    fn top_level(&self, kind: DeclarationKind) -> Vec<NodeId>;

    fn has_child_content(&self, id: NodeId) -> bool {
        !self.child_content(id).is_empty()
    }
}
