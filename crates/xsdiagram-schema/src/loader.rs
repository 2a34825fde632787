//! Lenient XSD reader.
//!
//! Walks a `roxmltree` document and records every declaration and particle
//! in a [`SchemaGraph`]. Unknown constructs are ignored, references are
//! checked once everything is loaded and reported as warnings. Includes and
//! imports with a local `schemaLocation` are read before the declarations of
//! the including document, each file at most once. Remote locations are never
//! fetched; a file with the same name next to the including schema is used
//! instead when present.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info};
use roxmltree::{Document, Node};

use xsdiagram_core::schema::{
    AttributeUse, CompositorKind, DeclarationKind, MaxOccurs, NodeId, NodeKind, Occurs,
    QualifiedName, SchemaGraphView, SchemaNode,
};

use crate::{
    error::{Diagnostic, DiagnosticCollector, ErrorCode, LoadError},
    graph::{
        AttributeItem, AttributeList, Derivation, Detail, SchemaGraph, TypeDetail, XS_NAMESPACE,
        is_builtin,
    },
    span::Span,
};

/// Loads a schema from an in-memory document.
///
/// Relative includes cannot be followed without a base path and are
/// reported as warnings.
///
/// # Errors
///
/// Returns a [`LoadError`] when the text is not well-formed XML or its root
/// is not `xs:schema`.
pub fn load_str(source: &str) -> Result<SchemaGraph, LoadError> {
    let mut loader = Loader::new();
    loader.load_document(source, None, true);
    loader.finish()
}

/// Loads a schema whose text was read from `path`. Includes resolve
/// relative to the directory of `path`.
pub fn load_with_base(source: &str, path: &Path) -> Result<SchemaGraph, LoadError> {
    let mut loader = Loader::new();
    loader.load_document(source, Some(path), true);
    loader.finish()
}

/// Reads and loads the schema file at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<SchemaGraph, LoadError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|err| {
        Diagnostic::error(format!("cannot read schema `{}`: {err}", path.display()))
            .with_code(ErrorCode::E003)
    })?;
    load_with_base(&source, path)
}

/// Per-document state.
struct DocContext<'p> {
    target_namespace: String,
    base_dir: Option<&'p Path>,
    /// Spans are only meaningful for the root document's source.
    with_spans: bool,
}

impl DocContext<'_> {
    fn span(&self, node: Node) -> Option<Span> {
        self.with_spans.then(|| Span::new(node.range()))
    }
}

struct Loader {
    graph: SchemaGraph,
    diagnostics: DiagnosticCollector,
    visited: HashSet<PathBuf>,
}

impl Loader {
    fn new() -> Self {
        Self {
            graph: SchemaGraph::new(),
            diagnostics: DiagnosticCollector::new(),
            visited: HashSet::new(),
        }
    }

    fn finish(mut self) -> Result<SchemaGraph, LoadError> {
        if !self.diagnostics.has_errors() {
            self.check_references();
        }
        let warnings = self.diagnostics.finish()?;
        info!(
            nodes = self.graph.len(),
            files = self.graph.files().len(),
            warnings = warnings.len();
            "Schema loaded"
        );
        self.graph.set_warnings(warnings);
        Ok(self.graph)
    }

    fn load_document(&mut self, source: &str, path: Option<&Path>, is_root: bool) {
        if let Some(path) = path {
            let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            if !self.visited.insert(canonical) {
                debug!(path:? = path; "Schema already loaded");
                return;
            }
            self.graph.add_file(path.to_path_buf());
        }

        let document = match Document::parse(source) {
            Ok(document) => document,
            Err(err) => {
                let pos = err.pos();
                if is_root {
                    self.diagnostics.emit(
                        Diagnostic::error(format!("malformed XML: {err}"))
                            .with_code(ErrorCode::E001)
                            .with_label(Span::from_text_pos(source, pos.row, pos.col), "here"),
                    );
                } else {
                    self.emit_include_failure(path, &err.to_string());
                }
                return;
            }
        };

        let root = document.root_element();
        if !is_xs(root, "schema") {
            if is_root {
                self.diagnostics.emit(
                    Diagnostic::error("document root is not `xs:schema`")
                        .with_code(ErrorCode::E002)
                        .with_label(Span::new(root.range()), "expected a schema element")
                        .with_help(format!("schema elements use the namespace `{XS_NAMESPACE}`")),
                );
            } else {
                self.emit_include_failure(path, "document root is not `xs:schema`");
            }
            return;
        }

        let ctx = DocContext {
            target_namespace: root.attribute("targetNamespace").unwrap_or("").to_string(),
            base_dir: path.and_then(Path::parent),
            with_spans: is_root,
        };

        for child in root.children().filter(Node::is_element) {
            if is_xs(child, "include") || is_xs(child, "import") || is_xs(child, "redefine") {
                self.follow_include(child, &ctx);
            }
        }

        for child in root.children().filter(|n| n.is_element() && is_xs_node(*n)) {
            let kind = match child.tag_name().name() {
                "element" => DeclarationKind::Element,
                "complexType" => DeclarationKind::ComplexType,
                "simpleType" => DeclarationKind::SimpleType,
                "group" => DeclarationKind::Group,
                "attribute" => DeclarationKind::Attribute,
                "attributeGroup" => DeclarationKind::AttributeGroup,
                _ => continue,
            };
            self.declare_global(child, &ctx, kind);
        }
    }

    fn emit_include_failure(&mut self, path: Option<&Path>, reason: &str) {
        let shown = path.map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
        self.diagnostics.emit(
            Diagnostic::warning(format!("cannot load included schema `{shown}`: {reason}"))
                .with_code(ErrorCode::E202),
        );
    }

    fn follow_include(&mut self, node: Node, ctx: &DocContext) {
        let Some(location) = node.attribute("schemaLocation").map(str::trim) else {
            debug!(kind = node.tag_name().name(); "Include without schemaLocation ignored");
            return;
        };

        let Some(base_dir) = ctx.base_dir else {
            self.diagnostics.emit(
                Diagnostic::warning(format!("`{location}` not loaded: schema has no base path"))
                    .with_code(ErrorCode::E201)
                    .with_optional_label(ctx.span(node), "referenced here"),
            );
            return;
        };

        let path = if location.starts_with("http://") || location.starts_with("https://") {
            let file_name = location.rsplit('/').next().unwrap_or_default();
            let local = base_dir.join(file_name);
            if file_name.is_empty() || !local.is_file() {
                self.diagnostics.emit(
                    Diagnostic::warning(format!("remote schema `{location}` not fetched"))
                        .with_code(ErrorCode::E201)
                        .with_optional_label(ctx.span(node), "referenced here")
                        .with_help(format!(
                            "place a copy named `{file_name}` next to the including schema"
                        )),
                );
                return;
            }
            local
        } else {
            base_dir.join(location)
        };

        match fs::read_to_string(&path) {
            Ok(source) => self.load_document(&source, Some(&path), false),
            Err(err) => self.emit_include_failure(Some(&path), &err.to_string()),
        }
    }

    fn declare_global(&mut self, node: Node, ctx: &DocContext, kind: DeclarationKind) {
        let Some(name) = node.attribute("name") else {
            self.diagnostics.emit(
                Diagnostic::warning(format!("global {kind} without a name skipped"))
                    .with_code(ErrorCode::E100)
                    .with_optional_label(ctx.span(node), "missing `name`"),
            );
            return;
        };

        let id = match kind {
            DeclarationKind::Element => self.parse_element(node, ctx),
            DeclarationKind::ComplexType => self.parse_complex_type(node, ctx, name),
            DeclarationKind::SimpleType => self.parse_simple_type(node, ctx, name),
            DeclarationKind::Group => self.parse_group(node, ctx, name),
            DeclarationKind::Attribute => self.parse_attribute(node, ctx),
            DeclarationKind::AttributeGroup => self.parse_attribute_group(node, ctx, name),
        };

        let qname = QualifiedName::new(ctx.target_namespace.as_str(), name);
        if let Some(previous) = self.graph.register(kind, qname, id) {
            let mut diagnostic =
                Diagnostic::warning(format!("{kind} `{name}` is declared more than once"))
                    .with_code(ErrorCode::E101)
                    .with_optional_label(ctx.span(node), "redeclared here")
                    .with_help("the later declaration is used");
            if let Some(span) = self.graph.data(previous).and_then(|data| data.span) {
                diagnostic = diagnostic.with_secondary_label(span, "first declared here");
            }
            self.diagnostics.emit(diagnostic);
        }
    }

    fn parse_element(&mut self, node: Node, ctx: &DocContext) -> NodeId {
        let element_ref = node.attribute("ref").map(|value| qname(node, value));
        let type_ref = node.attribute("type").map(|value| qname(node, value));

        let mut inline_type = None;
        for child in node.children().filter(Node::is_element) {
            if is_xs(child, "complexType") {
                inline_type = Some(self.parse_complex_type(child, ctx, ""));
            } else if is_xs(child, "simpleType") {
                inline_type = Some(self.parse_simple_type(child, ctx, ""));
            }
        }

        let (name, namespace) = match &element_ref {
            Some(target) => (target.local_name().to_string(), target.namespace().to_string()),
            None => (
                node.attribute("name").unwrap_or_default().to_string(),
                ctx.target_namespace.clone(),
            ),
        };

        let mut summary = SchemaNode::new(
            NodeKind::Element {
                type_name: type_ref.clone(),
                is_reference: element_ref.is_some(),
                is_abstract: node.attribute("abstract") == Some("true"),
            },
            name,
            namespace,
        );
        summary.occurs = self.occurs(node, ctx);
        summary.documentation = documentation(node);

        let detail = Detail::Element {
            element_ref,
            type_ref,
            inline_type,
        };
        self.graph.push(summary, detail, ctx.span(node))
    }

    fn parse_complex_type(&mut self, node: Node, ctx: &DocContext, name: &str) -> NodeId {
        let mut detail = TypeDetail::default();
        self.parse_type_body(node, ctx, &mut detail);

        for content in node
            .children()
            .filter(|c| is_xs(*c, "complexContent") || is_xs(*c, "simpleContent"))
        {
            for derivation in content.children().filter(Node::is_element) {
                let kind = if is_xs(derivation, "extension") {
                    Derivation::Extension
                } else if is_xs(derivation, "restriction") {
                    Derivation::Restriction
                } else {
                    continue;
                };
                if let Some(base) = derivation.attribute("base") {
                    detail.derivation = Some((kind, qname(derivation, base)));
                }
                self.parse_type_body(derivation, ctx, &mut detail);
            }
        }

        let mut summary = SchemaNode::new(
            NodeKind::ComplexType {
                is_abstract: node.attribute("abstract") == Some("true"),
            },
            name,
            ctx.target_namespace.as_str(),
        );
        summary.documentation = documentation(node);
        self.graph
            .push(summary, Detail::ComplexType(detail), ctx.span(node))
    }

    /// Reads the content particle and attribute declarations directly below
    /// a type or derivation element.
    fn parse_type_body(&mut self, node: Node, ctx: &DocContext, detail: &mut TypeDetail) {
        for child in node.children().filter(|n| n.is_element() && is_xs_node(*n)) {
            match child.tag_name().name() {
                "sequence" | "choice" | "all" => {
                    detail.content = Some(self.parse_compositor(child, ctx));
                }
                "group" => detail.content = Some(self.parse_group_particle(child, ctx)),
                "attribute" | "attributeGroup" | "anyAttribute" => {
                    self.parse_attribute_item(child, ctx, &mut detail.attributes);
                }
                _ => {}
            }
        }
    }

    fn parse_simple_type(&mut self, node: Node, ctx: &DocContext, name: &str) -> NodeId {
        let mut base = None;
        let mut item_type = None;
        let mut enumerations = Vec::new();

        for child in node.children().filter(Node::is_element) {
            if is_xs(child, "restriction") {
                base = child.attribute("base").map(|value| qname(child, value));
                enumerations = child
                    .children()
                    .filter(|facet| is_xs(*facet, "enumeration"))
                    .filter_map(|facet| facet.attribute("value"))
                    .map(str::to_string)
                    .collect();
            } else if is_xs(child, "list") {
                item_type = child.attribute("itemType").map(|value| qname(child, value));
            }
        }

        let mut summary =
            SchemaNode::new(NodeKind::SimpleType, name, ctx.target_namespace.as_str());
        summary.documentation = documentation(node);
        let detail = Detail::SimpleType {
            base,
            item_type,
            enumerations,
        };
        self.graph.push(summary, detail, ctx.span(node))
    }

    fn parse_group(&mut self, node: Node, ctx: &DocContext, name: &str) -> NodeId {
        let content = node
            .children()
            .find(|c| is_xs(*c, "sequence") || is_xs(*c, "choice") || is_xs(*c, "all"))
            .map(|compositor| self.parse_compositor(compositor, ctx));

        let mut summary = SchemaNode::new(
            NodeKind::Group {
                is_reference: false,
            },
            name,
            ctx.target_namespace.as_str(),
        );
        summary.documentation = documentation(node);
        let detail = Detail::Group {
            group_ref: None,
            content,
        };
        self.graph.push(summary, detail, ctx.span(node))
    }

    fn parse_group_particle(&mut self, node: Node, ctx: &DocContext) -> NodeId {
        let Some(target) = node.attribute("ref").map(|value| qname(node, value)) else {
            // Not valid XSD; read it as an inline group definition.
            return self.parse_group(node, ctx, node.attribute("name").unwrap_or_default());
        };

        let mut summary = SchemaNode::new(
            NodeKind::Group { is_reference: true },
            target.local_name(),
            target.namespace(),
        );
        summary.occurs = self.occurs(node, ctx);
        summary.documentation = documentation(node);
        let detail = Detail::Group {
            group_ref: Some(target),
            content: None,
        };
        self.graph.push(summary, detail, ctx.span(node))
    }

    fn parse_compositor(&mut self, node: Node, ctx: &DocContext) -> NodeId {
        let kind = match node.tag_name().name() {
            "choice" => CompositorKind::Choice,
            "all" => CompositorKind::All,
            _ => CompositorKind::Sequence,
        };

        let mut particles = Vec::new();
        for child in node.children().filter(|n| n.is_element() && is_xs_node(*n)) {
            let particle = match child.tag_name().name() {
                "element" => self.parse_element(child, ctx),
                "group" => self.parse_group_particle(child, ctx),
                "sequence" | "choice" | "all" => self.parse_compositor(child, ctx),
                "any" => self.parse_any(child, ctx),
                _ => continue,
            };
            particles.push(particle);
        }

        let mut summary = SchemaNode::new(
            NodeKind::Compositor(kind),
            "",
            ctx.target_namespace.as_str(),
        );
        summary.occurs = self.occurs(node, ctx);
        summary.documentation = documentation(node);
        self.graph
            .push(summary, Detail::Compositor { particles }, ctx.span(node))
    }

    fn parse_any(&mut self, node: Node, ctx: &DocContext) -> NodeId {
        let namespace = node.attribute("namespace").unwrap_or("##any");
        let mut summary = SchemaNode::new(NodeKind::Any, "", namespace);
        summary.occurs = self.occurs(node, ctx);
        summary.documentation = documentation(node);
        self.graph.push(summary, Detail::Any, ctx.span(node))
    }

    fn parse_attribute(&mut self, node: Node, ctx: &DocContext) -> NodeId {
        let attribute_ref = node.attribute("ref").map(|value| qname(node, value));
        let type_ref = node.attribute("type").map(|value| qname(node, value));
        let inline_type = node
            .children()
            .find(|c| is_xs(*c, "simpleType"))
            .map(|simple| self.parse_simple_type(simple, ctx, ""));
        let use_ = match node.attribute("use") {
            Some("required") => Some(AttributeUse::Required),
            Some("prohibited") => Some(AttributeUse::Prohibited),
            Some("optional") => Some(AttributeUse::Optional),
            _ => None,
        };

        let (name, namespace) = match &attribute_ref {
            Some(target) => (target.local_name().to_string(), target.namespace().to_string()),
            None => (
                node.attribute("name").unwrap_or_default().to_string(),
                ctx.target_namespace.clone(),
            ),
        };

        let mut summary = SchemaNode::new(NodeKind::Attribute, name, namespace);
        summary.documentation = documentation(node);
        let detail = Detail::Attribute {
            attribute_ref,
            type_ref,
            inline_type,
            use_,
            default_value: node.attribute("default").map(str::to_string),
            fixed_value: node.attribute("fixed").map(str::to_string),
        };
        self.graph.push(summary, detail, ctx.span(node))
    }

    fn parse_attribute_group(&mut self, node: Node, ctx: &DocContext, name: &str) -> NodeId {
        let mut attributes = AttributeList::default();
        for child in node.children().filter(Node::is_element) {
            self.parse_attribute_item(child, ctx, &mut attributes);
        }

        let mut summary =
            SchemaNode::new(NodeKind::AttributeGroup, name, ctx.target_namespace.as_str());
        summary.documentation = documentation(node);
        self.graph
            .push(summary, Detail::AttributeGroup { attributes }, ctx.span(node))
    }

    fn parse_attribute_item(&mut self, node: Node, ctx: &DocContext, list: &mut AttributeList) {
        if is_xs(node, "attribute") {
            let id = self.parse_attribute(node, ctx);
            list.items.push(AttributeItem::Attribute(id));
        } else if is_xs(node, "attributeGroup") {
            if let Some(target) = node.attribute("ref") {
                list.items
                    .push(AttributeItem::GroupRef(qname(node, target), ctx.span(node)));
            }
        } else if is_xs(node, "anyAttribute") {
            list.any_attribute = Some(node.attribute("namespace").unwrap_or("##any").to_string());
        }
    }

    fn occurs(&mut self, node: Node, ctx: &DocContext) -> Occurs {
        let min = match node.attribute("minOccurs").map(str::trim) {
            None => 1,
            Some(value) => value.parse().unwrap_or_else(|_| {
                self.warn_occurs(node, ctx, "minOccurs", value);
                1
            }),
        };
        let max = match node.attribute("maxOccurs").map(str::trim) {
            None => MaxOccurs::Bounded(1),
            Some("unbounded") => MaxOccurs::Unbounded,
            Some(value) => value.parse().map(MaxOccurs::Bounded).unwrap_or_else(|_| {
                self.warn_occurs(node, ctx, "maxOccurs", value);
                MaxOccurs::Bounded(1)
            }),
        };
        Occurs::new(min, max)
    }

    fn warn_occurs(&mut self, node: Node, ctx: &DocContext, attribute: &str, value: &str) {
        self.diagnostics.emit(
            Diagnostic::warning(format!("invalid {attribute} value `{value}`"))
                .with_code(ErrorCode::E102)
                .with_optional_label(ctx.span(node), "on this particle")
                .with_help("expected a non-negative integer; using 1"),
        );
    }

    /// Reports every reference that does not resolve to a declaration.
    fn check_references(&mut self) {
        let mut unresolved = Vec::new();
        for data in self.graph.iter_data() {
            let mut check = |kind: DeclarationKind, name: &QualifiedName, span: Option<Span>| {
                if !is_builtin(name) && self.graph.resolve(kind, name).is_none() {
                    unresolved.push((kind, name.clone(), span));
                }
            };
            match &data.detail {
                Detail::Element {
                    element_ref,
                    type_ref,
                    ..
                } => {
                    if let Some(name) = element_ref {
                        check(DeclarationKind::Element, name, data.span);
                    }
                    if let Some(name) = type_ref {
                        check(DeclarationKind::ComplexType, name, data.span);
                    }
                }
                Detail::ComplexType(detail) => {
                    if let Some((_, base)) = &detail.derivation {
                        check(DeclarationKind::ComplexType, base, data.span);
                    }
                    for item in &detail.attributes.items {
                        if let AttributeItem::GroupRef(name, span) = item {
                            check(DeclarationKind::AttributeGroup, name, *span);
                        }
                    }
                }
                Detail::AttributeGroup { attributes } => {
                    for item in &attributes.items {
                        if let AttributeItem::GroupRef(name, span) = item {
                            check(DeclarationKind::AttributeGroup, name, *span);
                        }
                    }
                }
                Detail::SimpleType {
                    base, item_type, ..
                } => {
                    for name in base.iter().chain(item_type) {
                        check(DeclarationKind::SimpleType, name, data.span);
                    }
                }
                Detail::Group {
                    group_ref: Some(name),
                    ..
                } => check(DeclarationKind::Group, name, data.span),
                Detail::Attribute {
                    attribute_ref,
                    type_ref,
                    ..
                } => {
                    if let Some(name) = attribute_ref {
                        check(DeclarationKind::Attribute, name, data.span);
                    }
                    if let Some(name) = type_ref {
                        check(DeclarationKind::SimpleType, name, data.span);
                    }
                }
                Detail::Group { .. } | Detail::Compositor { .. } | Detail::Any => {}
            }
        }

        for (kind, name, span) in unresolved {
            let what = match kind {
                DeclarationKind::ComplexType | DeclarationKind::SimpleType => "type",
                other => other.as_str(),
            };
            self.diagnostics.emit(
                Diagnostic::warning(format!("unresolved {what} `{name}`"))
                    .with_code(ErrorCode::E200)
                    .with_optional_label(span, "referenced here")
                    .with_help("the reference is drawn without content"),
            );
        }
    }
}

fn is_xs_node(node: Node) -> bool {
    node.tag_name().namespace() == Some(XS_NAMESPACE)
}

fn is_xs(node: Node, local_name: &str) -> bool {
    node.is_element() && is_xs_node(node) && node.tag_name().name() == local_name
}

/// Resolves a `prefix:local` attribute value against the in-scope namespace
/// declarations. An unknown prefix yields the empty namespace, which then
/// fails to resolve and is reported.
fn qname(node: Node, value: &str) -> QualifiedName {
    let value = value.trim();
    match value.split_once(':') {
        Some((prefix, local)) => {
            QualifiedName::new(node.lookup_namespace_uri(Some(prefix)).unwrap_or(""), local)
        }
        None => QualifiedName::new(node.lookup_namespace_uri(None).unwrap_or(""), value),
    }
}

fn documentation(node: Node) -> Option<String> {
    let parts: Vec<String> = node
        .children()
        .filter(|c| is_xs(*c, "annotation"))
        .flat_map(|annotation| annotation.children().filter(|c| is_xs(*c, "documentation")))
        .map(|doc| {
            doc.descendants()
                .filter(Node::is_text)
                .filter_map(|text| text.text())
                .collect::<String>()
                .trim()
                .to_string()
        })
        .filter(|text| !text.is_empty())
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}
