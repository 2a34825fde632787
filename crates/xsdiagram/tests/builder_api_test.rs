//! Integration tests for the DiagramBuilder API
//!
//! These tests verify that the public API works and is usable.

use std::{fs, path::Path};

use xsdiagram::{
    DiagramBuilder, HitTestRegion, XsDiagramError,
    config::{AppConfig, TextMetricsMode},
    export::ExportOutcome,
};

const PURCHASE_ORDER: &str = r#"<?xml version="1.0"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
  <xs:element name="purchaseOrder" type="PurchaseOrderType"/>
  <xs:element name="comment" type="xs:string"/>
  <xs:complexType name="PurchaseOrderType">
    <xs:sequence>
      <xs:element name="shipTo" type="USAddress"/>
      <xs:element ref="comment" minOccurs="0"/>
      <xs:element name="item" maxOccurs="unbounded" type="xs:string"/>
    </xs:sequence>
    <xs:attribute name="orderDate" type="xs:date"/>
  </xs:complexType>
  <xs:complexType name="USAddress">
    <xs:sequence>
      <xs:element name="name" type="xs:string"/>
      <xs:element name="street" type="xs:string"/>
    </xs:sequence>
  </xs:complexType>
</xs:schema>"#;

/// Estimated metrics keep the tests independent of installed fonts.
fn builder() -> DiagramBuilder {
    let mut config = AppConfig::default();
    config
        .layout_mut()
        .set_text_metrics(TextMetricsMode::Estimated);
    DiagramBuilder::new(config)
}

#[test]
fn test_builder_api_exists() {
    // Just verify the API compiles and can be constructed
    let _builder = DiagramBuilder::default();
}

#[test]
fn test_load_simple_schema() {
    let builder = builder();
    let result = builder.load_str(PURCHASE_ORDER);
    assert!(
        result.is_ok(),
        "Should load valid schema: {:?}",
        result.err()
    );
    assert_eq!(result.unwrap().top_level_elements().len(), 2);
}

#[test]
fn test_load_invalid_xml_returns_error() {
    let builder = builder();
    let result = builder.load_str("<xs:schema");
    assert!(
        matches!(result, Err(XsDiagramError::Load { .. })),
        "Should return a load error for malformed XML"
    );
}

#[test]
fn test_load_missing_file_is_io_error() {
    let builder = builder();
    let result = builder.load_file("does/not/exist.xsd");
    assert!(matches!(result, Err(XsDiagramError::Io(_))));
}

#[test]
fn test_render_simple_diagram() {
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    diagram.add_all(&graph, graph.top_level_elements());
    diagram.expand_levels(&graph, 2);

    let result = builder.render_svg(&mut diagram);
    if let Ok(svg) = result {
        assert!(svg.contains("<svg"), "Output should contain SVG tag");
        assert!(svg.contains("</svg>"), "Output should be complete SVG");
        assert!(svg.contains("purchaseOrder"));
        assert!(svg.contains("shipTo"));
    } else {
        panic!("Failed to render: {:?}", result.err());
    }
}

#[test]
fn test_render_keeps_scale() {
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    diagram.add_all(&graph, graph.top_level_elements());
    diagram.set_scale(3.0);

    builder.render_svg(&mut diagram).expect("Failed to render");
    assert_eq!(diagram.scale(), 3.0);
}

#[test]
fn test_layout_then_hit_test() {
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    let roots = diagram.add_all(&graph, graph.top_level_elements());
    builder.layout(&mut diagram).expect("Failed to lay out");

    let item = diagram.item(roots[0]).expect("root exists");
    let hit = diagram.hit_test(diagram.scale_point(item.box_rect().center()));
    assert_eq!(hit, (Some(roots[0]), HitTestRegion::Element));

    let glyph = item.expand_glyph_rect().expect("purchaseOrder has content");
    let hit = diagram.hit_test(diagram.scale_point(glyph.center()));
    assert_eq!(hit, (Some(roots[0]), HitTestRegion::ChildExpandButton));
}

#[test]
fn test_export_to_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    diagram.add_all(&graph, graph.top_level_elements());

    let (outcome, written) = builder
        .export(&mut diagram, &dir.path().join("order.png"), None, None)
        .expect("Failed to export");
    assert_eq!(outcome, ExportOutcome::Written);
    let bytes = fs::read(written).expect("Output should exist");
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
}

#[test]
fn test_export_without_extension_uses_default_format() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    diagram.add_all(&graph, graph.top_level_elements());

    let (_, written) = builder
        .export(&mut diagram, &dir.path().join("order"), None, None)
        .expect("Failed to export");
    assert_eq!(written, dir.path().join("order.svg"));
}

#[test]
fn test_builder_reusability() {
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");

    let mut first = builder.new_diagram();
    first.add_all(&graph, graph.find_elements_by_local_name("comment"));
    let svg1 = builder.render_svg(&mut first).expect("Failed to render first");

    let mut second = builder.new_diagram();
    second.add_all(&graph, graph.find_elements_by_local_name("purchaseOrder"));
    let svg2 = builder
        .render_svg(&mut second)
        .expect("Failed to render second");

    assert!(svg1.contains("comment"));
    assert!(!svg1.contains("purchaseOrder"));
    assert!(svg2.contains("purchaseOrder"));
}

#[test]
fn test_item_details() {
    let builder = builder();
    let graph = builder.load_str(PURCHASE_ORDER).expect("Failed to load");
    let mut diagram = builder.new_diagram();
    let roots = diagram.add_all(&graph, graph.find_elements_by_local_name("purchaseOrder"));
    let root = roots[0];

    let attributes = diagram.attributes_of(&graph, root);
    let names: Vec<_> = attributes.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["orderDate"]);
    assert_eq!(attributes[0].type_name.as_deref(), Some("date"));

    diagram.expand_levels(&graph, 2);
    let ship_to = diagram
        .visible_items()
        .into_iter()
        .find(|id| diagram.item(*id).is_some_and(|item| item.name() == "shipTo"))
        .expect("shipTo is visible after two levels");
    assert_eq!(diagram.element_path(ship_to), "/purchaseOrder/shipTo");
}

#[test]
fn test_enumerations_of_simple_typed_element() {
    let builder = builder();
    let demo = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/purchase-order.xsd");
    let graph = builder.load_file(&demo).expect("Failed to load demo");
    let mut diagram = builder.new_diagram();
    diagram.add_all(&graph, graph.find_elements_by_local_name("purchaseOrder"));
    diagram.expand_levels(&graph, 4);

    let find = |name: &str| {
        diagram
            .visible_items()
            .into_iter()
            .find(|id| diagram.item(*id).is_some_and(|item| item.name() == name))
            .unwrap_or_else(|| panic!("{name} should be visible"))
    };
    assert_eq!(
        diagram.enumerations_of(&graph, find("state")),
        ["AK", "AL", "CA", "NY"]
    );
    assert!(diagram.enumerations_of(&graph, find("city")).is_empty());
    assert!(diagram.enumerations_of(&graph, find("shipTo")).is_empty());
}
