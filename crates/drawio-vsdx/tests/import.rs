mod helpers;

use drawio_vsdx::{ImportOptions, MxCell, MxGraphModel, import_vsdx};
use helpers::{
    PageFixture, VsdxBuilder, assert_close, cells, connect, connector_shape, rect_shape,
};

fn import(bytes: &[u8]) -> MxGraphModel {
    let file = import_vsdx(bytes, &ImportOptions::default()).expect("import vsdx");
    assert_eq!(file.diagrams.len(), 1, "one foreground page");
    file.diagrams
        .into_iter()
        .next()
        .and_then(|d| d.graph_model)
        .expect("graph model")
}

fn single_page(shapes: String, connects: String) -> Vec<u8> {
    VsdxBuilder::new()
        .page(PageFixture::new(0, shapes).connects(connects))
        .build()
}

fn edges(model: &MxGraphModel) -> Vec<&MxCell> {
    model.root.cells.iter().filter(|c| c.is_edge()).collect()
}

#[test]
fn places_shape_from_pin_in_flipped_frame() {
    let bytes = single_page(rect_shape(1, (0.5, 0.25), (1.0, 0.5), ""), String::new());
    let model = import(&bytes);

    let cell = model.cell("2").expect("vertex");
    assert!(cell.is_vertex());
    assert_eq!(cell.parent.as_deref(), Some("1"));
    let geometry = cell.geometry.as_ref().expect("geometry");
    assert_close(geometry.x, 0.0);
    assert_close(geometry.y, 1016.0 - 50.8);
    assert_close(geometry.width, 101.6);
    assert_close(geometry.height, 50.8);
    assert_close(model.page_height, 1016.0);
}

#[test]
fn dangling_end_gets_anchor_vertex() {
    let shapes = rect_shape(1, (2.0, 2.0), (1.0, 1.0), "")
        + &connector_shape(2, (2.5, 2.0), (5.0, 5.0), "");
    let bytes = single_page(shapes, connect(2, "BeginX", 1));
    let model = import(&bytes);

    let edges = edges(&model);
    assert_eq!(edges.len(), 1);
    let edge = edges[0];
    assert_eq!(edge.source.as_deref(), Some("2"));

    let anchor = model
        .cell(edge.target.as_deref().expect("target"))
        .expect("anchor cell");
    assert!(anchor.is_vertex());
    assert_eq!(anchor.style, None);
    let geometry = anchor.geometry.as_ref().expect("anchor geometry");
    assert_eq!(geometry.x, Some(508.0));
    assert_eq!(geometry.y, Some(508.0));
    assert_eq!(geometry.width, None);
    assert_eq!(geometry.height, None);

    // The edge keeps the connector's document position, ahead of the appended anchor.
    let layer: Vec<&str> = model.children_of("1").map(|c| c.id.as_str()).collect();
    assert_eq!(layer, vec!["2", edge.id.as_str(), anchor.id.as_str()]);
}

#[test]
fn first_connect_wins_and_edge_is_not_duplicated() {
    let shapes = rect_shape(1, (1.0, 1.0), (1.0, 1.0), "")
        + &rect_shape(2, (6.0, 1.0), (1.0, 1.0), "")
        + &connector_shape(3, (1.5, 1.0), (5.5, 1.0), "");
    let connects = connect(3, "BeginX", 1) + &connect(3, "EndX", 2) + &connect(3, "BeginX", 2);
    let model = import(&single_page(shapes, connects));

    let edges = edges(&model);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source.as_deref(), Some("2"));
    assert_eq!(edges[0].target.as_deref(), Some("3"));
    let style = edges[0].style.as_deref().unwrap_or_default();
    assert!(style.contains("edgeStyle=none"), "{style}");
}

#[test]
fn unconnected_connector_keeps_its_end_points() {
    let bytes = single_page(connector_shape(7, (1.0, 9.0), (3.0, 9.0), ""), String::new());
    let model = import(&bytes);

    let edges = edges(&model);
    assert_eq!(edges.len(), 1);
    assert_eq!(edges[0].source, None);
    assert_eq!(edges[0].target, None);
    let geometry = edges[0].geometry.as_ref().expect("geometry");
    assert_eq!(geometry.relative, Some(true));
    let source = geometry.source_point.as_ref().expect("source point");
    let target = geometry.target_point.as_ref().expect("target point");
    assert_close(source.x, 101.6);
    assert_close(source.y, 1016.0 - 914.4);
    assert_close(target.x, 304.8);
}

#[test]
fn background_page_becomes_base_layer() {
    let bytes = VsdxBuilder::new()
        .page(
            PageFixture::new(0, rect_shape(1, (1.0, 1.0), (1.0, 1.0), ""))
                .attrs(r#"Background="1""#),
        )
        .page(PageFixture::new(1, rect_shape(1, (3.0, 3.0), (1.0, 1.0), "")).attrs(r#"BackPage="0""#))
        .build();
    let file = import_vsdx(&bytes, &ImportOptions::default()).expect("import");
    assert_eq!(file.diagrams.len(), 1);
    let diagram = &file.diagrams[0];
    assert_eq!(diagram.name.as_deref(), Some("Page-2"));
    let model = diagram.graph_model.as_ref().expect("model");

    let layers: Vec<&MxCell> = model.children_of("0").collect();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].value, None);
    assert_eq!(model.children_of(&layers[0].id).count(), 1);
    assert_eq!(model.children_of(&layers[1].id).count(), 1);

    let without = ImportOptions {
        include_background: false,
        ..ImportOptions::default()
    };
    let file = import_vsdx(&bytes, &without).expect("import");
    let model = file.diagrams[0].graph_model.as_ref().expect("model");
    assert_eq!(model.children_of("0").count(), 1);
}

#[test]
fn page_scale_multiplies_geometry() {
    let bytes = VsdxBuilder::new()
        .page(
            PageFixture::new(0, rect_shape(1, (0.5, 0.5), (1.0, 1.0), "")).page_sheet(cells(&[
                ("PageWidth", "10"),
                ("PageHeight", "10"),
                ("PageScale", "2"),
                ("DrawingScale", "1"),
            ])),
        )
        .build();
    let model = import(&bytes);
    let geometry = model.cell("2").and_then(|c| c.geometry.as_ref()).expect("geometry");
    assert_close(geometry.width, 203.2);
    assert_close(geometry.y, 2.0 * (1016.0 - 101.6));
    assert_close(model.page_width, 2032.0);
}

#[test]
fn group_rotation_moves_children_about_its_center() {
    let group = format!(
        r#"<Shape ID="1" Type="Group">{}<Shapes>{}</Shapes></Shape>"#,
        cells(&[
            ("PinX", "5"),
            ("PinY", "5"),
            ("Width", "2"),
            ("Height", "2"),
            ("LocPinX", "1"),
            ("LocPinY", "1"),
            ("Angle", "1.5707963267948966"),
        ]),
        rect_shape(2, (1.5, 1.0), (1.0, 1.0), "")
    );
    let model = import(&single_page(group, String::new()));

    let group = model.cell("2").expect("group");
    assert_eq!(group.style_value("rotation"), Some("270"));
    let child = model.cell("3").expect("child");
    assert_eq!(child.parent.as_deref(), Some("2"));
    assert_eq!(child.style_value("rotation"), Some("270"));
    let geometry = child.geometry.as_ref().expect("geometry");
    assert_close(geometry.x, 50.8);
    assert_close(geometry.y, 0.0);
}

#[test]
fn text_becomes_html_label() {
    let shape = rect_shape(1, (1.0, 1.0), (1.0, 1.0), "")
        .replace("</Shape>", "<Text>Fish &amp; chips</Text></Shape>");
    let model = import(&single_page(shape, String::new()));
    let value = model.cell("2").and_then(|c| c.value.as_deref()).unwrap_or_default();
    assert!(value.contains("Fish &amp; chips"), "{value}");
    assert!(value.starts_with(r#"<div style="text-align:center;">"#), "{value}");
}

#[test]
fn page_filter_selects_by_name_or_id() {
    let bytes = VsdxBuilder::new()
        .page(PageFixture::new(0, rect_shape(1, (1.0, 1.0), (1.0, 1.0), "")))
        .page(PageFixture::new(4, rect_shape(1, (1.0, 1.0), (1.0, 1.0), "")))
        .build();
    let all = import_vsdx(&bytes, &ImportOptions::default()).expect("import");
    assert_eq!(all.diagrams.len(), 2);

    let options = ImportOptions {
        page_ids: Some(vec!["4".to_string()]),
        ..ImportOptions::default()
    };
    let filtered = import_vsdx(&bytes, &options).expect("import");
    assert_eq!(filtered.diagrams.len(), 1);
    assert_eq!(filtered.diagrams[0].id.as_deref(), Some("page-4"));
}

#[test]
fn decoding_is_deterministic() {
    let shapes = rect_shape(1, (2.0, 2.0), (1.0, 1.0), r##"<Cell N="FillForegnd" V="#336699"/>"##)
        + &connector_shape(2, (2.5, 2.0), (5.0, 5.0), "");
    let bytes = single_page(shapes, connect(2, "BeginX", 1));
    let first = serde_json::to_string(&import_vsdx(&bytes, &ImportOptions::default()).unwrap()).unwrap();
    let second = serde_json::to_string(&import_vsdx(&bytes, &ImportOptions::default()).unwrap()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_document_part_is_fatal() {
    let bytes = helpers::zip_parts(&[("visio/pages/pages.xml".to_string(), b"<Pages/>".to_vec())]);
    let err = import_vsdx(&bytes, &ImportOptions::default()).unwrap_err();
    assert!(matches!(err, drawio_vsdx::ImportError::MissingPart(_)), "{err}");
}

#[test]
fn cyclic_relationships_do_not_hang() {
    let shapes = rect_shape(1, (1.0, 1.0), (1.0, 1.0), "") + r#"<Rel r:id="rId1"/>"#;
    let bytes = VsdxBuilder::new()
        .page(PageFixture::new(0, shapes))
        .part(
            "visio/pages/_rels/page1.xml.rels",
            helpers::rels(&[("rId1", "http://example.com/page", "page1.xml")]),
        )
        .build();
    let model = import(&bytes);
    assert_eq!(model.root.cells.iter().filter(|c| c.is_vertex()).count(), 1);
}

/// Connector with explicit cells and a polyline geometry through `path` (local inches).
fn routed_connector(id: u32, cell_list: &[(&str, &str)], path: &[(f64, f64)]) -> String {
    let rows: String = path
        .iter()
        .enumerate()
        .map(|(i, (x, y))| {
            let kind = if i == 0 { "MoveTo" } else { "LineTo" };
            format!(
                r#"<Row T="{kind}" IX="{}"><Cell N="X" V="{x}"/><Cell N="Y" V="{y}"/></Row>"#,
                i + 1
            )
        })
        .collect();
    format!(
        r#"<Shape ID="{id}" Type="Shape">{}<Section N="Geometry" IX="0"><Cell N="NoFill" V="1"/>{rows}</Section></Shape>"#,
        cells(cell_list)
    )
}

fn with_text(shape: String, text: &str) -> String {
    let closing = shape.rfind("</Shape>").unwrap_or(shape.len());
    format!("{}<Text>{text}</Text>{}", &shape[..closing], &shape[closing..])
}

fn points(edge: &MxCell) -> Vec<(f64, f64)> {
    edge.geometry
        .as_ref()
        .map(|g| {
            g.points
                .iter()
                .map(|p| (p.x.unwrap_or(0.0), p.y.unwrap_or(0.0)))
                .collect()
        })
        .unwrap_or_default()
}

fn assert_points(actual: &[(f64, f64)], expected: &[(f64, f64)]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?}");
    for ((ax, ay), (ex, ey)) in actual.iter().zip(expected) {
        assert_close(Some(*ax), *ex);
        assert_close(Some(*ay), *ey);
    }
}

#[test]
fn rotated_connector_turns_its_waypoints() {
    let turned = routed_connector(
        1,
        &[
            ("PinX", "5"),
            ("PinY", "5"),
            ("Width", "2"),
            ("Height", "1"),
            ("Angle", "1.5707963267948966"),
            ("BeginX", "5"),
            ("BeginY", "5"),
            ("EndX", "4"),
            ("EndY", "7"),
        ],
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)],
    );
    let mirrored = routed_connector(
        2,
        &[
            ("PinX", "1"),
            ("PinY", "1"),
            ("Width", "2"),
            ("Height", "1"),
            ("FlipX", "1"),
            ("BeginX", "1"),
            ("BeginY", "1"),
            ("EndX", "-1"),
            ("EndY", "2"),
        ],
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)],
    );
    let model = import(&single_page(turned + &mirrored, String::new()));

    let edges = edges(&model);
    assert_eq!(edges.len(), 2);
    // Page (5, 6) and (4, 6), leading on to the end point at (4, 7).
    assert_points(&points(edges[0]), &[(508.0, 406.4), (406.4, 406.4)]);
    let target = edges[0]
        .geometry
        .as_ref()
        .and_then(|g| g.target_point.as_ref())
        .expect("target point");
    assert_close(target.x, 406.4);
    assert_close(target.y, 304.8);

    assert_points(&points(edges[1]), &[(0.0, 914.4), (0.0, 812.8)]);
}

#[test]
fn connects_out_of_order_keep_document_stacking() {
    let shapes = rect_shape(1, (1.0, 5.0), (1.0, 1.0), "")
        + &connector_shape(2, (1.5, 5.0), (5.0, 3.0), "")
        + &connector_shape(3, (1.5, 5.0), (5.0, 1.0), "");
    let connects = connect(3, "BeginX", 1) + &connect(2, "BeginX", 1);
    let model = import(&single_page(shapes, connects));

    let layer: Vec<&MxCell> = model.children_of("1").collect();
    let edge_targets: Vec<f64> = layer
        .iter()
        .filter(|c| c.is_edge())
        .filter_map(|c| c.geometry.as_ref()?.target_point.as_ref()?.y)
        .collect();
    // Shape 2 ends at y = 3in, shape 3 at y = 1in; shape 2 stays below shape 3.
    assert_eq!(edge_targets.len(), 2);
    assert_close(Some(edge_targets[0]), 1016.0 - 304.8);
    assert_close(Some(edge_targets[1]), 1016.0 - 101.6);
    let ids: Vec<&str> = layer.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["2", "6", "4", "3", "5"]);
}

#[test]
fn malformed_unused_part_is_skipped() {
    let bytes = VsdxBuilder::new()
        .page(PageFixture::new(0, rect_shape(1, (1.0, 1.0), (1.0, 1.0), "")))
        .part("docProps/custom.xml", "<Properties><unclosed></Properties>")
        .build();
    let model = import(&bytes);
    assert!(model.cell("2").is_some_and(MxCell::is_vertex));

    let broken = helpers::zip_parts(&[(
        "visio/document.xml".to_string(),
        b"<VisioDocument><unclosed></VisioDocument>".to_vec(),
    )]);
    let err = import_vsdx(&broken, &ImportOptions::default()).unwrap_err();
    assert!(
        matches!(
            &err,
            drawio_vsdx::ImportError::Package(drawio_vsdx::PackageError::Xml { part, .. })
                if part == "visio/document.xml"
        ),
        "{err}"
    );
}

#[test]
fn anchor_sits_on_fractional_end_point() {
    let shapes = rect_shape(1, (5.0, 5.0), (1.0, 1.0), "")
        + &connector_shape(2, (4.5, 5.0), (1.0, 9.0), "");
    let model = import(&single_page(shapes, connect(2, "BeginX", 1)));

    let edge = edges(&model)[0];
    let anchor = model
        .cell(edge.target.as_deref().expect("target"))
        .and_then(|c| c.geometry.as_ref())
        .expect("anchor geometry");
    assert_eq!(anchor.x, Some(101.6));
    assert_eq!(anchor.y, Some(101.6));
}

#[test]
fn curved_connector_gets_curve_points() {
    let shape = format!(
        r#"<Shape ID="1" Type="Shape">{}<Section N="Geometry" IX="0"><Cell N="NoFill" V="1"/><Row T="MoveTo" IX="1"><Cell N="X" V="0"/><Cell N="Y" V="0"/></Row><Row T="RelCubBezTo" IX="2"><Cell N="X" V="1"/><Cell N="Y" V="0"/><Cell N="A" V="0.25"/><Cell N="B" V="1"/><Cell N="C" V="0.75"/><Cell N="D" V="1"/></Row></Section></Shape>"#,
        cells(&[
            ("PinX", "2"),
            ("PinY", "5"),
            ("Width", "2"),
            ("Height", "1"),
            ("ConLineRouteExt", "2"),
            ("BeginX", "1"),
            ("BeginY", "5"),
            ("EndX", "3"),
            ("EndY", "5"),
        ])
    );
    let model = import(&single_page(shape, String::new()));

    let edge = edges(&model)[0];
    assert_eq!(edge.style_value("curved"), Some("1"));
    assert_eq!(edge.style_value("edgeStyle"), None);
    assert_points(&points(edge), &[(152.4, 406.4), (254.0, 406.4)]);
}

/// A 2 x 2 inch group centered on (5, 5), turned a quarter clockwise on screen.
fn quarter_turned_group(children: &str) -> String {
    format!(
        r#"<Shape ID="1" Type="Group">{}<Shapes>{children}</Shapes></Shape>"#,
        cells(&[
            ("PinX", "5"),
            ("PinY", "5"),
            ("Width", "2"),
            ("Height", "2"),
            ("LocPinX", "1"),
            ("LocPinY", "1"),
            ("Angle", "-1.5707963267948966"),
        ])
    )
}

#[test]
fn rotated_parent_turns_edge_route() {
    let connector = routed_connector(
        2,
        &[
            ("PinX", "1"),
            ("PinY", "1"),
            ("Width", "2"),
            ("Height", "1"),
            ("BeginX", "0"),
            ("BeginY", "0.5"),
            ("EndX", "2"),
            ("EndY", "1.5"),
        ],
        &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (2.0, 1.0)],
    );
    let model = import(&single_page(quarter_turned_group(&connector), String::new()));

    let edge = model.cell("3").expect("edge");
    assert!(edge.is_edge());
    assert_eq!(edge.parent.as_deref(), Some("2"));
    let geometry = edge.geometry.as_ref().expect("geometry");
    let source = geometry.source_point.as_ref().expect("source point");
    let target = geometry.target_point.as_ref().expect("target point");
    assert_close(source.x, 50.8);
    assert_close(source.y, 0.0);
    assert_close(target.x, 152.4);
    assert_close(target.y, 203.2);
    assert_points(&points(edge), &[(50.8, 101.6), (152.4, 101.6)]);
}

#[test]
fn label_offset_is_dropped_when_out_of_range() {
    let near = r#"<Cell N="TxtPinX" V="1"/><Cell N="TxtPinY" V="0.5"/>"#;
    let far = r#"<Cell N="TxtPinX" V="10000000000"/><Cell N="TxtPinY" V="0"/>"#;
    let shapes = with_text(connector_shape(1, (1.0, 5.0), (3.0, 5.0), near), "near")
        + &with_text(connector_shape(2, (1.0, 2.0), (3.0, 2.0), far), "far");
    let model = import(&single_page(shapes, String::new()));

    let edges = edges(&model);
    let offset = edges[0]
        .geometry
        .as_ref()
        .and_then(|g| g.offset_point.as_ref())
        .expect("offset");
    assert_close(offset.x, 0.0);
    assert_close(offset.y, -50.8);

    assert!(edges[1].value.as_deref().unwrap_or_default().contains("far"));
    assert_eq!(edges[1].geometry.as_ref().and_then(|g| g.offset_point.as_ref()), None);
}

#[test]
fn rotated_edge_label_becomes_text_child() {
    let level = with_text(
        connector_shape(1, (1.0, 5.0), (3.0, 5.0), r#"<Cell N="TxtAngle" V="-1.5707963267948966"/>"#),
        "up",
    );
    let model = import(&single_page(level, String::new()));
    let edge = edges(&model)[0];
    assert_eq!(edge.value.as_deref(), Some(""));
    let label: Vec<&MxCell> = model.children_of(&edge.id).collect();
    assert_eq!(label.len(), 1);
    assert!(label[0].is_vertex());
    assert!(label[0].style.as_deref().unwrap_or_default().starts_with("text;"));
    assert_eq!(label[0].style_value("rotation"), Some("90"));
    assert!(label[0].value.as_deref().unwrap_or_default().contains("up"));

    // Inside an upside-down parent the label is turned back by half a turn.
    let nested = with_text(
        routed_connector(
            2,
            &[
                ("PinX", "1"),
                ("PinY", "1"),
                ("Width", "2"),
                ("Height", "0"),
                ("TxtAngle", "0.7853981633974483"),
                ("BeginX", "0"),
                ("BeginY", "1"),
                ("EndX", "2"),
                ("EndY", "1"),
            ],
            &[(0.0, 0.0), (2.0, 0.0)],
        ),
        "turned",
    );
    let model = import(&single_page(quarter_turned_group(&nested), String::new()));
    let label: Vec<&MxCell> = model.children_of("3").collect();
    assert_eq!(label.len(), 1);
    assert_eq!(label[0].style_value("rotation"), Some("225"));
}

#[test]
fn control_driven_text_gets_separate_label() {
    let text_cells = r#"<Cell N="TxtPinX" V="0.5" F="Controls.Row_1"/><Cell N="TxtPinY" V="-0.25" F="Controls.Row_1.Y"/>"#;
    let shapes = with_text(rect_shape(1, (2.0, 2.0), (1.0, 1.0), text_cells), "caption")
        + &with_text(rect_shape(2, (5.0, 2.0), (1.0, 1.0), ""), "inline");
    let model = import(&single_page(shapes, String::new()));

    let shape = model.cell("2").expect("shape");
    assert_eq!(shape.value.as_deref(), Some(""));
    let label: Vec<&MxCell> = model.children_of("2").collect();
    assert_eq!(label.len(), 1);
    assert!(label[0].is_vertex());
    assert!(label[0].value.as_deref().unwrap_or_default().contains("caption"));
    assert_eq!(label[0].style_value("strokeColor"), Some("none"));

    let inline = model
        .root
        .cells
        .iter()
        .find(|c| c.value.as_deref().is_some_and(|v| v.contains("inline")))
        .expect("inline label");
    assert_eq!(inline.parent.as_deref(), Some("1"));
    assert_eq!(model.children_of(&inline.id).count(), 0);
}
