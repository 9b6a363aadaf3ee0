mod helpers;

use drawio_vsdx::tables::{dash_pattern, format_dash_pattern};
use drawio_vsdx::{ImportOptions, MxGraphModel, import_vsdx};
use helpers::{PageFixture, VsdxBuilder, connector_shape, rect_shape};

const THEME: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:srgbClr val="000000"/></a:dk1>
      <a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
    </a:clrScheme>
    <a:fmtScheme name="Office">
      <a:fillStyleLst><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:fillStyleLst>
      <a:lnStyleLst><a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln></a:lnStyleLst>
    </a:fmtScheme>
  </a:themeElements>
</a:theme>"#;

fn model_with(builder: VsdxBuilder, options: &ImportOptions) -> MxGraphModel {
    let file = import_vsdx(&builder.build(), options).expect("import vsdx");
    file.diagrams[0].graph_model.clone().expect("graph model")
}

fn style_of<'a>(model: &'a MxGraphModel, id: &str) -> &'a str {
    model
        .cell(id)
        .and_then(|c| c.style.as_deref())
        .unwrap_or_default()
}

fn shape(id: u32, attrs: &str, cells: &str) -> String {
    rect_shape(id, (f64::from(id), 1.0), (0.5, 0.5), cells)
        .replacen(r#"Type="Shape""#, &format!(r#"Type="Shape" {attrs}"#), 1)
}

#[test]
fn local_value_is_never_overridden() {
    let master = r##"<Shape ID="5" Type="Shape"><Cell N="FillForegnd" V="#00FF00"/></Shape>"##;
    let sheets = r##"<StyleSheet ID="0" NameU="No Style"><Cell N="FillForegnd" V="#FFFFFF"/></StyleSheet>
<StyleSheet ID="3" NameU="Blue" FillStyle="0"><Cell N="FillForegnd" V="#0000FF"/></StyleSheet>"##;
    let red = r##"<Cell N="FillForegnd" V="#FF0000"/>"##;
    let shapes = shape(1, r#"Master="10""#, "")
        + &shape(2, r#"Master="10""#, red)
        + &shape(3, r#"FillStyle="3""#, "")
        + &shape(4, r#"FillStyle="3""#, red);
    let model = model_with(
        VsdxBuilder::new()
            .stylesheets(sheets)
            .master(10, master)
            .page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );

    let fill = |id: &str| model.cell(id).and_then(|c| c.style_value("fillColor")).map(str::to_string);
    assert_eq!(fill("2").as_deref(), Some("#00FF00"));
    assert_eq!(fill("3").as_deref(), Some("#FF0000"));
    assert_eq!(fill("4").as_deref(), Some("#0000FF"));
    assert_eq!(fill("5").as_deref(), Some("#FF0000"));
}

#[test]
fn fill_pattern_zero_means_no_fill() {
    let cells = r##"<Cell N="FillForegnd" V="#FF0000"/><Cell N="FillPattern" V="0"/>"##;
    let model = model_with(
        VsdxBuilder::new().page(PageFixture::new(0, shape(1, "", cells))),
        &ImportOptions::default(),
    );
    assert!(style_of(&model, "2").contains("fillColor=none"));
}

#[test]
fn line_pattern_selects_stroke_and_dashes() {
    let none = r#"<Cell N="LinePattern" V="0"/>"#;
    let solid = r#"<Cell N="LinePattern" V="1"/>"#;
    let dashed = r##"<Cell N="LinePattern" V="2"/><Cell N="LineColor" V="#112233"/>"##;
    let shapes = shape(1, "", none) + &shape(2, "", solid) + &shape(3, "", dashed);
    let model = model_with(
        VsdxBuilder::new().page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );

    let hidden = style_of(&model, "2");
    assert!(hidden.contains("strokeColor=none"), "{hidden}");
    assert!(!hidden.contains("dashed"), "{hidden}");

    assert!(!style_of(&model, "3").contains("dashed"));

    let dashed = model.cell("4").expect("dashed shape");
    assert_eq!(dashed.style_value("dashed"), Some("1"));
    assert_eq!(dashed.style_value("strokeColor"), Some("#112233"));
    let expected = format_dash_pattern(dash_pattern(2).expect("pattern 2"));
    assert_eq!(expected, "4.00 3.00");
    assert_eq!(dashed.style_value("dashPattern"), Some(expected.as_str()));
}

#[test]
fn theme_value_resolves_through_quick_style() {
    let cells = r#"<Cell N="FillForegnd" V="Themed" F="THEMEVAL()"/><Cell N="QuickStyleFillMatrix" V="1"/><Cell N="QuickStyleFillColor" V="2"/>"#;
    let model = model_with(
        VsdxBuilder::new()
            .theme(THEME)
            .page(PageFixture::new(0, shape(1, "", cells))),
        &ImportOptions::default(),
    );
    assert_eq!(
        model.cell("2").and_then(|c| c.style_value("fillColor")),
        Some("#4472C4")
    );
}

#[test]
fn invisible_shapes_are_sanitized() {
    let hidden = r#"<Cell N="FillPattern" V="0"/><Cell N="LinePattern" V="0"/>"#;
    let shapes = shape(1, "", hidden) + &shape(2, "", "");
    let builder = || VsdxBuilder::new().page(PageFixture::new(0, shapes.clone()));

    let sanitized = model_with(builder(), &ImportOptions::default());
    assert!(sanitized.cell("2").is_none());
    assert!(sanitized.cell("3").is_some());

    let raw = model_with(
        builder(),
        &ImportOptions {
            sanitize: false,
            ..ImportOptions::default()
        },
    );
    assert!(raw.cell("2").is_some());
}

const VARIANT_THEME: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:vt="http://schemas.microsoft.com/office/visio/2012/theme" name="Office Theme">
  <a:themeElements>
    <a:clrScheme name="Office">
      <a:dk1><a:srgbClr val="000000"/></a:dk1>
      <a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>
      <a:accent1><a:srgbClr val="4472C4"/></a:accent1>
      <a:extLst><a:ext uri="{D75FF966-D11B-4627-B2F5-D4E2F7B8A6F7}">
        <vt:variationClrSchemeLst>
          <vt:variationClrScheme monotone="1">
            <vt:varColor1><a:srgbClr val="AA0000"/></vt:varColor1>
            <vt:varColor2><a:srgbClr val="AA1111"/></vt:varColor2>
          </vt:variationClrScheme>
          <vt:variationClrScheme>
            <vt:varColor1><a:srgbClr val="BB0000"/></vt:varColor1>
            <vt:varColor2><a:srgbClr val="00BB00"/></vt:varColor2>
          </vt:variationClrScheme>
        </vt:variationClrSchemeLst>
      </a:ext></a:extLst>
    </a:clrScheme>
    <a:fmtScheme name="Office">
      <a:fillStyleLst>
        <a:solidFill><a:schemeClr val="phClr"/></a:solidFill>
        <a:solidFill><a:srgbClr val="123456"/></a:solidFill>
      </a:fillStyleLst>
      <a:lnStyleLst>
        <a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>
        <a:ln w="12700"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill><a:prstDash val="dash"/><a:headEnd type="triangle" w="lg"/></a:ln>
      </a:lnStyleLst>
      <a:extLst><a:ext uri="{2E2A4B5D-8A0E-4A38-9F1A-5A3B1F4C9D10}">
        <vt:fmtSchemeLineStyles>
          <vt:lineStyle><vt:lineEx rndg="0" start="0" startSize="2" end="0" endSize="2" pattern="1"/></vt:lineStyle>
          <vt:lineStyle><vt:lineEx rndg="0" start="4" startSize="1" end="0" endSize="2" pattern="0"/></vt:lineStyle>
        </vt:fmtSchemeLineStyles>
      </a:ext></a:extLst>
    </a:fmtScheme>
    <a:extLst><a:ext uri="{B4A0D6C5-7B14-4A4A-8D3E-3F0F6E1C2B11}">
      <vt:variationStyleSchemeLst>
        <vt:variationStyleScheme embellishment="0">
          <vt:varStyle fillIdx="0" lineIdx="0" effectIdx="0" fontIdx="0"/>
          <vt:varStyle fillIdx="1" lineIdx="1" effectIdx="1" fontIdx="1"/>
        </vt:variationStyleScheme>
      </vt:variationStyleSchemeLst>
    </a:ext></a:extLst>
  </a:themeElements>
</a:theme>"#;

const THEMED_FILL: &str = r#"<Cell N="FillForegnd" V="Themed" F="THEMEVAL()"/>"#;

#[test]
fn variant_colors_follow_matrix_and_monotone_sets() {
    let fill = |matrix: &str, color: &str, variant: &str| {
        format!(
            r#"{THEMED_FILL}<Cell N="QuickStyleFillMatrix" V="{matrix}"/><Cell N="QuickStyleFillColor" V="{color}"/><Cell N="VariationColorIndex" V="{variant}"/>"#
        )
    };
    let shapes = shape(1, "", &fill("100", "101", "0"))
        + &shape(2, "", &fill("100", "101", "1"))
        + &shape(3, "", &fill("101", "101", "1"));
    let model = model_with(
        VsdxBuilder::new()
            .theme(VARIANT_THEME)
            .page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );

    let fill_of = |id: &str| model.cell(id).and_then(|c| c.style_value("fillColor"));
    // The monotone set forces the first variant color.
    assert_eq!(fill_of("2"), Some("#AA0000"));
    assert_eq!(fill_of("3"), Some("#00BB00"));
    // Matrix 101 goes through the second variant style to the literal fill.
    assert_eq!(fill_of("4"), Some("#123456"));
}

#[test]
fn themed_lines_fall_back_from_extended_to_standard_styles() {
    let line = |matrix: &str| {
        format!(
            r#"<Cell N="LinePattern" V="Themed" F="THEMEVAL()"/><Cell N="BeginArrow" V="Themed" F="THEMEVAL()"/><Cell N="BeginArrowSize" V="Themed" F="THEMEVAL()"/><Cell N="QuickStyleLineMatrix" V="{matrix}"/>"#
        )
    };
    let shapes = connector_shape(1, (1.0, 1.0), (3.0, 1.0), &line("1"))
        + &connector_shape(2, (1.0, 3.0), (3.0, 3.0), &line("2"))
        + &connector_shape(3, (1.0, 5.0), (3.0, 5.0), &line("3"));
    let model = model_with(
        VsdxBuilder::new()
            .theme(VARIANT_THEME)
            .page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );
    let cell = |id: &str| model.cell(id).expect("edge");

    // Extended style: pattern 0 hides the line, arrow from the descriptor.
    let extended = cell("2");
    assert_eq!(extended.style_value("strokeColor"), Some("none"));
    assert_eq!(extended.style_value("dashed"), None);
    assert_eq!(extended.style_value("startArrow"), Some("block"));
    assert_eq!(extended.style_value("startSize"), Some("3"));

    // No extended slot: the standard line style's dash and head end apply.
    let standard = cell("3");
    assert_eq!(standard.style_value("dashed"), Some("1"));
    assert_eq!(standard.style_value("dashPattern"), Some("4.00 3.00"));
    assert_eq!(standard.style_value("startArrow"), Some("block"));
    assert_eq!(standard.style_value("startSize"), Some("7"));
    assert_ne!(standard.style_value("strokeColor"), Some("none"));

    // Neither: solid line without arrows.
    let fallback = cell("4");
    assert_eq!(fallback.style_value("dashed"), None);
    assert_eq!(fallback.style_value("startArrow"), Some("none"));
    assert_ne!(fallback.style_value("strokeColor"), Some("none"));
}

#[test]
fn theme_value_on_plain_key_reads_no_style_sheet() {
    let sheets = r#"<StyleSheet ID="0" NameU="No Style"><Cell N="ShdwPattern" V="1"/></StyleSheet>
<StyleSheet ID="3" NameU="Flat" FillStyle="0"><Cell N="ShdwPattern" V="0"/></StyleSheet>"#;
    let themed = r#"<Cell N="ShdwPattern" V="Themed" F="THEMEVAL()"/>"#;
    let shapes = shape(1, r#"FillStyle="3""#, themed) + &shape(2, r#"FillStyle="3""#, "");
    let model = model_with(
        VsdxBuilder::new()
            .stylesheets(sheets)
            .page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );
    assert_eq!(model.cell("2").and_then(|c| c.style_value("shadow")), Some("1"));
    assert_eq!(model.cell("3").and_then(|c| c.style_value("shadow")), None);
}

#[test]
fn inherited_local_cell_skips_master() {
    let master = r##"<Shape ID="5" Type="Shape"><Cell N="FillForegnd" V="#00FF00"/></Shape>"##;
    let sheets = r##"<StyleSheet ID="0" NameU="No Style"><Cell N="FillForegnd" V="#FFFFFF"/></StyleSheet>
<StyleSheet ID="3" NameU="Blue" FillStyle="0"><Cell N="FillForegnd" V="#0000FF"/></StyleSheet>"##;
    let inherit = r#"<Cell N="FillForegnd" V="Themed" F="Inh"/>"#;
    let shapes = shape(1, r#"Master="10" FillStyle="3""#, inherit)
        + &shape(2, r#"Master="10" FillStyle="3""#, "");
    let model = model_with(
        VsdxBuilder::new()
            .stylesheets(sheets)
            .master(10, master)
            .page(PageFixture::new(0, shapes)),
        &ImportOptions::default(),
    );

    let fill = |id: &str| model.cell(id).and_then(|c| c.style_value("fillColor"));
    assert_eq!(fill("2"), Some("#0000FF"));
    assert_eq!(fill("3"), Some("#00FF00"));
}
