// crates/drawio-vsdx/src/read.rs
//
// Reads mxfile XML back into the file model, inflating compressed `<diagram>` bodies.
// Used to check written output and to re-open converted files.

use crate::codec::{self, CodecError};
use crate::model::{Diagram, MxCell, MxFile, MxGeometry, MxGraphModel, MxPoint, Root};
use crate::xml::{self, Element, XmlError};

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("xml error: {0}")]
    Xml(#[from] XmlError),

    #[error("payload error: {0}")]
    Payload(#[from] CodecError),

    #[error("unexpected structure: {0}")]
    Structure(String),

    #[error("missing required attribute: {0}")]
    MissingAttr(&'static str),

    #[error("invalid number in {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

pub type ReadResult<T> = Result<T, ReadError>;

pub fn read_mxfile(xml: &str) -> ReadResult<MxFile> {
    let root = xml::parse_document(xml)?;
    if !root.is("mxfile") {
        return Err(ReadError::Structure(format!(
            "expected <mxfile>, found <{}>",
            root.local_name()
        )));
    }
    let diagrams = root
        .children_named("diagram")
        .map(read_diagram)
        .collect::<ReadResult<Vec<_>>>()?;
    Ok(MxFile {
        host: root.attr("host").map(str::to_string),
        version: root.attr("version").map(str::to_string),
        file_type: root.attr("type").map(str::to_string),
        diagrams,
    })
}

fn read_diagram(element: &Element) -> ReadResult<Diagram> {
    let mut diagram = Diagram {
        id: element.attr("id").map(str::to_string),
        name: element.attr("name").map(str::to_string),
        ..Diagram::default()
    };
    if let Some(model) = element.child("mxGraphModel") {
        diagram.graph_model = Some(read_model(model)?);
        return Ok(diagram);
    }
    let payload = element.text();
    if payload.trim().is_empty() {
        return Ok(diagram);
    }
    let decoded = codec::decode_payload(&payload)?;
    let model = xml::parse_document(&decoded)?;
    if !model.is("mxGraphModel") {
        return Err(ReadError::Structure(
            "diagram payload is not an <mxGraphModel>".into(),
        ));
    }
    diagram.graph_model = Some(read_model(&model)?);
    diagram.encoded_payload = Some(payload.trim().to_string());
    Ok(diagram)
}

fn read_model(element: &Element) -> ReadResult<MxGraphModel> {
    let cells = match element.child("root") {
        Some(root) => root
            .children_named("mxCell")
            .enumerate()
            .map(|(order, cell)| read_cell(cell, order))
            .collect::<ReadResult<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(MxGraphModel {
        grid: parse_bool_opt(element.attr("grid")),
        grid_size: parse_i64_opt(element.attr("gridSize"), "mxGraphModel@gridSize")?,
        guides: parse_bool_opt(element.attr("guides")),
        page: parse_bool_opt(element.attr("page")),
        page_scale: parse_f64_opt(element.attr("pageScale"), "mxGraphModel@pageScale")?,
        page_width: parse_f64_opt(element.attr("pageWidth"), "mxGraphModel@pageWidth")?,
        page_height: parse_f64_opt(element.attr("pageHeight"), "mxGraphModel@pageHeight")?,
        root: Root { cells },
    })
}

fn read_cell(element: &Element, order: usize) -> ReadResult<MxCell> {
    let id = element.attr("id").ok_or(ReadError::MissingAttr("mxCell@id"))?;
    let string = |key: &str| element.attr(key).map(str::to_string);
    Ok(MxCell {
        id: id.to_string(),
        parent: string("parent"),
        source: string("source"),
        target: string("target"),
        value: string("value"),
        style: string("style"),
        vertex: parse_bool_opt(element.attr("vertex")),
        edge: parse_bool_opt(element.attr("edge")),
        geometry: element.child("mxGeometry").map(read_geometry).transpose()?,
        order,
    })
}

fn read_geometry(element: &Element) -> ReadResult<MxGeometry> {
    let mut geometry = MxGeometry {
        x: parse_f64_opt(element.attr("x"), "mxGeometry@x")?,
        y: parse_f64_opt(element.attr("y"), "mxGeometry@y")?,
        width: parse_f64_opt(element.attr("width"), "mxGeometry@width")?,
        height: parse_f64_opt(element.attr("height"), "mxGeometry@height")?,
        relative: parse_bool_opt(element.attr("relative")),
        as_attr: element.attr("as").map(str::to_string),
        ..MxGeometry::default()
    };
    for child in element.elements() {
        if child.is("Array") && child.attr("as") == Some("points") {
            geometry.points = child
                .children_named("mxPoint")
                .map(read_point)
                .collect::<ReadResult<Vec<_>>>()?;
            continue;
        }
        if !child.is("mxPoint") {
            continue;
        }
        let point = read_point(child)?;
        match point.as_attr.as_deref() {
            Some("sourcePoint") => geometry.source_point = Some(point),
            Some("targetPoint") => geometry.target_point = Some(point),
            Some("offset") => geometry.offset_point = Some(point),
            _ => {}
        }
    }
    Ok(geometry)
}

fn read_point(element: &Element) -> ReadResult<MxPoint> {
    Ok(MxPoint {
        x: parse_f64_opt(element.attr("x"), "mxPoint@x")?,
        y: parse_f64_opt(element.attr("y"), "mxPoint@y")?,
        as_attr: element.attr("as").map(str::to_string),
    })
}

fn parse_bool_opt(v: Option<&str>) -> Option<bool> {
    match v? {
        "1" | "true" | "TRUE" | "True" => Some(true),
        "0" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_i64_opt(v: Option<&str>, field: &'static str) -> ReadResult<Option<i64>> {
    let Some(s) = v.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    s.parse::<i64>()
        .map(Some)
        .map_err(|_| ReadError::InvalidNumber {
            field,
            value: s.to_string(),
        })
}

fn parse_f64_opt(v: Option<&str>, field: &'static str) -> ReadResult<Option<f64>> {
    let Some(s) = v.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    serde_json::from_str::<f64>(s)
        .map(Some)
        .map_err(|_| ReadError::InvalidNumber {
            field,
            value: s.to_string(),
        })
}
