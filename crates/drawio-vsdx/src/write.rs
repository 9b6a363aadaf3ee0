// crates/drawio-vsdx/src/write.rs
//
// mxfile XML output. A compressed diagram body is the codec payload of the serialized
// `<mxGraphModel>`; an uncompressed one nests the model element directly.

use crate::codec;
use crate::model::{Diagram, MxCell, MxFile, MxGeometry, MxGraphModel, MxPoint};
use crate::serde_f64::format_f64;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use std::io::Write;

#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("utf8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

pub type WriteResult<T> = Result<T, WriteError>;

pub fn write_mxfile(file: &MxFile, compress: bool) -> WriteResult<String> {
    let mut writer = Writer::new(Vec::new());
    let mut root = BytesStart::new("mxfile");
    push_opt(&mut root, "host", file.host.as_deref());
    push_opt(&mut root, "version", file.version.as_deref());
    push_opt(&mut root, "type", file.file_type.as_deref());
    writer.write_event(Event::Start(root))?;
    for diagram in &file.diagrams {
        write_diagram(&mut writer, diagram, compress)?;
    }
    writer.write_event(Event::End(BytesEnd::new("mxfile")))?;
    Ok(String::from_utf8(writer.into_inner())?)
}

/// The `<mxGraphModel>` element alone, as used inside a compressed payload.
pub fn write_graph_model(model: &MxGraphModel) -> WriteResult<String> {
    let mut writer = Writer::new(Vec::new());
    write_model(&mut writer, model)?;
    Ok(String::from_utf8(writer.into_inner())?)
}

fn write_diagram<W: Write>(
    writer: &mut Writer<W>,
    diagram: &Diagram,
    compress: bool,
) -> WriteResult<()> {
    let mut start = BytesStart::new("diagram");
    push_opt(&mut start, "id", diagram.id.as_deref());
    push_opt(&mut start, "name", diagram.name.as_deref());
    writer.write_event(Event::Start(start))?;
    match (&diagram.graph_model, compress) {
        (Some(model), true) => {
            let payload = codec::encode_payload(&write_graph_model(model)?);
            writer.write_event(Event::Text(BytesText::new(&payload)))?;
        }
        (Some(model), false) => write_model(writer, model)?,
        (None, _) => {
            if let Some(payload) = &diagram.encoded_payload {
                writer.write_event(Event::Text(BytesText::new(payload)))?;
            }
        }
    }
    writer.write_event(Event::End(BytesEnd::new("diagram")))?;
    Ok(())
}

fn write_model<W: Write>(writer: &mut Writer<W>, model: &MxGraphModel) -> WriteResult<()> {
    let mut start = BytesStart::new("mxGraphModel");
    push_flag(&mut start, "grid", model.grid);
    if let Some(size) = model.grid_size {
        start.push_attribute(("gridSize", size.to_string().as_str()));
    }
    push_flag(&mut start, "guides", model.guides);
    push_flag(&mut start, "page", model.page);
    push_num(&mut start, "pageScale", model.page_scale);
    push_num(&mut start, "pageWidth", model.page_width);
    push_num(&mut start, "pageHeight", model.page_height);
    writer.write_event(Event::Start(start))?;
    writer.write_event(Event::Start(BytesStart::new("root")))?;
    for cell in &model.root.cells {
        write_cell(writer, cell)?;
    }
    writer.write_event(Event::End(BytesEnd::new("root")))?;
    writer.write_event(Event::End(BytesEnd::new("mxGraphModel")))?;
    Ok(())
}

fn write_cell<W: Write>(writer: &mut Writer<W>, cell: &MxCell) -> WriteResult<()> {
    let mut start = BytesStart::new("mxCell");
    start.push_attribute(("id", cell.id.as_str()));
    push_opt(&mut start, "value", cell.value.as_deref());
    push_opt(&mut start, "style", cell.style.as_deref());
    push_flag(&mut start, "vertex", cell.vertex);
    push_flag(&mut start, "edge", cell.edge);
    push_opt(&mut start, "parent", cell.parent.as_deref());
    push_opt(&mut start, "source", cell.source.as_deref());
    push_opt(&mut start, "target", cell.target.as_deref());
    match &cell.geometry {
        Some(geometry) => {
            writer.write_event(Event::Start(start))?;
            write_geometry(writer, geometry)?;
            writer.write_event(Event::End(BytesEnd::new("mxCell")))?;
        }
        None => writer.write_event(Event::Empty(start))?,
    }
    Ok(())
}

fn write_geometry<W: Write>(writer: &mut Writer<W>, geometry: &MxGeometry) -> WriteResult<()> {
    let mut start = BytesStart::new("mxGeometry");
    push_num(&mut start, "x", geometry.x);
    push_num(&mut start, "y", geometry.y);
    push_num(&mut start, "width", geometry.width);
    push_num(&mut start, "height", geometry.height);
    push_flag(&mut start, "relative", geometry.relative);
    push_opt(&mut start, "as", geometry.as_attr.as_deref());

    let has_children = geometry.source_point.is_some()
        || geometry.target_point.is_some()
        || geometry.offset_point.is_some()
        || !geometry.points.is_empty();
    if !has_children {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }
    writer.write_event(Event::Start(start))?;
    for point in [&geometry.source_point, &geometry.target_point, &geometry.offset_point]
        .into_iter()
        .flatten()
    {
        write_point(writer, point)?;
    }
    if !geometry.points.is_empty() {
        let mut array = BytesStart::new("Array");
        array.push_attribute(("as", "points"));
        writer.write_event(Event::Start(array))?;
        for point in &geometry.points {
            write_point(writer, point)?;
        }
        writer.write_event(Event::End(BytesEnd::new("Array")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("mxGeometry")))?;
    Ok(())
}

fn write_point<W: Write>(writer: &mut Writer<W>, point: &MxPoint) -> WriteResult<()> {
    let mut start = BytesStart::new("mxPoint");
    push_num(&mut start, "x", point.x);
    push_num(&mut start, "y", point.y);
    push_opt(&mut start, "as", point.as_attr.as_deref());
    writer.write_event(Event::Empty(start))?;
    Ok(())
}

fn push_opt(start: &mut BytesStart<'_>, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        start.push_attribute((key, value));
    }
}

fn push_flag(start: &mut BytesStart<'_>, key: &str, value: Option<bool>) {
    if let Some(value) = value {
        start.push_attribute((key, if value { "1" } else { "0" }));
    }
}

fn push_num(start: &mut BytesStart<'_>, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        start.push_attribute((key, format_f64(value).as_str()));
    }
}
