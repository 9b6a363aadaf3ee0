// crates/drawio-vsdx/src/import.rs
//
// Page traversal: places vertices in document order, buffers connector shapes until the
// page's connects are processed, then sanitizes and scales the page's output tree.

use crate::cascade::Resolver;
use crate::cells::CONVERSION_FACTOR;
use crate::config::ImportOptions;
use crate::document::{Document, PageIdx, ShapeIdx, ShapeKey};
use crate::error::ImportResult;
use crate::geometry::{self, Form};
use crate::graph::{CellId, CellTree, Geometry};
use crate::model::{Diagram, MxFile};
use crate::package::Package;
use crate::placement::{self, Point, Transform};
use crate::sanitize;
use crate::style::{StyleMap, Styler, VertexInput};
use crate::text;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::collections::BTreeMap;
use tracing::{debug, trace};

pub const HOST: &str = "drawio-vsdx";

/// Decodes a VSDX file into a draw.io file model, one diagram per foreground page.
pub fn import_vsdx(bytes: &[u8], options: &ImportOptions) -> ImportResult<MxFile> {
    let package = Package::from_bytes(bytes)?;
    let doc = Document::from_package_with_depth(&package, options.max_relationship_depth)?;
    Ok(import_document(&doc, options))
}

pub fn import_document(doc: &Document, options: &ImportOptions) -> MxFile {
    let diagrams = doc
        .pages
        .iter()
        .enumerate()
        .filter(|(_, page)| !page.background && options.includes_page(page.id, &page.name))
        .map(|(i, _)| import_page(doc, PageIdx(i), options))
        .collect();
    MxFile {
        host: Some(HOST.to_string()),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        file_type: None,
        diagrams,
    }
}

pub fn import_page(doc: &Document, page_idx: PageIdx, options: &ImportOptions) -> Diagram {
    let page = doc.page(page_idx);
    let mut builder = PageBuilder::new(doc);

    let background = page
        .back_page
        .filter(|_| options.include_background)
        .and_then(|id| doc.page_by_id(id))
        .filter(|bg| *bg != page_idx);
    let layer = match background {
        Some(bg) => {
            let base = builder.tree.default_layer();
            builder.place_page(bg, base);
            builder.tree.add_layer(Some(&page.name))
        }
        None => builder.tree.default_layer(),
    };
    builder.place_page(page_idx, layer);

    let mut tree = builder.tree;
    if options.sanitize {
        let removed = sanitize::sanitize(&mut tree);
        trace!(page = %page.name, removed, "sanitized page");
    }
    let scale = page.scale();
    tree.scale(scale);
    let model = tree.into_model(page.width * scale, page.height * scale);
    Diagram {
        id: Some(format!("page-{}", page.id)),
        name: Some(page.name.clone()),
        encoded_payload: None,
        graph_model: Some(model),
    }
}

/// Coordinate frame a shape is placed in.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Frame {
    pub width: f64,
    pub height: f64,
    /// Effective rotation of the enclosing group, clockwise degrees.
    pub rotation: f64,
}

impl Frame {
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }
}

/// A connector shape waiting for its page's connects.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingEdge {
    pub page: PageIdx,
    pub shape: ShapeIdx,
    pub parent: CellId,
    pub frame: Frame,
    /// Number of children the parent had when the shape was reached.
    pub z_index: usize,
    /// Position among all connectors of the builder, in document order.
    pub doc_pos: usize,
}

pub(crate) struct PageBuilder<'d> {
    pub doc: &'d Document,
    pub tree: CellTree,
    pub vertices: BTreeMap<ShapeKey, CellId>,
    pub pending: BTreeMap<ShapeKey, PendingEdge>,
    pub pending_order: Vec<ShapeKey>,
    /// `(z_index, doc_pos)` of the edges already inserted, per parent cell.
    pub edge_slots: BTreeMap<CellId, Vec<(usize, usize)>>,
    captured: usize,
}

impl<'d> PageBuilder<'d> {
    pub fn new(doc: &'d Document) -> Self {
        Self {
            doc,
            tree: CellTree::new(),
            vertices: BTreeMap::new(),
            pending: BTreeMap::new(),
            pending_order: Vec::new(),
            edge_slots: BTreeMap::new(),
            captured: 0,
        }
    }

    fn place_page(&mut self, page_idx: PageIdx, layer: CellId) {
        let page = self.doc.page(page_idx);
        let frame = Frame {
            width: page.width,
            height: page.height,
            rotation: 0.0,
        };
        for &shape in &page.shapes {
            self.add_shape(page_idx, shape, layer, frame);
        }
        self.connect_page(page_idx);
        self.insert_unconnected(page_idx);
    }

    fn add_shape(&mut self, page: PageIdx, shape: ShapeIdx, parent: CellId, frame: Frame) {
        let doc = self.doc;
        let node = doc.shape(shape);
        if !node.kind.is_vertex_eligible() {
            trace!(shape = node.id, kind = ?node.kind, "skipping non-drawing shape");
            return;
        }
        let key = ShapeKey { page, id: node.id };
        let resolver = Resolver::new(doc, Some(page));

        let mut width = resolver.own_number(shape, "Width").unwrap_or(0.0);
        let mut height = resolver.own_number(shape, "Height").unwrap_or(0.0);
        let sections = geometry::evaluate(&geometry::merged_sections(doc, shape), width, height);

        let edge_like = resolver.own_cell(shape, "BeginX").is_some()
            || resolver.own_cell(shape, "EndX").is_some();
        let is_vertex =
            !edge_like || !node.children.is_empty() || geometry::is_fillable(&sections);
        if !is_vertex {
            self.pending.insert(
                key,
                PendingEdge {
                    page,
                    shape,
                    parent,
                    frame,
                    z_index: self.tree.child_count(parent),
                    doc_pos: self.captured,
                },
            );
            self.captured += 1;
            self.pending_order.push(key);
            return;
        }

        if (width == 0.0 || height == 0.0)
            && let Some((w, h)) = geometry::implied_size(&sections)
        {
            if width == 0.0 {
                width = w;
            }
            if height == 0.0 {
                height = h;
            }
        }
        let transform = shape_transform(&resolver, shape, width, height, "");
        let own_rotation = placement::screen_rotation(resolver.own_number(shape, "Angle").unwrap_or(0.0));
        let rotation = placement::accumulate(own_rotation, frame.rotation);
        let rect = transform.rect(frame.height, own_rotation);

        let image = image_uri(doc, shape);
        let form = if image.is_some() {
            None
        } else {
            Some(geometry::classify_form(&sections, width, height))
        };
        let styler = Styler {
            resolver: &resolver,
            shape,
            connector: false,
        };
        let style = styler.vertex_style(&VertexInput {
            rotation,
            sections: &sections,
            form: form.as_ref(),
            image,
        });

        let label = text::html_label(&resolver, shape, false);
        let separate_label =
            !label.is_empty() && (is_displaced_label(&resolver, shape) || is_rotated_label(&resolver, shape));
        let cell = self.tree.insert_vertex(
            parent,
            Some(if separate_label { String::new() } else { label.clone() }),
            Some(style.to_string()),
            Geometry::rect(rect.x, rect.y, rect.width, rect.height),
        );
        self.vertices.insert(key, cell);
        if matches!(form, Some(Form::Stencil(_))) {
            trace!(shape = node.id, "geometry emitted as stencil");
        }

        if separate_label {
            self.add_label(&styler, cell, label, width, height, rotation);
        }

        let inner = Frame {
            width: rect.width,
            height: rect.height,
            rotation,
        };
        for &child in &node.children {
            self.add_shape(page, child, cell, inner);
        }
        if rotation != 0.0 {
            let pivot = inner.center();
            for &child in self.tree.children(cell).to_vec().iter() {
                if let Some(geometry) = self.tree.get_mut(child).geometry.as_mut() {
                    let r = placement::Rect {
                        x: geometry.x,
                        y: geometry.y,
                        width: geometry.width,
                        height: geometry.height,
                    }
                    .rotate_center_about(pivot, rotation);
                    geometry.x = r.x;
                    geometry.y = r.y;
                }
            }
        }
    }

    /// Label text drawn apart from its shape: a text-only child vertex placed by the
    /// text transform cells.
    fn add_label(
        &mut self,
        styler: &Styler<'_, '_>,
        parent: CellId,
        label: String,
        width: f64,
        height: f64,
        rotation: f64,
    ) {
        let resolver = styler.resolver;
        let transform = shape_transform(resolver, styler.shape, width, height, "Txt");
        let text_rotation = placement::screen_rotation(
            resolver.own_number(styler.shape, "TxtAngle").unwrap_or(0.0),
        );
        let rect = transform.rect(height * CONVERSION_FACTOR, text_rotation);
        let style: StyleMap = styler.label_style(placement::accumulate(text_rotation, rotation));
        self.tree.insert_vertex(
            parent,
            Some(label),
            Some(style.to_string()),
            Geometry::rect(rect.x, rect.y, rect.width, rect.height),
        );
    }
}

/// Pin, local pin and size in screen units. `prefix` selects the shape transform (`""`)
/// or the text block transform (`"Txt"`); the text block defaults to the whole shape.
pub(crate) fn shape_transform(
    resolver: &Resolver<'_>,
    shape: ShapeIdx,
    width: f64,
    height: f64,
    prefix: &str,
) -> Transform {
    let n = |name: &str| resolver.own_number(shape, &format!("{prefix}{name}"));
    let (w, h) = if prefix.is_empty() {
        (width, height)
    } else {
        (n("Width").unwrap_or(width), n("Height").unwrap_or(height))
    };
    let (default_pin_x, default_pin_y) = if prefix.is_empty() {
        (0.0, 0.0)
    } else {
        (width / 2.0, height / 2.0)
    };
    Transform {
        pin: Point::new(
            n("PinX").unwrap_or(default_pin_x) * CONVERSION_FACTOR,
            n("PinY").unwrap_or(default_pin_y) * CONVERSION_FACTOR,
        ),
        loc_pin: Point::new(
            n("LocPinX").unwrap_or(w / 2.0) * CONVERSION_FACTOR,
            n("LocPinY").unwrap_or(h / 2.0) * CONVERSION_FACTOR,
        ),
        width: w * CONVERSION_FACTOR,
        height: h * CONVERSION_FACTOR,
    }
}

fn normalized_formula(resolver: &Resolver<'_>, shape: ShapeIdx, name: &str) -> String {
    resolver
        .own_formula(shape, name)
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Whether the text block is moved away from the default centered, full-size placement.
pub(crate) fn is_displaced_label(resolver: &Resolver<'_>, shape: ShapeIdx) -> bool {
    let pin_x = normalized_formula(resolver, shape, "TxtPinX");
    let pin_y = normalized_formula(resolver, shape, "TxtPinY");
    let width = normalized_formula(resolver, shape, "TxtWidth");
    let height = normalized_formula(resolver, shape, "TxtHeight");

    if pin_x == "width*0.5" && pin_y == "height*0.5" && width == "width*1" && height == "height*1"
    {
        return false;
    }
    if pin_x.starts_with("width*")
        && pin_y.starts_with("height*")
        && width.starts_with("width*")
        && height.starts_with("height*")
    {
        return true;
    }
    pin_x.starts_with("controls.row_") || pin_y.starts_with("controls.row_")
}

pub(crate) fn is_rotated_label(resolver: &Resolver<'_>, shape: ShapeIdx) -> bool {
    resolver
        .own_cell(shape, "TxtAngle")
        .map(|c| c.value().trim())
        .is_some_and(|v| !v.is_empty() && v != "0" && v != "0.0")
}

/// `data:` URI for the media part behind a `Foreign` shape.
fn image_uri(doc: &Document, shape: ShapeIdx) -> Option<String> {
    let image = doc.shape(shape).image.as_ref()?;
    let Some(bytes) = doc.media(&image.path) else {
        debug!(part = %image.path, "image part not found");
        return None;
    };
    let ext = image
        .path
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "jpeg",
        "svg" => "svg+xml",
        "emf" => "x-emf",
        "wmf" => "x-wmf",
        other => other,
    };
    Some(format!("data:image/{mime},{}", STANDARD.encode(bytes)))
}
