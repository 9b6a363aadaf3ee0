// crates/drawio-vsdx/src/document.rs
//
// Arena model of a decoded VSDX document. Pages, shapes (page and master shapes alike),
// masters, stylesheets and themes live in flat vectors and refer to each other by index, so
// cyclic or dangling references in the source can never produce ownership cycles.

use crate::assemble::{self, RESOLVED_TARGET_ATTR};
use crate::cells::{CONVERSION_FACTOR, Sheet};
use crate::error::{ImportError, ImportResult};
use crate::package::{Package, relationships};
use crate::tables;
use crate::theme::{Rgb, Theme};
use crate::xml::Element;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub const DOCUMENT_PART: &str = "visio/document.xml";
pub const PAGES_PART: &str = "visio/pages/pages.xml";
pub const MASTERS_PART: &str = "visio/masters/masters.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeIdx(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MasterIdx(pub usize);

/// Identity of a page shape for cross-references: shape ids are only unique per page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ShapeKey {
    pub page: PageIdx,
    pub id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Shape,
    Group,
    Foreign,
    Guide,
    Other,
}

impl ShapeType {
    fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("Shape") => ShapeType::Shape,
            Some("Group") => ShapeType::Group,
            Some("Foreign") => ShapeType::Foreign,
            Some("Guide") => ShapeType::Guide,
            Some(_) => ShapeType::Other,
        }
    }

    pub fn is_vertex_eligible(self) -> bool {
        matches!(self, ShapeType::Shape | ShapeType::Group | ShapeType::Foreign)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Owner {
    Page(PageIdx),
    Master(MasterIdx),
}

/// Embedded media referenced by a `Foreign` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignImage {
    pub path: String,
    pub foreign_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub id: u32,
    pub owner: Owner,
    pub name: Option<String>,
    pub kind: ShapeType,
    pub master: Option<MasterIdx>,
    /// Template shape inside the master this instance inherits from.
    pub master_shape: Option<ShapeIdx>,
    pub parent: Option<ShapeIdx>,
    pub children: Vec<ShapeIdx>,
    pub line_style: Option<u32>,
    pub fill_style: Option<u32>,
    pub text_style: Option<u32>,
    pub sheet: Sheet,
    pub text: Option<Element>,
    pub image: Option<ForeignImage>,
}

impl Shape {
    pub fn is_group(&self) -> bool {
        self.kind == ShapeType::Group || !self.children.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Master {
    pub id: u32,
    pub name: String,
    pub top_level: Vec<ShapeIdx>,
    /// Every shape of the master, nested ones included, by id.
    pub shapes: BTreeMap<u32, ShapeIdx>,
}

impl Master {
    /// The template for instances that name the master but no `MasterShape`.
    pub fn main_shape(&self) -> Option<ShapeIdx> {
        self.top_level.first().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    pub id: u32,
    pub name: String,
    pub line_parent: Option<u32>,
    pub fill_parent: Option<u32>,
    pub text_parent: Option<u32>,
    pub sheet: Sheet,
}

/// One edge end per record, grouped by `FromSheet`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectGroup {
    pub from_sheet: u32,
    pub source: Option<u32>,
    pub target: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub id: u32,
    pub name: String,
    pub background: bool,
    pub back_page: Option<u32>,
    pub sheet: Sheet,
    /// Page size in screen units, before the page scale is applied.
    pub width: f64,
    pub height: f64,
    pub page_scale: f64,
    pub drawing_scale: f64,
    pub shapes: Vec<ShapeIdx>,
    pub shapes_by_id: BTreeMap<u32, ShapeIdx>,
    pub connects: Vec<ConnectGroup>,
}

impl Page {
    /// Uniform factor applied to every output coordinate of this page.
    pub fn scale(&self) -> f64 {
        if self.drawing_scale > 0.0 && self.page_scale > 0.0 {
            self.page_scale / self.drawing_scale
        } else {
            1.0
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    pub pages: Vec<Page>,
    pub shapes: Vec<Shape>,
    pub masters: Vec<Master>,
    pub stylesheets: BTreeMap<u32, StyleSheet>,
    pub themes: Vec<Theme>,
    pub colors: Vec<Rgb>,
    media: BTreeMap<String, Vec<u8>>,
}

impl Document {
    pub fn from_package(package: &Package) -> ImportResult<Self> {
        Self::from_package_with_depth(package, assemble::DEFAULT_MAX_DEPTH)
    }

    pub fn from_package_with_depth(package: &Package, max_depth: usize) -> ImportResult<Self> {
        let parts = package.parts();
        let Some(root) = assemble::assemble(parts, DOCUMENT_PART, max_depth) else {
            return Err(match package.part_error(DOCUMENT_PART) {
                Some(error) => error.into(),
                None => ImportError::MissingPart(DOCUMENT_PART.to_string()),
            });
        };
        if root.first_element().is_none() {
            return Err(ImportError::EmptyRoot(DOCUMENT_PART.to_string()));
        }

        let mut doc = Document {
            colors: legacy_palette(),
            ..Document::default()
        };
        doc.read_colors(&root);
        doc.read_stylesheets(&root);
        doc.read_themes(package);

        if let Some(masters) = assemble::assemble(parts, MASTERS_PART, max_depth) {
            for master in masters.children_named("Master") {
                doc.read_master(master);
            }
        } else {
            debug!(part = MASTERS_PART, "document has no masters");
        }

        if let Some(pages) = assemble::assemble(parts, PAGES_PART, max_depth) {
            for page in pages.children_named("Page") {
                doc.read_page(page);
            }
        } else {
            warn!(part = PAGES_PART, "document has no pages part");
        }

        for page in &doc.pages {
            for &shape in page.shapes_by_id.values() {
                if let Some(image) = &doc.shapes[shape.0].image
                    && let Some(bytes) = package.media(&image.path)
                {
                    doc.media.insert(image.path.clone(), bytes.to_vec());
                }
            }
        }
        Ok(doc)
    }

    pub fn shape(&self, idx: ShapeIdx) -> &Shape {
        &self.shapes[idx.0]
    }

    pub fn page(&self, idx: PageIdx) -> &Page {
        &self.pages[idx.0]
    }

    pub fn master(&self, idx: MasterIdx) -> &Master {
        &self.masters[idx.0]
    }

    pub fn page_by_id(&self, id: u32) -> Option<PageIdx> {
        self.pages.iter().position(|p| p.id == id).map(PageIdx)
    }

    pub fn shape_by_key(&self, key: ShapeKey) -> Option<ShapeIdx> {
        self.pages.get(key.page.0)?.shapes_by_id.get(&key.id).copied()
    }

    pub fn key_of(&self, idx: ShapeIdx) -> Option<ShapeKey> {
        match self.shape(idx).owner {
            Owner::Page(page) => Some(ShapeKey {
                page,
                id: self.shape(idx).id,
            }),
            Owner::Master(_) => None,
        }
    }

    pub fn media(&self, path: &str) -> Option<&[u8]> {
        self.media.get(path).map(Vec::as_slice)
    }

    /// Theme selected by a `ThemeIndex` value, else the first theme of the document.
    pub fn theme(&self, index: Option<i64>) -> Option<&Theme> {
        index
            .and_then(|ix| self.themes.iter().find(|t| t.id == Some(ix)))
            .or_else(|| self.themes.first())
    }

    /// Color cell value: `#RRGGBB`, or an index into the document palette.
    pub fn color(&self, value: &str) -> Option<Rgb> {
        let value = value.trim();
        if value.starts_with('#') {
            return Rgb::from_hex(value);
        }
        let index = value.parse::<f64>().ok()?;
        if index < 0.0 {
            return None;
        }
        self.colors.get(index as usize).copied()
    }

    fn read_colors(&mut self, root: &Element) {
        let Some(colors) = root.child("Colors") else {
            return;
        };
        for entry in colors.children_named("ColorEntry") {
            let (Some(ix), Some(rgb)) = (
                entry.attr_i64("IX"),
                entry.attr("RGB").and_then(Rgb::from_hex),
            ) else {
                continue;
            };
            let Ok(ix) = usize::try_from(ix) else {
                continue;
            };
            if ix >= self.colors.len() {
                self.colors.resize(ix + 1, Rgb::BLACK);
            }
            self.colors[ix] = rgb;
        }
    }

    fn read_stylesheets(&mut self, root: &Element) {
        let Some(sheets) = root.child("StyleSheets") else {
            return;
        };
        for sheet in sheets.children_named("StyleSheet") {
            let Some(id) = attr_u32(sheet, "ID") else {
                continue;
            };
            self.stylesheets.insert(
                id,
                StyleSheet {
                    id,
                    name: sheet
                        .attr("NameU")
                        .or_else(|| sheet.attr("Name"))
                        .unwrap_or_default()
                        .to_string(),
                    line_parent: attr_u32(sheet, "LineStyle"),
                    fill_parent: attr_u32(sheet, "FillStyle"),
                    text_parent: attr_u32(sheet, "TextStyle"),
                    sheet: Sheet::from_element(sheet),
                },
            );
        }
    }

    fn read_themes(&mut self, package: &Package) {
        let parts = package.parts();
        let mut paths: Vec<String> = relationships(parts, DOCUMENT_PART)
            .map(|rels| rels.targets_of_kind("/theme").map(str::to_string).collect())
            .unwrap_or_default();
        if paths.is_empty() {
            paths = package
                .part_paths()
                .filter(|p| p.starts_with("visio/theme/theme") && p.ends_with(".xml"))
                .map(str::to_string)
                .collect();
        }
        for path in paths {
            match package.part(&path) {
                Some(root) => self.themes.push(Theme::from_element(root)),
                None => debug!(part = %path, "theme part not found"),
            }
        }
    }

    fn read_master(&mut self, element: &Element) {
        let Some(id) = attr_u32(element, "ID") else {
            return;
        };
        let idx = MasterIdx(self.masters.len());
        self.masters.push(Master {
            id,
            name: element
                .attr("NameU")
                .or_else(|| element.attr("Name"))
                .unwrap_or_default()
                .to_string(),
            top_level: Vec::new(),
            shapes: BTreeMap::new(),
        });
        let mut all = BTreeMap::new();
        let top = match element.child("Shapes") {
            Some(shapes) => self.read_shapes(shapes, Owner::Master(idx), None, None, &mut all),
            None => Vec::new(),
        };
        let master = &mut self.masters[idx.0];
        master.top_level = top;
        master.shapes = all;
    }

    fn read_page(&mut self, element: &Element) {
        let Some(id) = attr_u32(element, "ID") else {
            return;
        };
        let sheet = element
            .child("PageSheet")
            .map(Sheet::from_element)
            .unwrap_or_default();
        let number = |name: &str, default: f64| sheet.number(name).unwrap_or(default);
        let idx = PageIdx(self.pages.len());
        self.pages.push(Page {
            id,
            name: element
                .attr("NameU")
                .or_else(|| element.attr("Name"))
                .unwrap_or_default()
                .to_string(),
            background: element.attr("Background") == Some("1"),
            back_page: attr_u32(element, "BackPage"),
            width: number("PageWidth", 8.5) * CONVERSION_FACTOR,
            height: number("PageHeight", 11.0) * CONVERSION_FACTOR,
            page_scale: number("PageScale", 1.0),
            drawing_scale: number("DrawingScale", 1.0),
            sheet,
            shapes: Vec::new(),
            shapes_by_id: BTreeMap::new(),
            connects: Vec::new(),
        });

        let mut all = BTreeMap::new();
        let top = match element.child("Shapes") {
            Some(shapes) => self.read_shapes(shapes, Owner::Page(idx), None, None, &mut all),
            None => Vec::new(),
        };
        let connects = element
            .child("Connects")
            .map(group_connects)
            .unwrap_or_default();
        let page = &mut self.pages[idx.0];
        page.shapes = top;
        page.shapes_by_id = all;
        page.connects = connects;
    }

    /// Reads a `<Shapes>` list recursively. `inherited_master` is the master of the
    /// enclosing group, used by children that only carry `MasterShape`.
    fn read_shapes(
        &mut self,
        list: &Element,
        owner: Owner,
        parent: Option<ShapeIdx>,
        inherited_master: Option<MasterIdx>,
        all: &mut BTreeMap<u32, ShapeIdx>,
    ) -> Vec<ShapeIdx> {
        let mut out = Vec::new();
        for element in list.children_named("Shape") {
            let Some(id) = attr_u32(element, "ID") else {
                continue;
            };
            let master = match attr_u32(element, "Master") {
                Some(master_id) => {
                    let found = self.masters.iter().position(|m| m.id == master_id);
                    if found.is_none() {
                        debug!(shape = id, master = master_id, "unknown master reference");
                    }
                    found.map(MasterIdx)
                }
                None => inherited_master,
            };
            let master_shape = master.and_then(|m| {
                let master = &self.masters[m.0];
                match attr_u32(element, "MasterShape") {
                    Some(sub) => master.shapes.get(&sub).copied(),
                    None if attr_u32(element, "Master").is_some() => master.main_shape(),
                    None => None,
                }
            });
            let template = master_shape.map(|m| &self.shapes[m.0]);
            let style_ref = |key: &str, from_template: Option<u32>| {
                attr_u32(element, key).or(from_template)
            };

            let shape = Shape {
                id,
                owner,
                name: element
                    .attr("NameU")
                    .or_else(|| element.attr("Name"))
                    .map(str::to_string),
                kind: ShapeType::parse(
                    element
                        .attr("Type")
                        .or_else(|| template.map(|t| t.kind).and_then(type_name)),
                ),
                master,
                master_shape,
                parent,
                children: Vec::new(),
                line_style: style_ref("LineStyle", template.and_then(|t| t.line_style)),
                fill_style: style_ref("FillStyle", template.and_then(|t| t.fill_style)),
                text_style: style_ref("TextStyle", template.and_then(|t| t.text_style)),
                sheet: Sheet::from_element(element),
                text: element.child("Text").cloned(),
                image: element.child("ForeignData").and_then(foreign_image),
            };
            let idx = ShapeIdx(self.shapes.len());
            self.shapes.push(shape);
            all.insert(id, idx);

            if let Some(children) = element.child("Shapes") {
                let kids = self.read_shapes(children, owner, Some(idx), master, all);
                self.shapes[idx.0].children = kids;
            }
            out.push(idx);
        }
        out
    }
}

fn type_name(kind: ShapeType) -> Option<&'static str> {
    match kind {
        ShapeType::Shape => Some("Shape"),
        ShapeType::Group => Some("Group"),
        ShapeType::Foreign => Some("Foreign"),
        ShapeType::Guide => Some("Guide"),
        ShapeType::Other => None,
    }
}

fn foreign_image(data: &Element) -> Option<ForeignImage> {
    let rel = data.child("Rel")?;
    Some(ForeignImage {
        path: rel.attr(RESOLVED_TARGET_ATTR)?.to_string(),
        foreign_type: data.attr("ForeignType").map(str::to_string),
    })
}

/// Groups `Connect` records per `FromSheet` in order of first appearance. A `BeginX`
/// record names the source, `EndX` the target; the first record for each end wins.
pub fn group_connects(connects: &Element) -> Vec<ConnectGroup> {
    let mut out: Vec<ConnectGroup> = Vec::new();
    for connect in connects.children_named("Connect") {
        let (Some(from), Some(to)) = (attr_u32(connect, "FromSheet"), attr_u32(connect, "ToSheet"))
        else {
            continue;
        };
        let slot = match out.iter().position(|g| g.from_sheet == from) {
            Some(i) => i,
            None => {
                out.push(ConnectGroup {
                    from_sheet: from,
                    source: None,
                    target: None,
                });
                out.len() - 1
            }
        };
        let group = &mut out[slot];
        match connect.attr("FromCell") {
            Some("BeginX") if group.source.is_none() => group.source = Some(to),
            Some("EndX") if group.target.is_none() => group.target = Some(to),
            _ => {}
        }
    }
    out
}

fn legacy_palette() -> Vec<Rgb> {
    tables::LEGACY_COLORS
        .iter()
        .filter_map(|hex| Rgb::from_hex(hex))
        .collect()
}

fn attr_u32(element: &Element, key: &str) -> Option<u32> {
    element.attr(key).and_then(|v| v.trim().parse().ok())
}
