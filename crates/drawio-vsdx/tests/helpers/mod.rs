//! In-memory VSDX packages for integration tests.

#![allow(dead_code)]

use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const VISIO_NS: &str = "http://schemas.microsoft.com/office/visio/2012/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PKG_REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Zips `(path, content)` pairs into a package.
pub fn zip_parts(parts: &[(String, Vec<u8>)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (path, content) in parts {
        zip.start_file(path.as_str(), options).expect("start zip entry");
        zip.write_all(content).expect("write zip entry");
    }
    zip.finish().expect("finish zip").into_inner()
}

pub fn rels(entries: &[(&str, &str, &str)]) -> String {
    let body: String = entries
        .iter()
        .map(|(id, kind, target)| {
            format!(r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#)
        })
        .collect();
    format!(r#"<?xml version="1.0" encoding="utf-8"?><Relationships xmlns="{PKG_REL_NS}">{body}</Relationships>"#)
}

pub struct PageFixture {
    pub id: u32,
    pub name: String,
    pub attrs: String,
    pub page_sheet: String,
    pub shapes: String,
    pub connects: String,
}

impl PageFixture {
    /// A 10 x 10 inch page (1016 x 1016 screen units).
    pub fn new(id: u32, shapes: impl Into<String>) -> Self {
        Self {
            id,
            name: format!("Page-{}", id + 1),
            attrs: String::new(),
            page_sheet: cells(&[("PageWidth", "10"), ("PageHeight", "10")]),
            shapes: shapes.into(),
            connects: String::new(),
        }
    }

    pub fn connects(mut self, connects: impl Into<String>) -> Self {
        self.connects = connects.into();
        self
    }

    pub fn attrs(mut self, attrs: &str) -> Self {
        self.attrs = attrs.to_string();
        self
    }

    pub fn page_sheet(mut self, cells: String) -> Self {
        self.page_sheet = cells;
        self
    }
}

#[derive(Default)]
pub struct VsdxBuilder {
    pub stylesheets: String,
    pub pages: Vec<PageFixture>,
    pub masters: Vec<(u32, String)>,
    pub theme: Option<String>,
    pub extra: Vec<(String, Vec<u8>)>,
}

impl VsdxBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, page: PageFixture) -> Self {
        self.pages.push(page);
        self
    }

    pub fn master(mut self, id: u32, shapes: impl Into<String>) -> Self {
        self.masters.push((id, shapes.into()));
        self
    }

    pub fn stylesheets(mut self, xml: impl Into<String>) -> Self {
        self.stylesheets = xml.into();
        self
    }

    pub fn theme(mut self, xml: impl Into<String>) -> Self {
        self.theme = Some(xml.into());
        self
    }

    pub fn part(mut self, path: &str, content: impl Into<Vec<u8>>) -> Self {
        self.extra.push((path.to_string(), content.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let mut parts: Vec<(String, Vec<u8>)> = Vec::new();
        let mut push = |path: &str, content: String| parts.push((path.to_string(), content.into_bytes()));

        push(
            "visio/document.xml",
            format!(
                r#"<?xml version="1.0" encoding="utf-8"?><VisioDocument xmlns="{VISIO_NS}" xmlns:r="{REL_NS}"><StyleSheets>{}</StyleSheets></VisioDocument>"#,
                self.stylesheets
            ),
        );
        let mut doc_rels = vec![
            ("rId1", "http://schemas.microsoft.com/visio/2010/relationships/pages", "pages/pages.xml"),
        ];
        if !self.masters.is_empty() {
            doc_rels.push((
                "rId2",
                "http://schemas.microsoft.com/visio/2010/relationships/masters",
                "masters/masters.xml",
            ));
        }
        if self.theme.is_some() {
            doc_rels.push((
                "rId3",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme",
                "theme/theme1.xml",
            ));
        }
        push("visio/_rels/document.xml.rels", rels(&doc_rels));

        let mut page_list = String::new();
        let mut page_rels = Vec::new();
        for (i, page) in self.pages.iter().enumerate() {
            let rel_id = format!("rId{}", i + 1);
            page_list.push_str(&format!(
                r#"<Page ID="{}" NameU="{}" Name="{}" {}><PageSheet>{}</PageSheet><Rel r:id="{rel_id}"/></Page>"#,
                page.id, page.name, page.name, page.attrs, page.page_sheet
            ));
            page_rels.push((rel_id, format!("page{}.xml", i + 1)));
            push(
                &format!("visio/pages/page{}.xml", i + 1),
                format!(
                    r#"<?xml version="1.0" encoding="utf-8"?><PageContents xmlns="{VISIO_NS}" xmlns:r="{REL_NS}"><Shapes>{}</Shapes><Connects>{}</Connects></PageContents>"#,
                    page.shapes, page.connects
                ),
            );
        }
        push(
            "visio/pages/pages.xml",
            format!(
                r#"<?xml version="1.0" encoding="utf-8"?><Pages xmlns="{VISIO_NS}" xmlns:r="{REL_NS}">{page_list}</Pages>"#
            ),
        );
        let page_rels: Vec<(&str, &str, &str)> = page_rels
            .iter()
            .map(|(id, target)| {
                (
                    id.as_str(),
                    "http://schemas.microsoft.com/visio/2010/relationships/page",
                    target.as_str(),
                )
            })
            .collect();
        push("visio/pages/_rels/pages.xml.rels", rels(&page_rels));

        if !self.masters.is_empty() {
            let mut list = String::new();
            let mut master_rels = Vec::new();
            for (i, (id, shapes)) in self.masters.iter().enumerate() {
                let rel_id = format!("rId{}", i + 1);
                list.push_str(&format!(
                    r#"<Master ID="{id}" NameU="Master-{id}"><Rel r:id="{rel_id}"/></Master>"#
                ));
                master_rels.push((rel_id, format!("master{}.xml", i + 1)));
                push(
                    &format!("visio/masters/master{}.xml", i + 1),
                    format!(
                        r#"<?xml version="1.0" encoding="utf-8"?><MasterContents xmlns="{VISIO_NS}"><Shapes>{shapes}</Shapes></MasterContents>"#
                    ),
                );
            }
            push(
                "visio/masters/masters.xml",
                format!(
                    r#"<?xml version="1.0" encoding="utf-8"?><Masters xmlns="{VISIO_NS}" xmlns:r="{REL_NS}">{list}</Masters>"#
                ),
            );
            let master_rels: Vec<(&str, &str, &str)> = master_rels
                .iter()
                .map(|(id, target)| {
                    (
                        id.as_str(),
                        "http://schemas.microsoft.com/visio/2010/relationships/master",
                        target.as_str(),
                    )
                })
                .collect();
            push("visio/masters/_rels/masters.xml.rels", rels(&master_rels));
        }
        if let Some(theme) = self.theme {
            push("visio/theme/theme1.xml", theme);
        }
        parts.extend(self.extra);
        zip_parts(&parts)
    }
}

/// `<Cell N=".." V=".."/>` list.
pub fn cells(list: &[(&str, &str)]) -> String {
    list.iter()
        .map(|(n, v)| format!(r#"<Cell N="{n}" V="{v}"/>"#))
        .collect()
}

/// Closed rectangle geometry for a `w` x `h` inch shape.
pub fn rect_geometry(w: f64, h: f64) -> String {
    format!(
        r#"<Section N="Geometry" IX="0"><Cell N="NoFill" V="0"/><Cell N="NoLine" V="0"/><Row T="MoveTo" IX="1"><Cell N="X" V="0"/><Cell N="Y" V="0"/></Row><Row T="LineTo" IX="2"><Cell N="X" V="{w}"/><Cell N="Y" V="0"/></Row><Row T="LineTo" IX="3"><Cell N="X" V="{w}"/><Cell N="Y" V="{h}"/></Row><Row T="LineTo" IX="4"><Cell N="X" V="0"/><Cell N="Y" V="{h}"/></Row><Row T="LineTo" IX="5"><Cell N="X" V="0"/><Cell N="Y" V="0"/></Row></Section>"#
    )
}

/// A rectangle shape placed by its center.
pub fn rect_shape(id: u32, pin: (f64, f64), size: (f64, f64), extra: &str) -> String {
    let (w, h) = size;
    format!(
        r#"<Shape ID="{id}" Type="Shape">{}{extra}{}</Shape>"#,
        cells(&[
            ("PinX", &pin.0.to_string()),
            ("PinY", &pin.1.to_string()),
            ("Width", &w.to_string()),
            ("Height", &h.to_string()),
            ("LocPinX", &(w / 2.0).to_string()),
            ("LocPinY", &(h / 2.0).to_string()),
        ]),
        rect_geometry(w, h)
    )
}

/// A straight unfilled connector from `begin` to `end` (page inches).
pub fn connector_shape(id: u32, begin: (f64, f64), end: (f64, f64), extra: &str) -> String {
    let dx = end.0 - begin.0;
    let dy = end.1 - begin.1;
    let length = (dx * dx + dy * dy).sqrt();
    format!(
        r#"<Shape ID="{id}" Type="Shape">{}{extra}<Section N="Geometry" IX="0"><Cell N="NoFill" V="1"/><Row T="MoveTo" IX="1"><Cell N="X" V="0"/><Cell N="Y" V="0"/></Row><Row T="LineTo" IX="2"><Cell N="X" V="{length}"/><Cell N="Y" V="0"/></Row></Section></Shape>"#,
        cells(&[
            ("PinX", &((begin.0 + end.0) / 2.0).to_string()),
            ("PinY", &((begin.1 + end.1) / 2.0).to_string()),
            ("Width", &length.to_string()),
            ("Height", "0"),
            ("LocPinX", &(length / 2.0).to_string()),
            ("LocPinY", "0"),
            ("Angle", &dy.atan2(dx).to_string()),
            ("BeginX", &begin.0.to_string()),
            ("BeginY", &begin.1.to_string()),
            ("EndX", &end.0.to_string()),
            ("EndY", &end.1.to_string()),
        ])
    )
}

pub fn connect(from: u32, cell: &str, to: u32) -> String {
    format!(r#"<Connect FromSheet="{from}" FromCell="{cell}" ToSheet="{to}" ToCell="PinX"/>"#)
}

pub fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or(0.0);
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
