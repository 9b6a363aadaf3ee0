// crates/drawio-vsdx/src/xml.rs
//
// Owned element tree for the OOXML parts of a VSDX package.
// - Element names are stored as written (`vt:lineStyle`) and matched by local name
// - Text nodes keep their position relative to child elements, the `<Text>` element of a
//   shape interleaves `cp`/`pp` markers with character data
// - Entity and character references are decoded (quick-xml 0.38 reports them separately)

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::str;

#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("attribute error: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("encoding error: {0}")]
    Encoding(#[from] quick_xml::encoding::EncodingError),

    #[error("utf8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("unexpected structure: {0}")]
    Structure(String),
}

pub type XmlResult<T> = Result<T, XmlError>;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// Attribute lookup by exact key first, then by local name (`r:id` answers `id`).
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .or_else(|| self.attributes.iter().find(|(k, _)| local_part(k) == key))
            .map(|(_, v)| v.as_str())
    }

    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attr(key).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn attr_i64(&self, key: &str) -> Option<i64> {
        self.attr(key).and_then(|v| v.trim().parse::<i64>().ok())
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    pub fn child(&self, local: &str) -> Option<&Element> {
        self.elements().find(|e| e.is(local))
    }

    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a Element> {
        self.elements().filter(move |e| e.is(local))
    }

    pub fn first_element(&self) -> Option<&Element> {
        self.elements().next()
    }

    /// Depth-first search below this element (the element itself excluded).
    pub fn descendants_named<'a>(&'a self, local: &str) -> Vec<&'a Element> {
        let mut out = Vec::new();
        collect_named(self, local, &mut out);
        out
    }

    /// Concatenated character data of this element and all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(self, &mut out);
        out
    }
}

fn collect_named<'a>(element: &'a Element, local: &str, out: &mut Vec<&'a Element>) {
    for child in element.elements() {
        if child.is(local) {
            out.push(child);
        }
        collect_named(child, local, out);
    }
}

fn collect_text(element: &Element, out: &mut String) {
    for node in &element.children {
        match node {
            Node::Text(t) => out.push_str(t),
            Node::Element(e) => collect_text(e, out),
        }
    }
}

pub fn local_part(name: &str) -> &str {
    match name.rfind(':') {
        Some(idx) => &name[idx + 1..],
        None => name,
    }
}

/// Parse a complete XML document and return its root element.
pub fn parse_document(xml: &str) -> XmlResult<Element> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                stack.push(element_from_start(&e)?);
            }
            Event::Empty(e) => {
                let element = element_from_start(&e)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                let element = stack.pop().ok_or_else(|| {
                    XmlError::Structure("closing tag without open element".into())
                })?;
                attach(&mut stack, &mut root, element);
            }
            Event::Text(t) => {
                let txt = t.decode()?;
                push_text(&mut stack, &txt);
            }
            Event::CData(c) => {
                let txt = c.decode()?;
                push_text(&mut stack, &txt);
            }
            Event::GeneralRef(r) => {
                if let Some(ch) = r.resolve_char_ref()? {
                    push_text(&mut stack, ch.encode_utf8(&mut [0u8; 4]));
                } else {
                    let name = r.decode()?;
                    match quick_xml::escape::resolve_predefined_entity(&name) {
                        Some(resolved) => push_text(&mut stack, resolved),
                        None => push_text(&mut stack, &format!("&{name};")),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(XmlError::Structure("unclosed element at end of input".into()));
    }
    root.ok_or_else(|| XmlError::Structure("document has no root element".into()))
}

pub fn parse_bytes(bytes: &[u8]) -> XmlResult<Element> {
    let text = str::from_utf8(strip_bom(bytes))?;
    parse_document(text)
}

fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes)
}

fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(Node::Element(element)),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

fn push_text(stack: &mut [Element], txt: &str) {
    let Some(parent) = stack.last_mut() else {
        return;
    };
    // Adjacent text and entity events merge into one node.
    if let Some(Node::Text(existing)) = parent.children.last_mut() {
        existing.push_str(txt);
    } else {
        parent.children.push(Node::Text(txt.to_string()));
    }
}

fn element_from_start(e: &BytesStart<'_>) -> XmlResult<Element> {
    let name = str::from_utf8(e.name().as_ref())?.to_string();
    let mut attributes = Vec::new();
    for a in e.attributes() {
        let a = a?;
        let key = str::from_utf8(a.key.as_ref())?.to_string();
        let val = a.unescape_value()?.to_string();
        attributes.push((key, val));
    }
    Ok(Element {
        name,
        attributes,
        children: Vec::new(),
    })
}
