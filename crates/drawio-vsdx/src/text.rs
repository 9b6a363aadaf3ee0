// crates/drawio-vsdx/src/text.rs
//
// Shape text to HTML label. The `<Text>` element interleaves character data with empty
// `cp`/`pp` markers that switch the active `Character`/`Paragraph` row.

use crate::cascade::Resolver;
use crate::cells::{CellKey, CellState};
use crate::document::ShapeIdx;
use crate::style::horizontal_align;
use crate::xml::{Element, Node};
use std::fmt::Write as _;

/// Font size cells are in inches; labels use points.
const POINTS_PER_INCH: f64 = 72.0;

#[derive(Debug, Clone, PartialEq, Default)]
struct Run {
    character: u32,
    text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct Paragraph {
    index: u32,
    runs: Vec<Run>,
}

/// Text element of the shape, inherited from the master shape when absent.
pub fn text_element<'d>(resolver: &Resolver<'d>, shape: ShapeIdx) -> Option<&'d Element> {
    let mut current = Some(shape);
    let mut hops = 0;
    while let Some(idx) = current {
        let node = resolver.doc.shape(idx);
        if let Some(text) = &node.text {
            return Some(text);
        }
        hops += 1;
        if hops > 32 {
            return None;
        }
        current = node.master_shape;
    }
    None
}

/// HTML label for the shape, or an empty string when it carries no visible text.
pub fn html_label(resolver: &Resolver<'_>, shape: ShapeIdx, connector: bool) -> String {
    let Some(text) = text_element(resolver, shape) else {
        return String::new();
    };
    let paragraphs = split_paragraphs(text);
    if paragraphs
        .iter()
        .all(|p| p.runs.iter().all(|r| r.text.trim().is_empty()))
    {
        return String::new();
    }

    let mut html = String::new();
    for paragraph in &paragraphs {
        let align = resolver
            .indexed(shape, "Paragraph", paragraph.index, "HorzAlign")
            .filter(|c| c.state() == CellState::Concrete)
            .and_then(|c| c.integer());
        let _ = write!(
            html,
            r#"<div style="text-align:{};">"#,
            horizontal_align(align)
        );
        for run in &paragraph.runs {
            if run.text.is_empty() {
                continue;
            }
            let font = font_style(resolver, shape, run.character, connector);
            let body = escape_html(&run.text);
            if font.is_empty() {
                html.push_str(&body);
            } else {
                let _ = write!(html, r#"<font style="{font}">{body}</font>"#);
            }
        }
        html.push_str("</div>");
    }
    html
}

fn font_style(resolver: &Resolver<'_>, shape: ShapeIdx, row: u32, connector: bool) -> String {
    let mut css = String::new();
    let cell = |name: &str| resolver.indexed(shape, "Character", row, name);

    if let Some(size) = cell("Size")
        .filter(|c| c.state() == CellState::Concrete)
        .and_then(|c| c.number())
    {
        let _ = write!(css, "font-size:{}px;", crate::style::num(size * POINTS_PER_INCH));
    }
    if let Some(font) = cell("Font").filter(|c| c.state() == CellState::Concrete) {
        let family = font.value().trim();
        // Numeric values index the document font table; only names are usable.
        if !family.is_empty() && family.parse::<f64>().is_err() && family != "Themed" {
            let _ = write!(css, "font-family:{family};");
        }
    }
    let color_key = CellKey::Indexed {
        section: "Character",
        index: row,
        name: "Color",
    };
    if let Some(rgb) = resolver.color(shape, color_key, connector) {
        let _ = write!(css, "color:{};", rgb.to_hex());
    }
    let bits = cell("Style")
        .filter(|c| c.state() == CellState::Concrete)
        .and_then(|c| c.integer())
        .unwrap_or(0);
    if bits & 1 != 0 {
        css.push_str("font-weight:bold;");
    }
    if bits & 2 != 0 {
        css.push_str("font-style:italic;");
    }
    if bits & 4 != 0 {
        css.push_str("text-decoration:underline;");
    }
    css
}

fn split_paragraphs(text: &Element) -> Vec<Paragraph> {
    let mut paragraphs = vec![Paragraph::default()];
    let mut character = 0;
    collect(text, &mut paragraphs, &mut character);
    paragraphs.retain(|p| !p.runs.is_empty());
    paragraphs
}

fn collect(element: &Element, paragraphs: &mut Vec<Paragraph>, character: &mut u32) {
    for node in &element.children {
        match node {
            Node::Text(t) => {
                let Some(paragraph) = paragraphs.last_mut() else {
                    continue;
                };
                match paragraph.runs.last_mut() {
                    Some(run) if run.character == *character => run.text.push_str(t),
                    _ => paragraph.runs.push(Run {
                        character: *character,
                        text: t.clone(),
                    }),
                }
            }
            Node::Element(e) if e.is("cp") => {
                *character = e.attr("IX").and_then(|v| v.parse().ok()).unwrap_or(0);
            }
            Node::Element(e) if e.is("pp") => {
                let index = e.attr("IX").and_then(|v| v.parse().ok()).unwrap_or(0);
                let current = paragraphs.last().map(|p| p.index);
                let empty = paragraphs.last().is_some_and(|p| p.runs.is_empty());
                if empty {
                    if let Some(p) = paragraphs.last_mut() {
                        p.index = index;
                    }
                } else if current != Some(index) {
                    paragraphs.push(Paragraph {
                        index,
                        runs: Vec::new(),
                    });
                }
            }
            Node::Element(e) if e.is("tp") => {}
            // Fields carry their display value as text.
            Node::Element(e) => collect(e, paragraphs, character),
        }
    }
}

/// HTML-escapes label text; line breaks become `<br>`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("<br>");
            }
            '\n' | '\u{2028}' | '\u{2029}' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    // A trailing break only terminates the paragraph.
    if out.ends_with("<br>") {
        out.truncate(out.len() - 4);
    }
    out
}
