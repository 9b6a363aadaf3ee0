// crates/drawio-vsdx/src/style.rs
//
// Flattening of resolved shape properties into a draw.io style string. Derivations run in a
// fixed order and each has its own omission rule; omitted keys fall back to the renderer's
// defaults, so an omission is as meaningful as an explicit value.

use crate::cascade::Resolver;
use crate::cells::{CONVERSION_FACTOR, CellKey, CellState};
use crate::document::ShapeIdx;
use crate::geometry::{Direction, Form, GeoSection, is_fillable};
use crate::placement::round2;
use crate::tables;
use crate::theme::Rgb;
use std::fmt;

const FILL_PATTERN_GRADIENTS: std::ops::RangeInclusive<i64> = 25..=40;

/// Ordered `key=value` pairs plus bare style names (`text`, `ellipse`) in front.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleMap {
    names: Vec<String>,
    entries: Vec<(String, String)>,
}

impl StyleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.names.push(name.to_string());
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn remove(&mut self, key: &str) {
        self.entries.retain(|(k, _)| k != key);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.entries.is_empty()
    }
}

impl fmt::Display for StyleMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for name in &self.names {
            if !first {
                f.write_str(";")?;
            }
            f.write_str(name)?;
            first = false;
        }
        for (k, v) in &self.entries {
            if !first {
                f.write_str(";")?;
            }
            write!(f, "{k}={v}")?;
            first = false;
        }
        Ok(())
    }
}

/// Values the vertex derivations need beyond the shape's own cells.
#[derive(Debug, Clone, Default)]
pub struct VertexInput<'a> {
    pub rotation: f64,
    pub sections: &'a [GeoSection],
    pub form: Option<&'a Form>,
    /// `data:` URI of an embedded image.
    pub image: Option<String>,
}

/// Derivations over one shape's resolved properties.
pub struct Styler<'r, 'd> {
    pub resolver: &'r Resolver<'d>,
    pub shape: ShapeIdx,
    pub connector: bool,
}

impl Styler<'_, '_> {
    pub fn vertex_style(&self, input: &VertexInput<'_>) -> StyleMap {
        let mut style = StyleMap::new();
        if input.rotation != 0.0 {
            style.set("rotation", num(input.rotation));
        }
        let region = input.sections.is_empty() || is_fillable(input.sections);
        style.set(
            "fillColor",
            if region {
                self.fill_color()
            } else {
                "none".to_string()
            },
        );
        self.gradient(&mut style);
        self.opacity(&mut style);
        if let Some(image) = &input.image {
            style.set("shape", "image");
            style.set("image", image.clone());
            style.set("verticalLabelPosition", "bottom");
        } else if let Some(form) = input.form {
            match form {
                Form::Default => {}
                Form::Ellipse => style.set("shape", "ellipse"),
                Form::Triangle(_) => style.set("shape", "triangle"),
                Form::Stencil(payload) => style.set("shape", format!("stencil({payload})")),
            }
        }
        self.dash(&mut style);
        let stroked = input.sections.is_empty() || input.sections.iter().any(|s| !s.no_line);
        self.stroke(&mut style, stroked);
        self.shadow(&mut style);
        self.margins(&mut style);
        if let Some(Form::Triangle(direction)) = input.form
            && *direction != Direction::East
        {
            style.set("direction", direction.as_str());
        }
        self.flips(&mut style);
        self.label_background(&mut style);
        self.rounding(&mut style);
        self.text_alignment(&mut style);
        style
    }

    pub fn edge_style(&self, curved: bool) -> StyleMap {
        let mut style = StyleMap::new();
        self.opacity(&mut style);
        self.dash(&mut style);
        self.stroke(&mut style, true);
        self.shadow(&mut style);
        self.arrows(&mut style);
        if curved {
            style.set("curved", "1");
        } else {
            style.set("edgeStyle", "none");
        }
        self.label_background(&mut style);
        self.rounding(&mut style);
        self.text_alignment(&mut style);
        style
    }

    /// Style of a synthesized label vertex: text only, no fill or stroke.
    pub fn label_style(&self, rotation: f64) -> StyleMap {
        let mut style = StyleMap::new().with_name("text");
        if rotation != 0.0 {
            style.set("rotation", num(rotation));
        }
        style.set("fillColor", "none");
        style.set("gradientColor", "none");
        style.set("strokeColor", "none");
        self.margins(&mut style);
        self.flips(&mut style);
        self.label_background(&mut style);
        self.text_alignment(&mut style);
        style
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.resolver.value(self.shape, name)
    }

    fn number(&self, name: &str) -> Option<f64> {
        self.resolver.number(self.shape, name)
    }

    fn color(&self, name: &str) -> Option<Rgb> {
        self.resolver
            .color(self.shape, CellKey::Flat(name), self.connector)
    }

    fn is_theme_value(&self, name: &str) -> bool {
        self.resolver
            .cell(self.shape, name)
            .is_some_and(|c| c.state() == CellState::ThemeValue)
    }

    fn fill_color(&self) -> String {
        if self.value("FillPattern").map(str::trim) == Some("0") {
            return "none".to_string();
        }
        match self.color("FillForegnd") {
            Some(rgb) => rgb.to_hex(),
            None if self.is_theme_value("FillForegnd") => "none".to_string(),
            None => Rgb::WHITE.to_hex(),
        }
    }

    fn gradient(&self, style: &mut StyleMap) {
        let pattern = self
            .resolver
            .themed_integer(self.shape, "FillPattern", self.connector)
            .unwrap_or(1);
        if style.get("fillColor") != Some("none") && FILL_PATTERN_GRADIENTS.contains(&pattern) {
            if let Some(rgb) = self.color("FillBkgnd") {
                style.set("gradientColor", rgb.to_hex());
                match gradient_direction(pattern) {
                    Some(direction) if direction != "south" => {
                        style.set("gradientDirection", direction)
                    }
                    _ => {}
                }
                return;
            }
        }
        style.set("gradientColor", "none");
    }

    fn opacity(&self, style: &mut StyleMap) {
        for (cell, key) in [
            ("FillForegndTrans", "fillOpacity"),
            ("LineColorTrans", "strokeOpacity"),
        ] {
            let Some(trans) = self.number(cell) else {
                continue;
            };
            let opacity = ((1.0 - trans) * 100.0).round();
            if opacity < 100.0 {
                style.set(key, num(opacity.max(0.0)));
            }
        }
    }

    fn dash(&self, style: &mut StyleMap) {
        if self.is_theme_value("LinePattern") {
            let qs = self.resolver.quick_style(self.shape, self.connector);
            if let Some(theme) = self.resolver.theme(self.shape)
                && theme.is_line_dashed(&qs)
            {
                style.set("dashed", "1");
                if let Some(pattern) = theme.line_dash_pattern(&qs) {
                    style.set("dashPattern", tables::format_dash_pattern(&pattern));
                }
            }
            return;
        }
        let Some(pattern) = self.value("LinePattern").map(str::trim) else {
            return;
        };
        if pattern == "0" || pattern == "1" {
            return;
        }
        let Some(index) = pattern.parse::<f64>().ok().map(|v| v.round() as i64) else {
            return;
        };
        style.set("dashed", "1");
        if let Some(dashes) = tables::dash_pattern(index) {
            style.set("dashPattern", tables::format_dash_pattern(dashes));
        }
    }

    fn stroke(&self, style: &mut StyleMap, stroked: bool) {
        let no_line = !stroked
            || self
                .resolver
                .themed_integer(self.shape, "LinePattern", self.connector)
                == Some(0);
        if no_line {
            style.set("strokeColor", "none");
        } else if self.number("LineColorTrans") != Some(1.0) {
            let color = self.color("LineColor").unwrap_or(Rgb::BLACK);
            style.set("strokeColor", color.to_hex());
        }
        if let Some(weight) = self.resolver.line_weight(self.shape, self.connector) {
            let mut width = weight * CONVERSION_FACTOR;
            if width < 1.0 {
                width *= 2.0;
            }
            let width = width.round();
            if width != 1.0 {
                style.set("strokeWidth", num(width));
            }
        }
    }

    fn shadow(&self, style: &mut StyleMap) {
        if let Some(pattern) = self.value("ShdwPattern")
            && pattern.trim() != "0"
        {
            style.set("shadow", "1");
        }
    }

    fn margins(&self, style: &mut StyleMap) {
        for (cell, key) in [
            ("TopMargin", "spacingTop"),
            ("BottomMargin", "spacingBottom"),
            ("LeftMargin", "spacingLeft"),
            ("RightMargin", "spacingRight"),
        ] {
            let Some(margin) = self.number(cell) else {
                continue;
            };
            let spacing = (margin * CONVERSION_FACTOR / 2.0 - 2.8).trunc().max(0.0);
            if spacing != 0.0 {
                style.set(key, num(spacing));
            }
        }
    }

    fn flips(&self, style: &mut StyleMap) {
        if self.value("FlipX").map(str::trim) == Some("1") {
            style.set("flipH", "1");
        }
        if self.value("FlipY").map(str::trim) == Some("1") {
            style.set("flipV", "1");
        }
    }

    fn label_background(&self, style: &mut StyleMap) {
        let Some(value) = self.value("TextBkgnd").map(str::trim) else {
            return;
        };
        if self.number("TextBkgndTrans") == Some(1.0) {
            return;
        }
        let color = if value.starts_with('#') {
            Rgb::from_hex(value)
        } else {
            // Index 0 means transparent; other values are palette index + 1.
            match value.parse::<f64>().ok().map(|v| v.round() as i64) {
                Some(n) if n > 0 => self.resolver.doc.color(&(n - 1).to_string()),
                _ => None,
            }
        };
        if let Some(rgb) = color {
            style.set("labelBackgroundColor", rgb.to_hex());
        }
    }

    fn rounding(&self, style: &mut StyleMap) {
        if self.number("Rounding").is_some_and(|r| r > 0.0) {
            style.set("rounded", "1");
        }
    }

    fn arrows(&self, style: &mut StyleMap) {
        for (arrow_cell, size_cell, prefix) in [
            ("BeginArrow", "BeginArrowSize", "start"),
            ("EndArrow", "EndArrowSize", "end"),
        ] {
            let arrow = self
                .resolver
                .themed_integer(self.shape, arrow_cell, self.connector)
                .unwrap_or(0);
            let (marker, filled) = tables::arrow_marker(arrow);
            style.set(&format!("{prefix}Arrow"), marker);
            if marker == "none" {
                continue;
            }
            if !filled {
                style.set(&format!("{prefix}Fill"), "0");
            }
            let size = self
                .resolver
                .themed_integer(self.shape, size_cell, self.connector)
                .unwrap_or(2);
            style.set(&format!("{prefix}Size"), num(tables::arrow_size(size)));
        }
    }

    fn text_alignment(&self, style: &mut StyleMap) {
        let vertical = match self.number("VerticalAlign").map(|v| v.round() as i64) {
            Some(0) => "top",
            Some(2) => "bottom",
            _ => "middle",
        };
        style.set("verticalAlign", vertical);
        let horizontal = self
            .resolver
            .indexed(self.shape, "Paragraph", 0, "HorzAlign")
            .filter(|c| c.state() == CellState::Concrete)
            .and_then(|c| c.integer());
        style.set("align", horizontal_align(horizontal));
        style.set("html", "1");
        style.set("whiteSpace", "wrap");
    }
}

pub fn horizontal_align(value: Option<i64>) -> &'static str {
    match value {
        Some(0) => "left",
        Some(2) => "right",
        Some(3) => "justify",
        _ => "center",
    }
}

fn gradient_direction(pattern: i64) -> Option<&'static str> {
    match pattern {
        25 => Some("east"),
        27 => Some("west"),
        28 => Some("south"),
        30 => Some("north"),
        _ => None,
    }
}

/// Compact number: integers without a fraction, otherwise two decimals at most.
pub fn num(v: f64) -> String {
    let r = round2(v);
    if r.fract() == 0.0 && r.abs() < 1e15 {
        format!("{}", r as i64)
    } else {
        format!("{r}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn style_map_keeps_insertion_order_and_replaces() {
        let mut style = StyleMap::new().with_name("text");
        style.set("fillColor", "none");
        style.set("html", "1");
        style.set("fillColor", "#FF0000");
        assert_eq!(style.to_string(), "text;fillColor=#FF0000;html=1");
        style.remove("html");
        assert_eq!(style.get("html"), None);
    }

    #[test]
    fn compact_numbers() {
        assert_eq!(num(2.0), "2");
        assert_eq!(num(12.345), "12.35");
        assert_eq!(num(-0.0), "0");
    }
}
