// crates/drawio-vsdx/src/theme/mod.rs
//
// Theme parts: the DrawingML color and format schemes plus the Visio extension lists
// (connector styles, extended line styles, font styles, variation color and style schemes).
// Quick-style indices on a shape select entries from these tables.

pub mod color;

use crate::tables;
use crate::xml::Element;
pub use color::{ColorBase, Hsl, OoxmlColor, Rgb};
use std::collections::BTreeMap;

pub const VARIANT_COUNT: usize = 4;
pub const VARIANT_COLOR_COUNT: usize = 7;
pub const EXT_LINE_STYLE_COUNT: usize = 7;

/// Quick-style indices of one shape, plus the active theme variation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QuickStyle {
    pub fill_color: i64,
    pub fill_matrix: i64,
    pub line_color: i64,
    pub line_matrix: i64,
    pub font_color: i64,
    pub font_matrix: i64,
    pub effects_matrix: i64,
    pub shadow_color: i64,
    pub variation: i64,
    pub color_variant: usize,
    pub style_variant: usize,
    pub connector: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
    None,
    Solid(OoxmlColor),
    Gradient {
        stops: Vec<(f64, OoxmlColor)>,
        angle: Option<f64>,
    },
    Pattern {
        foreground: Option<OoxmlColor>,
        background: Option<OoxmlColor>,
    },
    Image,
}

impl FillStyle {
    fn from_element(e: &Element) -> Option<Self> {
        Some(match e.local_name() {
            "noFill" => FillStyle::None,
            "solidFill" => FillStyle::Solid(OoxmlColor::from_parent(e)?),
            "gradFill" => {
                let mut stops: Vec<(f64, OoxmlColor)> = e
                    .descendants_named("gs")
                    .into_iter()
                    .filter_map(|gs| {
                        Some((gs.attr_f64("pos").unwrap_or(0.0), OoxmlColor::from_parent(gs)?))
                    })
                    .collect();
                stops.sort_by(|a, b| a.0.total_cmp(&b.0));
                let angle = e
                    .child("lin")
                    .and_then(|lin| lin.attr_f64("ang"))
                    .map(|a| a / 60_000.0);
                FillStyle::Gradient { stops, angle }
            }
            "pattFill" => FillStyle::Pattern {
                foreground: e.child("fgClr").and_then(OoxmlColor::from_parent),
                background: e.child("bgClr").and_then(OoxmlColor::from_parent),
            },
            "blipFill" | "grpFill" => FillStyle::Image,
            _ => return None,
        })
    }

    fn primary(&self) -> Option<&OoxmlColor> {
        match self {
            FillStyle::Solid(c) => Some(c),
            FillStyle::Gradient { stops, .. } => stops.first().map(|(_, c)| c),
            FillStyle::Pattern { foreground, .. } => foreground.as_ref(),
            FillStyle::None | FillStyle::Image => None,
        }
    }

    fn gradient_end(&self) -> Option<&OoxmlColor> {
        match self {
            FillStyle::Gradient { stops, .. } if stops.len() > 1 => stops.last().map(|(_, c)| c),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineEnd {
    pub arrow: i64,
    pub size: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
    /// Width in EMU.
    pub width: Option<f64>,
    pub fill: FillStyle,
    pub dash: Option<Vec<f64>>,
    pub head: Option<LineEnd>,
    pub tail: Option<LineEnd>,
}

impl LineStyle {
    fn from_element(ln: &Element) -> Self {
        let fill = ln
            .elements()
            .find_map(FillStyle::from_element)
            .unwrap_or(FillStyle::None);
        let dash = if let Some(prst) = ln.child("prstDash") {
            preset_dash(prst.attr("val").unwrap_or("solid"))
        } else {
            ln.child("custDash").map(|cust| {
                cust.children_named("ds")
                    .flat_map(|ds| {
                        [
                            ds.attr_f64("d").unwrap_or(0.0) / 100_000.0,
                            ds.attr_f64("sp").unwrap_or(0.0) / 100_000.0,
                        ]
                    })
                    .collect()
            })
        };
        Self {
            width: ln.attr_f64("w"),
            fill,
            dash,
            head: ln.child("headEnd").and_then(line_end),
            tail: ln.child("tailEnd").and_then(line_end),
        }
    }
}

fn preset_dash(val: &str) -> Option<Vec<f64>> {
    let pattern: &[f64] = match val {
        "dash" => &[4.0, 3.0],
        "sysDash" => &[3.0, 1.0],
        "dot" | "sysDot" => &[1.0, 1.0],
        "dashDot" | "sysDashDot" => &[4.0, 3.0, 1.0, 3.0],
        "sysDashDotDot" => &[3.0, 1.0, 1.0, 1.0, 1.0, 1.0],
        "lgDash" => &[8.0, 3.0],
        "lgDashDot" => &[8.0, 3.0, 1.0, 3.0],
        "lgDashDotDot" => &[8.0, 3.0, 1.0, 3.0, 1.0, 3.0],
        _ => return None,
    };
    Some(pattern.to_vec())
}

fn line_end(e: &Element) -> Option<LineEnd> {
    let arrow = match e.attr("type")? {
        "none" => 0,
        "arrow" => 1,
        "triangle" => 4,
        "stealth" => 5,
        "oval" => 10,
        "diamond" => 22,
        _ => 4,
    };
    let size = match e.attr("w").or_else(|| e.attr("len")) {
        Some("sm") => 1,
        Some("lg") => 3,
        _ => 2,
    };
    Some(LineEnd { arrow, size })
}

/// Visio extended line descriptor (`vt:lineEx`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LineStyleExt {
    pub rounding: f64,
    pub begin_arrow: i64,
    pub begin_size: i64,
    pub end_arrow: i64,
    pub end_size: i64,
    pub pattern: i64,
}

impl LineStyleExt {
    fn from_element(e: &Element) -> Option<Self> {
        let ex = if e.is("lineEx") { e } else { e.child("lineEx")? };
        let int = |k: &str, default: i64| ex.attr_i64(k).unwrap_or(default);
        Some(Self {
            rounding: ex.attr_f64("rndg").unwrap_or(0.0),
            begin_arrow: int("start", 0),
            begin_size: int("startSize", 2),
            end_arrow: int("end", 0),
            end_size: int("endSize", 2),
            pattern: int("pattern", 1),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VarStyle {
    pub fill_idx: i64,
    pub line_idx: i64,
    pub effect_idx: i64,
    pub font_idx: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VariantStyle {
    pub embellishment: i64,
    pub styles: [VarStyle; 4],
}

#[derive(Debug, Clone, PartialEq, Default)]
struct StyleSet {
    fills: Vec<FillStyle>,
    lines: Vec<LineStyle>,
    lines_ext: Vec<Option<LineStyleExt>>,
    font_colors: Vec<Option<OoxmlColor>>,
    font_styles: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Theme {
    pub name: String,
    pub id: Option<i64>,
    base_colors: BTreeMap<String, Rgb>,
    background: Option<Rgb>,
    variant_colors: [[Option<Rgb>; VARIANT_COLOR_COUNT]; VARIANT_COUNT],
    monotone: [bool; VARIANT_COUNT],
    variant_styles: [VariantStyle; VARIANT_COUNT],
    shapes: StyleSet,
    connectors: StyleSet,
}

const BASE_COLOR_NAMES: [&str; 12] = [
    "dk1", "lt1", "dk2", "lt2", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
    "hlink", "folHlink",
];

/// Quick-style color index 0..7 to scheme color name.
const STYLE_COLOR_NAMES: [&str; 8] = [
    "dk1", "lt1", "accent1", "accent2", "accent3", "accent4", "accent5", "accent6",
];

impl Theme {
    pub fn from_element(root: &Element) -> Self {
        let mut theme = Theme {
            name: root.attr("name").unwrap_or_default().to_string(),
            ..Theme::default()
        };
        if let Some(scheme) = root.descendants_named("clrScheme").into_iter().next() {
            theme.parse_color_scheme(scheme);
            if theme.name.is_empty() {
                theme.name = scheme.attr("name").unwrap_or_default().to_string();
            }
        }
        if let Some(fmt) = root.descendants_named("fmtScheme").into_iter().next() {
            theme.shapes.fills = style_list(fmt, "fillStyleLst", FillStyle::from_element);
            theme.shapes.lines = line_list(fmt);
        }
        if let Some(conn) = root.descendants_named("fmtConnectorScheme").into_iter().next() {
            theme.connectors.fills = style_list(conn, "fillStyleLst", FillStyle::from_element);
            theme.connectors.lines = line_list(conn);
        }
        if let Some(group) = root.descendants_named("fmtSchemeLineStyles").into_iter().next() {
            theme.shapes.lines_ext = ext_lines(group);
        }
        if let Some(group) = root
            .descendants_named("fmtConnectorSchemeLineStyles")
            .into_iter()
            .next()
        {
            theme.connectors.lines_ext = ext_lines(group);
        }
        if let Some(group) = root.descendants_named("fontStyles").into_iter().next() {
            (theme.shapes.font_colors, theme.shapes.font_styles) = font_props(group);
        }
        if let Some(group) = root.descendants_named("connectorFontStyles").into_iter().next() {
            (theme.connectors.font_colors, theme.connectors.font_styles) = font_props(group);
        }
        for (i, scheme) in root
            .descendants_named("variationStyleScheme")
            .into_iter()
            .take(VARIANT_COUNT)
            .enumerate()
        {
            let mut variant = VariantStyle {
                embellishment: scheme.attr_i64("embellishment").unwrap_or(0),
                ..VariantStyle::default()
            };
            for (j, var) in scheme.children_named("varStyle").take(4).enumerate() {
                variant.styles[j] = VarStyle {
                    fill_idx: var.attr_i64("fillIdx").unwrap_or(0),
                    line_idx: var.attr_i64("lineIdx").unwrap_or(0),
                    effect_idx: var.attr_i64("effectIdx").unwrap_or(0),
                    font_idx: var.attr_i64("fontIdx").unwrap_or(0),
                };
            }
            theme.variant_styles[i] = variant;
        }
        theme.id = tables::theme_id(&theme.name).or_else(|| {
            root.descendants_named("clrScheme")
                .first()
                .and_then(|s| s.attr("name"))
                .and_then(tables::theme_id)
        });
        theme
    }

    fn parse_color_scheme(&mut self, scheme: &Element) {
        for name in BASE_COLOR_NAMES {
            let Some(slot) = scheme.child(name) else {
                continue;
            };
            let Some(color) = OoxmlColor::from_parent(slot) else {
                continue;
            };
            // Scheme colors may refer to each other; resolve against what is known so far.
            let known = self.base_colors.clone();
            let rgb = color.resolve(&|n| known.get(scheme_alias(n)).copied());
            self.base_colors.insert(name.to_string(), rgb);
        }
        if let Some(bkgnd) = scheme.descendants_named("bkgnd").into_iter().next() {
            self.background = OoxmlColor::from_parent(bkgnd).map(|c| self.resolve_plain(&c));
        }
        for (i, variant) in scheme
            .descendants_named("variationClrScheme")
            .into_iter()
            .take(VARIANT_COUNT)
            .enumerate()
        {
            self.monotone[i] = variant.attr("monotone") == Some("1");
            for j in 0..VARIANT_COLOR_COUNT {
                let slot_name = format!("varColor{}", j + 1);
                self.variant_colors[i][j] = variant
                    .child(&slot_name)
                    .and_then(OoxmlColor::from_parent)
                    .map(|c| self.resolve_plain(&c));
            }
        }
    }

    fn resolve_plain(&self, color: &OoxmlColor) -> Rgb {
        color.resolve(&|n| self.scheme_color(n))
    }

    pub fn scheme_color(&self, name: &str) -> Option<Rgb> {
        self.base_colors.get(scheme_alias(name)).copied()
    }

    pub fn is_monotone(&self, variant: usize) -> bool {
        self.monotone.get(variant).copied().unwrap_or(false)
    }

    /// Color for a quick-style color index: 0..7 base colors, 8 the dynamic background,
    /// 100..106 (or 200..206) the active variant's colors.
    pub fn style_color(&self, index: i64, variant: usize) -> Option<Rgb> {
        match index {
            0..=7 => self.base_colors.get(STYLE_COLOR_NAMES[index as usize]).copied(),
            8 => self.background.or_else(|| self.scheme_color("lt1")),
            100..=106 | 200..=206 => {
                let slot = (index % 100) as usize;
                self.variant_colors
                    .get(variant)
                    .and_then(|set| set[slot])
                    .or_else(|| {
                        // Variant 0 mirrors the base scheme when no variation list exists.
                        STYLE_COLOR_NAMES
                            .get(slot + 1)
                            .and_then(|n| self.base_colors.get(*n).copied())
                    })
            }
            _ => None,
        }
    }

    fn set(&self, connector: bool) -> &StyleSet {
        if connector && !self.connectors.lines.is_empty() {
            &self.connectors
        } else {
            &self.shapes
        }
    }

    /// Standard style index selected by a matrix value, and the effective color index.
    fn resolve_matrix(
        &self,
        matrix: i64,
        color: i64,
        qs: &QuickStyle,
        pick: fn(&VarStyle) -> i64,
    ) -> (Option<usize>, i64) {
        match matrix {
            1..=6 => (Some((matrix - 1) as usize), color),
            100..=103 => {
                let color = if self.is_monotone(qs.color_variant) {
                    100
                } else {
                    color
                };
                let variant = self
                    .variant_styles
                    .get(qs.style_variant)
                    .copied()
                    .unwrap_or_default();
                let idx = pick(&variant.styles[(matrix - 100) as usize]);
                (usize::try_from(idx).ok(), color)
            }
            _ => (None, color),
        }
    }

    fn color_with(&self, color: &OoxmlColor, style_color: i64, variant: usize) -> Rgb {
        color.resolve(&|name| {
            if name == "phClr" {
                self.style_color(style_color, variant)
            } else {
                self.scheme_color(name)
            }
        })
    }

    pub fn fill_color(&self, qs: &QuickStyle) -> Option<Rgb> {
        let (idx, color) = self.resolve_matrix(qs.fill_matrix, qs.fill_color, qs, |v| v.fill_idx);
        let style = idx.and_then(|i| self.set(qs.connector).fills.get(i));
        match style {
            Some(FillStyle::None) => None,
            Some(fill) => match fill.primary() {
                Some(c) => Some(self.color_with(c, color, qs.color_variant)),
                None => self.style_color(color, qs.color_variant),
            },
            None => self.style_color(color, qs.color_variant),
        }
    }

    /// Second gradient color; only gradient fill styles have one.
    pub fn gradient_color(&self, qs: &QuickStyle) -> Option<Rgb> {
        let (idx, color) = self.resolve_matrix(qs.fill_matrix, qs.fill_color, qs, |v| v.fill_idx);
        let fill = self.set(qs.connector).fills.get(idx?)?;
        fill.gradient_end()
            .map(|c| self.color_with(c, color, qs.color_variant))
    }

    fn line_style(&self, qs: &QuickStyle) -> (Option<&LineStyle>, Option<usize>, i64) {
        let (idx, color) = self.resolve_matrix(qs.line_matrix, qs.line_color, qs, |v| v.line_idx);
        (
            idx.and_then(|i| self.set(qs.connector).lines.get(i)),
            idx,
            color,
        )
    }

    pub fn line_color(&self, qs: &QuickStyle) -> Option<Rgb> {
        if qs.variation & 4 != 0 {
            return self.fill_color(qs);
        }
        let (style, _, color) = self.line_style(qs);
        match style.map(|s| &s.fill) {
            Some(FillStyle::None) => None,
            Some(fill) => match fill.primary() {
                Some(c) => Some(self.color_with(c, color, qs.color_variant)),
                None => self.style_color(color, qs.color_variant),
            },
            None => self.style_color(color, qs.color_variant),
        }
    }

    pub fn font_color(&self, qs: &QuickStyle) -> Option<Rgb> {
        let (idx, color) = self.resolve_matrix(qs.font_matrix, qs.font_color, qs, |v| v.font_idx);
        let slot = idx.and_then(|i| self.set(qs.connector).font_colors.get(i));
        let mut text = match slot {
            Some(Some(c)) => Some(self.color_with(c, color, qs.color_variant)),
            _ => self.style_color(color, qs.color_variant),
        };
        if qs.variation & 2 != 0 {
            let fill = self.fill_color(qs);
            let line = self.line_color(qs);
            text = match (fill, line) {
                (Some(f), Some(l)) => Some(if f.luminance() < l.luminance() { f } else { l }),
                (f, l) => f.or(l).or(text),
            };
        }
        text
    }

    pub fn font_style(&self, qs: &QuickStyle) -> i64 {
        let (idx, _) = self.resolve_matrix(qs.font_matrix, qs.font_color, qs, |v| v.font_idx);
        idx.and_then(|i| self.set(qs.connector).font_styles.get(i).copied())
            .unwrap_or(0)
    }

    fn line_ext(&self, qs: &QuickStyle) -> Option<LineStyleExt> {
        let (_, idx, _) = self.line_style(qs);
        let slot = idx.map(|i| i + 1).unwrap_or(0);
        self.set(qs.connector)
            .lines_ext
            .get(slot)
            .copied()
            .flatten()
    }

    /// `LinePattern` value of the themed line: the extended descriptor's pattern, else 2 for
    /// a dashed standard line and 1 for a solid one.
    pub fn line_pattern(&self, qs: &QuickStyle) -> i64 {
        if let Some(ext) = self.line_ext(qs) {
            return ext.pattern;
        }
        if self.is_line_dashed(qs) { 2 } else { 1 }
    }

    pub fn is_line_dashed(&self, qs: &QuickStyle) -> bool {
        if let Some(ext) = self.line_ext(qs) {
            return ext.pattern > 1;
        }
        let (style, _, _) = self.line_style(qs);
        style.and_then(|s| s.dash.as_ref()).is_some()
    }

    pub fn line_dash_pattern(&self, qs: &QuickStyle) -> Option<Vec<f64>> {
        if let Some(ext) = self.line_ext(qs) {
            return tables::dash_pattern(ext.pattern).map(<[f64]>::to_vec);
        }
        let (style, _, _) = self.line_style(qs);
        style.and_then(|s| s.dash.clone())
    }

    pub fn start_arrow(&self, qs: &QuickStyle) -> i64 {
        self.arrow(qs, |e| e.begin_arrow, |s| s.head.map(|h| h.arrow), 0)
    }

    pub fn end_arrow(&self, qs: &QuickStyle) -> i64 {
        self.arrow(qs, |e| e.end_arrow, |s| s.tail.map(|t| t.arrow), 0)
    }

    pub fn start_arrow_size(&self, qs: &QuickStyle) -> i64 {
        self.arrow(qs, |e| e.begin_size, |s| s.head.map(|h| h.size), 4)
    }

    pub fn end_arrow_size(&self, qs: &QuickStyle) -> i64 {
        self.arrow(qs, |e| e.end_size, |s| s.tail.map(|t| t.size), 4)
    }

    fn arrow(
        &self,
        qs: &QuickStyle,
        from_ext: fn(&LineStyleExt) -> i64,
        from_line: fn(&LineStyle) -> Option<i64>,
        default: i64,
    ) -> i64 {
        if let Some(ext) = self.line_ext(qs) {
            return from_ext(&ext);
        }
        let (style, _, _) = self.line_style(qs);
        style.and_then(from_line).unwrap_or(default)
    }

    /// Line width in inches.
    pub fn line_width(&self, qs: &QuickStyle) -> f64 {
        let (style, _, _) = self.line_style(qs);
        style
            .and_then(|s| s.width)
            .map(|emu| emu / 914_400.0)
            .unwrap_or(0.0)
    }

    pub fn line_rounding(&self, qs: &QuickStyle) -> f64 {
        self.line_ext(qs).map(|e| e.rounding).unwrap_or(0.0)
    }
}

fn scheme_alias(name: &str) -> &str {
    match name {
        "tx1" => "dk1",
        "bg1" => "lt1",
        "tx2" => "dk2",
        "bg2" => "lt2",
        other => other,
    }
}

fn style_list<T>(scheme: &Element, list: &str, parse: fn(&Element) -> Option<T>) -> Vec<T> {
    scheme
        .child(list)
        .map(|l| l.elements().filter_map(parse).collect())
        .unwrap_or_default()
}

fn line_list(scheme: &Element) -> Vec<LineStyle> {
    scheme
        .child("lnStyleLst")
        .map(|l| l.children_named("ln").map(LineStyle::from_element).collect())
        .unwrap_or_default()
}

fn ext_lines(group: &Element) -> Vec<Option<LineStyleExt>> {
    group
        .children_named("lineStyle")
        .take(EXT_LINE_STYLE_COUNT)
        .map(LineStyleExt::from_element)
        .collect()
}

fn font_props(group: &Element) -> (Vec<Option<OoxmlColor>>, Vec<i64>) {
    group
        .children_named("fontProps")
        .take(6)
        .map(|props| {
            let color = props.child("color").and_then(OoxmlColor::from_parent);
            (color, props.attr_i64("style").unwrap_or(0))
        })
        .unzip()
}
