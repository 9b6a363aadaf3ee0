// crates/drawio-vsdx/src/tables.rs
//
// Process-wide lookup tables.

/// Stylesheet category a property inherits through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StyleCategory {
    Fill,
    Line,
    Text,
}

pub fn style_category(key: &str) -> Option<StyleCategory> {
    match key {
        "FillForegnd" | "FillForegndTrans" | "FillBkgnd" | "FillBkgndTrans" | "FillPattern"
        | "FillGradientEnabled" | "FillGradientDir" | "ShdwForegnd" | "ShdwForegndTrans"
        | "ShdwBkgnd" | "ShdwPattern" | "ShapeShdwType" | "ShapeShdwOffsetX"
        | "ShapeShdwOffsetY" | "QuickStyleFillColor" | "QuickStyleFillMatrix"
        | "QuickStyleShadowColor" | "QuickStyleEffectsMatrix" => Some(StyleCategory::Fill),
        "LineColor" | "LineColorTrans" | "LinePattern" | "LineWeight" | "LineCap"
        | "Rounding" | "BeginArrow" | "BeginArrowSize" | "EndArrow" | "EndArrowSize"
        | "LineGradientEnabled" | "QuickStyleLineColor" | "QuickStyleLineMatrix" => {
            Some(StyleCategory::Line)
        }
        "Color" | "Font" | "Size" | "Style" | "Case" | "Pos" | "Strikethru" | "DoubleUnderline"
        | "HorzAlign" | "IndFirst" | "IndLeft" | "IndRight" | "SpLine" | "SpBefore"
        | "SpAfter" | "VerticalAlign" | "TextDirection" | "TextBkgnd" | "TextBkgndTrans"
        | "TopMargin" | "BottomMargin" | "LeftMargin" | "RightMargin" | "DefaultTabStop"
        | "QuickStyleFontColor" | "QuickStyleFontMatrix" => Some(StyleCategory::Text),
        _ => None,
    }
}

/// Keys whose `THEMEVAL()` placeholder is handed back to the caller, which resolves it
/// against the theme with the shape's quick-style indices.
pub fn is_theme_resolved_key(key: &str) -> bool {
    matches!(
        key,
        "FillForegnd"
            | "FillBkgnd"
            | "Color"
            | "LineColor"
            | "LinePattern"
            | "LineWeight"
            | "BeginArrow"
            | "EndArrow"
            | "BeginArrowSize"
            | "EndArrowSize"
    )
}

/// Dash lengths per `LinePattern` value, in multiples of the line width.
pub const DASH_PATTERNS: [&[f64]; 24] = [
    &[],
    &[],
    &[4.0, 3.0],
    &[1.0, 3.0],
    &[4.0, 3.0, 1.0, 3.0],
    &[4.0, 3.0, 1.0, 3.0, 1.0, 3.0],
    &[4.0, 3.0, 4.0, 3.0, 1.0, 3.0],
    &[13.0, 3.0, 4.0, 3.0],
    &[13.0, 3.0],
    &[13.0, 3.0, 4.0, 3.0, 4.0, 3.0],
    &[2.0, 1.0],
    &[1.0, 1.0],
    &[2.0, 1.0, 1.0, 1.0],
    &[2.0, 1.0, 1.0, 1.0, 1.0, 1.0],
    &[2.0, 1.0, 2.0, 1.0, 1.0, 1.0],
    &[7.0, 1.0, 2.0, 1.0],
    &[7.0, 1.0],
    &[7.0, 1.0, 2.0, 1.0, 2.0, 1.0],
    &[8.0, 3.0],
    &[1.0, 4.0],
    &[8.0, 3.0, 1.0, 3.0],
    &[8.0, 3.0, 1.0, 3.0, 1.0, 3.0],
    &[8.0, 3.0, 8.0, 3.0, 1.0, 3.0],
    &[24.0, 6.0],
];

pub fn dash_pattern(pattern: i64) -> Option<&'static [f64]> {
    usize::try_from(pattern)
        .ok()
        .and_then(|i| DASH_PATTERNS.get(i))
        .copied()
        .filter(|p| !p.is_empty())
}

/// Renders a dash list with two decimals per entry, space separated.
pub fn format_dash_pattern(pattern: &[f64]) -> String {
    pattern
        .iter()
        .map(|v| format!("{v:.2}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Marker name and fill flag for a `BeginArrow`/`EndArrow` value.
pub fn arrow_marker(arrow: i64) -> (&'static str, bool) {
    match arrow {
        0 => ("none", true),
        1 | 3 | 7 | 9 | 11 | 12 | 15 | 16 | 17 | 18 | 19 | 21 | 26 => ("open", true),
        2 => ("blockThin", true),
        4 | 6 | 8 => ("block", true),
        5 => ("classic", true),
        10 => ("oval", true),
        13 => ("block", false),
        14 => ("classic", false),
        20 => ("oval", false),
        22 => ("diamond", false),
        23 => ("dash", true),
        24 => ("ERone", true),
        25 => ("ERmandOne", true),
        27 => ("ERmany", true),
        28 => ("ERoneToMany", true),
        29 => ("ERzeroToMany", true),
        30 => ("ERzeroToOne", true),
        31..=45 => ("open", true),
        _ => ("classic", true),
    }
}

/// Marker size for an arrow size index (0 = very small .. 6 = colossal).
pub fn arrow_size(size: i64) -> f64 {
    const SIZES: [f64; 7] = [2.0, 3.0, 5.0, 7.0, 9.0, 22.0, 45.0];
    SIZES[size.clamp(0, 6) as usize]
}

/// Theme names and the `ThemeIndex` values shapes use to select them.
pub const THEME_IDS: [(&str, i64); 24] = [
    ("Office", 33),
    ("Linear", 34),
    ("Zephyr", 35),
    ("Integral", 36),
    ("Simple", 37),
    ("Whisp", 38),
    ("Facet", 39),
    ("Organic", 40),
    ("Lines", 41),
    ("Ion", 42),
    ("Retrospect", 43),
    ("Sequence", 44),
    ("Slice", 45),
    ("Banded", 46),
    ("Parallax", 47),
    ("Infused", 48),
    ("Bubble", 49),
    ("Facet Boards", 50),
    ("Clouds", 51),
    ("Circuit", 52),
    ("Cascade", 53),
    ("Lattice", 54),
    ("Spotlight", 55),
    ("Triangle", 56),
];

pub fn theme_id(name: &str) -> Option<i64> {
    let name = name.trim().trim_end_matches(" Theme").trim();
    THEME_IDS
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, id)| *id)
}

/// Legacy document palette used for color cells holding an index.
pub const LEGACY_COLORS: [&str; 24] = [
    "#000000", "#FFFFFF", "#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF",
    "#800000", "#008000", "#000080", "#808000", "#800080", "#008080", "#C0C0C0", "#E6E6E6",
    "#CDCDCD", "#B3B3B3", "#9A9A9A", "#808080", "#666666", "#4D4D4D", "#333333", "#1A1A1A",
];
