// crates/drawio-vsdx/src/theme/color.rs
//
// DrawingML colors: literal sRGB, system colors, scheme references (including the `phClr`
// placeholder that quick styles substitute) and the luminance/shade/tint modifiers.

use crate::xml::Element;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsl {
    /// Hue in [0, 1).
    pub h: f64,
    pub s: f64,
    pub l: f64,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Accepts `RRGGBB` or `#RRGGBB`.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        Some(Self {
            r: u8::from_str_radix(&hex[0..2], 16).ok()?,
            g: u8::from_str_radix(&hex[2..4], 16).ok()?,
            b: u8::from_str_radix(&hex[4..6], 16).ok()?,
        })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub fn to_hsl(self) -> Hsl {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let l = (max + min) / 2.0;
        if (max - min).abs() < f64::EPSILON {
            return Hsl { h: 0.0, s: 0.0, l };
        }
        let d = max - min;
        let s = if l > 0.5 {
            d / (2.0 - max - min)
        } else {
            d / (max + min)
        };
        let h = if max == r {
            (g - b) / d + if g < b { 6.0 } else { 0.0 }
        } else if max == g {
            (b - r) / d + 2.0
        } else {
            (r - g) / d + 4.0
        };
        Hsl { h: h / 6.0, s, l }
    }

    pub fn luminance(self) -> f64 {
        self.to_hsl().l
    }
}

impl Hsl {
    pub fn to_rgb(self) -> Rgb {
        let Hsl { h, s, l } = self;
        if s <= 0.0 {
            let v = channel(l);
            return Rgb::new(v, v, v);
        }
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        Rgb::new(
            channel(hue_to_rgb(p, q, h + 1.0 / 3.0)),
            channel(hue_to_rgb(p, q, h)),
            channel(hue_to_rgb(p, q, h - 1.0 / 3.0)),
        )
    }
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn channel(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColorBase {
    Rgb(Rgb),
    /// `a:schemeClr`; `phClr` is resolved from the quick-style color index.
    Scheme(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorTransform {
    LumMod(f64),
    LumOff(f64),
    SatMod(f64),
    SatOff(f64),
    HueOff(f64),
    Shade(f64),
    Tint(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct OoxmlColor {
    pub base: ColorBase,
    pub transforms: Vec<ColorTransform>,
}

impl OoxmlColor {
    pub fn rgb(rgb: Rgb) -> Self {
        Self {
            base: ColorBase::Rgb(rgb),
            transforms: Vec::new(),
        }
    }

    /// Reads the first color element (`srgbClr`, `sysClr`, `schemeClr`, `prstClr`,
    /// `scrgbClr`) found directly under `parent`.
    pub fn from_parent(parent: &Element) -> Option<Self> {
        parent.elements().find_map(Self::from_element)
    }

    pub fn from_element(e: &Element) -> Option<Self> {
        let base = match e.local_name() {
            "srgbClr" => ColorBase::Rgb(Rgb::from_hex(e.attr("val")?)?),
            "sysClr" => ColorBase::Rgb(
                e.attr("lastClr")
                    .and_then(Rgb::from_hex)
                    .unwrap_or_else(|| system_color(e.attr("val").unwrap_or_default())),
            ),
            "schemeClr" => ColorBase::Scheme(e.attr("val")?.to_string()),
            "prstClr" => ColorBase::Rgb(preset_color(e.attr("val").unwrap_or_default())),
            "scrgbClr" => {
                let pct = |k: &str| e.attr_f64(k).unwrap_or(0.0) / 100_000.0;
                ColorBase::Rgb(Rgb::new(
                    channel(pct("r")),
                    channel(pct("g")),
                    channel(pct("b")),
                ))
            }
            _ => return None,
        };
        let transforms = e
            .elements()
            .filter_map(|t| {
                let v = t.attr_f64("val")? / 100_000.0;
                Some(match t.local_name() {
                    "lumMod" => ColorTransform::LumMod(v),
                    "lumOff" => ColorTransform::LumOff(v),
                    "satMod" => ColorTransform::SatMod(v),
                    "satOff" => ColorTransform::SatOff(v),
                    // Hue offsets are in 60000ths of a degree.
                    "hueOff" => ColorTransform::HueOff(v * 100_000.0 / 60_000.0 / 360.0),
                    "shade" => ColorTransform::Shade(v),
                    "tint" => ColorTransform::Tint(v),
                    _ => return None,
                })
            })
            .collect();
        Some(Self { base, transforms })
    }

    /// Resolves the color. `scheme` maps scheme names (and `phClr`) to base colors.
    pub fn resolve(&self, scheme: &dyn Fn(&str) -> Option<Rgb>) -> Rgb {
        let base = match &self.base {
            ColorBase::Rgb(rgb) => *rgb,
            ColorBase::Scheme(name) => scheme(name).unwrap_or(Rgb::BLACK),
        };
        apply_transforms(base, &self.transforms)
    }
}

fn apply_transforms(base: Rgb, transforms: &[ColorTransform]) -> Rgb {
    if transforms.is_empty() {
        return base;
    }
    let mut rgb = base;
    for t in transforms {
        rgb = match *t {
            ColorTransform::Shade(v) => Rgb::new(
                channel(f64::from(rgb.r) / 255.0 * v),
                channel(f64::from(rgb.g) / 255.0 * v),
                channel(f64::from(rgb.b) / 255.0 * v),
            ),
            ColorTransform::Tint(v) => {
                let tint = |c: u8| {
                    let c = f64::from(c) / 255.0;
                    channel(c + (1.0 - c) * (1.0 - v))
                };
                Rgb::new(tint(rgb.r), tint(rgb.g), tint(rgb.b))
            }
            other => {
                let mut hsl = rgb.to_hsl();
                match other {
                    ColorTransform::LumMod(v) => hsl.l *= v,
                    ColorTransform::LumOff(v) => hsl.l += v,
                    ColorTransform::SatMod(v) => hsl.s *= v,
                    ColorTransform::SatOff(v) => hsl.s += v,
                    ColorTransform::HueOff(v) => hsl.h = (hsl.h + v).rem_euclid(1.0),
                    ColorTransform::Shade(_) | ColorTransform::Tint(_) => {}
                }
                hsl.l = hsl.l.clamp(0.0, 1.0);
                hsl.s = hsl.s.clamp(0.0, 1.0);
                hsl.to_rgb()
            }
        };
    }
    rgb
}

fn system_color(name: &str) -> Rgb {
    match name {
        "window" | "btnHighlight" | "highlightText" => Rgb::WHITE,
        "btnFace" | "menu" => Rgb::new(0xF0, 0xF0, 0xF0),
        "grayText" => Rgb::new(0x6D, 0x6D, 0x6D),
        "highlight" => Rgb::new(0x33, 0x99, 0xFF),
        _ => Rgb::BLACK,
    }
}

fn preset_color(name: &str) -> Rgb {
    match name {
        "white" => Rgb::WHITE,
        "red" => Rgb::new(0xFF, 0, 0),
        "green" => Rgb::new(0, 0x80, 0),
        "blue" => Rgb::new(0, 0, 0xFF),
        "yellow" => Rgb::new(0xFF, 0xFF, 0),
        "gray" => Rgb::new(0x80, 0x80, 0x80),
        "orange" => Rgb::new(0xFF, 0xA5, 0),
        _ => Rgb::BLACK,
    }
}
