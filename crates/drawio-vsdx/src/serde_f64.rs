// crates/drawio-vsdx/src/serde_f64.rs
//
// Number formatting shared by the JSON model and the XML writer: integral values are
// written without a fraction, `-0` becomes `0`, and non-finite values are rejected.

use serde::{Deserialize, Deserializer, Serializer};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compact {
    Int(i64),
    Float(f64),
}

/// Normalizes `v` for output; `None` for NaN and infinities.
pub fn compact(v: f64) -> Option<Compact> {
    if !v.is_finite() {
        return None;
    }
    let v = if v == 0.0 { 0.0 } else { v };
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
        Some(Compact::Int(v as i64))
    } else {
        Some(Compact::Float(v))
    }
}

/// Attribute text for a coordinate; non-finite values collapse to `0`.
pub fn format_f64(v: f64) -> String {
    match compact(v) {
        Some(Compact::Int(i)) => i.to_string(),
        Some(Compact::Float(f)) => f.to_string(),
        None => "0".to_string(),
    }
}

pub fn ser_opt_f64_compact<S>(v: &Option<f64>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let Some(v) = *v else {
        return s.serialize_none();
    };
    match compact(v) {
        Some(Compact::Int(i)) => s.serialize_i64(i),
        Some(Compact::Float(f)) => s.serialize_f64(f),
        None => Err(serde::ser::Error::custom(format!(
            "non-finite coordinate: {v}"
        ))),
    }
}

pub fn de_opt_f64<'de, D>(d: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<f64>::deserialize(d)? {
        Some(x) if !x.is_finite() => Err(serde::de::Error::custom(format!(
            "non-finite coordinate: {x}"
        ))),
        Some(x) => Ok(Some(if x == 0.0 { 0.0 } else { x })),
        None => Ok(None),
    }
}
