// crates/drawio-vsdx/src/codec.rs
//
// The draw.io text payload codec used for compressed `<diagram>` bodies and inline
// stencils: percent-encode, raw deflate, base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::{DeflateDecoder, DeflateEncoder};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::io::Read;

/// Characters `encodeURIComponent` leaves alone.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("deflate error: {0}")]
    Deflate(#[from] std::io::Error),

    #[error("utf8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub fn encode_payload(text: &str) -> String {
    let escaped = utf8_percent_encode(text, URI_COMPONENT).to_string();
    let mut encoder = DeflateEncoder::new(escaped.as_bytes(), Compression::default());
    let mut compressed = Vec::new();
    // Reading from an in-memory slice cannot fail.
    if encoder.read_to_end(&mut compressed).is_err() {
        compressed.clear();
    }
    STANDARD.encode(compressed)
}

pub fn decode_payload(payload: &str) -> Result<String, CodecError> {
    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    let mut decoder = DeflateDecoder::new(&bytes[..]);
    let mut inflated = Vec::new();
    decoder.read_to_end(&mut inflated)?;
    let text = std::str::from_utf8(&inflated)?;
    Ok(percent_decode_str(text).decode_utf8()?.into_owned())
}
