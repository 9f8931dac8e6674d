//! Charset↔codepage table, BOM detection/emission, percent-encoding, and
//! XML/JSON entity encoding (C2).

pub mod bom;
pub mod charset;
pub mod entity;
pub mod percent;

pub use bom::BomKind;
pub use charset::OutputEncoding;

#[derive(Debug, Clone, thiserror::Error)]
pub enum CharsetError {
    #[error("incompatible encoding: {0:?} is not accepted, only UTF-8")]
    IncompatibleEncoding(BomKind),
}

/// Transcodes `bytes` assumed to be in `label`'s encoding to a Rust `String`
/// (always UTF-8 internally, per spec.md's "only UTF-8 is accepted by
/// parsers" rule for anything other than a plain byte pass-through).
pub fn transcode_to_utf8(bytes: &[u8], label: &str) -> String {
    let lower = label.to_ascii_lowercase();
    let encoding = match lower.as_str() {
        "utf-16" | "utf-16le" => encoding_rs::UTF_16LE,
        "utf-16be" => encoding_rs::UTF_16BE,
        "iso-8859-1" | "latin1" | "latin-1" => encoding_rs::WINDOWS_1252,
        _ => encoding_rs::UTF_8,
    };
    let (decoded, _, _) = encoding.decode(bytes);
    decoded.into_owned()
}
