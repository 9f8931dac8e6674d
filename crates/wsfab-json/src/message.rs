//! `JSONMessage` (spec.md §3.5): a JSON root value plus the same HTTP
//! envelope fields `XmlMessage`'s SOAP sibling carries, so the two message
//! kinds can convert into each other at the transport edge.

use wsfab_charset::OutputEncoding;
use wsfab_cookie::Cookies;
use wsfab_url::CrackedUrl;

use crate::error::JsonError;
use crate::parser::parse_bytes;
use crate::printer::print_string;
use crate::value::Json;

#[derive(Debug, Clone, Default)]
pub struct JsonMessage {
    pub root: Json,
    pub url: Option<CrackedUrl>,
    pub cookies: Cookies,
    pub headers: Vec<(String, String)>,
    pub status: u16,
    pub encoding: OutputEncoding,
    pub send_bom: bool,
    pub send_unicode: bool,
    pub verb_tunnel: bool,
    pub incoming: bool,
    pub last_error: Option<JsonError>,
}

impl JsonMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an incoming byte buffer into a `JsonMessage`; on failure the
    /// root stays `Json::None` and `last_error` is populated (spec.md §7:
    /// parse errors never propagate past the parser entry point).
    pub fn from_bytes(buffer: &[u8]) -> Self {
        let mut msg = Self { incoming: true, ..Default::default() };
        match parse_bytes(buffer) {
            Ok(value) => msg.root = value,
            Err(e) => msg.last_error = Some(e),
        }
        msg
    }

    pub fn from_str(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    pub fn to_string_body(&self) -> String {
        print_string(&self.root)
    }
}
