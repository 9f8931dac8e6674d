//! `HTTPMessage` (C9, spec.md §3.4): the HTTP envelope `SOAPMessage` rides
//! on top of. Carries the verb, the cracked URL, headers/cookies, routing,
//! a file-buffer-backed body, and VERB-tunneling state.

use time::OffsetDateTime;
use wsfab_cookie::Cookies;
use wsfab_url::CrackedUrl;

use crate::error::HttpError;
use crate::headers::HeaderMap;
use crate::verb::Verb;

const HDR_METHOD: &str = "X-HTTP-Method";
const HDR_METHOD_OVERRIDE: &str = "X-HTTP-Method-Override";
const HDR_METHOD_OVERRIDE_UPPER: &str = "X-METHOD-OVERRIDE";

/// Minimal in-memory stand-in for the chunked, file-backed payload
/// collaborator spec.md §3.4 treats as external. Only the four methods
/// `HTTPMessage`/`MessageStore` actually consume are modeled
/// (`get_buffer`/`add_buffer`/`get_buffer_copy`/`get_buffer_part`/
/// `set_file_name`); streaming-to-disk and multipart chunk reassembly are
/// out of scope (spec.md Non-goals).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileBuffer {
    data: Vec<u8>,
    file_name: Option<String>,
}

impl FileBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, file_name: None }
    }

    pub fn get_buffer(&self) -> &[u8] {
        &self.data
    }

    pub fn add_buffer(&mut self, chunk: &[u8]) {
        self.data.extend_from_slice(chunk);
    }

    pub fn get_buffer_copy(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn get_buffer_part(&self, offset: usize, len: usize) -> Result<&[u8], HttpError> {
        self.data.get(offset..offset + len).ok_or(HttpError::BufferOutOfRange {
            offset,
            len,
            size: self.data.len(),
        })
    }

    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = Some(name.into());
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// The HTTP envelope a request/response carries through the fabric,
/// matching spec.md §3.4's field set. Sharing, where needed, is expected
/// at the call site via `Arc<HttpMessage>` rather than an intrusive
/// refcount (spec.md §9's REDESIGN FLAGS: "prefer value semantics +
/// explicit move; if sharing is required, use the language's
/// shared-ownership primitive").
#[derive(Debug, Clone)]
pub struct HttpMessage {
    pub verb: Verb,
    pub status: u16,
    pub url: Option<CrackedUrl>,
    pub content_type: String,
    pub accept_encoding: String,
    pub user: Option<String>,
    pub password: Option<String>,
    pub cookies: Cookies,
    pub headers: HeaderMap,
    pub routing: Vec<String>,
    pub body: FileBuffer,
    pub access_token: Option<Vec<u8>>,
    pub sender_addr: Option<String>,
    pub receiver_addr: Option<String>,
    pub use_if_modified_since: bool,
    pub system_time: Option<OffsetDateTime>,
    pub verb_tunnel: bool,
    pub read_buffer: bool,
    pub content_length: u64,
    pub chunk_number: u32,
    pub xml_http_request: bool,
    /// `Referer` of this call, stored separately from `headers` so
    /// `wsfab-store` can frame it as its own tagged field.
    pub referrer: String,
    /// Remote desktop number (terminal-services session), carried through
    /// for `wsfab-store`'s `FT_DESKTOP` field.
    pub remote_desktop: u32,
    /// Whether a byte-order-mark was discovered in (or should be emitted
    /// with) the body.
    pub send_bom: bool,
}

impl Default for HttpMessage {
    fn default() -> Self {
        Self {
            verb: Verb::default(),
            status: 200,
            url: None,
            content_type: String::new(),
            accept_encoding: String::new(),
            user: None,
            password: None,
            cookies: Cookies::new(),
            headers: HeaderMap::new(),
            routing: Vec::new(),
            body: FileBuffer::new(),
            access_token: None,
            sender_addr: None,
            receiver_addr: None,
            use_if_modified_since: false,
            system_time: None,
            verb_tunnel: false,
            read_buffer: false,
            content_length: 0,
            chunk_number: 0,
            xml_http_request: false,
            referrer: String::new(),
            remote_desktop: 0,
            send_bom: false,
        }
    }
}

impl HttpMessage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and installs the request URL.
    pub fn set_url(&mut self, url: &str) -> Result<(), HttpError> {
        self.url = Some(CrackedUrl::crack(url)?);
        Ok(())
    }

    /// Splits `path` on `/` into the routing vector (spec.md §3.4).
    pub fn set_routing(&mut self, path: &str) {
        self.routing = path.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect();
    }

    /// Inbound VERB tunneling (spec.md §4.7): promotes a POST to the verb
    /// named in any of `X-HTTP-Method`, `X-HTTP-Method-Override`,
    /// `X-METHOD-OVERRIDE`, with `X-METHOD-OVERRIDE` taking precedence
    /// over `X-HTTP-Method-Override` taking precedence over
    /// `X-HTTP-Method` (last-wins precedence order M3 > M2 > M1).
    pub fn find_verb_tunneling(&mut self) {
        if self.verb != Verb::Post {
            return;
        }
        let mut promoted = None;
        for header in [HDR_METHOD, HDR_METHOD_OVERRIDE, HDR_METHOD_OVERRIDE_UPPER] {
            if let Some(value) = self.headers.get(header) {
                if let Ok(verb) = value.parse::<Verb>() {
                    promoted = Some(verb);
                }
            }
        }
        if let Some(verb) = promoted {
            self.verb = verb;
            self.verb_tunnel = true;
        }
    }

    /// Outbound VERB tunneling (spec.md §4.7): rewrites a non-POST verb to
    /// POST and records the original verb in `X-HTTP-Method-Override`.
    pub fn use_verb_tunneling(&mut self) {
        if self.verb == Verb::Post {
            return;
        }
        self.headers.add(HDR_METHOD_OVERRIDE, self.verb.as_str());
        self.verb = Verb::Post;
        self.verb_tunnel = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inbound_tunneling_promotes_post_to_named_verb() {
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Post;
        msg.headers.add("X-HTTP-Method", "DELETE");
        msg.find_verb_tunneling();
        assert_eq!(msg.verb, Verb::Delete);
        assert!(msg.verb_tunnel);
    }

    #[test]
    fn inbound_tunneling_precedence_is_m3_over_m2_over_m1() {
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Post;
        msg.headers.add("X-HTTP-Method", "DELETE");
        msg.headers.add("X-HTTP-Method-Override", "PUT");
        msg.headers.add("X-METHOD-OVERRIDE", "PATCH");
        msg.find_verb_tunneling();
        assert_eq!(msg.verb, Verb::Patch);
    }

    #[test]
    fn inbound_tunneling_is_a_no_op_on_a_non_post_verb() {
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Get;
        msg.headers.add("X-HTTP-Method", "DELETE");
        msg.find_verb_tunneling();
        assert_eq!(msg.verb, Verb::Get);
        assert!(!msg.verb_tunnel);
    }

    #[test]
    fn outbound_tunneling_rewrites_to_post_and_adds_override_header() {
        let mut msg = HttpMessage::new();
        msg.verb = Verb::Delete;
        msg.use_verb_tunneling();
        assert_eq!(msg.verb, Verb::Post);
        assert!(msg.verb_tunnel);
        assert_eq!(msg.headers.get("X-HTTP-Method-Override"), Some("DELETE"));
    }

    #[test]
    fn file_buffer_round_trips_and_rejects_out_of_range_parts() {
        let mut buf = FileBuffer::new();
        buf.add_buffer(b"hello");
        buf.add_buffer(b" world");
        assert_eq!(buf.get_buffer(), b"hello world");
        assert_eq!(buf.get_buffer_part(0, 5).unwrap(), b"hello");
        assert!(buf.get_buffer_part(0, 100).is_err());
    }

    #[test]
    fn set_routing_splits_path_into_segments() {
        let mut msg = HttpMessage::new();
        msg.set_routing("/a/b/c/");
        assert_eq!(msg.routing, vec!["a", "b", "c"]);
    }
}
