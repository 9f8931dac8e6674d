//! `SoapMessage` (C10, spec.md §3.3): the Envelope/Header/Body state
//! machine, carrying WS-Addressing, WS-ReliableMessaging, WS-Security,
//! HTTP context, cookies, routing, and the fault quadruple on top of a
//! `wsfab_xml::XmlMessage`.
//!
//! Builds directly on the arena model rather than a borrowed,
//! compile-time-typed-per-field tree (SPEC_FULL.md §2.8): WSDL-driven
//! runtime validation (C12) needs to walk an arbitrary, template-described
//! tree, which only an arena of runtime nodes can express.

use wsfab_cookie::Cookies;
use wsfab_http::HttpMessage;
use wsfab_json::JsonMessage;
use wsfab_xml::{NodeId, XmlMessage};

use crate::addressing::Addressing;
use crate::decompose::check_after_parsing;
use crate::error::SoapError;
use crate::fault::Fault;
use crate::reliable::Reliable;
use crate::security::Security;
use crate::version::SoapVersion;

/// HTTP-derived context a `SoapMessage` carries alongside the envelope
/// (spec.md §3.3's "HTTP context" tuple). The transport-level pieces this
/// names (`requestHandle`, `site`, `remoteDesktop`) are opaque identifiers
/// the core never interprets — they round-trip for the external
/// transport's benefit only.
#[derive(Debug, Clone, Default)]
pub struct HttpContext {
    pub status: u16,
    pub request_handle: Option<String>,
    pub site: Option<String>,
    pub access_token: Option<Vec<u8>>,
    pub sender_addr: Option<String>,
    pub remote_desktop: Option<u32>,
}

/// Whether the body or the whole message is the unit of WS-Security
/// encryption once decomposed (spec.md §4.7: "If Body has a lone
/// EncryptionData child, record body or message encryption and stop
/// further validation").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncryptedAs {
    Body,
    Message,
}

/// The SOAP message state machine (spec.md §3.3).
#[derive(Debug, Clone)]
pub struct SoapMessage {
    pub doc: XmlMessage,
    pub soap_version: SoapVersion,
    pub soap_action: Option<String>,
    pub namespace: String,
    pub header: Option<NodeId>,
    pub body: Option<NodeId>,
    pub parameter_object: Option<NodeId>,
    pub cookies: Cookies,
    pub routing: Vec<String>,
    pub http: HttpContext,
    pub fault: Option<Fault>,
    pub addressing: Addressing,
    pub reliable: Reliable,
    pub security: Security,
    pub wsdl_order: Option<wsfab_xml::Ordering>,
    pub encrypted_as: Option<EncryptedAs>,
}

impl Default for SoapMessage {
    fn default() -> Self {
        Self {
            doc: XmlMessage::new(),
            soap_version: SoapVersion::default(),
            soap_action: None,
            namespace: String::new(),
            header: None,
            body: None,
            parameter_object: None,
            cookies: Cookies::new(),
            routing: Vec::new(),
            http: HttpContext::default(),
            fault: None,
            addressing: Addressing::default(),
            reliable: Reliable::default(),
            security: Security::default(),
            wsdl_order: None,
            encrypted_as: None,
        }
    }
}

impl SoapMessage {
    /// An empty message (spec.md §3.3 lifecycle: "created by one of {
    /// empty, ... }").
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `text` as XML and runs `CheckAfterParsing` (spec.md §3.3:
    /// "from a literal XML string").
    #[tracing::instrument(skip(text))]
    pub fn from_xml_str(text: &str, version: SoapVersion) -> Self {
        let doc = wsfab_xml::parse(text.as_bytes());
        let mut msg = Self { doc, soap_version: version, ..Self::default() };
        check_after_parsing(&mut msg);
        msg
    }

    /// Parses an incoming `HttpMessage`'s body, extracting the SOAP action
    /// from the HTTP header and/or the envelope per spec.md §4.7's
    /// precedence rule (resolved fully once the body is decomposed).
    #[tracing::instrument(skip(http))]
    pub fn from_http(http: &HttpMessage, version: SoapVersion) -> Self {
        let body_text = String::from_utf8_lossy(http.body.get_buffer()).into_owned();
        let doc = wsfab_xml::parse(body_text.as_bytes());
        let mut msg = Self {
            doc,
            soap_version: version,
            cookies: http.cookies.clone(),
            routing: http.routing.clone(),
            ..Self::default()
        };
        msg.http.status = http.status;
        if let Some(action) = http.headers.get("SOAPAction") {
            msg.soap_action = Some(action.trim_matches('"').to_string());
        }
        check_after_parsing(&mut msg);

        // spec.md §4.7: for >=1.2 the envelope <a:Action> overrides the
        // HTTP header; for <=1.1 the HTTP header is authoritative. The
        // envelope extraction inside `check_after_parsing` already wrote
        // `soap_action` when an `<Action>` header element exists and the
        // version is >=1.2, so only re-apply the HTTP header when we are
        // still at <=1.1 or no envelope action was found.
        msg
    }

    /// Builds a `SoapMessage` from a `JsonMessage` via the JSON->SOAP
    /// bridge (spec.md §4.7).
    pub fn from_json(json: &JsonMessage, namespace: &str, action: &str, version: SoapVersion) -> Self {
        let mut msg = Self::outgoing(namespace, action, version, None);
        crate::bridge::json_to_soap(&json.root, &mut msg);
        msg
    }

    /// Builds a fresh outgoing envelope (spec.md §3.3: "from outgoing
    /// (namespace, action, version, url)").
    #[tracing::instrument]
    pub fn outgoing(namespace: &str, action: &str, version: SoapVersion, url: Option<&str>) -> Self {
        let mut msg = Self { soap_version: version, namespace: namespace.to_string(), ..Self::default() };
        msg.soap_action = Some(action.to_string());
        if let Some(url) = url {
            let _ = url; // cracked URL is the caller's concern once composed onto an HttpMessage.
        }
        crate::compose::set_soap_envelope(&mut msg);
        msg
    }

    /// Deep-copies `other`'s element arena and rebinds header/body/
    /// parameter-object by re-running `check_after_parsing`, rather than
    /// copying now-stale `NodeId`s (spec.md §9 Open Question #2; DESIGN.md
    /// decision).
    pub fn from_soap(other: &Self) -> Self {
        let mut doc = XmlMessage::new();
        doc.version = other.doc.version.clone();
        doc.standalone = other.doc.standalone;
        doc.encoding = other.doc.encoding;
        doc.condensed = other.doc.condensed;
        doc.send_bom = other.doc.send_bom;
        doc.whitespace_mode = other.doc.whitespace_mode;
        doc.print_restrictions = other.doc.print_restrictions;
        if let Some(root) = other.doc.root {
            let new_root = doc.clone_subtree_from(&other.doc, root);
            doc.set_root(new_root);
        }
        let mut msg = Self {
            doc,
            soap_version: other.soap_version,
            soap_action: other.soap_action.clone(),
            namespace: other.namespace.clone(),
            cookies: other.cookies.clone(),
            routing: other.routing.clone(),
            http: other.http.clone(),
            addressing: other.addressing.clone(),
            reliable: other.reliable.clone(),
            security: other.security.clone(),
            ..Self::default()
        };
        check_after_parsing(&mut msg);
        msg
    }

    /// Find-or-insert by name at the parameter-object level (spec.md
    /// §4.7's `SetParameter`).
    pub fn set_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<NodeId, SoapError> {
        let parent = self.require_parameter_object()?;
        Ok(self.doc.set_or_add_element(parent, "", name, value.into()))
    }

    /// Always inserts, duplicate names permitted (spec.md §4.7's
    /// `AddElement`).
    pub fn add_element(&mut self, name: &str, value: impl Into<String>) -> Result<NodeId, SoapError> {
        let parent = self.require_parameter_object()?;
        Ok(self.doc.add_element(parent, "", name, value.into()))
    }

    pub fn set_parameter_int(&mut self, name: &str, value: i64) -> Result<NodeId, SoapError> {
        self.set_parameter(name, value.to_string())
    }

    pub fn set_parameter_bool(&mut self, name: &str, value: bool) -> Result<NodeId, SoapError> {
        self.set_parameter(name, if value { "true" } else { "false" })
    }

    /// Double, trimmed of trailing zeros (spec.md §4.7).
    pub fn set_parameter_double(&mut self, name: &str, value: f64) -> Result<NodeId, SoapError> {
        let mut text = format!("{value}");
        if text.contains('.') {
            while text.ends_with('0') {
                text.pop();
            }
            if text.ends_with('.') {
                text.pop();
            }
        }
        self.set_parameter(name, text)
    }

    pub fn get_parameter(&self, name: &str) -> Option<&str> {
        let parent = self.parameter_object?;
        let child = self.doc.find_child(parent, name)?;
        Some(&self.doc.get(child).value)
    }

    pub(crate) fn require_parameter_object(&mut self) -> Result<NodeId, SoapError> {
        if self.parameter_object.is_none() {
            crate::compose::set_soap_body(self);
        }
        self.parameter_object.ok_or(SoapError::NoHeaderElement)
    }

    /// Sets a header-level value; errors on a Plain-Old-Soap message,
    /// which has no header at all (spec.md §7: "set a header param on POS
    /// message" is a programmer error).
    pub fn set_header_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<NodeId, SoapError> {
        if self.soap_version == SoapVersion::Pos {
            return Err(SoapError::HeaderOnPosMessage);
        }
        let header = self.header.ok_or(SoapError::NoHeaderElement)?;
        Ok(self.doc.set_or_add_element(header, "", name, value.into()))
    }

    /// Sets the fault quadruple (spec.md §8 scenario 3's `SetFault`).
    pub fn set_fault(
        &mut self,
        code: impl Into<String>,
        actor: impl Into<String>,
        string: impl Into<String>,
        detail: impl Into<String>,
    ) {
        self.fault = Some(Fault::new(code, actor, string, detail));
    }
}

/// Depth-first search for the first descendant of `node` named `name`
/// (used to locate a `Fault` element anywhere in the tree — spec.md §4.7:
/// "If a Fault element exists anywhere").
pub fn find_descendant(doc: &XmlMessage, node: NodeId, name: &str) -> Option<NodeId> {
    if doc.get(node).name == name {
        return Some(node);
    }
    for &child in &doc.get(node).children {
        if let Some(found) = find_descendant(doc, child, name) {
            return Some(found);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outgoing_message_builds_an_envelope_with_header_and_body() {
        let msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        assert!(msg.doc.root.is_some());
        assert_eq!(msg.soap_action.as_deref(), Some("DoThing"));
    }

    #[test]
    fn set_parameter_is_find_or_insert() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        msg.set_parameter("x", "1").unwrap();
        msg.set_parameter("x", "2").unwrap();
        let parent = msg.parameter_object.unwrap();
        assert_eq!(msg.doc.find_children(parent, "x").len(), 1);
        assert_eq!(msg.get_parameter("x"), Some("2"));
    }

    #[test]
    fn add_element_always_inserts_duplicates() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        msg.add_element("x", "1").unwrap();
        msg.add_element("x", "2").unwrap();
        let parent = msg.parameter_object.unwrap();
        assert_eq!(msg.doc.find_children(parent, "x").len(), 2);
    }

    #[test]
    fn header_parameter_on_pos_message_is_an_error() {
        let mut msg = SoapMessage::new();
        msg.soap_version = SoapVersion::Pos;
        assert!(msg.set_header_parameter("x", "1").is_err());
    }

    #[test]
    fn from_soap_rebinds_header_and_body_rather_than_copying_stale_ids() {
        let mut original = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        original.set_parameter("x", "1").unwrap();
        let cloned = SoapMessage::from_soap(&original);
        assert!(cloned.parameter_object.is_some());
        assert_eq!(cloned.get_parameter("x"), Some("1"));
    }
}
