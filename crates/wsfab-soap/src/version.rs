//! `SoapVersion` and the fixed namespace prelude spec.md §6.1 requires to
//! match byte-for-byte.

/// SOAP protocol version carried by `SoapMessage` (spec.md §3.3). `Pos`
/// ("Plain-Old-Soap") is SOAP 1.0: there is no `Envelope` at all and the
/// root element is the action itself (spec.md glossary; SPEC_FULL.md
/// §2.8's supplement, since spec.md's component table never spells out
/// the POS body-equals-root wire shape).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SoapVersion {
    Pos,
    #[default]
    V11,
    V12,
}

impl SoapVersion {
    /// The `s` envelope namespace for this version. POS has no envelope,
    /// so it falls back to the 1.1 namespace for any caller that needs
    /// *a* namespace string (it is otherwise unused in POS mode).
    pub fn envelope_namespace(self) -> &'static str {
        match self {
            SoapVersion::Pos | SoapVersion::V11 => NS_SOAP_11,
            SoapVersion::V12 => NS_SOAP_12,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            SoapVersion::Pos | SoapVersion::V11 => "text/xml",
            SoapVersion::V12 => "application/soap+xml",
        }
    }

    pub fn is_at_least_12(self) -> bool {
        matches!(self, SoapVersion::V12)
    }
}

pub const NS_SOAP_11: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const NS_SOAP_12: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const NS_ADDRESSING: &str = "http://www.w3.org/2005/08/addressing";
pub const NS_RELIABLE: &str = "http://schemas.xmlsoap.org/ws/2005/02/rm";
pub const NS_DIGSIG: &str = "http://www.w3.org/2000/09/xmldsig#";
pub const NS_XMLENC: &str = "http://www.w3.org/2001/04/xmlenc#";
pub const NS_WSSE: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-secext-1.0.xsd";
pub const NS_WSU: &str =
    "http://docs.oasis-open.org/wss/2004/01/oasis-200401-wss-wssecurity-utility-1.0.xsd";

/// Prefixes this crate always uses for the namespaces above, matching
/// spec.md §6.1's `s`/`a`/`rm`/`ds`/`xenc`/`wsse`/`wsu` letters.
pub const PFX_ADDRESSING: &str = "a";
pub const PFX_RELIABLE: &str = "rm";
pub const PFX_DIGSIG: &str = "ds";
pub const PFX_XMLENC: &str = "xenc";
pub const PFX_WSSE: &str = "wsse";
pub const PFX_WSU: &str = "wsu";

/// The WS-Addressing anonymous reply endpoint (spec.md §4.7 step 3:
/// "`a:ReplyTo/a:Address` anonymous").
pub const ADDRESSING_ANONYMOUS: &str = "http://www.w3.org/2005/08/addressing/anonymous";
