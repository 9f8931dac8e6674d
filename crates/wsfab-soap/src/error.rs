//! `SoapError` (spec.md §7): programmer errors that never reach the wire.
//! Parse/validation/security failures are carried on the message itself
//! (`XmlMessage::error`, `SoapMessage::fault`) rather than thrown, per
//! spec.md §7's propagation policy — this enum exists only for the small
//! set of genuinely-thrown constructor/setter misuses.

#[derive(Debug, Clone, thiserror::Error)]
pub enum SoapError {
    #[error("element name '{0}' contains whitespace")]
    InvalidElementName(String),

    #[error("cannot set a SOAP header before the envelope has a header element")]
    NoHeaderElement,

    #[error("cannot set a header parameter on a Plain-Old-Soap (1.0) message")]
    HeaderOnPosMessage,

    #[error("WS-Security requires SOAP 1.2")]
    SecurityRequiresSoap12,

    #[error(transparent)]
    Codec(#[from] wsfab_codec::CodecError),

    #[error(transparent)]
    Cookie(#[from] wsfab_cookie::CookieError),

    #[error(transparent)]
    Url(#[from] wsfab_url::UrlError),
}
