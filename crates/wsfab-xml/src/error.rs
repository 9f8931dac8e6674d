use crate::model::NodeId;

/// XML error taxonomy (spec.md §4.5), carried as a first-class enum rather
/// than a string code — spec.md §9's own REDESIGN FLAG ("string-typed XML
/// errors: replace with a first-class XmlError variant") applied literally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum XmlErrorKind {
    #[error("no error")]
    None,
    #[error("empty XML document")]
    EmptyXml,
    #[error("incompatible encoding: only UTF-8 is accepted")]
    IncompatibleEncoding,
    #[error("buffer is not an XML message")]
    NotAnXmlMessage,
    #[error("document has no root element")]
    NoRootElement,
    #[error("missing closing token")]
    MissingClosing,
    #[error("missing expected token")]
    MissingToken,
    #[error("missing expected element")]
    MissingElement,
    #[error("DTD is not supported")]
    DtdNotSupported,
    #[error("missing end tag")]
    MissingEndTag,
    #[error("out of memory")]
    OutOfMemory,
    #[error("extra text after the root element")]
    ExtraText,
    #[error("invalid declaration attributes")]
    HeaderAttribs,
    #[error("message has no body")]
    NoBody,
    #[error("empty command/element name")]
    EmptyCommand,
    #[error("unknown protocol")]
    UnknownProtocol,
    #[error("unknown encoding")]
    UnknownEncoding,
    #[error("unknown XML parser state")]
    UnknownXmlParser,
}

impl Default for XmlErrorKind {
    fn default() -> Self {
        Self::None
    }
}

/// `(XmlError kind, string message, optional element context)` triple
/// carried on `XmlMessage` (spec.md §3.2). `DtdNotSupported` is a warning:
/// it is recorded but does not stop parsing.
#[derive(Debug, Clone, Default)]
pub struct XmlErrorState {
    pub kind: XmlErrorKind,
    pub message: String,
    pub context: Option<NodeId>,
}

impl XmlErrorState {
    pub fn is_error(&self) -> bool {
        !matches!(self.kind, XmlErrorKind::None | XmlErrorKind::DtdNotSupported)
    }

    pub fn set(&mut self, kind: XmlErrorKind, message: impl Into<String>, context: Option<NodeId>) {
        self.kind = kind;
        self.message = message.into();
        self.context = context;
    }
}
