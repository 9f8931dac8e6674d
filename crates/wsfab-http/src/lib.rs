//! HTTPMessage (C9): verbs, known headers, routing, cookies, a
//! file-buffer-backed body, and VERB tunneling.

pub mod error;
pub mod headers;
pub mod message;
pub mod verb;

pub use error::HttpError;
pub use headers::{HeaderMap, KnownRequestHeader, KnownResponseHeader};
pub use message::{FileBuffer, HttpMessage};
pub use verb::{Verb, VerbParseError};
