use crate::verb::VerbParseError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum HttpError {
    #[error(transparent)]
    Verb(#[from] VerbParseError),
    #[error(transparent)]
    Url(#[from] wsfab_url::UrlError),
    #[error(transparent)]
    Cookie(#[from] wsfab_cookie::CookieError),
    #[error("buffer part request [{offset}, {offset}+{len}) is out of range for a {size}-byte buffer")]
    BufferOutOfRange { offset: usize, len: usize, size: usize },
}
