/// Negative codes overlay OS/`io::Error` values the way spec.md §7
/// describes: "our negative codes (`-1…-9`) overlay OS positives".
/// `errno_t`'s sign distinction collapses here into distinct enum
/// variants instead, per spec.md §9's string-typed-errors REDESIGN FLAG.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error on the store file")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Http(#[from] wsfab_http::HttpError),
    #[error("not a HTTPMessage storage version number")]
    Version,
    #[error("wrong HTTPMessage storage version number")]
    WrongVersion,
    #[error("not a HTTPMessage storage response offset field")]
    ResponseOffset,
    #[error("not a known HTTP field member (higher version?)")]
    UnknownField,
    #[error("while reading the HTTP body (wrong length?)")]
    Body,
    #[error("not a HTTPMessage ending marker")]
    EndMarker,
    #[error("cannot skip to HTTPMessage response")]
    Response,
    #[error("HTTPMessage file has no response part")]
    NoResponse,
}
