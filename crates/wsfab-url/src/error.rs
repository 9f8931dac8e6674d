#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("URL is missing a scheme")]
    MissingScheme,

    #[error("URL extension contains an embedded quote character")]
    SuspiciousExtension,
}
