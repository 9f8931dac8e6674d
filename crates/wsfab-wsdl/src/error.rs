//! `WsdlError` (spec.md §7): thrown on registry/configuration misuse.
//! Validation failures never throw — they write a typed `Fault` onto the
//! message being checked and return `false`, same propagation split as
//! `wsfab-soap`'s `SoapError`.

#[derive(Debug, thiserror::Error)]
pub enum WsdlError {
    #[error("an operation named '{0}' is already registered")]
    DuplicateOperation(String),

    #[error("service name, target namespace and webroot must all be set before generating a WSDL")]
    ServiceNotConfigured,

    #[error("no operations are registered")]
    NoOperations,

    #[error("neither SOAP 1.1 nor SOAP 1.2 binding is enabled")]
    NoBindingEnabled,

    #[error(transparent)]
    Url(#[from] wsfab_url::UrlError),

    #[error("I/O error while reading or writing a WSDL file")]
    Io(#[from] std::io::Error),

    #[error("malformed WSDL: {0}")]
    Parse(String),

    #[error("a http(s) WSDL URL was given but no WsdlSource was supplied")]
    NoHttpSource,
}
