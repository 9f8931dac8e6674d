//! `WsdlOperation` and the operation registry (spec.md §3.6): a `(code,
//! name)` pair of SOAP templates, indexed case-sensitively by name.

use std::collections::BTreeMap;

use wsfab_soap::SoapMessage;

/// One registered operation: an integer dispatch code and the request/
/// response templates `CheckMessage` validates real traffic against.
///
/// `BTreeMap` rather than a hash map keeps generation order
/// alphabetical-by-name and deterministic, matching the original's
/// `std::map<XString, WsdlOperation>` iteration order — `GenerateTypes`
/// and friends rely on that order being stable across runs.
#[derive(Debug, Clone)]
pub struct WsdlOperation {
    pub code: i32,
    pub input: SoapMessage,
    pub output: SoapMessage,
}

pub type OperationMap = BTreeMap<String, WsdlOperation>;
