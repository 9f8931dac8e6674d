//! `WsdlCache` (C12, spec.md §3.6): the operation registry plus the
//! configuration `GenerateWSDL`/`CheckIncomingMessage`/`CheckOutgoingMessage`
//! read from.

use std::path::PathBuf;

use wsfab_soap::SoapMessage;
use wsfab_url::CrackedUrl;
use wsfab_xml::XmlRestrictions;

use crate::error::WsdlError;
use crate::operation::{OperationMap, WsdlOperation};

/// Registry + configuration for one service's WSDL (spec.md §3.6's field
/// list). A single-owner, single-thread object, like every other core
/// component (spec.md §6.6).
#[derive(Debug, Clone)]
pub struct WsdlCache {
    pub service_name: String,
    pub target_namespace: String,
    pub webroot: String,
    pub url: String,
    pub abs_path: String,
    pub service_postfix: String,
    pub perform_soap11: bool,
    pub perform_soap12: bool,
    pub restrictions: XmlRestrictions,
    operations: OperationMap,
}

impl Default for WsdlCache {
    fn default() -> Self {
        Self {
            service_name: String::new(),
            target_namespace: String::new(),
            webroot: String::new(),
            url: String::new(),
            abs_path: String::new(),
            service_postfix: ".acx".to_string(),
            perform_soap11: true,
            perform_soap12: true,
            restrictions: XmlRestrictions::new(),
            operations: OperationMap::new(),
        }
    }
}

impl WsdlCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cracks `url` to derive `abs_path`, and records `name`/`url` (spec.md
    /// §3.6). Call before `add_operation`/`generate_wsdl`.
    pub fn set_service(&mut self, name: &str, target_namespace: &str, webroot: &str, url: &str) -> Result<(), WsdlError> {
        let cracked = CrackedUrl::crack(url)?;
        self.service_name = name.to_string();
        self.target_namespace = target_namespace.to_string();
        self.webroot = webroot.to_string();
        self.url = url.to_string();
        self.abs_path = cracked.absolute_path().to_string();
        Ok(())
    }

    /// Clears every registered operation, keeping the service
    /// configuration (spec.md §3.6's `ClearCache`/`Reset` distinction:
    /// configuration survives, templates don't).
    pub fn clear_cache(&mut self) {
        self.operations.clear();
    }

    /// `AddOperation(code, name, inTemplate, outTemplate)`: deep-copies
    /// both templates into the registry; duplicate name is rejected
    /// (spec.md §4.9).
    pub fn add_operation(
        &mut self,
        code: i32,
        name: &str,
        input: &SoapMessage,
        output: &SoapMessage,
    ) -> Result<(), WsdlError> {
        if self.operations.contains_key(name) {
            return Err(WsdlError::DuplicateOperation(name.to_string()));
        }
        self.operations.insert(
            name.to_string(),
            WsdlOperation { code, input: SoapMessage::from_soap(input), output: SoapMessage::from_soap(output) },
        );
        Ok(())
    }

    pub fn operations(&self) -> &OperationMap {
        &self.operations
    }

    pub fn get_operation(&self, name: &str) -> Option<&WsdlOperation> {
        self.operations.get(name)
    }

    /// The dispatch code registered for `name`, if any (spec.md §3.6's
    /// `GetCommandCode`).
    pub fn command_code(&self, name: &str) -> Option<i32> {
        self.operations.get(name).map(|op| op.code)
    }

    /// `webroot + absPath + serviceName + ".wsdl"` (spec.md §6.6).
    pub fn wsdl_path(&self) -> PathBuf {
        let mut path = PathBuf::from(&self.webroot);
        let trimmed = self.abs_path.trim_start_matches('/');
        if !trimmed.is_empty() {
            path.push(trimmed);
        }
        path.push(format!("{}.wsdl", self.service_name));
        path
    }

    pub(crate) fn ensure_configured(&self) -> Result<(), WsdlError> {
        if self.service_name.is_empty() || self.target_namespace.is_empty() || self.webroot.is_empty() {
            return Err(WsdlError::ServiceNotConfigured);
        }
        if self.operations.is_empty() {
            return Err(WsdlError::NoOperations);
        }
        if !self.perform_soap11 && !self.perform_soap12 {
            return Err(WsdlError::NoBindingEnabled);
        }
        Ok(())
    }
}
