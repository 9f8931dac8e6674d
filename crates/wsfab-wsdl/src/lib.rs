//! `WsdlCache` (C12): operation registry, WSDL 1.1 generation, and
//! template-driven runtime message validation.

pub mod cache;
pub mod docs;
pub mod error;
pub mod generate;
pub mod operation;
pub mod read;
pub mod validate;

pub use cache::WsdlCache;
pub use docs::{generate_operation_table, generate_service_page};
pub use error::WsdlError;
pub use generate::generate_wsdl;
pub use operation::{OperationMap, WsdlOperation};
pub use read::{read_wsdl, read_wsdl_file, read_wsdl_url, WsdlSource};
pub use validate::{check_incoming_message, check_message, check_outgoing_message};
