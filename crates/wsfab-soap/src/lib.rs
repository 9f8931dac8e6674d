//! The SOAP message state machine (C10/C11): Envelope/Header/Body
//! composition and decomposition, WS-Addressing, WS-ReliableMessaging,
//! WS-Security (UsernameToken Profile 1.1, signing, body/message
//! encryption), SOAP Faults in both 1.1 and 1.2 shapes, and the JSON<->SOAP
//! bridge.

pub mod addressing;
pub mod bridge;
pub mod canonical;
pub mod compose;
pub mod decompose;
pub mod error;
pub mod fault;
pub mod message;
pub mod reliable;
pub mod security;
pub mod version;

pub use addressing::Addressing;
pub use bridge::{json_to_soap, soap_message_to_json, soap_to_json};
pub use canonical::canonical_form;
pub use compose::{add_to_header_signing, encrypt_body, encrypt_message};
pub use decompose::{check_after_parsing, check_incoming_security};
pub use error::SoapError;
pub use fault::Fault;
pub use message::{EncryptedAs, HttpContext, SoapMessage};
pub use reliable::{AckRange, Reliable};
pub use security::{Encryption, Security};
pub use version::SoapVersion;
