//! WS-Addressing state (spec.md §3.3, §4.7 step 3, glossary).

/// WS-Addressing header state carried on `SoapMessage`. `message_guid` is
/// generated once, lazily, the first time it is needed (spec.md §4.7:
/// "a:MessageID (URN UUID, auto-generated once)").
#[derive(Debug, Clone, Default)]
pub struct Addressing {
    pub enabled: bool,
    pub message_guid: Option<String>,
    pub reply_to: Option<String>,
    pub to: Option<String>,
    /// `FaultTo` (SPEC_FULL.md §2.8 supplement, dropped by spec.md's
    /// distillation but present in the original and the teacher's own
    /// `ws_addressing` module).
    pub fault_to: Option<String>,
    pub action: Option<String>,
}

impl Addressing {
    /// Returns the message GUID, generating and caching a fresh
    /// `urn:uuid:` identifier on first use.
    pub fn message_id(&mut self) -> &str {
        self.message_guid.get_or_insert_with(|| format!("urn:uuid:{}", uuid::Uuid::new_v4()))
    }
}
