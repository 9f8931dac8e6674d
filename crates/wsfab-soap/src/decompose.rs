//! `CheckAfterParsing` (spec.md §3.3, §4.7): relocates header/body/
//! parameter-object, extracts WS-Addressing/WS-ReliableMessaging headers,
//! detects body/message encryption, and parses a `Fault` if one exists.

use wsfab_xml::NodeId;

use crate::message::{find_descendant, EncryptedAs, SoapMessage};
use crate::reliable::AckRange;
use crate::security;
use crate::version::{NS_SOAP_12, SoapVersion};

/// Runs the full decomposition pipeline over `msg.doc`, which must already
/// be parsed. No-op (beyond clearing stale state) if the document has no
/// root.
#[tracing::instrument(skip(msg))]
pub fn check_after_parsing(msg: &mut SoapMessage) {
    let Some(root) = msg.doc.root else { return };

    promote_version_from_envelope_xmlns(msg, root);

    if msg.doc.get(root).name != "Envelope" {
        // Plain-Old-Soap: no envelope at all, the root is the action
        // itself (spec.md glossary; SPEC_FULL.md §2.8 supplement).
        msg.soap_version = SoapVersion::Pos;
        msg.body = Some(root);
        msg.parameter_object = Some(root);
        if msg.soap_action.is_none() {
            msg.soap_action = Some(msg.doc.get(root).name.clone());
        }
        return;
    }

    // Whole-message encryption: the envelope's only child is a lone
    // `EncryptionData` element, not a `Body` (spec.md §4.7's composition
    // step 5, `EncryptMessage`).
    let root_children = &msg.doc.get(root).children;
    if root_children.len() == 1 && msg.doc.get(root_children[0]).name == "EncryptionData" {
        msg.encrypted_as = Some(EncryptedAs::Message);
        return;
    }

    msg.header = msg.doc.find_child(root, "Header");
    msg.body = msg.doc.find_child(root, "Body");

    let Some(body) = msg.body else { return };

    let body_children = &msg.doc.get(body).children;
    if body_children.len() == 1 && msg.doc.get(body_children[0]).name == "EncryptionData" {
        msg.encrypted_as = Some(EncryptedAs::Body);
        return;
    }

    msg.parameter_object = msg.doc.get(body).children.first().copied();

    if let Some(header) = msg.header {
        extract_action(msg, header);
        extract_addressing(msg, header);
        extract_reliable(msg, header);
    }

    if let Some(fault_node) = find_descendant(&msg.doc, body, "Fault") {
        msg.fault = Some(crate::fault::Fault::read(&msg.doc, fault_node, msg.soap_version));
    }
}

/// The root element's `xmlns:<prefix>` attribute (matching its own
/// namespace prefix) may promote `soap_version` from 1.1 to 1.2 (spec.md
/// §4.5: "On the first encountered xmlns attribute of the root, the value
/// may promote the soapVersion ... from 1.1 to 1.2").
fn promote_version_from_envelope_xmlns(msg: &mut SoapMessage, root: NodeId) {
    if msg.soap_version == SoapVersion::Pos {
        return;
    }
    let prefix = msg.doc.get(root).namespace.clone();
    let attr_name = if prefix.is_empty() { "xmlns".to_string() } else { format!("xmlns:{prefix}") };
    // A 1.1 xmlns value never demotes a caller-specified 1.2 back to 1.1.
    if msg.doc.get_attribute(root, &attr_name) == Some(NS_SOAP_12) {
        msg.soap_version = SoapVersion::V12;
    }
}

/// Extracts `<Action>` from the header. Per spec.md §4.7's precedence
/// rule, the envelope action only takes over `soap_action` once the
/// version is >=1.2 (a 1.2 envelope's `<a:Action>` outranks the HTTP
/// `SOAPAction` header set earlier by `SoapMessage::from_http`); for
/// <=1.1 the HTTP header (already on `msg.soap_action`) stays authoritative.
fn extract_action(msg: &mut SoapMessage, header: NodeId) {
    let Some(action_node) = msg.doc.find_child(header, "Action") else { return };
    let value = msg.doc.get(action_node).value.trim_matches('"').to_string();
    if msg.soap_version.is_at_least_12() {
        msg.soap_action = Some(value.clone());
    }
    if let Some(slash) = value.rfind('/') {
        msg.namespace = value[..slash].to_string();
        if msg.soap_version.is_at_least_12() {
            msg.soap_action = Some(value[slash + 1..].to_string());
        }
    }
}

fn extract_addressing(msg: &mut SoapMessage, header: NodeId) {
    if let Some(id) = msg.doc.find_child(header, "MessageID") {
        msg.addressing.message_guid = Some(msg.doc.get(id).value.clone());
        msg.addressing.enabled = true;
    }
    if let Some(reply_to) = msg.doc.find_child(header, "ReplyTo") {
        if let Some(addr) = msg.doc.find_child(reply_to, "Address") {
            msg.addressing.reply_to = Some(msg.doc.get(addr).value.clone());
        }
        msg.addressing.enabled = true;
    }
    if let Some(to) = msg.doc.find_child(header, "To") {
        msg.addressing.to = Some(msg.doc.get(to).value.clone());
        msg.addressing.enabled = true;
    }
    if let Some(fault_to) = msg.doc.find_child(header, "FaultTo") {
        if let Some(addr) = msg.doc.find_child(fault_to, "Address") {
            msg.addressing.fault_to = Some(msg.doc.get(addr).value.clone());
        }
    }
}

fn extract_reliable(msg: &mut SoapMessage, header: NodeId) {
    if let Some(sequence) = msg.doc.find_child(header, "Sequence") {
        msg.reliable.reliable = true;
        if let Some(id) = msg.doc.find_child(sequence, "Identifier") {
            msg.reliable.client_seq_guid = Some(msg.doc.get(id).value.clone());
        }
        if let Some(num) = msg.doc.find_child(sequence, "MessageNumber") {
            msg.reliable.client_msg_number = msg.doc.get(num).value.parse().unwrap_or(0);
        }
        msg.reliable.last_message = msg.doc.find_child(sequence, "LastMessage").is_some();
    }
    if let Some(ack) = msg.doc.find_child(header, "SequenceAcknowledgement") {
        msg.reliable.reliable = true;
        for range_id in msg.doc.find_children(ack, "AcknowledgementRange") {
            let lower = msg.doc.get_attribute(range_id, "Lower").and_then(|s| s.parse().ok());
            let upper = msg.doc.get_attribute(range_id, "Upper").and_then(|s| s.parse().ok());
            if let (Some(lower), Some(upper)) = (lower, upper) {
                msg.reliable.acknowledged_ranges.push(AckRange { lower, upper });
            }
        }
    }
}

/// Checks WS-Security authentication on an already-decomposed incoming
/// message (spec.md §4.8's `CheckSecurity`). Returns `true` and sets
/// `msg.http`'s caller-visible user on success; `false` on mismatch.
#[tracing::instrument(skip(msg, preset_password, find_password))]
pub fn check_incoming_security(
    msg: &mut SoapMessage,
    preset_username: Option<&str>,
    preset_password: Option<&str>,
    find_password: Option<&dyn Fn(&str) -> Option<String>>,
    freshness_seconds: i64,
) -> bool {
    let Some(header) = msg.header else { return true };
    match security::check_security(
        &msg.doc,
        header,
        preset_username,
        preset_password,
        find_password,
        freshness_seconds,
        time::OffsetDateTime::now_utc(),
    ) {
        Some(username) => {
            msg.security.enc_user = Some(username);
            true
        }
        None => {
            // No Security element present at all is success per spec.md
            // §4.8; only an actual mismatch returns false.
            msg.doc.find_child(header, "Security").is_none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SoapMessage;

    #[test]
    fn plain_old_soap_uses_root_as_body_and_parameter_object() {
        let mut msg = SoapMessage::from_xml_str("<DoThing><x>1</x></DoThing>", SoapVersion::Pos);
        assert_eq!(msg.soap_version, SoapVersion::Pos);
        assert_eq!(msg.body, msg.doc.root);
        assert_eq!(msg.parameter_object, msg.doc.root);
        let _ = &mut msg;
    }

    #[test]
    fn envelope_locates_header_body_and_parameter_object() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Header/>
            <s:Body><DoThing><x>1</x></DoThing></s:Body>
        </s:Envelope>"#;
        let msg = SoapMessage::from_xml_str(xml, SoapVersion::V11);
        assert!(msg.header.is_some());
        assert!(msg.body.is_some());
        let param = msg.parameter_object.unwrap();
        assert_eq!(msg.doc.get(param).name, "DoThing");
    }

    #[test]
    fn xmlns_promotes_soap_11_envelope_to_12() {
        let xml = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
            <s:Body><DoThing/></s:Body>
        </s:Envelope>"#;
        let msg = SoapMessage::from_xml_str(xml, SoapVersion::V11);
        assert_eq!(msg.soap_version, SoapVersion::V12);
    }

    #[test]
    fn action_precedence_envelope_wins_at_12_http_header_wins_at_11() {
        let xml_12 = r#"<s:Envelope xmlns:s="http://www.w3.org/2003/05/soap-envelope">
            <s:Header><Action>urn:test/EnvelopeAction</Action></s:Header>
            <s:Body><DoThing/></s:Body>
        </s:Envelope>"#;
        let mut msg12 = SoapMessage::from_xml_str(xml_12, SoapVersion::V12);
        msg12.soap_action = Some("HttpHeaderAction".to_string());
        check_after_parsing(&mut msg12);
        assert_eq!(msg12.soap_action.as_deref(), Some("EnvelopeAction"));

        let xml_11 = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Header><Action>urn:test/EnvelopeAction</Action></s:Header>
            <s:Body><DoThing/></s:Body>
        </s:Envelope>"#;
        let mut msg11 = SoapMessage::from_xml_str(xml_11, SoapVersion::V11);
        msg11.soap_action = Some("HttpHeaderAction".to_string());
        check_after_parsing(&mut msg11);
        assert_eq!(msg11.soap_action.as_deref(), Some("HttpHeaderAction"));
    }

    #[test]
    fn reliable_messaging_ranges_are_extracted() {
        let xml = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Header><SequenceAcknowledgement><AcknowledgementRange Lower="1" Upper="3"/></SequenceAcknowledgement></s:Header>
            <s:Body><DoThing/></s:Body>
        </s:Envelope>"#;
        let msg = SoapMessage::from_xml_str(xml, SoapVersion::V11);
        assert!(msg.reliable.reliable);
        assert_eq!(msg.reliable.acknowledged_ranges, vec![AckRange { lower: 1, upper: 3 }]);
    }
}
