//! Composition pipeline (spec.md §4.7): `SetSoapEnvelope`/`SetSoapHeader`/
//! `SetSoapBody`, plus the WS-Security envelope operations `AddToHeaderSigning`/
//! `EncryptBody`/`EncryptMessage`.

use wsfab_xml::NodeId;

use crate::canonical::canonical_form;
use crate::error::SoapError;
use crate::message::{EncryptedAs, SoapMessage};
use crate::security::Encryption;
use crate::version::{
    ADDRESSING_ANONYMOUS, NS_ADDRESSING, NS_DIGSIG, NS_RELIABLE, NS_WSSE, NS_WSU, NS_XMLENC,
    PFX_ADDRESSING, PFX_DIGSIG, PFX_RELIABLE, PFX_WSSE, PFX_WSU, PFX_XMLENC, SoapVersion,
};

/// `SetSoapEnvelope` (spec.md §4.7 steps 1-4): builds Envelope/Header/Body
/// — or, for `Pos`, just the bare action root — and either serializes the
/// fault quadruple (if one has been set) or fills in the header and
/// parameter-object element.
#[tracing::instrument(skip(msg))]
pub fn set_soap_envelope(msg: &mut SoapMessage) {
    if msg.soap_version == SoapVersion::Pos {
        let action = msg.soap_action.clone().unwrap_or_default();
        let root = msg.doc.new_element("", action);
        msg.doc.set_root(root);
        msg.body = Some(root);
        msg.parameter_object = Some(root);
        return;
    }

    let root = msg.doc.new_element("s", "Envelope");
    msg.doc.set_root(root);
    msg.doc.set_attribute(root, "xmlns:s", msg.soap_version.envelope_namespace());
    msg.doc.set_attribute(root, "xmlns:i", "http://www.w3.org/2001/XMLSchema-instance");
    msg.doc.set_attribute(root, "xmlns:xsd", "http://www.w3.org/2001/XMLSchema");

    let addressing_on = msg.addressing.enabled || msg.reliable.reliable || msg.soap_version.is_at_least_12();
    if addressing_on {
        msg.doc.set_attribute(root, format!("xmlns:{PFX_ADDRESSING}"), NS_ADDRESSING);
    }
    if msg.reliable.reliable {
        msg.doc.set_attribute(root, format!("xmlns:{PFX_RELIABLE}"), NS_RELIABLE);
    }
    if msg.security.encryption != Encryption::Plain {
        msg.doc.set_attribute(root, format!("xmlns:{PFX_DIGSIG}"), NS_DIGSIG);
        msg.doc.set_attribute(root, format!("xmlns:{PFX_XMLENC}"), NS_XMLENC);
        msg.doc.set_attribute(root, format!("xmlns:{PFX_WSSE}"), NS_WSSE);
        msg.doc.set_attribute(root, format!("xmlns:{PFX_WSU}"), NS_WSU);
    }

    let header = msg.doc.new_element("s", "Header");
    msg.doc.append_child(root, header);
    msg.header = Some(header);

    let body = msg.doc.new_element("s", "Body");
    msg.doc.append_child(root, body);
    msg.body = Some(body);

    if let Some(fault) = msg.fault.clone() {
        fault.write(&mut msg.doc, body, msg.soap_version);
        return;
    }

    set_soap_header(msg, addressing_on);
    set_soap_body(msg);
}

/// `SetSoapHeader` (spec.md §4.7 step 3).
fn set_soap_header(msg: &mut SoapMessage, addressing_on: bool) {
    let Some(header) = msg.header else { return };

    let action_value = format!("{}/{}", msg.namespace, msg.soap_action.clone().unwrap_or_default());
    let action_node = msg.doc.add_element(header, PFX_ADDRESSING, "Action", action_value);
    msg.doc.set_attribute(action_node, "s:mustUnderstand", "1");

    if addressing_on {
        let message_id = msg.addressing.message_id().to_string();
        msg.doc.add_element(header, PFX_ADDRESSING, "MessageID", message_id);

        let reply_to = msg.doc.new_element(PFX_ADDRESSING, "ReplyTo");
        msg.doc.append_child(header, reply_to);
        msg.doc.add_element(reply_to, PFX_ADDRESSING, "Address", ADDRESSING_ANONYMOUS);

        let to_value = msg.addressing.to.clone().unwrap_or_else(|| ADDRESSING_ANONYMOUS.to_string());
        let to_node = msg.doc.add_element(header, PFX_ADDRESSING, "To", to_value);
        msg.doc.set_attribute(to_node, "s:mustUnderstand", "1");
    }

    if msg.reliable.reliable {
        let ranges = msg.reliable.ranges_to_acknowledge();
        let ack = msg.doc.new_element(PFX_RELIABLE, "SequenceAcknowledgement");
        msg.doc.append_child(header, ack);
        for range in ranges {
            let range_node = msg.doc.new_element(PFX_RELIABLE, "AcknowledgementRange");
            msg.doc.append_child(ack, range_node);
            msg.doc.set_attribute(range_node, "Lower", range.lower.to_string());
            msg.doc.set_attribute(range_node, "Upper", range.upper.to_string());
        }

        let sequence = msg.doc.new_element(PFX_RELIABLE, "Sequence");
        msg.doc.append_child(header, sequence);
        let seq_id = msg.reliable.server_sequence_id().to_string();
        msg.doc.add_element(sequence, PFX_RELIABLE, "Identifier", seq_id);
        msg.doc.add_element(
            sequence,
            PFX_RELIABLE,
            "MessageNumber",
            msg.reliable.client_msg_number.to_string(),
        );
        if msg.reliable.last_message {
            let last = msg.doc.new_element(PFX_RELIABLE, "LastMessage");
            msg.doc.append_child(sequence, last);
        }
    }
}

/// `SetSoapBody` (spec.md §4.7 step 4): ensures the parameter-object element
/// exists under Body, named after the action, with `xmlns` set to
/// `msg.namespace`.
pub fn set_soap_body(msg: &mut SoapMessage) {
    let Some(body) = msg.body else { return };

    if let Some(param) = msg.parameter_object {
        if msg.doc.parent_of(param) == Some(body) {
            msg.doc.set_attribute(param, "xmlns", msg.namespace.clone());
            return;
        }
    }

    let action = msg.soap_action.clone().unwrap_or_default();
    let param = if let Some(existing) = msg.doc.find_child(body, &action) {
        existing
    } else {
        let node = msg.doc.new_element("", action);
        msg.doc.append_child(body, node);
        node
    };
    msg.doc.set_attribute(param, "xmlns", msg.namespace.clone());
    msg.parameter_object = Some(param);
}

/// `AddToHeaderSigning` (spec.md §4.7 step 5): digests the body's canonical
/// form under `signing_method`, wraps it in `wsse:Security/ds:Signature`
/// with a `CustomToken = base64(reverse(password)+TOKEN+password)`. A
/// non-empty existing `SignatureValue` is left untouched (spec.md §8's
/// "signing an already-signed body does not rewrite a non-empty
/// SignatureValue" idempotence property).
#[tracing::instrument(skip(msg, password))]
pub fn add_to_header_signing(msg: &mut SoapMessage, username: &str, password: &str) -> Result<NodeId, SoapError> {
    if !msg.soap_version.is_at_least_12() {
        return Err(SoapError::SecurityRequiresSoap12);
    }
    let header = msg.header.ok_or(SoapError::NoHeaderElement)?;
    let body = msg.body.ok_or(SoapError::NoHeaderElement)?;

    if let Some(existing) = already_signed(msg, header) {
        return Ok(existing);
    }

    let canonical = canonical_form(&msg.doc, body);
    let digest_value = wsfab_codec::Codec::digest(msg.security.signing_method, canonical.as_bytes(), true);

    let reversed: String = password.chars().rev().collect();
    let custom_token = format!("{reversed}TOKEN{password}");

    let security = crate::security::set_security(&mut msg.doc, header, username, &custom_token, false);
    let signature = msg.doc.new_element(PFX_DIGSIG, "Signature");
    msg.doc.append_child(security, signature);
    let signed_info = msg.doc.new_element(PFX_DIGSIG, "SignedInfo");
    msg.doc.append_child(signature, signed_info);
    msg.doc.add_element(signed_info, PFX_DIGSIG, "DigestValue", digest_value.clone());
    msg.doc.add_element(signature, PFX_DIGSIG, "SignatureValue", digest_value);

    msg.security.encryption = Encryption::Signing;
    Ok(security)
}

fn already_signed(msg: &SoapMessage, header: NodeId) -> Option<NodeId> {
    let security = msg.doc.find_child(header, "Security")?;
    let signature = msg.doc.find_child(security, "Signature")?;
    let signature_value = msg.doc.find_child(signature, "SignatureValue")?;
    if msg.doc.get(signature_value).value.is_empty() { None } else { Some(security) }
}

/// `EncryptBody` (spec.md §4.7 step 5): replaces the body's children with
/// `xenc:EncryptionData/ds:CypherData/ds:CypherValue` carrying the
/// AES-encrypted, Base64-encoded old body.
pub fn encrypt_body(msg: &mut SoapMessage, password: &str) -> Result<(), SoapError> {
    let body = msg.body.ok_or(SoapError::NoHeaderElement)?;
    let old_body_xml = canonical_form(&msg.doc, body);
    let cipher_b64 = wsfab_codec::Codec::encrypt(password, &old_body_xml)?;

    msg.doc.get_mut(body).children.clear();
    let enc_data = msg.doc.new_element(PFX_XMLENC, "EncryptionData");
    msg.doc.append_child(body, enc_data);
    let cipher_data = msg.doc.new_element(PFX_DIGSIG, "CypherData");
    msg.doc.append_child(enc_data, cipher_data);
    msg.doc.add_element(cipher_data, PFX_DIGSIG, "CypherValue", cipher_b64);

    msg.parameter_object = None;
    msg.encrypted_as = Some(EncryptedAs::Body);
    msg.security.encryption = Encryption::Body;
    Ok(())
}

/// `EncryptMessage` (spec.md §4.7 step 5): wraps the whole serialized XML
/// in an `<Envelope><xenc:EncryptionData>…` shell, discarding the previous
/// header/body structure entirely.
pub fn encrypt_message(msg: &mut SoapMessage, password: &str) -> Result<(), SoapError> {
    let serialized = wsfab_xml::print_string(&msg.doc);
    let cipher_b64 = wsfab_codec::Codec::encrypt(password, &serialized)?;

    let mut doc = wsfab_xml::XmlMessage::new();
    let root = doc.new_element("s", "Envelope");
    doc.set_root(root);
    doc.set_attribute(root, format!("xmlns:{PFX_XMLENC}"), NS_XMLENC);
    let enc_data = doc.new_element(PFX_XMLENC, "EncryptionData");
    doc.append_child(root, enc_data);
    let cipher_data = doc.new_element(PFX_DIGSIG, "CypherData");
    doc.append_child(enc_data, cipher_data);
    doc.add_element(cipher_data, PFX_DIGSIG, "CypherValue", cipher_b64);

    msg.doc = doc;
    msg.header = None;
    msg.body = msg.doc.root;
    msg.parameter_object = None;
    msg.encrypted_as = Some(EncryptedAs::Message);
    msg.security.encryption = Encryption::Message;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::SoapMessage;

    #[test]
    fn set_soap_envelope_builds_action_header_and_parameter_object() {
        let mut msg = SoapMessage { soap_version: SoapVersion::V11, namespace: "urn:test".into(), ..Default::default() };
        msg.soap_action = Some("DoThing".into());
        set_soap_envelope(&mut msg);

        let header = msg.header.unwrap();
        let action = msg.doc.find_child(header, "Action").unwrap();
        assert_eq!(msg.doc.get(action).value, "urn:test/DoThing");
        let param = msg.parameter_object.unwrap();
        assert_eq!(msg.doc.get(param).name, "DoThing");
        assert_eq!(msg.doc.get_attribute(param, "xmlns"), Some("urn:test"));
    }

    #[test]
    fn reliable_header_carries_sequence_and_fallback_ack_range() {
        let mut msg = SoapMessage {
            soap_version: SoapVersion::V11,
            namespace: "urn:test".into(),
            ..Default::default()
        };
        msg.soap_action = Some("DoThing".into());
        msg.reliable.reliable = true;
        msg.reliable.client_msg_number = 3;
        msg.reliable.server_msg_number = 7;
        set_soap_envelope(&mut msg);

        let header = msg.header.unwrap();
        let ack = msg.doc.find_child(header, "SequenceAcknowledgement").unwrap();
        let range = msg.doc.find_child(ack, "AcknowledgementRange").unwrap();
        assert_eq!(msg.doc.get_attribute(range, "Lower"), Some("1"));
        assert_eq!(msg.doc.get_attribute(range, "Upper"), Some("7"));

        let sequence = msg.doc.find_child(header, "Sequence").unwrap();
        let number = msg.doc.find_child(sequence, "MessageNumber").unwrap();
        assert_eq!(msg.doc.get(number).value, "3");
    }

    #[test]
    fn fault_present_skips_header_and_parameter_composition() {
        let mut msg = SoapMessage { soap_version: SoapVersion::V12, namespace: "urn:test".into(), ..Default::default() };
        msg.soap_action = Some("DoThing".into());
        msg.set_fault("Sender", "Arg", "Missing X", "field=x");
        set_soap_envelope(&mut msg);

        assert!(msg.parameter_object.is_none());
        let body = msg.body.unwrap();
        assert!(msg.doc.find_child(body, "Fault").is_some());
    }

    #[test]
    fn signing_requires_soap_12() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        assert!(matches!(
            add_to_header_signing(&mut msg, "alice", "pw"),
            Err(SoapError::SecurityRequiresSoap12)
        ));
    }

    #[test]
    fn signing_twice_does_not_rewrite_an_existing_signature_value() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V12, None);
        msg.set_parameter("x", "1").unwrap();
        add_to_header_signing(&mut msg, "alice", "pw").unwrap();
        let header = msg.header.unwrap();
        let security = msg.doc.find_child(header, "Security").unwrap();
        let signature = msg.doc.find_child(security, "Signature").unwrap();
        let value_node = msg.doc.find_child(signature, "SignatureValue").unwrap();
        let first_value = msg.doc.get(value_node).value.clone();

        msg.set_parameter("x", "2").unwrap();
        add_to_header_signing(&mut msg, "alice", "pw").unwrap();
        let value_node_again = msg.doc.find_child(signature, "SignatureValue").unwrap();
        assert_eq!(msg.doc.get(value_node_again).value, first_value);
    }

    #[test]
    fn encrypt_body_replaces_children_with_a_lone_encryption_data_node() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V12, None);
        msg.set_parameter("x", "1").unwrap();
        encrypt_body(&mut msg, "pw").unwrap();

        let body = msg.body.unwrap();
        assert_eq!(msg.doc.get(body).children.len(), 1);
        assert_eq!(msg.doc.get(msg.doc.get(body).children[0]).name, "EncryptionData");
    }

    #[test]
    fn encrypt_message_wraps_the_whole_document_in_a_shell() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V12, None);
        msg.set_parameter("x", "1").unwrap();
        encrypt_message(&mut msg, "pw").unwrap();

        let root = msg.doc.root.unwrap();
        assert_eq!(msg.doc.get(root).children.len(), 1);
        assert_eq!(msg.doc.get(msg.doc.get(root).children[0]).name, "EncryptionData");
    }
}
