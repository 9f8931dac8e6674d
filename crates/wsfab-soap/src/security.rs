//! SOAPSecurity (C11, spec.md §4.8): UsernameToken Profile 1.1 plus the
//! `Encryption` mode enum spec.md §3.3 attaches to `SoapMessage`.
//!
//! Grounded in `examples/original_source/BaseLibrary/SOAPSecurity.cpp`.

use time::OffsetDateTime;
use wsfab_codec::{CodecError, DigestAlgorithm};
use wsfab_xml::{NodeId, XmlMessage};

use crate::version::{NS_WSSE, NS_WSU, PFX_WSSE, PFX_WSU};

/// WS-Security encryption mode (spec.md §3.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encryption {
    #[default]
    Plain,
    Signing,
    Body,
    Message,
}

/// Freshness window bounds (spec.md §4.8): a caller-supplied freshness is
/// clamped into `[SECURITY_MINTIME, SECURITY_MAXTIME]` seconds.
pub const SECURITY_MINTIME: i64 = 1;
pub const SECURITY_MAXTIME: i64 = 600;

/// `SoapMessage`'s WS-Security state (spec.md §3.3): `(encryption,
/// signingMethod, encUser, encPassword, tokenNonce, tokenCreated)`.
#[derive(Debug, Clone, Default)]
pub struct Security {
    pub encryption: Encryption,
    pub signing_method: DigestAlgorithm,
    pub enc_user: Option<String>,
    pub enc_password: Option<String>,
    pub token_nonce: Option<String>,
    pub token_created: Option<String>,
}

/// `PasswordDigest = base64(SHA1(raw_nonce || created || cleartext_password))`
/// (spec.md §4.8, byte-exact per §8 scenario 4).
pub fn compute_password_digest(nonce_b64: &str, created: &str, password: &str) -> String {
    let mut buf = wsfab_codec::base64::decode(nonce_b64);
    buf.extend_from_slice(created.as_bytes());
    buf.extend_from_slice(password.as_bytes());
    let digest = wsfab_codec::digest::digest_bytes(DigestAlgorithm::Sha1, &buf);
    wsfab_codec::base64::encode(&digest)
}

/// `Nonce = base64(random GUID-without-hyphens)` (spec.md §4.8).
pub fn generate_nonce() -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    wsfab_codec::base64::encode(raw.as_bytes())
}

/// `Created = UTC timestamp + "Z"` (spec.md §4.8).
pub fn now_created() -> String {
    format_created(OffsetDateTime::now_utc())
}

const CREATED_FORMAT: &[time::format_description::BorrowedFormatItem<'_>] =
    time::macros::format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

pub fn format_created(ts: OffsetDateTime) -> String {
    format!("{}Z", ts.to_offset(time::UtcOffset::UTC).format(CREATED_FORMAT).unwrap_or_default())
}

pub fn parse_created(text: &str) -> Option<OffsetDateTime> {
    let trimmed = text.strip_suffix('Z').unwrap_or(text);
    time::PrimitiveDateTime::parse(trimmed, CREATED_FORMAT)
        .ok()
        .map(|dt| dt.assume_utc())
}

/// Outgoing `SetSecurity`: inserts `wsse:Security` as the first header
/// child (spec.md §4.8). Requires SOAP 1.2 (enforced by the caller via
/// `SoapError::SecurityRequiresSoap12`).
pub fn set_security(
    doc: &mut XmlMessage,
    header: NodeId,
    username: &str,
    password: &str,
    digest: bool,
) -> NodeId {
    doc.set_attribute(doc.root.unwrap_or(header), format!("xmlns:{PFX_WSSE}"), NS_WSSE);

    let security = doc.new_element(PFX_WSSE, "Security");
    // Insert as first child rather than appended last.
    doc.append_child(header, security);
    {
        let mut children = doc.get(header).children.clone();
        if let Some(pos) = children.iter().position(|&c| c == security) {
            children.remove(pos);
            children.insert(0, security);
        }
        doc.get_mut(header).children = children;
    }

    let token = doc.new_element(PFX_WSSE, "UsernameToken");
    doc.append_child(security, token);
    doc.add_element(token, PFX_WSSE, "Username", username);

    if digest {
        let nonce = generate_nonce();
        let created = now_created();
        let digested = compute_password_digest(&nonce, &created, password);
        let pw = doc.add_element(token, PFX_WSSE, "Password", digested);
        doc.set_attribute(pw, "Type", "#PasswordDigest");
        let nonce_node = doc.add_element(token, PFX_WSSE, "Nonce", nonce);
        doc.set_attribute(nonce_node, "EncodingType", "#Base64Binary");
        let created_node = doc.add_element(token, PFX_WSU, "Created", created);
        doc.set_attribute(created_node, format!("xmlns:{PFX_WSU}"), NS_WSU);
    } else {
        let pw = doc.add_element(token, PFX_WSSE, "Password", password);
        doc.set_attribute(pw, "Type", "#PasswordText");
    }
    security
}

/// Incoming `CheckSecurity`: returns `Some(username)` on success (or when
/// no `Security` element is present at all — spec.md §4.8: "absence of a
/// Security element is success"), `None` on any mismatch.
pub fn check_security(
    doc: &XmlMessage,
    header: NodeId,
    preset_username: Option<&str>,
    preset_password: Option<&str>,
    find_password: Option<&dyn Fn(&str) -> Option<String>>,
    freshness_seconds: i64,
    now: OffsetDateTime,
) -> Option<String> {
    let security = doc.find_child(header, "Security")?;
    let token = doc.find_child(security, "UsernameToken")?;
    let username = doc.find_child(token, "Username").map(|n| doc.get(n).value.clone())?;

    let expected_password = if preset_username.is_some_and(|u| u == username) {
        preset_password.map(str::to_string)
    } else {
        find_password.and_then(|f| f(&username))
    }?;

    let password_node = doc.find_child(token, "Password")?;
    let password_value = doc.get(password_node).value.clone();
    let is_digest = doc.get_attribute(password_node, "Type") == Some("#PasswordDigest");

    let nonce = doc.find_child(token, "Nonce").map(|n| doc.get(n).value.clone());
    let created = doc.find_child(token, "Created").map(|n| doc.get(n).value.clone());

    if is_digest || (nonce.is_some() && created.is_some()) {
        let nonce = nonce?;
        let created = created?;
        let expected_digest = compute_password_digest(&nonce, &created, &expected_password);
        if expected_digest != password_value {
            return None;
        }
        let window = freshness_seconds.clamp(SECURITY_MINTIME, SECURITY_MAXTIME);
        let created_ts = parse_created(&created)?;
        let delta = (now - created_ts).whole_seconds().abs();
        if delta > window {
            return None;
        }
    } else if password_value != expected_password {
        return None;
    }

    Some(username)
}

pub type PasswordLookupError = CodecError;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_digest_matches_spec_scenario_four() {
        let nonce = wsfab_codec::base64::encode(&[0u8; 32]);
        let digest = compute_password_digest(&nonce, "2024-01-01T00:00:00Z", "pw");
        let mut expected_input = vec![0u8; 32];
        expected_input.extend_from_slice(b"2024-01-01T00:00:00Z");
        expected_input.extend_from_slice(b"pw");
        let expected = wsfab_codec::base64::encode(&wsfab_codec::digest::digest_bytes(
            DigestAlgorithm::Sha1,
            &expected_input,
        ));
        assert_eq!(digest, expected);
    }

    #[test]
    fn set_then_check_security_round_trips_with_digest() {
        let mut doc = XmlMessage::new();
        let root = doc.new_element("s", "Envelope");
        doc.set_root(root);
        let header = doc.new_element("s", "Header");
        doc.append_child(root, header);

        set_security(&mut doc, header, "alice", "pw", true);

        let now = OffsetDateTime::now_utc();
        let result = check_security(&doc, header, Some("alice"), Some("pw"), None, 300, now);
        assert_eq!(result.as_deref(), Some("alice"));
    }

    #[test]
    fn check_security_rejects_wrong_password() {
        let mut doc = XmlMessage::new();
        let root = doc.new_element("s", "Envelope");
        doc.set_root(root);
        let header = doc.new_element("s", "Header");
        doc.append_child(root, header);
        set_security(&mut doc, header, "alice", "pw", true);

        let now = OffsetDateTime::now_utc();
        let result = check_security(&doc, header, Some("alice"), Some("wrong"), None, 300, now);
        assert_eq!(result, None);
    }

    #[test]
    fn check_security_is_success_when_no_security_element_present() {
        let mut doc = XmlMessage::new();
        let root = doc.new_element("s", "Envelope");
        doc.set_root(root);
        let header = doc.new_element("s", "Header");
        doc.append_child(root, header);
        assert!(
            check_security(&doc, header, Some("alice"), Some("pw"), None, 300, OffsetDateTime::now_utc())
                .is_none()
        );
    }

    #[test]
    fn freshness_window_rejects_just_outside_and_accepts_just_inside() {
        let mut doc = XmlMessage::new();
        let root = doc.new_element("s", "Envelope");
        doc.set_root(root);
        let header = doc.new_element("s", "Header");
        doc.append_child(root, header);

        let nonce = wsfab_codec::base64::encode(&[1u8; 16]);
        let now = OffsetDateTime::now_utc();
        let freshness = 60i64;

        // Created just outside the window: rejected.
        let stale_created = format_created(now - time::Duration::seconds(freshness + 1));
        let digest = compute_password_digest(&nonce, &stale_created, "pw");
        let security = doc.new_element("wsse", "Security");
        doc.append_child(header, security);
        let token = doc.new_element("wsse", "UsernameToken");
        doc.append_child(security, token);
        doc.add_element(token, "wsse", "Username", "alice");
        let pw = doc.add_element(token, "wsse", "Password", digest);
        doc.set_attribute(pw, "Type", "#PasswordDigest");
        doc.add_element(token, "wsse", "Nonce", nonce.clone());
        doc.add_element(token, "wsu", "Created", stale_created);

        assert_eq!(
            check_security(&doc, header, Some("alice"), Some("pw"), None, freshness, now),
            None
        );

        // Created just inside the window: accepted. Build a fresh doc.
        let mut doc2 = XmlMessage::new();
        let root2 = doc2.new_element("s", "Envelope");
        doc2.set_root(root2);
        let header2 = doc2.new_element("s", "Header");
        doc2.append_child(root2, header2);
        let fresh_created = format_created(now - time::Duration::seconds(freshness - 1));
        let digest2 = compute_password_digest(&nonce, &fresh_created, "pw");
        let security2 = doc2.new_element("wsse", "Security");
        doc2.append_child(header2, security2);
        let token2 = doc2.new_element("wsse", "UsernameToken");
        doc2.append_child(security2, token2);
        doc2.add_element(token2, "wsse", "Username", "alice");
        let pw2 = doc2.add_element(token2, "wsse", "Password", digest2);
        doc2.set_attribute(pw2, "Type", "#PasswordDigest");
        doc2.add_element(token2, "wsse", "Nonce", nonce);
        doc2.add_element(token2, "wsu", "Created", fresh_created);

        assert_eq!(
            check_security(&doc2, header2, Some("alice"), Some("pw"), None, freshness, now)
                .as_deref(),
            Some("alice")
        );
    }
}
