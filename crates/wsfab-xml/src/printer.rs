//! Serializes an `XmlMessage` back to text (the inverse of `parser`).
//!
//! Honors `encoding`/`condensed`/`whitespace_mode`/`send_bom`/
//! `print_restrictions`; entity-escapes every value and attribute per
//! spec.md §8's "Entity escape" testable property.

use wsfab_charset::bom::emit_utf8;
use wsfab_charset::entity::encode_xml_string;

use crate::model::{NodeId, XdtKind, XmlMessage};

/// Serializes `msg` to a `Vec<u8>`, prefixed with a UTF-8 BOM iff
/// `msg.send_bom` is set.
pub fn print_bytes(msg: &XmlMessage) -> Vec<u8> {
    let text = print_string(msg);
    let mut out = Vec::with_capacity(text.len() + 3);
    if msg.send_bom {
        out.extend_from_slice(&emit_utf8());
    }
    out.extend_from_slice(text.as_bytes());
    out
}

/// Serializes `msg` to a `String` (never includes the BOM — that is a byte
/// sequence, not valid UTF-8 text on its own terms).
pub fn print_string(msg: &XmlMessage) -> String {
    let mut out = String::new();
    if !msg.encoding_is_plain() {
        out.push_str(&format!(
            "<?xml version=\"{}\" encoding=\"{}\"{}?>",
            msg.version,
            msg.encoding.as_str(),
            if msg.standalone { " standalone=\"yes\"" } else { "" }
        ));
        if !msg.condensed {
            out.push('\n');
        }
    }
    if let Some(root) = msg.root {
        print_element(msg, root, &mut out, 0);
    }
    out
}

fn print_element(msg: &XmlMessage, id: NodeId, out: &mut String, depth: usize) {
    let element = msg.get(id);
    let qname = element.qualified_name();

    if !msg.condensed && depth > 0 {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }

    out.push('<');
    out.push_str(&qname);
    for attr in &element.attributes {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&encode_xml_string(&attr.value));
        out.push('"');
    }

    if msg.print_restrictions {
        if let Some(restriction) = &element.restriction {
            out.push_str(" restriction=\"");
            out.push_str(&encode_xml_string(restriction));
            out.push('"');
        }
    }

    if element.children.is_empty() && element.value.is_empty() {
        out.push_str("/>");
        return;
    }

    out.push('>');

    if element.data_type.kind == XdtKind::Cdata {
        out.push_str("<![CDATA[");
        out.push_str(&element.value);
        out.push_str("]]>");
    } else if !element.value.is_empty() {
        out.push_str(&encode_xml_string(&element.value));
    }

    for &child in &element.children {
        print_element(msg, child, out, depth + 1);
    }

    if !msg.condensed && !element.children.is_empty() {
        out.push('\n');
        out.push_str(&"  ".repeat(depth));
    }
    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

impl XmlMessage {
    fn encoding_is_plain(&self) -> bool {
        matches!(self.encoding, wsfab_charset::OutputEncoding::Plain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    #[test]
    fn preserve_round_trip_is_semantically_equal() {
        let original = parse(br#"<root attr="v"><child>text &amp; more</child></root>"#);
        assert!(!original.error.is_error());
        let printed = print_string(&original);
        let reparsed = parse(printed.as_bytes());
        assert!(!reparsed.error.is_error(), "{:?}", reparsed.error);

        let r1 = original.root.unwrap();
        let r2 = reparsed.root.unwrap();
        assert_eq!(original.get(r1).qualified_name(), reparsed.get(r2).qualified_name());
        let c1 = original.find_child(r1, "child").unwrap();
        let c2 = reparsed.find_child(r2, "child").unwrap();
        assert_eq!(original.get(c1).value, reparsed.get(c2).value);
        assert_eq!(original.get_attribute(r1, "attr"), reparsed.get_attribute(r2, "attr"));
    }

    #[test]
    fn entities_never_appear_bare_in_output() {
        let mut msg = XmlMessage::new();
        let root = msg.new_element("", "root");
        msg.set_root(root);
        msg.get_mut(root).value = "a & b < c > d ' e \" f".to_string();
        let printed = print_string(&msg);
        assert!(!printed.contains("& b"));
        assert!(printed.contains("&amp;"));
        assert!(printed.contains("&lt;"));
        assert!(printed.contains("&gt;"));
    }

    #[test]
    fn cdata_element_serializes_verbatim() {
        let msg = parse(b"<root><![CDATA[<raw>]]></root>");
        let printed = print_string(&msg);
        assert!(printed.contains("<![CDATA[<raw>]]>"));
    }

    #[test]
    fn self_closing_for_empty_leaf() {
        let mut msg = XmlMessage::new();
        let root = msg.new_element("", "root");
        msg.set_root(root);
        msg.add_element(root, "", "empty", "");
        let printed = print_string(&msg);
        assert!(printed.contains("<empty/>"));
    }
}
