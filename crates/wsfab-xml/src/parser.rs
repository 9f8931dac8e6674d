//! Single-pass, recursive-descent, pointer-advancing parser (C6, spec.md
//! §4.5). Parses from a fully materialized buffer — no streaming/chunked
//! parsing (spec.md §1 Non-goals).
//!
//! Robust by contract: on any error the parser fills `XmlMessage::error`
//! and stops; it never panics, and the partial tree built so far stays
//! inspectable (spec.md §4.5, last paragraph).

use wsfab_charset::bom::{self, BomKind};
use wsfab_charset::entity::decode_xml_string;

use crate::error::XmlErrorKind;
use crate::model::{NodeId, WhitespaceMode, XdtKind, XmlMessage};
use crate::restriction::{apply_white_space, WhiteSpaceFacet};

/// Parses `buffer` with `WhitespaceMode::Preserve`.
pub fn parse(buffer: &[u8]) -> XmlMessage {
    parse_with_mode(buffer, WhitespaceMode::Preserve)
}

/// Parses `buffer` under the given whitespace policy.
#[tracing::instrument(skip(buffer))]
pub fn parse_with_mode(buffer: &[u8], whitespace_mode: WhitespaceMode) -> XmlMessage {
    let mut msg = XmlMessage::new();
    msg.whitespace_mode = whitespace_mode;

    if buffer.is_empty() {
        msg.error.set(XmlErrorKind::EmptyXml, "empty buffer", None);
        return msg;
    }

    let (rest, send_bom) = match bom::detect(buffer) {
        Some((BomKind::Utf8, skip)) => (&buffer[skip..], true),
        Some((other, _)) => {
            msg.error.set(XmlErrorKind::IncompatibleEncoding, format!("{other:?} is not UTF-8"), None);
            return msg;
        }
        None => (buffer, false),
    };
    msg.send_bom = send_bom;

    let text = match std::str::from_utf8(rest) {
        Ok(t) => t,
        Err(e) => {
            msg.error.set(XmlErrorKind::NotAnXmlMessage, format!("invalid UTF-8: {e}"), None);
            return msg;
        }
    };

    let mut scan = Scanner::new(text);
    scan.skip_whitespace();
    if scan.eof() {
        msg.error.set(XmlErrorKind::EmptyXml, "document contains only whitespace", None);
        return msg;
    }

    if scan.peek_str("<?xml") {
        if let Err(()) = parse_declaration(&mut scan, &mut msg) {
            return msg;
        }
    }

    loop {
        scan.skip_whitespace();
        if scan.peek_str("<!--") {
            if skip_comment(&mut scan).is_err() {
                msg.error.set(XmlErrorKind::MissingClosing, "unterminated comment", None);
                return msg;
            }
        } else if scan.peek_str("<![CDATA[") {
            break;
        } else if scan.peek_str("<!") {
            skip_dtd(&mut scan);
            msg.error.set(XmlErrorKind::DtdNotSupported, "DTD sections are skipped, not validated", None);
        } else if scan.peek_str("<?") {
            skip_pi(&mut scan);
        } else {
            break;
        }
    }

    scan.skip_whitespace();
    if scan.eof() || scan.peek() != Some('<') {
        msg.error.set(XmlErrorKind::NoRootElement, "no root element found", None);
        return msg;
    }

    match parse_element(&mut scan, &mut msg) {
        Ok(root) => msg.set_root(root),
        Err(()) => return msg,
    }

    scan.skip_whitespace();
    if !scan.eof() {
        msg.error.set(XmlErrorKind::ExtraText, "content found after the root element", None);
    }

    msg.condensed = scan.ws_runs == 0;
    msg
}

struct Scanner<'a> {
    text: &'a str,
    pos: usize,
    ws_runs: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: 0, ws_runs: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_str(&self, needle: &str) -> bool {
        self.rest().starts_with(needle)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn consume_str(&mut self, needle: &str) -> bool {
        if self.peek_str(needle) {
            self.pos += needle.len();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
        &self.text[start..self.pos]
    }

    fn read_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if pred(c) {
                self.bump();
            } else {
                break;
            }
        }
        &self.text[start..self.pos]
    }

    fn find(&self, needle: &str) -> Option<usize> {
        self.rest().find(needle)
    }
}

fn is_name_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':' || (c as u32) >= 128
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-') || (c as u32) >= 128
}

fn parse_declaration(scan: &mut Scanner<'_>, msg: &mut XmlMessage) -> Result<(), ()> {
    scan.consume_str("<?xml");
    loop {
        scan.skip_whitespace();
        if scan.consume_str("?>") {
            return Ok(());
        }
        if scan.eof() {
            msg.error.set(XmlErrorKind::MissingClosing, "unterminated XML declaration", None);
            return Err(());
        }
        let name = scan.read_while(is_name_char);
        scan.skip_whitespace();
        if !scan.consume_str("=") {
            msg.error.set(XmlErrorKind::MissingToken, "expected '=' in XML declaration", None);
            return Err(());
        }
        scan.skip_whitespace();
        let value = match read_quoted(scan) {
            Some(v) => v,
            None => {
                msg.error.set(XmlErrorKind::MissingToken, "expected a quoted declaration value", None);
                return Err(());
            }
        };
        match name {
            "version" => msg.version = value.to_string(),
            "standalone" => msg.standalone = value.eq_ignore_ascii_case("yes"),
            "encoding" => {}
            _ => {
                msg.error.set(XmlErrorKind::HeaderAttribs, format!("unknown declaration attribute '{name}'"), None);
                return Err(());
            }
        }
    }
}

fn read_quoted<'a>(scan: &mut Scanner<'a>) -> Option<&'a str> {
    let delim = match scan.peek() {
        Some(c @ ('"' | '\'')) => c,
        _ => return None,
    };
    scan.bump();
    let start = scan.pos;
    loop {
        match scan.peek() {
            Some(c) if c == delim => {
                let value = &scan.text[start..scan.pos];
                scan.bump();
                return Some(value);
            }
            Some(_) => {
                scan.bump();
            }
            None => return None,
        }
    }
}

fn skip_comment(scan: &mut Scanner<'_>) -> Result<(), ()> {
    scan.consume_str("<!--");
    match scan.find("-->") {
        Some(offset) => {
            scan.pos += offset + 3;
            Ok(())
        }
        None => Err(()),
    }
}

fn skip_dtd(scan: &mut Scanner<'_>) {
    scan.consume_str("<!");
    let mut depth = 1usize;
    while depth > 0 {
        match scan.bump() {
            Some('<') => depth += 1,
            Some('>') => depth -= 1,
            Some(_) => {}
            None => return,
        }
    }
}

fn skip_pi(scan: &mut Scanner<'_>) {
    scan.consume_str("<?");
    if let Some(offset) = scan.find("?>") {
        scan.pos += offset + 2;
    } else {
        scan.pos = scan.text.len();
    }
}

fn parse_element(scan: &mut Scanner<'_>, msg: &mut XmlMessage) -> Result<NodeId, ()> {
    if !scan.consume_str("<") {
        msg.error.set(XmlErrorKind::MissingElement, "expected an element start tag", None);
        return Err(());
    }

    if !scan.peek().is_some_and(is_name_start) {
        msg.error.set(XmlErrorKind::EmptyCommand, "element name is empty or invalid", None);
        return Err(());
    }
    let qname = scan.read_while(is_name_char);
    let (namespace, name) = match qname.split_once(':') {
        Some((ns, n)) => (ns.to_string(), n.to_string()),
        None => (String::new(), qname.to_string()),
    };

    let id = msg.new_element(namespace, name);

    loop {
        let consumed_ws = !scan.skip_whitespace().is_empty();
        if scan.peek_str("/>") || scan.peek_str(">") {
            break;
        }
        if !consumed_ws {
            msg.error.set(XmlErrorKind::MissingToken, "expected whitespace before an attribute", None);
            return Err(());
        }
        if !scan.peek().is_some_and(is_name_start) {
            break;
        }
        let attr_name = scan.read_while(is_name_char).to_string();
        scan.skip_whitespace();
        if !scan.consume_str("=") {
            msg.error.set(XmlErrorKind::MissingToken, format!("expected '=' after attribute '{attr_name}'"), None);
            return Err(());
        }
        scan.skip_whitespace();
        let attr_value = match read_quoted(scan) {
            Some(v) => decode_xml_string(v),
            None => {
                msg.error.set(XmlErrorKind::MissingToken, format!("expected a quoted value for attribute '{attr_name}'"), None);
                return Err(());
            }
        };
        msg.set_attribute(id, attr_name, attr_value);
    }

    if scan.consume_str("/>") {
        return Ok(id);
    }
    if !scan.consume_str(">") {
        msg.error.set(XmlErrorKind::MissingClosing, "expected '>' to close the start tag", None);
        return Err(());
    }

    let mut text_value = String::new();
    let mut saw_cdata_only = false;
    let mut saw_children = false;
    let mut saw_text = false;

    loop {
        if scan.eof() {
            msg.error.set(XmlErrorKind::MissingEndTag, "reached end of document inside an element", None);
            return Err(());
        }
        if scan.peek_str("<![CDATA[") {
            scan.consume_str("<![CDATA[");
            let offset = match scan.find("]]>") {
                Some(o) => o,
                None => {
                    msg.error.set(XmlErrorKind::MissingClosing, "unterminated CDATA section", None);
                    return Err(());
                }
            };
            text_value.push_str(&scan.text[scan.pos..scan.pos + offset]);
            scan.pos += offset + 3;
            saw_cdata_only = !saw_children && !saw_text;
            saw_text = true;
            continue;
        }
        if scan.peek_str("<!--") {
            if skip_comment(scan).is_err() {
                msg.error.set(XmlErrorKind::MissingClosing, "unterminated comment", None);
                return Err(());
            }
            continue;
        }
        if scan.peek_str("</") {
            break;
        }
        if scan.peek_str("<") {
            saw_children = true;
            saw_cdata_only = false;
            let child = parse_element(scan, msg)?;
            msg.append_child(id, child);
            continue;
        }
        let raw = scan.read_while(|c| c != '<');
        if !raw.is_empty() {
            if raw.chars().all(char::is_whitespace) {
                scan.ws_runs += 1;
            }
            saw_text = true;
            saw_cdata_only = false;
            let decoded = decode_xml_string(raw);
            let processed = match msg.whitespace_mode {
                WhitespaceMode::Preserve => decoded,
                WhitespaceMode::Collapse => apply_white_space(WhiteSpaceFacet::Collapse, &decoded),
            };
            text_value.push_str(&processed);
        } else if scan.eof() {
            continue;
        } else {
            // Shouldn't happen: guards against an infinite loop on stray input.
            scan.bump();
        }
    }

    scan.consume_str("</");
    let end_qname = scan.read_while(is_name_char);
    let expected = {
        let data = msg.get(id);
        if data.namespace.is_empty() { data.name.clone() } else { format!("{}:{}", data.namespace, data.name) }
    };
    if end_qname != expected {
        msg.error.set(
            XmlErrorKind::MissingEndTag,
            format!("end tag '</{end_qname}>' does not match start tag '<{expected}>'"),
            Some(id),
        );
        return Err(());
    }
    scan.skip_whitespace();
    if !scan.consume_str(">") {
        msg.error.set(XmlErrorKind::MissingClosing, "expected '>' to close the end tag", None);
        return Err(());
    }

    if !saw_children {
        let element = msg.get_mut(id);
        element.value = text_value;
        if saw_cdata_only {
            element.data_type.kind = XdtKind::Cdata;
        }
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::XmlDataType;

    #[test]
    fn parses_simple_element_with_attribute() {
        let msg = parse(br#"<root attr="v">hello</root>"#);
        assert!(!msg.error.is_error(), "{:?}", msg.error);
        let root = msg.root.unwrap();
        assert_eq!(msg.get(root).name, "root");
        assert_eq!(msg.get(root).value, "hello");
        assert_eq!(msg.get_attribute(root, "attr"), Some("v"));
    }

    #[test]
    fn parses_nested_elements_and_namespaces() {
        let msg = parse(br#"<s:Envelope><s:Body><m:op>x</m:op></s:Body></s:Envelope>"#);
        assert!(!msg.error.is_error(), "{:?}", msg.error);
        let root = msg.root.unwrap();
        assert_eq!(msg.get(root).namespace, "s");
        assert_eq!(msg.get(root).name, "Envelope");
        let body = msg.find_child(root, "Body").unwrap();
        let op = msg.find_child(body, "op").unwrap();
        assert_eq!(msg.get(op).namespace, "m");
        assert_eq!(msg.get(op).value, "x");
    }

    #[test]
    fn self_closing_element_has_empty_value() {
        let msg = parse(br#"<root><empty/></root>"#);
        assert!(!msg.error.is_error());
        let root = msg.root.unwrap();
        let empty = msg.find_child(root, "empty").unwrap();
        assert_eq!(msg.get(empty).value, "");
    }

    #[test]
    fn cdata_section_sets_element_to_cdata_type_verbatim() {
        let msg = parse(br#"<root><![CDATA[<raw> & stuff]]></root>"#);
        assert!(!msg.error.is_error());
        let root = msg.root.unwrap();
        assert_eq!(msg.get(root).data_type.kind, XdtKind::Cdata);
        assert_eq!(msg.get(root).value, "<raw> & stuff");
    }

    #[test]
    fn decodes_entities_in_text_and_attributes() {
        let msg = parse(br#"<root attr="a &amp; b">x &lt; y</root>"#);
        assert!(!msg.error.is_error());
        let root = msg.root.unwrap();
        assert_eq!(msg.get(root).value, "x < y");
        assert_eq!(msg.get_attribute(root, "attr"), Some("a & b"));
    }

    #[test]
    fn rejects_utf16_bom() {
        let mut buf = vec![0xFF, 0xFE];
        buf.extend_from_slice(b"<a/>");
        let msg = parse(&buf);
        assert_eq!(msg.error.kind, XmlErrorKind::IncompatibleEncoding);
    }

    #[test]
    fn accepts_utf8_bom_and_records_send_bom() {
        let mut buf = vec![0xEF, 0xBB, 0xBF];
        buf.extend_from_slice(b"<a/>");
        let msg = parse(&buf);
        assert!(!msg.error.is_error());
        assert!(msg.send_bom);
    }

    #[test]
    fn empty_buffer_is_an_error() {
        let msg = parse(b"");
        assert_eq!(msg.error.kind, XmlErrorKind::EmptyXml);
    }

    #[test]
    fn missing_root_is_an_error() {
        let msg = parse(b"<?xml version=\"1.0\"?>   ");
        assert_eq!(msg.error.kind, XmlErrorKind::NoRootElement);
    }

    #[test]
    fn mismatched_end_tag_is_an_error() {
        let msg = parse(b"<a></b>");
        assert_eq!(msg.error.kind, XmlErrorKind::MissingEndTag);
    }

    #[test]
    fn extra_text_after_root_is_an_error() {
        let msg = parse(b"<a/>stray");
        assert_eq!(msg.error.kind, XmlErrorKind::ExtraText);
    }

    #[test]
    fn dtd_is_skipped_as_a_warning_not_fatal() {
        let msg = parse(b"<!DOCTYPE root><root/>");
        assert_eq!(msg.error.kind, XmlErrorKind::DtdNotSupported);
        assert!(msg.root.is_some());
    }

    #[test]
    fn declaration_with_unknown_attribute_is_an_error() {
        let msg = parse(br#"<?xml version="1.0" bogus="x"?><a/>"#);
        assert_eq!(msg.error.kind, XmlErrorKind::HeaderAttribs);
    }
}
