//! Canonical form (spec.md §9 glossary: "the element printed with a fixed
//! attribute order and escape policy, used as the input to digest and
//! sign"). Deliberately independent of `wsfab_xml::print_string`, which
//! preserves document order and pretty-prints for the wire.

use wsfab_charset::entity::encode_xml_string;
use wsfab_xml::{NodeId, XmlMessage};

/// Renders the subtree rooted at `node` with attributes sorted
/// lexicographically by name and no inter-element whitespace.
pub fn canonical_form(doc: &XmlMessage, node: NodeId) -> String {
    let mut out = String::new();
    write_element(doc, node, &mut out);
    out
}

fn write_element(doc: &XmlMessage, id: NodeId, out: &mut String) {
    let element = doc.get(id);
    let qname = element.qualified_name();

    out.push('<');
    out.push_str(&qname);
    let mut attrs = element.attributes.clone();
    attrs.sort_by(|a, b| a.name.cmp(&b.name));
    for attr in &attrs {
        out.push(' ');
        out.push_str(&attr.name);
        out.push_str("=\"");
        out.push_str(&encode_xml_string(&attr.value));
        out.push('"');
    }
    out.push('>');
    out.push_str(&encode_xml_string(&element.value));
    for &child in &element.children {
        write_element(doc, child, out);
    }
    out.push_str("</");
    out.push_str(&qname);
    out.push('>');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_order_is_sorted_lexicographically() {
        let mut doc = XmlMessage::new();
        let root = doc.new_element("", "root");
        doc.set_root(root);
        doc.set_attribute(root, "zebra", "1");
        doc.set_attribute(root, "alpha", "2");
        let text = canonical_form(&doc, root);
        assert!(text.find("alpha").unwrap() < text.find("zebra").unwrap());
    }

    #[test]
    fn canonical_form_is_stable_across_attribute_insertion_order() {
        let mut a = XmlMessage::new();
        let ra = a.new_element("", "root");
        a.set_root(ra);
        a.set_attribute(ra, "alpha", "2");
        a.set_attribute(ra, "zebra", "1");

        let mut b = XmlMessage::new();
        let rb = b.new_element("", "root");
        b.set_root(rb);
        b.set_attribute(rb, "zebra", "1");
        b.set_attribute(rb, "alpha", "2");

        assert_eq!(canonical_form(&a, ra), canonical_form(&b, rb));
    }
}
