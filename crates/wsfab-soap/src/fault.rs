//! The SOAP Fault quadruple (spec.md §3.3, §4.7, §8 scenario 3): `(code,
//! actor, string, detail)`, serialized in the shape of the SOAP version
//! in force — 1.1's flat `faultcode/faultactor/faultstring/detail` versus
//! 1.2's nested `Code/Value` + `Subcode/Value`, `Reason/Text`, `Detail`.

use wsfab_xml::{NodeId, XmlMessage};

use crate::version::SoapVersion;

/// `(code, actor, string, detail)` (spec.md §3.3). `actor` is the SOAP
/// 1.1 `faultactor` / an informal analogue for 1.2 (which has no actor
/// concept as such; this port carries it through as the `Subcode/Value`
/// the way spec.md §8 scenario 3 shows).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fault {
    pub code: String,
    pub actor: String,
    pub string: String,
    pub detail: String,
}

impl Fault {
    pub fn new(
        code: impl Into<String>,
        actor: impl Into<String>,
        string: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self { code: code.into(), actor: actor.into(), string: string.into(), detail: detail.into() }
    }

    /// Serializes this fault as the sole child of `parent` (the SOAP
    /// Body), in the shape of `version`. Matches spec.md §8 scenario 3
    /// byte-for-byte for SOAP 1.2: bare (unprefixed) `Fault`/`Code`/
    /// `Value`/`Subcode`/`Reason`/`Text`/`Detail` element names.
    pub fn write(&self, doc: &mut XmlMessage, parent: NodeId, version: SoapVersion) -> NodeId {
        let fault = doc.new_element("", "Fault");
        doc.append_child(parent, fault);

        if version.is_at_least_12() {
            let code = doc.new_element("", "Code");
            doc.append_child(fault, code);
            doc.add_element(code, "", "Value", self.code.clone());
            if !self.actor.is_empty() {
                let subcode = doc.new_element("", "Subcode");
                doc.append_child(code, subcode);
                doc.add_element(subcode, "", "Value", self.actor.clone());
            }
            let reason = doc.new_element("", "Reason");
            doc.append_child(fault, reason);
            doc.add_element(reason, "", "Text", self.string.clone());
            if !self.detail.is_empty() {
                doc.add_element(fault, "", "Detail", self.detail.clone());
            }
        } else {
            doc.add_element(fault, "", "faultcode", self.code.clone());
            doc.add_element(fault, "", "faultactor", self.actor.clone());
            doc.add_element(fault, "", "faultstring", self.string.clone());
            doc.add_element(fault, "", "detail", self.detail.clone());
        }
        fault
    }

    /// Parses a fault back out of a `Fault` element, inverse of `write`.
    pub fn read(doc: &XmlMessage, fault: NodeId, version: SoapVersion) -> Self {
        if version.is_at_least_12() {
            let code = doc
                .find_child(fault, "Code")
                .and_then(|c| doc.find_child(c, "Value"))
                .map(|v| doc.get(v).value.clone())
                .unwrap_or_default();
            let actor = doc
                .find_child(fault, "Code")
                .and_then(|c| doc.find_child(c, "Subcode"))
                .and_then(|s| doc.find_child(s, "Value"))
                .map(|v| doc.get(v).value.clone())
                .unwrap_or_default();
            let string = doc
                .find_child(fault, "Reason")
                .and_then(|r| doc.find_child(r, "Text"))
                .map(|t| doc.get(t).value.clone())
                .unwrap_or_default();
            let detail = doc
                .find_child(fault, "Detail")
                .map(|d| doc.get(d).value.clone())
                .unwrap_or_default();
            Self { code, actor, string, detail }
        } else {
            let get = |name: &str| {
                doc.find_child(fault, name).map(|n| doc.get(n).value.clone()).unwrap_or_default()
            };
            Self {
                code: get("faultcode"),
                actor: get("faultactor"),
                string: get("faultstring"),
                detail: get("detail"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soap12_fault_matches_the_documented_shape() {
        let mut doc = XmlMessage::new();
        doc.condensed = true;
        let body = doc.new_element("s", "Body");
        doc.set_root(body);
        let fault = Fault::new("Sender", "Arg", "Missing X", "field=x");
        fault.write(&mut doc, body, SoapVersion::V12);

        let printed = wsfab_xml::print_string(&doc);
        assert!(printed.contains("<Code><Value>Sender</Value><Subcode><Value>Arg</Value></Subcode></Code>"));
        assert!(printed.contains("<Reason><Text>Missing X</Text></Reason>"));
        assert!(printed.contains("<Detail>field=x</Detail>"));
    }

    #[test]
    fn soap12_fault_round_trips_through_read() {
        let mut doc = XmlMessage::new();
        let body = doc.new_element("s", "Body");
        doc.set_root(body);
        let fault_id = Fault::new("Sender", "Arg", "Missing X", "field=x").write(&mut doc, body, SoapVersion::V12);
        let read_back = Fault::read(&doc, fault_id, SoapVersion::V12);
        assert_eq!(read_back, Fault::new("Sender", "Arg", "Missing X", "field=x"));
    }
}
