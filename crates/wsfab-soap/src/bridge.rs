//! JSON<->XML bridge (spec.md §4.7): SOAP->JSON walks the parameter object
//! ("an element whose children all share a name is an array; otherwise an
//! object; no children is a string, or null if empty"); JSON->SOAP is the
//! inverse ("object pair becomes an element; array becomes repeated
//! siblings with the array's owning name; scalars become element text").

use wsfab_json::{Json, JsonPair};
use wsfab_xml::{NodeId, XmlMessage};

use crate::message::SoapMessage;

/// Converts `value` into XML under `msg`'s parameter object, creating one
/// via `SetSoapBody` if the message doesn't have one yet.
pub fn json_to_soap(value: &Json, msg: &mut SoapMessage) {
    let Ok(parent) = msg.require_parameter_object() else { return };
    match value {
        Json::Object(pairs) => {
            for pair in pairs {
                write_named(&pair.name, &pair.value, &mut msg.doc, parent);
            }
        }
        Json::Array(items) => {
            for item in items {
                write_named("item", item, &mut msg.doc, parent);
            }
        }
        other => msg.doc.get_mut(parent).value = other.scalar_text(),
    }
}

/// Converts the subtree rooted at `node` into a `Json` value.
pub fn soap_to_json(doc: &XmlMessage, node: NodeId) -> Json {
    let element = doc.get(node);
    if element.children.is_empty() {
        return if element.value.is_empty() { Json::Null } else { Json::String(element.value.clone()) };
    }

    let first_name = doc.get(element.children[0]).name.clone();
    let all_same_name = element.children.iter().all(|&c| doc.get(c).name == first_name);

    if all_same_name {
        Json::Array(element.children.iter().map(|&c| soap_to_json(doc, c)).collect())
    } else {
        Json::Object(
            element
                .children
                .iter()
                .map(|&c| JsonPair { name: doc.get(c).name.clone(), value: soap_to_json(doc, c) })
                .collect(),
        )
    }
}

/// Converts a whole `SoapMessage`'s parameter object to `Json`; `Json::None`
/// if the message has no parameter object (e.g. a fault or an
/// un-decomposed message).
pub fn soap_message_to_json(msg: &SoapMessage) -> Json {
    match msg.parameter_object {
        Some(node) => soap_to_json(&msg.doc, node),
        None => Json::None,
    }
}

/// Writes `value` as a child named `name` of `parent`; an array writes one
/// sibling per item, all named `name` ("the array's owning name").
fn write_named(name: &str, value: &Json, doc: &mut XmlMessage, parent: NodeId) {
    match value {
        Json::Array(items) => {
            for item in items {
                let child = doc.new_element("", name);
                doc.append_child(parent, child);
                write_into(item, doc, child);
            }
        }
        _ => {
            let child = doc.new_element("", name);
            doc.append_child(parent, child);
            write_into(value, doc, child);
        }
    }
}

fn write_into(value: &Json, doc: &mut XmlMessage, node: NodeId) {
    match value {
        Json::Object(pairs) => {
            for pair in pairs {
                write_named(&pair.name, &pair.value, doc, node);
            }
        }
        Json::Array(items) => {
            for item in items {
                write_into(item, doc, node);
            }
        }
        other => doc.get_mut(node).value = other.scalar_text(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::SoapVersion;

    #[test]
    fn json_object_becomes_an_element_per_pair() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        let json = Json::Object(vec![
            JsonPair { name: "x".into(), value: Json::Int(1) },
            JsonPair { name: "y".into(), value: Json::String("hi".into()) },
        ]);
        json_to_soap(&json, &mut msg);

        let parent = msg.parameter_object.unwrap();
        let x = msg.doc.find_child(parent, "x").unwrap();
        assert_eq!(msg.doc.get(x).value, "1");
        let y = msg.doc.find_child(parent, "y").unwrap();
        assert_eq!(msg.doc.get(y).value, "hi");
    }

    #[test]
    fn json_array_becomes_repeated_siblings() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        let json = Json::Object(vec![JsonPair {
            name: "items".into(),
            value: Json::Array(vec![Json::Int(1), Json::Int(2), Json::Int(3)]),
        }]);
        json_to_soap(&json, &mut msg);

        let parent = msg.parameter_object.unwrap();
        assert_eq!(msg.doc.find_children(parent, "items").len(), 3);
    }

    #[test]
    fn soap_round_trips_object_shape_back_to_json() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        msg.set_parameter("x", "1").unwrap();
        msg.set_parameter("y", "hi").unwrap();

        let json = soap_message_to_json(&msg);
        assert_eq!(json.get("x").and_then(Json::as_str), Some("1"));
        assert_eq!(json.get("y").and_then(Json::as_str), Some("hi"));
    }

    #[test]
    fn soap_children_sharing_a_name_become_an_array() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        msg.add_element("item", "1").unwrap();
        msg.add_element("item", "2").unwrap();

        let json = soap_message_to_json(&msg);
        assert_eq!(json.as_array().map(|items| items.len()), Some(2));
    }

    #[test]
    fn leaf_with_no_value_becomes_null() {
        let mut msg = SoapMessage::outgoing("urn:test", "DoThing", SoapVersion::V11, None);
        msg.set_parameter("empty", "").unwrap();

        let json = soap_message_to_json(&msg);
        assert_eq!(json.get("empty"), Some(&Json::Null));
    }
}
