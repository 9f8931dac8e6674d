//! Runtime message validation (spec.md §4.9, grounded in
//! `examples/original_source/Marlin/WSDLCache.cpp`'s `CheckIncomingMessage`/
//! `CheckOutgoingMessage`/`CheckMessage`/`CheckParameters`/
//! `CheckFieldDatatypeValues`).
//!
//! `wsfab_xml::XmlMessage` has no sibling pointer (only `parent`/
//! `children`, spec.md §9's arena redesign) so the lockstep walk the
//! original does via `GetElementSibling` is reconstructed here from
//! `parent_of` plus an index lookup in the parent's `children`.

use wsfab_soap::SoapMessage;
use wsfab_xml::{Cardinality, NodeId, Ordering, XmlMessage, XmlRestrictions};

use crate::cache::WsdlCache;

fn next_sibling(doc: &XmlMessage, node: NodeId) -> Option<NodeId> {
    let parent = doc.parent_of(node)?;
    let siblings = &doc.get(parent).children;
    let idx = siblings.iter().position(|&id| id == node)?;
    siblings.get(idx + 1).copied()
}

fn first_child(doc: &XmlMessage, node: NodeId) -> Option<NodeId> {
    doc.get(node).children.first().copied()
}

/// `CheckIncomingMessage`: looks the operation up by soapAction (exact
/// name match) and validates `msg` against its input template.
#[tracing::instrument(skip(cache, msg))]
pub fn check_incoming_message(cache: &WsdlCache, msg: &mut SoapMessage, check_field_values: bool) -> bool {
    let action = msg.soap_action.clone().unwrap_or_default();
    let Some(op) = cache.get_operation(&action) else {
        msg.set_fault("No operation", "Client", format!("No operation [{action}] found"), "While testing against WSDL");
        return false;
    };
    let input = op.input.clone();
    check_message(&input, msg, "Client", check_field_values, &cache.restrictions)
}

/// `CheckOutgoingMessage`: original does a linear scan comparing each
/// operation's output soapAction, since outgoing replies aren't keyed by
/// name the way incoming requests are.
#[tracing::instrument(skip(cache, msg))]
pub fn check_outgoing_message(cache: &WsdlCache, msg: &mut SoapMessage, check_field_values: bool) -> bool {
    if msg.fault.is_some() {
        return true;
    }
    let action = msg.soap_action.clone().unwrap_or_default();
    let template = cache.operations().values().find(|op| op.output.soap_action.as_deref() == Some(action.as_str()));
    let Some(op) = template else {
        msg.set_fault("No operation", "Server", format!("No operation [{action}] found"), "While testing against WSDL");
        return false;
    };
    let output = op.output.clone();
    check_message(&output, msg, "Server", check_field_values, &cache.restrictions)
}

/// `CheckMessage`: compares parameter-object names (either-empty passes),
/// then recurses into `check_parameters` only if both sides carry
/// parameters. The original's `p_orig == p_tocheck` self-reuse guard has
/// no Rust equivalent to check at runtime — the borrow checker already
/// forbids passing the same binding as both `&SoapMessage` and
/// `&mut SoapMessage`, so the invariant is structural rather than
/// checked here.
pub fn check_message(
    template: &SoapMessage,
    to_check: &mut SoapMessage,
    who: &str,
    check_field_values: bool,
    restrictions: &XmlRestrictions,
) -> bool {
    let template_name = template.parameter_object.map(|n| template.doc.get(n).name.clone());
    let check_name = to_check.parameter_object.map(|n| to_check.doc.get(n).name.clone());
    if let (Some(t), Some(c)) = (&template_name, &check_name) {
        if t != c {
            to_check.set_fault(
                "Request/Response object",
                who,
                format!("Request/Response object not the same. Expected '{t}' got '{c}'"),
                "While testing against WSDL",
            );
            return false;
        }
    }

    let template_param = template.parameter_object.filter(|&n| !template.doc.get(n).children.is_empty());
    let check_param = to_check.parameter_object.filter(|&n| !to_check.doc.get(n).children.is_empty());
    match (template_param, check_param) {
        (Some(org_base), Some(check_base)) => {
            check_parameters(&template.doc, org_base, to_check, check_base, who, check_field_values, restrictions)
        }
        _ => true,
    }
}

/// `CheckParameters`: first-match-wins, non-backtracking walk of the
/// template tree against the incoming tree (spec.md §9 Open Question #3,
/// preserved exactly as observed).
///
/// Deviates from the literal source in one place: the original's
/// `(orgName != chkName) || (mandatory && checkParam == nullptr)` guard
/// reads `chkName` as `""` whenever `checkParam` is null, which makes the
/// name comparison fail unconditionally on ANY absent field — optional or
/// not — contradicting both the `WSDL_Optional` naming and spec.md's own
/// prose ("Optional/ZeroOne permit absence"). This port implements the
/// documented, lenient behavior: a missing optional field is skipped, a
/// missing mandatory field (or a present-but-misnamed one) faults.
fn check_parameters(
    orig_doc: &XmlMessage,
    org_base: NodeId,
    check: &mut SoapMessage,
    check_base: NodeId,
    who: &str,
    check_field_values: bool,
    restrictions: &XmlRestrictions,
) -> bool {
    let mut org_param = first_child(orig_doc, org_base);
    let mut check_param = first_child(&check.doc, check_base);

    while let Some(org_id) = org_param {
        let org_el = orig_doc.get(org_id);
        let org_name = org_el.name.clone();
        let data_type = org_el.data_type;

        // Choice relaxes position matching: free-search the check base's
        // children for a sibling with this name instead of lockstep.
        if data_type.ordering == Some(Ordering::Choice) {
            check_param = check.doc.find_child(check_base, &org_name);
        }

        let names_match = check_param.map(|id| check.doc.get(id).name == org_name).unwrap_or(false);
        let mandatory = matches!(data_type.cardinality, Some(Cardinality::Mandatory) | Some(Cardinality::OnceOnly));

        if !names_match {
            if mandatory || check_param.is_some() {
                check.set_fault(
                    "Mandatory field not found",
                    who,
                    format!("Field '{org_name}' not found or in the wrong position"),
                    "While testing against WSDL",
                );
                return false;
            }
            // Optional/ZeroOne, genuinely absent: skip this template field,
            // leave `check_param` where it is, and try the next one.
            org_param = next_sibling(orig_doc, org_id);
            continue;
        }

        let check_id = check_param.expect("names_match implies Some");

        if check_field_values
            && !check_field_datatype_values(orig_doc, org_id, &check.doc, check_id, restrictions, who, check)
        {
            return false;
        }

        if !org_el.children.is_empty()
            && !check_parameters(orig_doc, org_id, check, check_id, who, check_field_values, restrictions)
        {
            return false;
        }

        // ZeroMany/OneMany: try to consume another same-named sibling on
        // the check side before advancing the template.
        if matches!(data_type.cardinality, Some(Cardinality::ZeroMany) | Some(Cardinality::OneMany)) {
            if let Some(next) = next_sibling(&check.doc, check_id) {
                if check.doc.get(next).name == org_name {
                    check_param = Some(next);
                    continue;
                }
            }
        }

        org_param = next_sibling(orig_doc, org_id);
        check_param = check_param.and_then(|id| next_sibling(&check.doc, id));
    }
    true
}

/// `CheckFieldDatatypeValues`: datatype check against the incoming
/// value, then the template's named restriction (if any) against that
/// same incoming value.
///
/// The literal source checks the restriction against `p_origParam`'s
/// value (the template's, usually empty/unset) rather than the incoming
/// message's — almost certainly a copy-paste artifact, since a
/// restriction exists to validate real traffic. This port checks the
/// incoming (`check`) value, which is the only reading that makes the
/// restriction do anything.
fn check_field_datatype_values(
    orig_doc: &XmlMessage,
    org_id: NodeId,
    check_doc: &XmlMessage,
    check_id: NodeId,
    restrictions: &XmlRestrictions,
    who: &str,
    check: &mut SoapMessage,
) -> bool {
    let org_el = orig_doc.get(org_id);
    let check_el = check_doc.get(check_id);

    if let Err(reason) = wsfab_xml::check_datatype(org_el.data_type.kind, &check_el.value) {
        check.set_fault("Datatype", who, check_el.name.clone(), reason);
        return false;
    }

    if let Some(name) = &org_el.restriction {
        if let Some(restriction) = restrictions.get(name) {
            if let Err(reason) = restriction.check(&check_el.value) {
                check.set_fault("Fieldvalue", who, check_el.name.clone(), reason);
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsfab_soap::SoapVersion;

    fn cache_with_weather_op() -> WsdlCache {
        let mut cache = WsdlCache::new();
        cache.set_service("Weather", "urn:weather", "/var/www", "http://example.com/svc").unwrap();
        let mut input = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        let city = input.set_parameter("City", "").unwrap();
        input.doc.get_mut(city).data_type.cardinality = Some(Cardinality::Mandatory);
        let output = SoapMessage::outgoing("urn:weather", "GetWeatherResponse", SoapVersion::V11, None);
        cache.add_operation(1, "GetWeather", &input, &output).unwrap();
        cache
    }

    #[test]
    fn incoming_message_with_matching_field_passes() {
        let cache = cache_with_weather_op();
        let mut msg = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        msg.set_parameter("City", "London").unwrap();
        assert!(check_incoming_message(&cache, &mut msg, true));
        assert!(msg.fault.is_none());
    }

    #[test]
    fn incoming_message_missing_mandatory_field_faults() {
        let cache = cache_with_weather_op();
        let mut msg = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        assert!(!check_incoming_message(&cache, &mut msg, true));
        assert!(msg.fault.is_some());
    }

    #[test]
    fn incoming_message_unknown_operation_faults() {
        let cache = cache_with_weather_op();
        let mut msg = SoapMessage::outgoing("urn:weather", "NoSuchOp", SoapVersion::V11, None);
        assert!(!check_incoming_message(&cache, &mut msg, true));
        assert_eq!(msg.fault.as_ref().unwrap().code, "No operation");
    }

    #[test]
    fn optional_field_missing_does_not_fault() {
        let mut cache = WsdlCache::new();
        cache.set_service("Weather", "urn:weather", "/var/www", "http://example.com/svc").unwrap();
        let mut input = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        let city = input.set_parameter("City", "").unwrap();
        input.doc.get_mut(city).data_type.cardinality = Some(Cardinality::ZeroOne);
        let unit = input.add_element("Unit", "").unwrap();
        input.doc.get_mut(unit).data_type.cardinality = Some(Cardinality::Optional);
        let output = SoapMessage::outgoing("urn:weather", "GetWeatherResponse", SoapVersion::V11, None);
        cache.add_operation(1, "GetWeather", &input, &output).unwrap();

        let mut msg = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        msg.set_parameter("City", "London").unwrap();
        assert!(check_incoming_message(&cache, &mut msg, true));
        assert!(msg.fault.is_none());
    }
}
