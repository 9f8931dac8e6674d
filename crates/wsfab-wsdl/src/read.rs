//! `ReadWSDLFile`/`ReadWSDLFileFromURL` (spec.md §4.9, §5's suspension-point
//! list): reconstructs a [`WsdlCache`]'s operations from a previously
//! generated WSDL 1.1 document, grounded in
//! `examples/original_source/Marlin/WSDLCache.cpp`'s `ReadWSDLFile` /
//! `ReadWSDLFileSafe` / `ReadDefinitions` / `ReadServiceBindings` /
//! `ReadPortTypes` / `ReadMessage` / `ReadParameters` /
//! `ReadParametersInOrder` chain. The original's `__try`/`__except` around
//! the whole read (a guard against pathological hand-edited schemas) is
//! replaced per spec.md §9's REDESIGN FLAG with an explicit depth/cycle
//! guard (`visited`, below) rather than a stack-depth trap — Rust has no
//! portable SEH to imitate, and a visited-set is the documented substitute.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use wsfab_soap::{SoapMessage, SoapVersion};
use wsfab_xml::{Cardinality, NodeId, Ordering, XdtKind, XmlMessage};

use crate::cache::WsdlCache;
use crate::error::WsdlError;

/// The external HTTP(S) collaborator `ReadWSDLFileFromURL` delegates to
/// (spec.md §1: "the HTTP server/client transport ... are named only
/// where the core consumes or exposes contracts to them"). A caller
/// supplies whatever HTTP client it already owns; this crate never opens
/// a socket itself.
pub trait WsdlSource {
    fn fetch(&self, url: &str) -> Result<String, WsdlError>;
}

/// `ReadWSDLLocalFile`: loads `path` as UTF-8 text and rebuilds `cache`
/// from it. On any failure `cache` is left untouched (the original resets
/// to empty on failure; this port instead builds into a scratch
/// [`WsdlCache`] and only swaps it in on full success, which gives the
/// same externally-visible "rebuilt on success, unchanged on failure"
/// contract without a half-applied reset in between).
pub fn read_wsdl_file(cache: &mut WsdlCache, path: &Path) -> Result<(), WsdlError> {
    let text = std::fs::read_to_string(path)?;
    read_wsdl_text(cache, &text)
}

/// `ReadWSDLFileFromURL`: fetches `url` via the caller-supplied
/// [`WsdlSource`] and rebuilds `cache` from the response body.
pub fn read_wsdl_url(cache: &mut WsdlCache, url: &str, source: &dyn WsdlSource) -> Result<(), WsdlError> {
    let text = source.fetch(url)?;
    read_wsdl_text(cache, &text)
}

/// `ReadWSDLFileSafe`: dispatches on the `http://`/`https://` prefix,
/// matching the original's case-insensitive 7/8-character scheme sniff.
pub fn read_wsdl(cache: &mut WsdlCache, path_or_url: &str, source: Option<&dyn WsdlSource>) -> Result<(), WsdlError> {
    let lower = path_or_url.to_ascii_lowercase();
    if lower.starts_with("https://") || lower.starts_with("http://") {
        let source = source.ok_or(WsdlError::NoHttpSource)?;
        read_wsdl_url(cache, path_or_url, source)
    } else {
        read_wsdl_file(cache, Path::new(path_or_url))
    }
}

fn read_wsdl_text(cache: &mut WsdlCache, text: &str) -> Result<(), WsdlError> {
    let wsdl = wsfab_xml::parse(text.as_bytes());
    if wsdl.error.is_error() {
        return Err(WsdlError::Parse(wsdl.error.message.clone()));
    }
    let rebuilt = read_definitions(&wsdl)?;
    *cache = rebuilt;
    Ok(())
}

/// `ReadWSDL`: `ReadDefinitions` + `ReadServiceBindings` + `ReadPortTypes`
/// in that order, into a fresh [`WsdlCache`].
fn read_definitions(wsdl: &XmlMessage) -> Result<WsdlCache, WsdlError> {
    let root = wsdl.root.ok_or_else(|| WsdlError::Parse("empty WSDL document".to_string()))?;
    if wsdl.get(root).name != "definitions" || wsdl.get(root).namespace != "wsdl" {
        return Err(WsdlError::Parse("not a WSDL file beginning with <wsdl:definitions...>".to_string()));
    }

    let mut cache = WsdlCache::new();
    cache.target_namespace = wsdl.get_attribute(root, "targetNamespace").unwrap_or_default().to_string();

    read_service_bindings(wsdl, root, &mut cache)?;
    read_port_types(wsdl, root, &mut cache)?;

    if cache.operations().is_empty() {
        return Err(WsdlError::Parse("WSDL has no <portType> operations".to_string()));
    }
    Ok(cache)
}

/// `ReadServiceBindings`: service name plus the soap/soap12 `<address>`,
/// split back into `url`/`service_postfix` (the inverse of
/// `generate_service_bindings`'s `{url}/{serviceName}{postfix}` join).
fn read_service_bindings(wsdl: &XmlMessage, root: NodeId, cache: &mut WsdlCache) -> Result<(), WsdlError> {
    let service = find_descendant(wsdl, root, "service")
        .ok_or_else(|| WsdlError::Parse("no <wsdl:service> within the WSDL".to_string()))?;
    cache.service_name = wsdl
        .get_attribute(service, "name")
        .ok_or_else(|| WsdlError::Parse("no service name attribute in <wsdl:service>".to_string()))?
        .to_string();

    let mut addresses = Vec::new();
    collect_descendants(wsdl, service, "address", &mut addresses);
    let address11 = addresses.iter().copied().find(|&a| wsdl.get(a).namespace == "soap");
    let address12 = addresses.iter().copied().find(|&a| wsdl.get(a).namespace == "soap12");

    cache.perform_soap11 = address11.is_some();
    cache.perform_soap12 = address12.is_some();
    if !cache.perform_soap11 && !cache.perform_soap12 {
        return Err(WsdlError::NoBindingEnabled);
    }

    // Use the highest SOAP version's address when both are present, per
    // the original's "use highest soap version" comment.
    let address = address12.or(address11).expect("at least one binding present");
    let location = wsdl
        .get_attribute(address, "location")
        .ok_or_else(|| WsdlError::Parse("<soap:address> without a location attribute".to_string()))?;
    split_service_address(location, &cache.service_name, cache);
    Ok(())
}

/// Splits `{url}/{serviceName}{postfix}` back into `url` and
/// `service_postfix`, the inverse of `generate_service_bindings`'s join.
fn split_service_address(location: &str, service_name: &str, cache: &mut WsdlCache) {
    if let Some(slash) = location.rfind('/') {
        let (url, tail) = location.split_at(slash);
        let tail = &tail[1..];
        if let Some(postfix) = tail.strip_prefix(service_name) {
            cache.url = url.to_string();
            cache.service_postfix = postfix.to_string();
            return;
        }
    }
    cache.url = location.to_string();
}

/// `ReadPortTypes`: walks `<portType>/<operation>` entries, resolving each
/// `input`/`output` message to a template [`SoapMessage`] via
/// [`read_message`] and registering it with a sequential dispatch code
/// (the original's `++index`).
fn read_port_types(wsdl: &XmlMessage, root: NodeId, cache: &mut WsdlCache) -> Result<(), WsdlError> {
    let port_type = find_descendant(wsdl, root, "portType")
        .ok_or_else(|| WsdlError::Parse("no <wsdl:portType> within the WSDL".to_string()))?;

    let mut index = 0;
    for operation in &wsdl.get(port_type).children.clone() {
        let operation = *operation;
        if wsdl.get(operation).name != "operation" {
            continue;
        }
        let name = wsdl
            .get_attribute(operation, "name")
            .ok_or_else(|| WsdlError::Parse("<portType>/<operation> without a name attribute".to_string()))?
            .to_string();
        let input_el = wsdl
            .find_child(operation, "input")
            .ok_or_else(|| WsdlError::Parse(format!("operation [{name}] has no <input>")))?;
        let output_el = wsdl
            .find_child(operation, "output")
            .ok_or_else(|| WsdlError::Parse(format!("operation [{name}] has no <output>")))?;

        let msg_in = strip_namespace(wsdl.get_attribute(input_el, "message").unwrap_or_default());
        let msg_out = strip_namespace(wsdl.get_attribute(output_el, "message").unwrap_or_default());

        let input = read_message(wsdl, root, &msg_in, &cache.target_namespace)?;
        let output = read_message(wsdl, root, &msg_out, &cache.target_namespace)?;

        index += 1;
        cache
            .add_operation(index, &name, &input, &output)
            .map_err(|_| WsdlError::Parse(format!("cannot add operation [{name}] to the WSDL cache")))?;
    }
    Ok(())
}

/// `ReadMessage` + `ReadParameters`: finds `<message name="...">`'s
/// `<part element="...">`, then rebuilds a template [`SoapMessage`] for
/// that element from `<types>`.
fn read_message(wsdl: &XmlMessage, root: NodeId, message_name: &str, target_ns: &str) -> Result<SoapMessage, WsdlError> {
    let message = find_descendant_with_attr(wsdl, root, "message", "name", message_name)
        .ok_or_else(|| WsdlError::Parse(format!("<message> with name={message_name} not found in the WSDL")))?;
    let part = wsdl
        .find_child(message, "part")
        .ok_or_else(|| WsdlError::Parse(format!("message [{message_name}] without a part")))?;
    let element_ref = wsdl
        .get_attribute(part, "element")
        .ok_or_else(|| WsdlError::Parse(format!("message [{message_name}] without an element part")))?;
    let element_name = strip_namespace(element_ref);

    let mut template = SoapMessage::outgoing(target_ns, &element_name, SoapVersion::V11, None);
    let param = template.parameter_object.ok_or_else(|| WsdlError::Parse("template has no parameter object".to_string()))?;

    let types = find_descendant(wsdl, root, "types")
        .ok_or_else(|| WsdlError::Parse("no <wsdl:types> within the WSDL".to_string()))?;
    let schema = find_descendant(wsdl, types, "schema")
        .ok_or_else(|| WsdlError::Parse("no <s:schema> within <wsdl:types>".to_string()))?;

    let element = find_named_child(wsdl, schema, "element", &element_name)
        .ok_or_else(|| WsdlError::Parse(format!("<types><element> with name={element_name} not found in WSDL")))?;
    let complex = wsdl
        .find_child(element, "complexType")
        .ok_or_else(|| WsdlError::Parse(format!("<types><element> with name={element_name} without a 'complex' definition")))?;

    let mut visited = HashSet::new();
    visited.insert(element_name.clone());
    let order = first_order_child(wsdl, complex)
        .ok_or_else(|| WsdlError::Parse(format!("<types><element> with name={element_name} without an order node")))?;
    template.wsdl_order = ordering_from_keyword(wsdl.get(order).name.as_str());

    read_parameters_in_order(wsdl, schema, order, &mut template.doc, param, &mut visited)?;
    Ok(template)
}

/// `ReadParametersInOrder`: walks the `<all>`/`<choice>`/`<sequence>`
/// group's `<element>` children, rebuilding each as a child of `parent` in
/// `doc` with cardinality/kind derived from `minOccurs`/`maxOccurs`/`type`
/// — the exact inverse of `generate_parameter_types`.
fn read_parameters_in_order(
    wsdl: &XmlMessage,
    schema: NodeId,
    order: NodeId,
    doc: &mut XmlMessage,
    parent: NodeId,
    visited: &mut HashSet<String>,
) -> Result<(), WsdlError> {
    for &child in &wsdl.get(order).children.clone() {
        let el = wsdl.get(child);
        if matches!(el.name.as_str(), "all" | "choice" | "sequence") {
            read_parameters_in_order(wsdl, schema, child, doc, parent, visited)?;
            continue;
        }
        if el.name != "element" {
            continue;
        }
        let name = wsdl.get_attribute(child, "name").unwrap_or_default().to_string();
        let type_attr = wsdl.get_attribute(child, "type").unwrap_or_default().to_string();
        let cardinality = cardinality_from_occurs(
            wsdl.get_attribute(child, "minOccurs"),
            wsdl.get_attribute(child, "maxOccurs"),
        );

        let node = doc.add_element(parent, "", name, "");
        doc.get_mut(node).data_type.cardinality = Some(cardinality);

        if let Some(complex_name) = type_attr.strip_prefix("tns:") {
            doc.get_mut(node).data_type.kind = XdtKind::Complex;
            if !visited.insert(complex_name.to_string()) {
                return Err(WsdlError::Parse(format!("circular schema reference to '{complex_name}'")));
            }
            let nested_complex = find_named_child(wsdl, schema, "complexType", complex_name).ok_or_else(|| {
                WsdlError::Parse(format!("referenced complex type '{complex_name}' not found in <types>"))
            })?;
            if let Some(nested_order) = first_order_child(wsdl, nested_complex) {
                read_parameters_in_order(wsdl, schema, nested_order, doc, node, visited)?;
            }
            visited.remove(complex_name);
        } else {
            doc.get_mut(node).data_type.kind = xdt_kind_from_xsd_type(&type_attr);
        }
    }
    Ok(())
}

fn xdt_kind_from_xsd_type(type_attr: &str) -> XdtKind {
    match type_attr {
        "s:int" => XdtKind::Integer,
        "s:double" => XdtKind::Double,
        "s:boolean" => XdtKind::Boolean,
        "s:base64Binary" => XdtKind::Base64,
        "s:dateTime" => XdtKind::DateTime,
        _ => XdtKind::String,
    }
}

fn cardinality_from_occurs(min_occurs: Option<&str>, max_occurs: Option<&str>) -> Cardinality {
    match (min_occurs, max_occurs) {
        (Some("1"), Some("unbounded")) => Cardinality::OneMany,
        (Some("0"), Some("unbounded")) => Cardinality::ZeroMany,
        (Some("1"), Some("1")) => Cardinality::Mandatory,
        _ => Cardinality::Optional,
    }
}

fn ordering_from_keyword(keyword: &str) -> Option<Ordering> {
    match keyword {
        "choice" => Some(Ordering::Choice),
        "sequence" => Some(Ordering::Sequence),
        _ => None,
    }
}

/// First non-`annotation` child of `node`, i.e. the `<all>`/`<choice>`/
/// `<sequence>` order group (the original's "skip past `<annotation>`"
/// loop in `ReadParameters`).
fn first_order_child(wsdl: &XmlMessage, node: NodeId) -> Option<NodeId> {
    wsdl.get(node).children.iter().copied().find(|&id| wsdl.get(id).name != "annotation")
}

/// Depth-first search for the first descendant of `node` named `name`
/// whose `attr_name` attribute equals `attr_value` (`FindElementWithAttribute`).
fn find_descendant_with_attr(
    wsdl: &XmlMessage,
    node: NodeId,
    name: &str,
    attr_name: &str,
    attr_value: &str,
) -> Option<NodeId> {
    if wsdl.get(node).name == name && wsdl.get_attribute(node, attr_name) == Some(attr_value) {
        return Some(node);
    }
    for &child in &wsdl.get(node).children {
        if let Some(found) = find_descendant_with_attr(wsdl, child, name, attr_name, attr_value) {
            return Some(found);
        }
    }
    None
}

/// Child of `node` named `child_name` whose `name` attribute equals
/// `name` (used for both `<s:element name="...">` and `<s:complexType
/// name="...">` lookups under `<s:schema>`).
fn find_named_child(wsdl: &XmlMessage, node: NodeId, child_name: &str, name: &str) -> Option<NodeId> {
    wsdl.find_children(node, child_name)
        .into_iter()
        .find(|&id| wsdl.get_attribute(id, "name") == Some(name))
}

/// Depth-first search for the first descendant of `node` named `name`,
/// namespace-agnostic (mirrors `wsfab_soap::message::find_descendant`,
/// duplicated locally since this crate has no dependency on `wsfab-soap`'s
/// private helpers).
fn find_descendant(wsdl: &XmlMessage, node: NodeId, name: &str) -> Option<NodeId> {
    if wsdl.get(node).name == name {
        return Some(node);
    }
    for &child in &wsdl.get(node).children {
        if let Some(found) = find_descendant(wsdl, child, name) {
            return Some(found);
        }
    }
    None
}

/// Collects every descendant of `node` named `name`, document order,
/// appended to `out` (used to find both the `soap:address` and the
/// `soap12:address` under one `<service>` regardless of which port comes
/// first).
fn collect_descendants(wsdl: &XmlMessage, node: NodeId, name: &str, out: &mut Vec<NodeId>) {
    if wsdl.get(node).name == name {
        out.push(node);
    }
    for &child in &wsdl.get(node).children {
        collect_descendants(wsdl, child, name, out);
    }
}

/// `SplitNamespace`: strips a `prefix:` off `qualified`, returning only
/// the local name (the original mutates its `CString` argument in place
/// and also returns the stripped prefix; this port only ever needs the
/// local name).
fn strip_namespace(qualified: &str) -> String {
    match qualified.rsplit_once(':') {
        Some((_, local)) => local.to_string(),
        None => qualified.to_string(),
    }
}

impl fmt::Debug for dyn WsdlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("dyn WsdlSource")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weather_cache() -> WsdlCache {
        let mut cache = WsdlCache::new();
        cache.set_service("Weather", "urn:weather", "/var/www", "http://example.com/svc").unwrap();

        let mut input = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        let city = input.set_parameter("City", "").unwrap();
        input.doc.get_mut(city).data_type.cardinality = Some(Cardinality::Mandatory);

        let mut output = SoapMessage::outgoing("urn:weather", "GetWeatherResponse", SoapVersion::V11, None);
        let temp = output.set_parameter("Temperature", "").unwrap();
        output.doc.get_mut(temp).data_type.cardinality = Some(Cardinality::Mandatory);
        output.doc.get_mut(temp).data_type.kind = XdtKind::Double;

        cache.add_operation(1, "GetWeather", &input, &output).unwrap();
        cache
    }

    #[test]
    fn generated_wsdl_round_trips_through_read_wsdl() {
        let cache = weather_cache();
        let wsdl_text = crate::generate::generate_wsdl(&cache).unwrap();

        let mut rebuilt = WsdlCache::new();
        read_wsdl_text(&mut rebuilt, &wsdl_text).unwrap();

        assert_eq!(rebuilt.service_name, "Weather");
        assert_eq!(rebuilt.target_namespace, "urn:weather");
        assert!(rebuilt.perform_soap11);
        assert!(rebuilt.perform_soap12);
        assert_eq!(rebuilt.get_operation("GetWeather").unwrap().code, 1);

        let input = &rebuilt.get_operation("GetWeather").unwrap().input;
        let param = input.parameter_object.unwrap();
        let city = input.doc.find_child(param, "City").unwrap();
        assert_eq!(input.doc.get(city).data_type.cardinality, Some(Cardinality::Mandatory));

        let output = &rebuilt.get_operation("GetWeather").unwrap().output;
        let out_param = output.parameter_object.unwrap();
        let temperature = output.doc.find_child(out_param, "Temperature").unwrap();
        assert_eq!(output.doc.get(temperature).data_type.kind, XdtKind::Double);
    }

    #[test]
    fn read_wsdl_file_rejects_a_non_wsdl_document() {
        let dir = std::env::temp_dir();
        let path = dir.join("wsfab_wsdl_read_test_not_a_wsdl.xml");
        std::fs::write(&path, "<not-a-wsdl/>").unwrap();
        let mut cache = WsdlCache::new();
        let result = read_wsdl_file(&mut cache, &path);
        let _ = std::fs::remove_file(&path);
        assert!(result.is_err());
    }

    #[test]
    fn read_wsdl_dispatches_on_scheme() {
        struct StubSource;
        impl WsdlSource for StubSource {
            fn fetch(&self, _url: &str) -> Result<String, WsdlError> {
                let cache = weather_cache();
                crate::generate::generate_wsdl(&cache).map_err(|e| WsdlError::Parse(e.to_string()))
            }
        }
        let mut cache = WsdlCache::new();
        read_wsdl(&mut cache, "https://example.com/svc.wsdl", Some(&StubSource)).unwrap();
        assert_eq!(cache.service_name, "Weather");
    }

    #[test]
    fn read_wsdl_url_without_a_source_errors() {
        let mut cache = WsdlCache::new();
        assert!(matches!(read_wsdl(&mut cache, "http://example.com/svc.wsdl", None), Err(WsdlError::NoHttpSource)));
    }
}
