//! WSDL 1.1 generation (spec.md §4.9, grounded in `examples/original_source/
//! Marlin/WSDLCache.cpp`'s `GenerateWSDL` pipeline): types, messages,
//! portType, bindings, service, in that fixed order, wrapped last in the
//! `<wsdl:definitions>` namespace prelude.

use std::collections::HashSet;
use std::fmt::Write as _;

use wsfab_soap::SoapMessage;
use wsfab_xml::{Cardinality, NodeId, Ordering, XdtKind, XmlMessage};

use crate::cache::WsdlCache;
use crate::error::WsdlError;

/// `GenerateWSDL()`: builds the one accumulating buffer in the fixed
/// order and wraps it last, per spec.md §4.9.
pub fn generate_wsdl(cache: &WsdlCache) -> Result<String, WsdlError> {
    cache.ensure_configured()?;

    let mut body = String::new();
    body.push_str(&generate_types(cache));
    body.push_str(&generate_messages(cache));
    body.push_str(&generate_port_type(cache));
    body.push_str(&generate_bindings(cache));
    body.push_str(&generate_service_bindings(cache));
    Ok(generate_definitions(cache, &body))
}

fn generate_types(cache: &WsdlCache) -> String {
    let mut out = String::new();
    out.push_str("\n<!-- Abstract types -->\n");
    let _ = writeln!(
        out,
        "<wsdl:types>\n  <s:schema elementFormDefault=\"qualified\" targetNamespace=\"{}\">",
        cache.target_namespace
    );
    let mut done = HashSet::new();
    for op in cache.operations().values() {
        generate_message_types(&mut out, &op.input, &mut done);
        generate_message_types(&mut out, &op.output, &mut done);
    }
    out.push_str("  </s:schema>\n</wsdl:types>\n");
    out
}

fn generate_message_types(out: &mut String, msg: &SoapMessage, done: &mut HashSet<String>) {
    let Some(param) = msg.parameter_object else { return };
    let element = msg.soap_action.clone().unwrap_or_default();
    generate_parameter_types(out, &element, &msg.doc, param, msg.wsdl_order, done, true);
}

/// Mirrors `GenerateParameterTypes`'s exact recursion: dedup on `element`
/// name via `done`, ordering word from the message's WSDL order, per-field
/// `minOccurs`/`maxOccurs` from cardinality, XSD type from the XDT kind,
/// and an `ArrayOf` name prefix on any repeated or complex child before
/// recursing into it.
fn generate_parameter_types(
    out: &mut String,
    element: &str,
    doc: &XmlMessage,
    node: NodeId,
    order: Option<Ordering>,
    done: &mut HashSet<String>,
    is_root: bool,
) {
    if done.contains(element) {
        return;
    }
    let children = &doc.get(node).children;
    if children.is_empty() {
        return;
    }

    if is_root {
        let _ = writeln!(out, "    <s:element name=\"{element}\">");
        let _ = writeln!(out, "      <s:complexType>");
    } else {
        let _ = writeln!(out, "    <s:complexType name=\"{element}\">");
    }
    let indent = if is_root { "        " } else { "      " };
    let order_kw = ordering_keyword(order);
    let _ = writeln!(out, "{}<s:{order_kw}>", if is_root { "      " } else { "    " });

    for &child in children {
        let el = doc.get(child);
        let (occurs, _) = cardinality_occurs(el.data_type.cardinality);
        let _ = write!(out, "{indent}<s:element {occurs} name=\"{}\"", el.name);
        out.push_str(&xsd_type_attr(el.data_type.kind, &el.name));
        out.push_str(" />\n");
    }

    let _ = writeln!(out, "{}</s:{order_kw}>", if is_root { "      " } else { "    " });
    if is_root {
        out.push_str("    </s:complexType>\n  </s:element>\n");
    } else {
        out.push_str("    </s:complexType>\n");
    }
    done.insert(element.to_string());

    for &child in children {
        let el = doc.get(child);
        if el.children.is_empty() {
            continue;
        }
        let (_, is_array) = cardinality_occurs(el.data_type.cardinality);
        let mut name = String::new();
        if is_array || el.data_type.kind == XdtKind::Complex {
            name.push_str("ArrayOf");
        }
        name.push_str(&el.name);
        generate_parameter_types(out, &name, doc, child, order, done, false);
    }
}

fn ordering_keyword(order: Option<Ordering>) -> &'static str {
    match order {
        Some(Ordering::Choice) => "choice",
        Some(Ordering::Sequence) => "sequence",
        None => "all",
    }
}

/// Returns the `minOccurs`/`maxOccurs` attribute text and whether the
/// cardinality repeats (`ZeroMany`/`OneMany`), which drives the `ArrayOf`
/// name prefix.
fn cardinality_occurs(cardinality: Option<Cardinality>) -> (&'static str, bool) {
    match cardinality {
        Some(Cardinality::OnceOnly) | Some(Cardinality::Mandatory) => {
            ("minOccurs=\"1\" maxOccurs=\"1\"", false)
        }
        Some(Cardinality::ZeroMany) => ("minOccurs=\"0\" maxOccurs=\"unbounded\"", true),
        Some(Cardinality::OneMany) => ("minOccurs=\"1\" maxOccurs=\"unbounded\"", true),
        Some(Cardinality::Optional) | Some(Cardinality::ZeroOne) | None => {
            ("minOccurs=\"0\" maxOccurs=\"1\"", false)
        }
    }
}

fn xsd_type_attr(kind: XdtKind, name: &str) -> String {
    match kind {
        XdtKind::String | XdtKind::Cdata => " type=\"s:string\"".to_string(),
        XdtKind::Integer => " type=\"s:int\"".to_string(),
        XdtKind::Double => " type=\"s:double\"".to_string(),
        XdtKind::Boolean => " type=\"s:boolean\"".to_string(),
        XdtKind::Base64 => " type=\"s:base64Binary\"".to_string(),
        XdtKind::DateTime => " type=\"s:dateTime\"".to_string(),
        XdtKind::Complex => format!(" type=\"tns:ArrayOf{name}\""),
    }
}

fn generate_messages(cache: &WsdlCache) -> String {
    let mut out = String::new();
    out.push_str("\n<!-- Abstract messages -->\n");
    for (name, op) in cache.operations() {
        let in_el = op.input.soap_action.clone().unwrap_or_default();
        let out_el = op.output.soap_action.clone().unwrap_or_default();
        let _ = writeln!(out, "<wsdl:message name=\"{name}SoapIn\">");
        let _ = writeln!(out, "  <wsdl:part name=\"parameters\" element=\"tns:{in_el}\" />");
        out.push_str("</wsdl:message>\n");
        let _ = writeln!(out, "<wsdl:message name=\"{name}SoapOut\">");
        let _ = writeln!(out, "  <wsdl:part name=\"parameters\" element=\"tns:{out_el}\" />");
        out.push_str("</wsdl:message>\n");
    }
    out
}

fn generate_port_type(cache: &WsdlCache) -> String {
    let mut out = String::new();
    out.push_str("\n<!-- PortType -->\n");
    let _ = writeln!(out, "<wsdl:portType name=\"{}Soap\">", cache.service_name);
    for name in cache.operations().keys() {
        let _ = writeln!(out, "  <wsdl:operation name=\"{name}\">");
        let _ = writeln!(out, "    <wsdl:input message=\"tns:{name}SoapIn\" />");
        let _ = writeln!(out, "    <wsdl:output message=\"tns:{name}SoapOut\" />");
        out.push_str("  </wsdl:operation>\n");
    }
    out.push_str("</wsdl:portType>\n");
    out
}

fn generate_bindings(cache: &WsdlCache) -> String {
    let mut out = String::new();
    out.push_str("\n<!-- Bindings -->\n");
    if cache.perform_soap11 {
        out.push_str(&generate_binding(cache, "Soap", "soap"));
    }
    if cache.perform_soap12 {
        out.push_str(&generate_binding(cache, "Soap12", "soap12"));
    }
    out
}

fn generate_binding(cache: &WsdlCache, suffix: &str, soap_prefix: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<wsdl:binding name=\"{}{suffix}\" type=\"tns:{}Soap\">", cache.service_name, cache.service_name);
    let _ = writeln!(
        out,
        "  <{soap_prefix}:binding transport=\"http://schemas.xmlsoap.org/soap/http\" style=\"document\" />"
    );
    for name in cache.operations().keys() {
        let _ = writeln!(out, "  <wsdl:operation name=\"{name}\">");
        let _ = writeln!(
            out,
            "    <{soap_prefix}:operation soapAction=\"{}/{name}\" style=\"document\" />",
            cache.target_namespace
        );
        out.push_str("    <wsdl:input>\n");
        let _ = writeln!(out, "      <{soap_prefix}:body use=\"literal\" />");
        out.push_str("    </wsdl:input>\n    <wsdl:output>\n");
        let _ = writeln!(out, "      <{soap_prefix}:body use=\"literal\" />");
        out.push_str("    </wsdl:output>\n  </wsdl:operation>\n");
    }
    out.push_str("</wsdl:binding>\n");
    out
}

fn generate_service_bindings(cache: &WsdlCache) -> String {
    let mut out = String::new();
    out.push_str("\n<!-- Service -->\n");
    let _ = writeln!(out, "<wsdl:service name=\"{}\">", cache.service_name);
    let path_prefix = if cache.url.ends_with('/') { cache.url.clone() } else { format!("{}/", cache.url) };
    let address = format!("{path_prefix}{}{}", cache.service_name, cache.service_postfix);
    if cache.perform_soap11 {
        let _ = writeln!(out, "  <wsdl:port name=\"{}Soap\" binding=\"tns:{}Soap\">", cache.service_name, cache.service_name);
        let _ = writeln!(out, "    <soap:address location=\"{address}\" />");
        out.push_str("  </wsdl:port>\n");
    }
    if cache.perform_soap12 {
        let _ = writeln!(out, "  <wsdl:port name=\"{}Soap12\" binding=\"tns:{}Soap12\">", cache.service_name, cache.service_name);
        let _ = writeln!(out, "    <soap12:address location=\"{address}\" />");
        out.push_str("  </wsdl:port>\n");
    }
    out.push_str("</wsdl:service>\n");
    out
}

/// Wraps `body` in the fixed namespace prelude, applied last (spec.md
/// §4.9 step 6).
fn generate_definitions(cache: &WsdlCache, body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
<wsdl:definitions name=\"{name}\"\n\
  targetNamespace=\"{ns}\"\n\
  xmlns:tns=\"{ns}\"\n\
  xmlns:soap=\"http://schemas.xmlsoap.org/wsdl/soap/\"\n\
  xmlns:soap12=\"http://schemas.xmlsoap.org/wsdl/soap12/\"\n\
  xmlns:tm=\"http://microsoft.com/wsdl/mime/textMatching/\"\n\
  xmlns:soapenc=\"http://schemas.xmlsoap.org/soap/encoding/\"\n\
  xmlns:mime=\"http://schemas.xmlsoap.org/wsdl/mime/\"\n\
  xmlns:s=\"http://www.w3.org/2001/XMLSchema\"\n\
  xmlns:http=\"http://schemas.xmlsoap.org/wsdl/http/\"\n\
  xmlns:wsdl=\"http://schemas.xmlsoap.org/wsdl/\">\n\
{body}\
</wsdl:definitions>\n",
        name = cache.service_name,
        ns = cache.target_namespace,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsfab_soap::SoapVersion;

    fn simple_cache() -> WsdlCache {
        let mut cache = WsdlCache::new();
        cache.set_service("Weather", "urn:weather", "/var/www", "http://example.com/svc").unwrap();

        let mut input = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        input.set_parameter("City", "London").unwrap();
        let mut output = SoapMessage::outgoing("urn:weather", "GetWeatherResponse", SoapVersion::V11, None);
        output.set_parameter("Temperature", "18").unwrap();

        cache.add_operation(1, "GetWeather", &input, &output).unwrap();
        cache
    }

    #[test]
    fn generate_wsdl_emits_fixed_section_order() {
        let cache = simple_cache();
        let wsdl = generate_wsdl(&cache).unwrap();
        let types_at = wsdl.find("<wsdl:types>").unwrap();
        let messages_at = wsdl.find("<wsdl:message").unwrap();
        let port_type_at = wsdl.find("<wsdl:portType").unwrap();
        let binding_at = wsdl.find("<wsdl:binding").unwrap();
        let service_at = wsdl.find("<wsdl:service").unwrap();
        assert!(types_at < messages_at);
        assert!(messages_at < port_type_at);
        assert!(port_type_at < binding_at);
        assert!(binding_at < service_at);
        assert!(wsdl.trim_start().starts_with("<?xml"));
        assert!(wsdl.trim_end().ends_with("</wsdl:definitions>"));
    }

    #[test]
    fn generate_wsdl_rejects_unconfigured_service() {
        let cache = WsdlCache::new();
        assert!(matches!(generate_wsdl(&cache), Err(WsdlError::ServiceNotConfigured)));
    }

    #[test]
    fn generate_wsdl_carries_soap_actions_and_addresses() {
        let cache = simple_cache();
        let wsdl = generate_wsdl(&cache).unwrap();
        assert!(wsdl.contains("soapAction=\"urn:weather/GetWeather\""));
        assert!(wsdl.contains("location=\"http://example.com/svc/Weather.acx\""));
    }
}
