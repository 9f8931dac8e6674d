//! Minimal HTML documentation page per operation (SPEC_FULL.md §2.9
//! supplement: spec.md §4.9's C12 table row names "HTML doc pages" but
//! the body text never spells out a shape). One `<table>` per operation
//! listing name/soapAction/input-element/output-element, built with plain
//! `std::fmt::Write` the way the rest of this workspace builds strings —
//! no templating crate pulled in for this.

use std::fmt::Write as _;

use crate::cache::WsdlCache;

/// Renders one HTML page documenting every registered operation.
pub fn generate_service_page(cache: &WsdlCache) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<html><head><title>{} web service</title></head><body>", cache.service_name);
    let _ = writeln!(out, "<h1>{}</h1>", cache.service_name);
    for (name, op) in cache.operations() {
        out.push_str(&generate_operation_table(cache, name, op.code));
    }
    out.push_str("</body></html>\n");
    out
}

fn generate_operation_table(cache: &WsdlCache, name: &str, code: i32) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "<table border=\"1\">");
    let _ = writeln!(out, "<tr><th colspan=\"2\">{name}</th></tr>");
    let _ = writeln!(out, "<tr><td>code</td><td>{code}</td></tr>");
    let _ = writeln!(out, "<tr><td>soapAction</td><td>{}/{name}</td></tr>", cache.target_namespace);
    if let Some(op) = cache.get_operation(name) {
        let input_el = op.input.soap_action.clone().unwrap_or_default();
        let output_el = op.output.soap_action.clone().unwrap_or_default();
        let _ = writeln!(out, "<tr><td>input element</td><td>{input_el}</td></tr>");
        let _ = writeln!(out, "<tr><td>output element</td><td>{output_el}</td></tr>");
    }
    out.push_str("</table>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use wsfab_soap::{SoapMessage, SoapVersion};

    #[test]
    fn service_page_lists_every_operation() {
        let mut cache = WsdlCache::new();
        cache.set_service("Weather", "urn:weather", "/var/www", "http://example.com/svc").unwrap();
        let input = SoapMessage::outgoing("urn:weather", "GetWeather", SoapVersion::V11, None);
        let output = SoapMessage::outgoing("urn:weather", "GetWeatherResponse", SoapVersion::V11, None);
        cache.add_operation(7, "GetWeather", &input, &output).unwrap();

        let page = generate_service_page(&cache);
        assert!(page.contains("<h1>Weather</h1>"));
        assert!(page.contains("GetWeather"));
        assert!(page.contains("urn:weather/GetWeather"));
        assert!(page.contains("GetWeatherResponse"));
    }
}
