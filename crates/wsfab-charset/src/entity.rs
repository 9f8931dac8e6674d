//! XML entity encode/decode per spec.md §4.2 and the "Entity escape"
//! testable property in spec.md §8: every `& < > ' "` and every byte < 0x20
//! appears in output only in entity form.

/// Encodes XML special characters and control bytes as entities.
pub fn encode_xml_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {
                out.push_str(&format!("&#{};", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

/// Decodes named entities (`&amp; &lt; &gt; &apos; &quot;`) and numeric
/// entities (`&#N;` decimal, `&#xH;` hex).
pub fn decode_xml_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some(semi) = text[i..].find(';') {
                let entity = &text[i + 1..i + semi];
                if let Some(decoded) = decode_entity(entity) {
                    out.push(decoded);
                    i += semi + 1;
                    continue;
                }
            }
        }
        // Safe: we advance by one *char*, not one byte, to stay on a boundary.
        let ch = text[i..].chars().next().unwrap_or('\u{FFFD}');
        out.push(ch);
        i += ch.len_utf8();
    }
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        _ if entity.starts_with("#x") || entity.starts_with("#X") => {
            u32::from_str_radix(&entity[2..], 16).ok().and_then(char::from_u32)
        }
        _ if entity.starts_with('#') => entity[1..].parse::<u32>().ok().and_then(char::from_u32),
        _ => None,
    }
}

/// Encodes a string for embedding as a JSON string literal body (without the
/// surrounding quotes).
pub fn encode_json_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_all_special_chars() {
        let out = encode_xml_string("a & b < c > d ' e \" f \u{0001}");
        for bare in ['&', '<', '>', '\'', '"'] {
            // only entity forms should remain; the bare char (outside its
            // entity encoding) must not appear
            let without_entities = out
                .replace("&amp;", "")
                .replace("&lt;", "")
                .replace("&gt;", "")
                .replace("&apos;", "")
                .replace("&quot;", "");
            assert!(!without_entities.contains(bare));
        }
        assert!(out.contains("&#1;"));
    }

    #[test]
    fn round_trips_named_and_numeric_entities() {
        let text = "<tag> & 'quote' \"double\"";
        let encoded = encode_xml_string(text);
        assert_eq!(decode_xml_string(&encoded), text);
    }

    #[test]
    fn decodes_hex_numeric_entity() {
        assert_eq!(decode_xml_string("&#x41;"), "A");
        assert_eq!(decode_xml_string("&#65;"), "A");
    }
}
