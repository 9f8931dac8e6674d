//! Percent-encoding tuned to spec.md §4.2: whitespace runs collapse to a
//! single space, the "unsafe" set is always encoded, the "reserved" set is
//! only encoded inside query values, control/high bytes are always `%HH`,
//! and `+` decodes to space inside query values unless `allow_plus` is set.

const UNSAFE: &[u8] = b" \"@<>#{}|\\^~[]`";
const RESERVED: &[u8] = b"$&/;?-!*()'";

fn is_unsafe(b: u8) -> bool {
    UNSAFE.contains(&b)
}

fn is_reserved(b: u8) -> bool {
    RESERVED.contains(&b)
}

fn needs_encoding(b: u8, is_query_value: bool) -> bool {
    b < 0x20 || b > 0x7F || is_unsafe(b) || (is_query_value && is_reserved(b))
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

/// Percent-encodes `text`. When `is_query_value` is true, the reserved set
/// is encoded too (query semantics); otherwise only the unsafe set and
/// control/high bytes are encoded (path semantics).
pub fn encode_url_chars(text: &str, is_query_value: bool) -> String {
    let collapsed = collapse_whitespace(text);
    let mut out = String::with_capacity(collapsed.len());
    for byte in collapsed.as_bytes() {
        if needs_encoding(*byte, is_query_value) {
            out.push_str(&format!("%{byte:02X}"));
        } else {
            out.push(*byte as char);
        }
    }
    out
}

/// Decodes a percent-encoded string. `+` decodes to space when
/// `is_query_value` is true, unless `allow_plus` is set (in which case `+`
/// is passed through literally). Any `%HH` sequence producing a byte ≥ 0x80
/// is re-assembled and interpreted as UTF-8.
pub fn decode_url_chars(text: &str, is_query_value: bool, allow_plus: bool) -> String {
    let bytes = text.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 3 <= bytes.len() => {
                if let Ok(hex) = std::str::from_utf8(&bytes[i + 1..i + 3]) {
                    if let Ok(value) = u8::from_str_radix(hex, 16) {
                        out.push(value);
                        i += 3;
                        continue;
                    }
                }
                out.push(bytes[i]);
                i += 1;
            }
            b'+' if is_query_value && !allow_plus => {
                out.push(b' ');
                i += 1;
            }
            other => {
                out.push(other);
                i += 1;
            }
        }
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_query_value() {
        for s in [" z", "a&b=c", "héllo", "plain"] {
            let encoded = encode_url_chars(s, true);
            assert_eq!(decode_url_chars(&encoded, true, false), s);
        }
    }

    #[test]
    fn round_trips_path_value() {
        for s in ["a/b.ext", "no spaces collapsed-here", "weird<chars>"] {
            let encoded = encode_url_chars(s, false);
            assert_eq!(decode_url_chars(&encoded, false, false), s);
        }
    }

    #[test]
    fn collapses_whitespace_runs() {
        assert_eq!(encode_url_chars("a   b\tc", false), "a%20b%20c");
    }

    #[test]
    fn plus_decodes_to_space_in_query_values() {
        assert_eq!(decode_url_chars("a+b", true, false), "a b");
        assert_eq!(decode_url_chars("a+b", true, true), "a+b");
        assert_eq!(decode_url_chars("a+b", false, false), "a+b");
    }
}
