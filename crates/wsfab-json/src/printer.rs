//! JSON emission: numbers print as `int32` when they fit, otherwise as a
//! bookkeeping decimal with no exponent; strings are always UTF-8 on the
//! wire (spec.md §6.2).

use wsfab_charset::entity::encode_json_string;

use crate::value::Json;

pub fn print_string(value: &Json) -> String {
    let mut out = String::new();
    write_value(value, &mut out);
    out
}

fn write_value(value: &Json, out: &mut String) {
    match value {
        Json::None | Json::Null => out.push_str("null"),
        Json::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Json::Int(i) => out.push_str(&i.to_string()),
        Json::Decimal(d) => out.push_str(&d.normalize().to_string()),
        Json::String(s) => {
            out.push('"');
            out.push_str(&encode_json_string(s));
            out.push('"');
        }
        Json::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, out);
            }
            out.push(']');
        }
        Json::Object(pairs) => {
            out.push('{');
            for (i, pair) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push('"');
                out.push_str(&encode_json_string(&pair.name));
                out.push_str("\":");
                write_value(&pair.value, out);
            }
            out.push('}');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;

    #[test]
    fn round_trips_array_of_ints() {
        let value = parse_str(r#"{"op":{"A":[1,2,3]}}"#).unwrap();
        let printed = print_string(&value);
        let reparsed = parse_str(&printed).unwrap();
        assert_eq!(value, reparsed);
    }

    #[test]
    fn escapes_quotes_and_control_chars() {
        let value = Json::String("a\"b\nc".to_string());
        let printed = print_string(&value);
        assert_eq!(printed, "\"a\\\"b\\nc\"");
    }
}
