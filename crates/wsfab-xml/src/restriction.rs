//! XSD facet restrictions and the datatype checker (C7, spec.md §4.6).
//!
//! Only the facets spec.md §4.6 enumerates are supported — this is not a
//! general-purpose XML Schema validator (spec.md §1 Non-goals).

use std::collections::HashMap;

use crate::model::XdtKind;

/// `xs:whiteSpace` facet values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhiteSpaceFacet {
    Preserve = 1,
    Replace = 2,
    Collapse = 3,
}

/// One named XSD facet set (spec.md §4.6). All fields are optional: an
/// unset facet is simply not checked.
#[derive(Debug, Clone, Default)]
pub struct XmlRestriction {
    pub name: String,
    pub length: Option<usize>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub total_digits: Option<u32>,
    pub fraction_digits: Option<u32>,
    pub min_inclusive: Option<String>,
    pub max_inclusive: Option<String>,
    pub min_exclusive: Option<String>,
    pub max_exclusive: Option<String>,
    pub pattern: Option<String>,
    pub white_space: Option<WhiteSpaceFacet>,
    /// Ordered value -> optional display-value, queried case-insensitively.
    pub enumeration: Vec<(String, Option<String>)>,
}

impl XmlRestriction {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Looks up an enumeration entry case-insensitively.
    pub fn enumeration_entry(&self, value: &str) -> Option<&(String, Option<String>)> {
        self.enumeration.iter().find(|(v, _)| v.eq_ignore_ascii_case(value))
    }

    /// Checks `value` (already decoded, code-point length used for
    /// length facets) against every set facet. Returns `Ok(())` or a
    /// human-readable diagnostic (spec.md §4.6: "returns empty string on
    /// success or a human-readable diagnostic").
    pub fn check(&self, value: &str) -> Result<(), String> {
        let len = value.chars().count();
        if let Some(exact) = self.length {
            if len != exact {
                return Err(format!("length {len} does not equal required length {exact}"));
            }
        }
        if let Some(min) = self.min_length {
            if len < min {
                return Err(format!("length {len} is shorter than minLength {min}"));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                return Err(format!("length {len} is longer than maxLength {max}"));
            }
        }
        if let Some(total) = self.total_digits {
            let digits = value.chars().filter(|c| c.is_ascii_digit()).count() as u32;
            if digits > total {
                return Err(format!("{digits} digits exceed totalDigits {total}"));
            }
        }
        if let Some(fraction) = self.fraction_digits {
            let frac_len = value
                .split_once('.')
                .map(|(_, frac)| frac.chars().filter(|c| c.is_ascii_digit()).count() as u32)
                .unwrap_or(0);
            if frac_len > fraction {
                return Err(format!("{frac_len} fraction digits exceed fractionDigits {fraction}"));
            }
        }
        if let Some(min) = &self.min_inclusive {
            if value < min.as_str() {
                return Err(format!("{value} is less than minInclusive {min}"));
            }
        }
        if let Some(max) = &self.max_inclusive {
            if value > max.as_str() {
                return Err(format!("{value} is greater than maxInclusive {max}"));
            }
        }
        if let Some(min) = &self.min_exclusive {
            if value <= min.as_str() {
                return Err(format!("{value} is not greater than minExclusive {min}"));
            }
        }
        if let Some(max) = &self.max_exclusive {
            if value >= max.as_str() {
                return Err(format!("{value} is not less than maxExclusive {max}"));
            }
        }
        if let Some(pattern) = &self.pattern {
            if !matches_pattern(pattern, value) {
                return Err(format!("'{value}' does not match pattern '{pattern}'"));
            }
        }
        if !self.enumeration.is_empty() && self.enumeration_entry(value).is_none() {
            return Err(format!("'{value}' is not one of the enumerated values"));
        }
        Ok(())
    }
}

/// A restriction-independent textual literal check for an XDT datatype
/// (spec.md §4.6). Base64 and Double are documented as intentionally
/// lenient (spec.md §9) and are not tightened here.
pub fn check_datatype(kind: XdtKind, value: &str) -> Result<(), String> {
    match kind {
        XdtKind::String | XdtKind::Cdata | XdtKind::Complex => Ok(()),
        XdtKind::Integer => {
            let trimmed = value.strip_prefix(['+', '-']).unwrap_or(value);
            if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
                Ok(())
            } else {
                Err(format!("'{value}' is not a valid integer"))
            }
        }
        XdtKind::Boolean => {
            if matches!(value.to_ascii_lowercase().as_str(), "true" | "false" | "1" | "0") {
                Ok(())
            } else {
                Err(format!("'{value}' is not a valid boolean"))
            }
        }
        XdtKind::Double => {
            if value.is_empty() {
                return Err("empty double literal".to_string());
            }
            let lenient = value
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'+' | b'-' | b'e' | b'E'));
            if lenient { Ok(()) } else { Err(format!("'{value}' is not a valid double")) }
        }
        XdtKind::Base64 => {
            let lenient = value.bytes().all(|b| b.is_ascii_hexdigit() || b.is_ascii_whitespace());
            if lenient { Ok(()) } else { Err(format!("'{value}' is not valid base64/hex content")) }
        }
        XdtKind::DateTime => {
            if is_datetime_literal(value) {
                Ok(())
            } else {
                Err(format!("'{value}' is not a YYYY-MM-DDThh:mm:ss datetime"))
            }
        }
    }
}

fn is_datetime_literal(value: &str) -> bool {
    // YYYY-MM-DDThh:mm:ss, optionally followed by fractional seconds and/or
    // a 'Z'/offset suffix (the wider RFC 3339 family SOAPSecurity produces).
    let bytes = value.as_bytes();
    if bytes.len() < 19 {
        return false;
    }
    let pattern = b"dddd-dd-ddTdd:dd:dd";
    for (i, &expect) in pattern.iter().enumerate() {
        let b = bytes[i];
        match expect {
            b'd' => {
                if !b.is_ascii_digit() {
                    return false;
                }
            }
            other => {
                if b != other {
                    return false;
                }
            }
        }
    }
    true
}

/// Applies a `whiteSpace` facet to `value` the way spec.md §4.6 describes:
/// `Replace` turns tab/CR/LF into spaces; `Collapse` additionally folds
/// runs of whitespace and trims.
pub fn apply_white_space(facet: WhiteSpaceFacet, value: &str) -> String {
    match facet {
        WhiteSpaceFacet::Preserve => value.to_string(),
        WhiteSpaceFacet::Replace => value.chars().map(|c| if c == '\t' || c == '\n' || c == '\r' { ' ' } else { c }).collect(),
        WhiteSpaceFacet::Collapse => {
            let replaced: String = value.chars().map(|c| if c.is_whitespace() { ' ' } else { c }).collect();
            replaced.split(' ').filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ")
        }
    }
}

/// A deliberately small textual pattern matcher: spec.md calls the facet
/// "regex-like" without committing to full PCRE syntax. This supports the
/// common XSD-pattern subset of literal characters, `.` (any char), `*`
/// (zero or more of the previous atom), and `?` (zero or one) — enough for
/// the enumerated-facet scope (spec.md §1 Non-goals: no general XSD
/// validator).
fn matches_pattern(pattern: &str, value: &str) -> bool {
    fn match_here(pat: &[char], text: &[char]) -> bool {
        match pat.first() {
            None => text.is_empty(),
            Some(&p) => {
                let following_quantifier = pat.get(1).copied();
                match following_quantifier {
                    Some('*') => {
                        let mut i = 0;
                        loop {
                            if match_here(&pat[2..], &text[i..]) {
                                return true;
                            }
                            if i < text.len() && (p == '.' || text[i] == p) {
                                i += 1;
                            } else {
                                return false;
                            }
                        }
                    }
                    Some('?') => {
                        if match_here(&pat[2..], text) {
                            return true;
                        }
                        !text.is_empty() && (p == '.' || text[0] == p) && match_here(&pat[2..], &text[1..])
                    }
                    _ => !text.is_empty() && (p == '.' || text[0] == p) && match_here(&pat[1..], &text[1..]),
                }
            }
        }
    }
    let pat: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = value.chars().collect();
    match_here(&pat, &text)
}

/// Shared restriction table a `WSDLCache`/`SoapMessage` draws facets from by
/// name, since elements never own their restriction (spec.md §3.1).
#[derive(Debug, Clone, Default)]
pub struct XmlRestrictions {
    table: HashMap<String, XmlRestriction>,
}

impl XmlRestrictions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, restriction: XmlRestriction) {
        self.table.insert(restriction.name.clone(), restriction);
    }

    pub fn get(&self, name: &str) -> Option<&XmlRestriction> {
        self.table.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_facets_reject_out_of_range_values() {
        let mut r = XmlRestriction::named("shortcode");
        r.min_length = Some(2);
        r.max_length = Some(4);
        assert!(r.check("abc").is_ok());
        assert!(r.check("a").is_err());
        assert!(r.check("abcdef").is_err());
    }

    #[test]
    fn enumeration_is_case_insensitive() {
        let mut r = XmlRestriction::named("color");
        r.enumeration.push(("Red".to_string(), None));
        r.enumeration.push(("Blue".to_string(), None));
        assert!(r.check("red").is_ok());
        assert!(r.check("green").is_err());
    }

    #[test]
    fn datatype_checks() {
        assert!(check_datatype(XdtKind::Integer, "-42").is_ok());
        assert!(check_datatype(XdtKind::Integer, "4.2").is_err());
        assert!(check_datatype(XdtKind::Boolean, "TRUE").is_ok());
        assert!(check_datatype(XdtKind::Boolean, "yes").is_err());
        assert!(check_datatype(XdtKind::DateTime, "2024-01-01T00:00:00").is_ok());
        assert!(check_datatype(XdtKind::DateTime, "2024-01-01").is_err());
    }

    #[test]
    fn whitespace_collapse_folds_runs_and_trims() {
        assert_eq!(apply_white_space(WhiteSpaceFacet::Collapse, "  a   b \t c  "), "a b c");
    }

    #[test]
    fn pattern_matcher_supports_dot_star_and_optional() {
        assert!(matches_pattern("ab*c", "abbbc"));
        assert!(matches_pattern("ab*c", "ac"));
        assert!(matches_pattern("a.c", "abc"));
        assert!(matches_pattern("colou?r", "color"));
        assert!(matches_pattern("colou?r", "colour"));
        assert!(!matches_pattern("abc", "abd"));
    }
}
