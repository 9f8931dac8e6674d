//! Strict recursive-descent JSON parser (spec.md §4.6/§6.2: "strict JSON
//! subset parse + emit"). UTF-16 input is only accepted via a BOM on the
//! outer byte buffer (spec.md §6.2) — `parse_str` itself always consumes
//! already-UTF-8 text, matching `wsfab-xml`'s single-pass-over-`str` shape.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::JsonError;
use crate::value::{Json, JsonPair};

/// Parses a complete JSON document from `text`, rejecting trailing
/// non-whitespace content.
pub fn parse_str(text: &str) -> Result<Json, JsonError> {
    let mut p = Parser { text, pos: 0 };
    p.skip_whitespace();
    if p.eof() {
        return Err(JsonError::EmptyInput);
    }
    let value = p.parse_value()?;
    p.skip_whitespace();
    if !p.eof() {
        return Err(JsonError::TrailingData);
    }
    Ok(value)
}

/// Parses a UTF-8 byte buffer, stripping a UTF-8 BOM if present and
/// rejecting any other BOM (spec.md §6.2).
pub fn parse_bytes(buffer: &[u8]) -> Result<Json, JsonError> {
    let rest = match wsfab_charset::bom::detect(buffer) {
        Some((wsfab_charset::bom::BomKind::Utf8, skip)) => &buffer[skip..],
        Some((wsfab_charset::bom::BomKind::Utf16Le | wsfab_charset::bom::BomKind::Utf16Be, _)) => {
            let text = wsfab_charset::transcode_to_utf8(buffer, "utf-16");
            return parse_str(&text);
        }
        Some(_) | None => buffer,
    };
    let text = std::str::from_utf8(rest).map_err(|_| JsonError::UnexpectedEof)?;
    parse_str(text)
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, c: char) -> Result<(), JsonError> {
        match self.peek() {
            Some(found) if found == c => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(JsonError::UnexpectedChar(found, self.pos)),
            None => Err(JsonError::UnexpectedEof),
        }
    }

    fn consume_literal(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    fn parse_value(&mut self) -> Result<Json, JsonError> {
        self.skip_whitespace();
        match self.peek() {
            Some('{') => self.parse_object(),
            Some('[') => self.parse_array(),
            Some('"') => Ok(Json::String(self.parse_string()?)),
            Some('t') if self.consume_literal("true") => Ok(Json::Bool(true)),
            Some('f') if self.consume_literal("false") => Ok(Json::Bool(false)),
            Some('n') if self.consume_literal("null") => Ok(Json::Null),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) => Err(JsonError::UnexpectedChar(c, self.pos)),
            None => Err(JsonError::UnexpectedEof),
        }
    }

    fn parse_object(&mut self) -> Result<Json, JsonError> {
        self.expect('{')?;
        let mut pairs = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some('}') {
            self.bump();
            return Ok(Json::Object(pairs));
        }
        loop {
            self.skip_whitespace();
            let name = self.parse_string()?;
            self.skip_whitespace();
            self.expect(':')?;
            let value = self.parse_value()?;
            pairs.push(JsonPair { name, value });
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(JsonError::UnexpectedChar(c, self.pos)),
                None => return Err(JsonError::UnexpectedEof),
            }
        }
        Ok(Json::Object(pairs))
    }

    fn parse_array(&mut self) -> Result<Json, JsonError> {
        self.expect('[')?;
        let mut items = Vec::new();
        self.skip_whitespace();
        if self.peek() == Some(']') {
            self.bump();
            return Ok(Json::Array(items));
        }
        loop {
            let value = self.parse_value()?;
            items.push(value);
            self.skip_whitespace();
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {
                    self.bump();
                    break;
                }
                Some(c) => return Err(JsonError::UnexpectedChar(c, self.pos)),
                None => return Err(JsonError::UnexpectedEof),
            }
        }
        Ok(Json::Array(items))
    }

    fn parse_string(&mut self) -> Result<String, JsonError> {
        let start = self.pos;
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('"') => out.push('"'),
                    Some('\\') => out.push('\\'),
                    Some('/') => out.push('/'),
                    Some('b') => out.push('\u{8}'),
                    Some('f') => out.push('\u{c}'),
                    Some('n') => out.push('\n'),
                    Some('r') => out.push('\r'),
                    Some('t') => out.push('\t'),
                    Some('u') => {
                        let code = self.parse_hex4()?;
                        if (0xD800..=0xDBFF).contains(&code) {
                            if self.consume_literal("\\u") {
                                let low = self.parse_hex4()?;
                                let combined = 0x10000
                                    + (u32::from(code) - 0xD800) * 0x400
                                    + (u32::from(low) - 0xDC00);
                                out.push(char::from_u32(combined).unwrap_or('\u{FFFD}'));
                            } else {
                                out.push('\u{FFFD}');
                            }
                        } else {
                            out.push(char::from_u32(u32::from(code)).unwrap_or('\u{FFFD}'));
                        }
                    }
                    Some(other) => return Err(JsonError::InvalidEscape(other)),
                    None => return Err(JsonError::UnterminatedString(start)),
                },
                Some(_) => {}
                None => return Err(JsonError::UnterminatedString(start)),
            }
        }
    }

    fn parse_hex4(&mut self) -> Result<u16, JsonError> {
        if self.pos + 4 > self.text.len() {
            return Err(JsonError::UnexpectedEof);
        }
        let hex = &self.text[self.pos..self.pos + 4];
        let code = u16::from_str_radix(hex, 16).map_err(|_| JsonError::InvalidNumber(hex.to_string()))?;
        self.pos += 4;
        Ok(code)
    }

    fn parse_number(&mut self) -> Result<Json, JsonError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.') {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            is_float = true;
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let literal = &self.text[start..self.pos];
        if literal.is_empty() || literal == "-" {
            return Err(JsonError::InvalidNumber(literal.to_string()));
        }
        if !is_float {
            if let Ok(i) = literal.parse::<i32>() {
                return Ok(Json::Int(i));
            }
        }
        Decimal::from_str(literal)
            .map(Json::Decimal)
            .map_err(|_| JsonError::InvalidNumber(literal.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_object_with_array_of_ints() {
        let value = parse_str(r#"{"op":{"A":[1,2,3]}}"#).unwrap();
        let op = value.get("op").unwrap();
        let a = op.get("A").unwrap();
        assert_eq!(a.as_array().unwrap().len(), 3);
        assert_eq!(a.as_array().unwrap()[0], Json::Int(1));
    }

    #[test]
    fn integers_that_fit_i32_parse_as_int_not_decimal() {
        assert_eq!(parse_str("42").unwrap(), Json::Int(42));
        assert_eq!(parse_str("-7").unwrap(), Json::Int(-7));
    }

    #[test]
    fn oversized_integers_fall_back_to_decimal() {
        let value = parse_str("99999999999999999999").unwrap();
        assert!(matches!(value, Json::Decimal(_)));
    }

    #[test]
    fn floats_parse_as_decimal() {
        let value = parse_str("3.25").unwrap();
        assert!(matches!(value, Json::Decimal(_)));
    }

    #[test]
    fn parses_escapes_and_unicode() {
        let value = parse_str(r#""a\nbA""#).unwrap();
        assert_eq!(value.as_str(), Some("a\nbA"));
    }

    #[test]
    fn rejects_trailing_data() {
        assert!(parse_str("1 2").is_err());
    }

    #[test]
    fn rejects_empty_input() {
        assert!(matches!(parse_str(""), Err(JsonError::EmptyInput)));
    }

    #[test]
    fn literals_parse() {
        assert_eq!(parse_str("true").unwrap(), Json::Bool(true));
        assert_eq!(parse_str("false").unwrap(), Json::Bool(false));
        assert_eq!(parse_str("null").unwrap(), Json::Null);
    }

    #[test]
    fn duplicate_object_keys_first_wins_on_lookup() {
        let value = parse_str(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Json::Int(1)));
    }
}
