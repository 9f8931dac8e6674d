//! `JSONvalue`/`JSONpair` (C8, spec.md §3.5): a tagged variant with a
//! distinct `None` state (value never set) separate from JSON's own
//! `null`, an `i32` fast path, and an arbitrary-precision decimal ("BCD")
//! fallback for numbers that don't fit in `i32`.

use rust_decimal::Decimal;

/// One JSON value. `Array` elements carry no names; `Object` pairs are
/// ordered and first-wins on lookup (spec.md §3.5's invariant) — the
/// parser does not reject duplicate object keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Json {
    /// The value was never populated — distinct from JSON `null`.
    #[default]
    None,
    Null,
    Bool(bool),
    Int(i32),
    Decimal(Decimal),
    String(String),
    Array(Vec<Json>),
    Object(Vec<JsonPair>),
}

/// A `(name, value)` pair inside a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPair {
    pub name: String,
    pub value: Json,
}

impl Json {
    pub fn object() -> Self {
        Self::Object(Vec::new())
    }

    pub fn array() -> Self {
        Self::Array(Vec::new())
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// First-wins lookup by name into an object; `None` for any other
    /// variant or a missing key.
    pub fn get(&self, name: &str) -> Option<&Json> {
        match self {
            Self::Object(pairs) => pairs.iter().find(|p| p.name == name).map(|p| &p.value),
            _ => None,
        }
    }

    /// Find-or-insert a named pair (only meaningful on `Object`; becomes a
    /// no-op on any other variant, mirroring the "set on the wrong shape
    /// does nothing" tolerance of the rest of this workspace's model
    /// types).
    pub fn set(&mut self, name: impl Into<String>, value: Json) {
        if let Self::Object(pairs) = self {
            let name = name.into();
            if let Some(existing) = pairs.iter_mut().find(|p| p.name == name) {
                existing.value = value;
            } else {
                pairs.push(JsonPair { name, value });
            }
        }
    }

    /// Appends to an array; no-op on any other variant.
    pub fn push(&mut self, value: Json) {
        if let Self::Array(items) = self {
            items.push(value);
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Json]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[JsonPair]> {
        match self {
            Self::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    /// Scalar textual rendering used by the JSON↔XML bridge (spec.md §4.7):
    /// `null` becomes an empty string, booleans render as `true`/`false`,
    /// decimals print without an exponent.
    pub fn scalar_text(&self) -> String {
        match self {
            Self::None | Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(i) => i.to_string(),
            Self::Decimal(d) => d.normalize().to_string(),
            Self::String(s) => s.clone(),
            Self::Array(_) | Self::Object(_) => String::new(),
        }
    }
}
