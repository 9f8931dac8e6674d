//! The fixed one-byte field-tag ordinals of the storage wire format
//! (spec.md §6.5), grounded in `examples/original_source/BaseLibrary/
//! StoreMessage.h`'s `MSGFieldType` enum. Declared via the same
//! table-driven macro shape `wsfab-http::verb::known_verbs!` uses, since
//! the ordinals are likewise baked into a wire format and must never
//! silently renumber.

macro_rules! known_fields {
    ($(($variant:ident, $ord:expr)),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #[repr(u8)]
        pub enum FieldTag {
            $($variant = $ord,)*
        }

        impl FieldTag {
            pub fn from_ordinal(ordinal: u8) -> Option<Self> {
                match ordinal {
                    $($ord => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

known_fields! {
    (Version, 1),
    (ResponseOffset, 2),
    (HttpCommand, 3),
    (Url, 4),
    (HttpStatus, 5),
    (ContentType, 6),
    (ContentLength, 7),
    (AcceptEncoding, 8),
    (VerbTunnel, 9),
    (SendBom, 10),
    (Cookies, 11),
    (Referrer, 12),
    (Desktop, 13),
    (Headers, 14),
    (Routing, 15),
    (IsModified, 16),
    (SystemTime, 17),
    (Body, 18),
    (EndMarker, 19),
}

/// Storage format version. `0x0101` reads as "1.1" (spec.md §6.5).
pub const HTTP_FILE_VERSION: u16 = 0x0101;

/// Byte offset of the `ResponseOffset` field's tag, right after the
/// 1-byte `Version` tag + 2-byte version value (spec.md §6.5,
/// `STORE_HTTP_RESPONSE_OFFSET` in the original header).
pub const STORE_HTTP_RESPONSE_OFFSET: u64 = 3;

/// Literal end-of-message marker value (spec.md §6.5).
pub const END_MARKER: u16 = 0xFFFF;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_match_the_fixed_list() {
        assert_eq!(FieldTag::Version as u8, 1);
        assert_eq!(FieldTag::EndMarker as u8, 19);
    }

    #[test]
    fn from_ordinal_rejects_unknown_tags() {
        assert!(FieldTag::from_ordinal(0).is_none());
        assert!(FieldTag::from_ordinal(20).is_none());
        assert_eq!(FieldTag::from_ordinal(18), Some(FieldTag::Body));
    }
}
