//! The fixed HTTP verb ordinal list (spec.md §6.3). Ordinals are part of
//! the `wsfab-store` wire format, so they are declared exactly once here
//! via a small table-driven macro, in the shape of
//! `trillium_http::method::Method`.

#[derive(Debug, Clone, thiserror::Error)]
#[error("unrecognized HTTP verb '{0}'")]
pub struct VerbParseError(pub String);

macro_rules! known_verbs {
    ($(($variant:ident, $ord:expr, $text:expr)),* $(,)?) => {
        /// A fixed-ordinal HTTP verb. `Response` (ordinal 0) is not a real
        /// request verb — it marks a `MessageStore` response record.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u8)]
        pub enum Verb {
            $($variant = $ord,)*
        }

        impl Verb {
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }

            pub fn ordinal(self) -> u8 {
                self as u8
            }

            pub fn from_ordinal(ordinal: u8) -> Option<Self> {
                match ordinal {
                    $($ord => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }

        impl std::str::FromStr for Verb {
            type Err = VerbParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)*
                    _ => Err(VerbParseError(s.to_string())),
                }
            }
        }

        impl std::fmt::Display for Verb {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

known_verbs! {
    (Response, 0, "RESPONSE"),
    (Post, 1, "POST"),
    (Get, 2, "GET"),
    (Put, 3, "PUT"),
    (Delete, 4, "DELETE"),
    (Head, 5, "HEAD"),
    (Trace, 6, "TRACE"),
    (Connect, 7, "CONNECT"),
    (Options, 8, "OPTIONS"),
    (Move, 9, "MOVE"),
    (Copy, 10, "COPY"),
    (Propfind, 11, "PROPFIND"),
    (Proppatch, 12, "PROPPATCH"),
    (Mkcol, 13, "MKCOL"),
    (Lock, 14, "LOCK"),
    (Unlock, 15, "UNLOCK"),
    (Search, 16, "SEARCH"),
    (Merge, 17, "MERGE"),
    (Patch, 18, "PATCH"),
    (VersionControl, 19, "VERSION-CONTROL"),
    (Report, 20, "REPORT"),
    (Checkout, 21, "CHECKOUT"),
    (Checkin, 22, "CHECKIN"),
    (Uncheckout, 23, "UNCHECKOUT"),
    (Mkworkspace, 24, "MKWORKSPACE"),
    (Update, 25, "UPDATE"),
    (Label, 26, "LABEL"),
    (BaselineControl, 27, "BASELINE-CONTROL"),
    (Mkactivity, 28, "MKACTIVITY"),
    (Orderpatch, 29, "ORDERPATCH"),
    (Acl, 30, "ACL"),
}

impl Default for Verb {
    fn default() -> Self {
        Self::Get
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ordinals_match_the_fixed_list() {
        assert_eq!(Verb::Post.ordinal(), 1);
        assert_eq!(Verb::Get.ordinal(), 2);
        assert_eq!(Verb::Acl.ordinal(), 30);
    }

    #[test]
    fn round_trips_through_ordinal_and_text() {
        for verb in [Verb::Post, Verb::VersionControl, Verb::BaselineControl, Verb::Acl] {
            assert_eq!(Verb::from_ordinal(verb.ordinal()), Some(verb));
            assert_eq!(Verb::from_str(verb.as_str()).unwrap(), verb);
        }
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!(Verb::from_str("get").unwrap(), Verb::Get);
        assert_eq!(Verb::from_str("version-control").unwrap(), Verb::VersionControl);
    }

    #[test]
    fn unknown_verb_is_an_error() {
        assert!(Verb::from_str("FROBNICATE").is_err());
    }
}
