//! Cookie parsing/emission with attribute ordering and optional value
//! encryption (C4).
//!
//! `Cookie` models a single `Set-Cookie`/`Cookie` entry; `Cookies` is the
//! deduplicating container spec.md §4.4 describes: last-set wins by
//! case-insensitive name, first-seen index preserved for `Set-Cookie`
//! output ordering.

pub mod error;

pub use error::CookieError;

use time::OffsetDateTime;

const MIN_COOKIE_CHAR: u8 = 0x21;
const MAX_COOKIE_CHAR: u8 = 0x7E;

/// `SameSite` attribute. `Absent` means "do not append the attribute at
/// all", distinct from an explicit `None` (spec.md §3.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Absent,
    None,
    Lax,
    Strict,
}

impl SameSite {
    fn as_str(self) -> Option<&'static str> {
        match self {
            Self::Absent => None,
            Self::None => Some("None"),
            Self::Lax => Some("Lax"),
            Self::Strict => Some("Strict"),
        }
    }
}

/// A single cookie, matching spec.md §3.7's field set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: Option<String>,
    pub value: String,
    pub secure: bool,
    pub http_only: bool,
    pub domain: Option<String>,
    pub path: Option<String>,
    pub same_site: SameSite,
    pub max_age: i64,
    pub expires: Option<OffsetDateTime>,
}

impl Cookie {
    /// Builds a bare client-side cookie `name=value`.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Result<Self, CookieError> {
        let name = name.into();
        let value = value.into();
        check_name(&name)?;
        check_value(&value)?;
        Ok(Self {
            name: Some(name),
            value,
            secure: false,
            http_only: false,
            domain: None,
            path: None,
            same_site: SameSite::Absent,
            max_age: 0,
            expires: None,
        })
    }

    /// Builds a cookie whose value is AES-encrypted under `metadata` as the
    /// password. Per spec.md §4.4, encrypted cookies are always marked
    /// `secure` and `http_only`.
    pub fn new_encrypted(
        name: impl Into<String>,
        value: &str,
        metadata: &str,
    ) -> Result<Self, CookieError> {
        let name = name.into();
        check_name(&name)?;
        let encrypted = wsfab_codec::Codec::encrypt(metadata, value)?;
        Ok(Self {
            name: Some(name),
            value: encrypted,
            secure: true,
            http_only: true,
            domain: None,
            path: None,
            same_site: SameSite::Absent,
            max_age: 0,
            expires: None,
        })
    }

    /// Parses a single `Cookie:`/`Set-Cookie:` header value (spec.md §4.4):
    /// `[name=]value` up to the first `;`, then `;`-separated attributes.
    pub fn from_http(text: &str) -> Result<Self, CookieError> {
        let mut parts = text.split(';');
        let first = parts.next().unwrap_or("").trim();
        let (name, value) = match first.find('=') {
            Some(i) => (Some(first[..i].trim().to_string()), first[i + 1..].trim().to_string()),
            None => (None, first.to_string()),
        };
        if let Some(n) = &name {
            check_name(n)?;
        }
        check_value(&value)?;

        let mut cookie = Self {
            name,
            value,
            secure: false,
            http_only: false,
            domain: None,
            path: None,
            same_site: SameSite::Absent,
            max_age: 0,
            expires: None,
        };

        for attr in parts {
            let attr = attr.trim();
            if attr.is_empty() {
                continue;
            }
            let (key, val) = match attr.find('=') {
                Some(i) => (&attr[..i], attr[i + 1..].trim()),
                None => (attr, ""),
            };
            match key.to_ascii_lowercase().as_str() {
                "secure" => cookie.secure = true,
                "httponly" => cookie.http_only = true,
                "path" => cookie.path = Some(val.to_string()),
                "domain" => cookie.domain = Some(val.to_string()),
                "max-age" => cookie.max_age = val.parse().unwrap_or(0),
                "samesite" => {
                    cookie.same_site = match val.to_ascii_lowercase().as_str() {
                        "none" => SameSite::None,
                        "lax" => SameSite::Lax,
                        "strict" => SameSite::Strict,
                        _ => SameSite::Absent,
                    }
                }
                "expires" => cookie.expires = parse_http_date(val),
                _ => {}
            }
        }
        Ok(cookie)
    }

    /// Decrypts the value under `metadata`; returns the raw value unchanged
    /// if `metadata` is empty (spec.md §4.4's `GetValue(metadata = "")`).
    pub fn decrypted_value(&self, metadata: &str) -> Result<String, CookieError> {
        if metadata.is_empty() {
            return Ok(self.value.clone());
        }
        Ok(wsfab_codec::Codec::decrypt(metadata, &self.value)?)
    }

    /// `Cookie:` wire form: `name=value` with no attributes.
    pub fn cookie_text(&self) -> String {
        format!("{}={}", self.name.as_deref().unwrap_or(""), self.value)
    }

    /// `Set-Cookie:` wire form: value plus attributes in the fixed order
    /// Path, Domain, Expires, SameSite, Secure, HttpOnly, Max-Age.
    pub fn set_cookie_text(&self) -> String {
        let mut out = self.cookie_text();
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(expires) = &self.expires {
            out.push_str("; Expires=");
            out.push_str(&format_http_date(*expires));
        }
        if let Some(same_site) = self.same_site.as_str() {
            out.push_str("; SameSite=");
            out.push_str(same_site);
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.max_age != 0 {
            out.push_str("; Max-Age=");
            out.push_str(&self.max_age.to_string());
        }
        out
    }

    /// Whether this cookie's `expires` timestamp has passed `now`.
    ///
    /// Compares calendar-correct instants via `OffsetDateTime`'s `Ord`, per
    /// spec.md §9's Open Question: the original compares raw `SYSTEMTIME`
    /// structs with `memcmp`, which only works by coincidence of field
    /// layout order.
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        match self.expires {
            Some(expires) => now > expires,
            None => false,
        }
    }
}

fn check_name(name: &str) -> Result<(), CookieError> {
    if name.is_empty()
        || !name
            .bytes()
            .all(|b| (MIN_COOKIE_CHAR..=MAX_COOKIE_CHAR).contains(&b) && b != b'=' && b != b';')
    {
        return Err(CookieError::InvalidName);
    }
    Ok(())
}

fn check_value(value: &str) -> Result<(), CookieError> {
    if !value
        .bytes()
        .all(|b| (MIN_COOKIE_CHAR..=MAX_COOKIE_CHAR).contains(&b) && b != b';')
    {
        return Err(CookieError::InvalidValue);
    }
    Ok(())
}

const HTTP_DATE_FORMAT: &[time::format_description::BorrowedFormatItem<'_>] = time::macros::format_description!(
    "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"
);

fn format_http_date(ts: OffsetDateTime) -> String {
    ts.to_offset(time::UtcOffset::UTC)
        .format(HTTP_DATE_FORMAT)
        .unwrap_or_default()
}

fn parse_http_date(text: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(text, HTTP_DATE_FORMAT)
        .ok()
        .or_else(|| OffsetDateTime::parse(text, &time::format_description::well_known::Rfc2822).ok())
}

/// Container of cookies, deduplicated by case-insensitive name with
/// last-set-wins value semantics and first-seen-index preservation for
/// `Set-Cookie` output ordering (spec.md §4.4, §5).
#[derive(Debug, Clone, Default)]
pub struct Cookies {
    entries: Vec<Cookie>,
}

impl Cookies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a cookie parsed from an HTTP header value.
    pub fn add_from_http(&mut self, text: &str) -> Result<(), CookieError> {
        self.add(Cookie::from_http(text)?);
        Ok(())
    }

    /// Adds (or replaces, keeping the original index) a cookie by name.
    pub fn add(&mut self, cookie: Cookie) {
        let name = cookie.name.clone().unwrap_or_default();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|c| c.name.as_deref().unwrap_or("").eq_ignore_ascii_case(&name))
        {
            *existing = cookie;
        } else {
            self.entries.push(cookie);
        }
    }

    pub fn get(&self, index: usize) -> Option<&Cookie> {
        self.entries.get(index)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Cookie> {
        self.entries.iter().find(|c| c.name.as_deref().unwrap_or("").eq_ignore_ascii_case(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.entries.iter()
    }

    /// Client-side `Cookie:` header: `k1=v1; k2=v2`, no attributes.
    pub fn cookie_header_text(&self) -> String {
        self.entries
            .iter()
            .map(Cookie::cookie_text)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_name_value_and_attributes() {
        let cookie = Cookie::from_http("sid=abc123; Path=/; Secure; HttpOnly; SameSite=Strict").unwrap();
        assert_eq!(cookie.name.as_deref(), Some("sid"));
        assert_eq!(cookie.value, "abc123");
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.path.as_deref(), Some("/"));
        assert_eq!(cookie.same_site, SameSite::Strict);
    }

    #[test]
    fn parses_bare_value_with_no_name() {
        let cookie = Cookie::from_http("just-a-value").unwrap();
        assert_eq!(cookie.name, None);
        assert_eq!(cookie.value, "just-a-value");
    }

    #[test]
    fn encrypted_cookie_round_trips_and_forces_secure_httponly() {
        let cookie = Cookie::new_encrypted("sid", "secret-payload", "metadata-pw").unwrap();
        assert!(cookie.secure);
        assert!(cookie.http_only);
        assert_eq!(cookie.decrypted_value("metadata-pw").unwrap(), "secret-payload");
    }

    #[test]
    fn container_dedups_by_case_insensitive_name_last_wins() {
        let mut cookies = Cookies::new();
        cookies.add(Cookie::new("sid", "first").unwrap());
        cookies.add(Cookie::new("other", "x").unwrap());
        cookies.add(Cookie::new("SID", "second").unwrap());
        assert_eq!(cookies.len(), 2);
        assert_eq!(cookies.get(0).unwrap().value, "second");
        assert_eq!(cookies.get_by_name("sid").unwrap().value, "second");
    }

    #[test]
    fn client_serialization_has_no_attributes() {
        let mut cookies = Cookies::new();
        cookies.add(Cookie::new("a", "1").unwrap());
        cookies.add(Cookie::new("b", "2").unwrap());
        assert_eq!(cookies.cookie_header_text(), "a=1; b=2");
    }

    #[test]
    fn server_serialization_orders_attributes() {
        let mut cookie = Cookie::new("sid", "v").unwrap();
        cookie.path = Some("/".to_string());
        cookie.secure = true;
        cookie.http_only = true;
        cookie.same_site = SameSite::Lax;
        let text = cookie.set_cookie_text();
        let path_idx = text.find("Path").unwrap();
        let same_site_idx = text.find("SameSite").unwrap();
        let secure_idx = text.find("Secure").unwrap();
        let http_only_idx = text.find("HttpOnly").unwrap();
        assert!(path_idx < same_site_idx);
        assert!(same_site_idx < secure_idx);
        assert!(secure_idx < http_only_idx);
    }

    #[test]
    fn rejects_invalid_name_characters() {
        assert!(Cookie::new("bad name", "v").is_err());
        assert!(Cookie::new("bad=name", "v").is_err());
    }
}
