/// The fixed document-level output encodings spec.md §3.2 allows an
/// `XmlMessage` to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputEncoding {
    /// No explicit encoding declaration (`plain`).
    #[default]
    Plain,
    Utf8,
    Utf16,
    Iso8859_1,
}

impl OutputEncoding {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "",
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Iso8859_1 => "ISO-8859-1",
        }
    }
}

/// Resolves a charset name to a Windows codepage number, case-insensitively.
/// `Default` maps to UTF-8 (65001): this port has no concept of "the
/// process's active codepage" since it targets no specific host locale.
pub fn codepage_for_name(name: &str) -> u32 {
    let lower = name.to_ascii_lowercase();
    match lower.as_str() {
        "utf-8" | "utf8" | "default" | "" => 65001,
        "utf-16" | "utf-16le" | "utf16" => 1200,
        "utf-16be" => 1201,
        "iso-8859-1" | "latin1" | "latin-1" => 28591,
        "us-ascii" | "ascii" => 20127,
        "windows-1252" | "cp1252" => 1252,
        "shift_jis" | "shift-jis" => 932,
        "gb2312" | "gbk" => 936,
        "euc-jp" => 20932,
        "utf-32" | "utf-32le" => 12000,
        "utf-32be" => 12001,
        _ => 65001,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_lookup_is_case_insensitive() {
        assert_eq!(codepage_for_name("UTF-8"), codepage_for_name("utf-8"));
        assert_eq!(codepage_for_name("UTF-8"), 65001);
    }

    #[test]
    fn default_resolves_to_utf8() {
        assert_eq!(codepage_for_name("Default"), 65001);
    }
}
