/// Byte-order-mark kinds the sniffer recognizes. Only `Utf8` is ever
/// accepted by `wsfab-xml`'s parser; every other variant is detected purely
/// so the parser can reject it with `IncompatibleEncoding` (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BomKind {
    Utf8,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    Utf7,
    Utf1,
    UtfEbcdic,
    Bocu1,
    Gb18030,
    Scsu,
}

/// Detects a BOM at the start of `buffer`, returning the kind and the number
/// of bytes to skip. Returns `None` if no known BOM prefix is present.
pub fn detect(buffer: &[u8]) -> Option<(BomKind, usize)> {
    const TABLE: &[(&[u8], BomKind)] = &[
        (&[0xEF, 0xBB, 0xBF], BomKind::Utf8),
        (&[0xFF, 0xFE, 0x00, 0x00], BomKind::Utf32Le),
        (&[0x00, 0x00, 0xFE, 0xFF], BomKind::Utf32Be),
        (&[0xFF, 0xFE], BomKind::Utf16Le),
        (&[0xFE, 0xFF], BomKind::Utf16Be),
        (&[0x2B, 0x2F, 0x76], BomKind::Utf7),
        (&[0xF7, 0x64, 0x4C], BomKind::Utf1),
        (&[0xDD, 0x73, 0x66, 0x73], BomKind::UtfEbcdic),
        (&[0xFB, 0xEE, 0x28], BomKind::Bocu1),
        (&[0x84, 0x31, 0x95, 0x33], BomKind::Gb18030),
        (&[0x0E, 0xFE, 0xFF], BomKind::Scsu),
    ];

    // Longest-prefix-first so UTF-32LE (which shares a UTF-16LE prefix)
    // matches before the shorter UTF-16LE entry.
    let mut candidates: Vec<_> = TABLE.iter().collect();
    candidates.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));

    for (prefix, kind) in candidates {
        if buffer.len() >= prefix.len() && &buffer[..prefix.len()] == *prefix {
            return Some((*kind, prefix.len()));
        }
    }
    None
}

/// Emits the three-byte UTF-8 BOM.
pub fn emit_utf8() -> [u8; 3] {
    [0xEF, 0xBB, 0xBF]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_utf8_bom() {
        let buf = [0xEF, 0xBB, 0xBF, b'<', b'a', b'>'];
        assert_eq!(detect(&buf), Some((BomKind::Utf8, 3)));
    }

    #[test]
    fn detects_utf32le_before_utf16le() {
        let buf = [0xFF, 0xFE, 0x00, 0x00];
        assert_eq!(detect(&buf), Some((BomKind::Utf32Le, 4)));
    }

    #[test]
    fn no_bom_returns_none() {
        assert_eq!(detect(b"<a/>"), None);
    }
}
