//! Percent escaping for URL components.

use std::borrow::Cow;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Characters escaped in request paths.
pub const PATH_ESCAPE_SET: &[u8] = b" #";

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Escapes every byte of `input` found in `set` as `%XX` with uppercase
/// hex digits. Borrows the input when nothing needs escaping.
pub fn escape<'a>(input: &'a str, set: &[u8]) -> Cow<'a, str> {
    let count = input.bytes().filter(|b| set.contains(b)).count();
    if count == 0 {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len() + count * 2);
    for c in input.chars() {
        if c.is_ascii() && set.contains(&(c as u8)) {
            out.push('%');
            out.push(HEX_DIGITS[(c as u8 >> 4) as usize] as char);
            out.push(HEX_DIGITS[(c as u8 & 0xF) as usize] as char);
        } else {
            out.push(c);
        }
    }

    Cow::Owned(out)
}

/// Escapes the space and `#` characters of a request path.
pub fn escape_path(path: &str) -> Cow<'_, str> {
    escape(path, PATH_ESCAPE_SET)
}

/// Decodes every `%XX` triplet with two valid hex digits into its byte.
///
/// Malformed sequences are copied through literally. The output is never
/// longer than the input.
pub fn unescape_bytes(input: &str) -> Vec<u8> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push(hi << 4 | lo);
                i += 3;
                continue;
            }
        }

        out.push(bytes[i]);
        i += 1;
    }

    out
}

/// Decodes `%XX` triplets, borrowing the input when it contains none.
///
/// Decoded bytes that do not form valid UTF-8 are replaced with U+FFFD.
pub fn unescape(input: &str) -> Cow<'_, str> {
    if !input.contains('%') {
        return Cow::Borrowed(input);
    }

    match String::from_utf8(unescape_bytes(input)) {
        Ok(s) => Cow::Owned(s),
        Err(e) => Cow::Owned(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_only_space_and_hash() {
        assert_eq!(escape_path("/a b#c?d=e&f"), "/a%20b%23c?d=e&f");
        assert_eq!(escape_path("/plain/path.asx"), "/plain/path.asx");
        assert!(matches!(escape_path("/plain"), Cow::Borrowed(_)));
        assert_eq!(escape_path("/é #"), "/é%20%23");
    }

    #[test]
    fn unescape_valid_and_invalid_sequences() {
        assert_eq!(unescape("a%20b%2fc%2F"), "a b/c/");
        assert_eq!(unescape("100%"), "100%");
        assert_eq!(unescape("%4"), "%4");
        assert_eq!(unescape("%zz%41"), "%zzA");
        assert_eq!(unescape("%%41"), "%A");
        assert!(matches!(unescape("no escapes"), Cow::Borrowed(_)));
        assert_eq!(unescape_bytes("%FF%00"), vec![0xFF, 0x00]);
        assert_eq!(unescape("%FF"), "\u{FFFD}");
    }

    #[test]
    fn unescape_reverses_path_escaping() {
        for path in ["/my file #1.mp3", "/##  ##", "/", "/dir name/"] {
            assert_eq!(unescape_bytes(&escape_path(path)), path.as_bytes());
        }
    }

    #[test]
    fn unescape_never_grows() {
        for s in ["%", "%%", "%%%", "%41%", "abc%4", "%4g%41"] {
            assert!(unescape_bytes(s).len() <= s.len());
        }
    }
}
