//! Primary-key quoting for admin URLs.
//!
//! Keys can contain characters that are meaningful inside a URL path, so
//! the admin encodes them as `_XX` (uppercase hex). The underscore itself is
//! escaped, so quoting is reversible.

const SPECIAL: &[char] = &[
    ':', '/', '_', '#', '?', ';', '@', '&', '=', '+', '$', ',', '"', '[', ']', '<', '>', '%',
    '\n', '\\',
];

/// Encode the characters in a primary key that would break an admin URL.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len());
    for ch in value.chars() {
        if SPECIAL.contains(&ch) {
            quoted.push_str(&format!("_{:02X}", ch as u32));
        } else {
            quoted.push(ch);
        }
    }
    quoted
}

/// Reverse [`quote`]. Malformed `_XX` sequences are kept verbatim.
pub fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'_' && i + 2 < bytes.len() {
            if let Some(byte) = decode_hex_pair(bytes[i + 1], bytes[i + 2]) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|_| value.to_owned())
}

fn decode_hex_pair(high: u8, low: u8) -> Option<u8> {
    let high = (high as char).to_digit(16)?;
    let low = (low as char).to_digit(16)?;
    u8::try_from(high * 16 + low).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_keys_are_untouched() {
        assert_eq!(quote("42"), "42");
        assert_eq!(unquote("42"), "42");
    }

    #[test]
    fn special_characters_are_hex_escaped() {
        assert_eq!(quote("a/b_c"), "a_2Fb_5Fc");
        assert_eq!(quote("x:y?"), "x_3Ay_3F");
        assert_eq!(unquote("a_2Fb_5Fc"), "a/b_c");
    }

    #[test]
    fn quote_then_unquote_restores_key() {
        let key = r#"odd "key" #1 & 50% <ok>"#;
        assert_eq!(unquote(&quote(key)), key);
    }

    #[test]
    fn malformed_sequences_survive_unquote() {
        assert_eq!(unquote("snake_zz"), "snake_zz");
        assert_eq!(unquote("tail_"), "tail_");
        assert_eq!(unquote("tail_4"), "tail_4");
    }
}
