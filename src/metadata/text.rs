//! Best-effort text decoding for metadata fields.

/// Decodes UTF-8, dropping invalid sequences instead of failing.
///
/// Returns the text and whether anything was dropped.
pub fn decode_utf8(bytes: &[u8]) -> (String, bool) {
    let mut text = String::with_capacity(bytes.len());
    let mut dropped = false;
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
        dropped |= !chunk.invalid().is_empty();
    }
    (text, dropped)
}

/// Decodes ISO-8859-1, where every byte is the code point of the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes UTF-16, choosing the byte order from a BOM, then from where the
/// zero bytes of ASCII-range characters fall, then from `little_endian`.
pub fn decode_utf16(bytes: &[u8], little_endian: bool) -> (String, bool) {
    let (body, little) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        _ => (bytes, guess_little_endian(bytes).unwrap_or(little_endian)),
    };

    let units = body.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if little {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    });

    let mut text = String::with_capacity(body.len() / 2);
    let mut dropped = body.len() % 2 != 0;
    for unit in char::decode_utf16(units) {
        match unit {
            Ok(ch) => text.push(ch),
            Err(_) => dropped = true,
        }
    }
    (text, dropped)
}

fn guess_little_endian(bytes: &[u8]) -> Option<bool> {
    let mut even_zeros = 0usize;
    let mut odd_zeros = 0usize;
    for (index, &byte) in bytes.iter().enumerate() {
        if byte == 0 {
            if index % 2 == 0 {
                even_zeros += 1;
            } else {
                odd_zeros += 1;
            }
        }
    }
    match even_zeros.cmp(&odd_zeros) {
        std::cmp::Ordering::Greater => Some(false),
        std::cmp::Ordering::Less => Some(true),
        std::cmp::Ordering::Equal => None,
    }
}

/// Strips NUL padding and surrounding whitespace.
pub fn trim_field(text: &str) -> &str {
    text.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}
