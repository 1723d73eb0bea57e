//! PNG chunk walker for text chunks.
//!
//! A PNG stream is the 8-byte signature followed by chunks of the form
//! `length (u32 BE) | type (4 ASCII bytes) | data (length bytes) | CRC (u32 BE)`.
//! Only `tEXt` and `iTXt` chunks are decoded. The walk stops at `IEND` or at
//! the first chunk that runs past the end of the stream, keeping whatever
//! was recovered before it.

use tracing::debug;

use crate::diagnostics::{Diagnostic, Parsed};

use super::text::{decode_latin1, decode_utf8, trim_field};

pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// A decoded `tEXt` or `iTXt` chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub keyword: String,
    pub text: String,
}

/// CRC-32 as used by PNG, computed over the chunk type and data.
pub fn chunk_crc(chunk_type: &[u8], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

fn be_u32(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

/// Walks the chunks of `data` and decodes every text chunk.
///
/// Input without the PNG signature yields no chunks. With `verify_crc`,
/// chunks whose CRC does not match are skipped and reported.
pub fn scan_text_chunks(data: &[u8], verify_crc: bool) -> Parsed<Vec<TextChunk>> {
    let mut chunks = Vec::new();
    let mut diagnostics = Vec::new();

    if !data.starts_with(&PNG_SIGNATURE) {
        return Parsed::clean(chunks);
    }

    let mut offset = PNG_SIGNATURE.len();
    while offset < data.len() {
        let Some(header) = data.get(offset..offset + 8) else {
            diagnostics.push(Diagnostic::TruncatedChunk { offset });
            break;
        };
        let length = be_u32(&header[..4]) as usize;
        let chunk_type = &header[4..8];

        let body_start = offset + 8;
        let Some(body) = body_start
            .checked_add(length)
            .and_then(|body_end| data.get(body_start..body_end))
        else {
            diagnostics.push(Diagnostic::TruncatedChunk { offset });
            break;
        };
        let crc_start = body_start + length;
        let stored_crc = data.get(crc_start..crc_start + 4).map(be_u32);

        debug!(
            chunk = %String::from_utf8_lossy(chunk_type),
            offset,
            length,
            "png chunk"
        );

        let crc_ok = match stored_crc {
            Some(stored) => !verify_crc || stored == chunk_crc(chunk_type, body),
            None => !verify_crc,
        };

        if !crc_ok && stored_crc.is_some() {
            diagnostics.push(Diagnostic::CrcMismatch {
                chunk_type: decode_latin1(chunk_type),
                offset,
            });
        } else if crc_ok {
            match chunk_type {
                b"tEXt" => chunks.extend(decode_text(body, &mut diagnostics)),
                b"iTXt" => chunks.extend(decode_international_text(body, &mut diagnostics)),
                _ => {}
            }
        }

        if stored_crc.is_none() {
            diagnostics.push(Diagnostic::TruncatedChunk { offset });
            break;
        }
        if chunk_type == b"IEND" {
            break;
        }
        offset = crc_start + 4;
    }

    Parsed::new(chunks, diagnostics)
}

fn split_nul(bytes: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = bytes.iter().position(|&b| b == 0)?;
    Some((&bytes[..nul], &bytes[nul + 1..]))
}

fn text_value(keyword: &str, bytes: &[u8], diagnostics: &mut Vec<Diagnostic>) -> String {
    let (text, dropped) = decode_utf8(bytes);
    if dropped {
        diagnostics.push(Diagnostic::UndecodableText {
            field: keyword.to_string(),
        });
    }
    trim_field(&text).to_string()
}

/// `keyword NUL text`
fn decode_text(body: &[u8], diagnostics: &mut Vec<Diagnostic>) -> Option<TextChunk> {
    let (keyword, text) = split_nul(body)?;
    let keyword = decode_latin1(keyword);
    let text = text_value(&keyword, text, diagnostics);
    Some(TextChunk { keyword, text })
}

/// `keyword NUL flag method language NUL translated NUL text`
fn decode_international_text(
    body: &[u8],
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<TextChunk> {
    let (keyword, rest) = split_nul(body)?;
    let keyword = decode_latin1(keyword);

    let text = match rest {
        [1, _, tail @ ..] if split_nul(tail).and_then(|(_, t)| split_nul(t)).is_some() => {
            diagnostics.push(Diagnostic::CompressedText { keyword });
            return None;
        }
        [0, _, tail @ ..] => split_nul(tail)
            .and_then(|(_language, t)| split_nul(t))
            .map_or(rest, |(_translated, text)| text),
        _ => rest,
    };

    let text = text_value(&keyword, text, diagnostics);
    Some(TextChunk { keyword, text })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Assembles a chunk with a correct CRC.
    pub(crate) fn chunk(chunk_type: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(data.len() + 12);
        out.extend((data.len() as u32).to_be_bytes());
        out.extend(chunk_type);
        out.extend(data);
        out.extend(chunk_crc(chunk_type, data).to_be_bytes());
        out
    }

    pub(crate) fn text_chunk(keyword: &str, text: &str) -> Vec<u8> {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.extend(text.as_bytes());
        chunk(b"tEXt", &data)
    }

    pub(crate) fn itxt_chunk(keyword: &str, text: &str) -> Vec<u8> {
        let mut data = keyword.as_bytes().to_vec();
        data.extend([0, 0, 0]);
        data.extend(b"en\0");
        data.push(0);
        data.extend(text.as_bytes());
        chunk(b"iTXt", &data)
    }

    pub(crate) fn png(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut out = PNG_SIGNATURE.to_vec();
        out.extend(chunk(b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 6, 0, 0, 0]));
        for c in chunks {
            out.extend(c);
        }
        out.extend(chunk(b"IEND", &[]));
        out
    }

    #[test]
    fn crc_matches_known_iend_value() {
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE42_6082);
    }

    #[test]
    fn crc_spans_type_and_data() {
        assert_eq!(chunk_crc(b"1234", b"56789"), 0xCBF4_3926);
    }

    #[test]
    fn text_and_itxt_chunks_are_decoded() {
        let data = png(&[
            text_chunk("parameters", "a cat\0"),
            itxt_chunk("Description", "猫"),
        ]);
        let parsed = scan_text_chunks(&data, true);

        assert!(parsed.is_clean());
        assert_eq!(
            parsed.value,
            vec![
                TextChunk {
                    keyword: "parameters".into(),
                    text: "a cat".into()
                },
                TextChunk {
                    keyword: "Description".into(),
                    text: "猫".into()
                },
            ]
        );
    }

    #[test]
    fn latin1_keyword_is_decoded() {
        let parsed = scan_text_chunks(&png(&[chunk(b"tEXt", b"caf\xe9\0x")]), false);
        assert_eq!(parsed.value[0].keyword, "café");
    }

    #[test]
    fn invalid_utf8_in_text_is_dropped_and_reported() {
        let parsed = scan_text_chunks(&png(&[chunk(b"tEXt", b"prompt\0ok\xff!")]), false);

        assert_eq!(parsed.value[0].text, "ok!");
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::UndecodableText {
                field: "prompt".into()
            }]
        );
    }

    #[test]
    fn truncated_stream_keeps_earlier_chunks() {
        let mut data = png(&[text_chunk("prompt", "first"), text_chunk("prompt", "second")]);
        // Cut into the body of the IEND-preceding chunk.
        let cut = data.len() - 12 - 6;
        data.truncate(cut);

        let parsed = scan_text_chunks(&data, false);
        assert_eq!(parsed.value.len(), 1);
        assert_eq!(parsed.value[0].text, "first");
        assert!(matches!(
            parsed.diagnostics.as_slice(),
            [Diagnostic::TruncatedChunk { .. }]
        ));
    }

    #[test]
    fn oversized_length_stops_scan() {
        let mut data = PNG_SIGNATURE.to_vec();
        data.extend(text_chunk("prompt", "kept"));
        data.extend(u32::MAX.to_be_bytes());
        data.extend(b"tEXt");
        data.extend(b"short");

        let parsed = scan_text_chunks(&data, false);
        assert_eq!(parsed.value.len(), 1);
        assert_eq!(parsed.diagnostics.len(), 1);
    }

    #[test]
    fn crc_mismatch_is_skipped_only_when_verifying() {
        let mut bad = text_chunk("prompt", "tampered");
        let last = bad.len() - 1;
        bad[last] ^= 0xFF;
        let data = png(&[bad]);

        let unchecked = scan_text_chunks(&data, false);
        assert_eq!(unchecked.value.len(), 1);
        assert!(unchecked.is_clean());

        let checked = scan_text_chunks(&data, true);
        assert!(checked.value.is_empty());
        assert!(matches!(
            checked.diagnostics.as_slice(),
            [Diagnostic::CrcMismatch { chunk_type, .. }] if chunk_type == "tEXt"
        ));
    }

    #[test]
    fn compressed_itxt_is_skipped() {
        let mut data = b"parameters\0".to_vec();
        data.extend([1, 0]);
        data.extend(b"\0\0");
        data.extend([0x78, 0x9c, 0x03, 0x00]);
        let parsed = scan_text_chunks(&png(&[chunk(b"iTXt", &data)]), false);

        assert!(parsed.value.is_empty());
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::CompressedText {
                keyword: "parameters".into()
            }]
        );
    }

    #[test]
    fn chunk_without_nul_is_ignored() {
        let parsed = scan_text_chunks(&png(&[chunk(b"tEXt", b"no separator")]), false);
        assert!(parsed.value.is_empty());
    }

    #[test]
    fn missing_signature_yields_nothing() {
        let parsed = scan_text_chunks(b"GIF89a....", false);
        assert!(parsed.value.is_empty());
        assert!(parsed.is_clean());
    }

    #[test]
    fn chunks_after_iend_are_ignored() {
        let mut data = png(&[]);
        data.extend(text_chunk("prompt", "after end"));
        assert!(scan_text_chunks(&data, false).value.is_empty());
    }
}
