//! EXIF `UserComment` extraction for JPEG and WEBP files.
//!
//! The comment starts with an 8-byte character code that says how the rest
//! is encoded. WebUI writes `UNICODE\0` followed by UTF-16.

use std::io::Cursor;

use exif::{In, Reader, Tag, Value};
use tracing::debug;

use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::ScanError;

use super::text::{decode_utf8, decode_utf16, trim_field};

/// Numeric id of the `UserComment` tag.
pub const USER_COMMENT_TAG: u16 = 37510;

const UNICODE_CODE: &[u8] = b"UNICODE\0";
const ASCII_CODE: &[u8] = b"ASCII\0\0\0";
const JIS_CODE: &[u8] = b"JIS\0\0\0\0\0";
const UNDEFINED_CODE: &[u8] = &[0; 8];

/// Raw `UserComment` bytes and the byte order of the EXIF block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserComment {
    pub bytes: Vec<u8>,
    pub little_endian: bool,
}

/// Reads the `UserComment` field from any container `kamadak-exif` supports.
///
/// Returns `Ok(None)` when the file has no EXIF block or no comment.
pub fn read_user_comment(data: &[u8]) -> Result<Option<UserComment>, ScanError> {
    let exif = match Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(container)) => {
            debug!(container, "no EXIF block");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let Some(field) = exif.get_field(Tag::UserComment, In::PRIMARY) else {
        return Ok(None);
    };

    let bytes = match &field.value {
        Value::Undefined(bytes, _) => bytes.clone(),
        Value::Byte(bytes) => bytes.clone(),
        Value::Ascii(lines) => lines.join(&b'\n'),
        _ => return Ok(None),
    };

    Ok(Some(UserComment {
        bytes,
        little_endian: exif.little_endian(),
    }))
}

/// Decodes the comment text according to its character code.
///
/// # Examples
///
/// ```
/// use sdprompt::metadata::{UserComment, decode_user_comment};
///
/// let mut bytes = b"UNICODE\0".to_vec();
/// bytes.extend("a cat".encode_utf16().flat_map(u16::to_be_bytes));
/// let comment = UserComment { bytes, little_endian: false };
/// assert_eq!(decode_user_comment(&comment).value, "a cat");
/// ```
pub fn decode_user_comment(comment: &UserComment) -> Parsed<String> {
    let bytes = comment.bytes.as_slice();

    let (text, dropped) = if let Some(body) = bytes.strip_prefix(UNICODE_CODE) {
        decode_utf16(body, comment.little_endian)
    } else if let Some(body) = bytes
        .strip_prefix(ASCII_CODE)
        .or_else(|| bytes.strip_prefix(JIS_CODE))
        .or_else(|| bytes.strip_prefix(UNDEFINED_CODE))
    {
        decode_utf8(body)
    } else if let Some(body) = bytes.strip_prefix(b"UNICODE") {
        decode_utf8(body)
    } else {
        decode_utf8(bytes)
    };

    let diagnostics = if dropped {
        vec![Diagnostic::UndecodableText {
            field: "UserComment".to_string(),
        }]
    } else {
        Vec::new()
    };
    Parsed::new(trim_field(&text).to_string(), diagnostics)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a little-endian TIFF block with one Exif IFD holding `comment`.
    pub(crate) fn tiff_with_user_comment(comment: &[u8]) -> Vec<u8> {
        let mut tiff = Vec::new();
        tiff.extend(b"II");
        tiff.extend(42u16.to_le_bytes());
        tiff.extend(8u32.to_le_bytes());
        // IFD0: one entry pointing to the Exif IFD at offset 26.
        tiff.extend(1u16.to_le_bytes());
        tiff.extend(0x8769u16.to_le_bytes());
        tiff.extend(4u16.to_le_bytes());
        tiff.extend(1u32.to_le_bytes());
        tiff.extend(26u32.to_le_bytes());
        tiff.extend(0u32.to_le_bytes());
        // Exif IFD: UserComment, UNDEFINED, data at offset 44.
        tiff.extend(1u16.to_le_bytes());
        tiff.extend(USER_COMMENT_TAG.to_le_bytes());
        tiff.extend(7u16.to_le_bytes());
        tiff.extend((comment.len() as u32).to_le_bytes());
        tiff.extend(44u32.to_le_bytes());
        tiff.extend(0u32.to_le_bytes());
        tiff.extend(comment);
        tiff
    }

    /// Wraps a TIFF block into a minimal JPEG with an APP1 Exif segment.
    pub(crate) fn jpeg_with_user_comment(comment: &[u8]) -> Vec<u8> {
        let mut payload = b"Exif\0\0".to_vec();
        payload.extend(tiff_with_user_comment(comment));

        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend(((payload.len() + 2) as u16).to_be_bytes());
        jpeg.extend(payload);
        jpeg.extend([0xFF, 0xD9]);
        jpeg
    }

    pub(crate) fn unicode_comment(text: &str) -> Vec<u8> {
        let mut bytes = UNICODE_CODE.to_vec();
        bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
        bytes
    }

    fn comment(bytes: &[u8]) -> UserComment {
        UserComment {
            bytes: bytes.to_vec(),
            little_endian: true,
        }
    }

    #[test]
    fn reads_comment_from_jpeg() {
        let data = jpeg_with_user_comment(b"ASCII\0\0\0hello world");
        let found = read_user_comment(&data).unwrap().unwrap();

        assert_eq!(found.bytes, b"ASCII\0\0\0hello world");
        assert!(found.little_endian);
    }

    #[test]
    fn jpeg_without_exif_has_no_comment() {
        let data = [0xFF, 0xD8, 0xFF, 0xD9];
        assert_eq!(read_user_comment(&data).unwrap(), None);
    }

    #[test]
    fn unicode_comment_is_utf16() {
        let decoded = decode_user_comment(&comment(&unicode_comment("1girl, 猫")));
        assert_eq!(decoded.value, "1girl, 猫");
        assert!(decoded.is_clean());
    }

    #[test]
    fn ascii_and_undefined_codes_are_stripped() {
        assert_eq!(decode_user_comment(&comment(b"ASCII\0\0\0text")).value, "text");
        assert_eq!(
            decode_user_comment(&comment(b"\0\0\0\0\0\0\0\0text")).value,
            "text"
        );
    }

    #[test]
    fn short_unicode_marker_is_stripped() {
        assert_eq!(decode_user_comment(&comment(b"UNICODEtext")).value, "text");
    }

    #[test]
    fn comment_without_code_is_utf8() {
        let decoded = decode_user_comment(&comment(b"plain \xfftext"));
        assert_eq!(decoded.value, "plain text");
        assert_eq!(decoded.diagnostics.len(), 1);
    }
}
