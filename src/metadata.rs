//! Recovery of generation parameters embedded in image files.
//!
//! PNG files carry them in `tEXt`/`iTXt` chunks, JPEG and WEBP files in the
//! EXIF `UserComment` field. Either way the result is a [`MetadataReport`]
//! keyed by a small closed set of [`MetadataKey`]s. Extraction never fails:
//! a missing file becomes an `Error` field, and a file without prompt
//! metadata becomes a `Status` field.
//!
//! # Examples
//!
//! ```no_run
//! use sdprompt::metadata::{MetadataKey, MetadataScanner};
//!
//! let report = MetadataScanner::default().extract("00001-1234.png");
//! if let Some(prompt) = report.get(&MetadataKey::Prompt) {
//!     println!("prompt: {prompt}");
//! }
//! for (key, value) in report.to_map() {
//!     println!("{key}: {value}");
//! }
//! ```

mod exif;
mod fields;
mod png;
mod scanner;
mod text;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

pub use self::exif::{USER_COMMENT_TAG, UserComment, decode_user_comment, read_user_comment};
pub use self::fields::{GenerationFields, NEGATIVE_MARKER, STEPS_MARKER, split_parameters};
pub use self::png::{PNG_SIGNATURE, TextChunk, chunk_crc, scan_text_chunks};
pub use self::scanner::{ImageKind, MetadataScanner, ScanOptions};

use crate::diagnostics::Diagnostic;

/// Keys of a [`MetadataReport`], in display order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetadataKey {
    Prompt,
    NegativePrompt,
    Parameters,
    Description,
    /// A text chunk with an unrecognised keyword.
    Chunk(String),
    Status,
    Error,
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prompt => write!(f, "Prompt"),
            Self::NegativePrompt => write!(f, "Negative Prompt"),
            Self::Parameters => write!(f, "Parameters"),
            Self::Description => write!(f, "Description"),
            Self::Chunk(keyword) => write!(f, "{keyword}"),
            Self::Status => write!(f, "Status"),
            Self::Error => write!(f, "Error"),
        }
    }
}

impl Serialize for MetadataKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub const NOTHING_FOUND: &str = "no prompt metadata found";

/// Fields recovered from one image, plus what was tolerated on the way.
///
/// A report always holds at least one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetadataReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<ImageKind>,
    fields: BTreeMap<MetadataKey, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    diagnostics: Vec<Diagnostic>,
}

impl MetadataReport {
    pub(crate) fn new(
        format: Option<ImageKind>,
        mut fields: BTreeMap<MetadataKey, String>,
        diagnostics: Vec<Diagnostic>,
    ) -> Self {
        if fields.is_empty() {
            fields.insert(MetadataKey::Status, NOTHING_FOUND.to_string());
        }
        Self {
            format,
            fields,
            diagnostics,
        }
    }

    /// A report holding only a `Status` message.
    pub fn status(format: Option<ImageKind>, message: impl Into<String>) -> Self {
        let fields = BTreeMap::from([(MetadataKey::Status, message.into())]);
        Self::new(format, fields, Vec::new())
    }

    /// A report holding only an `Error` message.
    pub fn error(message: impl Into<String>) -> Self {
        let fields = BTreeMap::from([(MetadataKey::Error, message.into())]);
        Self::new(None, fields, Vec::new())
    }

    pub fn format(&self) -> Option<ImageKind> {
        self.format
    }

    pub fn get(&self, key: &MetadataKey) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<MetadataKey, String> {
        &self.fields
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Whether any prompt-related field was recovered.
    pub fn has_prompt_data(&self) -> bool {
        self.fields.keys().any(|key| {
            matches!(
                key,
                MetadataKey::Prompt
                    | MetadataKey::NegativePrompt
                    | MetadataKey::Parameters
                    | MetadataKey::Description
            )
        })
    }

    /// The fields as a plain string map.
    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        for (key, value) in &self.fields {
            map.entry(key.to_string()).or_insert_with(|| value.clone());
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_gets_status() {
        let report = MetadataReport::new(None, BTreeMap::new(), Vec::new());

        assert_eq!(report.get(&MetadataKey::Status), Some(NOTHING_FOUND));
        assert!(!report.has_prompt_data());
    }

    #[test]
    fn keys_display_with_spaces() {
        assert_eq!(MetadataKey::NegativePrompt.to_string(), "Negative Prompt");
        assert_eq!(MetadataKey::Chunk("Software".into()).to_string(), "Software");
    }

    #[test]
    fn report_serializes_as_string_keyed_map() {
        let fields = BTreeMap::from([
            (MetadataKey::Prompt, "a cat".to_string()),
            (MetadataKey::NegativePrompt, "blurry".to_string()),
        ]);
        let report = MetadataReport::new(Some(ImageKind::Png), fields, Vec::new());
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["format"], "png");
        assert_eq!(json["fields"]["Prompt"], "a cat");
        assert_eq!(json["fields"]["Negative Prompt"], "blurry");
        assert!(json.get("diagnostics").is_none());
    }

    #[test]
    fn to_map_uses_display_names() {
        let report = MetadataReport::error("cannot read x.png");
        let map = report.to_map();
        assert_eq!(map.get("Error").map(String::as_str), Some("cannot read x.png"));
        assert_eq!(map.len(), 1);
    }
}
