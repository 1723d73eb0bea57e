use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use image::ImageFormat;
use serde::Serialize;
use tracing::{debug, warn};

use crate::diagnostics::{Diagnostic, Parsed};
use crate::error::ScanError;

use super::exif::{decode_user_comment, read_user_comment};
use super::fields::split_parameters;
use super::png::{TextChunk, scan_text_chunks};
use super::{MetadataKey, MetadataReport};

pub const UNSUPPORTED_FORMAT: &str = "unsupported image format";

/// Containers the scanner understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageKind {
    Png,
    Jpeg,
    Webp,
}

impl ImageKind {
    /// Detects the container from magic bytes.
    pub fn detect(data: &[u8]) -> Option<Self> {
        match image::guess_format(data).ok()? {
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Skip PNG chunks whose CRC does not match.
    pub verify_crc: bool,
    /// Report text chunks with unrecognised keywords.
    pub include_auxiliary: bool,
}

/// Text recovered from a container before it is structured into fields.
#[derive(Debug, Default)]
struct RawMetadata {
    parameters: Option<String>,
    prompt: Option<String>,
    description: Option<String>,
    auxiliary: Vec<TextChunk>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataScanner {
    options: ScanOptions,
}

impl MetadataScanner {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ScanOptions {
        self.options
    }

    /// Reads `path` and extracts its metadata.
    ///
    /// An unreadable file yields a report with a single `Error` field.
    pub fn extract(&self, path: impl AsRef<Path>) -> MetadataReport {
        let path = path.as_ref();
        let read = fs::read(path).map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        });
        match read {
            Ok(data) => self.extract_bytes(&data),
            Err(e) => {
                warn!(error = %e, "cannot read image");
                MetadataReport::error(e.to_string())
            }
        }
    }

    pub fn extract_bytes(&self, data: &[u8]) -> MetadataReport {
        let Some(kind) = ImageKind::detect(data) else {
            debug!(len = data.len(), "unrecognised image container");
            return MetadataReport::status(None, UNSUPPORTED_FORMAT);
        };

        let Parsed { value, diagnostics } = match kind {
            ImageKind::Png => self.read_png(data),
            ImageKind::Jpeg | ImageKind::Webp => read_exif(data),
        };
        debug!(
            format = ?kind,
            diagnostics = diagnostics.len(),
            "metadata scanned"
        );

        MetadataReport::new(Some(kind), self.structure(value), diagnostics)
    }

    fn read_png(&self, data: &[u8]) -> Parsed<RawMetadata> {
        let Parsed { value, diagnostics } = scan_text_chunks(data, self.options.verify_crc);
        let mut raw = RawMetadata::default();

        for chunk in value {
            let slot = match chunk.keyword.to_ascii_lowercase().as_str() {
                "parameters" => &mut raw.parameters,
                "prompt" => &mut raw.prompt,
                "description" => &mut raw.description,
                _ => {
                    raw.auxiliary.push(chunk);
                    continue;
                }
            };
            // First chunk of each kind wins.
            if slot.is_none() && !chunk.text.is_empty() {
                *slot = Some(chunk.text);
            }
        }

        Parsed::new(raw, diagnostics)
    }

    fn structure(&self, raw: RawMetadata) -> BTreeMap<MetadataKey, String> {
        let mut fields = BTreeMap::new();

        if let Some(blob) = raw.parameters {
            let split = split_parameters(&blob);
            insert(&mut fields, MetadataKey::Prompt, split.prompt);
            insert(&mut fields, MetadataKey::NegativePrompt, split.negative_prompt);
            insert(&mut fields, MetadataKey::Parameters, split.parameters);
        }
        if !fields.contains_key(&MetadataKey::Prompt) {
            insert(&mut fields, MetadataKey::Prompt, raw.prompt);
        }
        insert(&mut fields, MetadataKey::Description, raw.description);

        if self.options.include_auxiliary {
            for chunk in raw.auxiliary {
                fields
                    .entry(MetadataKey::Chunk(chunk.keyword))
                    .or_insert(chunk.text);
            }
        }

        if !fields.keys().any(is_core) {
            fields.insert(MetadataKey::Status, super::NOTHING_FOUND.to_string());
        }
        fields
    }
}

fn is_core(key: &MetadataKey) -> bool {
    !matches!(
        key,
        MetadataKey::Chunk(_) | MetadataKey::Status | MetadataKey::Error
    )
}

fn insert(fields: &mut BTreeMap<MetadataKey, String>, key: MetadataKey, value: Option<String>) {
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        fields.insert(key, value);
    }
}

fn read_exif(data: &[u8]) -> Parsed<RawMetadata> {
    let comment = match read_user_comment(data) {
        Ok(Some(comment)) => comment,
        Ok(None) => return Parsed::clean(RawMetadata::default()),
        Err(e) => {
            warn!(error = %e, "cannot parse EXIF block");
            return Parsed::new(
                RawMetadata::default(),
                vec![Diagnostic::Exif {
                    message: e.to_string(),
                }],
            );
        }
    };

    decode_user_comment(&comment).map(|text| RawMetadata {
        parameters: Some(text),
        ..RawMetadata::default()
    })
}
