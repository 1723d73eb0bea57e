//! Soft diagnostics for permissive parsing.
//!
//! Nothing in this crate fails on malformed prompts or damaged image files.
//! Instead, the anomalies that were tolerated are collected alongside the
//! value so callers can inspect them if they care.

use std::fmt;

use serde::Serialize;

/// An anomaly that was absorbed while producing a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A closing bracket with no open bracket to match. `offset` is a char index.
    UnmatchedClose { offset: usize, bracket: char },
    /// Input ended while brackets were still open.
    UnclosedBrackets { depth: usize },
    /// A backslash was the last character of the input.
    DanglingEscape,
    /// A weight group carried a weight with no bracket representation.
    NonPositiveWeight { tag: String, weight: String },
    /// A PNG chunk header, body or CRC ran past the end of the stream.
    TruncatedChunk { offset: usize },
    /// A PNG chunk failed CRC verification and was skipped.
    CrcMismatch { chunk_type: String, offset: usize },
    /// A compressed iTXt chunk was skipped.
    CompressedText { keyword: String },
    /// Some bytes of a text field could not be decoded and were dropped.
    UndecodableText { field: String },
    /// The EXIF block could not be read.
    Exif { message: String },
    /// The artist trigger vocabulary could not be loaded.
    TriggerLoad { message: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnmatchedClose { offset, bracket } => {
                write!(f, "unmatched '{bracket}' at position {offset} ignored")
            }
            Self::UnclosedBrackets { depth } => {
                write!(f, "{depth} bracket(s) left open at end of input")
            }
            Self::DanglingEscape => write!(f, "trailing backslash kept literally"),
            Self::NonPositiveWeight { tag, weight } => {
                write!(f, "weight {weight} on '{tag}' has no bracket form, emitted bare")
            }
            Self::TruncatedChunk { offset } => {
                write!(f, "chunk at byte {offset} is truncated, scan stopped")
            }
            Self::CrcMismatch { chunk_type, offset } => {
                write!(f, "{chunk_type} chunk at byte {offset} failed CRC check, skipped")
            }
            Self::CompressedText { keyword } => {
                write!(f, "compressed iTXt chunk '{keyword}' skipped")
            }
            Self::UndecodableText { field } => {
                write!(f, "undecodable bytes dropped from '{field}'")
            }
            Self::Exif { message } => write!(f, "EXIF unreadable: {message}"),
            Self::TriggerLoad { message } => {
                write!(f, "artist triggers unavailable: {message}")
            }
        }
    }
}

/// A value together with the diagnostics produced while computing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed<T> {
    pub value: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Parsed<T> {
    /// Wraps a value with no diagnostics.
    pub fn clean(value: T) -> Self {
        Self {
            value,
            diagnostics: Vec::new(),
        }
    }

    pub fn new(value: T, diagnostics: Vec<Diagnostic>) -> Self {
        Self { value, diagnostics }
    }

    /// Returns true when nothing had to be tolerated.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Transforms the value, keeping the diagnostics.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Parsed<U> {
        Parsed {
            value: f(self.value),
            diagnostics: self.diagnostics,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
