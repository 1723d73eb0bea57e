//! Error types used inside component boundaries.
//!
//! Public entry points never return these: the transcoder and the metadata
//! scanner convert them into result values or diagnostics. They exist so the
//! internal steps can use `?` and so the CLI can tell bad input and
//! configuration apart from internal failures.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading the artist trigger vocabulary.
#[derive(Debug, Error)]
pub enum TriggerLoadError {
    /// The vocabulary file could not be opened or read
    #[error("cannot read trigger file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The vocabulary file is not parseable as CSV
    #[error("cannot parse trigger file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Errors raised while reading an image file.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The image file does not exist or cannot be read
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The EXIF block could not be parsed
    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),
}

/// Errors in environment configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A boolean variable held something other than a recognised flag value
    #[error("invalid value for {name}: '{value}' (expected true/false, 1/0, yes/no, on/off)")]
    InvalidBool { name: &'static str, value: String },
}

/// Bad prompt input given to the CLI.
#[derive(Debug, Error)]
pub enum InputError {
    /// The prompt was empty or whitespace only
    #[error("Prompt cannot be empty")]
    EmptyPrompt,

    /// Standard input could not be read
    #[error("Failed to read prompt from stdin")]
    Stdin(#[from] std::io::Error),

    /// Standard input held bytes that are not UTF-8
    #[error("Prompt must be valid UTF-8")]
    InvalidUtf8,
}
