//! Environment configuration.
//!
//! Values come from the process environment, after `.env` has been loaded by
//! the binary. Command-line flags take precedence over anything read here.

use std::path::PathBuf;

use crate::error::ConfigError;

pub const TRIGGERS_VAR: &str = "SDPROMPT_TRIGGERS";
pub const SPLIT_NESTED_COMMAS_VAR: &str = "SDPROMPT_SPLIT_NESTED_COMMAS";
pub const VERIFY_CRC_VAR: &str = "SDPROMPT_VERIFY_CRC";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Explicit path to the artist trigger CSV.
    pub triggers: Option<PathBuf>,
    pub split_nested_commas: bool,
    pub verify_crc: bool,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBool` if a boolean variable holds an
    /// unrecognised value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let triggers = lookup(TRIGGERS_VAR)
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        let flag = |name: &'static str| match lookup(name) {
            Some(value) => parse_bool(name, &value),
            None => Ok(false),
        };

        Ok(Self {
            triggers,
            split_nested_commas: flag(SPLIT_NESTED_COMMAS_VAR)?,
            verify_crc: flag(VERIFY_CRC_VAR)?,
        })
    }
}

/// Parses the usual spellings of a boolean flag. Empty means false.
pub fn parse_bool(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
