//! Bidirectional prompt conversion between the brace and parenthesis dialects.
//!
//! A conversion parses the prompt with the source [`Dialect`], applies the
//! [`ArtistPrefixResolver`] to every tag, serializes with the other dialect,
//! and [`normalize`]s the separators of the result.
//!
//! # Examples
//!
//! ```
//! use sdprompt::artist::{ArtistPrefixResolver, StaticTriggerSource};
//! use sdprompt::transcoder::PromptTranscoderBuilder;
//!
//! let transcoder = PromptTranscoderBuilder::new()
//!     .resolver(ArtistPrefixResolver::new(StaticTriggerSource::new(["wlop"])))
//!     .build();
//!
//! assert_eq!(
//!     transcoder.expand_to_source("{{masterpiece}}, wlop, [blurry]"),
//!     "(masterpiece:1.103), artist:wlop, (blurry:0.952)"
//! );
//! assert_eq!(
//!     transcoder.collapse_to_target("(masterpiece:1.103), (blurry:0.952)"),
//!     "{{masterpiece}}, [blurry]"
//! );
//! ```

mod dialect;
mod escape;
mod normalize;

use std::fmt;

use tracing::debug;

pub use dialect::{Dialect, NaiDialect, SdDialect};
pub use escape::{escape_nai, escape_sd};
pub use normalize::normalize;

use crate::artist::ArtistPrefixResolver;
use crate::diagnostics::Parsed;
use crate::weight::WeightGrammar;

/// Result text returned for input that is not UTF-8.
pub const INVALID_INPUT_MESSAGE: &str = "Error: Input must be valid UTF-8";

/// Which way a conversion goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `{tag}` / `[tag]` to `(tag:1.050)`.
    NaiToSd,
    /// `(tag:1.050)` to `{tag}` / `[tag]`.
    SdToNai,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NaiToSd => write!(f, "nai-to-sd"),
            Self::SdToNai => write!(f, "sd-to-nai"),
        }
    }
}

/// Builder for [`PromptTranscoder`].
#[derive(Debug, Default)]
pub struct PromptTranscoderBuilder {
    resolver: Option<ArtistPrefixResolver>,
    grammar: Option<WeightGrammar>,
    split_nested_commas: bool,
}

impl PromptTranscoderBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the artist resolver. Without one, no tag is ever prefixed.
    pub fn resolver(mut self, resolver: ArtistPrefixResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the weight factor and precision.
    pub fn grammar(mut self, grammar: WeightGrammar) -> Self {
        self.grammar = Some(grammar);
        self
    }

    /// Split at commas inside brackets as well as at depth 0.
    pub fn split_nested_commas(mut self, split: bool) -> Self {
        self.split_nested_commas = split;
        self
    }

    pub fn build(self) -> PromptTranscoder {
        let grammar = self.grammar.unwrap_or_default();
        PromptTranscoder {
            nai: NaiDialect::new(grammar, self.split_nested_commas),
            sd: SdDialect::new(grammar, self.split_nested_commas),
            resolver: self.resolver.unwrap_or_default(),
        }
    }
}

/// Converts prompts between the two dialects.
///
/// Every operation is total: malformed prompts are converted as well as
/// they can be, and the tolerated anomalies are available through the
/// `*_with_diagnostics` variants.
#[derive(Debug)]
pub struct PromptTranscoder {
    nai: NaiDialect,
    sd: SdDialect,
    resolver: ArtistPrefixResolver,
}

impl Default for PromptTranscoder {
    fn default() -> Self {
        PromptTranscoderBuilder::new().build()
    }
}

impl PromptTranscoder {
    pub fn new(resolver: ArtistPrefixResolver) -> Self {
        PromptTranscoderBuilder::new().resolver(resolver).build()
    }

    pub fn resolver(&self) -> &ArtistPrefixResolver {
        &self.resolver
    }

    /// Brace notation to parenthesis notation.
    pub fn expand_to_source(&self, prompt: &str) -> String {
        self.convert(prompt, Direction::NaiToSd)
    }

    /// Parenthesis notation to brace notation.
    pub fn collapse_to_target(&self, prompt: &str) -> String {
        self.convert(prompt, Direction::SdToNai)
    }

    pub fn convert(&self, prompt: &str, direction: Direction) -> String {
        self.convert_with_diagnostics(prompt, direction).into_value()
    }

    /// Converts raw bytes, returning an error message when they are not UTF-8.
    pub fn convert_bytes(&self, prompt: &[u8], direction: Direction) -> String {
        match std::str::from_utf8(prompt) {
            Ok(text) => self.convert(text, direction),
            Err(_) => INVALID_INPUT_MESSAGE.to_string(),
        }
    }

    pub fn convert_with_diagnostics(&self, prompt: &str, direction: Direction) -> Parsed<String> {
        let (from, to): (&dyn Dialect, &dyn Dialect) = match direction {
            Direction::NaiToSd => (&self.nai, &self.sd),
            Direction::SdToNai => (&self.sd, &self.nai),
        };
        self.transcode(prompt, from, to)
    }

    fn transcode(&self, prompt: &str, from: &dyn Dialect, to: &dyn Dialect) -> Parsed<String> {
        let Parsed {
            value: tags,
            mut diagnostics,
        } = from.parse(prompt);

        let tags: Vec<_> = tags
            .iter()
            .map(|tag| tag.with_text(self.resolver.resolve(tag.text())))
            .collect();
        diagnostics.extend(self.resolver.diagnostics());

        debug!(
            from = from.name(),
            to = to.name(),
            tags = tags.len(),
            tolerated = diagnostics.len(),
            "transcoded prompt"
        );

        Parsed::new(normalize(&to.serialize(&tags)), diagnostics)
    }
}
