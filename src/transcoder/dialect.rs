//! The two weighted-tag dialects.
//!
//! Both dialects expose the same `parse`/`serialize` pair, but they do not
//! parse alike. [`NaiDialect`] counts nested braces and square brackets.
//! [`SdDialect`] looks for flat `(text:weight)` groups and only counts
//! brackets in the text between them, so a group nested inside another
//! parenthesis does not inherit the outer emphasis.

use std::sync::LazyLock;

use regex::Regex;

use crate::diagnostics::{Diagnostic, Parsed};
use crate::models::Tag;
use crate::tokenizer::{TagTokenizer, TokenizerOptions};
use crate::weight::{LayerKind, WeightGrammar};

use super::escape::{escape_nai, escape_sd, glue_parens, unescape};

/// Matches either an escape pair or a flat `(body:weight)` group.
///
/// Escape pairs are matched so that an escaped parenthesis can never open
/// a group; only captures with `body` set are weight groups.
static WEIGHT_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\\.|\((?P<body>(?:\\.|[^\\()])*?):\s*(?P<weight>[+-]?(?:\d+(?:\.\d*)?|\.\d+))\s*\)",
    )
    .expect("weight group pattern is valid")
});

/// A weighted-tag syntax that can be read into tags and written back.
pub trait Dialect: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Reads a prompt into tags with resolved weights.
    fn parse(&self, prompt: &str) -> Parsed<Vec<Tag>>;

    /// Writes one tag in this dialect's weight notation.
    fn serialize_tag(&self, tag: &Tag) -> String;

    /// Writes tags joined by `", "`.
    fn serialize(&self, tags: &[Tag]) -> String {
        tags.iter()
            .map(|tag| self.serialize_tag(tag))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// NovelAI notation: `{tag}` multiplies by the factor, `[tag]` divides.
#[derive(Debug, Clone)]
pub struct NaiDialect {
    tokenizer: TagTokenizer,
    grammar: WeightGrammar,
}

impl NaiDialect {
    pub fn new(grammar: WeightGrammar, split_nested_commas: bool) -> Self {
        let options = TokenizerOptions::nai().split_nested_commas(split_nested_commas);
        Self {
            tokenizer: TagTokenizer::new(options, grammar),
            grammar,
        }
    }
}

impl Default for NaiDialect {
    fn default() -> Self {
        Self::new(WeightGrammar::default(), false)
    }
}

impl Dialect for NaiDialect {
    fn name(&self) -> &'static str {
        "nai"
    }

    fn parse(&self, prompt: &str) -> Parsed<Vec<Tag>> {
        self.tokenizer.tokenize(prompt)
    }

    /// # Examples
    ///
    /// ```
    /// use sdprompt::Tag;
    /// use sdprompt::transcoder::{Dialect, NaiDialect};
    ///
    /// let nai = NaiDialect::default();
    /// assert_eq!(nai.serialize_tag(&Tag::new("smile", 1.103)), "{{smile}}");
    /// assert_eq!(nai.serialize_tag(&Tag::new("smile", 0.907)), "[[smile]]");
    /// assert_eq!(nai.serialize_tag(&Tag::new("smile", 1.0)), "smile");
    /// ```
    fn serialize_tag(&self, tag: &Tag) -> String {
        let text = escape_nai(tag.text());
        let (open, close) = match self.grammar.weight_to_layers(tag.weight()) {
            (LayerKind::Amplify, count) => ("{".repeat(count as usize), "}".repeat(count as usize)),
            (LayerKind::Attenuate, count) => {
                ("[".repeat(count as usize), "]".repeat(count as usize))
            }
            (LayerKind::None, _) => return text,
        };
        format!("{open}{text}{close}")
    }
}

/// Stable Diffusion WebUI notation: `(tag:1.2)`, plus `(tag)` and `[tag]`.
#[derive(Debug, Clone)]
pub struct SdDialect {
    tokenizer: TagTokenizer,
    grammar: WeightGrammar,
}

impl SdDialect {
    pub fn new(grammar: WeightGrammar, split_nested_commas: bool) -> Self {
        let options = TokenizerOptions::sd().split_nested_commas(split_nested_commas);
        Self {
            tokenizer: TagTokenizer::new(options, grammar),
            grammar,
        }
    }

    fn parse_plain(&self, text: &str, tags: &mut Vec<Tag>, diagnostics: &mut Vec<Diagnostic>) {
        let parsed = self.tokenizer.tokenize(text);
        tags.extend(parsed.value);
        diagnostics.extend(parsed.diagnostics);
    }
}

impl Default for SdDialect {
    fn default() -> Self {
        Self::new(WeightGrammar::default(), false)
    }
}

impl Dialect for SdDialect {
    fn name(&self) -> &'static str {
        "sd"
    }

    fn parse(&self, prompt: &str) -> Parsed<Vec<Tag>> {
        let mut tags = Vec::new();
        let mut diagnostics = Vec::new();
        let mut last_end = 0;

        for caps in WEIGHT_GROUP.captures_iter(prompt) {
            let (Some(body), Some(weight)) = (caps.name("body"), caps.name("weight")) else {
                continue;
            };
            let Some(whole) = caps.get(0) else {
                continue;
            };

            self.parse_plain(&prompt[last_end..whole.start()], &mut tags, &mut diagnostics);
            last_end = whole.end();

            let text = glue_parens(&unescape(body.as_str()));
            if text.trim().is_empty() {
                continue;
            }
            // The pattern only admits decimal literals, so this parse succeeds.
            let value = weight.as_str().parse::<f64>().unwrap_or(1.0);
            if value <= 0.0 {
                diagnostics.push(Diagnostic::NonPositiveWeight {
                    tag: text.trim().to_string(),
                    weight: weight.as_str().to_string(),
                });
            }
            tags.push(Tag::new(text, self.grammar.round(value)));
        }

        self.parse_plain(&prompt[last_end..], &mut tags, &mut diagnostics);
        Parsed::new(tags, diagnostics)
    }

    /// # Examples
    ///
    /// ```
    /// use sdprompt::Tag;
    /// use sdprompt::transcoder::{Dialect, SdDialect};
    ///
    /// let sd = SdDialect::default();
    /// assert_eq!(sd.serialize_tag(&Tag::new("smile", 1.103)), "(smile:1.103)");
    /// assert_eq!(sd.serialize_tag(&Tag::new("a(b)", 1.05)), r"(a_\(b\):1.050)");
    /// assert_eq!(sd.serialize_tag(&Tag::new("smile", 1.0)), "smile");
    /// assert_eq!(sd.serialize_tag(&Tag::neutral("name_(series)")), "name_(series)");
    /// ```
    fn serialize_tag(&self, tag: &Tag) -> String {
        if self.grammar.is_neutral(tag.weight()) {
            tag.text().to_string()
        } else {
            format!(
                "({}:{:.3})",
                escape_sd(tag.text(), true),
                self.grammar.round(tag.weight())
            )
        }
    }
}
