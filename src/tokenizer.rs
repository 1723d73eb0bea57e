//! Bracket-counting tokenizer for weighted prompts.
//!
//! The tokenizer scans a prompt once, left to right, keeping a stack of open
//! brackets. Every tag receives the cumulative weight of the brackets that
//! enclose it. Malformed input is never rejected: stray closers are ignored,
//! open brackets at the end of input are tolerated, and both are reported as
//! [`Diagnostic`]s.

use crate::diagnostics::{Diagnostic, Parsed};
use crate::models::Tag;
use crate::weight::{LayerKind, WeightGrammar};

/// Which characters open brackets, and how commas inside brackets behave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenizerOptions {
    /// Opening character of an amplify bracket: `{` for NAI, `(` for SD.
    pub amplify_open: char,
    /// Opening character of an attenuate bracket.
    pub attenuate_open: char,
    /// Split tags at commas inside brackets, not only at depth 0.
    pub split_nested_commas: bool,
}

impl TokenizerOptions {
    /// `{tag}` amplifies, `[tag]` attenuates, `(` is plain text.
    pub const fn nai() -> Self {
        Self {
            amplify_open: '{',
            attenuate_open: '[',
            split_nested_commas: false,
        }
    }

    /// `(tag)` amplifies, `[tag]` attenuates, `{` is plain text.
    pub const fn sd() -> Self {
        Self {
            amplify_open: '(',
            attenuate_open: '[',
            split_nested_commas: false,
        }
    }

    #[must_use]
    pub const fn split_nested_commas(mut self, split: bool) -> Self {
        self.split_nested_commas = split;
        self
    }
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self::nai()
    }
}

/// One open bracket while scanning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketFrame {
    pub kind: LayerKind,
    pub cumulative_weight: f64,
}

/// Matching closer for an opening bracket character.
pub(crate) fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        other => other,
    }
}

#[derive(Debug, Clone, Default)]
pub struct TagTokenizer {
    options: TokenizerOptions,
    grammar: WeightGrammar,
}

impl TagTokenizer {
    pub fn new(options: TokenizerOptions, grammar: WeightGrammar) -> Self {
        Self { options, grammar }
    }

    pub fn options(&self) -> TokenizerOptions {
        self.options
    }

    fn opening(&self, ch: char) -> Option<LayerKind> {
        if ch == self.options.amplify_open {
            Some(LayerKind::Amplify)
        } else if ch == self.options.attenuate_open {
            Some(LayerKind::Attenuate)
        } else {
            None
        }
    }

    fn is_closing(&self, ch: char) -> bool {
        ch == closing_for(self.options.amplify_open)
            || ch == closing_for(self.options.attenuate_open)
    }

    /// Splits `prompt` into tags with resolved weights, in source order.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdprompt::tokenizer::TagTokenizer;
    ///
    /// let tags = TagTokenizer::default().tokenize("{{a}[b]}, c").into_value();
    /// let pairs: Vec<_> = tags.iter().map(|t| (t.text(), t.weight())).collect();
    /// assert_eq!(pairs, vec![("a", 1.103), ("b", 1.0), ("c", 1.0)]);
    /// ```
    pub fn tokenize(&self, prompt: &str) -> Parsed<Vec<Tag>> {
        let mut tags = Vec::new();
        let mut diagnostics = Vec::new();
        let mut stack: Vec<BracketFrame> = Vec::new();
        let mut buffer = String::new();
        let mut escaped = false;

        for (offset, ch) in prompt.chars().enumerate() {
            if escaped {
                buffer.push(ch);
                escaped = false;
                continue;
            }
            if ch == '\\' {
                escaped = true;
                continue;
            }

            if let Some(kind) = self.opening(ch) {
                self.flush(&mut buffer, &stack, &mut tags);
                let cumulative_weight = top_weight(&stack) * self.grammar.factor_for(kind);
                stack.push(BracketFrame {
                    kind,
                    cumulative_weight,
                });
            } else if self.is_closing(ch) {
                self.flush(&mut buffer, &stack, &mut tags);
                if stack.pop().is_none() {
                    diagnostics.push(Diagnostic::UnmatchedClose {
                        offset,
                        bracket: ch,
                    });
                }
            } else if ch == ',' && (stack.is_empty() || self.options.split_nested_commas) {
                self.flush(&mut buffer, &stack, &mut tags);
            } else {
                buffer.push(ch);
            }
        }

        if escaped {
            buffer.push('\\');
            diagnostics.push(Diagnostic::DanglingEscape);
        }
        self.flush(&mut buffer, &stack, &mut tags);
        if !stack.is_empty() {
            diagnostics.push(Diagnostic::UnclosedBrackets { depth: stack.len() });
        }

        Parsed::new(tags, diagnostics)
    }

    /// Emits the buffered fragment. Commas left at either edge by an
    /// unsplit bracket body are separators, not tag text.
    fn flush(&self, buffer: &mut String, stack: &[BracketFrame], tags: &mut Vec<Tag>) {
        let text = buffer.trim_matches(|c: char| c == ',' || c.is_whitespace());
        if !text.is_empty() {
            let weight = self.grammar.round(top_weight(stack));
            tags.push(Tag::new(text, weight));
        }
        buffer.clear();
    }
}

fn top_weight(stack: &[BracketFrame]) -> f64 {
    stack.last().map_or(1.0, |frame| frame.cumulative_weight)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(tokenizer: &TagTokenizer, prompt: &str) -> Vec<(String, f64)> {
        tokenizer
            .tokenize(prompt)
            .into_value()
            .into_iter()
            .map(|tag| (tag.text().to_string(), tag.weight()))
            .collect()
    }

    fn owned(expected: &[(&str, f64)]) -> Vec<(String, f64)> {
        expected.iter().map(|(t, w)| (t.to_string(), *w)).collect()
    }

    #[test]
    fn bare_tags_split_on_commas() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(
            pairs(&tokenizer, "1girl, solo ,  smile"),
            owned(&[("1girl", 1.0), ("solo", 1.0), ("smile", 1.0)])
        );
    }

    #[test]
    fn backslash_strips_bracket_meaning() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(pairs(&tokenizer, r"a\{b\}c"), owned(&[("a{b}c", 1.0)]));

        let sd = TagTokenizer::new(TokenizerOptions::sd(), WeightGrammar::default());
        let parsed = sd.tokenize(r"a\(b\)c");
        assert!(parsed.is_clean());
        assert_eq!(parsed.value, vec![Tag::neutral("a(b)c")]);
    }

    #[test]
    fn escaped_backslash_is_literal() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(pairs(&tokenizer, r"a\\b"), owned(&[(r"a\b", 1.0)]));
    }

    #[test]
    fn unmatched_close_is_absorbed() {
        let sd = TagTokenizer::new(TokenizerOptions::sd(), WeightGrammar::default());
        let parsed = sd.tokenize("a)b");

        assert_eq!(parsed.value, vec![Tag::neutral("a"), Tag::neutral("b")]);
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::UnmatchedClose {
                offset: 1,
                bracket: ')'
            }]
        );
    }

    #[test]
    fn nested_amplify_and_attenuate_accumulate() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(
            pairs(&tokenizer, "{{a}[b]}"),
            owned(&[("a", 1.103), ("b", 1.0)])
        );
        assert_eq!(
            pairs(&tokenizer, "{{{a}}}, [[b]]"),
            owned(&[("a", 1.158), ("b", 0.907)])
        );
    }

    #[test]
    fn unterminated_brackets_keep_current_weight() {
        let tokenizer = TagTokenizer::default();
        let parsed = tokenizer.tokenize("{{highres");

        assert_eq!(parsed.value, vec![Tag::new("highres", 1.103)]);
        assert_eq!(
            parsed.diagnostics,
            vec![Diagnostic::UnclosedBrackets { depth: 2 }]
        );
    }

    #[test]
    fn commas_inside_brackets_do_not_split_by_default() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(
            pairs(&tokenizer, "{blue eyes, long hair}, smile"),
            owned(&[("blue eyes, long hair", 1.05), ("smile", 1.0)])
        );
    }

    #[test]
    fn commas_inside_brackets_split_when_enabled() {
        let options = TokenizerOptions::nai().split_nested_commas(true);
        let tokenizer = TagTokenizer::new(options, WeightGrammar::default());
        assert_eq!(
            pairs(&tokenizer, "{blue eyes, long hair}, smile"),
            owned(&[("blue eyes", 1.05), ("long hair", 1.05), ("smile", 1.0)])
        );
    }

    #[test]
    fn other_dialect_brackets_are_plain_text() {
        let tokenizer = TagTokenizer::default();
        assert_eq!(
            pairs(&tokenizer, "{name_(series)}"),
            owned(&[("name_(series)", 1.05)])
        );
    }

    #[test]
    fn trailing_backslash_is_reported() {
        let tokenizer = TagTokenizer::default();
        let parsed = tokenizer.tokenize("tag\\");

        assert_eq!(parsed.value, vec![Tag::neutral("tag\\")]);
        assert_eq!(parsed.diagnostics, vec![Diagnostic::DanglingEscape]);
    }

    #[test]
    fn empty_and_whitespace_prompts_yield_no_tags() {
        let tokenizer = TagTokenizer::default();
        assert!(tokenizer.tokenize("").value.is_empty());
        assert!(tokenizer.tokenize(" , {} ,[ ]").value.is_empty());
    }

    #[test]
    fn commas_at_fragment_edges_are_dropped() {
        let sd = TagTokenizer::new(TokenizerOptions::sd(), WeightGrammar::default());
        assert_eq!(
            pairs(&sd, "(masterpiece, "),
            owned(&[("masterpiece", 1.05)])
        );
        assert_eq!(
            pairs(&TagTokenizer::default(), "{, a, b ,}"),
            owned(&[("a, b", 1.05)])
        );
    }

    #[test]
    fn order_is_preserved_across_bracket_boundaries() {
        let tokenizer = TagTokenizer::default();
        let texts: Vec<String> = tokenizer
            .tokenize("a{b}c[d]e")
            .into_value()
            .into_iter()
            .map(|t| t.text().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c", "d", "e"]);
    }
}
