//! Escaping of literal brackets inside tag text.

/// Whether an underscore should be inserted before a `(` at this position.
///
/// Applies the `name_(series)` convention: the parenthesis is glued to the
/// preceding word unless it starts the tag, follows whitespace, or already
/// follows an underscore or backslash.
fn needs_underscore(prev: Option<char>) -> bool {
    prev.is_some_and(|c| !(c == '_' || c == '\\' || c.is_whitespace()))
}

/// Escapes text for the parenthesis dialect.
///
/// `(`, `)`, `[`, `]` and `\` are backslash-escaped. With `glue_parens`,
/// an underscore is also inserted before an opening parenthesis per
/// [`needs_underscore`].
///
/// # Examples
///
/// ```
/// use sdprompt::transcoder::escape_sd;
///
/// assert_eq!(escape_sd("mamimi(mamamimi)", true), r"mamimi_\(mamamimi\)");
/// assert_eq!(escape_sd("name_(series)", true), r"name_\(series\)");
/// assert_eq!(escape_sd("name(series)", false), r"name\(series\)");
/// ```
pub fn escape_sd(text: &str, glue_parens: bool) -> String {
    let mut out = String::with_capacity(text.len() + 4);
    let mut prev = None;
    for ch in text.chars() {
        match ch {
            '(' => {
                if glue_parens && needs_underscore(prev) {
                    out.push('_');
                }
                out.push_str("\\(");
            }
            ')' | '[' | ']' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
        prev = Some(ch);
    }
    out
}

/// Escapes text for the brace dialect: `{`, `}`, `[`, `]` and `\`.
pub fn escape_nai(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '{' | '}' | '[' | ']' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Removes backslash escapes: `\x` becomes `x`.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}

/// Inserts an underscore before each `(` that is glued to a preceding word.
pub fn glue_parens(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    let mut prev = None;
    for ch in text.chars() {
        if ch == '(' && needs_underscore(prev) {
            out.push('_');
        }
        out.push(ch);
        prev = Some(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_sd_keeps_existing_underscore() {
        assert_eq!(escape_sd("a_(b)", true), r"a_\(b\)");
    }

    #[test]
    fn escape_sd_does_not_glue_leading_or_spaced_parens() {
        assert_eq!(escape_sd("(b)", true), r"\(b\)");
        assert_eq!(escape_sd("name (series)", true), r"name \(series\)");
    }

    #[test]
    fn escape_sd_escapes_square_brackets_and_backslash() {
        assert_eq!(escape_sd(r"a[b]\c", false), r"a\[b\]\\c");
    }

    #[test]
    fn escape_nai_escapes_braces() {
        assert_eq!(escape_nai("{a}[b](c)"), r"\{a\}\[b\](c)");
    }

    #[test]
    fn unescape_removes_backslashes() {
        assert_eq!(unescape(r"name_\(series\)"), "name_(series)");
        assert_eq!(unescape(r"a\\b"), r"a\b");
        assert_eq!(unescape("tail\\"), "tail\\");
    }

    #[test]
    fn glue_parens_inserts_missing_underscore() {
        assert_eq!(glue_parens("mamimi(mamamimi)"), "mamimi_(mamamimi)");
        assert_eq!(glue_parens("mamimi_(mamamimi)"), "mamimi_(mamamimi)");
        assert_eq!(glue_parens("(solo)"), "(solo)");
    }
}
