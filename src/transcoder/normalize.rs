/// Punctuation that is read as a tag separator.
const SEPARATOR_ALIASES: [char; 3] = ['。', '、', '，'];

/// Cleans up the separators of a serialized prompt.
///
/// # Normalization rules
///
/// - Maps `。`, `、` and `，` to `,`
/// - Collapses runs of commas, and the whitespace around them, into `", "`
/// - Trims leading and trailing commas and whitespace
///
/// # Examples
///
/// ```
/// use sdprompt::transcoder::normalize;
///
/// assert_eq!(normalize("a ,b,, ,c"), "a, b, c");
/// assert_eq!(normalize(", 1girl。solo、smile ,"), "1girl, solo, smile");
/// assert_eq!(normalize(" , "), "");
/// ```
#[must_use]
pub fn normalize(text: &str) -> String {
    let unified: String = text
        .chars()
        .map(|c| if SEPARATOR_ALIASES.contains(&c) { ',' } else { c })
        .collect();

    unified
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chinese_punctuation_becomes_comma() {
        assert_eq!(normalize("a。b、c，d"), "a, b, c, d");
    }

    #[test]
    fn test_whitespace_around_commas_collapsed() {
        assert_eq!(normalize("a   ,   b"), "a, b");
        assert_eq!(normalize("a\n,\tb"), "a, b");
    }

    #[test]
    fn test_inner_whitespace_preserved() {
        assert_eq!(normalize("long hair,  blue  eyes"), "long hair, blue  eyes");
    }

    #[test]
    fn test_multiple_commas_collapsed() {
        assert_eq!(normalize("a,,,b"), "a, b");
        assert_eq!(normalize("a, ,, b"), "a, b");
    }

    #[test]
    fn test_leading_and_trailing_commas_trimmed() {
        assert_eq!(normalize(",,a, b,,"), "a, b");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize(" x ,, y 。z ");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
    }
}
