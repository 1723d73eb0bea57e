use serde::{Deserialize, Serialize};

/// One prompt token together with its resolved weight.
///
/// Tags only live for the duration of one conversion: the tokenizer creates
/// them and the serializer consumes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    text: String,
    weight: f64,
}

impl Tag {
    /// Creates a tag, trimming surrounding whitespace from `text`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sdprompt::Tag;
    ///
    /// let tag = Tag::new("  masterpiece ", 1.103);
    /// assert_eq!(tag.text(), "masterpiece");
    /// assert_eq!(tag.weight(), 1.103);
    /// ```
    pub fn new(text: impl AsRef<str>, weight: f64) -> Self {
        Self {
            text: text.as_ref().trim().to_string(),
            weight,
        }
    }

    /// Creates a tag with the neutral weight 1.0.
    pub fn neutral(text: impl AsRef<str>) -> Self {
        Self::new(text, 1.0)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Returns the same weight with different text.
    #[must_use]
    pub fn with_text(&self, text: impl AsRef<str>) -> Self {
        Self::new(text, self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_text() {
        let tag = Tag::new("\t1girl \n", 1.0);
        assert_eq!(tag.text(), "1girl");
    }

    #[test]
    fn neutral_has_unit_weight() {
        let tag = Tag::neutral("solo");
        assert_eq!(tag.weight(), 1.0);
    }

    #[test]
    fn with_text_keeps_weight() {
        let tag = Tag::new("greg", 0.952);
        let renamed = tag.with_text("artist:greg");

        assert_eq!(renamed.text(), "artist:greg");
        assert_eq!(renamed.weight(), 0.952);
    }
}
