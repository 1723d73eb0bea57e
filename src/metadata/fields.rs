//! Splitting of WebUI-style `parameters` blobs.
//!
//! A blob looks like:
//!
//! ```text
//! a cat, masterpiece
//! Negative prompt: bad hands
//! Steps: 20, Sampler: Euler a, CFG scale: 7
//! ```

use super::text::trim_field;

pub const NEGATIVE_MARKER: &str = "Negative prompt:";
pub const STEPS_MARKER: &str = "Steps:";

/// The three logical parts of a generation-parameters blob.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationFields {
    pub prompt: Option<String>,
    pub negative_prompt: Option<String>,
    pub parameters: Option<String>,
}

fn non_empty(text: &str) -> Option<String> {
    let text = trim_field(text);
    (!text.is_empty()).then(|| text.to_string())
}

/// Finds `Steps:`, preferring an occurrence at the start of a line.
fn find_steps(text: &str) -> Option<usize> {
    if text.starts_with(STEPS_MARKER) {
        return Some(0);
    }
    text.match_indices(STEPS_MARKER)
        .map(|(index, _)| index)
        .find(|&index| text[..index].ends_with('\n'))
        .or_else(|| text.find(STEPS_MARKER))
}

fn split_steps(text: &str) -> (&str, Option<String>) {
    match find_steps(text) {
        Some(index) => (&text[..index], non_empty(&text[index..])),
        None => (text, None),
    }
}

/// Splits a blob at `Negative prompt:` and `Steps:`.
///
/// A blob that contains neither marker is returned whole as `parameters`,
/// which makes splitting an already-split `parameters` value a no-op.
///
/// # Examples
///
/// ```
/// use sdprompt::metadata::split_parameters;
///
/// let fields = split_parameters("a cat\nNegative prompt: blurry\nSteps: 20, CFG scale: 7");
/// assert_eq!(fields.prompt.as_deref(), Some("a cat"));
/// assert_eq!(fields.negative_prompt.as_deref(), Some("blurry"));
/// assert_eq!(fields.parameters.as_deref(), Some("Steps: 20, CFG scale: 7"));
/// ```
pub fn split_parameters(blob: &str) -> GenerationFields {
    let blob = trim_field(blob);

    if let Some((prompt, rest)) = blob.split_once(NEGATIVE_MARKER) {
        let (negative, parameters) = split_steps(rest);
        return GenerationFields {
            prompt: non_empty(prompt),
            negative_prompt: non_empty(negative),
            parameters,
        };
    }

    match find_steps(blob) {
        Some(_) => {
            let (prompt, parameters) = split_steps(blob);
            GenerationFields {
                prompt: non_empty(prompt),
                negative_prompt: None,
                parameters,
            }
        }
        None => GenerationFields {
            parameters: non_empty(blob),
            ..GenerationFields::default()
        },
    }
}
