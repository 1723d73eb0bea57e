use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::diagnostics::Diagnostic;

use super::source::{NoTriggers, TriggerSource};

/// Literal marker that namespaces an artist tag.
pub const ARTIST_PREFIX: &str = "artist:";

/// Vocabulary after the one and only load.
#[derive(Debug, Default)]
struct TriggerSet {
    names: HashSet<String>,
    failure: Option<String>,
}

/// Outcome of loading the trigger vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerLoadReport {
    pub count: usize,
    pub failure: Option<String>,
}

/// Adds the `artist:` prefix to bare tags that name a known artist.
///
/// The vocabulary is loaded from the configured [`TriggerSource`] on first
/// use and kept for the lifetime of the resolver. Concurrent first calls
/// load it once. A source that fails to load leaves the vocabulary empty,
/// so tags pass through unchanged.
///
/// # Examples
///
/// ```
/// use sdprompt::artist::{ArtistPrefixResolver, StaticTriggerSource};
///
/// let resolver = ArtistPrefixResolver::new(StaticTriggerSource::new(["Wlop"]));
/// assert_eq!(resolver.resolve("WLOP"), "artist:WLOP");
/// assert_eq!(resolver.resolve("artist:wlop"), "artist:wlop");
/// assert_eq!(resolver.resolve("1girl"), "1girl");
/// ```
pub struct ArtistPrefixResolver {
    source: Box<dyn TriggerSource>,
    triggers: OnceLock<TriggerSet>,
}

impl ArtistPrefixResolver {
    pub fn new(source: impl TriggerSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            triggers: OnceLock::new(),
        }
    }

    /// A resolver that never adds prefixes.
    pub fn none() -> Self {
        Self::new(NoTriggers)
    }

    fn triggers(&self) -> &TriggerSet {
        self.triggers.get_or_init(|| match self.source.load() {
            Ok(names) => {
                let names: HashSet<String> =
                    names.into_iter().map(|name| name.to_lowercase()).collect();
                debug!(
                    source = %self.source.describe(),
                    count = names.len(),
                    "loaded artist triggers"
                );
                TriggerSet {
                    names,
                    failure: None,
                }
            }
            Err(e) => {
                warn!(source = %self.source.describe(), error = %e, "artist triggers unavailable");
                TriggerSet {
                    names: HashSet::new(),
                    failure: Some(e.to_string()),
                }
            }
        })
    }

    /// Returns `tag` with the artist prefix added when it names a known artist.
    pub fn resolve(&self, tag: &str) -> String {
        if has_artist_prefix(tag) {
            return tag.to_string();
        }
        if self.triggers().names.contains(&tag.to_lowercase()) {
            format!("{ARTIST_PREFIX}{tag}")
        } else {
            tag.to_string()
        }
    }

    /// Loads the vocabulary if needed and reports how it went.
    pub fn load_report(&self) -> TriggerLoadReport {
        let triggers = self.triggers();
        TriggerLoadReport {
            count: triggers.names.len(),
            failure: triggers.failure.clone(),
        }
    }

    /// The vocabulary failure, if any, as a soft diagnostic.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.triggers()
            .failure
            .iter()
            .map(|message| Diagnostic::TriggerLoad {
                message: message.clone(),
            })
            .collect()
    }
}

impl Default for ArtistPrefixResolver {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Debug for ArtistPrefixResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtistPrefixResolver")
            .field("source", &self.source.describe())
            .field("loaded", &self.triggers.get().is_some())
            .finish()
    }
}

/// Whether `tag` already starts with `artist:`, ignoring case.
pub fn has_artist_prefix(tag: &str) -> bool {
    tag.get(..ARTIST_PREFIX.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(ARTIST_PREFIX))
}
