//! Shared helpers for locating the artist vocabulary.
//!
//! These functions are used by the CLI to turn configuration into a resolver.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::artist::{ArtistPrefixResolver, CsvTriggerSource};

/// File name of the bundled Danbooru artist list.
pub const TRIGGER_FILE_NAME: &str = "danbooru_art.csv";

/// Gets the cross-platform data-directory location of the vocabulary.
///
/// Returns `{data_dir}/sdprompt/danbooru_art.csv` where `data_dir` is:
/// - Linux: `~/.local/share`
/// - macOS: `~/Library/Application Support`
/// - Windows: `C:\Users\<user>\AppData\Roaming`
///
/// Returns `None` if the data directory cannot be determined.
pub fn data_trigger_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("sdprompt").join(TRIGGER_FILE_NAME))
}

/// Places a vocabulary file is looked for, in order.
pub fn trigger_candidates(working_dir: &Path) -> Vec<PathBuf> {
    let mut candidates = vec![working_dir.join(TRIGGER_FILE_NAME)];
    candidates.extend(data_trigger_path());
    candidates
}

/// Picks the vocabulary file: `explicit` if given, else the first existing
/// candidate.
pub fn find_trigger_file(explicit: Option<&Path>, working_dir: &Path) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    trigger_candidates(working_dir)
        .into_iter()
        .find(|path| path.is_file())
}

/// Builds a resolver for `explicit` or the default vocabulary location.
///
/// With no vocabulary available the resolver never adds prefixes. An
/// explicit path that cannot be read is reported through the resolver's
/// diagnostics on first use.
pub fn resolver_for(explicit: Option<&Path>, working_dir: &Path) -> ArtistPrefixResolver {
    match find_trigger_file(explicit, working_dir) {
        Some(path) => {
            debug!(path = %path.display(), "using artist vocabulary");
            ArtistPrefixResolver::new(CsvTriggerSource::new(path))
        }
        None => {
            debug!("no artist vocabulary found");
            ArtistPrefixResolver::none()
        }
    }
}
