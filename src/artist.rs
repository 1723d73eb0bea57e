//! Artist tag disambiguation.
//!
//! Bare tags are compared, case-insensitively, against a vocabulary of known
//! artist triggers. Matches are rewritten to `artist:<tag>` so the target
//! tool treats them as artist references instead of content tags.
//!
//! The vocabulary comes from a [`TriggerSource`]: a CSV file
//! ([`CsvTriggerSource`]), a fixed set ([`StaticTriggerSource`]) or nothing
//! ([`NoTriggers`]).

mod resolver;
mod source;

pub use resolver::{ARTIST_PREFIX, ArtistPrefixResolver, TriggerLoadReport, has_artist_prefix};
pub use source::{CsvTriggerSource, NoTriggers, StaticTriggerSource, TriggerSource};
