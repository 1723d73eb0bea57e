pub mod artist;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod metadata;
pub mod models;
pub mod tokenizer;
pub mod transcoder;
pub mod utils;
pub mod weight;

pub use artist::{ArtistPrefixResolver, CsvTriggerSource, StaticTriggerSource, TriggerSource};
pub use config::Config;
pub use diagnostics::{Diagnostic, Parsed};
pub use error::{ConfigError, InputError, ScanError, TriggerLoadError};
pub use metadata::{MetadataKey, MetadataReport, MetadataScanner, ScanOptions};
pub use models::Tag;
pub use tokenizer::{TagTokenizer, TokenizerOptions};
pub use transcoder::{Direction, PromptTranscoder, PromptTranscoderBuilder};
pub use weight::{LayerKind, WeightGrammar};
