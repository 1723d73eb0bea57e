//! Sources of the artist trigger vocabulary.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::error::TriggerLoadError;

/// Something that can produce the set of known artist tags.
///
/// Implementations return names as they appear in the source; the resolver
/// lower-cases them.
pub trait TriggerSource: Send + Sync {
    /// Loads the vocabulary.
    fn load(&self) -> Result<HashSet<String>, TriggerLoadError>;

    /// Short human-readable description used in log lines.
    fn describe(&self) -> String;
}

/// Loads triggers from a CSV file.
///
/// When a header row names a `trigger` column, that column is used.
/// Otherwise the first column of every row is taken, header row included,
/// so a single-column file without header works as well.
#[derive(Debug, Clone)]
pub struct CsvTriggerSource {
    path: PathBuf,
}

impl CsvTriggerSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TriggerSource for CsvTriggerSource {
    fn load(&self) -> Result<HashSet<String>, TriggerLoadError> {
        let file = File::open(&self.path).map_err(|source| TriggerLoadError::Io {
            path: self.path.clone(),
            source,
        })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| TriggerLoadError::Csv {
                path: self.path.clone(),
                source,
            })?;
            rows.push(record);
        }

        Ok(triggers_from_rows(&rows))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn clean_cell(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

fn triggers_from_rows(rows: &[csv::StringRecord]) -> HashSet<String> {
    let Some(header) = rows.first() else {
        return HashSet::new();
    };

    let trigger_column = header
        .iter()
        .position(|cell| clean_cell(cell).eq_ignore_ascii_case("trigger"));

    let (column, data) = match trigger_column {
        Some(index) => (index, &rows[1..]),
        None => (0, rows),
    };

    data.iter()
        .filter_map(|row| row.get(column))
        .map(clean_cell)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect()
}

/// A fixed in-memory vocabulary.
#[derive(Debug, Clone, Default)]
pub struct StaticTriggerSource {
    names: HashSet<String>,
}

impl StaticTriggerSource {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }
}

impl TriggerSource for StaticTriggerSource {
    fn load(&self) -> Result<HashSet<String>, TriggerLoadError> {
        Ok(self.names.clone())
    }

    fn describe(&self) -> String {
        format!("{} in-memory trigger(s)", self.names.len())
    }
}

/// No vocabulary; nothing is ever prefixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTriggers;

impl TriggerSource for NoTriggers {
    fn load(&self) -> Result<HashSet<String>, TriggerLoadError> {
        Ok(HashSet::new())
    }

    fn describe(&self) -> String {
        "no triggers".to_string()
    }
}
