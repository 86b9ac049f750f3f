//! Loader — raw uploaded text to a validated batch of strategy records.
//!
//! Expected document: `{ "strategies": [ StrategyRecord, ... ] }`.
//! - Absent or null `strategies` field → empty batch, not an error.
//! - Malformed JSON or wrong top-level shape → [`ParseError`].
//! - A single record without a usable `test_period` is skipped with a
//!   warning; the rest of the batch is kept.
//! - A record without a usable `id` gets a positional one, `#<n>` (1-based).
//!
//! Loading never touches session state; callers decide whether to apply
//! the returned [`Dataset`].

use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::period::list_periods;
use crate::record::StrategyRecord;

/// The uploaded text could not be turned into records.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("malformed JSON at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unexpected document shape: {0}")]
    Shape(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        Self::Syntax {
            line: e.line(),
            column: e.column(),
            message: e.to_string(),
        }
    }
}

/// Errors from loading a file from disk.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// A successfully parsed upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub records: Vec<StrategyRecord>,
    /// BLAKE3 hex digest of the source text.
    pub fingerprint: String,
}

impl Dataset {
    /// Parse uploaded text into a dataset.
    pub fn from_text(text: &str) -> Result<Self, ParseError> {
        let records = parse_records(text)?;
        Ok(Self {
            records,
            fingerprint: fingerprint(text),
        })
    }

    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            fingerprint: fingerprint(""),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Parse the `strategies` array out of a JSON document.
pub fn parse_records(text: &str) -> Result<Vec<StrategyRecord>, ParseError> {
    let document: Value = serde_json::from_str(text)?;

    let Value::Object(mut root) = document else {
        return Err(ParseError::Shape(format!(
            "expected a top-level object, found {}",
            kind_of(&document)
        )));
    };

    let strategies = match root.remove("strategies") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ParseError::Shape(format!(
                "'strategies' must be an array, found {}",
                kind_of(&other)
            )))
        }
    };

    let total = strategies.len();
    let records: Vec<StrategyRecord> = strategies
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match serde_json::from_value::<StrategyRecord>(item) {
            Ok(mut record) => {
                if record.id.is_empty() {
                    record.id = format!("#{}", i + 1);
                }
                Some(record)
            }
            Err(e) => {
                warn!(index = i, error = %e, "skipping strategy record");
                None
            }
        })
        .collect();

    if records.len() < total {
        warn!(
            kept = records.len(),
            skipped = total - records.len(),
            "some strategy records were unusable"
        );
    }
    Ok(records)
}

/// Read and parse a file from disk.
pub fn load_file(path: &Path) -> Result<Dataset, LoadError> {
    debug!(path = %path.display(), "reading strategy file");
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dataset = Dataset::from_text(&text)?;
    info!(
        path = %path.display(),
        records = dataset.len(),
        periods = list_periods(&dataset.records).len(),
        fingerprint = %&dataset.fingerprint[..12],
        "loaded strategy file"
    );
    Ok(dataset)
}

fn fingerprint(text: &str) -> String {
    blake3::hash(text.as_bytes()).to_hex().to_string()
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
