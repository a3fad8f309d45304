// error.rs - Error type shared by every pipeline stage

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a typing run.
///
/// "No schema for this lineage" is deliberately absent: it is a normal
/// terminal outcome and is reported through `PipelineOutcome::NoSchema`.
#[derive(Debug, Error)]
pub enum TypingError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("taxonomy error: {0}")]
    Taxonomy(String),

    #[error("{tool} exited with {status}: {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("external program '{program}' was not found")]
    ToolNotFound { program: String },

    #[error("expected output file '{}' does not exist", .0.display())]
    MissingOutput(PathBuf),

    #[error("output file '{}' is empty", .0.display())]
    EmptyOutput(PathBuf),

    #[error("allele call matrix '{}' has no data row", .0.display())]
    EmptyCallRow(PathBuf),

    #[error("locus set does not match the master profile table (missing: [{}], unexpected: [{}])", missing.join(", "), extra.join(", "))]
    LocusMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    #[error("row '{sentinel}' not found in cluster table '{}'", path.display())]
    SentinelNotFound { sentinel: String, path: PathBuf },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl TypingError {
    /// Attach a path to an I/O error
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TypingError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<csv::Error> for TypingError {
    fn from(e: csv::Error) -> Self {
        TypingError::Parse(format!("TSV error: {}", e))
    }
}

impl From<serde_json::Error> for TypingError {
    fn from(e: serde_json::Error) -> Self {
        TypingError::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TypingError>;
