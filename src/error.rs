// Error taxonomy for the reconciliation pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Problems reading one source table. `Missing` and `Malformed` are recovered
/// by the caller (empty table / skipped row); `Io` is terminal.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("line {line}: {reason}")]
    Malformed { line: usize, reason: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SourceError {
    pub fn malformed(line: usize, reason: impl Into<String>) -> Self {
        SourceError::Malformed {
            line,
            reason: reason.into(),
        }
    }
}

/// Terminal conditions of a conversion run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Downstream reporting cannot proceed on an empty dataset.
    #[error("no output rows: {0}")]
    EmptyResult(String),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl PipelineError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;
