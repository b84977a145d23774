//! Pipeline error taxonomy. Every variant is terminal for the current run.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("log source {} could not be read: {source}", .path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no timestamps matched in a readable log ({lines} lines scanned); check the log format")]
    EmptyResult { lines: usize },

    #[error("insufficient data for a linear fit: need {needed} points, have {have}")]
    InsufficientData { needed: usize, have: usize },

    #[error("baseline residuals have zero variance; z-scores are undefined")]
    ZeroVariance,

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

impl AnalysisError {
    /// Wrap an I/O failure on a stream that has no path (stdin, in-memory).
    pub(crate) fn unreadable_stream(source: std::io::Error) -> Self {
        Self::SourceUnavailable {
            path: PathBuf::from("<stream>"),
            source,
        }
    }
}

pub type Result<T, E = AnalysisError> = std::result::Result<T, E>;
