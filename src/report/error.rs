//! Report Error Types

use crate::core::error_handling::ContextualError;
use std::path::PathBuf;

/// A tool result file that could not be turned into a [`ScanResult`]
///
/// [`ScanResult`]: crate::report::result::ScanResult
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("line {line}: {source}")]
    TruffleHogLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid repo-supervisor document: {0}")]
    RepoSupervisor(#[source] serde_json::Error),
}

/// Errors writing the aggregated output
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("could not read results from {path}: {source}")]
    ReadResults {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write output file {path}: {source}")]
    WriteOutput {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not serialize merged report: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ContextualError for ReportError {
    fn is_user_actionable(&self) -> bool {
        false
    }

    fn user_message(&self) -> Option<&str> {
        None
    }
}

pub type ReportResult<T> = Result<T, ReportError>;
