//! Pipeline Error Types

use crate::core::error_handling::ContextualError;
use crate::discovery::error::DiscoveryError;
use std::path::PathBuf;

/// Errors that abort a run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// A precondition of the requested mode does not hold
    #[error("{message}")]
    Preflight { message: String },

    #[error("could not prepare directory {path}: {source}")]
    Bootstrap {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not read existing clones in {path}: {source}")]
    ScanOnly {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn preflight(message: impl Into<String>) -> Self {
        Self::Preflight {
            message: message.into(),
        }
    }
}

impl ContextualError for PipelineError {
    fn is_user_actionable(&self) -> bool {
        match self {
            PipelineError::Preflight { .. } => true,
            PipelineError::Discovery(e) => e.is_user_actionable(),
            _ => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            PipelineError::Preflight { message } => Some(message),
            PipelineError::Discovery(e) => e.user_message(),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
