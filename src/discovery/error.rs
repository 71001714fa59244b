//! Discovery Error Types

use crate::core::error_handling::ContextualError;
use crate::core::locator::LocatorError;
use crate::core::retry::Transient;

/// Errors raised while listing targets from the hosting platform
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Credentials rejected; the run cannot continue
    #[error("authorization rejected for {endpoint}: {message}")]
    Unauthorized { endpoint: String, message: String },

    /// Advisory: the API rate limit has been reached
    #[error("rate limit reached while requesting {endpoint}")]
    RateLimited { endpoint: String },

    /// Advisory: the platform accepted the request and is still processing it
    #[error("{endpoint} was accepted and is still being processed")]
    Accepted { endpoint: String },

    #[error("{endpoint} returned HTTP {status}: {message}")]
    Api {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("request to {endpoint} failed: {cause}")]
    Transport { endpoint: String, cause: String },

    #[error("could not decode response from {endpoint}: {cause}")]
    Decode { endpoint: String, cause: String },

    /// No team with the requested name; fatal for the team scope only
    #[error("unable to find the team '{team}' in '{org}'; perhaps the user is not a member?{}",
        .lookup_error.as_ref().map(|e| format!(" Error was: {}", e)).unwrap_or_default())]
    TeamNotFound {
        org: String,
        team: String,
        lookup_error: Option<String>,
    },

    #[error(transparent)]
    Locator(#[from] LocatorError),
}

impl DiscoveryError {
    /// Advisory conditions are logged and never abort the run by themselves
    pub fn is_advisory(&self) -> bool {
        matches!(
            self,
            DiscoveryError::RateLimited { .. } | DiscoveryError::Accepted { .. }
        )
    }
}

impl Transient for DiscoveryError {
    fn is_transient(&self) -> bool {
        self.is_advisory()
    }
}

impl ContextualError for DiscoveryError {
    fn is_user_actionable(&self) -> bool {
        matches!(self, DiscoveryError::Unauthorized { .. })
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            DiscoveryError::Unauthorized { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;
