//! Target discovery against the hosting platform

pub mod discoverer;
pub mod error;
pub mod github;
pub mod source;
pub mod types;

pub use discoverer::{adhoc_target, DiscoveryOptions, TargetDiscoverer};
pub use error::{DiscoveryError, DiscoveryResult};
pub use github::GitHubClient;
pub use source::{collect_pages, OwnRepoFilter, Page, RepositorySource};
pub use types::{Account, RemoteGist, RemoteRepo, ScanTarget, ScopeRequest, TargetKind, Team};
