//! Discovery data model
//!
//! Raw descriptors as returned by the hosting API and the immutable
//! [`ScanTarget`] the rest of the pipeline consumes.

use serde::Deserialize;
use std::fmt;

/// Where a target was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    OrgRepo,
    UserRepo,
    TeamRepo,
    Gist,
    AdHocRepo,
    AdHocGist,
}

impl TargetKind {
    pub fn is_gist(&self) -> bool {
        matches!(self, TargetKind::Gist | TargetKind::AdHocGist)
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TargetKind::OrgRepo => "organization repository",
            TargetKind::UserRepo => "user repository",
            TargetKind::TeamRepo => "team repository",
            TargetKind::Gist => "gist",
            TargetKind::AdHocRepo => "repository",
            TargetKind::AdHocGist => "gist",
        };
        f.write_str(label)
    }
}

/// One clonable and scannable unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// Repository name or gist id; also the clone directory name
    pub name: String,
    pub kind: TargetKind,
    pub https_url: String,
    /// SSH locator, when one is known for this target
    pub ssh_url: Option<String>,
    pub fork: bool,
    /// Owning organization, user or team
    pub scope: String,
}

impl ScanTarget {
    /// Clone locator to use: SSH when preferred and available, HTTPS otherwise
    pub fn locator(&self, prefer_ssh: bool) -> &str {
        match (&self.ssh_url, prefer_ssh) {
            (Some(ssh), true) => ssh,
            _ => &self.https_url,
        }
    }
}

/// Account reference (repository owner, organization member)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub login: String,
}

/// Repository descriptor as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteRepo {
    pub name: String,
    pub clone_url: String,
    #[serde(default)]
    pub ssh_url: Option<String>,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub owner: Option<Account>,
}

impl RemoteRepo {
    pub fn into_target(self, kind: TargetKind, scope: &str) -> ScanTarget {
        ScanTarget {
            name: self.name,
            kind,
            https_url: self.clone_url,
            ssh_url: self.ssh_url,
            fork: self.fork,
            scope: scope.to_string(),
        }
    }

    /// Whether `url` is one of this repository's clone locators
    pub fn matches_url(&self, url: &str) -> bool {
        self.clone_url == url || self.ssh_url.as_deref() == Some(url)
    }
}

/// Gist descriptor as listed by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteGist {
    pub id: String,
    pub git_pull_url: String,
}

/// Organization team
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Team {
    pub id: u64,
    pub name: String,
}

/// Scope requested for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeRequest {
    Organization {
        org: String,
        team: Option<String>,
        org_only: bool,
    },
    User(String),
    Repository(String),
    Gist(String),
}

impl fmt::Display for ScopeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScopeRequest::Organization { org, .. } => write!(f, "organization {}", org),
            ScopeRequest::User(user) => write!(f, "user {}", user),
            ScopeRequest::Repository(url) => write!(f, "repository {}", url),
            ScopeRequest::Gist(url) => write!(f, "gist {}", url),
        }
    }
}
