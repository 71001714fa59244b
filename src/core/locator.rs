//! Clone Locator Parsing
//!
//! Structured view over the HTTPS and SSH (scp-like) clone URLs used for
//! repositories and gists. Parsing is delegated to `gix-url` so both
//! `https://host/owner/name.git` and `git@host:owner/name.git` forms produce the
//! same scheme/host/owner/name breakdown.

use std::fmt;

/// Hosts served by the public GitHub instance
const DEFAULT_HOSTS: &[&str] = &["github.com", "gist.github.com"];

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum LocatorError {
    #[error("'{input}' is not a valid clone URL: {reason}")]
    Invalid { input: String, reason: String },

    #[error("'{0}' has no host component")]
    MissingHost(String),

    #[error("'{0}' does not name a repository or gist")]
    MissingName(String),
}

/// Transport scheme of a locator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocatorScheme {
    Https,
    Http,
    Ssh,
}

/// Parsed clone locator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    raw: String,
    scheme: LocatorScheme,
    host: String,
    segments: Vec<String>,
}

impl Locator {
    /// Parse an HTTPS or SSH clone URL
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let trimmed = input.trim();
        let url = gix_url::parse(trimmed.as_bytes().into()).map_err(|e| LocatorError::Invalid {
            input: trimmed.to_string(),
            reason: e.to_string(),
        })?;

        let scheme = match url.scheme {
            gix_url::Scheme::Https => LocatorScheme::Https,
            gix_url::Scheme::Http => LocatorScheme::Http,
            gix_url::Scheme::Ssh => LocatorScheme::Ssh,
            other => {
                return Err(LocatorError::Invalid {
                    input: trimmed.to_string(),
                    reason: format!("unsupported scheme '{}'", other.as_str()),
                })
            }
        };

        let host = url
            .host()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| LocatorError::MissingHost(trimmed.to_string()))?
            .to_string();

        let path = url.path.to_string();
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(LocatorError::MissingName(trimmed.to_string()));
        }

        Ok(Self {
            raw: trimmed.to_string(),
            scheme,
            host,
            segments,
        })
    }

    /// The URL exactly as supplied
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn scheme(&self) -> LocatorScheme {
        self.scheme
    }

    pub fn is_ssh(&self) -> bool {
        self.scheme == LocatorScheme::Ssh
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Whether the locator points at the public GitHub instance
    pub fn is_default_host(&self) -> bool {
        DEFAULT_HOSTS.contains(&self.host.to_ascii_lowercase().as_str())
    }

    /// Owning organization or user, when the path carries one
    pub fn owner(&self) -> Option<&str> {
        if self.segments.len() >= 2 {
            self.segments.first().map(String::as_str)
        } else {
            None
        }
    }

    /// Last path segment as written (may carry a `.git` suffix)
    pub fn last_segment(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Repository name with any `.git` suffix removed
    pub fn repo_name(&self) -> &str {
        let last = self.last_segment();
        last.strip_suffix(".git").unwrap_or(last)
    }

    /// SSH form `git@<host>:<owner>/<last-segment>` of this locator
    pub fn to_ssh(&self) -> String {
        if self.is_ssh() {
            return self.raw.clone();
        }
        match self.owner() {
            Some(owner) => format!("git@{}:{}/{}", self.host, owner, self.last_segment()),
            None => format!("git@{}:{}", self.host, self.last_segment()),
        }
    }

    /// SSH form used for gists on enterprise hosts: `git@<host>:gist/<id>`
    pub fn to_gist_ssh(&self) -> String {
        format!("git@{}:gist/{}", self.host, self.last_segment())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
