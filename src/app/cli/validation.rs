//! CLI argument validation
//!
//! Checks run after the configuration file has been applied and before
//! anything touches the network. The first failing rule is reported.

use crate::core::error_handling::ContextualError;
use crate::core::locator::Locator;
use crate::pipeline::tools::ToolSelection;
use std::fmt;

use super::args::Args;

/// Invalid or contradictory arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn details(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ContextualError for ValidationError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        Some(&self.message)
    }
}

impl Args {
    /// Validate CLI arguments for consistency and constraints
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_token()?;
        self.validate_scope()?;
        self.validate_tools()?;
        self.validate_hosts()?;
        self.validate_org_modifiers()?;
        self.validate_private_only()?;
        self.validate_ssh_url()?;
        self.validate_threads()?;
        Ok(())
    }

    fn validate_token(&self) -> Result<(), ValidationError> {
        match self.token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => Ok(()),
            _ => Err(ValidationError::new(
                "A GitHub personal access token is required. Provide it with --token or in the configuration file",
            )),
        }
    }

    fn validate_scope(&self) -> Result<(), ValidationError> {
        let given: Vec<&str> = [
            ("--org", &self.org),
            ("--user", &self.user),
            ("--repo-url", &self.repo_url),
            ("--gist-url", &self.gist_url),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().is_some_and(|v| !v.trim().is_empty()))
        .map(|(flag, _)| *flag)
        .collect();

        match given.len() {
            1 => Ok(()),
            0 => Err(ValidationError::new(
                "Nothing to scan. Provide one of --org, --user, --repo-url or --gist-url",
            )),
            _ => Err(ValidationError::new(&format!(
                "Only one of --org, --user, --repo-url or --gist-url may be given (got {})",
                given.join(", ")
            ))),
        }
    }

    fn validate_tools(&self) -> Result<(), ValidationError> {
        if self.thog_entropy && self.tool_selection() == ToolSelection::RepoSupervisor {
            return Err(ValidationError::new(
                "--thog-entropy only applies to truffleHog. Use it with --tool-name thog or all",
            ));
        }
        Ok(())
    }

    /// URLs outside github.com need --enterprise-url
    fn validate_hosts(&self) -> Result<(), ValidationError> {
        let enterprise = self.has_enterprise_url();
        for (flag, url) in [("--repo-url", &self.repo_url), ("--gist-url", &self.gist_url)] {
            let Some(url) = url.as_deref() else {
                continue;
            };
            let locator = Locator::parse(url)
                .map_err(|e| ValidationError::new(&format!("Invalid {}: {}", flag, e)))?;
            if !enterprise && !locator.is_default_host() {
                return Err(ValidationError::new(&format!(
                    "{} points at {}, which is not github.com. Provide --enterprise-url for GitHub Enterprise hosts",
                    flag,
                    locator.host()
                )));
            }
        }
        Ok(())
    }

    fn validate_org_modifiers(&self) -> Result<(), ValidationError> {
        if self.org.is_none() {
            if self.team_name.is_some() {
                return Err(ValidationError::new(
                    "--team-name needs the organization the team belongs to. Provide --org",
                ));
            }
            if self.org_only {
                return Err(ValidationError::new("--org-only can only be used with --org"));
            }
            if !self.blacklist_entries().is_empty() {
                log::warn!("--blacklist only applies to organization repositories and is ignored");
            }
        }
        Ok(())
    }

    fn validate_private_only(&self) -> Result<(), ValidationError> {
        if !self.scan_private_repos_only {
            return Ok(());
        }
        if self.gist_url.is_some() {
            return Err(ValidationError::new(
                "--scan-private-repos-only cannot be used with --gist-url",
            ));
        }
        if self.user.is_none() && self.org.is_none() && self.repo_url.is_none() {
            return Err(ValidationError::new(
                "--scan-private-repos-only needs --user, --org or --repo-url",
            ));
        }
        Ok(())
    }

    fn validate_ssh_url(&self) -> Result<(), ValidationError> {
        let enterprise = self.has_enterprise_url();
        if let Some(url) = self.repo_url.as_deref() {
            let is_ssh = Locator::parse(url).map(|l| l.is_ssh()).unwrap_or(false);
            if is_ssh && !self.scan_private_repos_only && !enterprise {
                return Err(ValidationError::new(
                    "SSH repository URLs need --scan-private-repos-only or --enterprise-url. Use the HTTPS URL for public repositories",
                ));
            }
        }
        Ok(())
    }

    fn has_enterprise_url(&self) -> bool {
        self.enterprise_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    fn validate_threads(&self) -> Result<(), ValidationError> {
        if self.threads == Some(0) {
            return Err(ValidationError::new("--threads must be greater than 0"));
        }
        Ok(())
    }
}
