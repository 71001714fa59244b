//! Checks that run before any clone starts
//!
//! Runs that clone over SSH need a usable key. Private-only runs additionally
//! confirm the token actually reaches private repositories for the requested
//! scope. Every failure here is fatal.

use crate::core::config::RunConfig;
use crate::discovery::source::{collect_pages, OwnRepoFilter, RepositorySource};
use crate::discovery::types::ScopeRequest;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::layout::WorkLayout;
use std::path::Path;

/// Verify the SSH key is present and non-empty
pub fn check_ssh_key(path: &Path) -> PipelineResult<()> {
    log::debug!("Checking for SSH key at {}", path.display());
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => {
            log::info!("SSH key found at {}", path.display());
            Ok(())
        }
        Ok(_) => Err(PipelineError::preflight(format!(
            "SSH key at {} is empty or not a file",
            path.display()
        ))),
        Err(e) => Err(PipelineError::preflight(format!(
            "SSH key not found at {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Run every check that applies to `config`
pub async fn preflight(config: &RunConfig, source: &dyn RepositorySource) -> PipelineResult<()> {
    if config.prefer_ssh() && !config.scan_only {
        check_ssh_key(&config.ssh_key)?;
    }
    if config.private_only {
        check_private_access(config, source).await?;
    }
    Ok(())
}

async fn check_private_access(config: &RunConfig, source: &dyn RepositorySource) -> PipelineResult<()> {
    match &config.scope {
        ScopeRequest::User(user) => {
            log::info!("Checking that the token belongs to {}", user);
            let owned = collect_pages("owned repositories", &config.retry, move |page| {
                source.own_repos(OwnRepoFilter::Owned, page)
            })
            .await?;
            let owner = owned
                .first()
                .and_then(|repo| repo.owner.as_ref())
                .map(|account| account.login.as_str());
            if owner == Some(user.as_str()) {
                Ok(())
            } else {
                Err(PipelineError::preflight(format!(
                    "The token does not belong to {}. Provide the token of the user being scanned",
                    user
                )))
            }
        }
        ScopeRequest::Repository(url) => {
            log::info!("Checking that {} belongs to the token's user", url);
            let owned = collect_pages("owned repositories", &config.retry, move |page| {
                source.own_repos(OwnRepoFilter::Owned, page)
            })
            .await?;
            if owned.iter().any(|repo| repo.matches_url(url)) {
                Ok(())
            } else {
                Err(PipelineError::preflight(format!(
                    "{} does not belong to the user whose token was provided",
                    url
                )))
            }
        }
        ScopeRequest::Organization { org, team: None, .. } => {
            log::info!("Checking for private repositories in {}", org);
            let listing = format!("private repositories of {}", org);
            let private = collect_pages(&listing, &config.retry, move |page| {
                source.org_repos(org, true, page)
            })
            .await?;
            if private.is_empty() {
                Err(PipelineError::preflight(format!(
                    "There are no private repositories in {} visible to this token",
                    org
                )))
            } else {
                Ok(())
            }
        }
        ScopeRequest::Organization { .. } | ScopeRequest::Gist(_) => Ok(()),
    }
}

/// Create the repos and results roots
pub fn bootstrap(layout: &WorkLayout) -> PipelineResult<()> {
    for dir in layout.bootstrap_dirs() {
        std::fs::create_dir_all(&dir).map_err(|source| PipelineError::Bootstrap {
            path: dir.clone(),
            source,
        })?;
    }
    log::debug!(
        "Prepared {} and {}",
        layout.repos_root.display(),
        layout.results_root.display()
    );
    Ok(())
}
