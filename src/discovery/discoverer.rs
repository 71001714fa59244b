//! Target discovery
//!
//! Turns a scope (organization, user, team, or a single URL) into the complete
//! list of [`ScanTarget`]s by walking the paginated listings of a
//! [`RepositorySource`]. Every listing is exhausted before returning.

use crate::core::locator::{Locator, LocatorError};
use crate::core::retry::{retry_async, RetryPolicy};
use crate::discovery::error::{DiscoveryError, DiscoveryResult};
use crate::discovery::source::{collect_pages, OwnRepoFilter, RepositorySource};
use crate::discovery::types::{RemoteRepo, ScanTarget, TargetKind, Team};
use std::sync::Arc;

/// Options that shape what discovery returns
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Organization repository names to drop (exact match)
    pub blacklist: Vec<String>,
    pub private_only: bool,
    /// Set when talking to a GitHub Enterprise host
    pub enterprise: bool,
    pub retry: RetryPolicy,
}

impl DiscoveryOptions {
    /// Parse a comma-separated blacklist, ignoring blanks
    pub fn parse_blacklist(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn is_blacklisted(&self, name: &str) -> bool {
        self.blacklist.iter().any(|entry| entry == name)
    }
}

pub struct TargetDiscoverer {
    source: Arc<dyn RepositorySource>,
    options: DiscoveryOptions,
}

impl TargetDiscoverer {
    pub fn new(source: Arc<dyn RepositorySource>, options: DiscoveryOptions) -> Self {
        Self { source, options }
    }

    /// All repositories of an organization minus blacklisted names
    ///
    /// Public and private repositories are listed whatever the private-only
    /// setting; it only changes user listings and clone locators.
    pub async fn org_targets(&self, org: &str) -> DiscoveryResult<Vec<ScanTarget>> {
        let listing = format!("repositories of organization {}", org);
        let source = &self.source;

        let repos = collect_pages(&listing, &self.options.retry, move |page| {
            source.org_repos(org, false, page)
        })
        .await?;

        let targets: Vec<ScanTarget> = repos
            .into_iter()
            .filter(|repo| {
                if self.options.is_blacklisted(&repo.name) {
                    log::info!("Repository {} is in the blacklist, skipping", repo.name);
                    false
                } else {
                    true
                }
            })
            .map(|repo| repo.into_target(TargetKind::OrgRepo, org))
            .collect();

        log::info!("Discovered {} repositories in organization {}", targets.len(), org);
        Ok(targets)
    }

    /// Repositories and gists of a user
    ///
    /// In private-only mode the repositories come from the authenticated
    /// principal's private listing instead of the user's public one. Gists are
    /// always listed in full.
    pub async fn user_targets(&self, user: &str) -> DiscoveryResult<Vec<ScanTarget>> {
        let mut targets = self.user_repo_targets(user).await?;
        targets.extend(self.user_gist_targets(user).await?);
        Ok(targets)
    }

    async fn user_repo_targets(&self, user: &str) -> DiscoveryResult<Vec<ScanTarget>> {
        let source = &self.source;
        let repos = if self.options.private_only {
            let listing = format!("private repositories for {}", user);
            collect_pages(&listing, &self.options.retry, move |page| {
                source.own_repos(OwnRepoFilter::Private, page)
            })
            .await?
        } else {
            let listing = format!("repositories of user {}", user);
            collect_pages(&listing, &self.options.retry, move |page| {
                source.user_repos(user, page)
            })
            .await?
        };

        log::debug!("Discovered {} repositories for user {}", repos.len(), user);
        Ok(repos
            .into_iter()
            .map(|repo| repo.into_target(TargetKind::UserRepo, user))
            .collect())
    }

    async fn user_gist_targets(&self, user: &str) -> DiscoveryResult<Vec<ScanTarget>> {
        let listing = format!("gists of user {}", user);
        let source = &self.source;
        let gists = collect_pages(&listing, &self.options.retry, move |page| {
            source.user_gists(user, page)
        })
        .await?;

        log::debug!("Discovered {} gists for user {}", gists.len(), user);
        gists
            .into_iter()
            .map(|gist| -> DiscoveryResult<ScanTarget> {
                let ssh_url = if self.options.enterprise {
                    Some(Locator::parse(&gist.git_pull_url)?.to_gist_ssh())
                } else {
                    None
                };
                Ok(ScanTarget {
                    name: gist.id,
                    kind: TargetKind::Gist,
                    https_url: gist.git_pull_url,
                    ssh_url,
                    fork: false,
                    scope: user.to_string(),
                })
            })
            .collect()
    }

    /// Logins of every organization member
    pub async fn org_members(&self, org: &str) -> DiscoveryResult<Vec<String>> {
        let listing = format!("members of organization {}", org);
        let source = &self.source;
        let members = collect_pages(&listing, &self.options.retry, move |page| {
            source.org_members(org, page)
        })
        .await?;

        Ok(members.into_iter().map(|member| member.login).collect())
    }

    /// Resolve a team by exact name, stopping at the first match
    pub async fn find_team(&self, org: &str, team_name: &str) -> DiscoveryResult<Team> {
        let mut page = 1u32;
        loop {
            let listing = format!("teams of organization {}", org);
            let result = retry_async(&listing, self.options.retry.clone(), || {
                self.source.org_teams(org, page)
            })
            .await;

            let current = match result {
                Ok(current) => current,
                Err(e) => {
                    return Err(DiscoveryError::TeamNotFound {
                        org: org.to_string(),
                        team: team_name.to_string(),
                        lookup_error: Some(e.to_string()),
                    })
                }
            };

            if let Some(team) = current.items.into_iter().find(|t| t.name == team_name) {
                log::info!("Resolved team {} ({})", team.name, team.id);
                return Ok(team);
            }

            match current.next_page {
                Some(next) if next > page => page = next,
                _ => {
                    return Err(DiscoveryError::TeamNotFound {
                        org: org.to_string(),
                        team: team_name.to_string(),
                        lookup_error: None,
                    })
                }
            }
        }
    }

    /// Repositories of a named team; the team name becomes the scope
    pub async fn team_targets(&self, org: &str, team_name: &str) -> DiscoveryResult<Vec<ScanTarget>> {
        let team = self.find_team(org, team_name).await?;
        let listing = format!("repositories of team {}", team.name);
        let source = &self.source;
        let team_id = team.id;

        let repos: Vec<RemoteRepo> = collect_pages(&listing, &self.options.retry, move |page| {
            source.team_repos(team_id, page)
        })
        .await?;

        Ok(repos
            .into_iter()
            .map(|repo| repo.into_target(TargetKind::TeamRepo, &team.name))
            .collect())
    }

    /// Synthesize the single target for a repository or gist URL
    pub fn adhoc_target(&self, url: &str, gist: bool) -> DiscoveryResult<ScanTarget> {
        adhoc_target(url, gist, self.options.enterprise)
    }
}

/// Build an ad-hoc target without any listing
///
/// The scope is the owner segment of the URL; gist URLs without an owner fall
/// back to `gist`. Enterprise HTTPS locators are rewritten to their SSH form.
pub fn adhoc_target(url: &str, gist: bool, enterprise: bool) -> DiscoveryResult<ScanTarget> {
    let locator = Locator::parse(url)?;

    let kind = if gist {
        TargetKind::AdHocGist
    } else {
        TargetKind::AdHocRepo
    };

    let scope = match (locator.owner(), gist) {
        (Some(owner), _) => owner.to_string(),
        (None, true) => "gist".to_string(),
        (None, false) => return Err(LocatorError::MissingName(url.to_string()).into()),
    };

    let ssh_url = if locator.is_ssh() {
        Some(locator.as_str().to_string())
    } else if enterprise {
        Some(locator.to_ssh())
    } else {
        None
    };

    Ok(ScanTarget {
        name: locator.repo_name().to_string(),
        kind,
        https_url: locator.as_str().to_string(),
        ssh_url,
        fork: false,
        scope,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::source::Page;
    use crate::discovery::types::{Account, RemoteGist};
    use async_trait::async_trait;
    use std::time::Duration;

    fn repo(name: &str, fork: bool) -> RemoteRepo {
        RemoteRepo {
            name: name.into(),
            clone_url: format!("https://github.com/acme/{}.git", name),
            ssh_url: Some(format!("git@github.com:acme/{}.git", name)),
            fork,
            private: false,
            owner: Some(Account { login: "acme".into() }),
        }
    }

    fn page_of<T: Clone>(all: &[T], size: usize, page: u32) -> Page<T> {
        let start = ((page as usize - 1) * size).min(all.len());
        let end = (start + size).min(all.len());
        Page {
            items: all[start..end].to_vec(),
            next_page: if end < all.len() { Some(page + 1) } else { None },
        }
    }

    struct Canned {
        repos: Vec<RemoteRepo>,
        gists: Vec<RemoteGist>,
        teams: Vec<Team>,
    }

    #[async_trait]
    impl RepositorySource for Canned {
        async fn org_repos(&self, _: &str, private_only: bool, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
            let listing = if private_only { &self.repos[..1] } else { &self.repos[..] };
            Ok(page_of(listing, 2, page))
        }
        async fn user_repos(&self, _: &str, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
            Ok(page_of(&self.repos, 2, page))
        }
        async fn own_repos(&self, _: OwnRepoFilter, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
            Ok(page_of(&self.repos[..1], 2, page))
        }
        async fn user_gists(&self, _: &str, page: u32) -> DiscoveryResult<Page<RemoteGist>> {
            Ok(page_of(&self.gists, 2, page))
        }
        async fn org_members(&self, _: &str, _: u32) -> DiscoveryResult<Page<Account>> {
            Ok(Page::last(vec![Account { login: "alice".into() }]))
        }
        async fn org_teams(&self, _: &str, page: u32) -> DiscoveryResult<Page<Team>> {
            Ok(page_of(&self.teams, 1, page))
        }
        async fn team_repos(&self, _: u64, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
            Ok(page_of(&self.repos, 2, page))
        }
    }

    fn discoverer(options: DiscoveryOptions) -> TargetDiscoverer {
        let source = Canned {
            repos: vec![repo("api", false), repo("web", true), repo("tools", false)],
            gists: vec![RemoteGist {
                id: "abc123".into(),
                git_pull_url: "https://git.corp.local/gist/abc123.git".into(),
            }],
            teams: vec![
                Team { id: 1, name: "blue".into() },
                Team { id: 2, name: "red".into() },
            ],
        };
        TargetDiscoverer::new(
            Arc::new(source),
            DiscoveryOptions {
                retry: RetryPolicy {
                    max_attempts: 1,
                    delay: Duration::from_millis(1),
                },
                ..options
            },
        )
    }

    #[tokio::test]
    async fn test_org_targets_drop_blacklisted_and_keep_forks() {
        let d = discoverer(DiscoveryOptions {
            blacklist: DiscoveryOptions::parse_blacklist("tools, legacy"),
            ..Default::default()
        });
        let targets = d.org_targets("acme").await.unwrap();
        let names: Vec<_> = targets.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["api", "web"]);
        assert!(targets[1].fork);
        assert!(targets.iter().all(|t| t.scope == "acme"));
    }

    #[tokio::test]
    async fn test_blacklist_is_exact_match() {
        let d = discoverer(DiscoveryOptions {
            blacklist: DiscoveryOptions::parse_blacklist("ap"),
            ..Default::default()
        });
        assert_eq!(d.org_targets("acme").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_private_only_org_targets_list_every_repository() {
        let d = discoverer(DiscoveryOptions {
            private_only: true,
            ..Default::default()
        });
        let names: Vec<_> = d
            .org_targets("acme")
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["api", "web", "tools"]);
    }

    #[tokio::test]
    async fn test_user_targets_include_gists() {
        let d = discoverer(DiscoveryOptions {
            enterprise: true,
            ..Default::default()
        });
        let targets = d.user_targets("alice").await.unwrap();
        assert_eq!(targets.len(), 4);
        let gist = targets.iter().find(|t| t.kind == TargetKind::Gist).unwrap();
        assert_eq!(gist.name, "abc123");
        assert_eq!(gist.ssh_url.as_deref(), Some("git@git.corp.local:gist/abc123.git"));
    }

    #[tokio::test]
    async fn test_private_user_targets_use_own_listing() {
        let d = discoverer(DiscoveryOptions {
            private_only: true,
            ..Default::default()
        });
        let targets = d.user_targets("alice").await.unwrap();
        let repos: Vec<_> = targets.iter().filter(|t| !t.kind.is_gist()).collect();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].scope, "alice");
    }

    #[tokio::test]
    async fn test_find_team_pages_until_match() {
        let d = discoverer(DiscoveryOptions::default());
        assert_eq!(d.find_team("acme", "red").await.unwrap().id, 2);

        let err = d.find_team("acme", "green").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::TeamNotFound { lookup_error: None, .. }));
    }

    #[tokio::test]
    async fn test_team_targets_use_team_scope() {
        let d = discoverer(DiscoveryOptions::default());
        let targets = d.team_targets("acme", "blue").await.unwrap();
        assert_eq!(targets.len(), 3);
        assert!(targets.iter().all(|t| t.scope == "blue" && t.kind == TargetKind::TeamRepo));
    }

    #[test]
    fn test_adhoc_repo_target() {
        let t = adhoc_target("https://github.com/acme/widgets.git", false, false).unwrap();
        assert_eq!(t.name, "widgets");
        assert_eq!(t.scope, "acme");
        assert_eq!(t.ssh_url, None);

        let enterprise = adhoc_target("https://git.corp.local/acme/widgets.git", false, true).unwrap();
        assert_eq!(
            enterprise.locator(true),
            "git@git.corp.local:acme/widgets.git"
        );
    }

    #[test]
    fn test_adhoc_gist_without_owner() {
        let t = adhoc_target("https://gist.github.com/abc123.git", true, false).unwrap();
        assert_eq!(t.name, "abc123");
        assert_eq!(t.scope, "gist");
        assert_eq!(t.kind, TargetKind::AdHocGist);

        assert!(adhoc_target("https://github.com/widgets", false, false).is_err());
    }
}
