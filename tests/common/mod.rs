//! Common test utilities and helpers
//!
//! An in-memory [`RepositorySource`] that pages its listings, and a
//! [`CommandRunner`] that records every command and fakes git, truffleHog and
//! repo-supervisor on the local filesystem.

#![allow(dead_code)]

use async_trait::async_trait;
use secretsweep::core::config::RunConfig;
use secretsweep::discovery::error::{DiscoveryError, DiscoveryResult};
use secretsweep::discovery::source::{OwnRepoFilter, Page, RepositorySource};
use secretsweep::discovery::types::{Account, RemoteGist, RemoteRepo, ScopeRequest, Team};
use secretsweep::pipeline::layout::WorkLayout;
use secretsweep::pipeline::runner::{CommandOutput, CommandRunner, CommandSpec};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Listings are served two items per page
pub const PAGE_SIZE: usize = 2;

pub fn repo(owner: &str, name: &str, fork: bool) -> RemoteRepo {
    RemoteRepo {
        name: name.to_string(),
        clone_url: format!("https://github.com/{}/{}.git", owner, name),
        ssh_url: Some(format!("git@github.com:{}/{}.git", owner, name)),
        fork,
        private: false,
        owner: Some(Account {
            login: owner.to_string(),
        }),
    }
}

pub fn gist(id: &str) -> RemoteGist {
    RemoteGist {
        id: id.to_string(),
        git_pull_url: format!("https://gist.github.com/{}.git", id),
    }
}

fn paged<T: Clone>(items: Option<&Vec<T>>, page: u32) -> Page<T> {
    let items = items.cloned().unwrap_or_default();
    let start = (page as usize - 1) * PAGE_SIZE;
    let end = (start + PAGE_SIZE).min(items.len());
    let slice = if start < items.len() {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Page {
        items: slice,
        next_page: if end < items.len() { Some(page + 1) } else { None },
    }
}

/// In-memory hosting platform
#[derive(Default)]
pub struct FakeSource {
    pub org_repos: HashMap<String, Vec<RemoteRepo>>,
    pub private_org_repos: HashMap<String, Vec<RemoteRepo>>,
    pub user_repos: HashMap<String, Vec<RemoteRepo>>,
    pub owned: Vec<RemoteRepo>,
    pub private: Vec<RemoteRepo>,
    pub gists: HashMap<String, Vec<RemoteGist>>,
    pub members: HashMap<String, Vec<Account>>,
    pub teams: HashMap<String, Vec<Team>>,
    pub team_repos: HashMap<u64, Vec<RemoteRepo>>,
    pub reject_token: bool,
    pub calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_org(mut self, org: &str, repos: Vec<RemoteRepo>) -> Self {
        self.org_repos.insert(org.to_string(), repos);
        self
    }

    pub fn with_private_org(mut self, org: &str, repos: Vec<RemoteRepo>) -> Self {
        self.private_org_repos.insert(org.to_string(), repos);
        self
    }

    pub fn with_user(mut self, user: &str, repos: Vec<RemoteRepo>, gists: Vec<RemoteGist>) -> Self {
        self.user_repos.insert(user.to_string(), repos);
        self.gists.insert(user.to_string(), gists);
        self
    }

    pub fn with_members(mut self, org: &str, logins: &[&str]) -> Self {
        let accounts = logins
            .iter()
            .map(|login| Account {
                login: login.to_string(),
            })
            .collect();
        self.members.insert(org.to_string(), accounts);
        self
    }

    pub fn with_team(mut self, org: &str, id: u64, name: &str, repos: Vec<RemoteRepo>) -> Self {
        self.teams.entry(org.to_string()).or_default().push(Team {
            id,
            name: name.to_string(),
        });
        self.team_repos.insert(id, repos);
        self
    }

    pub fn with_owned(mut self, repos: Vec<RemoteRepo>) -> Self {
        self.owned = repos;
        self
    }

    fn check(&self, endpoint: &str) -> DiscoveryResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_token {
            return Err(DiscoveryError::Unauthorized {
                endpoint: endpoint.to_string(),
                message: "Bad credentials".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RepositorySource for FakeSource {
    async fn org_repos(
        &self,
        org: &str,
        private_only: bool,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>> {
        self.check("org repos")?;
        let listing = if private_only {
            self.private_org_repos.get(org)
        } else {
            self.org_repos.get(org)
        };
        Ok(paged(listing, page))
    }

    async fn user_repos(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
        self.check("user repos")?;
        Ok(paged(self.user_repos.get(user), page))
    }

    async fn own_repos(
        &self,
        filter: OwnRepoFilter,
        page: u32,
    ) -> DiscoveryResult<Page<RemoteRepo>> {
        self.check("own repos")?;
        let listing = match filter {
            OwnRepoFilter::Owned => &self.owned,
            OwnRepoFilter::Private => &self.private,
        };
        Ok(paged(Some(listing), page))
    }

    async fn user_gists(&self, user: &str, page: u32) -> DiscoveryResult<Page<RemoteGist>> {
        self.check("gists")?;
        Ok(paged(self.gists.get(user), page))
    }

    async fn org_members(&self, org: &str, page: u32) -> DiscoveryResult<Page<Account>> {
        self.check("members")?;
        Ok(paged(self.members.get(org), page))
    }

    async fn org_teams(&self, org: &str, page: u32) -> DiscoveryResult<Page<Team>> {
        self.check("teams")?;
        Ok(paged(self.teams.get(org), page))
    }

    async fn team_repos(&self, team_id: u64, page: u32) -> DiscoveryResult<Page<RemoteRepo>> {
        self.check("team repos")?;
        Ok(paged(self.team_repos.get(&team_id), page))
    }
}

/// Records commands and fakes the external tools
///
/// `git clone <url> <dest>` creates `<dest>` with a `.git` directory unless
/// the URL contains one of `failing_clones`. truffleHog writes one finding to
/// its stdout file; repo-supervisor writes a document naming a file inside
/// the clone. Each command sleeps briefly so concurrent jobs overlap.
#[derive(Default)]
pub struct RecordingRunner {
    pub calls: Mutex<Vec<CommandSpec>>,
    pub failing_clones: Vec<String>,
    pub delay_ms: u64,
    pub running: AtomicUsize,
    pub peak: AtomicUsize,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            delay_ms: 5,
            ..Self::default()
        }
    }

    pub fn failing(mut self, needle: &str) -> Self {
        self.failing_clones.push(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls whose program is `program`
    pub fn calls_to(&self, program: &str) -> Vec<CommandSpec> {
        self.calls()
            .into_iter()
            .filter(|spec| spec.program == program)
            .collect()
    }

    fn fake_clone(&self, spec: &CommandSpec) -> CommandOutput {
        let url = spec.args.get(1).cloned().unwrap_or_default();
        if self.failing_clones.iter().any(|needle| url.contains(needle)) {
            return CommandOutput {
                status: Some(128),
                stderr: "fatal: repository not found".to_string(),
            };
        }
        if let Some(dest) = spec.args.get(2) {
            std::fs::create_dir_all(Path::new(dest).join(".git")).unwrap();
        }
        CommandOutput {
            status: Some(0),
            stderr: String::new(),
        }
    }

    fn fake_trufflehog(&self, spec: &CommandSpec) -> CommandOutput {
        if let Some(out) = &spec.stdout_file {
            std::fs::write(
                out,
                "{\"path\":\"config/secrets.yml\",\"stringsFound\":[\"AKIAFAKE\"]}\n",
            )
            .unwrap();
        }
        CommandOutput {
            status: Some(1),
            stderr: String::new(),
        }
    }

    fn fake_repo_supervisor(&self, spec: &CommandSpec) -> CommandOutput {
        if let (Some(target), Some(out)) = (spec.args.first(), spec.args.get(1)) {
            let document = serde_json::json!({
                "result": { format!("{}/src/app.js", target): ["hunter2"] }
            });
            std::fs::write(out, document.to_string()).unwrap();
        }
        CommandOutput {
            status: Some(0),
            stderr: String::new(),
        }
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;

        let output = match spec.program.as_str() {
            "git" => self.fake_clone(spec),
            "trufflehog" => self.fake_trufflehog(spec),
            _ => self.fake_repo_supervisor(spec),
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(output)
    }
}

/// Run configuration rooted in `work_dir`, with plain tool names
pub fn config_in(work_dir: &Path, scope: ScopeRequest) -> RunConfig {
    let mut config = RunConfig::new("t0ken", scope);
    config.layout = WorkLayout::under(work_dir);
    config.tool_paths.repo_supervisor = "repo-supervisor".to_string();
    config.retry.delay = Duration::from_millis(1);
    config
}
