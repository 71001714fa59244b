//! Run orchestration
//!
//! Sequences discovery, cloning and scanning for the requested scope. Each
//! scope goes through two barriers: all of its clones join before any of its
//! scans are submitted, and all of its scans join before the scope counts as
//! done. An organization run processes the org repos, then the optional team,
//! then every member as a sibling scope running concurrently. Scopes nest as
//! child task groups of the run's group, all sharing one gate.

use crate::core::config::RunConfig;
use crate::core::gate::{ConcurrencyGate, TaskGroup};
use crate::discovery::discoverer::TargetDiscoverer;
use crate::discovery::error::DiscoveryError;
use crate::discovery::source::RepositorySource;
use crate::discovery::types::{ScanTarget, ScopeRequest};
use crate::pipeline::clone::{CloneCoordinator, ClonedTarget};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::layout::{ScopeRoot, WorkLayout};
use crate::pipeline::runner::CommandRunner;
use crate::pipeline::scan::{ScanCoordinator, ScanOutcome, ScannedTarget};
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;

/// What happened in one scope
#[derive(Debug, Clone)]
pub struct ScopeRun {
    pub root: ScopeRoot,
    pub discovered: usize,
    pub cloned: usize,
    pub scans: Vec<ScanOutcome>,
}

/// Everything the aggregation step needs to know about a finished run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub scopes: Vec<ScopeRun>,
}

impl PipelineReport {
    /// Targets of this run with at least one completed tool, in report order
    pub fn scanned_targets(&self) -> Vec<ScannedTarget> {
        ScannedTarget::from_outcomes(self.scans())
    }

    pub fn cloned(&self) -> usize {
        self.scopes.iter().map(|s| s.cloned).sum()
    }

    pub fn scans(&self) -> impl Iterator<Item = &ScanOutcome> {
        self.scopes.iter().flat_map(|s| s.scans.iter())
    }
}

pub struct Pipeline {
    scope: ScopeRequest,
    scan_only: bool,
    layout: WorkLayout,
    gate: ConcurrencyGate,
    discoverer: TargetDiscoverer,
    clones: CloneCoordinator,
    scans: ScanCoordinator,
}

impl Pipeline {
    pub fn new(
        config: &RunConfig,
        source: Arc<dyn RepositorySource>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let gate = ConcurrencyGate::new(config.threads);
        Self {
            scope: config.scope.clone(),
            scan_only: config.scan_only,
            layout: config.layout.clone(),
            discoverer: TargetDiscoverer::new(source, config.discovery_options()),
            clones: CloneCoordinator::new(Arc::clone(&runner), config),
            scans: ScanCoordinator::new(runner, config),
            gate,
        }
    }

    /// The gate shared by every clone and scan job of this pipeline
    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub async fn run(&self) -> PipelineResult<PipelineReport> {
        log::info!("Starting run for {}", self.scope);
        let group: TaskGroup = self.gate.group(self.scope.to_string());
        let scopes = match &self.scope {
            ScopeRequest::Organization {
                org,
                team,
                org_only,
            } => {
                self.run_organization(&group, org, team.as_deref(), *org_only)
                    .await?
            }
            ScopeRequest::User(user) => vec![self.run_user(&group, user).await?],
            ScopeRequest::Repository(url) => vec![self.run_adhoc(&group, url, false).await?],
            ScopeRequest::Gist(url) => vec![self.run_adhoc(&group, url, true).await?],
        };

        let report = PipelineReport { scopes };
        log::info!(
            "All jobs joined: {} scopes, {} clones, {} tool runs (peak concurrency {}/{})",
            report.scopes.len(),
            report.cloned(),
            report.scans().count(),
            self.gate.peak(),
            self.gate.capacity()
        );
        Ok(report)
    }

    async fn run_organization(
        &self,
        group: &TaskGroup,
        org: &str,
        team: Option<&str>,
        org_only: bool,
    ) -> PipelineResult<Vec<ScopeRun>> {
        let mut runs = Vec::new();

        let org_root = self.layout.org_scope(org);
        let org_run = if self.scan_only {
            self.scan_existing(group, org_root).await?
        } else {
            let targets = self.discoverer.org_targets(org).await?;
            self.process_scope(group, org_root, targets).await
        };
        runs.push(org_run);

        if let Some(team) = team {
            if let Some(team_run) = self.run_team(group, org, team).await? {
                runs.push(team_run);
            }
        }

        if org_only {
            log::info!("Organization-only run, skipping members of {}", org);
        } else {
            runs.extend(self.run_members(group, org).await?);
        }

        Ok(runs)
    }

    /// A missing team ends the team phase only
    async fn run_team(
        &self,
        group: &TaskGroup,
        org: &str,
        team: &str,
    ) -> PipelineResult<Option<ScopeRun>> {
        let group: TaskGroup = group.child(format!("team {}", team));
        let team_root = self.layout.team_scope(team);
        if self.scan_only {
            return Ok(Some(self.scan_existing(&group, team_root).await?));
        }

        match self.discoverer.team_targets(org, team).await {
            Ok(targets) => Ok(Some(self.process_scope(&group, team_root, targets).await)),
            Err(e @ DiscoveryError::TeamNotFound { .. }) => {
                log::error!("{}", e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Every member scope runs concurrently; all of them join before returning
    async fn run_members(&self, group: &TaskGroup, org: &str) -> PipelineResult<Vec<ScopeRun>> {
        let users = if self.scan_only {
            existing_dirs(&self.layout.repos_root.join("users"))?
        } else {
            self.discoverer.org_members(org).await?
        };
        log::info!("Processing {} members of {}", users.len(), org);

        let members: TaskGroup = group.child("members");
        let results = join_all(users.iter().map(|user| self.run_user(&members, user))).await;

        let mut runs = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(run) => runs.push(run),
                Err(e) => {
                    log::error!("Member scope failed: {}", e);
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(runs),
        }
    }

    async fn run_user(&self, group: &TaskGroup, user: &str) -> PipelineResult<ScopeRun> {
        let group: TaskGroup = group.child(format!("user {}", user));
        let root = self.layout.user_scope(user);
        if self.scan_only {
            return self.scan_existing(&group, root).await;
        }
        let targets = self.discoverer.user_targets(user).await?;
        Ok(self.process_scope(&group, root, targets).await)
    }

    async fn run_adhoc(&self, group: &TaskGroup, url: &str, gist: bool) -> PipelineResult<ScopeRun> {
        let target = self.discoverer.adhoc_target(url, gist)?;
        let root = self.layout.adhoc_scope(&target.scope);

        if self.scan_only {
            let cloned = vec![ClonedTarget {
                path: root.target_dir(&target.name),
                name: target.name,
            }];
            return Ok(self.scan_cloned(group, root, 1, cloned).await);
        }

        log::info!("Processing single {} {}", target.kind, url);
        Ok(self.process_scope(group, root, vec![target]).await)
    }

    /// Clone barrier, then scan barrier, for one scope
    async fn process_scope(
        &self,
        group: &TaskGroup,
        root: ScopeRoot,
        targets: Vec<ScanTarget>,
    ) -> ScopeRun {
        let discovered = targets.len();
        log::info!("Cloning {} targets of {}", discovered, root.name);
        let cloned = self.clones.clone_scope(group, &root, targets).await;
        self.scan_cloned(group, root, discovered, cloned).await
    }

    async fn scan_cloned(
        &self,
        group: &TaskGroup,
        root: ScopeRoot,
        discovered: usize,
        cloned: Vec<ClonedTarget>,
    ) -> ScopeRun {
        log::info!("Scanning {} targets of {}", cloned.len(), root.name);
        let scans = self.scans.scan_scope(group, &root.name, &cloned).await;
        ScopeRun {
            root,
            discovered,
            cloned: cloned.len(),
            scans,
        }
    }

    /// Scan whatever is already cloned under the scope's directory
    async fn scan_existing(&self, group: &TaskGroup, root: ScopeRoot) -> PipelineResult<ScopeRun> {
        let cloned: Vec<ClonedTarget> = existing_dirs(&root.clone_dir)?
            .into_iter()
            .map(|name| ClonedTarget {
                path: root.target_dir(&name),
                name,
            })
            .collect();
        Ok(self.scan_cloned(group, root, cloned.len(), cloned).await)
    }
}

/// Sorted names of the subdirectories of `dir`; a missing directory is empty
fn existing_dirs(dir: &Path) -> PipelineResult<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("{} does not exist, nothing to scan", dir.display());
            return Ok(Vec::new());
        }
        Err(source) => {
            return Err(PipelineError::ScanOnly {
                path: dir.to_path_buf(),
                source,
            })
        }
    };

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| PipelineError::ScanOnly {
            path: dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
