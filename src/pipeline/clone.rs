//! Clone coordination
//!
//! One gated job per target running `git clone <locator> <destination>`.
//! Forks are filtered out before submission when fork cloning is disabled, so
//! they never occupy a slot. A failed clone is logged with git's stderr and the
//! target simply does not appear in the cloned set.

use crate::core::config::RunConfig;
use crate::core::gate::TaskGroup;
use crate::discovery::types::ScanTarget;
use crate::pipeline::layout::ScopeRoot;
use crate::pipeline::runner::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::sync::Arc;

/// Result of one clone job
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloneOutcome {
    Cloned { target: ScanTarget, path: PathBuf },
    Failed { target: ScanTarget, reason: String },
}

impl CloneOutcome {
    pub fn target(&self) -> &ScanTarget {
        match self {
            CloneOutcome::Cloned { target, .. } | CloneOutcome::Failed { target, .. } => target,
        }
    }

    pub fn is_cloned(&self) -> bool {
        matches!(self, CloneOutcome::Cloned { .. })
    }
}

/// A target that is on disk and ready to scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClonedTarget {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Clone)]
pub struct CloneCoordinator {
    runner: Arc<dyn CommandRunner>,
    git: String,
    clone_forks: bool,
    prefer_ssh: bool,
}

impl CloneCoordinator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &RunConfig) -> Self {
        Self {
            runner,
            git: config.tool_paths.git.clone(),
            clone_forks: config.clone_forks,
            prefer_ssh: config.prefer_ssh(),
        }
    }

    /// Whether `target` gets a clone job at all
    pub fn should_clone(&self, target: &ScanTarget) -> bool {
        self.clone_forks || !target.fork
    }

    /// Submit a clone of `target` into `destination` on `group`
    ///
    /// Returns `false` when the target was skipped as a fork.
    pub async fn submit_clone(
        &self,
        group: &mut TaskGroup<CloneOutcome>,
        target: ScanTarget,
        destination: PathBuf,
    ) -> bool {
        if !self.should_clone(&target) {
            log::info!(
                "{} is a fork and fork cloning is disabled, skipping",
                target.name
            );
            return false;
        }

        let locator = target.locator(self.prefer_ssh).to_string();
        let spec = CommandSpec::new(
            &self.git,
            vec![
                "clone".to_string(),
                locator,
                destination.to_string_lossy().to_string(),
            ],
        );
        let runner = Arc::clone(&self.runner);

        log::debug!("Queueing clone: {}", spec.display_line());
        group
            .spawn(async move { run_clone(runner, spec, target, destination).await })
            .await;
        true
    }

    /// Clone every target of a scope and wait for all of them
    ///
    /// This is the clone barrier of the scope: it returns only after every
    /// submitted job has finished, with the targets that made it to disk.
    pub async fn clone_scope(
        &self,
        parent: &TaskGroup,
        scope: &ScopeRoot,
        targets: Vec<ScanTarget>,
    ) -> Vec<ClonedTarget> {
        let mut group: TaskGroup<CloneOutcome> = parent.child(format!("clone/{}", scope.name));

        for target in targets {
            let destination = scope.target_dir(&target.name);
            self.submit_clone(&mut group, target, destination).await;
        }

        let report = group.join().await;
        let total = report.outputs.len() + report.panicked;
        let cloned: Vec<ClonedTarget> = report
            .outputs
            .into_iter()
            .filter_map(|outcome| match outcome {
                CloneOutcome::Cloned { target, path } => Some(ClonedTarget {
                    name: target.name,
                    path,
                }),
                CloneOutcome::Failed { .. } => None,
            })
            .collect();

        log::info!(
            "Cloned {}/{} targets of {}",
            cloned.len(),
            total,
            scope.name
        );
        cloned
    }
}

async fn run_clone(
    runner: Arc<dyn CommandRunner>,
    spec: CommandSpec,
    target: ScanTarget,
    destination: PathBuf,
) -> CloneOutcome {
    log::info!("Cloning {} ({})", target.name, target.kind);
    match runner.run(&spec).await {
        Ok(output) if output.success() => CloneOutcome::Cloned {
            target,
            path: destination,
        },
        Ok(output) => {
            log::error!(
                "Clone of {} failed with status {:?}: {}",
                target.name,
                output.status,
                output.stderr.trim()
            );
            CloneOutcome::Failed {
                target,
                reason: output.stderr,
            }
        }
        Err(e) => {
            log::error!("Clone of {} could not start '{}': {}", target.name, spec.program, e);
            CloneOutcome::Failed {
                target,
                reason: e.to_string(),
            }
        }
    }
}
