//! Scan coordination
//!
//! Each configured tool runs as its own gated job per cloned target and writes
//! to `<results-root>/<scope>/<target>/<tool>`. A tool that exits with a status
//! outside its ok set is logged and its result file removed, so aggregation
//! sees it as absent.

use crate::core::config::RunConfig;
use crate::core::gate::TaskGroup;
use crate::pipeline::clone::ClonedTarget;
use crate::pipeline::layout::WorkLayout;
use crate::pipeline::runner::{CommandRunner, CommandSpec};
use crate::pipeline::tools::{scan_command, ScanFlags, Tool, ToolPaths, ToolSet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanStatus {
    Completed,
    Failed(String),
}

/// Result of one tool run over one target
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub scope: String,
    pub target: String,
    pub tool: Tool,
    /// Clone the tool ran over
    pub target_path: PathBuf,
    pub result_file: PathBuf,
    pub status: ScanStatus,
    pub elapsed: Duration,
}

impl ScanOutcome {
    pub fn is_completed(&self) -> bool {
        self.status == ScanStatus::Completed
    }
}

/// A target of this run with the tools that completed on it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedTarget {
    pub scope: String,
    pub target: String,
    pub clone_dir: PathBuf,
    pub tools: Vec<Tool>,
}

impl ScannedTarget {
    pub fn new(scope: &str, target: &str, clone_dir: PathBuf, tools: Vec<Tool>) -> Self {
        Self {
            scope: scope.to_string(),
            target: target.to_string(),
            clone_dir,
            tools,
        }
    }

    pub fn completed(&self, tool: Tool) -> bool {
        self.tools.contains(&tool)
    }

    /// Group completed outcomes per target, sorted by scope then target
    ///
    /// Failed tool runs are dropped; a target with no completed run is absent.
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a ScanOutcome>) -> Vec<Self> {
        let mut targets: BTreeMap<(String, String), ScannedTarget> = BTreeMap::new();
        for outcome in outcomes.into_iter().filter(|o| o.is_completed()) {
            let entry = targets
                .entry((outcome.scope.clone(), outcome.target.clone()))
                .or_insert_with(|| {
                    ScannedTarget::new(
                        &outcome.scope,
                        &outcome.target,
                        outcome.target_path.clone(),
                        Vec::new(),
                    )
                });
            if !entry.completed(outcome.tool) {
                entry.tools.push(outcome.tool);
                entry.tools.sort();
            }
        }
        targets.into_values().collect()
    }
}

#[derive(Clone)]
pub struct ScanCoordinator {
    runner: Arc<dyn CommandRunner>,
    layout: WorkLayout,
    tools: ToolSet,
    paths: ToolPaths,
    flags: ScanFlags,
}

impl ScanCoordinator {
    pub fn new(runner: Arc<dyn CommandRunner>, config: &RunConfig) -> Self {
        Self {
            runner,
            layout: config.layout.clone(),
            tools: config.tools.clone(),
            paths: config.tool_paths.clone(),
            flags: config.scan_flags(),
        }
    }

    /// Submit one job per configured tool for a target
    pub async fn submit_scan(
        &self,
        group: &mut TaskGroup<ScanOutcome>,
        target_path: &Path,
        target_name: &str,
        scope_name: &str,
    ) {
        for &tool in self.tools.tools() {
            let result_file = self.layout.result_file(scope_name, target_name, tool);
            let spec = scan_command(tool, &self.paths, self.flags, target_path, &result_file);
            let job = ScanJob {
                scope: scope_name.to_string(),
                target: target_name.to_string(),
                tool,
                target_path: target_path.to_path_buf(),
                result_file,
                spec,
            };
            let runner = Arc::clone(&self.runner);
            group.spawn(async move { job.run(runner).await }).await;
        }
    }

    /// Scan every cloned target of a scope and wait for all tool jobs
    ///
    /// The jobs run on a child of `parent`, which names the enclosing scope.
    pub async fn scan_scope(
        &self,
        parent: &TaskGroup,
        scope_name: &str,
        targets: &[ClonedTarget],
    ) -> Vec<ScanOutcome> {
        let mut group: TaskGroup<ScanOutcome> = parent.child(format!("scan/{}", scope_name));
        for target in targets {
            self.submit_scan(&mut group, &target.path, &target.name, scope_name)
                .await;
        }

        let outcomes = group.join().await.outputs;
        let failed = outcomes.iter().filter(|o| !o.is_completed()).count();
        log::info!(
            "Finished scanning {}: {} tool runs, {} failed",
            scope_name,
            outcomes.len(),
            failed
        );
        outcomes
    }
}

struct ScanJob {
    scope: String,
    target: String,
    tool: Tool,
    target_path: PathBuf,
    result_file: PathBuf,
    spec: CommandSpec,
}

impl ScanJob {
    async fn run(self, runner: Arc<dyn CommandRunner>) -> ScanOutcome {
        let started = Instant::now();
        let status = self.execute(runner.as_ref()).await;
        let elapsed = started.elapsed();

        match &status {
            ScanStatus::Completed => log::info!(
                "{} finished {}/{} in {:.1?}",
                self.tool,
                self.scope,
                self.target,
                elapsed
            ),
            ScanStatus::Failed(reason) => {
                log::error!(
                    "{} failed on {}/{} after {:.1?}: {}",
                    self.tool,
                    self.scope,
                    self.target,
                    elapsed,
                    reason
                );
                discard_result(&self.result_file).await;
            }
        }

        ScanOutcome {
            scope: self.scope,
            target: self.target,
            tool: self.tool,
            target_path: self.target_path,
            result_file: self.result_file,
            status,
            elapsed,
        }
    }

    async fn execute(&self, runner: &dyn CommandRunner) -> ScanStatus {
        if let Some(dir) = self.result_file.parent() {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                return ScanStatus::Failed(format!(
                    "could not create result directory {}: {}",
                    dir.display(),
                    e
                ));
            }
        }

        log::debug!("Running {}", self.spec.display_line());
        match runner.run(&self.spec).await {
            Ok(output) if self.tool.is_ok_status(output.status) => ScanStatus::Completed,
            Ok(output) => ScanStatus::Failed(format!(
                "exit status {:?}: {}",
                output.status,
                output.stderr.trim()
            )),
            Err(e) => ScanStatus::Failed(format!("could not start '{}': {}", self.spec.program, e)),
        }
    }
}

async fn discard_result(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => log::debug!("Removed partial result {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("Could not remove partial result {}: {}", path.display(), e),
    }
}
