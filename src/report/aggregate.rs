//! Result aggregation
//!
//! Runs once, after every scan job has joined, over the targets scanned in
//! this run. Reads `<results-root>/<scope>/<target>/<tool>` for each tool that
//! completed on a target and writes either the raw outputs one tool section
//! after another, or a single merged JSON report with one entry per target
//! that has findings. Anything else under the results root is left alone.

use crate::core::config::{OutputMode, RunConfig};
use crate::pipeline::layout::WorkLayout;
use crate::pipeline::scan::ScannedTarget;
use crate::pipeline::tools::{Tool, ToolSet};
use crate::report::decode::{decode_repo_supervisor, decode_trufflehog};
use crate::report::error::{ReportError, ReportResult};
use crate::report::identity::repository_identity;
use crate::report::result::{MergedEntry, ScanResult};
use std::path::Path;

/// Width of the separator written after each target in concatenated output
pub const DELIMITER_WIDTH: usize = 304;

pub struct ResultAggregator {
    layout: WorkLayout,
    tools: ToolSet,
    mode: OutputMode,
}

impl ResultAggregator {
    pub fn new(layout: WorkLayout, tools: ToolSet, mode: OutputMode) -> Self {
        Self {
            layout,
            tools,
            mode,
        }
    }

    pub fn from_config(config: &RunConfig) -> Self {
        Self::new(
            config.layout.clone(),
            config.tools.clone(),
            config.output_mode,
        )
    }

    /// Aggregate the results of `targets` and write the output file
    pub fn write(&self, targets: &[ScannedTarget], output: &Path) -> ReportResult<()> {
        let bytes = match self.mode {
            OutputMode::Concatenated => {
                log::info!("Combining tool outputs into {}", output.display());
                self.concatenated(targets)?
            }
            OutputMode::Merged => {
                log::info!("Merging tool outputs into {}", output.display());
                let entries = self.merged(targets)?;
                log::info!("{} repositories with findings", entries.len());
                serde_json::to_vec(&entries)?
            }
        };

        std::fs::write(output, bytes).map_err(|source| ReportError::WriteOutput {
            path: output.to_path_buf(),
            source,
        })
    }

    /// Raw outputs grouped per tool, each target under its own header
    pub fn concatenated(&self, targets: &[ScannedTarget]) -> ReportResult<Vec<u8>> {
        let delimiter = "-".repeat(DELIMITER_WIDTH);
        let mut out = Vec::new();

        for &tool in self.tools.tools() {
            out.extend_from_slice(format!("Tool: {}\n", tool.result_name()).as_bytes());
            for target in targets.iter().filter(|t| t.completed(tool)) {
                let content = match self.read_result(target, tool)? {
                    Some(content) if !content.is_empty() => content,
                    _ => continue,
                };
                out.extend_from_slice(
                    format!(
                        "OrgorUser: {} RepoName: {}\n",
                        target.scope, target.target
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&content);
                out.extend_from_slice(delimiter.as_bytes());
                out.push(b'\n');
            }
        }
        Ok(out)
    }

    /// One entry per target with at least one finding
    pub fn merged(&self, targets: &[ScannedTarget]) -> ReportResult<Vec<MergedEntry>> {
        let mut entries = Vec::new();
        for target in targets {
            let result = self.merge_target(target)?;
            if result.is_empty() {
                log::debug!("No findings for {}/{}", target.scope, target.target);
                continue;
            }

            entries.push(MergedEntry {
                repository: repository_identity(&target.clone_dir, &target.scope, &target.target),
                strings_found: result,
            });
        }
        Ok(entries)
    }

    /// Union of every decodable tool result of one target
    pub fn merge_target(&self, target: &ScannedTarget) -> ReportResult<ScanResult> {
        let mut merged = ScanResult::new();
        for &tool in self.tools.tools() {
            if !target.completed(tool) {
                continue;
            }
            let content = match self.read_result(target, tool)? {
                Some(content) => String::from_utf8_lossy(&content).into_owned(),
                None => continue,
            };

            let decoded = match tool {
                Tool::TruffleHog => decode_trufflehog(&content),
                Tool::RepoSupervisor => decode_repo_supervisor(&content, &target.clone_dir),
            };
            match decoded {
                Ok(result) => merged = merged.merge(result),
                Err(e) => log::error!(
                    "Ignoring {} result for {}/{}: {}",
                    tool,
                    target.scope,
                    target.target,
                    e
                ),
            }
        }
        Ok(merged)
    }

    fn read_result(&self, target: &ScannedTarget, tool: Tool) -> ReportResult<Option<Vec<u8>>> {
        let path = self.layout.result_file(&target.scope, &target.target, tool);
        match std::fs::read(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Result {} is missing", path.display());
                Ok(None)
            }
            Err(source) => Err(ReportError::ReadResults { path, source }),
        }
    }
}
