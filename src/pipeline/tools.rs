//! Secret-scanning tools and tool selection

use std::fmt;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::pipeline::runner::CommandSpec;

/// External secret-scanning tool
#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tool {
    /// truffleHog: regex and entropy scan over git history
    TruffleHog,
    /// repo-supervisor: wrapper script that writes `{"result": {...}}`
    RepoSupervisor,
}

impl Tool {
    /// File name of this tool's result under a target's result directory
    pub fn result_name(&self) -> &'static str {
        match self {
            Self::TruffleHog => "truffleHog",
            Self::RepoSupervisor => "repo-supervisor",
        }
    }

    /// Exit statuses that count as a completed scan
    ///
    /// truffleHog exits 1 when it reports findings.
    pub fn ok_statuses(&self) -> &'static [i32] {
        match self {
            Self::TruffleHog => &[0, 1],
            Self::RepoSupervisor => &[0],
        }
    }

    pub fn is_ok_status(&self, status: Option<i32>) -> bool {
        status.is_some_and(|code| self.ok_statuses().contains(&code))
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.result_name())
    }
}

/// The `--tool-name` choices
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolSelection {
    #[default]
    All,
    Thog,
    RepoSupervisor,
}

impl ToolSelection {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(Self::All),
            "thog" => Some(Self::Thog),
            "repo-supervisor" => Some(Self::RepoSupervisor),
            _ => None,
        }
    }
}

/// Ordered, non-empty set of tools to run per target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSet {
    tools: Vec<Tool>,
}

impl ToolSet {
    pub fn from_selection(selection: ToolSelection) -> Self {
        let tools = match selection {
            ToolSelection::All => Tool::iter().collect(),
            ToolSelection::Thog => vec![Tool::TruffleHog],
            ToolSelection::RepoSupervisor => vec![Tool::RepoSupervisor],
        };
        Self { tools }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn contains(&self, tool: Tool) -> bool {
        self.tools.contains(&tool)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolSet {
    fn default() -> Self {
        Self::from_selection(ToolSelection::All)
    }
}

/// Locations of the external programs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub git: String,
    pub trufflehog: String,
    pub trufflehog_rules: String,
    pub repo_supervisor: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            git: "git".to_string(),
            trufflehog: "trufflehog".to_string(),
            trufflehog_rules: "/root/truffleHog/rules.json".to_string(),
            repo_supervisor: "/root/repo-supervisor/runreposupervisor.sh".to_string(),
        }
    }
}

/// Options that change a tool's command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanFlags {
    /// Emit JSON lines (merged output mode)
    pub json: bool,
    pub entropy: bool,
}

/// Command line for running `tool` over `target_dir`, writing to `result_file`
pub fn scan_command(
    tool: Tool,
    paths: &ToolPaths,
    flags: ScanFlags,
    target_dir: &Path,
    result_file: &Path,
) -> CommandSpec {
    let target = target_dir.to_string_lossy().to_string();
    match tool {
        Tool::TruffleHog => {
            let mut args = vec![
                target,
                format!("--rules={}", paths.trufflehog_rules),
                "--regex".to_string(),
            ];
            if flags.json {
                args.push("--json".to_string());
            }
            args.push(format!(
                "--entropy={}",
                if flags.entropy { "True" } else { "False" }
            ));
            CommandSpec::new(&paths.trufflehog, args).with_stdout(result_file)
        }
        Tool::RepoSupervisor => CommandSpec::new(
            &paths.repo_supervisor,
            vec![target, result_file.to_string_lossy().to_string()],
        ),
    }
}
