//! Command-line arguments
//!
//! The Args struct holds everything a run can be configured with. Values the
//! command line leaves unset may be filled from the configuration file
//! (see `config.rs`); defaults are applied when the [`RunConfig`] is built.

use crate::core::config::{OutputMode, RunConfig, DEFAULT_OUTPUT_FILE, DEFAULT_THREADS};
use crate::core::logging::level_for_verbosity;
use crate::discovery::discoverer::DiscoveryOptions;
use crate::discovery::types::ScopeRequest;
use crate::pipeline::layout::WorkLayout;
use crate::pipeline::tools::{ToolSelection, ToolSet};
use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "secretsweep")]
#[command(about = "Find secrets across a GitHub organization, user, team, repository or gist")]
#[command(version)]
#[command(after_help = " * can be specified multiple times or as a comma-separated list")]
pub struct Args {
    /// Organization to scan (its repos, then its members' repos and gists)
    #[arg(long = "org", value_name = "ORG")]
    pub org: Option<String>,

    /// GitHub personal access token
    #[arg(short = 't', long = "token", value_name = "TOKEN")]
    pub token: Option<String>,

    /// Output file for the combined results [default: results.txt]
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// User to scan (repos and gists)
    #[arg(short = 'u', long = "user", value_name = "USER")]
    pub user: Option<String>,

    /// Single repository to scan (HTTPS or SSH URL)
    #[arg(long = "repo-url", value_name = "URL")]
    pub repo_url: Option<String>,

    /// Single gist to scan
    #[arg(long = "gist-url", value_name = "URL")]
    pub gist_url: Option<String>,

    /// Also clone repositories that are forks
    #[arg(long = "clone-forks")]
    pub clone_forks: bool,

    /// Scan only the organization's repositories, not its members'
    #[arg(long = "org-only")]
    pub org_only: bool,

    /// Which tools to run [default: all]
    #[arg(long = "tool-name", value_name = "TOOL", value_enum)]
    pub tool_name: Option<ToolSelection>,

    /// Team of the organization whose repositories are scanned as well
    #[arg(long = "team-name", value_name = "TEAM")]
    pub team_name: Option<String>,

    /// Only scan private repositories (clones over SSH)
    #[arg(long = "scan-private-repos-only")]
    pub scan_private_repos_only: bool,

    /// Base URL of a GitHub Enterprise instance
    #[arg(long = "enterprise-url", value_name = "URL")]
    pub enterprise_url: Option<String>,

    /// Maximum number of clone and scan processes running at once [default: 10]
    #[arg(short = 'j', long = "threads", value_name = "COUNT")]
    pub threads: Option<usize>,

    /// Let truffleHog report high-entropy strings
    #[arg(long = "thog-entropy")]
    pub thog_entropy: bool,

    /// Merge all tool outputs into one JSON report
    #[arg(long = "merge-output")]
    pub merge_output: bool,

    /// Organization repositories to skip*
    #[arg(long = "blacklist", value_name = "REPOS", action = ArgAction::Append)]
    pub blacklist: Vec<String>,

    /// Scan existing clones only, without discovering or cloning
    #[arg(long = "scan-only")]
    pub scan_only: bool,

    /// Configuration file path
    #[arg(short = 'c', long = "config-file", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Force colored output
    #[arg(long = "color", conflicts_with = "no_color")]
    pub color: bool,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Increase verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,

    /// Log level (overrides -v/-q)
    #[arg(short = 'l', long = "log-level", value_name = "LEVEL", value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    /// Log file path (use 'none' to disable file logging)
    #[arg(short = 'f', long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Log output format
    #[arg(long = "log-format", value_name = "FORMAT", value_parser = ["text", "ext", "json"])]
    pub log_format: Option<String>,

    /// Directory holding the repos/ and results/ trees [default: /tmp]
    #[arg(short = 'w', long = "work-dir", value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// SSH private key used for SSH clones [default: ~/.ssh/id_rsa]
    #[arg(long = "ssh-key", value_name = "FILE")]
    pub ssh_key: Option<PathBuf>,

    /// git executable
    #[arg(long = "git", value_name = "PATH")]
    pub git: Option<String>,

    /// truffleHog executable
    #[arg(long = "trufflehog", value_name = "PATH")]
    pub trufflehog: Option<String>,

    /// truffleHog rules file
    #[arg(long = "trufflehog-rules", value_name = "FILE")]
    pub trufflehog_rules: Option<String>,

    /// repo-supervisor wrapper script
    #[arg(long = "repo-supervisor", value_name = "PATH")]
    pub repo_supervisor: Option<String>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tool_selection(&self) -> ToolSelection {
        self.tool_name.unwrap_or_default()
    }

    /// The single scope requested, if exactly one was given
    pub fn scope_request(&self) -> Option<ScopeRequest> {
        match (&self.org, &self.user, &self.repo_url, &self.gist_url) {
            (Some(org), None, None, None) => Some(ScopeRequest::Organization {
                org: org.clone(),
                team: self.team_name.clone(),
                org_only: self.org_only,
            }),
            (None, Some(user), None, None) => Some(ScopeRequest::User(user.clone())),
            (None, None, Some(url), None) => Some(ScopeRequest::Repository(url.clone())),
            (None, None, None, Some(url)) => Some(ScopeRequest::Gist(url.clone())),
            _ => None,
        }
    }

    /// Blacklist entries, flattened from repeated and comma-separated values
    pub fn blacklist_entries(&self) -> Vec<String> {
        let mut entries: Vec<String> = Vec::new();
        for value in &self.blacklist {
            for name in DiscoveryOptions::parse_blacklist(value) {
                if !entries.contains(&name) {
                    entries.push(name);
                }
            }
        }
        entries
    }

    /// Level from --log-level, or from the -v/-q balance
    pub fn effective_log_level(&self) -> String {
        match &self.log_level {
            Some(level) => level.clone(),
            None => {
                let verbosity = (self.verbose.min(i8::MAX as u8) as i8) - (self.quiet as i8);
                level_for_verbosity(verbosity).to_string()
            }
        }
    }

    /// Whether file logging was switched off with `none` or `-`
    pub fn log_file_path(&self) -> Option<String> {
        self.log_file
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
            .filter(|p| !p.eq_ignore_ascii_case("none") && p != "-")
    }

    /// Build the run configuration from validated arguments
    ///
    /// Returns `None` when no single scope was requested; `validate` reports
    /// that case with a proper message.
    pub fn run_config(&self) -> Option<RunConfig> {
        let scope = self.scope_request()?;
        let mut config = RunConfig::new(self.token.as_deref().unwrap_or_default(), scope);

        config.clone_forks = self.clone_forks;
        config.private_only = self.scan_private_repos_only;
        config.enterprise_url = self
            .enterprise_url
            .clone()
            .filter(|url| !url.trim().is_empty());
        config.threads = self.threads.unwrap_or(DEFAULT_THREADS);
        config.tools = ToolSet::from_selection(self.tool_selection());
        config.thog_entropy = self.thog_entropy;
        config.output_mode = if self.merge_output {
            OutputMode::Merged
        } else {
            OutputMode::Concatenated
        };
        config.output_file = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
        config.blacklist = self.blacklist_entries();
        config.scan_only = self.scan_only;
        if let Some(work_dir) = &self.work_dir {
            config.layout = WorkLayout::under(work_dir);
        }
        if let Some(key) = &self.ssh_key {
            config.ssh_key = key.clone();
        }
        if let Some(git) = &self.git {
            config.tool_paths.git = git.clone();
        }
        if let Some(trufflehog) = &self.trufflehog {
            config.tool_paths.trufflehog = trufflehog.clone();
        }
        if let Some(rules) = &self.trufflehog_rules {
            config.tool_paths.trufflehog_rules = rules.clone();
        }
        if let Some(script) = &self.repo_supervisor {
            config.tool_paths.repo_supervisor = script.clone();
        }

        Some(config)
    }
}
