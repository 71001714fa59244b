//! Run configuration
//!
//! [`RunConfig`] is built once from validated arguments and passed by
//! reference to every component. Nothing mutates it after startup.

use crate::core::retry::RetryPolicy;
use crate::discovery::discoverer::DiscoveryOptions;
use crate::discovery::types::ScopeRequest;
use crate::pipeline::layout::WorkLayout;
use crate::pipeline::tools::{ScanFlags, ToolPaths, ToolSet};
use std::path::PathBuf;

pub const DEFAULT_THREADS: usize = 10;
pub const DEFAULT_OUTPUT_FILE: &str = "results.txt";

/// How per-tool results are combined into the output file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Raw tool outputs, one section per tool
    #[default]
    Concatenated,
    /// One deduplicated JSON report across tools
    Merged,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub token: String,
    pub scope: ScopeRequest,
    pub clone_forks: bool,
    pub private_only: bool,
    pub enterprise_url: Option<String>,
    /// Capacity of the concurrency gate
    pub threads: usize,
    pub tools: ToolSet,
    pub thog_entropy: bool,
    pub output_mode: OutputMode,
    pub output_file: PathBuf,
    /// Organization repositories to skip
    pub blacklist: Vec<String>,
    /// Scan clones left by an earlier run instead of discovering and cloning
    pub scan_only: bool,
    pub layout: WorkLayout,
    pub tool_paths: ToolPaths,
    /// Key required for SSH clones
    pub ssh_key: PathBuf,
    pub retry: RetryPolicy,
}

impl RunConfig {
    /// Configuration with default settings for the given scope
    pub fn new(token: &str, scope: ScopeRequest) -> Self {
        Self {
            token: token.to_string(),
            scope,
            clone_forks: false,
            private_only: false,
            enterprise_url: None,
            threads: DEFAULT_THREADS,
            tools: ToolSet::default(),
            thog_entropy: false,
            output_mode: OutputMode::default(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            blacklist: Vec::new(),
            scan_only: false,
            layout: WorkLayout::default(),
            tool_paths: ToolPaths::default(),
            ssh_key: default_ssh_key(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn is_enterprise(&self) -> bool {
        self.enterprise_url.as_deref().is_some_and(|u| !u.is_empty())
    }

    /// SSH locators are used for private-only runs and enterprise hosts
    pub fn prefer_ssh(&self) -> bool {
        self.private_only || self.is_enterprise()
    }

    pub fn scan_flags(&self) -> ScanFlags {
        ScanFlags {
            json: self.output_mode == OutputMode::Merged,
            entropy: self.thog_entropy,
        }
    }

    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions {
            blacklist: self.blacklist.clone(),
            private_only: self.private_only,
            enterprise: self.is_enterprise(),
            retry: self.retry.clone(),
        }
    }
}

/// `~/.ssh/id_rsa`, or a relative path when no home directory is known
pub fn default_ssh_key() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_default()
        .join(".ssh")
        .join("id_rsa")
}
