//! CLI argument parsing tests
//!
//! Tests for command-line argument parsing and the run configuration built from it.

use clap::Parser;
use secretsweep::app::cli::args::Args;
use secretsweep::core::config::OutputMode;
use secretsweep::discovery::types::ScopeRequest;
use secretsweep::pipeline::tools::{Tool, ToolSelection};
use std::path::PathBuf;

fn parse(argv: &[&str]) -> Args {
    let mut full = vec!["secretsweep"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).unwrap()
}

#[test]
fn test_every_scan_flag_parses() {
    let args = parse(&[
        "--org",
        "acme",
        "--token",
        "t0ken",
        "--output",
        "out.json",
        "--clone-forks",
        "--org-only",
        "--tool-name",
        "thog",
        "--team-name",
        "red",
        "--scan-private-repos-only",
        "--enterprise-url",
        "https://ghe.corp",
        "--threads",
        "4",
        "--thog-entropy",
        "--merge-output",
        "--blacklist",
        "a,b",
        "--scan-only",
    ]);

    assert_eq!(args.org.as_deref(), Some("acme"));
    assert_eq!(args.output, Some(PathBuf::from("out.json")));
    assert!(args.clone_forks && args.org_only && args.thog_entropy);
    assert!(args.merge_output && args.scan_only && args.scan_private_repos_only);
    assert_eq!(args.tool_name, Some(ToolSelection::Thog));
    assert_eq!(args.team_name.as_deref(), Some("red"));
    assert_eq!(args.threads, Some(4));
    assert_eq!(args.blacklist_entries(), vec!["a", "b"]);
}

#[test]
fn test_defaults_when_flags_absent() {
    let config = parse(&["--user", "alice", "--token", "t"]).run_config().unwrap();
    assert_eq!(config.scope, ScopeRequest::User("alice".into()));
    assert_eq!(config.threads, 10);
    assert_eq!(config.output_file, PathBuf::from("results.txt"));
    assert_eq!(config.output_mode, OutputMode::Concatenated);
    assert_eq!(config.tools.tools(), &[Tool::TruffleHog, Tool::RepoSupervisor]);
    assert!(!config.clone_forks);
    assert!(!config.prefer_ssh());
    assert_eq!(config.layout.repos_root, PathBuf::from("/tmp/repos"));
    assert_eq!(config.layout.results_root, PathBuf::from("/tmp/results"));
}

#[test]
fn test_unknown_tool_name_rejected() {
    assert!(Args::try_parse_from(["secretsweep", "--tool-name", "gitleaks"]).is_err());
}

#[test]
fn test_private_and_enterprise_prefer_ssh() {
    let private = parse(&["--user", "alice", "--scan-private-repos-only"])
        .run_config()
        .unwrap();
    assert!(private.prefer_ssh());

    let enterprise = parse(&["--org", "acme", "--enterprise-url", "https://ghe.corp"])
        .run_config()
        .unwrap();
    assert!(enterprise.is_enterprise());
    assert!(enterprise.prefer_ssh());
}

#[test]
fn test_merge_output_switches_trufflehog_to_json() {
    let config = parse(&["--org", "acme", "--merge-output", "--thog-entropy"])
        .run_config()
        .unwrap();
    let flags = config.scan_flags();
    assert!(flags.json);
    assert!(flags.entropy);
}

#[test]
fn test_tool_path_overrides() {
    let config = parse(&[
        "--gist-url",
        "https://gist.github.com/alice/abc",
        "--git",
        "/usr/local/bin/git",
        "--trufflehog-rules",
        "/etc/rules.json",
        "--repo-supervisor",
        "/opt/rs/run.sh",
        "--ssh-key",
        "/keys/deploy",
    ])
    .run_config()
    .unwrap();
    assert_eq!(config.tool_paths.git, "/usr/local/bin/git");
    assert_eq!(config.tool_paths.trufflehog_rules, "/etc/rules.json");
    assert_eq!(config.tool_paths.repo_supervisor, "/opt/rs/run.sh");
    assert_eq!(config.ssh_key, PathBuf::from("/keys/deploy"));
}
