//! CLI TOML configuration tests
//!
//! Tests for configuration file values and command-line precedence.

use clap::Parser;
use secretsweep::app::cli::args::Args;
use secretsweep::pipeline::tools::ToolSelection;
use std::path::PathBuf;
use toml::Table;

fn apply(argv: &[&str], text: &str) -> Args {
    let mut full = vec!["secretsweep"];
    full.extend_from_slice(argv);
    let mut args = Args::try_parse_from(full).unwrap();
    let config: Table = toml::from_str(text).unwrap();
    Args::apply_toml_values(&mut args, &config).unwrap();
    args
}

#[test]
fn test_full_configuration_file() {
    let args = apply(
        &["--org", "acme"],
        r#"
        token = "file-token"
        output = "/var/lib/sweep/results.json"
        enterprise-url = "https://ghe.corp"
        threads = 6
        tool-name = "repo-supervisor"
        clone-forks = true
        merge-output = true
        blacklist = "legacy, archive"
        work-dir = "/var/lib/sweep"
        ssh-key = "/keys/sweep"
        log-level = "debug"
        log-format = "json"
        no-color = true

        [tools]
        git = "/usr/bin/git"
        repo-supervisor = "/opt/rs/run.sh"
        "#,
    );

    let config = args.run_config().unwrap();
    assert_eq!(config.token, "file-token");
    assert_eq!(config.output_file, PathBuf::from("/var/lib/sweep/results.json"));
    assert!(config.is_enterprise());
    assert_eq!(config.threads, 6);
    assert!(config.clone_forks);
    assert_eq!(config.blacklist, vec!["legacy", "archive"]);
    assert_eq!(config.layout.results_root, PathBuf::from("/var/lib/sweep/results"));
    assert_eq!(config.ssh_key, PathBuf::from("/keys/sweep"));
    assert_eq!(config.tool_paths.git, "/usr/bin/git");
    assert_eq!(args.tool_name, Some(ToolSelection::RepoSupervisor));
    assert_eq!(args.log_format.as_deref(), Some("json"));
    assert!(args.no_color);
}

#[test]
fn test_cli_overrides_file() {
    let args = apply(
        &["--org", "acme", "--output", "mine.txt", "--tool-name", "thog", "--color"],
        "output = \"theirs.txt\"\ntool-name = \"all\"\nno-color = true\n",
    );
    assert_eq!(args.output, Some(PathBuf::from("mine.txt")));
    assert_eq!(args.tool_name, Some(ToolSelection::Thog));
    assert!(args.color);
    assert!(!args.no_color);
}

#[test]
fn test_blacklist_combines_file_and_cli() {
    let args = apply(
        &["--org", "acme", "--blacklist", "cli-one"],
        "blacklist = [\"file-one\", \"cli-one\"]",
    );
    assert_eq!(args.blacklist_entries(), vec!["file-one", "cli-one"]);
}

#[test]
fn test_wrong_types_rejected() {
    let mut args = Args::new();
    let config: Table = toml::from_str("threads = \"ten\"").unwrap();
    assert!(Args::apply_toml_values(&mut args, &config).is_err());

    let mut args = Args::new();
    let config: Table = toml::from_str("tools = \"git\"").unwrap();
    assert!(Args::apply_toml_values(&mut args, &config).is_err());

    let mut args = Args::new();
    let config: Table = toml::from_str("log-level = \"loud\"").unwrap();
    assert!(Args::apply_toml_values(&mut args, &config).is_err());
}
