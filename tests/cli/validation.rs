//! CLI validation tests
//!
//! Argument validation through the library, and the exit status of the binary
//! when validation fails before any network access.

use clap::Parser;
use secretsweep::app::cli::args::Args;
use std::process::Command;

fn validate(argv: &[&str]) -> Result<(), String> {
    let mut full = vec!["secretsweep"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full)
        .unwrap()
        .validate()
        .map_err(|e| e.details().to_string())
}

#[test]
fn test_token_is_required() {
    let err = validate(&["--org", "acme"]).unwrap_err();
    assert!(err.contains("token"));
}

#[test]
fn test_scopes_are_exclusive() {
    let err = validate(&[
        "--token",
        "t",
        "--repo-url",
        "https://github.com/a/b",
        "--gist-url",
        "https://gist.github.com/a/1",
    ])
    .unwrap_err();
    assert!(err.contains("--repo-url, --gist-url"));
}

#[test]
fn test_enterprise_host_accepted_with_enterprise_url() {
    assert!(validate(&["--token", "t", "--repo-url", "https://ghe.corp/team/api"]).is_err());
    assert!(validate(&[
        "--token",
        "t",
        "--repo-url",
        "https://ghe.corp/team/api",
        "--enterprise-url",
        "https://ghe.corp"
    ])
    .is_ok());
}

#[test]
fn test_private_only_needs_a_repository_scope() {
    assert!(validate(&["--token", "t", "--org", "acme", "--scan-private-repos-only"]).is_ok());
    assert!(validate(&[
        "--token",
        "t",
        "--gist-url",
        "https://gist.github.com/a/1",
        "--scan-private-repos-only"
    ])
    .is_err());
}

fn binary() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_secretsweep"));
    command.env_remove("RUST_LOG");
    command
}

#[test]
fn test_binary_exits_with_status_two_on_invalid_arguments() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("empty.toml");
    std::fs::write(&config, "").unwrap();

    let output = binary()
        .args([
            "--config-file",
            config.to_str().unwrap(),
            "--no-color",
            "--org",
            "acme",
        ])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    let logged = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(logged.contains("FATAL"), "output was: {}", logged);
    assert!(logged.contains("token"), "output was: {}", logged);
}

#[test]
fn test_binary_exits_with_status_two_on_missing_config_file() {
    let output = binary()
        .args(["--config-file", "/nonexistent/secretsweep.toml", "--org", "acme"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("does not exist"));
}

#[test]
fn test_binary_version() {
    let output = binary().arg("--version").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("secretsweep"));
}
