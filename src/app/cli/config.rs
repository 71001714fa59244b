//! TOML configuration file loading
//!
//! The configuration file carries settings that rarely change between runs
//! (token, tool locations, logging). The scope flags (`--org`, `--user`,
//! `--repo-url`, `--gist-url`, `--team-name`) are command-line only. Values
//! given on the command line always win over the file.

use std::path::PathBuf;

use super::args::Args;
use super::validation::ValidationError;
use crate::pipeline::tools::ToolSelection;

/// `<config dir>/Secretsweep/secretsweep.toml`, when a config dir is known
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Secretsweep").join("secretsweep.toml"))
}

impl Args {
    /// Read the configuration file
    ///
    /// An explicitly named file must exist; the default file is optional.
    /// Returns `Ok(None)` when there is nothing to load.
    pub async fn load_config_file(
        config_file: Option<PathBuf>,
    ) -> Result<Option<(PathBuf, toml::Table)>, ValidationError> {
        let path = match config_file {
            Some(path) => {
                if !path.exists() {
                    return Err(ValidationError::new(&format!(
                        "The specified configuration file does not exist: {}",
                        path.display()
                    )));
                }
                path
            }
            None => match default_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(None),
            },
        };

        let contents = tokio::fs::read_to_string(&path).await.map_err(|e| {
            ValidationError::new(&format!(
                "Error reading configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        let table = toml::from_str::<toml::Table>(&contents).map_err(|e| {
            ValidationError::new(&format!(
                "Error parsing configuration file {}: {}",
                path.display(),
                e
            ))
        })?;
        Ok(Some((path, table)))
    }

    /// Fill settings the command line left unset from a TOML table
    pub fn apply_toml_values(args: &mut Self, config: &toml::Table) -> Result<(), ValidationError> {
        Self::apply_string(config, "token", &mut args.token)?;
        Self::apply_string(config, "enterprise-url", &mut args.enterprise_url)?;
        Self::apply_path(config, "output", &mut args.output)?;
        Self::apply_path(config, "work-dir", &mut args.work_dir)?;
        Self::apply_path(config, "ssh-key", &mut args.ssh_key)?;

        if args.threads.is_none() {
            if let Some(value) = config.get("threads") {
                let threads = value
                    .as_integer()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| ValidationError::new("'threads' must be a positive integer"))?;
                args.threads = Some(threads as usize);
            }
        }

        if args.tool_name.is_none() {
            if let Some(value) = config.get("tool-name") {
                let name = value
                    .as_str()
                    .ok_or_else(|| ValidationError::new("'tool-name' must be a string"))?;
                let selection = ToolSelection::from_name(name).ok_or_else(|| {
                    ValidationError::new(&format!(
                        "Unknown tool-name '{}'. Expected all, thog or repo-supervisor",
                        name
                    ))
                })?;
                args.tool_name = Some(selection);
            }
        }

        Self::apply_flag(config, "clone-forks", &mut args.clone_forks)?;
        Self::apply_flag(config, "thog-entropy", &mut args.thog_entropy)?;
        Self::apply_flag(config, "merge-output", &mut args.merge_output)?;
        Self::apply_flag(config, "scan-private-repos-only", &mut args.scan_private_repos_only)?;

        // Config entries come first so command-line entries keep their order after them
        let mut blacklist = Vec::new();
        Self::apply_string_array_field(config, "blacklist", &mut blacklist)?;
        blacklist.append(&mut args.blacklist);
        args.blacklist = blacklist;

        if !args.color && !args.no_color {
            if let Some(color) = config.get("color").and_then(|v| v.as_bool()) {
                args.color = color;
                args.no_color = !color;
            } else if let Some(no_color) = config.get("no-color").and_then(|v| v.as_bool()) {
                args.no_color = no_color;
            }
        }

        if args.log_level.is_none() {
            if let Some(level) = config.get("log-level").and_then(|v| v.as_str()) {
                match level {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => {
                        args.log_level = Some(level.to_string())
                    }
                    _ => {
                        return Err(ValidationError::new(&format!(
                            "Unknown log-level '{}'",
                            level
                        )))
                    }
                }
            }
        }
        if args.log_format.is_none() {
            if let Some(format) = config.get("log-format").and_then(|v| v.as_str()) {
                match format {
                    "text" | "ext" | "json" => args.log_format = Some(format.to_string()),
                    _ => {
                        return Err(ValidationError::new(&format!(
                            "Unknown log-format '{}'",
                            format
                        )))
                    }
                }
            }
        }
        Self::apply_path(config, "log-file", &mut args.log_file)?;

        if let Some(tools) = config.get("tools") {
            let tools = tools
                .as_table()
                .ok_or_else(|| ValidationError::new("'tools' must be a table"))?;
            Self::apply_string(tools, "git", &mut args.git)?;
            Self::apply_string(tools, "trufflehog", &mut args.trufflehog)?;
            Self::apply_string(tools, "trufflehog-rules", &mut args.trufflehog_rules)?;
            Self::apply_string(tools, "repo-supervisor", &mut args.repo_supervisor)?;
        }

        for key in ["org", "user", "repo-url", "gist-url", "team-name"] {
            if config.contains_key(key) {
                log::warn!(
                    "Ignoring '{}' in the configuration file; give it on the command line",
                    key
                );
            }
        }

        Ok(())
    }

    fn apply_string(
        config: &toml::Table,
        key: &str,
        target: &mut Option<String>,
    ) -> Result<(), ValidationError> {
        if target.is_some() {
            return Ok(());
        }
        if let Some(value) = config.get(key) {
            let value = value
                .as_str()
                .ok_or_else(|| ValidationError::new(&format!("'{}' must be a string", key)))?;
            *target = Some(value.to_string());
        }
        Ok(())
    }

    fn apply_path(
        config: &toml::Table,
        key: &str,
        target: &mut Option<PathBuf>,
    ) -> Result<(), ValidationError> {
        let mut value = None;
        Self::apply_string(config, key, &mut value)?;
        if target.is_none() {
            *target = value.map(PathBuf::from);
        }
        Ok(())
    }

    fn apply_flag(config: &toml::Table, key: &str, target: &mut bool) -> Result<(), ValidationError> {
        if let Some(value) = config.get(key) {
            let enabled = value
                .as_bool()
                .ok_or_else(|| ValidationError::new(&format!("'{}' must be true or false", key)))?;
            *target = *target || enabled;
        }
        Ok(())
    }

    /// Apply string array field from TOML config (handles both single string and array formats)
    fn apply_string_array_field(
        config: &toml::Table,
        key: &str,
        target: &mut Vec<String>,
    ) -> Result<(), ValidationError> {
        if let Some(value) = config.get(key) {
            if let Some(str_val) = value.as_str() {
                target.push(str_val.to_string());
            } else if let Some(array_val) = value.as_array() {
                for item in array_val {
                    let item = item.as_str().ok_or_else(|| {
                        ValidationError::new(&format!("'{}' entries must be strings", key))
                    })?;
                    target.push(item.to_string());
                }
            } else {
                return Err(ValidationError::new(&format!(
                    "'{}' must be a string or an array of strings",
                    key
                )));
            }
        }
        Ok(())
    }
}
