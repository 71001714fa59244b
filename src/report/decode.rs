//! Decoders for the two tool result formats
//!
//! truffleHog (`--json`) writes one JSON object per line, one line per
//! finding, so the same path can appear many times. repo-supervisor writes a
//! single document `{"result": {"<absolute path>": [..]}}`.

use crate::report::error::DecodeError;
use crate::report::result::ScanResult;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct TruffleHogRecord {
    path: String,
    #[serde(rename = "stringsFound", default)]
    strings_found: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RepoSupervisorDocument {
    #[serde(default)]
    result: BTreeMap<String, Vec<String>>,
}

/// Fold truffleHog JSON lines into one result, keyed by path
pub fn decode_trufflehog(content: &str) -> Result<ScanResult, DecodeError> {
    let mut result = ScanResult::new();
    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: TruffleHogRecord =
            serde_json::from_str(line).map_err(|source| DecodeError::TruffleHogLine {
                line: index + 1,
                source,
            })?;
        if record.strings_found.is_empty() {
            continue;
        }
        result.insert(relative_key(&record.path, None), record.strings_found);
    }
    Ok(result)
}

/// Decode a repo-supervisor document, making paths relative to `clone_root`
pub fn decode_repo_supervisor(content: &str, clone_root: &Path) -> Result<ScanResult, DecodeError> {
    let mut result = ScanResult::new();
    if content.trim().is_empty() {
        return Ok(result);
    }

    let document: RepoSupervisorDocument =
        serde_json::from_str(content).map_err(DecodeError::RepoSupervisor)?;
    for (path, findings) in document.result {
        if findings.is_empty() {
            continue;
        }
        result.insert(relative_key(&path, Some(clone_root)), findings);
    }
    Ok(result)
}

/// Path relative to `root` (when it lies under it) with no leading separator
pub fn relative_key<'a>(path: &'a str, root: Option<&Path>) -> &'a str {
    let relative = root
        .and_then(|root| {
            let root = root.to_str()?.trim_end_matches('/');
            if root.is_empty() {
                return None;
            }
            path.strip_prefix(root)
                .filter(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .unwrap_or(path);
    relative.trim_start_matches('/')
}
