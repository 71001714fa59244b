//! Canonical per-target findings

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Relative file path to the set of strings found in it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ScanResult(BTreeMap<String, BTreeSet<String>>);

impl ScanResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record findings for `path`; an empty finding list still registers the path
    pub fn insert<I, S>(&mut self, path: &str, findings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.0
            .entry(path.to_string())
            .or_default()
            .extend(findings.into_iter().map(Into::into));
    }

    /// Per-path union with another result
    pub fn merge(mut self, other: ScanResult) -> ScanResult {
        for (path, findings) in other.0 {
            self.0.entry(path).or_default().extend(findings);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn get(&self, path: &str) -> Option<&BTreeSet<String>> {
        self.0.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// One entry of the merged JSON report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergedEntry {
    pub repository: String,
    #[serde(rename = "stringsFound")]
    pub strings_found: ScanResult,
}
