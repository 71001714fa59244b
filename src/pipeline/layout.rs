//! On-disk layout of clones and results
//!
//! ```text
//! <repos-root>/org/<org>/<repo>
//! <repos-root>/users/<user>/<repo-or-gist-id>
//! <repos-root>/team/<repo>
//! <repos-root>/<owner>/<name>            ad-hoc targets
//! <results-root>/<scope>/<target>/<tool>
//! ```

use crate::pipeline::tools::Tool;
use std::path::{Path, PathBuf};

/// A scanned scope and the directory its targets were cloned into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRoot {
    pub name: String,
    pub clone_dir: PathBuf,
}

impl ScopeRoot {
    pub fn new(name: &str, clone_dir: PathBuf) -> Self {
        Self {
            name: name.to_string(),
            clone_dir,
        }
    }

    pub fn target_dir(&self, target: &str) -> PathBuf {
        self.clone_dir.join(target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    pub repos_root: PathBuf,
    pub results_root: PathBuf,
}

impl Default for WorkLayout {
    fn default() -> Self {
        Self {
            repos_root: PathBuf::from("/tmp/repos"),
            results_root: PathBuf::from("/tmp/results"),
        }
    }
}

impl WorkLayout {
    /// Layout rooted at `<work_dir>/repos` and `<work_dir>/results`
    pub fn under(work_dir: &Path) -> Self {
        Self {
            repos_root: work_dir.join("repos"),
            results_root: work_dir.join("results"),
        }
    }

    pub fn org_scope(&self, org: &str) -> ScopeRoot {
        ScopeRoot::new(org, self.repos_root.join("org").join(org))
    }

    pub fn user_scope(&self, user: &str) -> ScopeRoot {
        ScopeRoot::new(user, self.repos_root.join("users").join(user))
    }

    /// Team clones share one directory; results go under the team name
    pub fn team_scope(&self, team: &str) -> ScopeRoot {
        ScopeRoot::new(team, self.repos_root.join("team"))
    }

    pub fn adhoc_scope(&self, owner: &str) -> ScopeRoot {
        ScopeRoot::new(owner, self.repos_root.join(owner))
    }

    pub fn result_dir(&self, scope: &str, target: &str) -> PathBuf {
        self.results_root.join(scope).join(target)
    }

    pub fn result_file(&self, scope: &str, target: &str, tool: Tool) -> PathBuf {
        self.result_dir(scope, target).join(tool.result_name())
    }

    /// Directories created before any clone starts
    pub fn bootstrap_dirs(&self) -> Vec<PathBuf> {
        vec![
            self.repos_root.join("org"),
            self.repos_root.join("users"),
            self.repos_root.join("team"),
            self.results_root.clone(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_paths() {
        let layout = WorkLayout::default();
        assert_eq!(
            layout.org_scope("acme").clone_dir,
            PathBuf::from("/tmp/repos/org/acme")
        );
        assert_eq!(
            layout.user_scope("alice").clone_dir,
            PathBuf::from("/tmp/repos/users/alice")
        );
        let team = layout.team_scope("red");
        assert_eq!(team.name, "red");
        assert_eq!(team.clone_dir, PathBuf::from("/tmp/repos/team"));
        assert_eq!(
            layout.adhoc_scope("acme").clone_dir,
            PathBuf::from("/tmp/repos/acme")
        );
    }

    #[test]
    fn test_destination_and_result_paths() {
        let layout = WorkLayout::under(Path::new("/work"));
        assert_eq!(
            layout.org_scope("acme").target_dir("api"),
            PathBuf::from("/work/repos/org/acme/api")
        );
        assert_eq!(
            layout.result_file("acme", "api", Tool::RepoSupervisor),
            PathBuf::from("/work/results/acme/api/repo-supervisor")
        );
    }
}
