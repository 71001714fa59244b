//! Repository identity of a clone

use std::path::Path;

/// URL of the `origin` remote configured in the clone at `path`
pub fn origin_url(path: &Path) -> Result<String, String> {
    let repo = gix::open(path).map_err(|e| format!("not a git repository: {}", e))?;
    let remote = repo
        .find_remote("origin")
        .map_err(|e| format!("no origin remote: {}", e))?;
    remote
        .url(gix::remote::Direction::Fetch)
        .map(|url| url.to_bstring().to_string())
        .ok_or_else(|| "origin remote has no fetch URL".to_string())
}

/// Identity used in the merged report, falling back to `<scope>/<target>`
pub fn repository_identity(clone_dir: &Path, scope: &str, target: &str) -> String {
    match origin_url(clone_dir) {
        Ok(url) => url,
        Err(reason) => {
            log::warn!(
                "Could not read origin of {} ({}), reporting it as {}/{}",
                clone_dir.display(),
                reason,
                scope,
                target
            );
            format!("{}/{}", scope, target)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_origin_url_read_from_config() {
        let dir = tempfile::tempdir().unwrap();
        gix::init(dir.path()).unwrap();
        let mut config = std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join(".git/config"))
            .unwrap();
        writeln!(
            config,
            "[remote \"origin\"]\n\turl = https://github.com/acme/api.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*"
        )
        .unwrap();
        drop(config);

        assert_eq!(
            origin_url(dir.path()).unwrap(),
            "https://github.com/acme/api.git"
        );
    }

    #[test]
    fn test_identity_falls_back_to_scope_and_target() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(repository_identity(dir.path(), "acme", "api"), "acme/api");
    }
}
