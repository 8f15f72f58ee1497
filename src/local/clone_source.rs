use std::cell::RefCell;
use std::collections::BTreeSet;
use std::path::PathBuf;

use tempfile::TempDir;
use tracing::{debug, info};

use super::git;
use super::scan;
use crate::application::ports::{RepoId, RepositoryDataSource, SourceError, WorkflowFile};

pub const DEFAULT_CLONE_BASE: &str = "https://github.com";

/// The clone currently being scanned
struct Checkout {
    repo: RepoId,
    dir: Result<TempDir, String>,
}

/// Clones each repository on first use and scans the working tree.
///
/// Every repository gets a freshly created temporary directory. Moving on to
/// another repository drops (deletes) the previous clone first, even when
/// that clone failed, so no scan can observe another repository's files.
pub struct LocalCloneSource {
    base_url: String,
    token: Option<String>,
    current: RefCell<Option<Checkout>>,
}

impl LocalCloneSource {
    pub fn new(base_url: String, token: Option<String>) -> Self {
        Self {
            base_url,
            token,
            current: RefCell::new(None),
        }
    }

    /// Working tree for `repo`, cloning it if it is not the current checkout
    fn checkout(&self, repo: &RepoId) -> Result<PathBuf, SourceError> {
        let mut current = self.current.borrow_mut();

        let reuse = matches!(current.as_ref(), Some(checkout) if &checkout.repo == repo);
        if !reuse {
            if let Some(previous) = current.take() {
                debug!(repo = %previous.repo, "Removing previous clone");
            }
            *current = Some(Checkout {
                repo: repo.clone(),
                dir: self.clone_fresh(repo).map_err(|e| e.to_string()),
            });
        }

        match current.as_ref().map(|checkout| &checkout.dir) {
            Some(Ok(dir)) => Ok(dir.path().join(&repo.name)),
            Some(Err(message)) => Err(SourceError::Git(message.clone())),
            None => Err(SourceError::Git(format!("no checkout for {}", repo))),
        }
    }

    fn clone_fresh(&self, repo: &RepoId) -> Result<TempDir, SourceError> {
        let dir = tempfile::Builder::new().prefix("repo-audit-").tempdir()?;
        let dest = dir.path().join(&repo.name);

        let url = git::clone_url(&self.base_url, &repo.owner, &repo.name, self.token.as_deref());
        let display_url = git::clone_url(&self.base_url, &repo.owner, &repo.name, None);

        info!(repo = %repo, dest = %dest.display(), "Cloning repository");
        git::clone(&url, &display_url, &dest)?;
        Ok(dir)
    }
}

impl RepositoryDataSource for LocalCloneSource {
    fn list_root_files(&self, repo: &RepoId) -> Result<BTreeSet<String>, SourceError> {
        scan::root_files(&self.checkout(repo)?)
    }

    fn get_file_content(&self, repo: &RepoId, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        scan::file_content(&self.checkout(repo)?, path)
    }

    fn count_pull_requests(&self, repo: &RepoId, creator: &str) -> Result<u64, SourceError> {
        scan::bot_branch_count(&self.checkout(repo)?, creator)
    }

    fn list_workflows(&self, repo: &RepoId) -> Result<Vec<WorkflowFile>, SourceError> {
        scan::workflows(&self.checkout(repo)?)
    }

    fn kind(&self) -> &'static str {
        "local-clone"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::dependency_automation::{DEPENDABOT_LOGIN, RENOVATE_LOGIN};
    use crate::checks::workflow_activity::parse_last_modified;
    use crate::testing::{init_git_repo, publish_bare, FIXTURE_COMMIT_DATE};
    use std::path::Path;

    /// Bare remotes `acme/one` and `acme/two` under `root/remotes`; returns the clone base URL
    fn remotes(root: &Path) -> String {
        let remotes = root.join("remotes");
        init_git_repo(
            &root.join("work/one"),
            &[("one.txt", "1"), (".github/workflows/ci.yml", "name: CI\n")],
            &["dependabot/npm_and_yarn/lodash-4.17.21", "dependabot/npm_and_yarn/react-18.3.1", "renovate/jest-29.x"],
        );
        init_git_repo(
            &root.join("work/two"),
            &[("two.txt", "2"), (".github/workflows/release.yml", "name: Release\n")],
            &[],
        );
        publish_bare(&root.join("work/one"), &remotes, "acme", "one");
        publish_bare(&root.join("work/two"), &remotes, "acme", "two");
        format!("file://{}", remotes.display())
    }

    #[test]
    fn test_next_repository_replaces_previous_checkout() {
        let tmp = tempfile::tempdir().unwrap();
        let source = LocalCloneSource::new(remotes(tmp.path()), None);
        let one = RepoId::new("acme", "one");
        let two = RepoId::new("acme", "two");

        let one_files = source.list_root_files(&one).unwrap();
        assert!(one_files.contains("one.txt"));
        assert!(!one_files.contains(".git"));

        // Same repository reuses the checkout
        let one_path = source.checkout(&one).unwrap();
        assert!(one_path.join("one.txt").exists());

        let two_files = source.list_root_files(&two).unwrap();
        assert!(two_files.contains("two.txt"));
        assert!(!two_files.contains("one.txt"));

        // The previous temporary directory is gone
        assert!(!one_path.exists());
        assert!(!one_path.parent().unwrap().exists());
    }

    #[test]
    fn test_failed_clone_still_drops_previous_checkout() {
        let tmp = tempfile::tempdir().unwrap();
        let source = LocalCloneSource::new(remotes(tmp.path()), None);

        source.list_root_files(&RepoId::new("acme", "one")).unwrap();
        let one_path = source.checkout(&RepoId::new("acme", "one")).unwrap();

        let missing = source.list_root_files(&RepoId::new("acme", "ghost"));
        assert!(matches!(missing, Err(SourceError::Git(_))));
        assert!(!one_path.exists());
    }

    #[test]
    fn test_clone_scans_use_git_history_and_bot_branches() {
        let tmp = tempfile::tempdir().unwrap();
        let source = LocalCloneSource::new(remotes(tmp.path()), None);
        let one = RepoId::new("acme", "one");

        let workflows = source.list_workflows(&one).unwrap();
        assert_eq!(workflows.len(), 1);
        assert_eq!(workflows[0].path, ".github/workflows/ci.yml");
        assert_eq!(
            parse_last_modified(&workflows[0].last_modified).unwrap(),
            parse_last_modified(FIXTURE_COMMIT_DATE).unwrap()
        );

        assert_eq!(source.count_pull_requests(&one, DEPENDABOT_LOGIN).unwrap(), 2);
        assert_eq!(source.count_pull_requests(&one, RENOVATE_LOGIN).unwrap(), 1);

        let two = RepoId::new("acme", "two");
        assert_eq!(source.count_pull_requests(&two, DEPENDABOT_LOGIN).unwrap(), 0);
    }

    #[test]
    fn test_failed_clone_is_cached_per_repository() {
        // Nothing listens on this port, so the clone fails quickly
        let source = LocalCloneSource::new("http://127.0.0.1:9".to_string(), None);
        let repo = RepoId::new("acme", "widgets");

        let first = source.list_root_files(&repo);
        assert!(matches!(first, Err(SourceError::Git(_))));

        let second = source.get_file_content(&repo, "package.json");
        assert!(matches!(second, Err(SourceError::Git(_))));
    }
}
