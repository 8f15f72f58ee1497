//! In-memory collaborators shared by unit tests

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::application::ports::{RepoId, RepositoryDataSource, SourceError, WorkflowFile};

/// Canned repository data; a missing entry behaves like a missing repository
#[derive(Debug, Default, Clone)]
pub struct FakeRepo {
    pub root_files: Vec<String>,
    pub files: HashMap<String, Vec<u8>>,
    pub pull_requests: HashMap<String, u64>,
    /// `None` means the workflow directory does not exist
    pub workflows: Option<Vec<WorkflowFile>>,
}

impl FakeRepo {
    pub fn with_root_files(mut self, names: &[&str]) -> Self {
        self.root_files = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.as_bytes().to_vec());
        self
    }

    pub fn with_pull_requests(mut self, creator: &str, count: u64) -> Self {
        self.pull_requests.insert(creator.to_string(), count);
        self
    }

    pub fn with_workflow(mut self, name: &str, content: &str, last_modified: &str) -> Self {
        self.workflows.get_or_insert_with(Vec::new).push(WorkflowFile {
            name: name.to_string(),
            path: format!(".github/workflows/{}", name),
            content: content.as_bytes().to_vec(),
            last_modified: last_modified.to_string(),
        });
        self
    }

    pub fn with_empty_workflow_dir(mut self) -> Self {
        self.workflows.get_or_insert_with(Vec::new);
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeSource {
    pub repos: HashMap<RepoId, FakeRepo>,
    /// Every call fails with an API error when set
    pub broken: bool,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_repo(mut self, id: &RepoId, repo: FakeRepo) -> Self {
        self.repos.insert(id.clone(), repo);
        self
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn repo(&self, id: &RepoId) -> Result<&FakeRepo, SourceError> {
        if self.broken {
            return Err(SourceError::Api {
                status: 500,
                body: "server error".to_string(),
            });
        }
        self.repos
            .get(id)
            .ok_or_else(|| SourceError::NotFound(format!("repository {}", id)))
    }
}

impl RepositoryDataSource for FakeSource {
    fn list_root_files(&self, repo: &RepoId) -> Result<BTreeSet<String>, SourceError> {
        Ok(self.repo(repo)?.root_files.iter().cloned().collect())
    }

    fn get_file_content(&self, repo: &RepoId, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        Ok(self.repo(repo)?.files.get(path).cloned())
    }

    fn count_pull_requests(&self, repo: &RepoId, creator: &str) -> Result<u64, SourceError> {
        Ok(self.repo(repo)?.pull_requests.get(creator).copied().unwrap_or(0))
    }

    fn list_workflows(&self, repo: &RepoId) -> Result<Vec<WorkflowFile>, SourceError> {
        self.repo(repo)?
            .workflows
            .clone()
            .ok_or_else(|| SourceError::NotFound(format!("{}/.github/workflows", repo)))
    }

    fn kind(&self) -> &'static str {
        "fake"
    }
}

// =============================================================================
// Git fixtures
// =============================================================================

/// Commit date of every fixture commit
pub const FIXTURE_COMMIT_DATE: &str = "Wed, 21 Oct 2015 07:28:00 +0000";

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["-c", "user.name=Audit Test", "-c", "user.email=audit@example.com"])
        .args(["-c", "commit.gpgsign=false", "-c", "init.defaultBranch=main"])
        .args(args)
        .env("GIT_AUTHOR_DATE", FIXTURE_COMMIT_DATE)
        .env("GIT_COMMITTER_DATE", FIXTURE_COMMIT_DATE)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Working repository at `dir` with `files` in one commit and a branch per `branches` entry
pub fn init_git_repo(dir: &Path, files: &[(&str, &str)], branches: &[&str]) {
    fs::create_dir_all(dir).unwrap();
    git(dir, &["init", "-q"]);
    for (path, content) in files {
        let full = dir.join(path);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, content).unwrap();
    }
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", "initial"]);
    for branch in branches {
        git(dir, &["branch", branch]);
    }
}

/// Bare copy of `work` at `<remotes>/<owner>/<name>.git`, the layout `clone_url` expects
pub fn publish_bare(work: &Path, remotes: &Path, owner: &str, name: &str) -> PathBuf {
    let dest = remotes.join(owner).join(format!("{}.git", name));
    fs::create_dir_all(dest.parent().unwrap()).unwrap();
    git(
        remotes,
        &["clone", "-q", "--bare", &work.to_string_lossy(), &dest.to_string_lossy()],
    );
    dest
}
