use std::collections::BTreeSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::git::run_git;
use crate::application::ports::{
    is_workflow_file, RepoId, RepositoryDataSource, SourceError, WorkflowFile, WORKFLOW_DIR,
};

// =============================================================================
// Working-tree scans shared by the local sources
// =============================================================================

pub fn root_files(root: &Path) -> Result<BTreeSet<String>, SourceError> {
    let entries = fs::read_dir(root).map_err(|e| not_found_or_io(e, root))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let name = entry?.file_name().to_string_lossy().into_owned();
        // Clone metadata is not part of the repository listing
        if name != ".git" {
            names.insert(name);
        }
    }
    Ok(names)
}

pub fn file_content(root: &Path, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
    if !root.is_dir() {
        return Err(SourceError::NotFound(root.display().to_string()));
    }

    match fs::read(root.join(path.trim_start_matches('/'))) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Count remote branches opened by a bot (`dependabot/...`, `renovate/...`).
///
/// A clone has no pull-request metadata; bots push one branch per update PR.
pub fn bot_branch_count(root: &Path, creator: &str) -> Result<u64, SourceError> {
    let prefix = creator.strip_suffix("[bot]").unwrap_or(creator);
    let pattern = format!("refs/remotes/origin/{}/", prefix);
    let output = run_git(root, &["for-each-ref", "--format=%(refname)", &pattern])?;

    Ok(output.lines().filter(|line| !line.trim().is_empty()).count() as u64)
}

pub fn workflows(root: &Path) -> Result<Vec<WorkflowFile>, SourceError> {
    let dir = root.join(WORKFLOW_DIR);
    let entries = fs::read_dir(&dir).map_err(|e| not_found_or_io(e, &dir))?;

    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type()?.is_file() && is_workflow_file(&name) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut workflows = Vec::with_capacity(paths.len());
    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let relative = format!("{}/{}", WORKFLOW_DIR, name);

        workflows.push(WorkflowFile {
            content: fs::read(&path)?,
            last_modified: last_modified(root, &relative, &path)?,
            name,
            path: relative,
        });
    }

    Ok(workflows)
}

/// Last commit date touching `relative` (RFC 2822), or the file mtime when
/// the file has no history
fn last_modified(root: &Path, relative: &str, absolute: &Path) -> Result<String, SourceError> {
    match run_git(root, &["log", "-1", "--format=%cD", "--", relative]) {
        Ok(date) if !date.is_empty() => return Ok(date),
        Ok(_) => debug!(path = %relative, "No commit history, using file mtime"),
        Err(e) => debug!(path = %relative, error = %e, "git log unavailable, using file mtime"),
    }

    let modified: DateTime<Utc> = fs::metadata(absolute)?.modified()?.into();
    Ok(modified.to_rfc2822())
}

fn not_found_or_io(e: std::io::Error, path: &Path) -> SourceError {
    if e.kind() == ErrorKind::NotFound {
        SourceError::NotFound(path.display().to_string())
    } else {
        SourceError::Io(e)
    }
}

// =============================================================================
// Directory of existing clones
// =============================================================================

/// Repositories already cloned under `root/<name>`
pub struct LocalDirSource {
    root: PathBuf,
}

impl LocalDirSource {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn repo_path(&self, repo: &RepoId) -> PathBuf {
        self.root.join(&repo.name)
    }

    /// Every immediate subdirectory of `root`, as repositories of `owner`
    pub fn enumerate(&self, owner: &str) -> Result<Vec<RepoId>, SourceError> {
        let entries = fs::read_dir(&self.root).map_err(|e| not_found_or_io(e, &self.root))?;

        let mut repos = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.file_type()?.is_dir() && !name.starts_with('.') {
                repos.push(RepoId::new(owner, name));
            }
        }
        repos.sort();
        Ok(repos)
    }
}

impl RepositoryDataSource for LocalDirSource {
    fn list_root_files(&self, repo: &RepoId) -> Result<BTreeSet<String>, SourceError> {
        root_files(&self.repo_path(repo))
    }

    fn get_file_content(&self, repo: &RepoId, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        file_content(&self.repo_path(repo), path)
    }

    fn count_pull_requests(&self, repo: &RepoId, creator: &str) -> Result<u64, SourceError> {
        bot_branch_count(&self.repo_path(repo), creator)
    }

    fn list_workflows(&self, repo: &RepoId) -> Result<Vec<WorkflowFile>, SourceError> {
        workflows(&self.repo_path(repo))
    }

    fn kind(&self) -> &'static str {
        "local-dir"
    }
}
