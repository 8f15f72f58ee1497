use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info};

use super::git;
use crate::application::ports::{RepoId, SourceError};

/// Per-repository status record written into the destination directory
pub const STATUS_FILE: &str = "repository_names.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneStatus {
    Success,
    Failed,
}

impl CloneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CloneStatus::Success => "Success",
            CloneStatus::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CloneResult {
    pub repo: RepoId,
    pub status: CloneStatus,
}

/// Clones a list of repositories side by side into one directory.
///
/// The result is the layout `LocalDirSource` scans.
pub struct TeamCloner {
    base_url: String,
    token: Option<String>,
    dest: PathBuf,
}

impl TeamCloner {
    pub fn new(base_url: String, token: Option<String>, dest: PathBuf) -> Self {
        Self {
            base_url,
            token,
            dest,
        }
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn status_path(&self) -> PathBuf {
        self.dest.join(STATUS_FILE)
    }

    /// Clone every repository, continuing past failures
    pub fn clone_all(&self, repos: &[RepoId]) -> Result<Vec<CloneResult>, SourceError> {
        fs::create_dir_all(&self.dest)?;

        // Rows are flushed as each clone finishes
        let mut record = File::create(self.status_path())?;
        writeln!(record, "Repository Name,Clone Status")?;

        let total = repos.len();
        let mut results = Vec::with_capacity(total);

        for (i, repo) in repos.iter().enumerate() {
            let target = self.dest.join(&repo.name);
            let status = if target.exists() {
                // An existing directory could hold another repository's files
                error!(repo = %repo, path = %target.display(), "Target directory already exists");
                CloneStatus::Failed
            } else {
                let url = git::clone_url(&self.base_url, &repo.owner, &repo.name, self.token.as_deref());
                let display_url = git::clone_url(&self.base_url, &repo.owner, &repo.name, None);
                match git::clone(&url, &display_url, &target) {
                    Ok(()) => CloneStatus::Success,
                    Err(e) => {
                        error!(repo = %repo, error = %e, "Clone failed");
                        // Leave nothing half-cloned behind
                        let _ = fs::remove_dir_all(&target);
                        CloneStatus::Failed
                    }
                }
            };

            info!(
                repo = %repo,
                progress = %format!("{}/{}", i + 1, total),
                status = status.as_str(),
                "{} - {}/{}: {}",
                repo.name,
                i + 1,
                total,
                match status {
                    CloneStatus::Success => "Successfully Cloned",
                    CloneStatus::Failed => "Failed to Clone",
                }
            );

            writeln!(record, "{},{}", repo.name, status.as_str())?;
            record.flush()?;

            results.push(CloneResult {
                repo: repo.clone(),
                status,
            });
        }

        Ok(results)
    }
}
