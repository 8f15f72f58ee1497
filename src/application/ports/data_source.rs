use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Repository identity: `organization/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `org/name`, or qualify a bare `name` with `default_owner`
    pub fn parse_qualified(value: &str, default_owner: &str) -> Result<Self, String> {
        match value.parse::<RepoId>() {
            Ok(id) => Ok(id),
            Err(_) if !value.contains('/') && !value.trim().is_empty() && !default_owner.is_empty() => {
                Ok(Self::new(default_owner, value.trim()))
            }
            Err(e) => Err(e),
        }
    }

    /// Key written to (and matched in) the identity column
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (owner, name) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("Invalid repository '{}': expected 'organization/name'", s))?;

        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(format!("Invalid repository '{}': expected 'organization/name'", s));
        }

        Ok(Self::new(owner, name))
    }
}

/// One GitHub Actions workflow file as supplied by a data source
#[derive(Debug, Clone)]
pub struct WorkflowFile {
    /// File name (e.g. "ci.yml")
    pub name: String,
    /// Path relative to the repository root
    pub path: String,
    pub content: Vec<u8>,
    /// Last-modified instant in RFC 2822 wire format
    /// (e.g. "Wed, 21 Oct 2015 07:28:00 GMT")
    pub last_modified: String,
}

/// Returns true for file names GitHub Actions treats as workflows
pub fn is_workflow_file(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}

pub const WORKFLOW_DIR: &str = ".github/workflows";

/// Data acquisition failures
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Credential rejected")]
    Unauthorized,

    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Failed to decode {what}: {reason}")]
    Decode { what: String, reason: String },

    #[error("Git command failed: {0}")]
    Git(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Supplies repository artifacts to the checks.
///
/// Implementations: hosted GitHub API, a fresh local clone per repository,
/// or a directory of existing clones. Callers never know which one is used.
pub trait RepositoryDataSource {
    /// File names in the repository root
    fn list_root_files(&self, repo: &RepoId) -> Result<BTreeSet<String>, SourceError>;

    /// Raw content of `path`, `None` when the path does not exist
    fn get_file_content(&self, repo: &RepoId, path: &str) -> Result<Option<Vec<u8>>, SourceError>;

    /// Number of pull requests opened by `creator` (e.g. "dependabot[bot]")
    fn count_pull_requests(&self, repo: &RepoId, creator: &str) -> Result<u64, SourceError>;

    /// Workflow files under `.github/workflows`.
    /// A missing workflow directory is `SourceError::NotFound`.
    fn list_workflows(&self, repo: &RepoId) -> Result<Vec<WorkflowFile>, SourceError>;

    /// Short label used in logs
    fn kind(&self) -> &'static str;
}

/// A repository bound to the source that serves it
#[derive(Clone, Copy)]
pub struct RepoHandle<'a> {
    pub source: &'a dyn RepositoryDataSource,
    pub id: &'a RepoId,
}

impl<'a> RepoHandle<'a> {
    pub fn new(source: &'a dyn RepositoryDataSource, id: &'a RepoId) -> Self {
        Self { source, id }
    }

    pub fn list_root_files(&self) -> Result<BTreeSet<String>, SourceError> {
        self.source.list_root_files(self.id)
    }

    pub fn get_file_content(&self, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        self.source.get_file_content(self.id, path)
    }

    pub fn count_pull_requests(&self, creator: &str) -> Result<u64, SourceError> {
        self.source.count_pull_requests(self.id, creator)
    }

    pub fn list_workflows(&self) -> Result<Vec<WorkflowFile>, SourceError> {
        self.source.list_workflows(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_repo_id() {
        let id: RepoId = "acme/widgets".parse().unwrap();
        assert_eq!(id.owner, "acme");
        assert_eq!(id.name, "widgets");
        assert_eq!(id.full_name(), "acme/widgets");
    }

    #[test]
    fn test_parse_repo_id_rejects_bad_input() {
        assert!("widgets".parse::<RepoId>().is_err());
        assert!("/widgets".parse::<RepoId>().is_err());
        assert!("acme/".parse::<RepoId>().is_err());
        assert!("a/b/c".parse::<RepoId>().is_err());
    }

    #[test]
    fn test_parse_qualified_uses_default_owner() {
        let id = RepoId::parse_qualified("widgets", "acme").unwrap();
        assert_eq!(id, RepoId::new("acme", "widgets"));

        let id = RepoId::parse_qualified("other/widgets", "acme").unwrap();
        assert_eq!(id, RepoId::new("other", "widgets"));

        assert!(RepoId::parse_qualified("widgets", "").is_err());
    }

    #[test]
    fn test_is_workflow_file() {
        assert!(is_workflow_file("ci.yml"));
        assert!(is_workflow_file("release.yaml"));
        assert!(!is_workflow_file("README.md"));
    }
}
