use std::collections::BTreeSet;

use tracing::debug;

use super::client::{GitHubClient, GitHubError};
use crate::application::ports::{
    is_workflow_file, RepoId, RepositoryDataSource, SourceError, WorkflowFile, WORKFLOW_DIR,
};

impl From<GitHubError> for SourceError {
    fn from(e: GitHubError) -> Self {
        match e {
            GitHubError::NotFound(what) => SourceError::NotFound(what),
            GitHubError::Unauthorized => SourceError::Unauthorized,
            GitHubError::Api { status, body } => SourceError::Api { status, body },
            GitHubError::Http(e) => SourceError::Http(e.to_string()),
            GitHubError::Decode { path, reason } => SourceError::Decode { what: path, reason },
        }
    }
}

/// Repository data served by the hosted GitHub API
pub struct GitHubApiSource {
    client: GitHubClient,
}

impl GitHubApiSource {
    pub fn new(client: GitHubClient) -> Self {
        Self { client }
    }
}

impl RepositoryDataSource for GitHubApiSource {
    fn list_root_files(&self, repo: &RepoId) -> Result<BTreeSet<String>, SourceError> {
        let entries = self.client.list_directory(&repo.owner, &repo.name, "")?;
        Ok(entries.into_iter().map(|entry| entry.name).collect())
    }

    fn get_file_content(&self, repo: &RepoId, path: &str) -> Result<Option<Vec<u8>>, SourceError> {
        match self.client.get_file(&repo.owner, &repo.name, path)? {
            Some(fetched) => Ok(Some(GitHubClient::decode_content(&fetched.file)?)),
            None => Ok(None),
        }
    }

    fn count_pull_requests(&self, repo: &RepoId, creator: &str) -> Result<u64, SourceError> {
        Ok(self.client.count_pull_requests_by(&repo.owner, &repo.name, creator)?)
    }

    fn list_workflows(&self, repo: &RepoId) -> Result<Vec<WorkflowFile>, SourceError> {
        let entries = self.client.list_directory(&repo.owner, &repo.name, WORKFLOW_DIR)?;

        let mut workflows = Vec::new();
        for entry in entries {
            if entry.item_type != "file" || !is_workflow_file(&entry.name) {
                continue;
            }

            // Listed a moment ago; a 404 here means it was deleted in between
            let Some(fetched) = self.client.get_file(&repo.owner, &repo.name, &entry.path)? else {
                debug!(repo = %repo, path = %entry.path, "Workflow disappeared while listing");
                continue;
            };

            let content = GitHubClient::decode_content(&fetched.file)?;
            workflows.push(WorkflowFile {
                name: entry.name,
                path: entry.path,
                content,
                last_modified: fetched.last_modified.unwrap_or_default(),
            });
        }

        Ok(workflows)
    }

    fn kind(&self) -> &'static str {
        "github-api"
    }
}

/// Enumerate repositories of an organization, optionally limited to a team
pub fn list_repositories(
    client: &GitHubClient,
    org: &str,
    team: Option<&str>,
) -> Result<Vec<RepoId>, SourceError> {
    let repos = match team {
        Some(slug) => {
            // Resolve the team first so a typo reads as "team not found"
            let team = client.get_team(org, slug).map_err(|e| match e {
                GitHubError::NotFound(_) => {
                    SourceError::NotFound(format!("team '{}' in organization '{}'", slug, org))
                }
                other => other.into(),
            })?;
            debug!(team = %team.slug, team_id = team.id, "Resolved team");
            client.list_team_repositories(org, slug)?
        }
        None => client.list_org_repositories(org)?,
    };

    Ok(repos
        .into_iter()
        .map(|repo| RepoId::new(repo.owner.login, repo.name))
        .collect())
}
