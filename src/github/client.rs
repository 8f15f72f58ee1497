use base64::Engine;
use reqwest::blocking::{Client, Response};
use reqwest::header::LAST_MODIFIED;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::models::*;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
const PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    #[error("GitHub rejected the access token")]
    Unauthorized,

    #[error("GitHub API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode {path}: {reason}")]
    Decode { path: String, reason: String },
}

/// Blocking GitHub REST client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    token: String,
    base_url: String,
}

impl GitHubClient {
    /// Client for `base_url` (`DEFAULT_API_URL`, GitHub Enterprise or another API root)
    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            token,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Get authenticated user info (validates the token)
    pub fn get_user(&self) -> Result<User, GitHubError> {
        let response = self.get("/user", &[])?;
        Ok(response.json()?)
    }

    /// Get a team by slug
    pub fn get_team(&self, org: &str, team_slug: &str) -> Result<Team, GitHubError> {
        let response = self.get(&format!("/orgs/{}/teams/{}", org, team_slug), &[])?;
        Ok(response.json()?)
    }

    /// List every repository of an organization
    pub fn list_org_repositories(&self, org: &str) -> Result<Vec<Repository>, GitHubError> {
        self.get_paginated(&format!("/orgs/{}/repos", org), &[("type", "all")])
    }

    /// List every repository a team can access
    pub fn list_team_repositories(&self, org: &str, team_slug: &str) -> Result<Vec<Repository>, GitHubError> {
        self.get_paginated(&format!("/orgs/{}/teams/{}/repos", org, team_slug), &[])
    }

    /// List a directory (empty `path` is the repository root)
    pub fn list_directory(&self, owner: &str, repo: &str, path: &str) -> Result<Vec<ContentEntry>, GitHubError> {
        let response = self.get(&Self::contents_path(owner, repo, path), &[])?;
        Ok(response.json()?)
    }

    /// Fetch a file; `Ok(None)` when the path does not exist
    pub fn get_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<FetchedFile>, GitHubError> {
        let response = match self.get(&Self::contents_path(owner, repo, path), &[]) {
            Ok(response) => response,
            Err(GitHubError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        };

        let last_modified = response
            .headers()
            .get(LAST_MODIFIED)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        let file: FileContent = response.json()?;
        Ok(Some(FetchedFile { file, last_modified }))
    }

    /// Count pull requests in `owner/repo` opened by `author`
    pub fn count_pull_requests_by(&self, owner: &str, repo: &str, author: &str) -> Result<u64, GitHubError> {
        let query = format!("repo:{}/{} is:pr author:{}", owner, repo, Self::search_author(author));
        let response = self.get("/search/issues", &[("q", query.as_str()), ("per_page", "1")])?;
        let count: SearchCount = response.json()?;
        Ok(count.total_count)
    }

    /// Decode a contents API body
    pub fn decode_content(file: &FileContent) -> Result<Vec<u8>, GitHubError> {
        if file.encoding != "base64" {
            return Err(GitHubError::Decode {
                path: file.path.clone(),
                reason: format!("unsupported encoding '{}'", file.encoding),
            });
        }

        let compact: String = file.content.chars().filter(|c| !c.is_whitespace()).collect();
        base64::engine::general_purpose::STANDARD
            .decode(compact)
            .map_err(|e| GitHubError::Decode {
                path: file.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Bot accounts are searched as `app/<slug>`
    fn search_author(login: &str) -> String {
        match login.strip_suffix("[bot]") {
            Some(app) => format!("app/{}", app),
            None => login.to_string(),
        }
    }

    fn contents_path(owner: &str, repo: &str, path: &str) -> String {
        format!("/repos/{}/{}/contents/{}", owner, repo, path.trim_start_matches('/'))
    }

    fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, GitHubError> {
        let per_page = PER_PAGE.to_string();
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let mut params: Vec<(&str, &str)> = query.to_vec();
            params.push(("per_page", per_page.as_str()));
            params.push(("page", page_str.as_str()));

            let batch: Vec<T> = self.get(path, &params)?.json()?;
            if batch.is_empty() {
                break;
            }

            let last_page = batch.len() < PER_PAGE as usize;
            items.extend(batch);
            if last_page {
                break;
            }
            page += 1;
        }

        Ok(items)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response, GitHubError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.client
            .get(&url)
            .query(query)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", "repo-audit")
            .header("Accept", "application/vnd.github.v3+json")
            .send()?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(GitHubError::NotFound(path.to_string())),
            StatusCode::UNAUTHORIZED => Err(GitHubError::Unauthorized),
            status => {
                let body = response.text()?;
                Err(GitHubError::Api {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
