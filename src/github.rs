//! GitHub REST API client.
//!
//! Used by the `seek` stage to run repository search queries and by the
//! `mentions` stage to resolve when a tracked repository was created.
//!
//! API Details:
//! - Search endpoint: GET /search/repositories (max 100 per page, 1000 results total)
//! - Repository endpoint: GET /repos/{owner}/{repo}
//! - Authentication: bearer token from `LANDSCAPE_ANALYSIS_GH_TOKEN`

use crate::catalog::CandidateEntry;
use crate::config::{GITHUB_QUERY_CATEGORY, GITHUB_TOKEN_ENV};
use crate::error::{LandscapeError, Result};
use crate::publications::TrackedProject;
use crate::sources::{RepositoryMetadata, RepositorySearch};
use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

/// GitHub API base URL
const GITHUB_API_BASE: &str = "https://api.github.com";

/// Prefix stripped from repository URLs to get `owner/name`
const GITHUB_WEB_PREFIX: &str = "https://github.com/";

/// Results per search page (GitHub maximum)
const PER_PAGE: usize = 100;

/// GitHub never returns more than this many search results
const MAX_SEARCH_RESULTS: usize = 1000;

/// Repository fields used by the stages
#[derive(Debug, Clone, Deserialize)]
pub struct GithubRepository {
    pub name: String,
    pub html_url: String,
    #[serde(default)]
    pub homepage: Option<String>,
    pub created_at: String,
}

impl GithubRepository {
    /// Convert a search hit into a catalog entry
    pub fn to_candidate(&self) -> CandidateEntry {
        // GitHub reports an unset homepage as "" as often as null
        let homepage = self.homepage.clone().filter(|h| !h.is_empty());
        CandidateEntry::new(
            self.name.clone(),
            homepage,
            self.html_url.clone(),
            GITHUB_QUERY_CATEGORY,
        )
    }

    /// Year of `created_at`
    pub fn created_year(&self) -> Result<i32> {
        let created: DateTime<Utc> = self.created_at.parse().map_err(|e| {
            LandscapeError::Parse(format!("Invalid created_at '{}': {}", self.created_at, e))
        })?;
        Ok(created.year())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    total_count: usize,
    #[serde(default)]
    incomplete_results: bool,
    items: Vec<GithubRepository>,
}

/// Owner/name path of a GitHub repository URL
pub fn repo_full_name(repo_url: &str) -> &str {
    repo_url.strip_prefix(GITHUB_WEB_PREFIX).unwrap_or(repo_url).trim_end_matches('/')
}

/// GitHub API client.
///
/// The token is only checked when a request is made, so a client can be
/// constructed for stages that may never call it.
pub struct GithubClient {
    client: Client,
    token: Option<String>,
    base_url: String,
}

impl GithubClient {
    /// Create a client presenting `token` on every request
    pub fn new(token: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("landscape/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LandscapeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            token,
            base_url: GITHUB_API_BASE.to_string(),
        })
    }

    /// Create a client with the token from `LANDSCAPE_ANALYSIS_GH_TOKEN`
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(GITHUB_TOKEN_ENV).ok().filter(|t| !t.is_empty());
        if token.is_none() {
            debug!(env = GITHUB_TOKEN_ENV, "No GitHub token in environment");
        }
        Self::new(token)
    }

    /// Point the client at another API root (e.g. GitHub Enterprise)
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn token(&self) -> Result<&str> {
        self.token
            .as_deref()
            .ok_or(LandscapeError::MissingCredential(GITHUB_TOKEN_ENV))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let token = self.token()?;
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "GitHub request");

        let response = self
            .client
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN
                && response
                    .headers()
                    .get("x-ratelimit-remaining")
                    .is_some_and(|v| v.as_bytes() == b"0"))
        {
            return Err(LandscapeError::RateLimited("GitHub".to_string()));
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), error = %error_text, "GitHub API error");
            return Err(LandscapeError::Api {
                code: status.as_u16(),
                message: format!("GitHub API error: {} - {}", status, error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| LandscapeError::Parse(format!("Failed to parse GitHub response: {}", e)))
    }

    /// Search repositories, most starred first, following every page
    pub async fn search(&self, query: &str) -> Result<Vec<GithubRepository>> {
        info!(query = query, "Starting GitHub repository search");

        let mut repositories = Vec::new();
        let mut page = 1usize;

        loop {
            let params = [
                ("q", query.to_string()),
                ("sort", "stars".to_string()),
                ("order", "desc".to_string()),
                ("per_page", PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            let response: SearchResponse = self.get_json("/search/repositories", &params).await?;
            if response.incomplete_results {
                warn!(query = query, page = page, "GitHub reported incomplete results");
            }

            let received = response.items.len();
            repositories.extend(response.items);
            debug!(page = page, received = received, total = response.total_count, "Search page");

            if !has_next_page(page, received, response.total_count) {
                break;
            }
            page += 1;
        }

        info!(query = query, found = repositories.len(), "GitHub search complete");
        Ok(repositories)
    }

    /// Fetch one repository by `owner/name`
    pub async fn get_repo(&self, full_name: &str) -> Result<GithubRepository> {
        self.get_json(&format!("/repos/{}", full_name), &[]).await
    }
}

/// Whether another search page can hold results
fn has_next_page(page: usize, received: usize, total_count: usize) -> bool {
    let fetched = page * PER_PAGE;
    received == PER_PAGE && fetched < total_count.min(MAX_SEARCH_RESULTS)
}

#[async_trait]
impl RepositorySearch for GithubClient {
    async fn search_repositories(&self, query: &str) -> Result<Vec<CandidateEntry>> {
        let repositories = self.search(query).await?;
        Ok(repositories.iter().map(GithubRepository::to_candidate).collect())
    }
}

#[async_trait]
impl RepositoryMetadata for GithubClient {
    async fn tracked_project(&self, repo_url: &str) -> Result<TrackedProject> {
        let repo = self.get_repo(repo_full_name(repo_url)).await?;
        Ok(TrackedProject {
            created_year: repo.created_year()?,
            name: repo.name,
        })
    }
}
