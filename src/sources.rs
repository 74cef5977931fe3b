//! Seams between the stages and the external services they query.
//!
//! Each stage takes its collaborators as parameters, so a run can be
//! driven by the real HTTP clients or by in-memory fakes.

use crate::catalog::CandidateEntry;
use crate::error::Result;
use crate::publications::{PreprintPaper, ScholarPublication, TrackedProject};
use async_trait::async_trait;

/// Code-hosting repository search
#[async_trait]
pub trait RepositorySearch {
    /// Repositories matching `query`, most starred first
    async fn search_repositories(&self, query: &str) -> Result<Vec<CandidateEntry>>;
}

/// Code-hosting repository metadata
#[async_trait]
pub trait RepositoryMetadata {
    /// Name and creation year of the repository at `repo_url`
    async fn tracked_project(&self, repo_url: &str) -> Result<TrackedProject>;
}

/// Scholarly search engine
#[async_trait]
pub trait ScholarSearch {
    /// Publications matching `query` published in or after `year_low`
    async fn search_pubs(&self, query: &str, year_low: i32) -> Result<Vec<ScholarPublication>>;
}

/// Preprint repository
#[async_trait]
pub trait PreprintSearch {
    /// Preprints matching `query` whose full text contains `mention`
    /// (case-insensitive)
    async fn search_mentions(&self, query: &str, mention: &str) -> Result<Vec<PreprintPaper>>;
}
