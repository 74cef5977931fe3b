//! Stage orchestration.
//!
//! Two batch stages share the data directory:
//!
//! - `seek`: curated targets + scRNA-tools extract + GitHub search hits
//!   -> deduplicated `projects.yaml`
//! - `mentions`: `loi-focus` targets -> Google Scholar and bioRxiv mentions
//!   -> record-linked publication metrics
//!
//! Every query runs to completion before the next one starts, and a stage
//! writes its output only after all of its queries succeeded. Any error
//! aborts the stage and leaves earlier stage outputs as the resume point.

use crate::catalog::{self, CandidateEntry};
use crate::config::{DataPaths, LOI_FOCUS_CATEGORY};
use crate::error::Result;
use crate::linkage::RecordLinker;
use crate::publications::{self, ProjectPublicationMetrics, TrackedProject};
use crate::scrna_tools;
use crate::sources::{PreprintSearch, RepositoryMetadata, RepositorySearch, ScholarSearch};
use tracing::info;

/// Run every query and concatenate the hits in query order
pub async fn search_all<S>(search: &S, queries: &[String]) -> Result<Vec<CandidateEntry>>
where
    S: RepositorySearch + Sync + ?Sized,
{
    let mut results = Vec::new();
    for query in queries {
        let hits = search.search_repositories(query).await?;
        info!(query = %query, hits = hits.len(), "Query results");
        results.extend(hits);
    }
    Ok(results)
}

/// Merge the three candidate sources into one catalog.
///
/// Curated targets come first so their metadata is never replaced by a
/// search hit for the same repository; the scRNA-tools extract outranks
/// ad hoc search results.
pub fn merge_candidates(
    targets: Vec<CandidateEntry>,
    scrna_tools: Vec<CandidateEntry>,
    search_results: Vec<CandidateEntry>,
) -> Vec<CandidateEntry> {
    catalog::build_catalog(vec![targets, scrna_tools, search_results])
}

/// Build the landscape catalog from in-memory inputs
pub async fn seek_landscape_entries<S>(
    search: &S,
    targets: Vec<CandidateEntry>,
    scrna_tools: Vec<CandidateEntry>,
    queries: &[String],
) -> Result<Vec<CandidateEntry>>
where
    S: RepositorySearch + Sync + ?Sized,
{
    let search_results = search_all(search, queries).await?;
    info!(
        targets = targets.len(),
        scrna_tools = scrna_tools.len(),
        search_results = search_results.len(),
        "Merging candidate sources"
    );
    Ok(merge_candidates(targets, scrna_tools, search_results))
}

/// `seek` stage: read inputs under `paths`, write `projects.yaml`
pub async fn run_seek_stage<S>(paths: &DataPaths, search: &S, scrna_limit: usize) -> Result<usize>
where
    S: RepositorySearch + Sync + ?Sized,
{
    let queries = catalog::load_queries(&paths.queries)?;
    let targets = catalog::load_projects(&paths.target_projects)?;
    let scrna = scrna_tools::load_scrna_tools(&paths.scrna_tools, scrna_limit)?;

    let projects = seek_landscape_entries(search, targets, scrna, &queries).await?;
    catalog::save_projects(&paths.projects, &projects)?;
    Ok(projects.len())
}

/// Targets tagged `loi-focus`
pub fn loi_focus_targets(targets: &[CandidateEntry]) -> Vec<&CandidateEntry> {
    targets
        .iter()
        .filter(|t| t.has_category(LOI_FOCUS_CATEGORY))
        .collect()
}

/// Look up name and creation year of each target repository
pub async fn resolve_tracked_projects<M>(
    metadata: &M,
    targets: &[&CandidateEntry],
) -> Result<Vec<TrackedProject>>
where
    M: RepositoryMetadata + Sync + ?Sized,
{
    let mut projects = Vec::with_capacity(targets.len());
    for target in targets {
        let project = metadata.tracked_project(&target.repo_url).await?;
        info!(
            project = %project.name,
            created_year = project.created_year,
            "Resolved tracked project"
        );
        projects.push(project);
    }
    Ok(projects)
}

/// Gather and reconcile publication mentions for each project
pub async fn gather_publication_mentions<S, P>(
    scholar: &S,
    preprints: &P,
    projects: &[TrackedProject],
    linker: &RecordLinker,
) -> Result<Vec<ProjectPublicationMetrics>>
where
    S: ScholarSearch + Sync + ?Sized,
    P: PreprintSearch + Sync + ?Sized,
{
    let mut metrics = Vec::with_capacity(projects.len());
    for project in projects {
        // Quoted for exact-phrase matching
        let query = format!("\"{}\"", project.name);

        let scholar_results = scholar.search_pubs(&query, project.created_year).await?;
        let preprint_results = preprints.search_mentions(&query, &project.name).await?;

        metrics.push(ProjectPublicationMetrics::assemble(
            project,
            scholar_results,
            preprint_results,
            linker,
        ));
    }
    Ok(metrics)
}

/// `mentions` stage: read targets, write the publication metrics files
pub async fn run_mentions_stage<M, S, P>(
    paths: &DataPaths,
    metadata: &M,
    scholar: &S,
    preprints: &P,
    linker: &RecordLinker,
) -> Result<Vec<ProjectPublicationMetrics>>
where
    M: RepositoryMetadata + Sync + ?Sized,
    S: ScholarSearch + Sync + ?Sized,
    P: PreprintSearch + Sync + ?Sized,
{
    let targets = catalog::load_projects(&paths.target_projects)?;
    let focus = loi_focus_targets(&targets);
    info!(targets = targets.len(), focus = focus.len(), "Selected tracked projects");

    let projects = resolve_tracked_projects(metadata, &focus).await?;
    let metrics = gather_publication_mentions(scholar, preprints, &projects, linker).await?;

    publications::save_metrics_json(&paths.publication_metrics, &metrics)?;
    publications::save_metrics_summary(&paths.publication_summary, &metrics)?;
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, repo_url: &str, category: &str) -> CandidateEntry {
        CandidateEntry::new(name, None, repo_url, category)
    }

    #[test]
    fn test_merge_priority() {
        let merged = merge_candidates(
            vec![entry("pycytominer", "https://github.com/cytomining/pycytominer", "loi-focus")],
            vec![
                entry("Seurat", "https://github.com/satijalab/seurat", "scrna"),
                entry("pycytominer-scrna", "https://github.com/cytomining/pycytominer", "scrna"),
            ],
            vec![
                entry("seurat", "https://github.com/satijalab/seurat", "search"),
                entry("napari", "https://github.com/napari/napari", "search"),
            ],
        );

        let names: Vec<&str> = merged.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["pycytominer", "Seurat", "napari"]);
        assert!(merged[0].has_category("loi-focus"));
    }

    #[test]
    fn test_loi_focus_targets() {
        let targets = vec![
            entry("pycytominer", "u1", "loi-focus"),
            entry("other", "u2", "cytomining"),
            entry("CytoTable", "u3", "loi-focus"),
        ];
        let focus = loi_focus_targets(&targets);
        let names: Vec<&str> = focus.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["pycytominer", "CytoTable"]);
    }
}
