//! Per-project publication aggregation.
//!
//! Two sources report publications that mention a tracked project: Google
//! Scholar records (title nested under `bib.title`) and bioRxiv preprints
//! (flat `title`). Their titles are unioned, exact duplicates collapsed,
//! and the result record-linked to estimate the number of distinct works.

use crate::error::Result;
use crate::linkage::RecordLinker;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// Bibliographic block of a Google Scholar record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarBib {
    pub title: String,
    /// Authors as listed on the result page
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub pub_year: String,
    #[serde(default)]
    pub venue: String,
    /// Result snippet
    #[serde(default, rename = "abstract")]
    pub abstract_text: String,
}

/// A single Google Scholar search result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScholarPublication {
    pub bib: ScholarBib,
    #[serde(default)]
    pub pub_url: String,
    #[serde(default)]
    pub num_citations: u32,
}

/// A bioRxiv preprint whose full text mentions the project.
///
/// The full text itself is only used for filtering and is not stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprintPaper {
    pub title: String,
    #[serde(default)]
    pub authors: String,
    #[serde(default)]
    pub doi: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub url: String,
}

/// A project whose publication mentions are gathered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedProject {
    pub name: String,
    /// Year the repository was created; earlier publications are ignored
    pub created_year: i32,
}

/// Per-project output record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPublicationMetrics {
    #[serde(rename = "Project Name")]
    pub project_name: String,
    #[serde(rename = "Date Created Year")]
    pub date_created_year: i32,
    pub google_scholar_search_results: Vec<ScholarPublication>,
    pub bioarxiv_search_results: Vec<PreprintPaper>,
    pub all_article_titles: Vec<String>,
    pub all_article_titles_record_linked_removed: Vec<String>,
    pub google_scholar_count: usize,
    pub bioarxiv_count: usize,
    pub total_pub_count: usize,
    pub total_pub_count_non_record_linked: usize,
}

/// Flat row of the CSV summary
#[derive(Debug, Serialize)]
struct MetricsSummaryRow<'a> {
    #[serde(rename = "Project Name")]
    project_name: &'a str,
    #[serde(rename = "Date Created Year")]
    date_created_year: i32,
    google_scholar_count: usize,
    bioarxiv_count: usize,
    total_pub_count: usize,
    total_pub_count_non_record_linked: usize,
}

/// Union of scholar titles then preprint titles, exact duplicates removed.
///
/// The first occurrence of each title keeps its position.
pub fn collect_article_titles(
    scholar: &[ScholarPublication],
    preprints: &[PreprintPaper],
) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    scholar
        .iter()
        .map(|p| p.bib.title.as_str())
        .chain(preprints.iter().map(|p| p.title.as_str()))
        .filter(|title| seen.insert(*title))
        .map(str::to_string)
        .collect()
}

impl ProjectPublicationMetrics {
    /// Combine both result sets for `project` and derive the counts
    pub fn assemble(
        project: &TrackedProject,
        scholar: Vec<ScholarPublication>,
        preprints: Vec<PreprintPaper>,
        linker: &RecordLinker,
    ) -> Self {
        let all_article_titles = collect_article_titles(&scholar, &preprints);
        let record_linked = linker.distinct(&all_article_titles);

        let metrics = Self {
            project_name: project.name.clone(),
            date_created_year: project.created_year,
            google_scholar_count: scholar.len(),
            bioarxiv_count: preprints.len(),
            total_pub_count: all_article_titles.len(),
            total_pub_count_non_record_linked: record_linked.len(),
            google_scholar_search_results: scholar,
            bioarxiv_search_results: preprints,
            all_article_titles,
            all_article_titles_record_linked_removed: record_linked,
        };

        info!(
            project = %metrics.project_name,
            google_scholar = metrics.google_scholar_count,
            bioarxiv = metrics.bioarxiv_count,
            total = metrics.total_pub_count,
            record_linked = metrics.total_pub_count_non_record_linked,
            "Publication metrics assembled"
        );
        metrics
    }
}

/// Write full per-project records (including raw search results) as JSON
pub fn save_metrics_json(path: &Path, metrics: &[ProjectPublicationMetrics]) -> Result<()> {
    let content = serde_json::to_string_pretty(metrics)?;
    std::fs::write(path, content)?;
    info!(path = ?path, projects = metrics.len(), "Saved publication metrics");
    Ok(())
}

/// Write the count columns as a CSV summary, one row per project
pub fn save_metrics_summary(path: &Path, metrics: &[ProjectPublicationMetrics]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().has_headers(true).from_path(path)?;
    for m in metrics {
        wtr.serialize(MetricsSummaryRow {
            project_name: &m.project_name,
            date_created_year: m.date_created_year,
            google_scholar_count: m.google_scholar_count,
            bioarxiv_count: m.bioarxiv_count,
            total_pub_count: m.total_pub_count,
            total_pub_count_non_record_linked: m.total_pub_count_non_record_linked,
        })?;
    }
    wtr.flush()?;
    info!(path = ?path, projects = metrics.len(), "Saved publication summary");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkage::LinkagePolicy;
    use tempfile::NamedTempFile;

    fn scholar(title: &str) -> ScholarPublication {
        ScholarPublication {
            bib: ScholarBib {
                title: title.to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn preprint(title: &str) -> PreprintPaper {
        PreprintPaper {
            title: title.to_string(),
            ..Default::default()
        }
    }

    fn linker() -> RecordLinker {
        RecordLinker::new(90, LinkagePolicy::Legacy).expect("valid threshold")
    }

    #[test]
    fn test_union_count() {
        let titles = collect_article_titles(
            &[scholar("Foo Bar"), scholar("Baz")],
            &[preprint("Baz"), preprint("Qux")],
        );
        assert_eq!(titles, vec!["Foo Bar", "Baz", "Qux"]);

        let project = TrackedProject {
            name: "pycytominer".to_string(),
            created_year: 2019,
        };
        let metrics = ProjectPublicationMetrics::assemble(
            &project,
            vec![scholar("Foo Bar"), scholar("Baz")],
            vec![preprint("Baz"), preprint("Qux")],
            &linker(),
        );
        assert_eq!(metrics.total_pub_count, 3);
        assert_eq!(metrics.google_scholar_count, 2);
        assert_eq!(metrics.bioarxiv_count, 2);
    }

    #[test]
    fn test_union_is_exact_match_only() {
        let titles = collect_article_titles(
            &[scholar("Foo Bar"), scholar("foo bar"), scholar("Foo Bar ")],
            &[preprint("Foo Bar")],
        );
        assert_eq!(titles.len(), 3);
    }

    #[test]
    fn test_duplicates_within_one_source() {
        let titles = collect_article_titles(&[scholar("A"), scholar("A")], &[]);
        assert_eq!(titles, vec!["A"]);
    }

    #[test]
    fn test_empty_sources() {
        let project = TrackedProject {
            name: "CytoTable".to_string(),
            created_year: 2022,
        };
        let metrics = ProjectPublicationMetrics::assemble(&project, vec![], vec![], &linker());
        assert_eq!(metrics.total_pub_count, 0);
        assert_eq!(metrics.total_pub_count_non_record_linked, 0);
        assert!(metrics.all_article_titles_record_linked_removed.is_empty());
    }

    #[test]
    fn test_record_linked_is_subset_of_union() {
        let project = TrackedProject {
            name: "pycytominer".to_string(),
            created_year: 2019,
        };
        let metrics = ProjectPublicationMetrics::assemble(
            &project,
            vec![
                scholar("Reproducible image-based profiling with Pycytominer"),
                scholar("Cell Painting, a high-content image-based assay"),
            ],
            vec![
                preprint("Reproducible image-based profiling with pycytominer"),
                preprint("Morphological profiling of tubulin"),
            ],
            &linker(),
        );
        assert_eq!(metrics.total_pub_count, 4);
        assert!(metrics
            .all_article_titles_record_linked_removed
            .iter()
            .all(|t| metrics.all_article_titles.contains(t)));
        assert!(metrics.total_pub_count_non_record_linked < metrics.total_pub_count);
    }

    #[test]
    fn test_save_outputs() -> Result<()> {
        let project = TrackedProject {
            name: "pycytominer".to_string(),
            created_year: 2019,
        };
        let metrics = vec![ProjectPublicationMetrics::assemble(
            &project,
            vec![scholar("Foo Bar")],
            vec![preprint("Qux")],
            &linker(),
        )];

        let json = NamedTempFile::new()?;
        save_metrics_json(json.path(), &metrics)?;
        let raw = std::fs::read_to_string(json.path())?;
        let loaded: Vec<ProjectPublicationMetrics> = serde_json::from_str(&raw)?;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].project_name, "pycytominer");
        assert_eq!(loaded[0].all_article_titles, vec!["Foo Bar", "Qux"]);
        assert!(raw.contains("\"Project Name\""));
        assert!(raw.contains("\"bib\""));

        let csv_file = NamedTempFile::new()?;
        save_metrics_summary(csv_file.path(), &metrics)?;
        let summary = std::fs::read_to_string(csv_file.path())?;
        let mut lines = summary.lines();
        let header = [
            "Project Name",
            "Date Created Year",
            "google_scholar_count",
            "bioarxiv_count",
            "total_pub_count",
            "total_pub_count_non_record_linked",
        ]
        .join(",");
        assert_eq!(lines.next(), Some(header.as_str()));
        assert_eq!(lines.next(), Some("pycytominer,2019,1,1,2,1"));
        Ok(())
    }
}
