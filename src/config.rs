//! Stage configuration: default data layout, tags and tuning constants.

use std::path::{Path, PathBuf};

/// Environment variable holding the GitHub access token
pub const GITHUB_TOKEN_ENV: &str = "LANDSCAPE_ANALYSIS_GH_TOKEN";

/// Category given to entries found through GitHub search queries
pub const GITHUB_QUERY_CATEGORY: &str = "related-tools-github-query-result";

/// Category given to entries taken from the scRNA-tools extract
pub const SCRNA_TOOLS_CATEGORY: &str = "cytomining-ecosystem-adjacent-tools";

/// Category marking the targets tracked for publication mentions
pub const LOI_FOCUS_CATEGORY: &str = "loi-focus";

/// Similarity threshold used when record-linking publication titles
pub const DEFAULT_LINKAGE_THRESHOLD: u8 = 90;

/// Number of scRNA-tools entries (by citations) added to the catalog
pub const DEFAULT_SCRNA_TOOLS_LIMIT: usize = 100;

/// Relative file layout shared by the stages.
///
/// Each stage reads the files an earlier stage persisted, so these paths
/// are the resume points of the pipeline.
#[derive(Debug, Clone)]
pub struct DataPaths {
    /// Curated targets, never written by any stage
    pub target_projects: PathBuf,
    /// GitHub search queries
    pub queries: PathBuf,
    /// scRNA-tools table export
    pub scrna_tools: PathBuf,
    /// Catalog written by the `seek` stage
    pub projects: PathBuf,
    /// Publication metrics written by the `mentions` stage (JSON, full records)
    pub publication_metrics: PathBuf,
    /// Publication metrics summary (CSV, counts only)
    pub publication_summary: PathBuf,
}

impl DataPaths {
    /// Layout rooted at `data_dir`
    pub fn under(data_dir: &Path) -> Self {
        Self {
            target_projects: data_dir.join("target-projects.yaml"),
            queries: data_dir.join("queries.yaml"),
            scrna_tools: data_dir.join("scRNA-Tools-tableExport-2023-10-12.csv"),
            projects: data_dir.join("projects.yaml"),
            publication_metrics: data_dir.join("loi-target-project-publication-metrics.json"),
            publication_summary: data_dir.join("loi-target-project-publication-metrics.csv"),
        }
    }
}

impl Default for DataPaths {
    fn default() -> Self {
        Self::under(Path::new("data"))
    }
}
