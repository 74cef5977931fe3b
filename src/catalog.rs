//! Project catalog construction and persistence.
//!
//! Candidate entries arrive from several sources (curated targets, the
//! scRNA-tools extract, GitHub search hits). They are folded left-to-right
//! into a [`ProjectCatalog`] keyed by the exact `repo_url` string, so the
//! first source listed wins whenever two sources describe the same
//! repository.
//!
//! `repo_url` is compared byte-for-byte. `https://github.com/a/b` and
//! `https://github.com/a/b/` are two different projects here.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// One project row before or after deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateEntry {
    /// Display name
    pub name: String,
    /// Project homepage, if any
    #[serde(default)]
    pub homepage_url: Option<String>,
    /// Repository URL, the identifying key
    #[serde(default)]
    pub repo_url: String,
    /// Landscape category tags in display order
    #[serde(default)]
    pub category: Vec<String>,
    /// GitHub logins of key personnel (curated targets only)
    #[serde(
        rename = "target-key-personnel-gh-login",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub key_personnel_gh_login: Option<serde_yaml::Value>,
}

impl CandidateEntry {
    /// Create an entry with a single category tag
    pub fn new(
        name: impl Into<String>,
        homepage_url: Option<String>,
        repo_url: impl Into<String>,
        category: &str,
    ) -> Self {
        Self {
            name: name.into(),
            homepage_url,
            repo_url: repo_url.into(),
            category: vec![category.to_string()],
            key_personnel_gh_login: None,
        }
    }

    /// Whether the entry carries the given category tag
    pub fn has_category(&self, tag: &str) -> bool {
        self.category.iter().any(|c| c == tag)
    }
}

/// Ordered list of candidate entries, unique by `repo_url`.
#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    entries: Vec<CandidateEntry>,
    seen: HashSet<String>,
}

impl ProjectCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold the given lists, in priority order, into a catalog
    pub fn from_lists<I, L>(lists: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = CandidateEntry>,
    {
        let mut catalog = Self::new();
        for list in lists {
            catalog.extend(list);
        }
        catalog
    }

    /// Accept `entry` unless its `repo_url` was already seen.
    ///
    /// Returns `true` when the entry was added.
    pub fn push(&mut self, entry: CandidateEntry) -> bool {
        if self.seen.contains(&entry.repo_url) {
            debug!(repo_url = %entry.repo_url, name = %entry.name, "Skipping duplicate entry");
            return false;
        }
        self.seen.insert(entry.repo_url.clone());
        self.entries.push(entry);
        true
    }

    /// Whether an entry with this key has been accepted
    pub fn contains(&self, repo_url: &str) -> bool {
        self.seen.contains(repo_url)
    }

    pub fn entries(&self) -> &[CandidateEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<CandidateEntry> {
        self.entries
    }
}

impl Extend<CandidateEntry> for ProjectCatalog {
    fn extend<T: IntoIterator<Item = CandidateEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.push(entry);
        }
    }
}

/// Deduplicate the concatenation of `lists` by `repo_url`, first-seen wins.
pub fn build_catalog(lists: Vec<Vec<CandidateEntry>>) -> Vec<CandidateEntry> {
    let total: usize = lists.iter().map(Vec::len).sum();
    let catalog = ProjectCatalog::from_lists(lists);
    info!(input = total, unique = catalog.len(), "Built project catalog");
    catalog.into_entries()
}

#[derive(Debug, Serialize, Deserialize)]
struct ProjectsFile {
    projects: Vec<CandidateEntry>,
}

#[derive(Debug, Deserialize)]
struct QueriesFile {
    queries: Vec<String>,
}

/// Load a `{ projects: [...] }` YAML file
pub fn load_projects(path: &Path) -> Result<Vec<CandidateEntry>> {
    let content = std::fs::read_to_string(path)?;
    let file: ProjectsFile = serde_yaml::from_str(&content)?;
    info!(path = ?path, count = file.projects.len(), "Loaded projects");
    Ok(file.projects)
}

/// Write entries as a `{ projects: [...] }` YAML file
pub fn save_projects(path: &Path, entries: &[CandidateEntry]) -> Result<()> {
    let file = ProjectsFile {
        projects: entries.to_vec(),
    };
    std::fs::write(path, serde_yaml::to_string(&file)?)?;
    info!(path = ?path, count = entries.len(), "Saved projects");
    Ok(())
}

/// Load a `{ queries: [...] }` YAML file
pub fn load_queries(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    let file: QueriesFile = serde_yaml::from_str(&content)?;
    info!(path = ?path, count = file.queries.len(), "Loaded queries");
    Ok(file.queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn entry(name: &str, repo_url: &str) -> CandidateEntry {
        CandidateEntry::new(name, None, repo_url, "test")
    }

    #[test]
    fn test_first_seen_wins() {
        let catalog = build_catalog(vec![
            vec![entry("A1", "https://x/a")],
            vec![entry("A2", "https://x/a"), entry("B", "https://x/b")],
        ]);

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].name, "A1");
        assert_eq!(catalog[0].repo_url, "https://x/a");
        assert_eq!(catalog[1].name, "B");
        assert_eq!(catalog[1].repo_url, "https://x/b");
    }

    #[test]
    fn test_keys_unique_and_order_kept() {
        let catalog = build_catalog(vec![
            vec![entry("c", "u3"), entry("a", "u1")],
            vec![],
            vec![entry("a-dup", "u1"), entry("b", "u2"), entry("c-dup", "u3")],
            vec![entry("b-dup", "u2")],
        ]);

        let keys: Vec<&str> = catalog.iter().map(|e| e.repo_url.as_str()).collect();
        assert_eq!(keys, vec!["u3", "u1", "u2"]);
    }

    #[test]
    fn test_no_url_normalization() {
        let catalog = build_catalog(vec![vec![
            entry("a", "https://github.com/x/a"),
            entry("a-slash", "https://github.com/x/a/"),
            entry("a-case", "https://github.com/X/a"),
        ]]);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn test_empty_repo_url_is_a_key() {
        let catalog = build_catalog(vec![vec![entry("first", ""), entry("second", "")]]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].name, "first");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(build_catalog(vec![]).is_empty());
        assert!(build_catalog(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_push_reports_acceptance() {
        let mut catalog = ProjectCatalog::new();
        assert!(catalog.push(entry("a", "u1")));
        assert!(!catalog.push(entry("b", "u1")));
        assert!(catalog.contains("u1"));
        assert!(!catalog.contains("u2"));
    }

    #[test]
    fn test_projects_yaml_round_trip() -> Result<()> {
        let temp = NamedTempFile::new()?;
        let mut curated = entry("pycytominer", "https://github.com/cytomining/pycytominer");
        curated.homepage_url = Some("https://pycytominer.readthedocs.io".to_string());
        curated.category = vec!["loi-focus".to_string(), "cytomining".to_string()];

        save_projects(temp.path(), &[curated.clone(), entry("other", "u2")])?;
        let loaded = load_projects(temp.path())?;

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0], curated);
        assert!(loaded[0].has_category("loi-focus"));
        Ok(())
    }

    #[test]
    fn test_load_curated_yaml_with_extra_fields() -> Result<()> {
        let yaml = r#"
projects:
  - name: CytoTable
    homepage_url: null
    repo_url: https://github.com/cytomining/CytoTable
    category:
      - loi-focus
    target-key-personnel-gh-login:
      - d33bs
  - name: NoUrl
    category: []
"#;
        let mut temp = NamedTempFile::new()?;
        std::io::Write::write_all(&mut temp, yaml.as_bytes())?;

        let loaded = load_projects(temp.path())?;
        assert_eq!(loaded.len(), 2);
        assert!(loaded[0].key_personnel_gh_login.is_some());
        assert_eq!(loaded[1].repo_url, "");
        assert_eq!(loaded[1].homepage_url, None);
        Ok(())
    }

    #[test]
    fn test_load_queries() -> Result<()> {
        let mut temp = NamedTempFile::new()?;
        let content = b"queries:\n  - cell painting\n  - image-based profiling\n";
        std::io::Write::write_all(&mut temp, content)?;
        let queries = load_queries(temp.path())?;
        assert_eq!(queries, vec!["cell painting", "image-based profiling"]);
        Ok(())
    }
}
