//! scRNA-tools table export reader.
//!
//! The scRNA-tools database publishes a CSV of single-cell analysis tools
//! with their code repositories and citation counts. The most cited tools
//! hosted on GitHub are added to the landscape catalog.

use crate::catalog::CandidateEntry;
use crate::config::SCRNA_TOOLS_CATEGORY;
use crate::error::{LandscapeError, Result};
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

const NAME_COLUMN: &str = "Name";
const CODE_COLUMN: &str = "Code";
const CITATIONS_COLUMN: &str = "Citations";

/// Only repositories hosted here are kept
const GITHUB_PREFIX: &str = "https://github.com";

/// One tool row with the fields the catalog needs
#[derive(Debug, Clone, PartialEq)]
pub struct ScrnaTool {
    pub name: String,
    pub code: String,
    pub citations: i64,
}

/// Read the export at `path` and return the `limit` most cited GitHub tools
pub fn load_scrna_tools(path: &Path, limit: usize) -> Result<Vec<CandidateEntry>> {
    let file = std::fs::File::open(path)?;
    let tools = read_tools(file, &path.display().to_string())?;
    info!(path = ?path, rows = tools.len(), "Read scRNA-tools export");
    Ok(top_github_tools(tools, limit))
}

/// Parse the export, dropping rows that have no code repository
pub fn read_tools<R: Read>(reader: R, source_name: &str) -> Result<Vec<ScrnaTool>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LandscapeError::MissingColumn {
                column: name.to_string(),
                source_name: source_name.to_string(),
            })
    };
    let name_idx = column(NAME_COLUMN)?;
    let code_idx = column(CODE_COLUMN)?;
    let citations_idx = column(CITATIONS_COLUMN)?;

    let mut tools = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let code = record.get(code_idx).unwrap_or("");
        if code.is_empty() {
            continue;
        }
        let citations = parse_citations(record.get(citations_idx).unwrap_or(""))?;
        tools.push(ScrnaTool {
            name: record.get(name_idx).unwrap_or("").to_string(),
            code: code.to_string(),
            citations,
        });
    }
    Ok(tools)
}

/// Citation counts use `-` (sometimes `'-`) for "none"
fn parse_citations(raw: &str) -> Result<i64> {
    let raw = raw.trim();
    match raw {
        "-" | "'-" => Ok(0),
        value => value.parse().map_err(|e| {
            LandscapeError::Parse(format!("Invalid citation count '{}': {}", value, e))
        }),
    }
}

/// GitHub-hosted tools sorted by citations (descending, ties keep file order)
pub fn top_github_tools(tools: Vec<ScrnaTool>, limit: usize) -> Vec<CandidateEntry> {
    let mut github: Vec<ScrnaTool> = tools
        .into_iter()
        .filter(|t| t.code.contains(GITHUB_PREFIX))
        .collect();
    github.sort_by(|a, b| b.citations.cmp(&a.citations));
    debug!(github = github.len(), limit = limit, "Selecting top scRNA-tools entries");

    github
        .into_iter()
        .take(limit)
        .map(|t| CandidateEntry::new(t.name, None, t.code, SCRNA_TOOLS_CATEGORY))
        .collect()
}
