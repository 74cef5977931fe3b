//! bioRxiv preprint search client.
//!
//! bioRxiv has no keyword search API, so this client reads the site's
//! search result pages and then each hit's full-text page. A hit counts as
//! a mention only when the project name appears in the full text; search
//! ranking alone also matches abstracts of unrelated work.

use crate::error::{LandscapeError, Result};
use crate::publications::PreprintPaper;
use crate::sources::PreprintSearch;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

/// bioRxiv site root
pub const DEFAULT_BIORXIV_URL: &str = "https://www.biorxiv.org";

/// Results requested per search
const DEFAULT_MAX_RESULTS: usize = 75;

/// A search hit before its full text is fetched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchHit {
    pub title: String,
    pub authors: String,
    pub doi: String,
    /// Site-relative article path, e.g. `/content/10.1101/2023.04.28.538614v1`
    pub path: String,
}

/// Metadata and text of an article page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleText {
    pub date: String,
    pub full_text: String,
}

/// bioRxiv client
pub struct BiorxivClient {
    client: Client,
    base_url: String,
    max_results: usize,
}

impl BiorxivClient {
    /// Client for the public bioRxiv site
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("landscape/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LandscapeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BIORXIV_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
        })
    }

    /// Use a mirror or test server
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        debug!(url = %url, "Fetching bioRxiv page");
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LandscapeError::RateLimited("bioRxiv".to_string()));
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), url = %url, "bioRxiv HTTP error");
            return Err(LandscapeError::Api {
                code: status.as_u16(),
                message: format!("bioRxiv HTTP error: {}", status),
            });
        }
        Ok(response.text().await?)
    }

    /// Run a site search and return the listed hits
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let url = search_url(&self.base_url, query, self.max_results);
        info!(query = query, "Starting bioRxiv search");
        let html = self.fetch(&url).await?;
        let hits = parse_search_results(&html)?;
        info!(query = query, hits = hits.len(), "bioRxiv search complete");
        Ok(hits)
    }

    /// Fetch the full-text page of a hit
    pub async fn article(&self, hit: &SearchHit) -> Result<ArticleText> {
        let url = format!("{}{}.full-text", self.base_url, hit.path);
        let html = self.fetch(&url).await?;
        parse_article(&html)
    }
}

#[async_trait]
impl PreprintSearch for BiorxivClient {
    async fn search_mentions(&self, query: &str, mention: &str) -> Result<Vec<PreprintPaper>> {
        let mut papers = Vec::new();

        for hit in self.search(query).await? {
            let article = self.article(&hit).await?;
            if !mentions_project(&article.full_text, mention) {
                debug!(title = %hit.title, "Full text does not mention project");
                continue;
            }
            papers.push(PreprintPaper {
                url: format!("{}{}", self.base_url, hit.path),
                title: hit.title,
                authors: hit.authors,
                doi: hit.doi,
                date: article.date,
            });
        }

        info!(query = query, mentions = papers.len(), "bioRxiv mentions collected");
        Ok(papers)
    }
}

/// Case-insensitive containment of `name` in `full_text`
pub fn mentions_project(full_text: &str, name: &str) -> bool {
    full_text.to_lowercase().contains(&name.to_lowercase())
}

/// Search page URL; the query terms are one path segment
fn search_url(base_url: &str, query: &str, max_results: usize) -> String {
    let terms = format!("{} numresults:{} sort:relevance-rank", query, max_results);
    format!("{}/search/{}", base_url, urlencoding::encode(&terms))
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| LandscapeError::Parse(e.to_string()))
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a search result page into hits (entries without a link are skipped)
pub fn parse_search_results(html: &str) -> Result<Vec<SearchHit>> {
    let document = Html::parse_document(html);

    let item_selector = selector("li.search-result")?;
    let link_selector = selector("a.highwire-cite-linked-title")?;
    let title_selector = selector("span.highwire-cite-title")?;
    let authors_selector = selector("span.highwire-citation-authors")?;
    let doi_selector = selector("span.highwire-cite-metadata-doi")?;

    let mut hits = Vec::new();
    for item in document.select(&item_selector) {
        let Some(link) = item.select(&link_selector).next() else {
            continue;
        };
        let path = link.value().attr("href").unwrap_or("").to_string();
        if path.is_empty() {
            continue;
        }

        let title = item
            .select(&title_selector)
            .next()
            .map(text_of)
            .unwrap_or_else(|| text_of(link));
        let authors = item.select(&authors_selector).next().map(text_of).unwrap_or_default();
        let doi = item
            .select(&doi_selector)
            .next()
            .map(|d| clean_doi(&text_of(d)))
            .unwrap_or_default();

        hits.push(SearchHit {
            title,
            authors,
            doi,
            path,
        });
    }
    Ok(hits)
}

/// "doi: https://doi.org/10.1101/x" -> "10.1101/x"
fn clean_doi(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.strip_prefix("doi:").unwrap_or(raw).trim();
    raw.strip_prefix("https://doi.org/").unwrap_or(raw).to_string()
}

/// Parse a full-text article page
pub fn parse_article(html: &str) -> Result<ArticleText> {
    let document = Html::parse_document(html);

    let date_selector = selector(r#"meta[name="citation_publication_date"]"#)?;
    let fulltext_selector = selector("div.fulltext-view")?;
    let body_selector = selector("body")?;

    let date = document
        .select(&date_selector)
        .next()
        .and_then(|m| m.value().attr("content"))
        .unwrap_or("")
        .replace('/', "-");

    let full_text = document
        .select(&fulltext_selector)
        .next()
        .or_else(|| document.select(&body_selector).next())
        .map(text_of)
        .unwrap_or_default();

    Ok(ArticleText { date, full_text })
}
