//! Google Scholar search client.
//!
//! Scrapes Google Scholar result pages for exact-phrase mentions of a
//! project name, restricted to publications from the project's creation
//! year onwards.

use crate::error::{LandscapeError, Result};
use crate::publications::{ScholarBib, ScholarPublication};
use crate::sources::ScholarSearch;
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Default Google Scholar URL
pub const DEFAULT_SCHOLAR_URL: &str = "https://scholar.google.com";

/// User agent string for requests
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Results per Google Scholar page
const RESULTS_PER_PAGE: u32 = 10;

/// Client options
#[derive(Debug, Clone)]
pub struct ScholarOptions {
    /// Proxy URL (e.g., "http://127.0.0.1:7890")
    pub proxy: Option<String>,
    /// Custom base URL for mirror sites
    pub base_url: Option<String>,
    /// Upper bound on pages fetched per query
    pub max_pages: u32,
    /// Source data type filter ("0,5" excludes patents)
    pub sdt: String,
}

impl Default for ScholarOptions {
    fn default() -> Self {
        Self {
            proxy: None,
            base_url: None,
            max_pages: 20,
            sdt: "0,5".to_string(),
        }
    }
}

/// Google Scholar client
pub struct ScholarClient {
    client: reqwest::Client,
    base_url: String,
    options: ScholarOptions,
}

impl ScholarClient {
    /// Create a client from `options`
    pub fn new(options: ScholarOptions) -> Result<Self> {
        let base_url = options
            .base_url
            .as_ref()
            .map(|s| s.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SCHOLAR_URL.to_string());

        Ok(Self {
            client: build_http_client(options.proxy.as_deref())?,
            base_url,
            options,
        })
    }

    /// Fetch result pages until one is empty or has no next-page link.
    ///
    /// `max_pages` bounds the walk; hitting it while Scholar still offers
    /// more pages is logged as a warning.
    pub async fn query(&self, search_str: &str, year_low: i32) -> Result<Vec<ScholarPublication>> {
        info!(
            query = search_str,
            url = %self.base_url,
            year_low = year_low,
            "Starting Google Scholar query"
        );

        let mut all_results = Vec::new();
        let mut more_available = false;

        for page in 0..self.options.max_pages {
            let start = page * RESULTS_PER_PAGE;
            let url =
                build_search_url(&self.base_url, search_str, start, &self.options.sdt, year_low)?;

            // Random delay to avoid detection
            if page > 0 {
                let delay = rand::random::<u64>() % 1500 + 500;
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }

            debug!(page = page + 1, url = %url, "Fetching page");
            let html = fetch_page(&self.client, &url).await?;

            if html.contains("Solving the above CAPTCHA") || html.contains("unusual traffic") {
                warn!(page = page + 1, "CAPTCHA detected");
                return Err(LandscapeError::Captcha(url.to_string()));
            }

            let page_results = parse_result_items(&html)?;
            let has_next = has_next_page_link(&html)?;
            info!(page = page + 1, count = page_results.len(), has_next, "Parsed results");

            more_available = !page_results.is_empty() && has_next;
            all_results.extend(page_results);
            if !more_available {
                break;
            }
        }

        if more_available {
            warn!(
                query = search_str,
                max_pages = self.options.max_pages,
                collected = all_results.len(),
                "Page cap reached before the last result page"
            );
        }

        info!(total = all_results.len(), "Query complete");
        Ok(all_results)
    }
}

#[async_trait]
impl ScholarSearch for ScholarClient {
    async fn search_pubs(&self, query: &str, year_low: i32) -> Result<Vec<ScholarPublication>> {
        self.query(query, year_low).await
    }
}

/// Build HTTP client with optional proxy
fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .cookie_store(true);

    if let Some(proxy_url) = proxy {
        let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
            LandscapeError::Config(format!("Invalid proxy URL '{}': {}", proxy_url, e))
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| LandscapeError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Build Google Scholar search URL
fn build_search_url(base_url: &str, query: &str, start: u32, sdt: &str, ylo: i32) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/scholar", base_url))
        .map_err(|e| LandscapeError::Config(format!("Invalid base URL: {}", e)))?;

    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("hl", "en") // Force English locale for consistent parsing
        .append_pair("start", &start.to_string())
        .append_pair("as_sdt", sdt)
        .append_pair("as_ylo", &ylo.to_string());

    Ok(url)
}

async fn fetch_page(client: &reqwest::Client, url: &Url) -> Result<String> {
    let response = client
        .get(url.as_str())
        .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
        .header("Accept-Language", "en-US,en;q=0.9")
        .send()
        .await?;

    let status = response.status();
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(LandscapeError::RateLimited("Google Scholar".to_string()));
    }

    if !status.is_success() {
        return Err(LandscapeError::Api {
            code: status.as_u16(),
            message: format!("Google Scholar HTTP error: {}", status),
        });
    }

    Ok(response.text().await?)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| LandscapeError::Parse(e.to_string()))
}

/// Whether the page links to a following result page
pub fn has_next_page_link(html: &str) -> Result<bool> {
    let document = Html::parse_document(html);
    let next_selector = selector(".gs_ico_nav_next")?;
    Ok(document.select(&next_selector).next().is_some())
}

/// Parse a Google Scholar result page.
///
/// Entries without a title are skipped. Titles are taken as displayed,
/// minus the `[PDF]`/`[HTML]`/`[CITATION]` badges Scholar prefixes.
pub fn parse_result_items(html: &str) -> Result<Vec<ScholarPublication>> {
    let document = Html::parse_document(html);

    let item_selector = selector("div.gs_r.gs_or.gs_scl")?;
    let title_selector = selector("h3.gs_rt")?;
    let link_selector = selector("h3.gs_rt a")?;
    let badge_selector = selector("h3.gs_rt span.gs_ctc, h3.gs_rt span.gs_ctu")?;
    let meta_selector = selector("div.gs_a")?;
    let snippet_selector = selector("div.gs_rs")?;
    let cite_selector = selector("div.gs_fl a")?;

    let year_regex =
        Regex::new(r"\b(19|20)\d{2}\b").map_err(|e| LandscapeError::Parse(e.to_string()))?;
    let cite_regex =
        Regex::new(r"Cited by\s*(\d+)").map_err(|e| LandscapeError::Parse(e.to_string()))?;

    let mut results = Vec::new();

    for item in document.select(&item_selector) {
        let mut publication = ScholarPublication::default();
        let mut bib = ScholarBib::default();

        if let Some(link) = item.select(&link_selector).next() {
            bib.title = link.text().collect::<String>().trim().to_string();
            publication.pub_url = link.value().attr("href").unwrap_or("").to_string();
        } else if let Some(title_elem) = item.select(&title_selector).next() {
            let badges: String = item.select(&badge_selector).flat_map(|b| b.text()).collect();
            let full: String = title_elem.text().collect();
            bib.title = full.replacen(&badges, "", 1).trim().to_string();
        }

        // "A Author, B Author - Venue, 2021 - publisher"
        if let Some(meta_elem) = item.select(&meta_selector).next() {
            let meta_text = meta_elem.text().collect::<String>();
            let parts: Vec<&str> = meta_text.split(" - ").collect();

            if let Some(authors) = parts.first() {
                bib.author = authors.trim().to_string();
            }

            if let Some(venue_year) = parts.get(1) {
                if let Some(year_match) = year_regex.find(venue_year) {
                    bib.pub_year = year_match.as_str().to_string();
                    bib.venue = venue_year[..year_match.start()]
                        .trim()
                        .trim_end_matches(',')
                        .to_string();
                } else {
                    bib.venue = venue_year.trim().to_string();
                }
            }
        }

        if let Some(snippet_elem) = item.select(&snippet_selector).next() {
            bib.abstract_text = snippet_elem.text().collect::<String>().trim().to_string();
        }

        for link in item.select(&cite_selector) {
            let href = link.value().attr("href").unwrap_or("");
            if !href.contains("cites=") {
                continue;
            }
            let text = link.text().collect::<String>();
            if let Some(count) = cite_regex.captures(&text).and_then(|c| c.get(1)) {
                publication.num_citations = count.as_str().parse().unwrap_or(0);
                break;
            }
        }

        if !bib.title.is_empty() {
            publication.bib = bib;
            results.push(publication);
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RESULT_PAGE: &str = r#"
<html><body>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><a href="https://example.org/pycytominer">Reproducible image-based profiling with Pycytominer</a></h3>
    <div class="gs_a">E Serrano, S Chandrasekaran - arXiv preprint arXiv:2311.13417, 2023 - arxiv.org</div>
    <div class="gs_rs">Pycytominer is a user-friendly, open-source python package</div>
    <div class="gs_fl gs_flb"><a href="/scholar?cites=123">Cited by 42</a><a href="/scholar?related">Related articles</a></div>
  </div>
</div>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri">
    <h3 class="gs_rt"><span class="gs_ctu"><span class="gs_ct1">[CITATION]</span></span> Data-analysis strategies for image-based cell profiling</h3>
    <div class="gs_a">JC Caicedo - Nature methods</div>
  </div>
</div>
<div class="gs_r gs_or gs_scl">
  <div class="gs_ri"><div class="gs_a">No title here</div></div>
</div>
</body></html>"#;

    #[test]
    fn test_build_search_url() -> Result<()> {
        let url = build_search_url(DEFAULT_SCHOLAR_URL, "\"pycytominer\"", 10, "0,5", 2019)?;
        assert!(url.as_str().contains("q=%22pycytominer%22"));
        assert!(url.as_str().contains("as_ylo=2019"));
        assert!(url.as_str().contains("start=10"));
        Ok(())
    }

    #[test]
    fn test_parse_empty_html() -> Result<()> {
        let results = parse_result_items("<html><body></body></html>")?;
        assert!(results.is_empty());
        Ok(())
    }

    #[test]
    fn test_parse_result_items() -> Result<()> {
        let results = parse_result_items(RESULT_PAGE)?;
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.bib.title, "Reproducible image-based profiling with Pycytominer");
        assert_eq!(first.bib.author, "E Serrano, S Chandrasekaran");
        assert_eq!(first.bib.pub_year, "2023");
        assert_eq!(first.bib.venue, "arXiv preprint arXiv:2311.13417");
        assert_eq!(first.pub_url, "https://example.org/pycytominer");
        assert_eq!(first.num_citations, 42);

        let second = &results[1];
        assert_eq!(second.bib.title, "Data-analysis strategies for image-based cell profiling");
        assert_eq!(second.bib.venue, "Nature methods");
        assert_eq!(second.bib.pub_year, "");
        assert_eq!(second.num_citations, 0);
        Ok(())
    }

    #[test]
    fn test_invalid_proxy() {
        let options = ScholarOptions {
            proxy: Some("http://proxy:notaport".to_string()),
            ..Default::default()
        };
        assert!(matches!(ScholarClient::new(options), Err(LandscapeError::Config(_))));
    }

    fn result_row(title: Option<&str>) -> String {
        let heading = title
            .map(|t| format!(r#"<h3 class="gs_rt"><a href="https://example.org/{t}">{t}</a></h3>"#))
            .unwrap_or_default();
        format!(
            r#"<div class="gs_r gs_or gs_scl"><div class="gs_ri">{heading}<div class="gs_a">A Author - Journal, 2021 - x.org</div></div></div>"#
        )
    }

    fn result_page(titles: &[Option<String>], has_next: bool) -> String {
        let rows: String = titles.iter().map(|t| result_row(t.as_deref())).collect();
        let nav = if has_next {
            r#"<div id="gs_n"><a href="/scholar?start=10"><span class="gs_ico gs_ico_nav_next"></span><b>Next</b></a></div>"#
        } else {
            ""
        };
        format!("<html><body>{rows}{nav}</body></html>")
    }

    fn titled(prefix: &str, n: usize) -> Vec<Option<String>> {
        (0..n).map(|i| Some(format!("{prefix} {i}"))).collect()
    }

    async fn mount_page(server: &MockServer, start: &str, body: String) {
        Mock::given(method("GET"))
            .and(path("/scholar"))
            .and(query_param("start", start))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn client_for(server: &MockServer, max_pages: u32) -> Result<ScholarClient> {
        ScholarClient::new(ScholarOptions {
            base_url: Some(server.uri()),
            max_pages,
            ..Default::default()
        })
    }

    #[test]
    fn test_has_next_page_link() -> Result<()> {
        assert!(has_next_page_link(&result_page(&titled("T", 1), true))?);
        assert!(!has_next_page_link(&result_page(&titled("T", 1), false))?);
        assert!(!has_next_page_link(RESULT_PAGE)?);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_follows_next_link_past_untitled_row() -> Result<()> {
        let server = MockServer::start().await;

        // Ten rows on the first page, one of them without a title
        let mut first = titled("First", 9);
        first.insert(4, None);
        mount_page(&server, "0", result_page(&first, true)).await;
        mount_page(&server, "10", result_page(&titled("Second", 5), false)).await;

        let results = client_for(&server, 20)?.query("\"pycytominer\"", 2019).await?;
        assert_eq!(results.len(), 14);
        assert_eq!(results[0].bib.title, "First 0");
        assert_eq!(results[13].bib.title, "Second 4");

        let requests = server.received_requests().await.unwrap_or_default();
        assert_eq!(requests.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_stops_on_page_without_next_link() -> Result<()> {
        let server = MockServer::start().await;
        mount_page(&server, "0", result_page(&titled("Only", 10), false)).await;

        let results = client_for(&server, 20)?.query("\"CytoTable\"", 2022).await?;
        assert_eq!(results.len(), 10);
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_stops_at_page_cap() -> Result<()> {
        let server = MockServer::start().await;
        mount_page(&server, "0", result_page(&titled("First", 10), true)).await;
        mount_page(&server, "10", result_page(&titled("Second", 10), true)).await;

        let results = client_for(&server, 1)?.query("\"coSMicQC\"", 2023).await?;
        assert_eq!(results.len(), 10);
        assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_query_captcha_is_an_error() -> Result<()> {
        let server = MockServer::start().await;
        mount_page(
            &server,
            "0",
            "<html><body>Our systems have detected unusual traffic</body></html>".to_string(),
        )
        .await;

        let err = client_for(&server, 20)?
            .query("\"pycytominer\"", 2019)
            .await
            .expect_err("CAPTCHA page");
        assert!(matches!(err, LandscapeError::Captcha(_)));
        Ok(())
    }
}
