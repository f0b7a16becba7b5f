//! Google web search: scrape the results page, then fetch each hit to find a
//! snippet (meta description or first paragraph).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use scraper::{Html, Selector};
use tokio::time::Instant;
use url::Url;

use super::{text_content, truncate_chars, SearchError, SearchProvider, SearchResult, MAX_SNIPPET_CHARS};

const DEFAULT_BASE_URL: &str = "https://www.google.com";

/// Share of the provider timeout that snippet fetching may use.
const SNIPPET_BUDGET_SHARE: f64 = 0.8;

pub struct GoogleSearch {
    http: Client,
    timeout: Duration,
    snippet_timeout: Duration,
    base_url: String,
}

impl GoogleSearch {
    pub fn new(http: Client, timeout: Duration, snippet_timeout: Duration) -> Self {
        Self {
            http,
            timeout,
            snippet_timeout,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Like [`fetch_snippet`](Self::fetch_snippet), but gives up with an empty
    /// snippet once `deadline` passes.
    async fn fetch_snippet_until(&self, url: &str, deadline: Instant) -> String {
        match tokio::time::timeout_at(deadline, self.fetch_snippet(url)).await {
            Ok(snippet) => snippet,
            Err(_) => {
                tracing::debug!(url, "Snippet fetch ran past the search budget");
                String::new()
            }
        }
    }

    /// Fetch a result page and pull a snippet from it. Failures yield an empty
    /// snippet; the hit itself is still kept.
    async fn fetch_snippet(&self, url: &str) -> String {
        let response = match self.http.get(url).timeout(self.snippet_timeout).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(url, status = %r.status(), "Snippet fetch returned error status");
                return String::new();
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "Snippet fetch failed");
                return String::new();
            }
        };

        match response.text().await {
            Ok(html) => extract_page_snippet(&html),
            Err(_) => String::new(),
        }
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    fn name(&self) -> &str {
        "google"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let started = Instant::now();
        let url = format!(
            "{}/search?q={}&num={}&hl=en",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query),
            limit
        );

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }
        let html = response.text().await?;

        // Pages are fetched together and must finish inside the provider
        // timeout; a late page keeps its hit with an empty snippet.
        let deadline = started + self.timeout.mul_f64(SNIPPET_BUDGET_SHARE);
        let hits = parse_google_results(&html, limit);
        let snippets = join_all(hits.iter().map(|(_, link)| self.fetch_snippet_until(link, deadline))).await;

        Ok(hits
            .into_iter()
            .zip(snippets)
            .map(|((title, link), snippet)| SearchResult::new(title, link, snippet))
            .collect())
    }
}

/// Extract `(title, url)` pairs from a Google results page.
pub(crate) fn parse_google_results(html: &str, limit: usize) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    let Ok(anchor_sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let Ok(heading_sel) = Selector::parse("h3") else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for anchor in document.select(&anchor_sel) {
        if out.len() >= limit {
            break;
        }
        let Some(heading) = anchor.select(&heading_sel).next() else {
            continue;
        };
        let href = anchor.value().attr("href").unwrap_or("");
        let Some(link) = normalize_google_href(href) else {
            continue;
        };
        let title = text_content(heading);
        if title.is_empty() || !seen.insert(link.clone()) {
            continue;
        }
        out.push((title, link));
    }

    out
}

/// Resolve `/url?q=` redirects and drop links back into Google itself.
fn normalize_google_href(href: &str) -> Option<String> {
    let href = href.trim();
    let resolved = if href.starts_with("/url?") {
        let parsed = Url::parse("https://www.google.com").ok()?.join(href).ok()?;
        parsed
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())?
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&resolved).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host == "google.com" || host.ends_with(".google.com") {
        return None;
    }
    Some(resolved)
}

/// Meta description if present, otherwise the first paragraph cut to
/// [`MAX_SNIPPET_CHARS`].
pub(crate) fn extract_page_snippet(html: &str) -> String {
    let document = Html::parse_document(html);

    if let Ok(meta_sel) = Selector::parse(r#"meta[name="description"]"#) {
        let description = document
            .select(&meta_sel)
            .filter_map(|m| m.value().attr("content"))
            .map(str::trim)
            .find(|c| !c.is_empty());
        if let Some(description) = description {
            return description.to_string();
        }
    }

    Selector::parse("p")
        .ok()
        .and_then(|sel| document.select(&sel).next().map(text_content))
        .map(|text| truncate_chars(&text, MAX_SNIPPET_CHARS).to_string())
        .unwrap_or_default()
}
