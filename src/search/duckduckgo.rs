//! DuckDuckGo search via the HTML endpoint (no API key needed).

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use url::Url;

use super::{text_content, SearchError, SearchProvider, SearchResult};

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

pub struct DuckDuckGoSearch {
    http: Client,
    timeout: Duration,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new(http: Client, timeout: Duration) -> Self {
        Self {
            http,
            timeout,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the provider at a different host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!(
            "{}/html/?q={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }
        let html = response.text().await?;
        Ok(parse_ddg_results(&html, limit))
    }
}

/// Extract search results from DuckDuckGo HTML, skipping sponsored entries.
pub(crate) fn parse_ddg_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let (Ok(container_sel), Ok(title_sel), Ok(snippet_sel)) = (
        Selector::parse("div.result"),
        Selector::parse("a.result__a"),
        Selector::parse(".result__snippet"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for container in document.select(&container_sel) {
        if out.len() >= limit {
            break;
        }
        if container.value().classes().any(|c| c == "result--ad") {
            continue;
        }
        let Some(anchor) = container.select(&title_sel).next() else {
            continue;
        };
        let Some(link) = anchor.value().attr("href").and_then(normalize_ddg_href) else {
            continue;
        };
        if !seen.insert(link.clone()) {
            continue;
        }

        let snippet = container
            .select(&snippet_sel)
            .next()
            .map(text_content)
            .unwrap_or_default();

        out.push(SearchResult::new(text_content(anchor), link, snippet));
    }

    out
}

/// Resolve `//duckduckgo.com/l/?uddg=<target>` redirects into the target URL.
fn normalize_ddg_href(href: &str) -> Option<String> {
    let href = href.trim();
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else if href.starts_with("/l/") {
        format!("https://duckduckgo.com{}", href)
    } else {
        href.to_string()
    };

    let parsed = Url::parse(&absolute).ok()?;
    let is_redirect = parsed
        .host_str()
        .map(|h| h.ends_with("duckduckgo.com"))
        .unwrap_or(false)
        && parsed.path().starts_with("/l/");

    if is_redirect {
        let target = parsed
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.trim().to_string())?;
        return (target.starts_with("http://") || target.starts_with("https://")).then_some(target);
    }

    matches!(parsed.scheme(), "http" | "https").then_some(absolute)
}
