//! Yahoo web search via the HTML results page.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

use super::{text_content, SearchError, SearchProvider, SearchResult};

const DEFAULT_BASE_URL: &str = "https://search.yahoo.com";

pub struct YahooSearch {
    http: Client,
    timeout: Duration,
    base_url: String,
}

impl YahooSearch {
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
impl SearchProvider for YahooSearch {
    fn name(&self) -> &str {
        "yahoo"
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError> {
        let url = format!(
            "{}/search?p={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(query)
        );
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }
        let html = response.text().await?;
        Ok(parse_yahoo_results(&html, limit))
    }
}

pub(crate) fn parse_yahoo_results(html: &str, limit: usize) -> Vec<SearchResult> {
    let document = Html::parse_document(html);
    let (Ok(container_sel), Ok(title_sel), Ok(link_sel), Ok(snippet_sel)) = (
        Selector::parse(r#".algo, .Sr, div[class*="result"]"#),
        Selector::parse("h3, a"),
        Selector::parse("a[href]"),
        Selector::parse(".compText, p, span"),
    ) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for item in document.select(&container_sel) {
        if out.len() >= limit {
            break;
        }
        let (Some(title_elem), Some(link_elem)) =
            (item.select(&title_sel).next(), item.select(&link_sel).next())
        else {
            continue;
        };

        let title = text_content(title_elem);
        let link = decode_yahoo_redirect(link_elem.value().attr("href").unwrap_or(""));
        if !seen.insert(link.clone()) {
            continue;
        }
        let snippet = item
            .select(&snippet_sel)
            .next()
            .map(text_content)
            .unwrap_or_default();

        out.push(SearchResult::new(title, link, snippet));
    }

    out
}

/// Yahoo wraps outbound links as `.../RU=<percent-encoded target>/RK=...`.
fn decode_yahoo_redirect(href: &str) -> String {
    let href = href.trim();
    let Some(start) = href.find("/RU=") else {
        return href.to_string();
    };
    let encoded = &href[start + 4..];
    let encoded = encoded.split("/RK=").next().unwrap_or(encoded);
    let encoded = encoded.split("/RS=").next().unwrap_or(encoded);
    urlencoding::decode(encoded)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string())
}
