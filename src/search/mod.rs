//! Web search cascade.
//!
//! Providers are tried in a fixed order. The first one that returns at least
//! one usable result wins and the rest are never consulted; results from
//! different providers are never merged. When every provider fails the cascade
//! returns a degraded-mode message instead of an error, so callers can carry on
//! with background knowledge.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::ElementRef;
use thiserror::Error;

use crate::config::SearchConfig;

mod duckduckgo;
mod google;
#[cfg(test)]
mod testing;
mod yahoo;

pub use duckduckgo::DuckDuckGoSearch;
pub use google::GoogleSearch;
pub use yahoo::YahooSearch;

/// Browser-like user agent; the HTML endpoints reject obvious bots.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Snippets longer than this are cut before formatting.
pub const MAX_SNIPPET_CHARS: usize = 200;

/// One retrieved item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    /// May be empty when the provider had nothing to show.
    pub snippet: String,
}

impl SearchResult {
    pub fn new(title: impl Into<String>, url: impl Into<String>, snippet: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            snippet: snippet.into(),
        }
    }

    /// A result counts only if it carries a title or a URL.
    pub fn is_meaningful(&self) -> bool {
        !self.title.trim().is_empty() || !self.url.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("No results")]
    Empty,
}

/// Outcome of asking one provider. Only used for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub success: bool,
    pub error: Option<String>,
}

/// A single retrieval backend.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Budget for one whole `search` call.
    fn timeout(&self) -> Duration;

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchResult>, SearchError>;
}

/// Ordered provider fallback chain.
pub struct SearchCascade {
    providers: Vec<Box<dyn SearchProvider>>,
    max_results: usize,
}

impl SearchCascade {
    pub fn new(providers: Vec<Box<dyn SearchProvider>>, max_results: usize) -> Self {
        Self {
            providers,
            max_results,
        }
    }

    /// Google, then Yahoo, then DuckDuckGo.
    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let http = Client::builder().user_agent(USER_AGENT).build()?;

        let providers: Vec<Box<dyn SearchProvider>> = vec![
            Box::new(GoogleSearch::new(
                http.clone(),
                config.google_timeout,
                config.snippet_fetch_timeout,
            )),
            Box::new(YahooSearch::new(http.clone(), config.yahoo_timeout)),
            Box::new(DuckDuckGoSearch::new(http, config.duckduckgo_timeout)),
        ];

        Ok(Self::new(providers, config.max_results))
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Search and return a flattened text block. Never fails.
    pub async fn search(&self, query: &str) -> String {
        self.search_with_attempts(query).await.0
    }

    /// Like [`search`](Self::search), also returning what each provider did.
    pub async fn search_with_attempts(&self, query: &str) -> (String, Vec<ProviderAttempt>) {
        let mut attempts = Vec::new();

        for provider in &self.providers {
            tracing::info!(provider = provider.name(), query, "Attempting search");

            let outcome = match tokio::time::timeout(
                provider.timeout(),
                provider.search(query, self.max_results),
            )
            .await
            {
                Ok(Ok(results)) => {
                    let results: Vec<SearchResult> = results
                        .into_iter()
                        .filter(SearchResult::is_meaningful)
                        .take(self.max_results)
                        .collect();
                    if results.is_empty() {
                        Err(SearchError::Empty)
                    } else {
                        Ok(results)
                    }
                }
                Ok(Err(e)) => Err(e),
                Err(_) => Err(SearchError::Timeout(provider.timeout())),
            };

            match outcome {
                Ok(results) => {
                    tracing::info!(
                        provider = provider.name(),
                        query,
                        results_count = results.len(),
                        "Search succeeded"
                    );
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        success: true,
                        error: None,
                    });
                    return (format_results(&results), attempts);
                }
                Err(e) => {
                    tracing::warn!(
                        provider = provider.name(),
                        query,
                        error = %e,
                        "Search provider failed, trying next"
                    );
                    attempts.push(ProviderAttempt {
                        provider: provider.name().to_string(),
                        success: false,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        tracing::error!(query, "All search providers failed");
        (degraded_message(query), attempts)
    }
}

/// Text returned when no provider produced results.
pub fn degraded_message(query: &str) -> String {
    format!(
        "Unable to fetch live search results for '{}'. Generating content based on general knowledge and recent trends in this topic.",
        query
    )
}

/// Render results as `Title/URL/Snippet` blocks separated by blank lines.
pub fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| {
            format!(
                "Title: {}\nURL: {}\nSnippet: {}",
                r.title.trim(),
                r.url.trim(),
                truncate_chars(r.snippet.trim(), MAX_SNIPPET_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub(crate) fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

pub(crate) fn text_content(elem: ElementRef<'_>) -> String {
    elem.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
