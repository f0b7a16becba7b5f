//! Web search tool backed by the search cascade.

use std::sync::Arc;

use async_trait::async_trait;

use super::Tool;
use crate::search::SearchCascade;

/// Search the web for recent news and articles.
pub struct WebSearch {
    cascade: Arc<SearchCascade>,
}

impl WebSearch {
    pub const NAME: &'static str = "WebSearch";

    pub fn new(cascade: Arc<SearchCascade>) -> Self {
        Self { cascade }
    }
}

#[async_trait]
impl Tool for WebSearch {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Search for recent news and articles. Input should be a search query string."
    }

    async fn execute(&self, input: &str) -> anyhow::Result<String> {
        let query = input.trim();
        if query.is_empty() {
            anyhow::bail!("Search query must not be empty");
        }
        Ok(self.cascade.search(query).await)
    }
}
