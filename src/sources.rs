//! Source URL extraction from an agent transcript.

use std::sync::LazyLock;

use regex::Regex;

use crate::agent::AgentStep;

/// Returned in place of an empty source list.
pub const SOURCES_PLACEHOLDER: &str = "Sources from web search";

pub const MAX_SOURCES: usize = 3;

static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"{}|\\^`\[\]]+"#).expect("url pattern is valid"));

/// Collect up to [`MAX_SOURCES`] distinct URLs, observations first and then
/// the final output, in the order they appear. Never returns an empty list.
pub fn extract(steps: &[AgentStep], final_output: &str) -> Vec<String> {
    let texts = steps
        .iter()
        .map(|s| s.observation.as_str())
        .chain(std::iter::once(final_output));

    let mut sources: Vec<String> = Vec::new();
    for text in texts {
        for m in URL_RE.find_iter(text) {
            if sources.len() >= MAX_SOURCES {
                return sources;
            }
            let url = m.as_str();
            if !sources.iter().any(|s| s == url) {
                sources.push(url.to_string());
            }
        }
    }

    if sources.is_empty() {
        sources.push(SOURCES_PLACEHOLDER.to_string());
    }
    sources
}
