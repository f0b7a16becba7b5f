//! One-line image suggestions for a post.

use std::time::Duration;

use crate::llm::ModelProvider;

pub struct ImageSuggester {
    model: ModelProvider,
    timeout: Duration,
}

impl ImageSuggester {
    pub fn new(model: ModelProvider, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    /// Ask for a single business-appropriate image description. Returns `None`
    /// on any failure.
    pub async fn suggest(&self, topic: &str) -> Option<String> {
        let prompt = format!(
            "Suggest a professional stock photo description for a social media post about: {}\n\
             Reply with one concise sentence describing a business-appropriate image and nothing else.",
            topic
        );

        let output = self.model.complete_once(&prompt, self.timeout).await?;
        let line = output
            .lines()
            .map(|l| l.trim().trim_matches('"').trim())
            .find(|l| !l.is_empty())?;

        tracing::debug!(topic, image = line, "Image suggestion ready");
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{provider_with, FailingLlm, ScriptedLlm, SlowLlm};
    use std::sync::Arc;

    #[tokio::test]
    async fn first_non_empty_line_is_used() {
        let llm = Arc::new(ScriptedLlm::new(&["\n  \"A team reviewing charts in a bright office.\"\nExtra"]));
        let suggester = ImageSuggester::new(provider_with(llm.clone()), Duration::from_secs(1));

        assert_eq!(
            suggester.suggest("Quarterly earnings").await.as_deref(),
            Some("A team reviewing charts in a bright office.")
        );
        assert!(llm.prompts()[0].contains("Quarterly earnings"));
    }

    #[tokio::test]
    async fn failures_yield_none() {
        let failing = ImageSuggester::new(provider_with(Arc::new(FailingLlm)), Duration::from_secs(1));
        assert_eq!(failing.suggest("AI").await, None);

        let blank = ImageSuggester::new(provider_with(Arc::new(ScriptedLlm::new(&["  \n "]))), Duration::from_secs(1));
        assert_eq!(blank.suggest("AI").await, None);

        let slow = ImageSuggester::new(
            provider_with(Arc::new(SlowLlm(Duration::from_secs(2)))),
            Duration::from_millis(20),
        );
        assert_eq!(slow.suggest("AI").await, None);
    }
}
