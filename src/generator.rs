//! Post generation pipeline: agent loop, then source extraction, then image
//! suggestion.

use std::sync::Arc;

use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

use crate::agent::{AgentError, ReasoningLoop, Termination};
use crate::config::Config;
use crate::image::ImageSuggester;
use crate::llm::{LlmError, ModelProvider};
use crate::search::SearchCascade;
use crate::sources;
use crate::tools::{Tool, ToolRegistry, WebSearch};
use crate::topic::Topic;

/// Output of one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub post: String,
    /// 1 to 3 entries, deduplicated, in first-seen order.
    pub sources: Vec<String>,
    pub image: Option<String>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("Could not parse model output after {attempts} attempts: {reason}")]
    ParseRecoveryExhausted { attempts: usize, reason: String },

    #[error("Model call failed: {0}")]
    Model(#[from] LlmError),
}

impl From<AgentError> for GenerationError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::ParseRecoveryExhausted { attempts, reason } => {
                Self::ParseRecoveryExhausted { attempts, reason }
            }
            AgentError::Model(e) => Self::Model(e),
        }
    }
}

/// Orchestrates one post per call. Shared read-only across requests.
pub struct PostGenerator {
    model: ModelProvider,
    agent: ReasoningLoop,
    images: ImageSuggester,
}

impl PostGenerator {
    pub fn new(model: ModelProvider, search: Arc<SearchCascade>, config: &Config) -> Self {
        let web_search: Arc<dyn Tool> = Arc::new(WebSearch::new(search));
        let tools = ToolRegistry::new(vec![web_search]);

        Self {
            agent: ReasoningLoop::new(model.clone(), tools, &config.agent),
            images: ImageSuggester::new(model.clone(), config.image_timeout),
            model,
        }
    }

    pub fn model(&self) -> &ModelProvider {
        &self.model
    }

    /// Generate a post for `topic`.
    ///
    /// Fails only when the agent cannot recover from unparseable output or the
    /// model stops answering. A missing image is not a failure.
    pub async fn generate(&self, topic: &Topic) -> Result<GenerationResult, GenerationError> {
        let span = tracing::info_span!(
            "generate",
            request_id = %Uuid::new_v4(),
            topic = topic.as_str(),
        );

        async {
            tracing::info!(model = %self.model.candidate(), "Starting post generation");

            let run = self.agent.run(topic.as_str()).await.map_err(|e| {
                tracing::error!(error = %e, "Post generation failed");
                GenerationError::from(e)
            })?;

            if run.termination == Termination::IterationLimit {
                tracing::warn!(steps = run.steps.len(), "Returning best-effort post after iteration limit");
            }

            let sources = sources::extract(&run.steps, &run.output);
            let image = self.images.suggest(topic.as_str()).await;
            if image.is_none() {
                tracing::warn!("No image suggestion, continuing without one");
            }

            tracing::info!(
                tool_rounds = run.tool_rounds,
                sources_count = sources.len(),
                has_image = image.is_some(),
                "Post generation completed"
            );

            Ok(GenerationResult {
                post: run.output,
                sources,
                image,
            })
        }
        .instrument(span)
        .await
    }
}
