//! Fake model clients for unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::{Backend, LlmClient, LlmError, ModelCandidate, ModelProvider};

/// Replays canned responses in order, recording every prompt it receives.
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<String>>,
    repeat: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub(crate) fn new(responses: &[&str]) -> Self {
        Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            repeat: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answer with the same text.
    pub(crate) fn repeating(text: &str) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            repeat: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(next) = self.responses.lock().unwrap().pop_front() {
            return Ok(next);
        }
        self.repeat.clone().ok_or(LlmError::EmptyResponse)
    }
}

/// Always fails with a server error.
pub(crate) struct FailingLlm;

#[async_trait]
impl LlmClient for FailingLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        Err(LlmError::ApiError {
            status: 500,
            message: "backend down".to_string(),
        })
    }
}

/// Answers only after sleeping.
pub(crate) struct SlowLlm(pub(crate) Duration);

#[async_trait]
impl LlmClient for SlowLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, LlmError> {
        tokio::time::sleep(self.0).await;
        Ok("late".to_string())
    }
}

/// Wrap a fake client as an active model.
pub(crate) fn provider_with(client: Arc<dyn LlmClient>) -> ModelProvider {
    ModelProvider::new(
        ModelCandidate::new(Backend::Gemini, "fake-model", 0),
        client,
        Duration::from_secs(5),
    )
}
