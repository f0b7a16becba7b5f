//! Language model backends.
//!
//! Every backend is reduced to plain prompt completion behind [`LlmClient`].
//! [`ModelProvider`] owns the candidate chain and the active model chosen at
//! startup.

use async_trait::async_trait;

mod chain;
mod error;
mod gemini;
#[cfg(feature = "groq")]
mod groq;
#[cfg(test)]
pub(crate) mod testing;

pub use chain::{
    Backend, Connector, HttpConnector, InitializationError, ModelCandidate, ModelProvider,
};
pub use error::LlmError;
pub use gemini::GeminiClient;
#[cfg(feature = "groq")]
pub use groq::GroqClient;

/// A prompt-completion backend bound to one model.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a single prompt and return the generated text.
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
