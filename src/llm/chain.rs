//! Model candidate chain and the active model handle.
//!
//! Candidates are plain data: an ordered list per backend. Initialization walks
//! the primary list, then the fallback list (when a fallback key is configured),
//! constructing and probing each candidate until one answers. The winner is
//! wrapped in a [`ModelProvider`] that is cheap to clone and shared read-only
//! across requests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use thiserror::Error;

use super::{GeminiClient, LlmClient, LlmError};
use crate::config::ModelConfig;

const PROBE_PROMPT: &str = "test";

/// A model backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    Gemini,
    Groq,
}

impl Backend {
    pub fn id(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }

    /// Whether this build carries a client for the backend.
    pub fn is_available(&self) -> bool {
        match self {
            Self::Gemini => true,
            Self::Groq => cfg!(feature = "groq"),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// A single entry in the candidate chain: a backend + model pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidate {
    pub backend: Backend,
    pub model: String,
    /// Position within its backend's list (0 = tried first).
    pub priority: u32,
}

impl ModelCandidate {
    pub fn new(backend: Backend, model: impl Into<String>, priority: u32) -> Self {
        Self {
            backend,
            model: model.into(),
            priority,
        }
    }
}

impl fmt::Display for ModelCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.backend, self.model)
    }
}

/// Builds a client for a candidate. Separated from probing so the chain walk
/// can run against fakes.
pub trait Connector: Send + Sync {
    fn connect(&self, candidate: &ModelCandidate, api_key: &str) -> Result<Arc<dyn LlmClient>, LlmError>;
}

/// Connector that builds real HTTP clients.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    http: Client,
    temperature: f32,
}

impl HttpConnector {
    pub fn new(request_timeout: Duration, temperature: f32) -> Result<Self, LlmError> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { http, temperature })
    }
}

impl Connector for HttpConnector {
    fn connect(&self, candidate: &ModelCandidate, api_key: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
        match candidate.backend {
            Backend::Gemini => Ok(Arc::new(GeminiClient::new(
                self.http.clone(),
                api_key,
                &candidate.model,
                self.temperature,
            ))),
            Backend::Groq => connect_groq(self, candidate, api_key),
        }
    }
}

#[cfg(feature = "groq")]
fn connect_groq(
    connector: &HttpConnector,
    candidate: &ModelCandidate,
    api_key: &str,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    Ok(Arc::new(super::GroqClient::new(
        connector.http.clone(),
        api_key,
        &candidate.model,
        connector.temperature,
    )))
}

#[cfg(not(feature = "groq"))]
fn connect_groq(
    _connector: &HttpConnector,
    _candidate: &ModelCandidate,
    _api_key: &str,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    Err(LlmError::BackendUnavailable("groq"))
}

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("No model candidates configured")]
    NoCandidates,

    #[error("All model candidates failed; last failure {candidate}: {source}")]
    AllCandidatesFailed {
        candidate: ModelCandidate,
        #[source]
        source: LlmError,
    },
}

/// The active model, selected once at startup.
#[derive(Clone)]
pub struct ModelProvider {
    candidate: ModelCandidate,
    client: Arc<dyn LlmClient>,
    request_timeout: Duration,
}

impl fmt::Debug for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelProvider")
            .field("candidate", &self.candidate)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl ModelProvider {
    /// Wrap an already-constructed client.
    pub fn new(candidate: ModelCandidate, client: Arc<dyn LlmClient>, request_timeout: Duration) -> Self {
        Self {
            candidate,
            client,
            request_timeout,
        }
    }

    /// Walk the candidate chain and return the first candidate that passes a
    /// liveness probe.
    ///
    /// The fallback list is only consulted when `fallback_api_key` is set.
    pub async fn initialize(
        config: &ModelConfig,
        connector: &dyn Connector,
    ) -> Result<Self, InitializationError> {
        let mut chain: Vec<(&ModelCandidate, &str)> = config
            .primary_candidates
            .iter()
            .map(|c| (c, config.primary_api_key.as_str()))
            .collect();

        match config.fallback_api_key.as_deref() {
            Some(key) => chain.extend(config.fallback_candidates.iter().map(|c| (c, key))),
            None => tracing::info!("No fallback API key configured, fallback backend disabled"),
        }

        let mut last_failure: Option<(ModelCandidate, LlmError)> = None;

        for (candidate, api_key) in chain {
            if !candidate.backend.is_available() {
                tracing::warn!(candidate = %candidate, "Backend not available in this build, skipping");
                last_failure = Some((
                    candidate.clone(),
                    LlmError::BackendUnavailable(candidate.backend.id()),
                ));
                continue;
            }

            tracing::info!(candidate = %candidate, "Trying model candidate");

            match Self::probe(candidate, api_key, connector, config.probe_timeout).await {
                Ok(client) => {
                    tracing::info!(
                        backend = %candidate.backend,
                        model = %candidate.model,
                        "Model initialized"
                    );
                    return Ok(Self::new(candidate.clone(), client, config.request_timeout));
                }
                Err(e) => {
                    tracing::warn!(candidate = %candidate, error = %e, "Model candidate failed");
                    last_failure = Some((candidate.clone(), e));
                }
            }
        }

        match last_failure {
            Some((candidate, source)) => {
                tracing::error!(candidate = %candidate, error = %source, "All model candidates failed");
                Err(InitializationError::AllCandidatesFailed { candidate, source })
            }
            None => Err(InitializationError::NoCandidates),
        }
    }

    async fn probe(
        candidate: &ModelCandidate,
        api_key: &str,
        connector: &dyn Connector,
        probe_timeout: Duration,
    ) -> Result<Arc<dyn LlmClient>, LlmError> {
        let client = connector.connect(candidate, api_key)?;
        match tokio::time::timeout(probe_timeout, client.complete(PROBE_PROMPT)).await {
            Ok(Ok(_)) => Ok(client),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(LlmError::Timeout(probe_timeout)),
        }
    }

    pub fn candidate(&self) -> &ModelCandidate {
        &self.candidate
    }

    /// Complete a prompt under the configured request timeout.
    pub async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        match tokio::time::timeout(self.request_timeout, self.client.complete(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.request_timeout)),
        }
    }

    /// Single-shot completion that never fails: any error, timeout, or blank
    /// output yields `None`.
    pub async fn complete_once(&self, prompt: &str, timeout: Duration) -> Option<String> {
        match tokio::time::timeout(timeout, self.client.complete(prompt)).await {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => {
                tracing::warn!(candidate = %self.candidate, "Single-shot completion returned empty text");
                None
            }
            Ok(Err(e)) => {
                tracing::warn!(candidate = %self.candidate, error = %e, "Single-shot completion failed");
                None
            }
            Err(_) => {
                tracing::warn!(candidate = %self.candidate, timeout_secs = timeout.as_secs_f64(), "Single-shot completion timed out");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{build_candidates, Config};
    use crate::llm::testing::{FailingLlm, ScriptedLlm, SlowLlm};
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Connector whose candidates succeed only when listed as healthy.
    struct FakeConnector {
        healthy: HashSet<String>,
        attempts: Mutex<Vec<String>>,
    }

    impl FakeConnector {
        fn new(healthy: &[&str]) -> Self {
            Self {
                healthy: healthy.iter().map(|s| s.to_string()).collect(),
                attempts: Mutex::new(Vec::new()),
            }
        }

        fn attempts(&self) -> Vec<String> {
            self.attempts.lock().unwrap().clone()
        }
    }

    impl Connector for FakeConnector {
        fn connect(&self, candidate: &ModelCandidate, _api_key: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
            self.attempts.lock().unwrap().push(candidate.model.clone());
            if self.healthy.contains(&candidate.model) {
                Ok(Arc::new(ScriptedLlm::repeating("ok")))
            } else {
                Ok(Arc::new(FailingLlm))
            }
        }
    }

    fn model_config(fallback_key: Option<&str>) -> ModelConfig {
        let mut config = Config::new("primary".to_string(), fallback_key.map(str::to_string)).model;
        config.primary_candidates = build_candidates(Backend::Gemini, ["g1", "g2", "g3"]);
        config.fallback_candidates = build_candidates(Backend::Groq, ["q1", "q2"]);
        config.probe_timeout = Duration::from_millis(200);
        config
    }

    #[tokio::test]
    async fn first_healthy_primary_wins_and_stops_probing() {
        let connector = FakeConnector::new(&["g2", "g3", "q1"]);
        let provider = ModelProvider::initialize(&model_config(Some("fb")), &connector)
            .await
            .expect("initialize");

        assert_eq!(provider.candidate().model, "g2");
        assert_eq!(provider.candidate().backend, Backend::Gemini);
        assert_eq!(connector.attempts(), vec!["g1", "g2"]);
    }

    #[cfg(feature = "groq")]
    #[tokio::test]
    async fn falls_back_when_every_primary_candidate_fails() {
        let connector = FakeConnector::new(&["q2"]);
        let provider = ModelProvider::initialize(&model_config(Some("fb")), &connector)
            .await
            .expect("initialize");

        assert_eq!(provider.candidate().backend, Backend::Groq);
        assert_eq!(provider.candidate().model, "q2");
        assert_eq!(connector.attempts(), vec!["g1", "g2", "g3", "q1", "q2"]);
    }

    #[tokio::test]
    async fn no_fallback_key_means_initialization_failure() {
        let connector = FakeConnector::new(&["q1"]);
        let err = ModelProvider::initialize(&model_config(None), &connector)
            .await
            .expect_err("should fail");

        match err {
            InitializationError::AllCandidatesFailed { candidate, .. } => {
                assert_eq!(candidate.model, "g3");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(connector.attempts(), vec!["g1", "g2", "g3"]);
    }

    #[tokio::test]
    async fn empty_chain_reports_no_candidates() {
        let mut config = model_config(None);
        config.primary_candidates.clear();
        let err = ModelProvider::initialize(&config, &FakeConnector::new(&[]))
            .await
            .expect_err("should fail");
        assert!(matches!(err, InitializationError::NoCandidates));
    }

    #[tokio::test]
    async fn slow_probe_is_rejected() {
        struct SlowConnector;
        impl Connector for SlowConnector {
            fn connect(&self, candidate: &ModelCandidate, _key: &str) -> Result<Arc<dyn LlmClient>, LlmError> {
                if candidate.model == "g1" {
                    Ok(Arc::new(SlowLlm(Duration::from_secs(5))))
                } else {
                    Ok(Arc::new(ScriptedLlm::repeating("ok")))
                }
            }
        }

        let provider = ModelProvider::initialize(&model_config(None), &SlowConnector)
            .await
            .expect("initialize");
        assert_eq!(provider.candidate().model, "g2");
    }

    #[tokio::test]
    async fn complete_once_swallows_failures() {
        let candidate = ModelCandidate::new(Backend::Gemini, "g1", 0);
        let provider = ModelProvider::new(candidate.clone(), Arc::new(FailingLlm), Duration::from_secs(1));
        assert_eq!(provider.complete_once("hi", Duration::from_secs(1)).await, None);

        let provider = ModelProvider::new(candidate.clone(), Arc::new(ScriptedLlm::repeating("   ")), Duration::from_secs(1));
        assert_eq!(provider.complete_once("hi", Duration::from_secs(1)).await, None);

        let provider = ModelProvider::new(candidate, Arc::new(SlowLlm(Duration::from_secs(5))), Duration::from_secs(1));
        assert_eq!(provider.complete_once("hi", Duration::from_millis(20)).await, None);
    }

    #[tokio::test]
    async fn complete_times_out() {
        let provider = ModelProvider::new(
            ModelCandidate::new(Backend::Gemini, "g1", 0),
            Arc::new(SlowLlm(Duration::from_secs(5))),
            Duration::from_millis(20),
        );
        assert!(matches!(provider.complete("hi").await, Err(LlmError::Timeout(_))));
    }
}
