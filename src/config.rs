//! Configuration management for topicpost.
//!
//! Configuration is read from environment variables (a `.env` file is loaded
//! first by the binary):
//! - `GEMINI_API_KEY` - Required. Key for the primary model backend.
//! - `GROQ_API_KEY` - Optional. Key for the fallback backend. Unset or empty disables fallback.
//! - `GEMINI_MODELS` / `GROQ_MODELS` - Optional. Comma-separated candidate lists, in priority order.
//! - `MODEL_TEMPERATURE` - Optional. Defaults to `0.7`.
//! - `MODEL_TIMEOUT_SECS` - Optional. Per completion call. Defaults to `60`.
//! - `MODEL_PROBE_TIMEOUT_SECS` - Optional. Per liveness probe. Defaults to `20`.
//! - `IMAGE_TIMEOUT_SECS` - Optional. Image suggestion call. Defaults to `30`.
//! - `MAX_ITERATIONS` - Optional. Reasoning loop cap. Defaults to `5`.
//! - `MAX_PARSE_RETRIES` - Optional. Consecutive unparseable model outputs tolerated. Defaults to `1`.
//! - `GOOGLE_SEARCH_TIMEOUT_SECS` / `YAHOO_SEARCH_TIMEOUT_SECS` / `DDG_SEARCH_TIMEOUT_SECS` - Optional.
//! - `SNIPPET_FETCH_TIMEOUT_SECS` - Optional. Per page when enriching Google results. Defaults to `5`.
//! - `STYLE_GUIDE_PATH` - Optional. Replaces the built-in post style rules.
//! - `HOST` / `PORT` - Optional. Defaults to `127.0.0.1:8000`.
//! - `LOG_LEVEL` / `LOG_FORMAT` - Optional. Defaults to `info` / `pretty`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::llm::{Backend, ModelCandidate};

pub const DEFAULT_GEMINI_MODELS: &[&str] = &[
    "gemini-2.0-flash-exp",
    "gemini-1.5-flash",
    "gemini-1.5-pro",
    "gemini-pro",
];

pub const DEFAULT_GROQ_MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama3-70b-8192",
    "llama3-8b-8192",
    "mixtral-8x7b-32768",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),

    #[error("Failed to read style guide {0}: {1}")]
    StyleGuide(PathBuf, std::io::Error),
}

/// Model backend configuration.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Primary backend (Gemini) API key
    pub primary_api_key: String,

    /// Fallback backend (Groq) API key; `None` disables fallback entirely
    pub fallback_api_key: Option<String>,

    /// Primary candidates, highest priority first
    pub primary_candidates: Vec<ModelCandidate>,

    /// Fallback candidates, highest priority first
    pub fallback_candidates: Vec<ModelCandidate>,

    pub temperature: f32,

    /// Timeout for a single completion call
    pub request_timeout: Duration,

    /// Timeout for a liveness probe during initialization
    pub probe_timeout: Duration,
}

/// Search provider timeouts.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub google_timeout: Duration,
    pub yahoo_timeout: Duration,
    pub duckduckgo_timeout: Duration,

    /// Per-page timeout when fetching snippets for Google results
    pub snippet_fetch_timeout: Duration,

    /// Results kept per provider before formatting
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            google_timeout: Duration::from_secs(15),
            yahoo_timeout: Duration::from_secs(10),
            duckduckgo_timeout: Duration::from_secs(10),
            snippet_fetch_timeout: Duration::from_secs(5),
            max_results: 5,
        }
    }
}

/// Reasoning loop limits.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum model calls (and therefore tool rounds) per request
    pub max_iterations: usize,

    /// Consecutive unparseable outputs re-prompted before giving up
    pub max_parse_retries: usize,

    /// Replacement for the built-in post style rules
    pub style_guide: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            max_parse_retries: 1,
            style_guide: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub model: ModelConfig,

    pub search: SearchConfig,

    pub agent: AgentConfig,

    /// Timeout for the image suggestion call
    pub image_timeout: Duration,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    pub log_level: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GEMINI_API_KEY` is not set, and
    /// `ConfigError::InvalidValue` for any unparseable numeric setting.
    pub fn from_env() -> Result<Self, ConfigError> {
        let primary_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("GEMINI_API_KEY".to_string()))?;

        let fallback_api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let primary_candidates = candidates_from_env("GEMINI_MODELS", Backend::Gemini, DEFAULT_GEMINI_MODELS);
        let fallback_candidates = candidates_from_env("GROQ_MODELS", Backend::Groq, DEFAULT_GROQ_MODELS);

        let model = ModelConfig {
            primary_api_key,
            fallback_api_key,
            primary_candidates,
            fallback_candidates,
            temperature: env_or("MODEL_TEMPERATURE", 0.7)?,
            request_timeout: env_secs("MODEL_TIMEOUT_SECS", 60)?,
            probe_timeout: env_secs("MODEL_PROBE_TIMEOUT_SECS", 20)?,
        };

        let search = SearchConfig {
            google_timeout: env_secs("GOOGLE_SEARCH_TIMEOUT_SECS", 15)?,
            yahoo_timeout: env_secs("YAHOO_SEARCH_TIMEOUT_SECS", 10)?,
            duckduckgo_timeout: env_secs("DDG_SEARCH_TIMEOUT_SECS", 10)?,
            snippet_fetch_timeout: env_secs("SNIPPET_FETCH_TIMEOUT_SECS", 5)?,
            ..SearchConfig::default()
        };

        let style_guide = match std::env::var("STYLE_GUIDE_PATH") {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path);
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| ConfigError::StyleGuide(path.clone(), e))?;
                Some(text)
            }
            _ => None,
        };

        let max_iterations: usize = env_or("MAX_ITERATIONS", 5)?;
        if max_iterations == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_ITERATIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let agent = AgentConfig {
            max_iterations,
            max_parse_retries: env_or("MAX_PARSE_RETRIES", 1)?,
            style_guide,
        };

        let log_format = match std::env::var("LOG_FORMAT")
            .unwrap_or_default()
            .trim()
            .to_lowercase()
            .as_str()
        {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        Ok(Self {
            model,
            search,
            agent,
            image_timeout: env_secs("IMAGE_TIMEOUT_SECS", 30)?,
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env_or("PORT", 8000)?,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format,
        })
    }

    /// Create a config with default settings (useful for testing).
    pub fn new(primary_api_key: String, fallback_api_key: Option<String>) -> Self {
        Self {
            model: ModelConfig {
                primary_api_key,
                fallback_api_key,
                primary_candidates: build_candidates(Backend::Gemini, DEFAULT_GEMINI_MODELS.iter().copied()),
                fallback_candidates: build_candidates(Backend::Groq, DEFAULT_GROQ_MODELS.iter().copied()),
                temperature: 0.7,
                request_timeout: Duration::from_secs(60),
                probe_timeout: Duration::from_secs(20),
            },
            search: SearchConfig::default(),
            agent: AgentConfig::default(),
            image_timeout: Duration::from_secs(30),
            host: "127.0.0.1".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

fn env_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        _ => Ok(default),
    }
}

fn env_secs(name: &str, default: u64) -> Result<Duration, ConfigError> {
    env_or(name, default).map(Duration::from_secs)
}

fn candidates_from_env(name: &str, backend: Backend, defaults: &[&str]) -> Vec<ModelCandidate> {
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => build_candidates(backend, raw.split(',')),
        _ => build_candidates(backend, defaults.iter().copied()),
    }
}

/// Turn an ordered list of model ids into prioritized candidates.
pub fn build_candidates<'a>(
    backend: Backend,
    models: impl IntoIterator<Item = &'a str>,
) -> Vec<ModelCandidate> {
    models
        .into_iter()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .enumerate()
        .map(|(priority, model)| ModelCandidate::new(backend, model, priority as u32))
        .collect()
}
