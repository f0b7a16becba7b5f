//! # topicpost
//!
//! Turns a topic into a short social media post.
//!
//! This library provides:
//! - A search cascade over several web search providers with graceful degradation
//! - A model provider that picks the first healthy model from an ordered candidate list
//! - A bounded reasoning loop that decides when to search and when to write
//! - An HTTP API around the whole pipeline
//!
//! ## Architecture
//!
//! One request flows through:
//! 1. Validate the topic
//! 2. Run the reasoning loop, which calls `WebSearch` as needed
//! 3. Extract source URLs from the transcript
//! 4. Ask for an image suggestion (optional)
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use topicpost::{config::Config, generator::PostGenerator, llm::{HttpConnector, ModelProvider},
//!     search::SearchCascade, topic::Topic};
//!
//! let config = Config::from_env()?;
//! let connector = HttpConnector::new(config.model.request_timeout, config.model.temperature)?;
//! let model = ModelProvider::initialize(&config.model, &connector).await?;
//! let search = Arc::new(SearchCascade::from_config(&config.search)?);
//! let generator = PostGenerator::new(model, search, &config);
//! let result = generator.generate(&Topic::new("Artificial Intelligence")?).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod generator;
pub mod image;
pub mod llm;
pub mod search;
pub mod sources;
pub mod tools;
pub mod topic;

pub use config::Config;
