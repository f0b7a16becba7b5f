//! HTTP API for post generation.
//!
//! ## Endpoints
//!
//! - `POST /api/v1/generate-post` - Generate a post for a topic
//! - `GET /api/v1/health` - Health check
//! - `GET /` - Service metadata

mod routes;
pub mod types;

pub use routes::{app, serve, AppState, SERVICE_NAME};
