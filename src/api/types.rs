//! API request and response types.

use serde::{Deserialize, Serialize};

/// Request to generate a post.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratePostRequest {
    /// Topic to write about (3 to 200 characters)
    pub topic: String,
}

/// A generated post.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePostResponse {
    pub topic: String,

    /// Source URLs, or a single placeholder entry
    pub sources: Vec<String>,

    pub post: String,

    /// Suggested image description, `null` when none could be produced
    pub image: Option<String>,

    /// Timestamp (ISO 8601)
    pub generated_at: String,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Service health.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    /// A model is active
    Healthy,
    /// Model initialization failed at startup
    Degraded,
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,

    pub service: String,

    /// Timestamp (ISO 8601)
    pub timestamp: String,
}

/// Response for `GET /`.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub service: String,

    pub version: String,

    /// Active model as `backend/model`, if any
    pub model: Option<String>,

    pub endpoints: Vec<String>,
}
