//! HTTP route handlers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use super::types::{
    ErrorResponse, GeneratePostRequest, GeneratePostResponse, HealthResponse, HealthStatus,
    ServiceInfo,
};
use crate::config::Config;
use crate::generator::{GenerationError, PostGenerator};
use crate::topic::Topic;

pub const SERVICE_NAME: &str = "topicpost";

/// Shared state for all routes.
pub struct AppState {
    /// The generator, or the reason model initialization failed.
    pub generator: Result<Arc<PostGenerator>, String>,
}

impl AppState {
    pub fn ready(generator: Arc<PostGenerator>) -> Self {
        Self {
            generator: Ok(generator),
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            generator: Err(reason.into()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

fn error_response(status: StatusCode, detail: String) -> Response {
    (status, Json(ErrorResponse { detail })).into_response()
}

impl IntoResponse for GenerationError {
    fn into_response(self) -> Response {
        match self {
            GenerationError::ModelUnavailable(reason) => error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                format!("Model unavailable: {}", reason),
            ),
            other => error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to generate post: {}", other),
            ),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Routes
// ─────────────────────────────────────────────────────────────────────────────

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/v1/health", get(health))
        .route("/api/v1/generate-post", post(generate_post))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &Config, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Listening");

    axum::serve(listener, app(Arc::new(state))).await?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

async fn root(State(state): State<Arc<AppState>>) -> Json<ServiceInfo> {
    let model = state
        .generator
        .as_ref()
        .ok()
        .map(|g| g.model().candidate().to_string());

    Json(ServiceInfo {
        service: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model,
        endpoints: vec![
            "POST /api/v1/generate-post".to_string(),
            "GET /api/v1/health".to_string(),
        ],
    })
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.generator.is_ok() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        service: SERVICE_NAME.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

async fn generate_post(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    // Validate before touching the model so bad input is always a 422
    let req: GeneratePostRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return error_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Invalid request body: {}", e),
            )
        }
    };
    let topic = match Topic::new(req.topic) {
        Ok(t) => t,
        Err(e) => return error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
    };

    let generator = match &state.generator {
        Ok(g) => g.clone(),
        Err(reason) => return GenerationError::ModelUnavailable(reason.clone()).into_response(),
    };

    match generator.generate(&topic).await {
        Ok(result) => Json(GeneratePostResponse {
            topic: topic.to_string(),
            sources: result.sources,
            post: result.post,
            image: result.image,
            generated_at: chrono::Utc::now().to_rfc3339(),
        })
        .into_response(),
        Err(e) => e.into_response(),
    }
}
