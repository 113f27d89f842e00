use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::Instrument as _;

use crate::image::CoverGenerator;
use crate::prompt::{Theme, themes};
use crate::types::GenerationResult;

const REQUEST_ID_HEADER: &str = "x-request-id";

static REQUEST_ID_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Clone)]
pub struct CoverHttpState {
    generator: Arc<dyn CoverGenerator>,
}

impl CoverHttpState {
    pub fn new(generator: impl CoverGenerator + 'static) -> Self {
        Self {
            generator: Arc::new(generator),
        }
    }

    pub fn from_arc(generator: Arc<dyn CoverGenerator>) -> Self {
        Self { generator }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateBody {
    prompt: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateResponse {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub fn router(state: CoverHttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/themes", get(list_themes))
        .route("/api/generate", post(handle_generate))
        .layer(middleware::from_fn(with_request_id))
        .with_state(state)
}

/// Tags the request span with `x-request-id` (inbound or generated) and echoes it back.
async fn with_request_id(request: Request, next: Next) -> Response {
    let request_id =
        extract_header(request.headers(), REQUEST_ID_HEADER).unwrap_or_else(generate_request_id);
    let span = tracing::info_span!(
        "http.request",
        request_id = %request_id,
        method = %request.method(),
        path = %request.uri().path(),
    );

    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn list_themes() -> Json<&'static [Theme]> {
    Json(themes())
}

async fn handle_generate(
    State(state): State<CoverHttpState>,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, (StatusCode, Json<ErrorResponse>)> {
    let span = tracing::info_span!(
        "http.generate",
        provider = state.generator.provider(),
        model = state.generator.model_id(),
    );

    async move {
        let Json(body) = payload.map_err(|rejection| {
            tracing::info!(error = %rejection, "rejected generate request body");
            error_response(StatusCode::BAD_REQUEST, "prompt must be a non-empty string")
        })?;
        if body.prompt.trim().is_empty() {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "prompt must be a non-empty string",
            ));
        }

        match state.generator.generate(&body.prompt).await {
            GenerationResult::Success { url } => Ok(Json(GenerateResponse { url })),
            GenerationResult::Failure {
                reason,
                http_status,
                ..
            } => Err(error_response(failure_status(http_status), reason)),
        }
    }
    .instrument(span)
    .await
}

/// Maps a failure's status onto a valid HTTP error status, defaulting to 502.
fn failure_status(http_status: u16) -> StatusCode {
    StatusCode::from_u16(http_status)
        .ok()
        .filter(|status| status.is_client_error() || status.is_server_error())
        .unwrap_or(StatusCode::BAD_GATEWAY)
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn extract_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn generate_request_id() -> String {
    let ts_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis())
        .unwrap_or(0);
    let seq = REQUEST_ID_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("cover-{ts_ms}-{seq}")
}
