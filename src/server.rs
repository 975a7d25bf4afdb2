use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use eyre::{Result, WrapErr};
use log::{info, warn};
use serde::Serialize;
use serde_json::Value;

use crate::fallback::Attempt;
use crate::pipeline::{AnalyzeError, Analyzer};
use crate::{ListenerContext, normalize_video_id};

#[derive(Clone)]
struct AppState {
    analyzer: Arc<Analyzer>,
}

#[derive(Debug, Serialize)]
struct ApiError {
    #[serde(skip)]
    status: StatusCode,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    trail: Option<Vec<Attempt>>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: message.into(),
            trail: None,
        }
    }
}

impl From<AnalyzeError> for ApiError {
    fn from(err: AnalyzeError) -> Self {
        let message = err.to_string();
        match err {
            AnalyzeError::NoCaptions { trail } => Self {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                error: message,
                trail: (!trail.is_empty()).then_some(trail),
            },
            AnalyzeError::Generation(_) => Self::new(StatusCode::INTERNAL_SERVER_ERROR, message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

type ApiResult<T> = std::result::Result<T, ApiError>;

/// Build the HTTP surface around an analyzer
pub fn router(analyzer: Arc<Analyzer>) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze).fallback(method_not_allowed))
        .route("/healthz", get(healthz))
        .with_state(AppState { analyzer })
}

/// Bind and serve until Ctrl+C
pub async fn serve(analyzer: Arc<Analyzer>, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind.parse().wrap_err_with(|| format!("invalid bind address: {bind}"))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("binding to {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, router(analyzer))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("running HTTP server")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
    info!("Shutting down");
}

async fn healthz() -> Json<Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn analyze(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);

    let video_id = body
        .get("videoId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::new(StatusCode::BAD_REQUEST, "videoId is required"))?;
    let video_id = normalize_video_id(video_id);

    let context: ListenerContext = body
        .get("context")
        .cloned()
        .and_then(|c| serde_json::from_value(c).ok())
        .unwrap_or_default();

    info!("Analyze request for {video_id}");
    let value = state.analyzer.analyze(&video_id, &context).await?;
    Ok(Json(value))
}
