//! HTTP server and routing.

use std::future::Future;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::app::{AcquisitionError, ErrorKind, Result};
use crate::dispatch::Dispatcher;
use crate::domain::LookupRequest;

/// Create the Axum router for the lookup service.
pub fn create_router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/songdata", post(songdata))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

/// Serve until `shutdown` resolves.
pub async fn serve<F>(addr: &str, dispatcher: Arc<Dispatcher>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, create_router(dispatcher))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

/// `AcquisitionError` as an HTTP response: `{ "error": message }`.
struct ErrorResponse(AcquisitionError);

impl ErrorResponse {
    fn status(&self) -> StatusCode {
        match self.0.kind {
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotFound
            | ErrorKind::ExtractionTimeout
            | ErrorKind::ExtractionFailure
            | ErrorKind::UpstreamError
            | ErrorKind::AuthError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.0.message }))).into_response()
    }
}

impl From<AcquisitionError> for ErrorResponse {
    fn from(e: AcquisitionError) -> Self {
        Self(e)
    }
}

/// Lookup endpoint. The body is parsed here rather than with the `Json`
/// extractor so malformed bodies get the same error shape as bad titles.
async fn songdata(
    State(dispatcher): State<Arc<Dispatcher>>,
    body: Bytes,
) -> std::result::Result<Response, ErrorResponse> {
    let value: Value = serde_json::from_slice(&body).map_err(|e| {
        AcquisitionError::invalid_input(format!("Invalid request: body is not JSON ({})", e))
    })?;
    let request = LookupRequest::from_value(&value)?;

    let result = dispatcher.acquire_default(&request).await?;
    Ok(Json(result).into_response())
}

/// Health check endpoint.
async fn health_check(State(dispatcher): State<Arc<Dispatcher>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "mode": dispatcher.default_mode(),
    }))
}
