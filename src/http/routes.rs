use crate::http::types::{HttpError, HttpResult, HttpSuccess, SetLogLevelRequest};
use crate::http::HttpState;
use crate::line::dispatch::DispatchSummary;
use crate::line::signature::SIGNATURE_HEADER;
use crate::line::types::WebhookBody;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use std::str::FromStr;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// LINE webhook callback. The signature is checked against the raw body
/// before anything is parsed.
pub async fn line_callback(
    State(state): State<HttpState>,
    headers: HeaderMap,
    body: Bytes,
) -> HttpResult<DispatchSummary> {
    let signature = headers.get(SIGNATURE_HEADER).map(|value| value.as_bytes());
    if let Err(e) = state.verifier.verify(signature, &body) {
        warn!("Rejecting webhook request: {e}");
        return Err(HttpError::bad_request(e.to_string()));
    }

    let payload: WebhookBody = serde_json::from_slice(&body)
        .map_err(|e| HttpError::bad_request(format!("Invalid webhook body: {e}")))?;

    if payload.events.is_empty() {
        debug!("Received webhook verification request");
        return Ok(HttpSuccess(DispatchSummary::default()));
    }

    debug!(
        "Received {} webhook events for {}",
        payload.events.len(),
        payload.destination.as_deref().unwrap_or("unknown destination")
    );
    let summary = state.dispatcher.dispatch(payload.events).await;
    Ok(HttpSuccess(summary))
}

pub async fn sys_version(State(_state): State<HttpState>) -> HttpResult<String> {
    Ok(HttpSuccess(crate::VERSION.to_string()))
}

pub async fn sys_set_log_level(
    State(state): State<HttpState>,
    Json(payload): Json<SetLogLevelRequest>,
) -> HttpResult<bool> {
    let filter = EnvFilter::from_str(&payload.level)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    info!("Setting log level to {filter} via API");
    state
        .tracing_reload
        .reload(filter)
        .map_err(|e| HttpError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        })?;

    Ok(HttpSuccess(true))
}
