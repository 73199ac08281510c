use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;

use super::types::*;
use super::AppState;
use crate::config;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorBody>)>;

fn bad_request(msg: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            success: Some(false),
            error: msg.into(),
        }),
    )
}

fn internal_error(msg: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            success: None,
            error: msg.into(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// `GET /events/integrator/{chainId}/{integrator}`: all stored events for
/// one integrator on one chain.
pub async fn events_by_integrator(
    State(state): State<Arc<AppState>>,
    Path((chain_id, integrator)): Path<(String, String)>,
) -> ApiResult<IntegratorEventsResponse> {
    let chain_id: u64 = chain_id
        .parse()
        .map_err(|_| bad_request("Invalid or unsupported chain id"))?;
    if !config::is_supported_chain(chain_id) {
        return Err(bad_request("Invalid or unsupported chain id"));
    }
    if !config::is_hex_address(&integrator) {
        return Err(bad_request("Invalid integrator address"));
    }

    // Stored addresses are lowercase hex.
    let integrator = integrator.to_ascii_lowercase();

    let events = state
        .events
        .events_by_integrator(chain_id, &integrator)
        .await
        .map_err(|e| internal_error(e.to_string()))?;

    let count = events.len();
    Ok(Json(IntegratorEventsResponse {
        success: true,
        data: EventsPayload { events },
        meta: ResponseMeta {
            count,
            timestamp: Utc::now(),
        },
    }))
}
