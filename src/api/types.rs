use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::indexer::types::StoredFeeEvent;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct IntegratorEventsResponse {
    pub success: bool,
    pub data: EventsPayload,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct EventsPayload {
    pub events: Vec<StoredFeeEvent>,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Body for both failure shapes: 400 carries `{"success":false,"error":…}`,
/// 500 carries `{"error":…}` only.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_body_is_exact() {
        let body = serde_json::to_string(&HealthResponse { status: "ok" }).unwrap();
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[test]
    fn bad_request_body_carries_success_flag() {
        let body = serde_json::to_string(&ErrorBody {
            success: Some(false),
            error: "Invalid integrator address".into(),
        })
        .unwrap();
        assert_eq!(
            body,
            r#"{"success":false,"error":"Invalid integrator address"}"#
        );
    }

    #[test]
    fn internal_error_body_has_no_success_flag() {
        let body = serde_json::to_string(&ErrorBody {
            success: None,
            error: "pool closed".into(),
        })
        .unwrap();
        assert_eq!(body, r#"{"error":"pool closed"}"#);
    }
}
