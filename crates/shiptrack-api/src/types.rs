// Wire types for the callable-function protocol.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request envelope: every callable takes its arguments under `data`.
#[derive(Debug, Serialize)]
pub(crate) struct CallableRequest<'a, T: Serialize> {
    pub data: &'a T,
}

/// Response envelope. Success carries `result`; some emulators answer
/// with `data` instead, so both are accepted.
#[derive(Debug, Deserialize)]
pub(crate) struct CallableResponse<T> {
    #[serde(alias = "data")]
    pub result: Option<T>,
    pub error: Option<CallableError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CallableError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Arguments of the smart status update and force refresh functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckRequest {
    pub shipment_id: String,
    pub force: bool,
}

/// Outcome of a remote status check.
///
/// The backend dedups tracking records against what it already stored;
/// `tracking_updates_count` counts only the new ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCheckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub updated: bool,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub status_changed: bool,
    #[serde(default)]
    pub previous_status: Option<String>,
    #[serde(default)]
    pub new_status: Option<String>,
    #[serde(default)]
    pub tracking_updates_count: u32,
    #[serde(default)]
    pub reason: Option<String>,
    /// Carrier-specific payload; `trackingEvents` is read by the core crate.
    #[serde(default)]
    pub carrier_data: Option<Value>,
}

/// `GET /shipments/{id}/events` body.
#[derive(Debug, Deserialize)]
pub(crate) struct EventListResponse {
    #[serde(default)]
    pub events: Vec<Value>,
}

/// `POST /shipments/{id}/events` body.
#[derive(Debug, Serialize)]
pub(crate) struct AppendEventRequest<'a, T: Serialize> {
    pub event: &'a T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AppendEventResponse {
    #[serde(default)]
    pub success: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_response_tolerates_missing_fields() {
        let resp: StatusCheckResponse =
            serde_json::from_value(json!({ "success": true, "skipped": true })).unwrap();
        assert!(resp.success);
        assert!(resp.skipped);
        assert_eq!(resp.tracking_updates_count, 0);
        assert!(resp.carrier_data.is_none());
    }

    #[test]
    fn request_serializes_camel_case() {
        let req = StatusCheckRequest {
            shipment_id: "S1".into(),
            force: true,
        };
        let body = serde_json::to_value(CallableRequest { data: &req }).unwrap();
        assert_eq!(body, json!({ "data": { "shipmentId": "S1", "force": true } }));
    }
}
