#![allow(clippy::unwrap_used)]
// Integration tests for `FunctionsClient` using wiremock.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shiptrack_api::{Error, FunctionsClient, StatusCheckRequest, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, FunctionsClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/project", server.uri())).unwrap();
    let client = FunctionsClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

fn request(id: &str, force: bool) -> StatusCheckRequest {
    StatusCheckRequest {
        shipment_id: id.into(),
        force,
    }
}

// ── Smart status update ─────────────────────────────────────────────

#[tokio::test]
async fn test_smart_status_update_unwraps_result() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .and(body_json(json!({ "data": { "shipmentId": "SHP-1", "force": false } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": {
                "success": true,
                "updated": true,
                "statusChanged": true,
                "previousStatus": "booked",
                "newStatus": "in_transit",
                "trackingUpdatesCount": 2,
                "carrierData": { "trackingEvents": [] }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client
        .smart_status_update(&request("SHP-1", false))
        .await
        .unwrap();

    assert!(resp.success);
    assert!(resp.status_changed);
    assert_eq!(resp.previous_status.as_deref(), Some("booked"));
    assert_eq!(resp.new_status.as_deref(), Some("in_transit"));
    assert_eq!(resp.tracking_updates_count, 2);
    assert!(resp.carrier_data.is_some());
}

#[tokio::test]
async fn test_force_refresh_hits_distinct_endpoint() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/forceStatusRefresh"))
        .and(body_json(json!({ "data": { "shipmentId": "SHP-2", "force": true } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "success": true, "updated": false }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resp = client.force_status_refresh("SHP-2").await.unwrap();
    assert!(resp.success);
    assert!(!resp.updated);
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let server = MockServer::start().await;
    let transport = TransportConfig::default().with_token("secret-token".to_string().into());
    let client = FunctionsClient::new(Url::parse(&server.uri()).unwrap(), &transport).unwrap();

    Mock::given(method("POST"))
        .and(path("/smartStatusUpdate"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": {} })))
        .expect(1)
        .mount(&server)
        .await;

    client
        .smart_status_update(&request("SHP-3", false))
        .await
        .unwrap();
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_function_error_envelope() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "carrier unavailable", "status": "INTERNAL" }
        })))
        .mount(&server)
        .await;

    let err = client
        .smart_status_update(&request("SHP-4", false))
        .await
        .unwrap_err();

    match err {
        Error::Function {
            ref message,
            ref status,
            http_status,
            ..
        } => {
            assert_eq!(message, "carrier unavailable");
            assert_eq!(status.as_deref(), Some("INTERNAL"));
            assert_eq!(http_status, 500);
        }
        other => panic!("expected Function error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_failure_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let result = client.smart_status_update(&request("SHP-5", false)).await;
    assert!(
        matches!(result, Err(Error::Function { http_status: 502, .. })),
        "expected Function error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.smart_status_update(&request("SHP-6", false)).await;
    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_rate_limited_reads_retry_after() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "17"))
        .mount(&server)
        .await;

    let result = client.smart_status_update(&request("SHP-7", false)).await;
    assert!(
        matches!(result, Err(Error::RateLimited { retry_after_secs: 17 })),
        "expected RateLimited error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_missing_result_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let result = client.smart_status_update(&request("SHP-8", false)).await;
    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_timeout_reports_configured_limit() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/project/smartStatusUpdate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({ "result": { "success": true } })),
        )
        .mount(&server)
        .await;

    let transport = TransportConfig {
        timeout: Duration::from_secs(1),
        ..TransportConfig::default()
    };
    let base_url = Url::parse(&format!("{}/project", server.uri())).unwrap();
    let client = FunctionsClient::new(base_url, &transport).unwrap();

    let err = client
        .smart_status_update(&request("SHP-9", false))
        .await
        .unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "expected Timeout error, got: {err:?}"
    );
    assert_eq!(err.to_string(), "Request timed out after 1s");
}
