#![allow(clippy::unwrap_used)]
// Integration tests for `EventStoreClient` using wiremock.

use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shiptrack_api::{Error, EventStoreClient};

async fn setup() -> (MockServer, EventStoreClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&format!("{}/v1", server.uri())).unwrap();
    let client = EventStoreClient::with_client(reqwest::Client::new(), base_url);
    (server, client)
}

#[tokio::test]
async fn test_list_events() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/shipments/SHP-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [
                { "id": "e1", "eventType": "created", "timestamp": "2024-01-01T00:00:00Z" },
                { "id": "e2", "eventType": "rate_selected", "timestamp": 1_704_067_200_000_i64 }
            ]
        })))
        .mount(&server)
        .await;

    let events = client.list_events("SHP-1").await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["id"], "e1");
    assert_eq!(events[1]["eventType"], "rate_selected");
}

#[tokio::test]
async fn test_list_events_missing_document_is_empty() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/shipments/NOPE/events"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let events = client.list_events("NOPE").await.unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_list_events_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v1/shipments/SHP-1/events"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let result = client.list_events("SHP-1").await;
    assert!(
        matches!(result, Err(Error::Store { http_status: 503, .. })),
        "expected Store error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_append_event() {
    let (server, client) = setup().await;
    let event = json!({ "id": "e3", "eventType": "user_action", "title": "Label printed" });

    Mock::given(method("POST"))
        .and(path("/v1/shipments/SHP-1/events"))
        .and(body_json(json!({ "event": event.clone() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.append_event("SHP-1", &event).await.unwrap());
}

#[tokio::test]
async fn test_append_event_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/shipments/SHP-1/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
        .mount(&server)
        .await;

    assert!(!client.append_event("SHP-1", &json!({})).await.unwrap());
}

#[tokio::test]
async fn test_append_event_forbidden() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v1/shipments/SHP-1/events"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = client.append_event("SHP-1", &json!({})).await;
    assert!(matches!(result, Err(Error::Authentication { .. })));
}

#[tokio::test]
async fn test_list_events_timeout_names_the_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/shipments/SHP-9/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_secs(5))
                .set_body_json(json!({ "events": [] })),
        )
        .mount(&server)
        .await;

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    let base_url = Url::parse(&format!("{}/v1", server.uri())).unwrap();
    let client = EventStoreClient::with_client(http, base_url).with_timeout(Duration::from_secs(1));

    let err = client.list_events("SHP-9").await.unwrap_err();
    assert!(
        matches!(err, Error::Timeout { timeout_secs: 1 }),
        "expected Timeout error, got: {err:?}"
    );
}
