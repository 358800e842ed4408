// Event store HTTP client
//
// Per-shipment, append-only event lists kept in the hosted document store.
// Events travel as raw JSON: the core crate normalizes them record by record
// so one malformed document never poisons the whole list.

use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::{Error, body_preview};
use crate::transport::{TransportConfig, join_segments, normalize_base_url};
use crate::types::{AppendEventRequest, AppendEventResponse, EventListResponse};

/// Raw HTTP client for the event store.
pub struct EventStoreClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl EventStoreClient {
    /// Create a client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url).with_timeout(transport.timeout))
    }

    /// Wrap an existing `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self {
            http,
            base_url: normalize_base_url(base_url),
            timeout: None,
        }
    }

    /// Report request timeouts against this limit. Set by `new`; callers of
    /// `with_client` pass the timeout their client was built with.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The event store base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn events_url(&self, shipment_id: &str) -> Result<Url, Error> {
        join_segments(&self.base_url, &["shipments", shipment_id, "events"])
    }

    /// Fetch the current event list of a shipment, oldest first.
    ///
    /// A shipment without an events document yields an empty list.
    pub async fn list_events(&self, shipment_id: &str) -> Result<Vec<Value>, Error> {
        let url = self.events_url(shipment_id)?;
        debug!("GET {url}");

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout))?;
        let status = resp.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        let body = check_status(resp, self.timeout).await?;

        let list: EventListResponse = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", body_preview(&body)),
                body: body.clone(),
            }
        })?;
        Ok(list.events)
    }

    /// Append one event. Returns the store's success flag.
    ///
    /// The caller guarantees `event` is a fully-formed record; the store
    /// applies it as a union, so re-sending the same record is harmless.
    pub async fn append_event<T: Serialize + Sync>(
        &self,
        shipment_id: &str,
        event: &T,
    ) -> Result<bool, Error> {
        let url = self.events_url(shipment_id)?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&AppendEventRequest { event })
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout))?;
        let body = check_status(resp, self.timeout).await?;

        if body.trim().is_empty() {
            return Ok(true);
        }
        let ack: AppendEventResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body: body.clone(),
            })?;
        Ok(ack.success)
    }
}

/// Map auth and non-2xx answers, returning the body text on success.
async fn check_status(resp: reqwest::Response, timeout: Option<Duration>) -> Result<String, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("event store rejected credentials (HTTP {status})"),
        });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_request(e, timeout))?;
    if !status.is_success() {
        return Err(Error::Store {
            message: format!("HTTP {status}: {}", body_preview(&body)),
            http_status: status.as_u16(),
        });
    }
    Ok(body)
}
