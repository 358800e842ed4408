// Callable-function HTTP client
//
// Wraps `reqwest::Client` with the callable envelope: arguments go out as
// `{"data": ...}`, answers come back as `{"result": ...}` or an `error`
// object. The envelope is stripped before the caller sees the payload.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::{Error, body_preview};
use crate::transport::{TransportConfig, join_segments, normalize_base_url};
use crate::types::{CallableRequest, CallableResponse, StatusCheckRequest, StatusCheckResponse};

const SMART_STATUS_UPDATE: &str = "smartStatusUpdate";
const FORCE_STATUS_REFRESH: &str = "forceStatusRefresh";

/// Async client for the backend's callable functions.
pub struct FunctionsClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl FunctionsClient {
    /// Create a client from a `TransportConfig`.
    ///
    /// `base_url` is the functions root, e.g.
    /// `https://us-central1-my-project.cloudfunctions.net`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url).with_timeout(transport.timeout))
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
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

    /// The functions base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Typed functions ─────────────────────────────────────────────

    /// Ask the backend to poll the carrier, honouring its own rate limits.
    pub async fn smart_status_update(
        &self,
        request: &StatusCheckRequest,
    ) -> Result<StatusCheckResponse, Error> {
        self.call(SMART_STATUS_UPDATE, request).await
    }

    /// Poll the carrier unconditionally.
    pub async fn force_status_refresh(
        &self,
        shipment_id: &str,
    ) -> Result<StatusCheckResponse, Error> {
        let request = StatusCheckRequest {
            shipment_id: shipment_id.to_owned(),
            force: true,
        };
        self.call(FORCE_STATUS_REFRESH, &request).await
    }

    // ── Generic invocation ──────────────────────────────────────────

    /// Invoke a callable function by name.
    pub async fn call<Req, Resp>(&self, function: &str, data: &Req) -> Result<Resp, Error>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let url = join_segments(&self.base_url, &[function])?;
        debug!(function, "POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&CallableRequest { data })
            .send()
            .await
            .map_err(|e| Error::from_request(e, self.timeout))?;

        parse_callable(function, resp, self.timeout).await
    }
}

/// Unwrap the callable envelope, mapping HTTP and in-body failures.
async fn parse_callable<T: DeserializeOwned>(
    function: &str,
    resp: reqwest::Response,
    timeout: Option<Duration>,
) -> Result<T, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("function '{function}' rejected credentials (HTTP {status})"),
        });
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = resp
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        return Err(Error::RateLimited { retry_after_secs });
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::from_request(e, timeout))?;

    // Error bodies use the same envelope, so try it before giving up on status.
    let envelope: Result<CallableResponse<T>, _> = serde_json::from_str(&body);

    match envelope {
        Ok(CallableResponse {
            error: Some(err), ..
        }) => Err(Error::Function {
            function: function.to_owned(),
            message: err
                .message
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            status: err.status,
            http_status: status.as_u16(),
        }),
        _ if !status.is_success() => Err(Error::Function {
            function: function.to_owned(),
            message: format!("HTTP {status}: {}", body_preview(&body)),
            status: None,
            http_status: status.as_u16(),
        }),
        Ok(CallableResponse {
            result: Some(result),
            ..
        }) => Ok(result),
        Ok(CallableResponse { result: None, .. }) => Err(Error::Deserialization {
            message: format!("function '{function}' returned no result"),
            body,
        }),
        Err(e) => Err(Error::Deserialization {
            message: format!("{e} (body preview: {:?})", body_preview(&body)),
            body,
        }),
    }
}
