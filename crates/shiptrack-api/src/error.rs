use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the `shiptrack-api` crate.
///
/// Covers every failure mode across both API surfaces: authentication,
/// transport, callable functions, and the event store.
/// `shiptrack-core` maps these into domain errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Token missing, expired, or rejected (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// Backend quota exhausted. Includes retry-after in seconds.
    #[error("Rate limited -- retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Callable functions ──────────────────────────────────────────
    /// Structured error from a callable function.
    #[error("Function '{function}' failed (HTTP {http_status}): {message}")]
    Function {
        function: String,
        message: String,
        /// Canonical status string (`"INTERNAL"`, `"NOT_FOUND"`, ...), if given.
        status: Option<String>,
        http_status: u16,
    },

    // ── Event store ─────────────────────────────────────────────────
    /// Non-success answer from the event store.
    #[error("Event store error (HTTP {http_status}): {message}")]
    Store { message: String, http_status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Map a failed request, naming the configured timeout when it expired.
    pub(crate) fn from_request(err: reqwest::Error, timeout: Option<Duration>) -> Self {
        match timeout {
            Some(limit) if err.is_timeout() => Self::Timeout {
                timeout_secs: limit.as_secs(),
            },
            _ => Self::Transport(err),
        }
    }
}

/// Trim a response body to a short preview for error messages.
pub(crate) fn body_preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
