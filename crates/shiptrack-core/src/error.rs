// ── Core error types ──
//
// Domain-level errors. Callers of the core crate never match on HTTP
// status codes; `From<shiptrack_api::Error>` folds transport failures
// into these variants.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Backend request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Rate limited by backend, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Shipment id is missing")]
    MissingShipmentId,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("Function {function} failed: {message}")]
    Remote {
        function: String,
        message: String,
        /// Canonical status string from the function, if any.
        status: Option<String>,
    },

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Worth retrying later without changing anything.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::RateLimited { .. } => true,
            Self::Api { status, .. } => status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}

impl From<shiptrack_api::Error> for CoreError {
    fn from(err: shiptrack_api::Error) -> Self {
        use shiptrack_api::Error as Api;
        match err {
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::Transport(ref e) => {
                // Timeouts with a known limit arrive as `Api::Timeout`.
                if e.is_timeout() || e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Timeout { timeout_secs } => CoreError::Timeout { timeout_secs },
            Api::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::RateLimited { retry_after_secs } => CoreError::RateLimited { retry_after_secs },
            Api::Function {
                function,
                message,
                status,
                ..
            } => CoreError::Remote {
                function,
                message,
                status,
            },
            Api::Store {
                message,
                http_status,
            } => CoreError::Api {
                message,
                status: Some(http_status),
            },
            Api::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}
