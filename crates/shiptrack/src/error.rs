//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use shiptrack_config::ConfigError;
use shiptrack_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const UPDATE_FAILED: i32 = 4;
    pub const RATE_LIMITED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(shiptrack::connection_failed),
        help(
            "Check that the functions and event store URLs are correct and reachable.\n\
             Reason: {reason}"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {seconds}s")]
    #[diagnostic(
        code(shiptrack::timeout),
        help("Increase the timeout with --timeout or in your profile.")
    )]
    Timeout { seconds: u64 },

    #[error("Rate limited by the backend")]
    #[diagnostic(
        code(shiptrack::rate_limited),
        help("Retry after {retry_after_secs}s, or lower batch.chunk_size in your profile.")
    )]
    RateLimited { retry_after_secs: u64 },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(shiptrack::auth_failed),
        help(
            "Verify the bearer token for profile '{profile}'.\n\
             Run: shiptrack config set-token --profile {profile}"
        )
    )]
    AuthFailed { profile: String, message: String },

    // ── Remote ───────────────────────────────────────────────────────
    #[error("Function {function} failed: {message}")]
    #[diagnostic(code(shiptrack::remote))]
    Remote { function: String, message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(shiptrack::api_error))]
    Api { message: String },

    #[error("{message}")]
    #[diagnostic(
        code(shiptrack::update_failed),
        help("Retry later, or use `shiptrack refresh` to bypass the policy gate.")
    )]
    UpdateFailed { message: String },

    #[error("Event store declined the event for shipment '{shipment_id}'")]
    #[diagnostic(code(shiptrack::append_declined))]
    AppendDeclined { shipment_id: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Shipment record has no id")]
    #[diagnostic(
        code(shiptrack::missing_id),
        help("The shipment JSON needs an \"id\" field.")
    )]
    MissingShipmentId,

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(shiptrack::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(shiptrack::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: shiptrack config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(shiptrack::no_config),
        help(
            "Create a profile with: shiptrack config init\n\
             Or pass --functions-url and --store-url.\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(shiptrack::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    #[diagnostic(code(shiptrack::json), help("Check the JSON input and try again."))]
    Json(#[from] serde_json::Error),

    #[error("YAML encoding failed: {0}")]
    #[diagnostic(code(shiptrack::yaml))]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(shiptrack::internal))]
    Internal(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::RateLimited { .. } => exit_code::RATE_LIMITED,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::UpdateFailed { .. } | Self::AppendDeclined { .. } => exit_code::UPDATE_FAILED,
            Self::MissingShipmentId
            | Self::Validation { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed {
                profile: "current".into(),
                message,
            },
            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },
            CoreError::RateLimited { retry_after_secs } => CliError::RateLimited { retry_after_secs },
            CoreError::MissingShipmentId => CliError::MissingShipmentId,
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Remote {
                function, message, ..
            } => CliError::Remote { function, message },
            CoreError::Api { message, .. } | CoreError::Config { message } => CliError::Api { message },
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}
