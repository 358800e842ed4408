//! Async Rust client for the shipment backend.
//!
//! Two API surfaces, both plain JSON over HTTPS:
//!
//! - **[`FunctionsClient`]**: serverless callable functions. Requests are
//!   wrapped as `{"data": ...}` and answers arrive as `{"result": ...}` or
//!   `{"error": {"message", "status"}}`.
//! - **[`EventStoreClient`]**: the append-only per-shipment event list kept
//!   in the hosted document store.
//!
//! Neither client retries. Timeouts and TLS come from a shared
//! [`TransportConfig`].

pub mod error;
pub mod functions;
pub mod store;
pub mod transport;
pub mod types;

pub use error::Error;
pub use functions::FunctionsClient;
pub use store::EventStoreClient;
pub use transport::{TlsMode, TransportConfig};
pub use types::{StatusCheckRequest, StatusCheckResponse};
