// ── Runtime backend configuration ──
//
// Describes how to reach the backend and how to pace work against it.
// Never touches disk: the config crate builds a `BackendConfig` and
// hands it in.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use shiptrack_api::{TlsMode, TransportConfig};
use url::Url;

use crate::batch::BatchConfig;
use crate::policy::UpdatePolicy;

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    CustomCa(PathBuf),
    /// Skip verification (local emulators with self-signed certs).
    DangerAcceptInvalid,
}

/// Everything needed to talk to one backend deployment.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the callable functions, e.g.
    /// `https://us-central1-acme.cloudfunctions.net`.
    pub functions_url: Url,
    /// Base URL of the event store REST surface.
    pub store_url: Url,
    pub token: Option<SecretString>,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// How often a live subscription re-reads the event store.
    pub subscription_poll_interval: Duration,
    pub policy: UpdatePolicy,
    pub batch: BatchConfig,
}

impl BackendConfig {
    pub fn new(functions_url: Url, store_url: Url) -> Self {
        Self {
            functions_url,
            store_url,
            token: None,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            subscription_poll_interval: Duration::from_secs(10),
            policy: UpdatePolicy::default(),
            batch: BatchConfig::default(),
        }
    }

    /// Transport settings for the API clients.
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            token: self.token.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn transport_mirrors_backend_settings() {
        let mut config = BackendConfig::new(
            "https://fn.example.com".parse().unwrap(),
            "https://store.example.com".parse().unwrap(),
        );
        config.tls = TlsVerification::DangerAcceptInvalid;
        config.timeout = Duration::from_secs(5);
        config.token = Some(SecretString::from("t0k".to_owned()));

        let transport = config.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout, Duration::from_secs(5));
        assert_eq!(transport.token.unwrap().expose_secret(), "t0k");
    }
}
