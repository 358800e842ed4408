//! Configuration for the shiptrack CLI.
//!
//! TOML profiles, credential resolution (env var, keyring, plaintext),
//! and translation to `shiptrack_core::BackendConfig`. The CLI layers its
//! flag overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shiptrack_core::{BackendConfig, BatchConfig, TlsVerification, UpdatePolicy};

const KEYRING_SERVICE: &str = "shiptrack";
const ENV_PREFIX: &str = "SHIPTRACK_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the active profile: explicit choice, else the configured
    /// default, else `"default"`.
    pub fn profile_name<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .or(self.default_profile.as_deref())
            .unwrap_or("default")
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named backend deployment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// Callable functions base URL.
    pub functions_url: String,

    /// Event store base URL.
    pub store_url: String,

    /// Bearer token (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Event subscription poll interval, e.g. `"10s"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_interval: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<PolicySettings>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch: Option<BatchSettings>,
}

/// Policy threshold overrides as humantime strings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PolicySettings {
    pub min_age: Option<String>,
    pub min_check_spacing: Option<String>,
    pub active_transit_interval: Option<String>,
    pub default_interval: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct BatchSettings {
    pub chunk_size: Option<usize>,
    pub cooldown: Option<String>,
}

// ── Config file path ────────────────────────────────────────────────

pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "shiptrack", "shiptrack").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("shiptrack");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Loading / saving ────────────────────────────────────────────────

/// Load config from the canonical path plus `SHIPTRACK_` env overrides.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from a specific file plus env overrides. Nested keys use
/// a double underscore: `SHIPTRACK_PROFILES__PROD__TIMEOUT=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    Ok(figment.extract()?)
}

pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, toml::to_string_pretty(cfg)?)?;
    Ok(())
}

// ── Credentials ─────────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/token"))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Store a profile's token in the system keyring.
pub fn store_token(profile_name: &str, token: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?
        .set_password(token)
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

/// Resolve the bearer token: `token_env` variable, then keyring, then
/// plaintext. `None` when nothing is configured (e.g. local emulators).
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.token.clone().map(SecretString::from)
}

// ── Translation ─────────────────────────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

fn parse_duration(field: &str, raw: Option<&String>, fallback: Duration) -> Result<Duration, ConfigError> {
    raw.map_or(Ok(fallback), |raw| {
        humantime::parse_duration(raw).map_err(|e| ConfigError::Validation {
            field: field.into(),
            reason: format!("'{raw}': {e}"),
        })
    })
}

fn policy_from(settings: Option<&PolicySettings>) -> Result<UpdatePolicy, ConfigError> {
    let base = UpdatePolicy::default();
    let Some(s) = settings else {
        return Ok(base);
    };
    Ok(UpdatePolicy {
        min_age: parse_duration("policy.min_age", s.min_age.as_ref(), base.min_age)?,
        min_check_spacing: parse_duration(
            "policy.min_check_spacing",
            s.min_check_spacing.as_ref(),
            base.min_check_spacing,
        )?,
        active_transit_interval: parse_duration(
            "policy.active_transit_interval",
            s.active_transit_interval.as_ref(),
            base.active_transit_interval,
        )?,
        default_interval: parse_duration(
            "policy.default_interval",
            s.default_interval.as_ref(),
            base.default_interval,
        )?,
    })
}

fn batch_from(settings: Option<&BatchSettings>) -> Result<BatchConfig, ConfigError> {
    let base = BatchConfig::default();
    let Some(s) = settings else {
        return Ok(base);
    };
    let chunk_size = s.chunk_size.unwrap_or(base.chunk_size);
    if chunk_size == 0 {
        return Err(ConfigError::Validation {
            field: "batch.chunk_size".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(BatchConfig {
        chunk_size,
        cooldown: parse_duration("batch.cooldown", s.cooldown.as_ref(), base.cooldown)?,
    })
}

/// Build a `BackendConfig` from a profile with no CLI overrides.
pub fn profile_to_backend_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<BackendConfig, ConfigError> {
    let mut config = BackendConfig::new(
        parse_url("functions_url", &profile.functions_url)?,
        parse_url("store_url", &profile.store_url)?,
    );

    config.token = resolve_token(profile, profile_name);
    config.tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca) = profile.ca_cert {
        TlsVerification::CustomCa(ca.clone())
    } else {
        TlsVerification::SystemDefaults
    };
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.subscription_poll_interval = parse_duration(
        "poll_interval",
        profile.poll_interval.as_ref(),
        config.subscription_poll_interval,
    )?;
    config.policy = policy_from(profile.policy.as_ref())?;
    config.batch = batch_from(profile.batch.as_ref())?;

    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    fn profile() -> Profile {
        Profile {
            functions_url: "https://fn.example.com".into(),
            store_url: "https://store.example.com/v1".into(),
            ..Profile::default()
        }
    }

    #[test]
    fn loads_profiles_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "prod"

[profiles.prod]
functions_url = "https://fn.example.com"
store_url = "https://store.example.com"
timeout = 12
poll_interval = "15s"

[profiles.prod.policy]
min_check_spacing = "10m"

[profiles.prod.batch]
chunk_size = 3
"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.profile_name(None), "prod");
        let prod = config.profile("prod").unwrap();
        assert_eq!(prod.timeout, Some(12));

        let backend = profile_to_backend_config(prod, "prod", &config.defaults).unwrap();
        assert_eq!(backend.timeout, Duration::from_secs(12));
        assert_eq!(backend.subscription_poll_interval, Duration::from_secs(15));
        assert_eq!(backend.policy.min_check_spacing, Duration::from_secs(600));
        assert_eq!(backend.policy.min_age, Duration::from_secs(120));
        assert_eq!(backend.batch.chunk_size, 3);
        assert_eq!(backend.batch.cooldown, Duration::from_secs(1));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.profile_name(Some("x")), "x");
        assert!(matches!(
            config.profile("default"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn save_then_load_preserves_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.profiles.insert("default".into(), profile());

        save_config_to(&config, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles, config.profiles);
    }

    #[test]
    fn tls_selection() {
        let defaults = Defaults::default();
        let backend = profile_to_backend_config(&profile(), "t", &defaults).unwrap();
        assert_eq!(backend.tls, TlsVerification::SystemDefaults);

        let mut p = profile();
        p.ca_cert = Some(PathBuf::from("/etc/ca.pem"));
        let backend = profile_to_backend_config(&p, "t", &defaults).unwrap();
        assert_eq!(backend.tls, TlsVerification::CustomCa("/etc/ca.pem".into()));

        p.insecure = Some(true);
        let backend = profile_to_backend_config(&p, "t", &defaults).unwrap();
        assert_eq!(backend.tls, TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn token_from_named_env_var() {
        let mut p = profile();
        p.token_env = Some("PATH".into());
        p.token = Some("plaintext".into());
        let token = resolve_token(&p, "env-test").unwrap();
        assert_eq!(token.expose_secret(), std::env::var("PATH").unwrap());
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut p = profile();
        p.functions_url = "not a url".into();
        let err = profile_to_backend_config(&p, "t", &Defaults::default()).unwrap_err();
        assert!(err.to_string().starts_with("invalid functions_url"));

        let mut p = profile();
        p.batch = Some(BatchSettings {
            chunk_size: Some(0),
            cooldown: None,
        });
        assert!(profile_to_backend_config(&p, "t", &Defaults::default()).is_err());

        let mut p = profile();
        p.poll_interval = Some("soonish".into());
        let err = profile_to_backend_config(&p, "t", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "poll_interval"));
    }
}
