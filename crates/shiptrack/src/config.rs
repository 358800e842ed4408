//! CLI configuration: a thin layer over `shiptrack_config` that applies
//! `GlobalOpts` overrides (--functions-url, --token, etc.).

use std::time::Duration;

use secrecy::SecretString;

use shiptrack_core::{BackendConfig, TlsVerification, UpdatePolicy};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use shiptrack_config::{
    Config, Profile, config_path, load_config, load_config_or_default, profile_to_backend_config,
    save_config, store_token,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref()).to_owned()
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, CliError> {
    raw.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Parse a humantime duration flag such as `5s` or `1m 30s`.
pub fn parse_duration_flag(field: &str, raw: &str) -> Result<Duration, CliError> {
    humantime::parse_duration(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("'{raw}': {e}"),
    })
}

/// Build a `BackendConfig` from the config file, profile, and CLI flags.
///
/// Flags win over profile values. Without a profile, both URLs must come
/// from flags or env vars.
pub fn build_backend_config(global: &GlobalOpts) -> Result<BackendConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut config = if let Some(profile) = cfg.profiles.get(&profile_name) {
        profile_to_backend_config(profile, &profile_name, &cfg.defaults)?
    } else if global.profile.is_some() {
        let mut names: Vec<_> = cfg.profiles.keys().cloned().collect();
        names.sort();
        return Err(CliError::ProfileNotFound {
            name: profile_name,
            available: if names.is_empty() {
                "(none)".into()
            } else {
                names.join(", ")
            },
        });
    } else {
        let no_config = || CliError::NoConfig {
            path: config_path().display().to_string(),
        };
        let functions = global.functions_url.as_deref().ok_or_else(no_config)?;
        let store = global.store_url.as_deref().ok_or_else(no_config)?;
        let mut config = BackendConfig::new(
            parse_url("functions-url", functions)?,
            parse_url("store-url", store)?,
        );
        config.timeout = Duration::from_secs(cfg.defaults.timeout);
        if cfg.defaults.insecure {
            config.tls = TlsVerification::DangerAcceptInvalid;
        }
        config
    };

    apply_overrides(&mut config, global)?;
    Ok(config)
}

fn apply_overrides(config: &mut BackendConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if let Some(ref raw) = global.functions_url {
        config.functions_url = parse_url("functions-url", raw)?;
    }
    if let Some(ref raw) = global.store_url {
        config.store_url = parse_url("store-url", raw)?;
    }
    if let Some(ref token) = global.token {
        config.token = Some(SecretString::from(token.clone()));
    }
    if global.insecure {
        config.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    Ok(())
}

/// Policy thresholds for offline commands: the active profile's, or the
/// defaults when no profile is configured.
pub fn active_policy(global: &GlobalOpts) -> Result<UpdatePolicy, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);
    match cfg.profiles.get(&profile_name) {
        Some(profile) => Ok(profile_to_backend_config(profile, &profile_name, &cfg.defaults)?.policy),
        None => Ok(UpdatePolicy::default()),
    }
}
