//! Runtime settings: environment (and `.env`), then command-line overrides.

use std::time::Duration;

use casegen_completion::{
    ClientConfig, API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECS,
    PLACEHOLDER_API_KEY,
};

/// Endpoint URL override.
pub(crate) const BASE_URL_ENV: &str = "CASEGEN_BASE_URL";
/// Default model override.
pub(crate) const MODEL_ENV: &str = "CASEGEN_MODEL";
/// Outbound timeout override, in whole seconds.
pub(crate) const TIMEOUT_ENV: &str = "CASEGEN_TIMEOUT_SECS";

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub(crate) enum SettingsError {
    #[error("{var} must be a positive whole number of seconds, got '{value}'")]
    InvalidTimeout { var: &'static str, value: String },
}

/// Everything needed to reach the completion endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Settings {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) default_model: String,
    pub(crate) timeout: Duration,
}

impl Settings {
    /// Read settings from the process environment.
    pub(crate) fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; empty values count as unset.
    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let timeout_secs = match get(TIMEOUT_ENV) {
            Some(raw) => parse_timeout(TIMEOUT_ENV, &raw)?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key: get(API_KEY_ENV).unwrap_or_else(|| PLACEHOLDER_API_KEY.to_string()),
            base_url: get(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            default_model: get(MODEL_ENV).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Apply command-line flags on top of the environment.
    pub(crate) fn with_overrides(
        mut self,
        base_url: Option<String>,
        model: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(model) = model {
            self.default_model = model;
        }
        if let Some(secs) = timeout_secs.filter(|s| *s > 0) {
            self.timeout = Duration::from_secs(secs);
        }
        self
    }

    /// True when no real credential was configured.
    pub(crate) fn uses_placeholder_key(&self) -> bool {
        self.api_key == PLACEHOLDER_API_KEY
    }

    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.api_key.clone())
            .with_base_url(self.base_url.clone())
            .with_timeout(self.timeout)
    }
}

fn parse_timeout(var: &'static str, raw: &str) -> Result<u64, SettingsError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(SettingsError::InvalidTimeout {
            var,
            value: raw.to_string(),
        }),
    }
}
