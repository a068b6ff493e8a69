//! Explicit client and poll configuration.

use std::env;
use std::fmt::{Debug, Formatter};
use std::time::Duration;

use crate::backoff::Backoff;
use crate::ValidationError;

pub const DEFAULT_BASE_URL: &str = "https://api.mobileapptracking.com/v2";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);
pub const DEFAULT_SLEEP_SECONDS: u64 = 10;
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;

const API_KEY_VAR: &str = "TUNE_REPORTING_API_KEY";
const BASE_URL_VAR: &str = "TUNE_REPORTING_BASE_URL";
const TIMEOUT_VAR: &str = "TUNE_REPORTING_TIMEOUT_MS";

/// Connection settings handed to the transport.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
    api_key: String,
    request_timeout: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ValidationError> {
        let api_key = api_key.into().trim().to_owned();
        if api_key.is_empty() {
            return Err(ValidationError::EmptyApiKey);
        }

        Ok(Self {
            base_url: String::from(DEFAULT_BASE_URL),
            api_key,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Reads `TUNE_REPORTING_API_KEY`, `TUNE_REPORTING_BASE_URL` and
    /// `TUNE_REPORTING_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ValidationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(lookup(API_KEY_VAR).unwrap_or_default())?;

        if let Some(base_url) = lookup(BASE_URL_VAR).filter(|value| !value.trim().is_empty()) {
            config = config.with_base_url(base_url)?;
        }

        if let Some(raw) = lookup(TIMEOUT_VAR).filter(|value| !value.trim().is_empty()) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|millis| *millis > 0)
                .ok_or(ValidationError::InvalidConfig {
                    name: TIMEOUT_VAR,
                    value: raw.clone(),
                })?;
            config = config.with_request_timeout(Duration::from_millis(millis));
        }

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Result<Self, ValidationError> {
        let base_url = base_url.into();
        let trimmed = base_url.trim().trim_end_matches('/');
        if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
            return Err(ValidationError::InvalidConfig {
                name: "base_url",
                value: base_url,
            });
        }
        self.base_url = trimmed.to_owned();
        Ok(self)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

impl Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"***")
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Export polling budget.
///
/// A zero `timeout` means the poller waits until the job reaches a terminal status.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub backoff: Backoff,
    pub timeout: Duration,
    pub verbose: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLEEP_SECONDS, DEFAULT_TIMEOUT_SECONDS, false)
    }
}

impl PollConfig {
    pub const fn new(sleep_seconds: u64, timeout_seconds: u64, verbose: bool) -> Self {
        Self {
            backoff: Backoff::fixed_seconds(sleep_seconds),
            timeout: Duration::from_secs(timeout_seconds),
            verbose,
        }
    }

    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    pub const fn is_unbounded(&self) -> bool {
        self.timeout.is_zero()
    }

    /// A bounded budget needs a non-zero delay, otherwise it never runs out.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.is_unbounded() && self.backoff.is_zero() {
            return Err(ValidationError::InvalidConfig {
                name: "sleep_seconds",
                value: String::from("0"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn env_defaults_apply_when_only_key_is_set() {
        let config =
            ClientConfig::from_lookup(lookup(&[(API_KEY_VAR, "secret")])).expect("valid config");

        assert_eq!(config.api_key(), "secret");
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        assert_eq!(config.request_timeout(), DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn env_overrides_are_applied() {
        let config = ClientConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (BASE_URL_VAR, "http://localhost:8080/v2/"),
            (TIMEOUT_VAR, "1500"),
        ]))
        .expect("valid config");

        assert_eq!(config.base_url(), "http://localhost:8080/v2");
        assert_eq!(config.request_timeout(), Duration::from_millis(1500));
    }

    #[test]
    fn missing_key_and_bad_timeout_are_rejected() {
        assert_eq!(
            ClientConfig::from_lookup(lookup(&[])),
            Err(ValidationError::EmptyApiKey)
        );
        assert!(matches!(
            ClientConfig::from_lookup(lookup(&[(API_KEY_VAR, "k"), (TIMEOUT_VAR, "soon")])),
            Err(ValidationError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn debug_output_hides_the_key() {
        let config = ClientConfig::new("secret").expect("valid key");
        assert!(!format!("{config:?}").contains("secret"));
    }

    #[test]
    fn poll_defaults() {
        let config = PollConfig::default();
        assert_eq!(config.backoff, Backoff::fixed_seconds(10));
        assert_eq!(config.timeout, Duration::from_secs(300));
        assert!(!config.verbose);
        assert!(PollConfig::new(1, 0, false).is_unbounded());
    }

    #[test]
    fn bounded_budget_rejects_zero_sleep() {
        assert!(matches!(
            PollConfig::new(0, 30, false).validate(),
            Err(ValidationError::InvalidConfig { name: "sleep_seconds", .. })
        ));
        assert!(PollConfig::new(0, 0, false).validate().is_ok());
        assert!(PollConfig::new(1, 30, false).validate().is_ok());
    }
}
