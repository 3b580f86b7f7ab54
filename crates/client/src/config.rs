//! Client configuration.

use std::time::Duration;

use thiserror::Error;

use bazaar_core::{RouteTable, RunMode};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Timeouts, poll intervals and entry points for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the API, e.g. `https://shop.example.com`.
    pub base_url: String,
    /// Explicit mode; never inferred from the environment the binary runs in.
    pub mode: RunMode,
    pub routes: RouteTable,

    /// Timeout for ordinary requests.
    pub request_timeout: Duration,
    /// Timeout for the token-issuance call; must be shorter than `request_timeout`.
    pub refresh_timeout: Duration,
    /// Client-side race timeout for the status probe.
    pub status_timeout: Duration,

    /// Poll interval below the failure cap.
    pub poll_interval: Duration,
    /// Poll interval at/above the failure cap.
    pub poll_backoff_interval: Duration,
    pub max_consecutive_failures: u32,
    /// Fixed re-poll interval of the full-screen maintenance view.
    pub maintenance_view_interval: Duration,

    pub refresh_path: String,
    pub status_path: String,
    pub admin_entry: String,
    pub general_entry: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            mode: RunMode::Production,
            routes: RouteTable::standard(),
            request_timeout: Duration::from_secs(30),
            refresh_timeout: Duration::from_secs(10),
            status_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_secs(30),
            poll_backoff_interval: Duration::from_secs(120),
            max_consecutive_failures: 3,
            maintenance_view_interval: Duration::from_secs(10),
            refresh_path: "/auth/refresh".to_string(),
            status_path: "/settings/maintenance-status".to_string(),
            admin_entry: "/admin/login".to_string(),
            general_entry: "/login".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    ///
    /// Durations are given in milliseconds.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("BAZAAR_API_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(mode) = lookup("BAZAAR_RUN_MODE") {
            config.mode = mode.parse().map_err(|e: bazaar_core::CoreError| ConfigError::Invalid {
                key: "BAZAAR_RUN_MODE",
                reason: e.to_string(),
            })?;
        }

        let millis = |key: &'static str, slot: &mut Duration| -> Result<(), ConfigError> {
            if let Some(raw) = lookup(key) {
                let ms: u64 = raw.trim().parse().map_err(|e| ConfigError::Invalid {
                    key,
                    reason: format!("{e}"),
                })?;
                *slot = Duration::from_millis(ms);
            }
            Ok(())
        };
        millis("BAZAAR_REQUEST_TIMEOUT_MS", &mut config.request_timeout)?;
        millis("BAZAAR_REFRESH_TIMEOUT_MS", &mut config.refresh_timeout)?;
        millis("BAZAAR_STATUS_TIMEOUT_MS", &mut config.status_timeout)?;
        millis("BAZAAR_POLL_INTERVAL_MS", &mut config.poll_interval)?;
        millis("BAZAAR_POLL_BACKOFF_INTERVAL_MS", &mut config.poll_backoff_interval)?;
        millis("BAZAAR_MAINTENANCE_VIEW_INTERVAL_MS", &mut config.maintenance_view_interval)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_timeout >= self.request_timeout {
            return Err(ConfigError::Invalid {
                key: "refresh_timeout",
                reason: format!(
                    "{:?} must be shorter than request_timeout {:?}",
                    self.refresh_timeout, self.request_timeout
                ),
            });
        }
        if self.max_consecutive_failures == 0 {
            return Err(ConfigError::Invalid {
                key: "max_consecutive_failures",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.poll_interval.is_zero() || self.maintenance_view_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "poll_interval",
                reason: "intervals must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Where the user lands after an irrecoverable session failure.
    pub fn entry_for(&self, admin: bool) -> &str {
        if admin {
            &self.admin_entry
        } else {
            &self.general_entry
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_are_valid() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.mode, RunMode::Production);
        assert!(config.refresh_timeout < config.request_timeout);
        assert_eq!(config.max_consecutive_failures, 3);
    }

    #[test]
    fn reads_mode_and_durations() {
        let config = from_pairs(&[
            ("BAZAAR_API_URL", "https://shop.example.com/"),
            ("BAZAAR_RUN_MODE", "development"),
            ("BAZAAR_POLL_INTERVAL_MS", "1500"),
        ])
        .unwrap();
        assert_eq!(config.base_url, "https://shop.example.com");
        assert_eq!(config.mode, RunMode::Development);
        assert_eq!(config.poll_interval, Duration::from_millis(1500));
    }

    #[test]
    fn refresh_timeout_must_be_shorter() {
        let err = from_pairs(&[("BAZAAR_REFRESH_TIMEOUT_MS", "60000")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "refresh_timeout", .. }));
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(from_pairs(&[("BAZAAR_RUN_MODE", "staging")]).is_err());
        assert!(from_pairs(&[("BAZAAR_POLL_INTERVAL_MS", "soon")]).is_err());
    }

    #[test]
    fn entry_points() {
        let config = ClientConfig::default();
        assert_eq!(config.entry_for(true), "/admin/login");
        assert_eq!(config.entry_for(false), "/login");
    }
}
