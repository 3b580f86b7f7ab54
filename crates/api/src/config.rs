//! Server configuration, read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use bazaar_core::{MatchRule, RouteTable};
use bazaar_core::settings::{DEFAULT_SITE_DESCRIPTION, DEFAULT_SITE_NAME};

const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub site_name: String,
    pub site_description: String,
    /// Where the settings singleton is persisted; in-memory when unset.
    pub settings_path: Option<PathBuf>,
    /// Extra Admin-Class rules (`ADMIN_ROUTE_RULES=prefix:/staff,suffix:/ops`).
    pub extra_admin_rules: Vec<MatchRule>,
    /// Honour `X-Forwarded-Prefix` in the availability gate. Off unless a
    /// proxy in front of the server owns that header.
    pub trust_forwarded_prefix: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            site_description: DEFAULT_SITE_DESCRIPTION.to_string(),
            settings_path: None,
            extra_admin_rules: Vec::new(),
            trust_forwarded_prefix: false,
        }
    }
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("BIND_ADDR") {
            config.bind_addr = addr.parse().map_err(|e| ConfigError::Invalid {
                key: "BIND_ADDR",
                reason: format!("{e}"),
            })?;
        }

        match lookup("JWT_SECRET") {
            Some(secret) if !secret.trim().is_empty() => config.jwt_secret = secret,
            _ => tracing::warn!("JWT_SECRET not set; using insecure dev default"),
        }

        if let Some(name) = lookup("SITE_NAME").filter(|n| !n.trim().is_empty()) {
            config.site_name = name;
        }
        if let Some(desc) = lookup("SITE_DESCRIPTION") {
            config.site_description = desc;
        }
        config.settings_path = lookup("SETTINGS_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        if let Some(rules) = lookup("ADMIN_ROUTE_RULES") {
            config.extra_admin_rules = rules
                .split(',')
                .map(str::trim)
                .filter(|r| !r.is_empty())
                .map(MatchRule::parse)
                .collect::<Result<_, _>>()
                .map_err(|e| ConfigError::Invalid {
                    key: "ADMIN_ROUTE_RULES",
                    reason: e.to_string(),
                })?;
        }

        if let Some(flag) = lookup("TRUST_FORWARDED_PREFIX") {
            config.trust_forwarded_prefix = match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "" | "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::Invalid {
                        key: "TRUST_FORWARDED_PREFIX",
                        reason: format!("expected a boolean, got {other:?}"),
                    });
                }
            };
        }

        Ok(config)
    }

    pub fn route_table(&self) -> RouteTable {
        self.extra_admin_rules
            .iter()
            .cloned()
            .fold(RouteTable::standard(), RouteTable::with_admin_rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_when_env_is_empty() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.jwt_secret, DEV_JWT_SECRET);
        assert!(config.settings_path.is_none());
        assert!(!config.trust_forwarded_prefix);
    }

    #[test]
    fn forwarded_prefix_trust_is_opt_in() {
        let on = ApiConfig::from_lookup(lookup(&[("TRUST_FORWARDED_PREFIX", "true")])).unwrap();
        assert!(on.trust_forwarded_prefix);
        let off = ApiConfig::from_lookup(lookup(&[("TRUST_FORWARDED_PREFIX", "0")])).unwrap();
        assert!(!off.trust_forwarded_prefix);
        assert!(ApiConfig::from_lookup(lookup(&[("TRUST_FORWARDED_PREFIX", "maybe")])).is_err());
    }

    #[test]
    fn reads_values() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("JWT_SECRET", "s3cret"),
            ("SITE_NAME", "Market"),
            ("SETTINGS_PATH", "/var/lib/bazaar/settings.json"),
            ("ADMIN_ROUTE_RULES", "prefix:/staff, suffix:/ops"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(config.site_name, "Market");
        assert_eq!(config.extra_admin_rules.len(), 2);
        assert!(config.route_table().classify("/staff/queue").is_admin());
        assert!(config.route_table().classify("/tools/ops").is_admin());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ApiConfig::from_lookup(lookup(&[("BIND_ADDR", "nope")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("ADMIN_ROUTE_RULES", "regex:.*")])).is_err());
    }
}
