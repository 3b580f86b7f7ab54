//! Explicit build/runtime mode.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Runtime mode of a client process.
///
/// This is always set explicitly (config or env), never inferred from the
/// host name or the presence of a debugger. Only `Development` lets
/// placeholder tokens through to the backend.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    #[default]
    Production,
    Development,
}

impl RunMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunMode::Production => "production",
            RunMode::Development => "development",
        }
    }

    /// Whether placeholder/mock tokens may be attached to outbound requests.
    pub fn allows_placeholders(&self) -> bool {
        matches!(self, RunMode::Development)
    }
}

impl core::fmt::Display for RunMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(RunMode::Production),
            "development" | "dev" => Ok(RunMode::Development),
            other => Err(CoreError::InvalidRunMode(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_long_and_short_names() {
        assert_eq!("production".parse::<RunMode>().unwrap(), RunMode::Production);
        assert_eq!("DEV".parse::<RunMode>().unwrap(), RunMode::Development);
        assert_eq!(" development ".parse::<RunMode>().unwrap(), RunMode::Development);
    }

    #[test]
    fn rejects_unknown_mode() {
        let err = "staging".parse::<RunMode>().unwrap_err();
        assert_eq!(err, CoreError::InvalidRunMode("staging".to_string()));
    }

    #[test]
    fn defaults_to_production() {
        assert_eq!(RunMode::default(), RunMode::Production);
        assert!(!RunMode::default().allows_placeholders());
        assert!(RunMode::Development.allows_placeholders());
    }
}
