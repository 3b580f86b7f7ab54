//! Availability singleton and the wire shapes built from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const DEFAULT_SITE_NAME: &str = "Bazaar";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Shop, share and connect";
pub const DEFAULT_MAINTENANCE_MESSAGE: &str =
    "The site is currently undergoing maintenance. Please check back soon.";

/// The per-deployment configuration document holding the maintenance flag.
///
/// Created lazily (get-or-create) on first read and mutated only by the admin
/// settings flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub maintenance_mode: bool,
    pub site_name: String,
    pub site_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintenance_message: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl SiteSettings {
    pub fn new(site_name: impl Into<String>, site_description: impl Into<String>) -> Self {
        Self {
            maintenance_mode: false,
            site_name: site_name.into(),
            site_description: site_description.into(),
            maintenance_message: None,
            updated_at: Utc::now(),
        }
    }

    pub fn status(&self) -> MaintenanceStatus {
        MaintenanceStatus {
            maintenance_mode: self.maintenance_mode,
            site_name: self.site_name.clone(),
            site_description: self.site_description.clone(),
        }
    }

    pub fn summary(&self) -> SiteSummary {
        SiteSummary {
            site_name: self.site_name.clone(),
            site_description: self.site_description.clone(),
        }
    }

    pub fn message(&self) -> &str {
        self.maintenance_message
            .as_deref()
            .unwrap_or(DEFAULT_MAINTENANCE_MESSAGE)
    }

    /// Apply a partial site-metadata update.
    pub fn apply_site_update(
        &mut self,
        site_name: Option<String>,
        site_description: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), CoreError> {
        if let Some(name) = site_name {
            let name = name.trim();
            if name.is_empty() {
                return Err(CoreError::validation("siteName must not be empty"));
            }
            self.site_name = name.to_string();
        }
        if let Some(desc) = site_description {
            self.site_description = desc.trim().to_string();
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_maintenance(&mut self, enabled: bool, message: Option<String>, now: DateTime<Utc>) {
        self.maintenance_mode = enabled;
        if message.is_some() {
            self.maintenance_message = message;
        }
        self.updated_at = now;
    }
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self::new(DEFAULT_SITE_NAME, DEFAULT_SITE_DESCRIPTION)
    }
}

/// Site metadata carried in gate denials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub site_name: String,
    pub site_description: String,
}

/// Payload of the public availability probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceStatus {
    pub maintenance_mode: bool,
    pub site_name: String,
    pub site_description: String,
}

/// `GET /settings/maintenance-status` response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaintenanceStatusResponse {
    pub success: bool,
    pub data: MaintenanceStatus,
}

/// Body of the 503 the gate returns for blocked requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceDenial {
    pub success: bool,
    pub message: String,
    pub maintenance_mode: bool,
    pub settings: SiteSummary,
}

impl MaintenanceDenial {
    pub fn from_settings(settings: &SiteSettings) -> Self {
        Self {
            success: false,
            message: settings.message().to_string(),
            maintenance_mode: true,
            settings: settings.summary(),
        }
    }
}
