//! Request/response DTOs for the settings surface.

use serde::{Deserialize, Serialize};

use bazaar_core::SiteSettings;

/// `{ success: true, data: ... }` envelope used by every settings endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiEnvelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Public view of the settings document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicSettingsDto {
    pub site_name: String,
    pub site_description: String,
    pub maintenance_mode: bool,
    pub maintenance_message: String,
}

impl From<&SiteSettings> for PublicSettingsDto {
    fn from(s: &SiteSettings) -> Self {
        Self {
            site_name: s.site_name.clone(),
            site_description: s.site_description.clone(),
            maintenance_mode: s.maintenance_mode,
            maintenance_message: s.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MaintenanceToggleRequest {
    pub maintenance_mode: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteUpdateRequest {
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
}
