//! Public configuration/status namespace.
//!
//! Reachable in maintenance mode and without authentication, so clients can
//! poll for recovery.

use std::sync::Arc;

use axum::{Extension, Json, Router, response::IntoResponse, routing::get};

use bazaar_core::MaintenanceStatusResponse;

use crate::app::dto::{ApiEnvelope, PublicSettingsDto};
use crate::app::errors;
use crate::settings_store::SettingsStore;

pub fn router() -> Router {
    Router::new()
        .route("/", get(public_settings))
        .route("/maintenance-status", get(maintenance_status))
}

pub async fn maintenance_status(
    Extension(store): Extension<Arc<dyn SettingsStore>>,
) -> axum::response::Response {
    match store.load_or_create().await {
        Ok(settings) => Json(MaintenanceStatusResponse {
            success: true,
            data: settings.status(),
        })
        .into_response(),
        Err(e) => errors::settings_error_to_response(e),
    }
}

pub async fn public_settings(
    Extension(store): Extension<Arc<dyn SettingsStore>>,
) -> axum::response::Response {
    match store.load_or_create().await {
        Ok(settings) => Json(ApiEnvelope::ok(PublicSettingsDto::from(&settings))).into_response(),
        Err(e) => errors::settings_error_to_response(e),
    }
}
