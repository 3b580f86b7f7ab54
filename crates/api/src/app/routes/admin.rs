//! Admin routes for site settings.
//!
//! Mounted under `/api/admin`, so the availability gate always admits them.
//! Authentication is enforced by the auth middleware; the admin role is
//! checked per handler.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    response::IntoResponse,
    routing::{get, put},
};
use chrono::Utc;

use crate::app::dto::{ApiEnvelope, MaintenanceToggleRequest, SiteUpdateRequest};
use crate::app::errors;
use crate::authz::require_admin;
use crate::context::PrincipalContext;
use crate::settings_store::SettingsStore;

pub fn router() -> Router {
    Router::new()
        .route("/settings", get(get_settings))
        .route("/settings/maintenance", put(set_maintenance))
        .route("/settings/site", put(update_site))
}

async fn get_settings(
    Extension(principal): Extension<PrincipalContext>,
    Extension(store): Extension<Arc<dyn SettingsStore>>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&principal) {
        return resp;
    }

    match store.load_or_create().await {
        Ok(settings) => Json(ApiEnvelope::ok(settings)).into_response(),
        Err(e) => errors::settings_error_to_response(e),
    }
}

async fn set_maintenance(
    Extension(principal): Extension<PrincipalContext>,
    Extension(store): Extension<Arc<dyn SettingsStore>>,
    Json(req): Json<MaintenanceToggleRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&principal) {
        return resp;
    }

    let mut settings = match store.load_or_create().await {
        Ok(s) => s,
        Err(e) => return errors::settings_error_to_response(e),
    };

    settings.set_maintenance(req.maintenance_mode, req.message, Utc::now());
    if let Err(e) = store.save(settings.clone()).await {
        return errors::settings_error_to_response(e);
    }

    tracing::info!(
        principal_id = %principal.principal_id(),
        maintenance_mode = settings.maintenance_mode,
        "maintenance mode updated"
    );
    Json(ApiEnvelope::ok(settings)).into_response()
}

async fn update_site(
    Extension(principal): Extension<PrincipalContext>,
    Extension(store): Extension<Arc<dyn SettingsStore>>,
    Json(req): Json<SiteUpdateRequest>,
) -> axum::response::Response {
    if let Err(resp) = require_admin(&principal) {
        return resp;
    }

    let mut settings = match store.load_or_create().await {
        Ok(s) => s,
        Err(e) => return errors::settings_error_to_response(e),
    };

    if let Err(e) = settings.apply_site_update(req.site_name, req.site_description, Utc::now()) {
        return errors::core_error_to_response(e);
    }
    if let Err(e) = store.save(settings.clone()).await {
        return errors::settings_error_to_response(e);
    }

    tracing::info!(principal_id = %principal.principal_id(), "site metadata updated");
    Json(ApiEnvelope::ok(settings)).into_response()
}
