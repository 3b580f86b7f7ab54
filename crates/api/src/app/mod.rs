//! HTTP API application wiring (Axum router + state).
//!
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, middleware::from_fn_with_state, routing::get};

use bazaar_auth::{Hs256JwtValidator, JwtValidator};
use bazaar_core::{RouteTable, SiteSettings};

use crate::config::ApiConfig;
use crate::gate::{self, AvailabilityGate};
use crate::middleware;
use crate::settings_store::{FileSettingsStore, InMemorySettingsStore, SettingsStore};

pub mod dto;
pub mod errors;
pub mod routes;

/// Everything the router needs.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<dyn SettingsStore>,
    pub jwt: Arc<dyn JwtValidator>,
    pub routes: RouteTable,
    /// See [`ApiConfig::trust_forwarded_prefix`].
    pub trust_forwarded_prefix: bool,
}

impl AppState {
    pub fn from_config(config: &ApiConfig) -> Self {
        let defaults = SiteSettings::new(config.site_name.clone(), config.site_description.clone());
        let settings: Arc<dyn SettingsStore> = match &config.settings_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "using file-backed site settings");
                Arc::new(FileSettingsStore::new(path.clone(), defaults))
            }
            None => {
                tracing::warn!("SETTINGS_PATH not set; site settings are in-memory only");
                Arc::new(InMemorySettingsStore::new(defaults))
            }
        };

        Self {
            settings,
            jwt: Arc::new(Hs256JwtValidator::new(config.jwt_secret.clone().into_bytes())),
            routes: config.route_table(),
            trust_forwarded_prefix: config.trust_forwarded_prefix,
        }
    }
}

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub fn build_app(state: AppState) -> Router {
    let auth_state = middleware::AuthState {
        jwt: state.jwt.clone(),
    };
    let gate = Arc::new(
        AvailabilityGate::new(state.settings.clone(), state.routes.clone())
            .trusting_forwarded_prefix(state.trust_forwarded_prefix),
    );

    // Protected routes: require a valid bearer token.
    let protected = Router::new()
        .route("/whoami", get(routes::system::whoami))
        .nest("/api/admin", routes::admin::router())
        .layer(from_fn_with_state(
            auth_state.clone(),
            middleware::auth_middleware,
        ));

    // Layers run bottom-up: identify first, then the gate, then the handlers.
    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/settings", routes::settings::router())
        .nest("/api/settings", routes::settings::router())
        .merge(protected)
        .layer(Extension(state.settings))
        .layer(from_fn_with_state(gate, gate::maintenance_gate))
        .layer(from_fn_with_state(auth_state, middleware::identify_middleware))
}
