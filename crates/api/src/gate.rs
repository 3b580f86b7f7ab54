//! Site-wide availability gate (maintenance mode admission control).
//!
//! Evaluation order, after loading the settings singleton:
//! 1. maintenance off: allow
//! 2. any path representation is Admin-Class: allow (even unauthenticated,
//!    so admin login keeps working)
//! 3. authenticated principal with an admin role: allow
//! 4. public configuration/status namespace: allow
//! 5. otherwise deny with 503 and the branded denial body
//!
//! A failure to load the singleton fails open.

use std::sync::Arc;

use axum::{
    Json,
    body::Body,
    extract::{OriginalUri, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use bazaar_core::{MaintenanceDenial, RouteTable};

use crate::context::PrincipalContext;
use crate::settings_store::SettingsStore;

/// Header set by reverse proxies that strip a mount prefix.
///
/// Clients can send it too, so it is only read behind a trusted proxy.
pub const FORWARDED_PREFIX_HEADER: &str = "x-forwarded-prefix";

/// Why a request was let through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AllowReason {
    MaintenanceOff,
    AdminRoute,
    AdminPrincipal,
    PublicNamespace,
    FailOpen,
}

impl AllowReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            AllowReason::MaintenanceOff => "maintenance_off",
            AllowReason::AdminRoute => "admin_route",
            AllowReason::AdminPrincipal => "admin_principal",
            AllowReason::PublicNamespace => "public_namespace",
            AllowReason::FailOpen => "fail_open",
        }
    }
}

/// Outcome of one admission decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Allow(AllowReason),
    Deny(MaintenanceDenial),
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allow(_))
    }
}

/// The different strings a request's path can be seen as.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestPaths {
    /// Path as received by the server, before any nesting stripped a prefix.
    pub original: String,
    /// Path as seen by the router at the point the gate runs.
    pub routed: String,
    /// Proxy-stripped prefix re-attached to the routed path.
    pub forwarded: Option<String>,
}

impl RequestPaths {
    /// Same path in every representation.
    pub fn single(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            original: path.clone(),
            routed: path,
            forwarded: None,
        }
    }

    /// `trust_forwarded` enables the `X-Forwarded-Prefix` representation.
    pub fn from_request<B>(req: &Request<B>, trust_forwarded: bool) -> Self {
        let routed = req.uri().path().to_string();
        let original = req
            .extensions()
            .get::<OriginalUri>()
            .map(|uri| uri.0.path().to_string())
            .unwrap_or_else(|| routed.clone());
        let forwarded = trust_forwarded
            .then(|| req.headers().get(FORWARDED_PREFIX_HEADER))
            .flatten()
            .and_then(|v| v.to_str().ok())
            .map(|prefix| format!("{}/{}", prefix.trim_end_matches('/'), routed.trim_start_matches('/')));

        Self {
            original,
            routed,
            forwarded,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        [Some(self.original.as_str()), Some(self.routed.as_str()), self.forwarded.as_deref()]
            .into_iter()
            .flatten()
    }
}

/// Admission control against the availability singleton.
pub struct AvailabilityGate {
    store: Arc<dyn SettingsStore>,
    routes: RouteTable,
    trust_forwarded_prefix: bool,
}

impl AvailabilityGate {
    pub fn new(store: Arc<dyn SettingsStore>, routes: RouteTable) -> Self {
        Self {
            store,
            routes,
            trust_forwarded_prefix: false,
        }
    }

    /// Read `X-Forwarded-Prefix` as a path representation. Only for
    /// deployments whose proxy sets the header and drops client copies.
    pub fn trusting_forwarded_prefix(mut self, trust: bool) -> Self {
        self.trust_forwarded_prefix = trust;
        self
    }

    pub async fn admit(&self, paths: &RequestPaths, principal: Option<&PrincipalContext>) -> Admission {
        let settings = match self.store.load_or_create().await {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!(path = %paths.original, "availability gate failing open: {e}");
                return Admission::Allow(AllowReason::FailOpen);
            }
        };

        if !settings.maintenance_mode {
            return Admission::Allow(AllowReason::MaintenanceOff);
        }

        if self.routes.classify_any(paths.iter()).is_admin() {
            return Admission::Allow(AllowReason::AdminRoute);
        }

        if principal.is_some_and(PrincipalContext::is_admin) {
            return Admission::Allow(AllowReason::AdminPrincipal);
        }

        if paths.iter().any(|p| self.routes.is_public(p)) {
            return Admission::Allow(AllowReason::PublicNamespace);
        }

        Admission::Deny(MaintenanceDenial::from_settings(&settings))
    }
}

/// Axum middleware wrapping [`AvailabilityGate::admit`].
pub async fn maintenance_gate(
    State(gate): State<Arc<AvailabilityGate>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let paths = RequestPaths::from_request(&req, gate.trust_forwarded_prefix);
    let principal = req.extensions().get::<PrincipalContext>().cloned();

    match gate.admit(&paths, principal.as_ref()).await {
        Admission::Allow(reason) => {
            tracing::trace!(path = %paths.original, reason = reason.as_str(), "admitted");
            next.run(req).await
        }
        Admission::Deny(denial) => {
            tracing::debug!(path = %paths.original, "request blocked by maintenance mode");
            (StatusCode::SERVICE_UNAVAILABLE, Json(denial)).into_response()
        }
    }
}
