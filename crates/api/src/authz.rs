//! Role guard for administrative handlers.
//!
//! Authentication is the middleware's job; this only decides whether an
//! already-identified principal may use an admin operation.

use axum::http::StatusCode;
use axum::response::Response;

use crate::app::errors::json_error;
use crate::context::PrincipalContext;

/// Reject non-admin principals with 403.
pub fn require_admin(principal: &PrincipalContext) -> Result<(), Response> {
    if principal.is_admin() {
        Ok(())
    } else {
        tracing::debug!(principal_id = %principal.principal_id(), "admin operation refused");
        Err(json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            "administrator role required",
        ))
    }
}
