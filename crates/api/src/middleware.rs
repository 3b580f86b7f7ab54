use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use bazaar_auth::JwtValidator;

use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

/// Require a valid bearer token; 401 otherwise.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if req.extensions().get::<PrincipalContext>().is_none() {
        let token = extract_bearer(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

        let claims = state
            .jwt
            .validate(token, Utc::now())
            .map_err(|e| {
                tracing::debug!("bearer token rejected: {e}");
                StatusCode::UNAUTHORIZED
            })?;

        req.extensions_mut()
            .insert(PrincipalContext::new(claims.sub, claims.roles));
    }

    Ok(next.run(req).await)
}

/// Attach the principal when a valid bearer token is present; never rejects.
///
/// Runs ahead of the availability gate so admins are recognised on any route.
pub async fn identify_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer(req.headers()) {
        match state.jwt.validate(token, Utc::now()) {
            Ok(claims) => {
                req.extensions_mut()
                    .insert(PrincipalContext::new(claims.sub, claims.roles));
            }
            Err(e) => tracing::trace!("ignoring invalid bearer token: {e}"),
        }
    }

    next.run(req).await
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let header = header.strip_prefix("Bearer ")?;

    let token = header.trim();
    if token.is_empty() {
        return None;
    }

    Some(token)
}
