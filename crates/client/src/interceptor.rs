//! Failure interceptor: refresh-and-retry on 401.
//!
//! Per request: `Idle -> AwaitingRefresh -> {Retrying | Failed}`.
//! A request is refreshed and replayed at most once. A failed refresh purges
//! the whole credential set (compare-and-clear on the refresh credential that
//! failed) and redirects to the entry point for the route's class.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

use bazaar_core::{RouteClass, is_placeholder, is_real};

use crate::config::{ClientConfig, ConfigError};
use crate::decorator::RequestDecorator;
use crate::error::{ClientError, Notifier, TracingNotifier};
use crate::navigator::Navigator;
use crate::poller::SettingsSignal;
use crate::request::{ApiRequest, RequestBody};
use crate::session::{CredentialSlots, SessionStore, SessionStoreError};
use crate::transport::{ApiResponse, Transport, TransportError};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    AwaitingRefresh,
    Retrying,
    Failed,
}

impl RefreshPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshPhase::Idle => "idle",
            RefreshPhase::AwaitingRefresh => "awaiting_refresh",
            RefreshPhase::Retrying => "retrying",
            RefreshPhase::Failed => "failed",
        }
    }
}

#[derive(Debug, Error)]
enum RefreshFailure {
    #[error("no refresh credential")]
    MissingCredential,

    #[error("refresh credential is a placeholder")]
    PlaceholderCredential,

    #[error("refresh call failed: {0}")]
    Transport(#[from] TransportError),

    #[error("refresh rejected with {0}")]
    Rejected(StatusCode),

    #[error("refresh response carried no access token")]
    Malformed,

    #[error("refresh issued a placeholder access token")]
    PlaceholderIssued,

    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

/// Tokens pulled out of a refresh response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IssuedTokens {
    pub access: String,
    pub refresh: Option<String>,
}

/// Accepts `{accessToken}`, `{tokens:{..}}`, `{data:{..}}` and `{data:{tokens:{..}}}`.
pub(crate) fn extract_tokens(body: &Value) -> Option<IssuedTokens> {
    let candidates = [
        Some(body),
        body.get("tokens"),
        body.get("data"),
        body.get("data").and_then(|d| d.get("tokens")),
    ];

    candidates.into_iter().flatten().find_map(|obj| {
        let access = obj
            .get("accessToken")
            .or_else(|| obj.get("access_token"))
            .and_then(Value::as_str)
            .filter(|t| !t.trim().is_empty())?;
        let refresh = obj
            .get("refreshToken")
            .or_else(|| obj.get("refresh_token"))
            .and_then(Value::as_str)
            .map(str::to_string);
        Some(IssuedTokens {
            access: access.to_string(),
            refresh,
        })
    })
}

enum Purge {
    Purged,
    AlreadyEmpty,
    /// Another request already rotated the refresh credential.
    Superseded,
}

/// Authenticated API client with transparent refresh-and-retry.
pub struct ApiClient {
    config: ClientConfig,
    decorator: RequestDecorator,
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    settings_signal: Option<SettingsSignal>,
    refreshes: AtomicU64,
}

impl ApiClient {
    /// Fails when `config` does not pass [`ClientConfig::validate`].
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let decorator = RequestDecorator::new(config.routes.clone(), config.mode);
        Ok(Self {
            config,
            decorator,
            transport,
            session,
            navigator,
            notifier: Arc::new(TracingNotifier),
            settings_signal: None,
            refreshes: AtomicU64::new(0),
        })
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Emit on `signal` after any successful write to a settings route.
    pub fn with_settings_signal(mut self, signal: SettingsSignal) -> Self {
        self.settings_signal = Some(signal);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.session
    }

    /// Number of refresh calls issued so far.
    pub fn refresh_count(&self) -> u64 {
        self.refreshes.load(Ordering::Relaxed)
    }

    /// Send `req`, refreshing and replaying once on a 401.
    ///
    /// The caller only ever sees the final response.
    pub async fn send(&self, mut req: ApiRequest) -> Result<ApiResponse, ClientError> {
        let decoration = self.decorator.decorate(&mut req, &self.session.snapshot());
        let class = decoration.class;

        if decoration.needs_refresh {
            // A proactive refresh uses up this request's single refresh.
            req.mark_retried();
            if let Err(e) = self.refresh_or_fail(&req, class).await {
                return Err(self.surface(&req, e));
            }
            self.decorator.decorate(&mut req, &self.session.snapshot());
        }

        let mut res = match self.execute(&req).await {
            Ok(res) => res,
            Err(e) => return Err(self.surface(&req, e.into())),
        };

        if res.status == StatusCode::UNAUTHORIZED && self.intercepts(&req) {
            req.mark_retried();
            if let Err(e) = self.refresh_or_fail(&req, class).await {
                return Err(self.surface(&req, e));
            }
            self.decorator.decorate(&mut req, &self.session.snapshot());
            res = match self.execute(&req).await {
                Ok(res) => res,
                Err(e) => return Err(self.surface(&req, e.into())),
            };
        }

        if !res.status.is_success() {
            let err = ClientError::from_response(&res);
            return Err(self.surface(&req, err));
        }

        if req.method != Method::GET && req.route_path().contains("/settings") {
            if let Some(signal) = &self.settings_signal {
                signal.notify_changed();
            }
        }
        Ok(res)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let res = self.send(ApiRequest::get(path)).await?;
        Ok(res.json()?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let res = self.send(ApiRequest::post(path).json(body)?).await?;
        Ok(res.json()?)
    }

    /// Explicit logout: purge everything and go to the entry point.
    pub fn logout(&self) -> Result<(), ClientError> {
        let admin = self.routes_admin_view();
        let cleared = self.session.clear();
        self.navigator.redirect_once(self.config.entry_for(admin));
        cleared?;
        tracing::info!("session cleared by logout");
        Ok(())
    }

    fn routes_admin_view(&self) -> bool {
        self.config
            .routes
            .classify(&self.navigator.current_location())
            .is_admin()
    }

    fn intercepts(&self, req: &ApiRequest) -> bool {
        !req.is_retried() && req.route_path() != self.config.refresh_path
    }

    async fn execute(&self, req: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let timeout = req.timeout.unwrap_or(self.config.request_timeout);
        self.execute_within(req, timeout).await
    }

    async fn execute_within(&self, req: &ApiRequest, timeout: Duration) -> Result<ApiResponse, TransportError> {
        match tokio::time::timeout(timeout, self.transport.execute(req, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }

    fn transition(&self, req: &ApiRequest, phase: RefreshPhase) {
        tracing::debug!(
            method = %req.method,
            path = req.route_path(),
            phase = phase.as_str(),
            "refresh phase"
        );
    }

    async fn refresh_or_fail(&self, req: &ApiRequest, class: RouteClass) -> Result<(), ClientError> {
        self.transition(req, RefreshPhase::AwaitingRefresh);
        let failed_refresh = self.session.snapshot().refresh;

        match self.refresh(class, failed_refresh.as_deref()).await {
            Ok(()) => {
                self.transition(req, RefreshPhase::Retrying);
                Ok(())
            }
            Err(reason) => {
                tracing::warn!(path = req.route_path(), "token refresh failed: {reason}");
                match self.fail_session(class, failed_refresh)? {
                    Purge::Superseded => {
                        self.transition(req, RefreshPhase::Retrying);
                        Ok(())
                    }
                    Purge::Purged | Purge::AlreadyEmpty => {
                        self.transition(req, RefreshPhase::Failed);
                        Err(ClientError::AuthIrrecoverable)
                    }
                }
            }
        }
    }

    async fn refresh(&self, class: RouteClass, refresh: Option<&str>) -> Result<(), RefreshFailure> {
        let refresh = refresh
            .filter(|r| !r.trim().is_empty())
            .ok_or(RefreshFailure::MissingCredential)?;
        if is_placeholder(refresh) {
            return Err(RefreshFailure::PlaceholderCredential);
        }

        let mut call = ApiRequest::post(self.config.refresh_path.clone());
        call.body = RequestBody::Json(json!({ "refreshToken": refresh }));

        self.refreshes.fetch_add(1, Ordering::Relaxed);
        let res = self.execute_within(&call, self.config.refresh_timeout).await?;
        if !res.status.is_success() {
            return Err(RefreshFailure::Rejected(res.status));
        }

        let issued = extract_tokens(&res.json_value()).ok_or(RefreshFailure::Malformed)?;
        if is_placeholder(&issued.access) {
            return Err(RefreshFailure::PlaceholderIssued);
        }

        let access = issued.access;
        let new_refresh = issued.refresh.filter(|r| is_real(Some(r)));
        self.session.update(&mut |slots| {
            slots.set_access(access.clone());
            if let Some(r) = &new_refresh {
                slots.refresh = Some(r.clone());
            }
            if class.is_admin() {
                slots.admin = Some(access.clone());
            }
            true
        })?;

        tracing::debug!(admin = class.is_admin(), "access token refreshed");
        Ok(())
    }

    /// Purge unless another request already replaced the failed credential,
    /// then redirect to the class entry point.
    ///
    /// The redirect happens even when the purge could not be stored.
    fn fail_session(&self, class: RouteClass, failed_refresh: Option<String>) -> Result<Purge, ClientError> {
        let mut outcome = Purge::AlreadyEmpty;
        let stored = self.session.update(&mut |slots| {
            if slots.is_empty() {
                outcome = Purge::AlreadyEmpty;
                return false;
            }
            if slots.refresh != failed_refresh && is_real(slots.refresh.as_deref()) {
                outcome = Purge::Superseded;
                return false;
            }
            *slots = CredentialSlots::default();
            outcome = Purge::Purged;
            true
        });
        if let Err(e) = stored {
            tracing::error!(admin = class.is_admin(), "failed to purge session: {e}");
            self.navigator.redirect_once(self.config.entry_for(class.is_admin()));
            return Err(e.into());
        }

        match outcome {
            Purge::Purged => {
                tracing::warn!(admin = class.is_admin(), "session purged after failed refresh");
                self.navigator.redirect_once(self.config.entry_for(class.is_admin()));
            }
            Purge::AlreadyEmpty => {
                self.navigator.redirect_once(self.config.entry_for(class.is_admin()));
            }
            Purge::Superseded => {
                tracing::debug!("refresh credential rotated concurrently; replaying with it");
            }
        }
        Ok(outcome)
    }

    /// Notify the user unless the route is background polling.
    fn surface(&self, req: &ApiRequest, err: ClientError) -> ClientError {
        if self.config.routes.is_background(req.route_path()) {
            if !err.is_noise() {
                tracing::warn!(path = req.route_path(), "background request failed: {err}");
            }
        } else if let Some(notice) = err.notice() {
            self.notifier.notify(notice);
        }
        err
    }
}
