//! Client error taxonomy and user-facing notices.

use reqwest::StatusCode;
use thiserror::Error;

use bazaar_core::MaintenanceDenial;

use crate::session::SessionStoreError;
use crate::transport::{ApiResponse, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    /// Refresh failed, timed out or returned a placeholder; the session was purged.
    #[error("session expired; please sign in again")]
    AuthIrrecoverable,

    /// 401 that could not go through refresh (request already retried).
    #[error("unauthorized")]
    Unauthorized,

    #[error("server error ({0})")]
    ServerFault(StatusCode),

    /// The availability gate denied the request.
    #[error("site is under maintenance")]
    Maintenance(MaintenanceDenial),

    #[error("forbidden")]
    Forbidden,

    #[error("not found")]
    NotFound,

    #[error("too many requests")]
    RateLimited,

    #[error("request timed out")]
    Timeout,

    #[error("offline: {0}")]
    Offline(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    UnexpectedStatus(StatusCode),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Session(#[from] SessionStoreError),
}

impl From<TransportError> for ClientError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Timeout => ClientError::Timeout,
            TransportError::Offline(m) => ClientError::Offline(m),
            TransportError::Network(m) => ClientError::Network(m),
        }
    }
}

impl ClientError {
    /// Classify a non-2xx response.
    pub fn from_response(res: &ApiResponse) -> Self {
        match res.status {
            StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
            StatusCode::FORBIDDEN => ClientError::Forbidden,
            StatusCode::NOT_FOUND => ClientError::NotFound,
            StatusCode::TOO_MANY_REQUESTS => ClientError::RateLimited,
            StatusCode::SERVICE_UNAVAILABLE => match res.json::<MaintenanceDenial>() {
                Ok(denial) if denial.maintenance_mode => ClientError::Maintenance(denial),
                _ => ClientError::ServerFault(res.status),
            },
            s if s.is_server_error() => ClientError::ServerFault(s),
            s => ClientError::UnexpectedStatus(s),
        }
    }

    /// Notice shown to the user for this error, if any.
    pub fn notice(&self) -> Option<Notice> {
        let (kind, message) = match self {
            ClientError::AuthIrrecoverable => (NoticeKind::Warning, self.to_string()),
            ClientError::ServerFault(_) => {
                (NoticeKind::Error, "Something went wrong on our side. Please try again.".to_string())
            }
            ClientError::Maintenance(d) => (NoticeKind::Warning, d.message.clone()),
            ClientError::Forbidden => {
                (NoticeKind::Error, "You do not have permission to do that.".to_string())
            }
            ClientError::NotFound => (NoticeKind::Error, "Not found.".to_string()),
            ClientError::RateLimited => {
                (NoticeKind::Warning, "Slow down a little and try again shortly.".to_string())
            }
            ClientError::Timeout | ClientError::Offline(_) | ClientError::Network(_) => {
                (NoticeKind::Error, "Cannot reach the server. Check your connection.".to_string())
            }
            ClientError::Unauthorized
            | ClientError::UnexpectedStatus(_)
            | ClientError::Decode(_)
            | ClientError::Session(_) => return None,
        };
        Some(Notice { kind, message })
    }

    /// Timeouts and connectivity problems.
    pub fn is_noise(&self) -> bool {
        matches!(
            self,
            ClientError::Timeout | ClientError::Offline(_) | ClientError::Network(_)
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum NoticeKind {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

/// Surfaces notices to the user (toast, banner, stderr...).
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Emits notices as log events.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Warning => tracing::warn!(notice = %notice.message, "user notice"),
            NoticeKind::Error => tracing::error!(notice = %notice.message, "user notice"),
        }
    }
}
