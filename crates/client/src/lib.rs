//! `bazaar-client`: the client half of the resilience layer.
//!
//! - [`ApiClient`] decorates every request with the right bearer token and
//!   transparently refreshes and replays once on a 401.
//! - [`AvailabilityPoller`] and [`MaintenanceView`] track site maintenance
//!   through the public status endpoint, failing open.
//!
//! Credentials, navigation, transport and notices are injected through the
//! [`SessionStore`], [`Navigator`], [`Transport`] and [`Notifier`] traits.

pub mod config;
pub mod decorator;
pub mod error;
pub mod interceptor;
pub mod maintenance_view;
pub mod navigator;
pub mod poller;
pub mod request;
pub mod selector;
pub mod session;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use decorator::{Decoration, RequestDecorator};
pub use error::{ClientError, Notice, NoticeKind, Notifier, TracingNotifier};
pub use interceptor::{ApiClient, RefreshPhase};
pub use maintenance_view::{MaintenanceView, ViewExit};
pub use navigator::{InMemoryNavigator, Navigator};
pub use poller::{AvailabilityPoller, AvailabilityState, Backoff, ProbeOutcome, SettingsSignal, probe_status};
pub use request::{ApiRequest, MultipartPart, RequestBody};
pub use selector::{TokenSelection, select_token};
pub use session::{
    CachedPrincipal, CredentialSlots, FileSessionStore, InMemorySessionStore, LoginTokens, SessionStore,
    SessionStoreError,
};
pub use transport::{ApiResponse, ReqwestTransport, Transport, TransportError};
