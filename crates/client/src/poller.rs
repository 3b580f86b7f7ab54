//! Availability poller.
//!
//! Re-checks the public status endpoint on a timer (with backoff) and
//! whenever a local settings change is signalled. Admin views and admin
//! principals are never blocked, so they skip the network entirely. Every
//! inconclusive result (timeout, unreachable server, bad response) resolves
//! to `Clear`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;
use tokio::sync::{Notify, broadcast, watch};
use tokio::task::JoinHandle;

use bazaar_core::{MaintenanceStatus, RouteTable};

use crate::config::ClientConfig;
use crate::navigator::Navigator;
use crate::request::ApiRequest;
use crate::session::SessionStore;
use crate::transport::{Transport, TransportError};

/// In-process "settings changed" signal for an immediate re-poll.
#[derive(Debug, Clone)]
pub struct SettingsSignal {
    tx: broadcast::Sender<()>,
}

impl SettingsSignal {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(8);
        Self { tx }
    }

    pub fn notify_changed(&self) {
        // No subscribers is fine.
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

impl Default for SettingsSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AvailabilityState {
    Checking,
    Blocked(MaintenanceStatus),
    Clear,
}

impl AvailabilityState {
    pub fn is_blocked(&self) -> bool {
        matches!(self, AvailabilityState::Blocked(_))
    }
}

/// Result of one status probe.
#[derive(Debug)]
pub enum ProbeOutcome {
    Status(MaintenanceStatus),
    TimedOut,
    Unreachable(TransportError),
    /// Non-2xx or undecodable response.
    Invalid(String),
}

impl ProbeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProbeOutcome::Status(_))
    }
}

fn parse_status(body: &Value) -> Option<MaintenanceStatus> {
    let data = body.get("data").unwrap_or(body);
    let text = |key: &str| data.get(key).and_then(Value::as_str).unwrap_or_default().to_string();
    Some(MaintenanceStatus {
        maintenance_mode: data.get("maintenanceMode")?.as_bool()?,
        site_name: text("siteName"),
        site_description: text("siteDescription"),
    })
}

/// `GET <path>` raced against `timeout`.
pub async fn probe_status(transport: &dyn Transport, path: &str, timeout: Duration) -> ProbeOutcome {
    let req = ApiRequest::get(path);
    let res = match tokio::time::timeout(timeout, transport.execute(&req, timeout)).await {
        Err(_) | Ok(Err(TransportError::Timeout)) => return ProbeOutcome::TimedOut,
        Ok(Err(e)) => return ProbeOutcome::Unreachable(e),
        Ok(Ok(res)) => res,
    };

    if res.status != StatusCode::OK {
        return ProbeOutcome::Invalid(format!("status probe answered {}", res.status));
    }
    match parse_status(&res.json_value()) {
        Some(status) => ProbeOutcome::Status(status),
        None => ProbeOutcome::Invalid("status probe body has no maintenanceMode".to_string()),
    }
}

/// Consecutive-failure backoff.
#[derive(Debug, Clone)]
pub struct Backoff {
    failures: u32,
    cap: u32,
    short: Duration,
    long: Duration,
}

impl Backoff {
    pub fn new(cap: u32, short: Duration, long: Duration) -> Self {
        Self {
            failures: 0,
            cap: cap.max(1),
            short,
            long,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    pub fn record_success(&mut self) {
        self.failures = 0;
    }

    pub fn record_failure(&mut self) {
        self.failures = (self.failures + 1).min(self.cap);
    }

    pub fn next_interval(&self) -> Duration {
        if self.failures >= self.cap {
            self.long
        } else {
            self.short
        }
    }
}

pub struct AvailabilityPoller {
    transport: Arc<dyn Transport>,
    session: Arc<dyn SessionStore>,
    navigator: Arc<dyn Navigator>,
    routes: RouteTable,
    status_path: String,
    status_timeout: Duration,
    backoff: Mutex<Backoff>,
    state: watch::Sender<AvailabilityState>,
    signal: SettingsSignal,
}

impl AvailabilityPoller {
    pub fn new(
        config: &ClientConfig,
        transport: Arc<dyn Transport>,
        session: Arc<dyn SessionStore>,
        navigator: Arc<dyn Navigator>,
        signal: SettingsSignal,
    ) -> Self {
        let (state, _rx) = watch::channel(AvailabilityState::Checking);
        Self {
            transport,
            session,
            navigator,
            routes: config.routes.clone(),
            status_path: config.status_path.clone(),
            status_timeout: config.status_timeout,
            backoff: Mutex::new(Backoff::new(
                config.max_consecutive_failures,
                config.poll_interval,
                config.poll_backoff_interval,
            )),
            state,
            signal,
        }
    }

    pub fn state(&self) -> AvailabilityState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AvailabilityState> {
        self.state.subscribe()
    }

    pub fn next_interval(&self) -> Duration {
        self.with_backoff(|b| b.next_interval())
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.with_backoff(|b| b.failures())
    }

    fn with_backoff<T>(&self, f: impl FnOnce(&mut Backoff) -> T) -> T {
        let mut guard = self.backoff.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    fn publish(&self, next: AvailabilityState) -> AvailabilityState {
        self.state.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next.clone();
            true
        });
        next
    }

    fn exempt(&self) -> bool {
        self.routes
            .classify(&self.navigator.current_location())
            .is_admin()
            || self.session.snapshot().has_admin_principal()
    }

    /// One check cycle.
    pub async fn check_now(&self) -> AvailabilityState {
        if self.exempt() {
            return self.publish(AvailabilityState::Clear);
        }

        let outcome = probe_status(self.transport.as_ref(), &self.status_path, self.status_timeout).await;
        self.with_backoff(|b| {
            if outcome.is_success() {
                b.record_success()
            } else {
                b.record_failure()
            }
        });

        let next = match outcome {
            ProbeOutcome::Status(status) if status.maintenance_mode => AvailabilityState::Blocked(status),
            ProbeOutcome::Status(_) => AvailabilityState::Clear,
            ProbeOutcome::TimedOut | ProbeOutcome::Unreachable(_) => AvailabilityState::Clear,
            ProbeOutcome::Invalid(reason) => {
                tracing::warn!(path = %self.status_path, "availability check failed: {reason}");
                AvailabilityState::Clear
            }
        };
        self.publish(next)
    }

    /// Run until `shutdown` is notified (use `notify_one`).
    pub fn spawn(self: Arc<Self>, shutdown: Arc<Notify>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut signals = Some(self.signal.subscribe());
            loop {
                self.check_now().await;
                let wait = self.next_interval();

                let closed = tokio::select! {
                    _ = tokio::time::sleep(wait) => false,
                    recv = next_signal(&mut signals) => {
                        matches!(recv, Err(broadcast::error::RecvError::Closed))
                    }
                    _ = shutdown.notified() => break,
                };
                if closed {
                    signals = None;
                }
            }
            tracing::debug!("availability poller stopped");
        })
    }
}

async fn next_signal(
    rx: &mut Option<broadcast::Receiver<()>>,
) -> Result<(), broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
