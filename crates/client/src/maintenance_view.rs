//! Full-screen maintenance view.
//!
//! Shown while the poller reports `Blocked`. It polls on its own short,
//! fixed interval and reloads the moment the site reports maintenance off.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

use bazaar_core::MaintenanceStatus;

use crate::config::ClientConfig;
use crate::navigator::Navigator;
use crate::poller::{ProbeOutcome, probe_status};
use crate::transport::Transport;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ViewExit {
    /// Maintenance ended and the view was reloaded.
    Recovered,
    Shutdown,
}

pub struct MaintenanceView {
    status: MaintenanceStatus,
    transport: Arc<dyn Transport>,
    navigator: Arc<dyn Navigator>,
    status_path: String,
    status_timeout: Duration,
    interval: Duration,
}

impl MaintenanceView {
    pub fn new(
        config: &ClientConfig,
        status: MaintenanceStatus,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            status,
            transport,
            navigator,
            status_path: config.status_path.clone(),
            status_timeout: config.status_timeout,
            interval: config.maintenance_view_interval,
        }
    }

    /// Branding shown on the view.
    pub fn status(&self) -> &MaintenanceStatus {
        &self.status
    }

    pub async fn run(&mut self, shutdown: &Notify) -> ViewExit {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.notified() => return ViewExit::Shutdown,
            }

            // Only an explicit "off" ends the view; anything else keeps it up.
            match probe_status(self.transport.as_ref(), &self.status_path, self.status_timeout).await {
                ProbeOutcome::Status(status) if !status.maintenance_mode => {
                    tracing::info!("maintenance ended; reloading");
                    self.navigator.reload();
                    return ViewExit::Recovered;
                }
                ProbeOutcome::Status(status) => self.status = status,
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigator::InMemoryNavigator;
    use crate::request::ApiRequest;
    use crate::transport::{ApiResponse, TransportError};
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct Replies(Mutex<VecDeque<Result<ApiResponse, TransportError>>>);

    #[async_trait]
    impl Transport for Replies {
        async fn execute(&self, _req: &ApiRequest, _timeout: Duration) -> Result<ApiResponse, TransportError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(TransportError::Offline("no reply".into())))
        }
    }

    fn status(maintenance: bool, name: &str) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse::json_body(
            StatusCode::OK,
            &json!({ "success": true, "data": { "maintenanceMode": maintenance, "siteName": name, "siteDescription": "" } }),
        ))
    }

    fn blocked() -> MaintenanceStatus {
        MaintenanceStatus {
            maintenance_mode: true,
            site_name: "Bazaar".to_string(),
            site_description: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reloads_when_maintenance_ends() {
        let transport = Arc::new(Replies(Mutex::new(
            vec![
                status(true, "Bazaar (upgrading)"),
                Err(TransportError::Timeout),
                status(false, "Bazaar"),
            ]
            .into(),
        )));
        let nav = Arc::new(InMemoryNavigator::at("/feed"));
        let mut view = MaintenanceView::new(&ClientConfig::default(), blocked(), transport, nav.clone());

        let exit = view.run(&Notify::new()).await;
        assert_eq!(exit, ViewExit::Recovered);
        assert_eq!(nav.reloads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_up_on_errors_until_shutdown() {
        let transport = Arc::new(Replies(Mutex::new(
            vec![status(true, "Bazaar (upgrading)"), Err(TransportError::Timeout)].into(),
        )));
        let nav = Arc::new(InMemoryNavigator::at("/feed"));
        let config = ClientConfig::default();
        let mut view = MaintenanceView::new(&config, blocked(), transport, nav.clone());
        let shutdown = Notify::new();

        let exit = tokio::select! {
            exit = view.run(&shutdown) => exit,
            _ = async {
                tokio::time::sleep(config.maintenance_view_interval * 5).await;
                shutdown.notify_one();
                std::future::pending::<()>().await
            } => unreachable!(),
        };

        assert_eq!(exit, ViewExit::Shutdown);
        assert_eq!(nav.reloads(), 0);
        assert_eq!(view.status().site_name, "Bazaar (upgrading)");
    }
}
