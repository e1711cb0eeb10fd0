//! Fleet-controller HTTP adapter (C5).
//!
//! A signed REST client over the fleet controller's `/api/2.0/machines/`
//! surface (spec §6). Every operation returns `Option`/`Result` rather than
//! raising — network errors are logged and surfaced as the operation's
//! failure, never as a generic exception into the engine (spec §4.5/§7).

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::warn;

use provisioner_domain::CancellationToken;

use crate::errors::{CommissioningError, FleetAdapterError};
use crate::models::{MachineRecord, MachineStatus};
use crate::oauth1::OAuth1Credentials;

#[derive(Debug, Clone)]
pub struct FleetClientConfig {
    pub base_url: String,
    pub credentials: OAuth1Credentials,
    pub poll_interval: Duration,
    pub poll_timeout: Duration,
}

#[derive(Clone)]
pub struct FleetClient {
    http: Client,
    config: FleetClientConfig,
}

impl FleetClient {
    #[must_use]
    pub fn new(config: FleetClientConfig) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder.header("Authorization", self.config.credentials.authorization_header())
    }

    async fn execute(&self, operation: &str, builder: reqwest::RequestBuilder) -> Result<Value, FleetAdapterError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(FleetAdapterError::Network)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(FleetAdapterError::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).or(Ok(Value::Null))
    }

    /// `GET /api/2.0/machines/`. Returns `None` on any network/API error
    /// (logged) so batch callers degrade gracefully instead of aborting.
    pub async fn list_machines(&self) -> Option<Vec<MachineRecord>> {
        let url = format!("{}/api/2.0/machines/", self.config.base_url);
        match self.execute("list_machines", self.http.get(&url)).await {
            Ok(value) => serde_json::from_value(value).ok(),
            Err(error) => {
                warn!(%error, "list_machines failed");
                None
            }
        }
    }

    pub async fn get_machine(&self, system_id: &str) -> Option<MachineRecord> {
        let url = format!("{}/api/2.0/machines/{system_id}/", self.config.base_url);
        match self.execute("get_machine", self.http.get(&url)).await {
            Ok(value) => serde_json::from_value(value).ok(),
            Err(error) => {
                warn!(system_id, %error, "get_machine failed");
                None
            }
        }
    }

    pub async fn commission(&self, system_id: &str, enable_ssh: bool) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-commission", self.config.base_url);
        let enable_ssh_value = u8::from(enable_ssh).to_string();
        self.execute(
            "commission",
            self.http.post(&url).form(&[("enable_ssh", enable_ssh_value.as_str())]),
        )
        .await?;
        Ok(())
    }

    pub async fn abort(&self, system_id: &str) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-abort", self.config.base_url);
        self.execute("abort", self.http.post(&url)).await?;
        Ok(())
    }

    pub async fn deploy(&self, system_id: &str, distro_series: Option<&str>) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-deploy", self.config.base_url);
        let builder = if let Some(distro) = distro_series {
            self.http.post(&url).form(&[("distro_series", distro)])
        } else {
            self.http.post(&url)
        };
        self.execute("deploy", builder).await?;
        Ok(())
    }

    pub async fn release(&self, system_id: &str) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-release", self.config.base_url);
        self.execute("release", self.http.post(&url)).await?;
        Ok(())
    }

    pub async fn tag(&self, system_id: &str, tag: &str) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-tag", self.config.base_url);
        self.execute("tag", self.http.post(&url).form(&[("tag", tag)])).await?;
        Ok(())
    }

    pub async fn mark_ready(&self, system_id: &str) -> Result<(), FleetAdapterError> {
        let url = format!("{}/api/2.0/machines/{system_id}/op-mark-ready", self.config.base_url);
        self.execute("mark_ready", self.http.post(&url)).await?;
        Ok(())
    }

    /// Reconcile a machine to "commissioning has been kicked off" from any
    /// prior state (spec §4.11): deployed machines are released first,
    /// failed/broken ones are aborted and recommissioned, everything else
    /// is commissioned directly.
    pub async fn force_commission(
        &self,
        system_id: &str,
        enable_ssh: bool,
        on_progress: &dyn Fn(&str),
        cancellation: &CancellationToken,
    ) -> Result<(), CommissioningError> {
        let machine = self.get_machine(system_id).await;

        match machine.as_ref().map(|m| &m.status_name) {
            Some(MachineStatus::Deployed) => {
                on_progress("releasing deployed machine before recommissioning");
                self.release(system_id).await?;
                self.wait_for_status(system_id, &[MachineStatus::Ready, MachineStatus::New], on_progress, cancellation)
                    .await?;
            }
            Some(status) if status.is_terminal_failure() || matches!(status, MachineStatus::Broken) => {
                on_progress("aborting failed/broken machine before recommissioning");
                self.abort(system_id).await?;
            }
            _ => {}
        }

        on_progress("commissioning");
        self.commission(system_id, enable_ssh).await?;
        Ok(())
    }

    /// Poll for `system_id` to reach one of `terminal_statuses`, bounded by
    /// a 30-minute outer cap and a 30-second inner interval (spec §4.5),
    /// emitting progress via `on_progress`. Races its inner sleep against
    /// `cancellation` so a cancelled workflow observes this mid-poll
    /// rather than after the full outer cap (spec §5).
    pub async fn wait_for_status(
        &self,
        system_id: &str,
        terminal_statuses: &[MachineStatus],
        on_progress: &dyn Fn(&str),
        cancellation: &CancellationToken,
    ) -> Result<MachineStatus, CommissioningError> {
        let deadline = tokio::time::Instant::now() + self.config.poll_timeout;

        loop {
            if cancellation.is_cancelled() {
                return Err(CommissioningError::Cancelled {
                    server_id: system_id.to_string(),
                });
            }

            if let Some(machine) = self.get_machine(system_id).await {
                on_progress(&format!("status: {}", machine.status_name.as_str()));
                if terminal_statuses.contains(&machine.status_name) {
                    return Ok(machine.status_name);
                }
                if machine.status_name.is_terminal_failure() {
                    return Err(CommissioningError::Failed {
                        server_id: system_id.to_string(),
                        reason: machine.status_name.as_str().to_string(),
                    });
                }
            }

            if tokio::time::Instant::now() >= deadline {
                return Err(CommissioningError::Timeout {
                    server_id: system_id.to_string(),
                });
            }

            if cancellation.cancellable_sleep(self.config.poll_interval).await {
                return Err(CommissioningError::Cancelled {
                    server_id: system_id.to_string(),
                });
            }
        }
    }
}

impl Default for FleetClientConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            credentials: OAuth1Credentials {
                consumer_key: String::new(),
                consumer_secret: String::new(),
                token: String::new(),
                token_secret: String::new(),
            },
            poll_interval: Duration::from_secs(30),
            poll_timeout: Duration::from_secs(30 * 60),
        }
    }
}
