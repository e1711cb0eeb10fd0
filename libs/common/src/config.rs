//! Orchestrator configuration
//!
//! Loaded in layers: built-in defaults, an optional `provisioner.toml` in the
//! working directory, then environment variables prefixed `PROVISIONER_`
//! (double underscore as the nesting separator, e.g.
//! `PROVISIONER_FLEET__BASE_URL`). The last layer wins.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
}

/// Top-level orchestrator configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Path to the SQLite store file (C1).
    pub store_path: String,

    /// Path to the device catalog document (C2).
    pub catalog_path: String,

    /// Fleet-controller adapter settings (C5).
    pub fleet: FleetConfig,

    /// SSH adapter defaults (C3).
    pub ssh: SshConfig,

    /// IPMI adapter defaults (C4).
    pub ipmi: IpmiConfig,

    /// Background worker polling/concurrency settings.
    pub worker: WorkerConfig,
}

/// Fleet-controller connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FleetConfig {
    pub base_url: String,
    pub consumer_key: String,
    pub consumer_secret: String,
    pub token: String,
    pub token_secret: String,
    #[serde(default = "default_fleet_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_fleet_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl FleetConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }
}

const fn default_fleet_poll_interval_secs() -> u64 {
    30
}

const fn default_fleet_poll_timeout_secs() -> u64 {
    1800
}

/// SSH adapter defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct SshConfig {
    #[serde(default = "default_ssh_user")]
    pub default_user: String,
    #[serde(default)]
    pub key_path: Option<String>,
    /// Used only when `key_path` is unset.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default = "default_ssh_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_ssh_user() -> String {
    "root".to_string()
}

const fn default_ssh_connect_timeout_secs() -> u64 {
    10
}

/// IPMI adapter defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IpmiConfig {
    #[serde(default = "default_ipmitool_path")]
    pub ipmitool_path: String,
    #[serde(default = "default_ipmi_timeout_secs")]
    pub command_timeout_secs: u64,
    /// Tried against a BMC with no credentials recorded yet, and set as
    /// the user-slot-2 account during the ipmi-configuration stage.
    #[serde(default = "default_ipmi_username")]
    pub default_username: String,
    #[serde(default = "default_ipmi_password")]
    pub default_password: String,
}

fn default_ipmitool_path() -> String {
    "ipmitool".to_string()
}

const fn default_ipmi_timeout_secs() -> u64 {
    30
}

fn default_ipmi_username() -> String {
    "ADMIN".to_string()
}

fn default_ipmi_password() -> String {
    "ADMIN".to_string()
}

/// Background worker settings: how often it checks the store for queued
/// servers, and how many provisioning workflows it runs side by side.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkerConfig {
    #[serde(default = "default_worker_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_worker_max_concurrent_workflows")]
    pub max_concurrent_workflows: usize,
}

impl WorkerConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

const fn default_worker_poll_interval_secs() -> u64 {
    15
}

const fn default_worker_max_concurrent_workflows() -> usize {
    4
}

impl Config {
    /// Load configuration from defaults, an optional config file, and
    /// environment variables. Calls `dotenvy::dotenv()` first so a local
    /// `.env` file populates the environment layer.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Build` if the layered sources cannot be merged
    /// or deserialized into `Config`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let builder = config::Config::builder()
            .set_default("store_path", "provisioner.db")?
            .set_default("catalog_path", "catalog.yaml")?
            .set_default("fleet.poll_interval_secs", 30)?
            .set_default("fleet.poll_timeout_secs", 1800)?
            .set_default("ssh.default_user", "root")?
            .set_default("ssh.connect_timeout_secs", 10)?
            .set_default("ipmi.ipmitool_path", "ipmitool")?
            .set_default("ipmi.command_timeout_secs", 30)?
            .set_default("ipmi.default_username", "ADMIN")?
            .set_default("ipmi.default_password", "ADMIN")?
            .set_default("worker.poll_interval_secs", 15)?
            .set_default("worker.max_concurrent_workflows", 4)?
            .add_source(config::File::with_name("provisioner").required(false))
            .add_source(
                config::Environment::with_prefix("PROVISIONER")
                    .separator("__")
                    .try_parsing(true),
            );

        let raw = builder.build()?;
        Ok(raw.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fleet_intervals() {
        assert_eq!(default_fleet_poll_interval_secs(), 30);
        assert_eq!(default_fleet_poll_timeout_secs(), 1800);
    }
}
