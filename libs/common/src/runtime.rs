//! Wires a loaded [`crate::Config`] into the concrete collaborator bundle
//! (`StageRuntime`) every provisioning workflow needs. Both `apps/cli` and
//! `apps/worker` call this rather than duplicating the wiring.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use provisioner_fleet::{FleetClient, FleetClientConfig, OAuth1Credentials};
use provisioner_ipmi::IpmiAdapter;
use provisioner_ssh::SshAuth;
use provisioner_store::Store;
use provisioner_strategy::{IpmiRuntimeConfig, SshRuntimeConfig, StageRuntime};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to open store at {path}")]
    Store {
        path: String,
        #[source]
        source: provisioner_store::OpenStoreError,
    },
}

/// Opens the store (running migrations) and assembles the catalog, fleet,
/// IPMI, and SSH handles a [`StageRuntime`] needs. `dry_run` is threaded
/// straight through to the firmware-update stage.
pub async fn build_stage_runtime(config: &Config, dry_run: bool) -> Result<StageRuntime, BootstrapError> {
    let pool = provisioner_store::open(&config.store_path)
        .await
        .map_err(|source| BootstrapError::Store {
            path: config.store_path.clone(),
            source,
        })?;
    let store = Store::new(pool);

    let catalog = provisioner_catalog::Catalog::new(PathBuf::from(&config.catalog_path));

    let fleet = FleetClient::new(FleetClientConfig {
        base_url: config.fleet.base_url.clone(),
        credentials: OAuth1Credentials {
            consumer_key: config.fleet.consumer_key.clone(),
            consumer_secret: config.fleet.consumer_secret.clone(),
            token: config.fleet.token.clone(),
            token_secret: config.fleet.token_secret.clone(),
        },
        poll_interval: config.fleet.poll_interval(),
        poll_timeout: config.fleet.poll_timeout(),
    });

    let ipmi = IpmiAdapter::new(config.ipmi.ipmitool_path.clone(), Duration::from_secs(config.ipmi.command_timeout_secs));

    let auth = match &config.ssh.key_path {
        Some(path) => SshAuth::KeyFile(PathBuf::from(path)),
        None => SshAuth::Password(config.ssh.password.clone().unwrap_or_default()),
    };

    Ok(StageRuntime {
        store,
        fleet,
        catalog,
        ipmi,
        ssh: SshRuntimeConfig {
            user: config.ssh.default_user.clone(),
            auth,
            connect_timeout: Duration::from_secs(config.ssh.connect_timeout_secs),
        },
        ipmi_defaults: IpmiRuntimeConfig {
            default_username: config.ipmi.default_username.clone(),
            default_password: config.ipmi.default_password.clone(),
        },
        dry_run,
    })
}
