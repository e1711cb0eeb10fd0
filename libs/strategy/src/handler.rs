//! The stage runtime: the shared collaborator bundle every concrete stage
//! handler receives alongside the context (C11 §4.11 "execute(context,
//! config) -> StageResult"). Distinct from [`provisioner_workflow_engine::WorkflowContext`]
//! in that it never changes over the lifetime of a run — it is assembled
//! once by the caller building the step list and cloned into every stage.

use std::time::Duration;

use async_trait::async_trait;
use provisioner_catalog::Catalog;
use provisioner_fleet::FleetClient;
use provisioner_ipmi::IpmiAdapter;
use provisioner_ssh::SshAuth;
use provisioner_store::Store;
use provisioner_workflow_engine::{WorkflowContext, WorkflowError};

use crate::stage::{Stage, StageResult};

/// SSH parameters shared by every stage that needs a session, absent a
/// per-server override (hardware discovery fills in `context.target_bmc_ip`
/// and similar once known; the host to SSH into is the server's in-band IP,
/// carried in `context.data()` by whichever stage first resolves it).
#[derive(Debug, Clone)]
pub struct SshRuntimeConfig {
    pub user: String,
    pub auth: SshAuth,
    pub connect_timeout: Duration,
}

/// Default IPMI credentials tried when a server has none recorded yet.
#[derive(Debug, Clone)]
pub struct IpmiRuntimeConfig {
    pub default_username: String,
    pub default_password: String,
}

/// Everything a concrete stage handler needs beyond the context itself.
/// Cheap to clone: every field is either an `Arc`-backed handle
/// (`Store`/`FleetClient`/`Catalog`) or a small value type.
#[derive(Clone)]
pub struct StageRuntime {
    pub store: Store,
    pub fleet: FleetClient,
    pub catalog: Catalog,
    pub ipmi: IpmiAdapter,
    pub ssh: SshRuntimeConfig,
    pub ipmi_defaults: IpmiRuntimeConfig,
    /// When set, the firmware-update stage reports its plan without flashing
    /// anything and skips the post-update reboot (spec §9 open question:
    /// "dry-run mode").
    pub dry_run: bool,
}

/// One stage of a provisioning run (C11 §4.11). Implementors hold no state
/// of their own — every collaborator comes from [`StageRuntime`], every
/// cross-stage fact comes from [`WorkflowContext`] — so a handler can be a
/// zero-sized unit struct.
#[async_trait]
pub trait StageHandler: Send + Sync {
    fn stage(&self) -> Stage;

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError>;
}
