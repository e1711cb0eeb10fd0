//! Concrete stage handlers (C11 §4.11). Each submodule holds a single
//! zero-sized handler; [`for_stage`] is the only way callers outside this
//! module construct one, so adding a new handler only requires wiring it
//! in here and in [`crate::stage::Stage`].

pub mod bios_configuration;
pub mod commissioning;
pub mod finalization;
pub mod firmware_update;
pub mod hardware_discovery;
pub mod ipmi_configuration;
pub mod network_setup;

use serde_json::Value;
use tracing::warn;

use provisioner_domain::ServerId;

use crate::handler::{StageHandler, StageRuntime};
use crate::stage::Stage;

pub(crate) fn for_stage(stage: Stage) -> Box<dyn StageHandler> {
    match stage {
        Stage::Commissioning => Box::new(commissioning::CommissioningStageHandler),
        Stage::NetworkSetup => Box::new(network_setup::NetworkSetupStageHandler),
        Stage::HardwareDiscovery => Box::new(hardware_discovery::HardwareDiscoveryStageHandler),
        Stage::IpmiConfiguration => Box::new(ipmi_configuration::IpmiConfigurationStageHandler),
        Stage::FirmwareUpdate => Box::new(firmware_update::FirmwareUpdateStageHandler),
        Stage::BiosConfiguration => Box::new(bios_configuration::BiosConfigurationStageHandler),
        Stage::Finalization => Box::new(finalization::FinalizationStageHandler),
    }
}

/// Persist one field, logging rather than propagating on failure (spec §7
/// "persistence errors are logged, never promoted").
pub(crate) async fn update_server_field(runtime: &StageRuntime, id: &ServerId, field: &str, value: Value) {
    if let Err(error) = runtime.store.update_server(id, field, &value).await {
        warn!(server_id = %id, field, %error, "failed to persist server field update");
    }
}
