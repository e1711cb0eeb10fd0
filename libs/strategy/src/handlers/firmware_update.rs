//! Firmware-update stage handler (C11 §4.11 data flow: "firmware (C8)").
//! Only present in [`crate::strategy::FirmwareFirstStrategy`]'s stage list;
//! absent from the standard run (spec §4.11 "Firmware is not part of the
//! standard run").

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;

use provisioner_domain::FirmwareComponent;
use provisioner_firmware::{
    compute_states, execute_plan, FirmwareBatchResult, FirmwareComponentHandler, FirmwareError, RealFirmwareHandler, SimulatedFirmwareHandler,
};
use provisioner_ipmi::IpmiCredentials;
use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

const ALL_COMPONENTS: [FirmwareComponent; 6] = [
    FirmwareComponent::Bmc,
    FirmwareComponent::Bios,
    FirmwareComponent::Uefi,
    FirmwareComponent::Nic,
    FirmwareComponent::Storage,
    FirmwareComponent::Cpld,
];

pub struct FirmwareUpdateStageHandler;

#[async_trait]
impl StageHandler for FirmwareUpdateStageHandler {
    fn stage(&self) -> Stage {
        Stage::FirmwareUpdate
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let firmware_pointers = match runtime.catalog.snapshot() {
            Ok(snapshot) => snapshot
                .device_type(&context.device_type)
                .map(|entry| entry.firmware_pointers.clone())
                .unwrap_or_default(),
            Err(error) => {
                context.push_sub_task(format!("catalog unavailable, no firmware pointers to apply: {error}"));
                BTreeMap::new()
            }
        };

        let bmc_ip = context.target_bmc_ip.clone();
        let creds = bmc_ip.map(|ip| IpmiCredentials {
            bmc_ip: ip,
            username: runtime.ipmi_defaults.default_username.clone(),
            password: runtime.ipmi_defaults.default_password.clone(),
        });

        let Some(creds) = creds else {
            return Ok(StageResult::skip("no target BMC IP known, cannot drive firmware updates"));
        };

        let batch = if runtime.dry_run {
            let handler = SimulatedFirmwareHandler;
            self.run_batch(context, runtime, &handler, &creds, &firmware_pointers).await?
        } else {
            let mut session = context.take_ssh();
            let Some(ssh) = session.as_mut() else {
                return Ok(StageResult::failure("no SSH session available for firmware update"));
            };
            let handler = RealFirmwareHandler::new(&runtime.ipmi, &creds, ssh);
            let result = self.run_batch(context, runtime, &handler, &creds, &firmware_pointers).await;
            context.set_ssh(session.expect("session re-inserted"));
            result?
        };

        if let Some(aborted_at) = batch.aborted_at {
            return Ok(StageResult::failure(format!("firmware batch aborted at {aborted_at}")));
        }

        update_server_field(
            runtime,
            &context.server_id,
            "firmware_version",
            Value::String(
                batch
                    .results
                    .iter()
                    .map(|r| format!("{}={}", r.component, r.new_version.clone().unwrap_or_default()))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
        )
        .await;

        Ok(StageResult::success_with_data(data_map([(
            "firmware_components_updated",
            Value::from(batch.results.len() as u64),
        )])))
    }
}

impl FirmwareUpdateStageHandler {
    async fn run_batch(
        &self,
        context: &mut WorkflowContext,
        runtime: &StageRuntime,
        handler: &dyn FirmwareComponentHandler,
        creds: &IpmiCredentials,
        firmware_pointers: &BTreeMap<String, String>,
    ) -> Result<FirmwareBatchResult, WorkflowError> {
        let mut current_versions = BTreeMap::new();
        for component in ALL_COMPONENTS {
            let version = handler.query_current_version(component).await.unwrap_or(None);
            current_versions.insert(component, version);
        }

        let states = compute_states(&current_versions, firmware_pointers);
        let required: Vec<_> = states.iter().filter(|s| s.update_required).map(|s| s.component).collect();
        if required.is_empty() {
            context.push_sub_task("all firmware components already at latest version");
        } else {
            context.push_sub_task(format!("firmware update required for: {required:?}"));
        }

        let cancellation = context.cancellation_token();
        let batch = match execute_plan(&states, firmware_pointers, handler, &runtime.ipmi, creds, runtime.dry_run, &cancellation).await {
            Ok(batch) => batch,
            // Cancellation is not an error (spec §7): stop waiting and hand
            // back an empty batch so `execute` treats this as a no-op
            // success; the engine's own cancellation check at the next step
            // boundary sets the terminal status.
            Err(FirmwareError::Cancelled) => {
                context.push_sub_task("firmware reboot-readiness wait cancelled");
                FirmwareBatchResult::default()
            }
            Err(error) => return Err(WorkflowError::from(error)),
        };
        for result in &batch.results {
            context.push_sub_task(format!(
                "updated {} from {} to {}",
                result.component,
                result.old_version.clone().unwrap_or_else(|| "unknown".to_string()),
                result.new_version.clone().unwrap_or_else(|| "unknown".to_string())
            ));
        }
        Ok(batch)
    }
}
