//! IPMI-configuration stage handler (C11 §4.11 data flow: "IPMI (C4)").
//! Only reached when `context.target_bmc_ip` is `Some` — the "no target
//! BMC IP" case is skipped one layer up, by the `ConditionalStep` wrapped
//! around every stage in [`crate::executor::build_workflow_steps`].

use async_trait::async_trait;
use serde_json::Value;

use provisioner_ipmi::{IpmiCredentials, IpmiError};
use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

const BMC_USER_SLOT: u8 = 2;

pub struct IpmiConfigurationStageHandler;

#[async_trait]
impl StageHandler for IpmiConfigurationStageHandler {
    fn stage(&self) -> Stage {
        Stage::IpmiConfiguration
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let bmc_ip = context
            .target_bmc_ip
            .clone()
            .expect("ipmi-configuration only runs when a target BMC IP is known");

        let creds = IpmiCredentials {
            bmc_ip: bmc_ip.clone(),
            username: runtime.ipmi_defaults.default_username.clone(),
            password: runtime.ipmi_defaults.default_password.clone(),
        };

        if !runtime.ipmi.ping_test(&creds).await {
            update_server_field(runtime, &context.server_id, "ipmi_address_works", Value::Bool(false)).await;
            return Ok(StageResult::retry(format!("BMC at {bmc_ip} not yet responding to IPMI")));
        }

        let vendor = runtime.ipmi.detect_vendor(&creds).await?;
        context.push_sub_task(format!("detected BMC vendor {vendor}"));

        for setting in vendor.supported_vendor_settings() {
            match runtime.ipmi.apply_vendor_setting(&creds, vendor, setting).await {
                Ok(()) => {
                    context.push_sub_task(format!("applied vendor setting {setting}"));
                    if setting == "kcs_control" {
                        update_server_field(runtime, &context.server_id, "kcs_status", Value::String("Configured".to_string())).await;
                    }
                }
                Err(IpmiError::RequiresManualConfiguration { .. }) => {
                    context.push_sub_task(format!("{setting} requires manual configuration, skipping"));
                }
                Err(error) => return Err(WorkflowError::from(error)),
            }
        }

        runtime
            .ipmi
            .configure_user(&creds, BMC_USER_SLOT, &runtime.ipmi_defaults.default_username, &runtime.ipmi_defaults.default_password)
            .await?;
        context.push_sub_task(format!("configured BMC user slot {BMC_USER_SLOT}"));

        // Power-control verification is a required post-condition of this
        // stage (spec §4.4): a power_status read failure here fails the
        // step rather than being logged and waved through.
        let power_state = match runtime.ipmi.power_status(&creds).await {
            Ok(state) => state.to_string(),
            Err(error) => {
                return Ok(StageResult::failure(format!("power-control verification failed for {bmc_ip}: {error}")));
            }
        };

        context.ipmi_snapshot = Some(provisioner_workflow_engine::IpmiSnapshot {
            vendor: Some(vendor),
            reachable: true,
            power_state: Some(power_state),
        });

        update_server_field(runtime, &context.server_id, "ipmi_address", Value::String(bmc_ip)).await;
        update_server_field(runtime, &context.server_id, "ipmi_address_works", Value::Bool(true)).await;
        update_server_field(runtime, &context.server_id, "ipmi_username", Value::String(runtime.ipmi_defaults.default_username.clone())).await;
        update_server_field(runtime, &context.server_id, "ipmi_password_set", Value::Bool(true)).await;
        update_server_field(runtime, &context.server_id, "ipmi_configured", Value::Bool(true)).await;

        Ok(StageResult::success_with_data(data_map([
            ("ipmi_vendor", Value::String(vendor.to_string())),
        ])))
    }
}
