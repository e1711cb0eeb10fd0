//! BIOS-configuration stage handler (C11 §4.11 data flow: "BIOS (C7, via
//! C3 and/or vendor tool)"). Reuses the SSH session left open by hardware
//! discovery rather than acquiring a new one.

use async_trait::async_trait;
use serde_json::Value;

use provisioner_bios::{run as run_bios_engine, VendorToolConfig};
use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

pub struct BiosConfigurationStageHandler;

#[async_trait]
impl StageHandler for BiosConfigurationStageHandler {
    fn stage(&self) -> Stage {
        Stage::BiosConfiguration
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let vendor = context
            .ipmi_snapshot
            .as_ref()
            .and_then(|snapshot| snapshot.vendor)
            .map(|v| v.to_string())
            .or_else(|| context.get_data("detected_vendor").and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());

        let device_type_settings = match runtime.catalog.snapshot() {
            Ok(snapshot) => snapshot.device_type(&context.device_type).map(|entry| entry.bios_settings.clone()).unwrap_or(Value::Null),
            Err(error) => {
                context.push_sub_task(format!("catalog unavailable, no BIOS settings to apply: {error}"));
                Value::Null
            }
        };

        let mut session = context.take_ssh();
        let Some(ssh) = session.as_mut() else {
            return Ok(StageResult::failure("no SSH session available for BIOS configuration"));
        };

        let tool_cfg = VendorToolConfig::default();
        let result = run_bios_engine(ssh, &vendor, &device_type_settings, &tool_cfg).await;
        context.set_ssh(session.expect("session re-inserted"));
        let result = result?;

        for message in &result.messages {
            context.push_sub_task(message.clone());
        }

        if result.skipped {
            update_server_field(runtime, &context.server_id, "bios_config_applied", Value::Bool(false)).await;
            return Ok(StageResult::skip(result.messages.join("; ")));
        }

        update_server_field(runtime, &context.server_id, "bios_config_applied", Value::Bool(true)).await;
        update_server_field(
            runtime,
            &context.server_id,
            "bios_config_version",
            Value::from(result.diffs_applied.len() as u64),
        )
        .await;

        context.push_sub_task(format!("applied {} BIOS setting changes", result.diffs_applied.len()));

        Ok(StageResult::success_with_data(data_map([
            ("bios_diffs_applied", Value::from(result.diffs_applied.len() as u64)),
            ("bios_reboot_required", Value::Bool(result.reboot_required)),
        ])))
    }
}
