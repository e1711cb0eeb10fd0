//! Commissioning stage handler (C11 §4.11) — the most intricate handler:
//! it inspects fleet-controller state and decides between "machine already
//! usable" (skip), "force recommission" (failed/broken/deployed/ready-
//! without-ssh), and "normal commission", then polls to a terminal status.

use std::cell::RefCell;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use provisioner_fleet::{CommissioningError, MachineStatus};
use provisioner_ssh::connection_test;
use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

const SSH_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CommissioningStageHandler;

#[async_trait]
impl StageHandler for CommissioningStageHandler {
    fn stage(&self) -> Stage {
        Stage::Commissioning
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let server_id = context.server_id.as_str().to_string();
        let machine = runtime.fleet.get_machine(&server_id).await;

        if let Some(machine) = &machine {
            if matches!(machine.status_name, MachineStatus::Ready | MachineStatus::Commissioned) {
                if let Some(ip) = machine.extract_ips().first() {
                    if connection_test(&ip.to_string(), SSH_PROBE_TIMEOUT).await.ssh_reachable {
                        context.push_sub_task("machine already commissioned and reachable over SSH, skipping commissioning");
                        return Ok(StageResult::success_with_data(data_map([("commissioning", Value::String("already-usable".to_string()))])));
                    }
                }
            }
        }

        // force_commission reconciles deployed/failed/broken/ready-without-ssh
        // states and falls through to a plain commission for anything else,
        // so one call covers both the "force recommission" and "normal
        // commission" branches spec §4.11 describes separately.
        let cancellation = context.cancellation_token();

        let progress = RefCell::new(Vec::<String>::new());
        let on_progress = |message: &str| progress.borrow_mut().push(message.to_string());
        let commission_result = runtime.fleet.force_commission(&server_id, true, &on_progress, &cancellation).await;
        for message in progress.into_inner() {
            context.push_sub_task(message);
        }
        if let Err(error) = commission_result {
            if error.is_cancelled() {
                context.push_sub_task(format!("commissioning wait for {server_id} cancelled"));
                return Ok(StageResult::success());
            }
            return Err(WorkflowError::from(error));
        }

        let progress = RefCell::new(Vec::<String>::new());
        let on_progress = |message: &str| progress.borrow_mut().push(message.to_string());
        let terminal = [MachineStatus::Ready, MachineStatus::Commissioned];
        let wait_result = runtime.fleet.wait_for_status(&server_id, &terminal, &on_progress, &cancellation).await;
        for message in progress.into_inner() {
            context.push_sub_task(message);
        }

        match wait_result {
            Ok(status) => {
                if let Some(ip) = runtime.fleet.get_machine(&server_id).await.and_then(|m| m.extract_ips().first().copied()) {
                    update_server_field(runtime, &context.server_id, "ip_address", Value::String(ip.to_string())).await;
                    context.set_data("server_ip", Value::String(ip.to_string()));
                }
                update_server_field(runtime, &context.server_id, "status_name", Value::String(status.as_str().to_string())).await;
                update_server_field(runtime, &context.server_id, "commissioning_status", Value::String("commissioned".to_string())).await;
                Ok(StageResult::success_with_data(data_map([("fleet_status", Value::String(status.as_str().to_string()))])))
            }
            // Cancellation is not an error (spec §7): stop waiting without
            // touching `status_name`, and let the engine's own cancellation
            // check at the next step boundary set the terminal status.
            Err(CommissioningError::Cancelled { .. }) => {
                context.push_sub_task(format!("commissioning wait for {server_id} cancelled"));
                Ok(StageResult::success())
            }
            Err(CommissioningError::Timeout { .. }) => {
                update_server_field(runtime, &context.server_id, "status_name", Value::String("Error: Commissioning timeout".to_string())).await;
                Ok(StageResult::failure(format!("Commissioning timeout for {server_id}")))
            }
            Err(error) => {
                update_server_field(runtime, &context.server_id, "status_name", Value::String(format!("Error: {error}"))).await;
                Err(WorkflowError::from(error))
            }
        }
    }
}
