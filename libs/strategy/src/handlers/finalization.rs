//! Finalization stage handler (C11 §4.11 data flow: "finalization (C1
//! tagging + C5 tagging)"). The last stage in every strategy; always
//! releases the SSH session regardless of what earlier stages left open.

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

pub struct FinalizationStageHandler;

#[async_trait]
impl StageHandler for FinalizationStageHandler {
    fn stage(&self) -> Stage {
        Stage::Finalization
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        context.close_ssh().await;

        let server_id = context.server_id.as_str().to_string();

        if let Err(error) = runtime.fleet.tag(&server_id, "provisioned").await {
            warn!(%server_id, %error, "failed to tag server in fleet controller, continuing finalization");
        }
        if let Err(error) = runtime.fleet.mark_ready(&server_id).await {
            warn!(%server_id, %error, "failed to mark server ready in fleet controller, continuing finalization");
        }

        update_server_field(runtime, &context.server_id, "deployment_status", Value::String("ready".to_string())).await;
        update_server_field(runtime, &context.server_id, "ssh_accessible", Value::Bool(true)).await;
        update_server_field(runtime, &context.server_id, "provisioning_target", Value::String(context.device_type.clone())).await;
        update_server_field(runtime, &context.server_id, "status_name", Value::String("Provisioning Complete".to_string())).await;

        context.push_sub_task("provisioning finalized");

        Ok(StageResult::success_with_data(data_map([("finalized", Value::Bool(true))])))
    }
}
