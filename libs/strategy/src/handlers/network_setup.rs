//! Network-setup stage handler (C11 §4.11 data flow: "network wait (C3
//! probe)"). A single probe attempt per invocation; the stage's own retry
//! budget (retries=3, i.e. 4 total attempts, 5s backoff, from
//! [`crate::stage::Stage::max_retries`]) is what turns this into a wait
//! loop, not anything in this handler.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use provisioner_ssh::connection_test;
use provisioner_workflow_engine::{data_map, WorkflowContext, WorkflowError};

use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct NetworkSetupStageHandler;

#[async_trait]
impl StageHandler for NetworkSetupStageHandler {
    fn stage(&self) -> Stage {
        Stage::NetworkSetup
    }

    async fn execute(&self, context: &mut WorkflowContext, _runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let Some(ip) = context.get_data("server_ip").and_then(Value::as_str).map(str::to_string) else {
            return Ok(StageResult::failure("no server IP known, cannot probe network reachability"));
        };

        let probe = connection_test(&ip, PROBE_TIMEOUT).await;
        if !probe.tcp_reachable {
            context.push_sub_task(format!("{ip} not yet reachable over TCP, waiting"));
            return Ok(StageResult::retry(format!("{ip} unreachable over TCP")));
        }
        if !probe.ssh_reachable {
            context.push_sub_task(format!("{ip} reachable over TCP but SSH not yet answering, waiting"));
            return Ok(StageResult::retry(format!("{ip} reachable over TCP but SSH not ready")));
        }

        context.push_sub_task(format!("{ip} reachable over SSH"));
        Ok(StageResult::success_with_data(data_map([("network_ready", Value::Bool(true))])))
    }
}
