//! Background provisioning worker.
//!
//! Polls the store for servers an operator has queued (`provisioning_target`
//! and `device_type` set, no workflow running or already recorded — see
//! `Store::list_servers_queued_for_provisioning`) and runs one workflow per
//! server, up to `worker.max_concurrent_workflows` at a time. Per spec §5
//! there is no cross-workflow scheduler here: this is a dumb dispatcher, not
//! a priority queue, and it is on the operator to queue at most one
//! provisioning run per server at a time.

use std::sync::Arc;

use provisioner_domain::{ServerRecord, WorkflowId};
use provisioner_strategy::{build_workflow_steps, StageRuntime, StandardStrategy};
use provisioner_workflow_engine::{WorkflowContext, WorkflowEngine};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    provisioner_common::init_tracing();
    let config = provisioner_common::Config::load()?;
    info!("starting provisioning worker");

    let runtime = provisioner_common::build_stage_runtime(&config, false).await?;
    let permits = Arc::new(Semaphore::new(config.worker.max_concurrent_workflows));
    let poll_interval = config.worker.poll_interval();

    let mut shutdown = std::pin::pin!(tokio::signal::ctrl_c());

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping poll loop");
                break;
            }
            () = tokio::time::sleep(poll_interval) => {}
        }

        let queued = match runtime.store.list_servers_queued_for_provisioning().await {
            Ok(servers) => servers,
            Err(err) => {
                error!(error = %err, "failed to list queued servers");
                continue;
            }
        };

        for server in queued {
            let permits = Arc::clone(&permits);
            let runtime = runtime.clone();
            tokio::spawn(async move {
                let Ok(permit) = permits.acquire_owned().await else {
                    return;
                };
                run_one(runtime, server).await;
                drop(permit);
            });
        }
    }

    info!("worker stopped");
    Ok(())
}

/// Run a single provisioning workflow to completion for one queued server.
/// Failures are logged, not propagated: one bad server must never take down
/// the poll loop or the other in-flight workflows.
async fn run_one(runtime: StageRuntime, server: ServerRecord) {
    let Some(device_type) = server.device_type.clone() else {
        warn!(server_id = %server.server_id, "queued server has no device_type, skipping");
        return;
    };

    let strategy = StandardStrategy;
    let steps = build_workflow_steps(&strategy, &runtime);

    let workflow_id = WorkflowId::new();
    let mut context = WorkflowContext::new(workflow_id, server.server_id.clone(), device_type, steps.len() as u32);
    context.target_bmc_ip = server.ipmi_address.clone();

    info!(server_id = %server.server_id, %workflow_id, "starting queued provisioning workflow");

    let engine = WorkflowEngine::new(steps);
    match engine.execute(&runtime.store, &mut context).await {
        Ok(outcome) => info!(server_id = %server.server_id, %workflow_id, ?outcome, "workflow finished"),
        Err(err) => error!(server_id = %server.server_id, %workflow_id, error = %err, "workflow engine error"),
    }
}
