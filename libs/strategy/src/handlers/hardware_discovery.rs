//! Hardware-discovery stage handler (C11 §4.11 data flow: "hardware
//! discovery (C3+C6)"). Acquires (or reuses) the in-band SSH session,
//! gathers facts, and classifies vendor and device-type against the
//! catalog. The session is left open in the context for later stages
//! (BIOS configuration needs it); the engine's `cleanup` hook closes it
//! on every exit path regardless of which stage left it open.

use async_trait::async_trait;
use serde_json::Value;

use provisioner_classifier::{classify, detect_vendor, ParsedFacts};
use provisioner_ssh::{SshConnectOptions, SshSession};
use provisioner_workflow_engine::{WorkflowContext, WorkflowError};

use super::update_server_field;
use crate::handler::{StageHandler, StageRuntime};
use crate::stage::{Stage, StageResult};

pub struct HardwareDiscoveryStageHandler;

#[async_trait]
impl StageHandler for HardwareDiscoveryStageHandler {
    fn stage(&self) -> Stage {
        Stage::HardwareDiscovery
    }

    async fn execute(&self, context: &mut WorkflowContext, runtime: &StageRuntime) -> Result<StageResult, WorkflowError> {
        let Some(ip) = context.get_data("server_ip").and_then(Value::as_str).map(str::to_string) else {
            return Ok(StageResult::failure("no server IP known, cannot gather hardware facts"));
        };

        if context.ssh_mut().is_none() {
            let opts = SshConnectOptions::new(ip.clone(), runtime.ssh.user.clone(), runtime.ssh.auth.clone())
                .with_connect_timeout(runtime.ssh.connect_timeout);
            let session = SshSession::acquire(opts).await?;
            context.set_ssh(session);
            context.push_sub_task(format!("acquired SSH session to {ip}"));
        }

        let facts = context
            .ssh_mut()
            .expect("session acquired above")
            .gather_hardware_facts()
            .await?;
        context.push_sub_task("gathered DMI, CPU, memory, and PCI facts");

        let parsed = ParsedFacts::from_hardware_facts(&facts);
        let detected_vendor = detect_vendor(&parsed);

        let classification = match runtime.catalog.snapshot() {
            Ok(snapshot) => {
                let vendor_name = detected_vendor.as_ref().map(|v| v.vendor.as_str());
                Some(classify(&parsed, snapshot.all_device_types(), vendor_name))
            }
            Err(error) => {
                context.push_sub_task(format!("catalog unavailable for classification: {error}"));
                None
            }
        };

        context.hardware_facts = Some(facts);

        let mut data = data_map([]);
        if let Some(model) = &parsed.cpu_model {
            update_server_field(runtime, &context.server_id, "cpu_model", Value::String(model.clone())).await;
            data.insert("cpu_model".to_string(), Value::String(model.clone()));
        }
        if let Some(ram) = parsed.ram_gb {
            update_server_field(runtime, &context.server_id, "memory_gb", Value::from(ram)).await;
            data.insert("memory_gb".to_string(), Value::from(ram));
        }
        if let Some(vendor) = &detected_vendor {
            update_server_field(runtime, &context.server_id, "server_model", Value::String(vendor.vendor.clone())).await;
            data.insert("detected_vendor".to_string(), Value::String(vendor.vendor.clone()));
            data.insert("vendor_confidence".to_string(), Value::from(vendor.confidence));
            context.push_sub_task(format!("detected vendor {} (confidence {:.2})", vendor.vendor, vendor.confidence));
        }
        if let Some(classification) = &classification {
            if let Some(best) = &classification.best {
                data.insert("classified_device_type".to_string(), Value::String(best.device_type_id.clone()));
                data.insert("classification_confidence".to_string(), Value::from(best.confidence));
                context.push_sub_task(format!(
                    "classified as {} (confidence {:.2})",
                    best.device_type_id, best.confidence
                ));
            } else {
                context.push_sub_task("no device-type match above confidence floor");
            }
        }

        update_server_field(runtime, &context.server_id, "hardware_validated", Value::Bool(true)).await;

        Ok(StageResult::success_with_data(data))
    }
}
