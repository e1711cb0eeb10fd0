//! Firmware manager orchestration (C8 §4.8): batch plan execution with
//! abort-on-critical-failure and reboot sequencing.

use std::collections::BTreeMap;
use std::time::Duration;

use provisioner_domain::{CancellationToken, FirmwareComponent, FirmwarePriority};
use provisioner_ipmi::{IpmiAdapter, IpmiCredentials, PowerCommand, PowerState};
use tracing::{info, warn};

use crate::errors::FirmwareError;
use crate::handler::FirmwareComponentHandler;
use crate::plan::{build_plan, failure_aborts_batch};
use crate::state::{FirmwareComponentState, FirmwareUpdateResult};

const POST_REBOOT_SETTLE: Duration = Duration::from_secs(30);
const READINESS_POLL_INTERVAL: Duration = Duration::from_secs(15);
const READINESS_POLL_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Default estimated durations and priorities, used when the catalog does
/// not otherwise specify them for a component (spec §4.8 leaves these as
/// per-component defaults rather than requiring every catalog entry to
/// carry them explicitly).
#[must_use]
pub fn default_priority(component: FirmwareComponent) -> FirmwarePriority {
    match component {
        FirmwareComponent::Bmc => FirmwarePriority::Critical,
        FirmwareComponent::Bios | FirmwareComponent::Uefi => FirmwarePriority::High,
        FirmwareComponent::Nic | FirmwareComponent::Storage => FirmwarePriority::Normal,
        FirmwareComponent::Cpld => FirmwarePriority::Low,
    }
}

#[must_use]
pub fn default_estimated_time(component: FirmwareComponent) -> Duration {
    match component {
        FirmwareComponent::Bmc => Duration::from_secs(5 * 60),
        FirmwareComponent::Bios | FirmwareComponent::Uefi => Duration::from_secs(10 * 60),
        FirmwareComponent::Nic | FirmwareComponent::Storage => Duration::from_secs(3 * 60),
        FirmwareComponent::Cpld => Duration::from_secs(2 * 60),
    }
}

#[must_use]
pub fn requires_reboot(component: FirmwareComponent) -> bool {
    matches!(component, FirmwareComponent::Bios | FirmwareComponent::Uefi | FirmwareComponent::Bmc)
}

/// Computed states plus the results of walking the plan, handed back to
/// the workflow engine's firmware stage.
#[derive(Debug, Clone, Default)]
pub struct FirmwareBatchResult {
    pub plan: Vec<FirmwareComponent>,
    pub results: Vec<FirmwareUpdateResult>,
    pub aborted_at: Option<FirmwareComponent>,
}

/// Build per-component state from current versions (from the handler) and
/// latest versions (from the catalog's `firmware_pointers`).
#[must_use]
pub fn compute_states(
    current_versions: &BTreeMap<FirmwareComponent, Option<String>>,
    firmware_pointers: &BTreeMap<String, String>,
) -> Vec<FirmwareComponentState> {
    current_versions
        .iter()
        .map(|(component, current)| {
            let pointer = firmware_pointers.get(component.to_string().as_str());
            let latest = pointer.map(|p| extract_latest_version(p));
            FirmwareComponentState::compute(
                *component,
                current.clone(),
                latest,
                default_priority(*component),
                default_estimated_time(*component),
                requires_reboot(*component),
            )
        })
        .collect()
}

/// The catalog's firmware pointers are repository URLs, not bare version
/// strings (e.g. `.../fw/bmc-1.2.bin`); pull a trailing version-like token
/// out of the filename, falling back to the whole pointer when none is
/// found.
fn extract_latest_version(pointer: &str) -> String {
    let filename = pointer.rsplit('/').next().unwrap_or(pointer);
    let digits_and_dots: String = filename
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits_and_dots.is_empty() {
        pointer.to_string()
    } else {
        digits_and_dots
    }
}

/// Walk the ordered plan, delegating each update to `handler`. Stops on
/// the first critical/high-priority failure; after a reboot-required
/// success, issues a reboot and waits for the host to come back.
pub async fn execute_plan(
    states: &[FirmwareComponentState],
    firmware_pointers: &BTreeMap<String, String>,
    handler: &dyn FirmwareComponentHandler,
    ipmi: &IpmiAdapter,
    ipmi_creds: &IpmiCredentials,
    dry_run: bool,
    cancellation: &CancellationToken,
) -> Result<FirmwareBatchResult, FirmwareError> {
    let plan = build_plan(states);
    let mut batch = FirmwareBatchResult {
        plan: plan.iter().map(|s| s.component).collect(),
        ..Default::default()
    };

    for state in &plan {
        let pointer = firmware_pointers.get(state.component.to_string().as_str()).cloned().unwrap_or_default();

        let outcome = handler.apply_update(state.component, &pointer).await;

        match outcome {
            Ok(result) => {
                let reboot_required = result.reboot_required;
                batch.results.push(result);

                if reboot_required && !dry_run {
                    reboot_and_wait(ipmi, ipmi_creds, cancellation).await?;
                }
            }
            Err(error) => {
                warn!(component = %state.component, %error, "firmware update failed");
                if failure_aborts_batch(state) {
                    batch.aborted_at = Some(state.component);
                    return Ok(batch);
                }
            }
        }
    }

    Ok(batch)
}

/// Issue a reboot via C4, wait for it to settle, then poll readiness up to
/// 5 minutes (spec §4.8). Races its poll sleep against `cancellation` so a
/// cancelled workflow observes this mid-poll (spec §8 scenario 3: "poll
/// returns within 30 s") rather than after the full 5-minute window.
async fn reboot_and_wait(ipmi: &IpmiAdapter, creds: &IpmiCredentials, cancellation: &CancellationToken) -> Result<(), FirmwareError> {
    ipmi.power_control(creds, PowerCommand::Cycle).await?;
    if cancellation.cancellable_sleep(POST_REBOOT_SETTLE).await {
        return Err(FirmwareError::Cancelled);
    }

    let deadline = tokio::time::Instant::now() + READINESS_POLL_TIMEOUT;
    loop {
        if cancellation.is_cancelled() {
            return Err(FirmwareError::Cancelled);
        }
        if let Ok(PowerState::On) = ipmi.power_status(creds).await {
            info!(bmc_ip = %creds.bmc_ip, "host power confirmed on after firmware reboot");
            return Ok(());
        }
        if tokio::time::Instant::now() >= deadline {
            return Err(FirmwareError::RebootTimeout);
        }
        if cancellation.cancellable_sleep(READINESS_POLL_INTERVAL).await {
            return Err(FirmwareError::Cancelled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_version_from_pointer_filename() {
        assert_eq!(extract_latest_version("https://example/fw/bmc-1.2.bin"), "1.2");
        assert_eq!(extract_latest_version("https://example/fw/no-version-here"), "https://example/fw/no-version-here");
    }

    #[test]
    fn default_priorities_put_bmc_as_critical() {
        assert_eq!(default_priority(FirmwareComponent::Bmc), FirmwarePriority::Critical);
        assert_eq!(default_priority(FirmwareComponent::Cpld), FirmwarePriority::Low);
    }
}
