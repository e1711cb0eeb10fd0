//! Per-component-type firmware handlers (C8 §4.8).
//!
//! The manager delegates the actual vendor interaction to a handler —
//! flashing firmware bytes is explicitly out of core scope (spec §1
//! Non-goals) — so [`RealFirmwareHandler`] only orchestrates the BMC/SSH
//! calls that drive whatever update mechanism the vendor tool exposes, and
//! [`SimulatedFirmwareHandler`] fabricates a plausible result for dry-run
//! mode and tests.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use provisioner_domain::FirmwareComponent;
use provisioner_ipmi::{IpmiAdapter, IpmiCredentials};
use provisioner_ssh::SshSession;
use regex::Regex;
use tracing::info;

use crate::errors::FirmwareError;
use crate::state::FirmwareUpdateResult;

/// A component-specific firmware handler: queries the currently installed
/// version and, given a repository pointer, applies the update.
#[async_trait]
pub trait FirmwareComponentHandler: Send + Sync {
    async fn query_current_version(&self, component: FirmwareComponent) -> Result<Option<String>, FirmwareError>;

    async fn apply_update(&self, component: FirmwareComponent, firmware_pointer: &str) -> Result<FirmwareUpdateResult, FirmwareError>;
}

/// Drives C4 for BMC version queries and updates, and a vendor-tool SSH
/// shim for everything else (BIOS/UEFI/NIC/STORAGE/CPLD).
pub struct RealFirmwareHandler<'a> {
    ipmi: &'a IpmiAdapter,
    ipmi_creds: &'a IpmiCredentials,
    ssh: &'a mut SshSession,
}

impl<'a> RealFirmwareHandler<'a> {
    pub fn new(ipmi: &'a IpmiAdapter, ipmi_creds: &'a IpmiCredentials, ssh: &'a mut SshSession) -> Self {
        Self { ipmi, ipmi_creds, ssh }
    }

    fn firmware_version_regex() -> Regex {
        Regex::new(r"(?i)firmware revision\s*:\s*([0-9a-zA-Z.\-]+)").expect("static pattern is valid")
    }
}

#[async_trait]
impl FirmwareComponentHandler for RealFirmwareHandler<'_> {
    async fn query_current_version(&self, component: FirmwareComponent) -> Result<Option<String>, FirmwareError> {
        match component {
            FirmwareComponent::Bmc => {
                let info = self.ipmi.mc_info(self.ipmi_creds).await?;
                Ok(Self::firmware_version_regex().captures(&info).map(|c| c[1].to_string()))
            }
            other => {
                let command = format!("provisioner-firmware-query --component {other}");
                let output = self.ssh.exec_one(&command).await?;
                if !output.success() {
                    return Err(FirmwareError::VersionQueryFailed {
                        component: other,
                        reason: output.stderr,
                    });
                }
                Ok(Some(output.stdout.trim().to_string()))
            }
        }
    }

    async fn apply_update(&self, component: FirmwareComponent, firmware_pointer: &str) -> Result<FirmwareUpdateResult, FirmwareError> {
        let start = Instant::now();
        let old_version = self.query_current_version(component).await?;

        let reboot_required = match component {
            FirmwareComponent::Bmc => {
                let output = self
                    .ssh
                    .exec_one(&format!("provisioner-firmware-flash --component bmc --source '{firmware_pointer}'"))
                    .await?;
                if !output.success() {
                    return Err(FirmwareError::UpdateFailed {
                        component,
                        reason: output.stderr,
                    });
                }
                false
            }
            FirmwareComponent::Bios | FirmwareComponent::Uefi => {
                let output = self
                    .ssh
                    .exec_one(&format!("provisioner-firmware-flash --component {component} --source '{firmware_pointer}'"))
                    .await?;
                if !output.success() {
                    return Err(FirmwareError::UpdateFailed {
                        component,
                        reason: output.stderr,
                    });
                }
                true
            }
            FirmwareComponent::Nic | FirmwareComponent::Storage | FirmwareComponent::Cpld => {
                let output = self
                    .ssh
                    .exec_one(&format!("provisioner-firmware-flash --component {component} --source '{firmware_pointer}'"))
                    .await?;
                if !output.success() {
                    return Err(FirmwareError::UpdateFailed {
                        component,
                        reason: output.stderr,
                    });
                }
                false
            }
        };

        let new_version = self.query_current_version(component).await?;
        info!(%component, ?old_version, ?new_version, "firmware update applied");

        Ok(FirmwareUpdateResult {
            component,
            old_version,
            new_version,
            elapsed: start.elapsed(),
            reboot_required,
            simulated: false,
        })
    }
}

/// Used only in dry-run mode and tests (spec §9 open question resolution):
/// fabricates a deterministic result without touching any adapter.
#[derive(Debug, Clone, Default)]
pub struct SimulatedFirmwareHandler;

#[async_trait]
impl FirmwareComponentHandler for SimulatedFirmwareHandler {
    async fn query_current_version(&self, _component: FirmwareComponent) -> Result<Option<String>, FirmwareError> {
        Ok(Some("simulated-current".to_string()))
    }

    async fn apply_update(&self, component: FirmwareComponent, firmware_pointer: &str) -> Result<FirmwareUpdateResult, FirmwareError> {
        info!(%component, firmware_pointer, "simulating firmware update (dry-run)");
        Ok(FirmwareUpdateResult {
            component,
            old_version: Some("simulated-current".to_string()),
            new_version: Some("simulated-latest".to_string()),
            elapsed: Duration::from_millis(50),
            reboot_required: matches!(component, FirmwareComponent::Bios | FirmwareComponent::Uefi),
            simulated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn simulated_handler_reports_reboot_for_bios_and_uefi() {
        let handler = SimulatedFirmwareHandler;
        let bios = handler.apply_update(FirmwareComponent::Bios, "https://example/fw").await.unwrap();
        let nic = handler.apply_update(FirmwareComponent::Nic, "https://example/fw").await.unwrap();
        assert!(bios.reboot_required);
        assert!(!nic.reboot_required);
        assert!(bios.simulated);
    }
}
