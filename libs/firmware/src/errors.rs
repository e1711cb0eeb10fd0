//! Firmware manager errors (C8, spec §7).

use provisioner_domain::FirmwareComponent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FirmwareError {
    #[error("failed to query current version for {component}: {reason}")]
    VersionQueryFailed { component: FirmwareComponent, reason: String },

    #[error("firmware update failed for {component}: {reason}")]
    UpdateFailed { component: FirmwareComponent, reason: String },

    #[error("reboot did not complete within the allotted window")]
    RebootTimeout,

    /// The reboot-readiness wait was cancelled rather than having failed
    /// or timed out (spec §7 "cancellation is not an error").
    #[error("reboot-readiness wait was cancelled")]
    Cancelled,

    #[error(transparent)]
    Ipmi(#[from] provisioner_ipmi::IpmiError),

    #[error(transparent)]
    Ssh(#[from] provisioner_ssh::SshConnectionError),
}
