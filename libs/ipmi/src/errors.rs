//! IPMI/BMC adapter errors (C4, spec §7 `IPMIConfigurationError`).
//!
//! Timeout, authentication failure, and transport failure are kept as
//! distinct variants per spec §4.4 — callers branch on which one occurred
//! (a timeout warrants a retry, an auth failure does not).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpmiError {
    #[error("ipmitool command to {bmc_ip} timed out after {timeout_secs}s")]
    Timeout { bmc_ip: String, timeout_secs: u64 },

    #[error("ipmitool authentication to {bmc_ip} failed")]
    AuthFailed { bmc_ip: String },

    #[error("failed to invoke ipmitool")]
    Transport(#[source] std::io::Error),

    #[error("ipmitool command on {bmc_ip} exited with status {status}: {stderr}")]
    CommandFailed { bmc_ip: String, status: i32, stderr: String },

    #[error("power control verification failed on {bmc_ip}: expected {expected}, observed {observed}")]
    PowerVerificationFailed {
        bmc_ip: String,
        expected: String,
        observed: String,
    },

    #[error("{setting} is not supported by ipmitool for vendor {vendor:?}; requires manual configuration")]
    RequiresManualConfiguration { vendor: crate::vendor::BmcVendor, setting: String },
}
