//! BIOS configuration engine errors (C7, spec §7 `BiosConfigurationError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BiosConfigurationError {
    #[error("failed to pull current BIOS settings: {0}")]
    PullFailed(String),

    #[error("failed to push BIOS settings: {0}")]
    PushFailed(String),

    #[error("BIOS verification mismatch on key '{key}': expected {expected}, observed {observed}")]
    VerifyMismatch { key: String, expected: String, observed: String },

    #[error("vendor tool unavailable on target host: {0}")]
    VendorToolUnavailable(String),

    #[error(transparent)]
    Ssh(#[from] provisioner_ssh::SshConnectionError),
}
