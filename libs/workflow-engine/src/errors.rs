//! Engine-level error taxonomy (C9/C10, spec §7).
//!
//! `WorkflowError` is the base: anything that halts a workflow outright.
//! The adapter-specific variants below it mirror spec §7 ("error
//! taxonomy") so a step can convert a typed collaborator failure into a
//! terminal engine error without losing which collaborator raised it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("prerequisites not satisfied for step '{step}'")]
    PrerequisitesNotMet { step: String },

    #[error("step '{step}' timed out after {timeout_secs}s")]
    StepTimeout { step: String, timeout_secs: u64 },

    #[error(transparent)]
    Commissioning(#[from] provisioner_fleet::CommissioningError),

    #[error(transparent)]
    BiosConfiguration(#[from] provisioner_bios::BiosConfigurationError),

    #[error(transparent)]
    IpmiConfiguration(#[from] provisioner_ipmi::IpmiError),

    #[error(transparent)]
    SshConnection(#[from] provisioner_ssh::SshConnectionError),

    #[error(transparent)]
    FirmwareUpdate(#[from] provisioner_firmware::FirmwareError),

    #[error("catalog or configuration inconsistency: {0}")]
    ConfigurationValidation(String),

    #[error("step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },
}

impl WorkflowError {
    /// Render the error the way it is recorded in
    /// `workflow_history.error_message` and the context's error list —
    /// `Display` plus nothing else, so every call site formats errors the
    /// same way.
    #[must_use]
    pub fn as_message(&self) -> String {
        self.to_string()
    }
}
