//! Domain enumerations shared across the workflow engine, store, and
//! boarding validator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Overall state of a commissioning/provisioning workflow (C9/C11).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    Pending,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl WorkflowStatus {
    /// Whether this status represents a workflow that has stopped running.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Cancelled)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// Outcome of a single workflow step execution (C9/C10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
    Retrying,
}

impl StepStatus {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failed | Self::Skipped)
    }

    /// Valid forward transitions for the step state machine.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Running)
                | (Self::Running, Self::Success)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Skipped)
                | (Self::Running, Self::Retrying)
                | (Self::Retrying, Self::Running)
                | (Self::Retrying, Self::Failed)
        )
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Retrying => "retrying",
        };
        f.write_str(s)
    }
}

/// Pass/fail outcome of a single boarding validation check (C12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    Pass,
    Fail,
    Warning,
    Skip,
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Warning => "warning",
            Self::Skip => "skip",
        };
        f.write_str(s)
    }
}

/// Category a boarding validation check belongs to (C12).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationCategory {
    Connectivity,
    Hardware,
    Ipmi,
    Bios,
    Network,
    Configuration,
}

impl fmt::Display for ValidationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Connectivity => "connectivity",
            Self::Hardware => "hardware",
            Self::Ipmi => "ipmi",
            Self::Bios => "bios",
            Self::Network => "network",
            Self::Configuration => "configuration",
        };
        f.write_str(s)
    }
}

/// How the BIOS configuration engine reaches a given board (C7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiosMethod {
    Redfish,
    VendorTool,
    Hybrid,
}

impl fmt::Display for BiosMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Redfish => "redfish",
            Self::VendorTool => "vendor_tool",
            Self::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// Degree of Redfish support a device type's catalog entry declares (C2/C6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedfishSupport {
    None,
    Limited,
    Full,
}

impl fmt::Display for RedfishSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Limited => "limited",
            Self::Full => "full",
        };
        f.write_str(s)
    }
}

/// Updatable firmware component (C8). Ordering matches the fixed update
/// sequence: BMC before BIOS/UEFI, peripherals last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwareComponent {
    Bmc,
    Bios,
    Uefi,
    Nic,
    Storage,
    Cpld,
}

impl fmt::Display for FirmwareComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bmc => "bmc",
            Self::Bios => "bios",
            Self::Uefi => "uefi",
            Self::Nic => "nic",
            Self::Storage => "storage",
            Self::Cpld => "cpld",
        };
        f.write_str(s)
    }
}

/// Priority assigned to a firmware update (C8), used to decide whether a
/// stale component blocks commissioning or is merely reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FirmwarePriority {
    Low,
    Normal,
    High,
    Critical,
}

impl fmt::Display for FirmwarePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_transitions() {
        assert!(StepStatus::Pending.can_transition_to(StepStatus::Running));
        assert!(StepStatus::Running.can_transition_to(StepStatus::Retrying));
        assert!(StepStatus::Retrying.can_transition_to(StepStatus::Running));
        assert!(!StepStatus::Success.can_transition_to(StepStatus::Running));
        assert!(!StepStatus::Pending.can_transition_to(StepStatus::Success));
    }

    #[test]
    fn workflow_status_terminal() {
        assert!(WorkflowStatus::Success.is_terminal());
        assert!(WorkflowStatus::Failed.is_terminal());
        assert!(WorkflowStatus::Cancelled.is_terminal());
        assert!(!WorkflowStatus::Running.is_terminal());
        assert!(!WorkflowStatus::Pending.is_terminal());
    }

    #[test]
    fn firmware_component_ordering() {
        assert!(FirmwareComponent::Bmc < FirmwareComponent::Bios);
        assert!(FirmwareComponent::Bios < FirmwareComponent::Nic);
    }
}
