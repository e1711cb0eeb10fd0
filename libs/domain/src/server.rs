//! Server record domain type (C1/C3).
//!
//! Mirrors the `servers` table column-for-column. The store returns and
//! accepts this type directly; `update_server` operates on individual
//! fields via [`ServerField`] rather than requiring a full record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::ServerId;

/// Full server record as persisted in the `servers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerRecord {
    pub server_id: ServerId,
    pub status_name: Option<String>,
    pub is_ready: bool,
    pub server_model: Option<String>,
    pub ip_address: Option<String>,
    pub ip_address_works: bool,
    pub ipmi_address: Option<String>,
    pub ipmi_address_works: bool,
    pub kcs_status: Option<String>,
    pub host_interface_status: Option<String>,
    pub ipmi_username: Option<String>,
    pub ipmi_password_set: bool,
    pub bios_password_set: bool,
    pub redfish_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_seen: Option<DateTime<Utc>>,
    pub cpu_model: Option<String>,
    pub memory_gb: Option<f64>,
    /// Free-form JSON describing disks, as reported by hardware discovery.
    pub storage_info: Option<String>,
    /// Free-form JSON array describing NICs.
    pub network_interfaces: Option<String>,
    pub firmware_version: Option<String>,
    pub rack_location: Option<String>,
    /// Free-form JSON array of operator tags.
    pub tags: Option<String>,
    pub power_state: Option<String>,
    pub last_power_change: Option<DateTime<Utc>>,
    pub device_type: Option<String>,
    pub server_type: Option<String>,
    pub commissioning_status: Option<String>,
    pub workflow_id: Option<String>,
    pub workflow_status: Option<String>,
    pub last_workflow_run: Option<DateTime<Utc>>,
    pub bios_config_applied: bool,
    pub bios_config_version: Option<String>,
    pub ipmi_configured: bool,
    pub ssh_accessible: bool,
    pub hardware_validated: bool,
    pub provisioning_target: Option<String>,
    pub assigned_role: Option<String>,
    pub deployment_status: Option<String>,
    pub notes: Option<String>,
}

impl ServerRecord {
    /// A freshly-created record with only `server_id` and timestamps set,
    /// matching what `ensure_server` inserts for a never-before-seen id.
    #[must_use]
    pub fn new(server_id: ServerId, now: DateTime<Utc>) -> Self {
        Self {
            server_id,
            status_name: None,
            is_ready: false,
            server_model: None,
            ip_address: None,
            ip_address_works: false,
            ipmi_address: None,
            ipmi_address_works: false,
            kcs_status: None,
            host_interface_status: None,
            ipmi_username: None,
            ipmi_password_set: false,
            bios_password_set: false,
            redfish_available: false,
            created_at: now,
            updated_at: now,
            last_seen: None,
            cpu_model: None,
            memory_gb: None,
            storage_info: None,
            network_interfaces: None,
            firmware_version: None,
            rack_location: None,
            tags: None,
            power_state: None,
            last_power_change: None,
            device_type: None,
            server_type: None,
            commissioning_status: None,
            workflow_id: None,
            workflow_status: None,
            last_workflow_run: None,
            bios_config_applied: false,
            bios_config_version: None,
            ipmi_configured: false,
            ssh_accessible: false,
            hardware_validated: false,
            provisioning_target: None,
            assigned_role: None,
            deployment_status: None,
            notes: None,
        }
    }
}

/// A single row of `power_state_history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerStateChange {
    pub id: i64,
    pub server_id: ServerId,
    pub old_state: Option<String>,
    pub new_state: String,
    pub changed_at: DateTime<Utc>,
    pub changed_by: Option<String>,
}

/// Field names accepted by `update_server`. Unknown field names supplied at
/// the adapter boundary (e.g. a stale step from a future version) are
/// tolerated and silently ignored, per spec; this enum enumerates the ones
/// the store actually recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerField {
    StatusName,
    IsReady,
    ServerModel,
    IpAddress,
    IpAddressWorks,
    IpmiAddress,
    IpmiAddressWorks,
    KcsStatus,
    HostInterfaceStatus,
    IpmiUsername,
    IpmiPasswordSet,
    BiosPasswordSet,
    RedfishAvailable,
    LastSeen,
    CpuModel,
    MemoryGb,
    StorageInfo,
    NetworkInterfaces,
    FirmwareVersion,
    RackLocation,
    Tags,
    PowerState,
    LastPowerChange,
    DeviceType,
    ServerType,
    CommissioningStatus,
    WorkflowId,
    WorkflowStatus,
    LastWorkflowRun,
    BiosConfigApplied,
    BiosConfigVersion,
    IpmiConfigured,
    SshAccessible,
    HardwareValidated,
    ProvisioningTarget,
    AssignedRole,
    DeploymentStatus,
    Notes,
}

impl ServerField {
    /// Parse a free-form field name, returning `None` for anything the
    /// store does not recognize. Callers treat `None` as a no-op, never
    /// an error.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }

    #[must_use]
    pub fn column_name(self) -> &'static str {
        match self {
            Self::StatusName => "status_name",
            Self::IsReady => "is_ready",
            Self::ServerModel => "server_model",
            Self::IpAddress => "ip_address",
            Self::IpAddressWorks => "ip_address_works",
            Self::IpmiAddress => "ipmi_address",
            Self::IpmiAddressWorks => "ipmi_address_works",
            Self::KcsStatus => "kcs_status",
            Self::HostInterfaceStatus => "host_interface_status",
            Self::IpmiUsername => "ipmi_username",
            Self::IpmiPasswordSet => "ipmi_password_set",
            Self::BiosPasswordSet => "bios_password_set",
            Self::RedfishAvailable => "redfish_available",
            Self::LastSeen => "last_seen",
            Self::CpuModel => "cpu_model",
            Self::MemoryGb => "memory_gb",
            Self::StorageInfo => "storage_info",
            Self::NetworkInterfaces => "network_interfaces",
            Self::FirmwareVersion => "firmware_version",
            Self::RackLocation => "rack_location",
            Self::Tags => "tags",
            Self::PowerState => "power_state",
            Self::LastPowerChange => "last_power_change",
            Self::DeviceType => "device_type",
            Self::ServerType => "server_type",
            Self::CommissioningStatus => "commissioning_status",
            Self::WorkflowId => "workflow_id",
            Self::WorkflowStatus => "workflow_status",
            Self::LastWorkflowRun => "last_workflow_run",
            Self::BiosConfigApplied => "bios_config_applied",
            Self::BiosConfigVersion => "bios_config_version",
            Self::IpmiConfigured => "ipmi_configured",
            Self::SshAccessible => "ssh_accessible",
            Self::HardwareValidated => "hardware_validated",
            Self::ProvisioningTarget => "provisioning_target",
            Self::AssignedRole => "assigned_role",
            Self::DeploymentStatus => "deployment_status",
            Self::Notes => "notes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_server_record_is_unready() {
        let now = Utc::now();
        let record = ServerRecord::new(ServerId::new("abc12"), now);
        assert!(!record.is_ready);
        assert_eq!(record.created_at, now);
        assert_eq!(record.updated_at, now);
    }

    #[test]
    fn unknown_field_name_parses_to_none() {
        assert_eq!(ServerField::parse("not_a_real_column"), None);
        assert_eq!(ServerField::parse("ip_address"), Some(ServerField::IpAddress));
    }
}
