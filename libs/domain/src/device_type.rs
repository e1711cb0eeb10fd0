//! Device catalog entity types (C2/C6/C7).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::BiosMethod;

/// A single `device_types` leaf under `vendors.<vendor>.motherboards.<mb>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceTypeEntry {
    /// e.g. `s2.c2.large`. Unique across all (vendor, motherboard) pairs.
    pub id: String,
    pub vendor: String,
    pub motherboard: String,
    pub description: Option<String>,
    pub hardware_profile: HardwareProfile,
    /// Free-form BIOS key/value bundle, overlaid onto a pulled document
    /// by the BIOS configuration engine's Modify step.
    pub bios_settings: Value,
    #[serde(default)]
    pub bios_setting_methods: Value,
    pub preferred_bios_method: BiosMethod,
    pub fallback_bios_method: Option<BiosMethod>,
    #[serde(default)]
    pub redfish_capable: bool,
    #[serde(default)]
    pub boot_configs: Value,
    #[serde(default)]
    pub cpu_configs: Value,
    #[serde(default)]
    pub memory_configs: Value,
    #[serde(default)]
    pub security_configs: Value,
    /// Pointers into the firmware repository view, keyed by component name.
    #[serde(default)]
    pub firmware_pointers: std::collections::BTreeMap<String, String>,
}

/// Hardware-matching profile used by the classifier (C6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub cpu_name: Option<String>,
    /// Regex pattern matched against a discovered CPU model string.
    pub cpu_model_regex: Option<String>,
    pub cpu_cores_min: Option<u32>,
    pub cpu_cores_max: Option<u32>,
    pub ram_gb_min: Option<f64>,
    pub ram_gb_max: Option<f64>,
    pub architecture: Option<String>,
    pub vendor: Option<String>,
}

/// Derived counts from a tree traversal of the catalog (C2).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    pub vendor_count: usize,
    pub motherboard_count: usize,
    pub device_type_count: usize,
    pub firmware_file_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_type_entry_serde_roundtrip() {
        let entry = DeviceTypeEntry {
            id: "s2.c2.large".to_string(),
            vendor: "supermicro".to_string(),
            motherboard: "X11DPi-N".to_string(),
            description: Some("dual-socket compute".to_string()),
            hardware_profile: HardwareProfile {
                cpu_name: Some("Xeon Gold 6230".to_string()),
                cpu_model_regex: Some(r"Xeon\(R\) Gold 62\d\d".to_string()),
                cpu_cores_min: Some(16),
                cpu_cores_max: Some(20),
                ram_gb_min: Some(128.0),
                ram_gb_max: Some(512.0),
                architecture: Some("x86_64".to_string()),
                vendor: Some("supermicro".to_string()),
            },
            bios_settings: Value::Null,
            bios_setting_methods: Value::Null,
            preferred_bios_method: BiosMethod::VendorTool,
            fallback_bios_method: Some(BiosMethod::Redfish),
            redfish_capable: true,
            boot_configs: Value::Null,
            cpu_configs: Value::Null,
            memory_configs: Value::Null,
            security_configs: Value::Null,
            firmware_pointers: std::collections::BTreeMap::new(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        let restored: DeviceTypeEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, restored);
    }
}
