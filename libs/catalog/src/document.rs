//! On-disk shape of the device catalog document (C2, spec §6).
//!
//! Deserialized directly from YAML with `serde_yml`; every field here
//! mirrors a key a human editing `catalog.yaml` would actually type.
//! [`crate::snapshot::CatalogSnapshot`] converts this into the richer,
//! query-friendly tree the rest of the system consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use provisioner_domain::BiosMethod;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogDocument {
    pub device_configuration: DeviceConfiguration,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceConfiguration {
    pub version: String,
    pub last_updated: String,
    #[serde(default)]
    pub global_settings: Value,
    #[serde(default)]
    pub vendors: BTreeMap<String, VendorEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VendorEntry {
    #[serde(default)]
    pub motherboards: BTreeMap<String, MotherboardEntry>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MotherboardEntry {
    #[serde(default)]
    pub device_types: BTreeMap<String, DeviceTypeDocument>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceTypeDocument {
    pub description: Option<String>,
    #[serde(default)]
    pub hardware_specs: HardwareSpecsDocument,
    #[serde(default)]
    pub boot_configs: Value,
    #[serde(default)]
    pub cpu_configs: Value,
    #[serde(default)]
    pub memory_configs: Value,
    #[serde(default)]
    pub security_configs: Value,
    #[serde(default)]
    pub bios_settings: Value,
    #[serde(default)]
    pub bios_setting_methods: Value,
    #[serde(default)]
    pub redfish_capable: bool,
    pub preferred_bios_method: BiosMethod,
    #[serde(default)]
    pub fallback_bios_method: Option<BiosMethod>,
    #[serde(default)]
    pub firmware_pointers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct HardwareSpecsDocument {
    pub cpu_name: Option<String>,
    pub cpu_model_regex: Option<String>,
    pub cpu_cores_min: Option<u32>,
    pub cpu_cores_max: Option<u32>,
    pub ram_gb_min: Option<f64>,
    pub ram_gb_max: Option<f64>,
    pub architecture: Option<String>,
    pub vendor: Option<String>,
}
