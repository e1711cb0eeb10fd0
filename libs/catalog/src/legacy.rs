//! Backward-compatible adapters projecting the unified catalog into the
//! two legacy shapes earlier tooling expected (C2 §4.2): a per-device BIOS/
//! hardware "device mappings" view, and a per-vendor/motherboard firmware
//! repository view. Both are read-only projections over a snapshot; a
//! missing catalog file yields an empty view rather than an error.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::loader::{catalog_file_missing, Catalog};
use crate::snapshot::CatalogSnapshot;

/// Per-device BIOS/hardware detail, keyed by device-type id.
#[derive(Debug, Clone, Serialize, Default)]
pub struct DeviceMappingsView {
    pub devices: BTreeMap<String, DeviceMapping>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeviceMapping {
    pub vendor: String,
    pub motherboard: String,
    pub cpu_name: Option<String>,
    pub bios_settings: serde_json::Value,
    pub preferred_bios_method: String,
}

impl DeviceMappingsView {
    #[must_use]
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let devices = snapshot
            .all_device_types()
            .map(|entry| {
                (
                    entry.id.clone(),
                    DeviceMapping {
                        vendor: entry.vendor.clone(),
                        motherboard: entry.motherboard.clone(),
                        cpu_name: entry.hardware_profile.cpu_name.clone(),
                        bios_settings: entry.bios_settings.clone(),
                        preferred_bios_method: entry.preferred_bios_method.to_string(),
                    },
                )
            })
            .collect();
        Self { devices }
    }

    /// Load directly from `path`, returning an empty view (and logging)
    /// when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, crate::errors::CatalogLoadError> {
        if catalog_file_missing(path) {
            return Ok(Self::default());
        }
        let catalog = Catalog::new(path);
        Ok(Self::from_snapshot(&catalog.snapshot()?))
    }
}

/// Per-vendor, per-motherboard firmware pointers.
#[derive(Debug, Clone, Serialize, Default)]
pub struct FirmwareRepositoryView {
    /// `vendor -> motherboard -> component -> pointer`.
    pub entries: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
}

impl FirmwareRepositoryView {
    #[must_use]
    pub fn from_snapshot(snapshot: &CatalogSnapshot) -> Self {
        let mut entries: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>> = BTreeMap::new();
        for entry in snapshot.all_device_types() {
            if entry.firmware_pointers.is_empty() {
                continue;
            }
            entries
                .entry(entry.vendor.clone())
                .or_default()
                .entry(entry.motherboard.clone())
                .or_insert_with(|| entry.firmware_pointers.clone());
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self, crate::errors::CatalogLoadError> {
        if catalog_file_missing(path) {
            return Ok(Self::default());
        }
        let catalog = Catalog::new(path);
        Ok(Self::from_snapshot(&catalog.snapshot()?))
    }

    #[must_use]
    pub fn pointer_for(&self, vendor: &str, motherboard: &str, component: &str) -> Option<&str> {
        self.entries
            .get(vendor)
            .and_then(|mbs| mbs.get(motherboard))
            .and_then(|components| components.get(component))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_snapshot() -> CatalogSnapshot {
        let doc = serde_yml::from_str(
            r#"
device_configuration:
  version: "1.0.0"
  last_updated: "2026-01-01"
  vendors:
    supermicro:
      motherboards:
        X11DPi-N:
          device_types:
            s2.c2.large:
              preferred_bios_method: vendor_tool
              hardware_specs:
                cpu_name: "Xeon Gold 6230"
              firmware_pointers:
                bmc: "fw/bmc-1.2.bin"
"#,
        )
        .unwrap();
        CatalogSnapshot::from_document(doc).unwrap()
    }

    #[test]
    fn device_mappings_projects_flat_view() {
        let view = DeviceMappingsView::from_snapshot(&sample_snapshot());
        let mapping = view.devices.get("s2.c2.large").unwrap();
        assert_eq!(mapping.vendor, "supermicro");
        assert_eq!(mapping.cpu_name.as_deref(), Some("Xeon Gold 6230"));
    }

    #[test]
    fn firmware_repository_projects_pointers() {
        let view = FirmwareRepositoryView::from_snapshot(&sample_snapshot());
        assert_eq!(view.pointer_for("supermicro", "X11DPi-N", "bmc"), Some("fw/bmc-1.2.bin"));
        assert_eq!(view.pointer_for("supermicro", "X11DPi-N", "bios"), None);
    }

    #[test]
    fn missing_file_yields_empty_views() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.yaml");
        assert!(DeviceMappingsView::load(&missing).unwrap().devices.is_empty());
        assert!(FirmwareRepositoryView::load(&missing).unwrap().entries.is_empty());
    }

    #[test]
    fn malformed_file_raises() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(f, "not: [valid, catalog").unwrap();
        let result = DeviceMappingsView::load(&path);
        assert!(result.is_err());
    }
}
