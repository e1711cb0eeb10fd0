//! An immutable, parsed view of the catalog document (C2).
//!
//! Once built, a [`CatalogSnapshot`] never changes; [`crate::loader::Catalog`]
//! swaps the `Arc` wholesale when the backing file's mtime advances, which is
//! what gives readers "old snapshot or new snapshot, never a mix" (spec
//! invariant 4).

use std::collections::BTreeMap;

use provisioner_domain::{CatalogStats, DeviceTypeEntry, HardwareProfile};

use crate::document::CatalogDocument;
use crate::errors::CatalogLoadError;

#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub version: String,
    pub last_updated: String,
    /// `device_type_id -> entry`, the index used by [`Self::device_type`].
    device_types_by_id: BTreeMap<String, DeviceTypeEntry>,
    /// `vendor -> motherboard -> [device_type_id]`, preserving the document
    /// tree shape for [`Self::device_types_for_motherboard`].
    tree: BTreeMap<String, BTreeMap<String, Vec<String>>>,
    stats: CatalogStats,
}

impl CatalogSnapshot {
    pub(crate) fn from_document(doc: CatalogDocument) -> Result<Self, CatalogLoadError> {
        let mut device_types_by_id = BTreeMap::new();
        let mut tree: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        let mut firmware_file_count = 0usize;

        for (vendor, vendor_entry) in &doc.device_configuration.vendors {
            let mb_map = tree.entry(vendor.clone()).or_default();
            for (motherboard, mb_entry) in &vendor_entry.motherboards {
                let mut ids = Vec::with_capacity(mb_entry.device_types.len());
                for (device_type_id, raw) in &mb_entry.device_types {
                    if let Some(pattern) = &raw.hardware_specs.cpu_model_regex {
                        regex::Regex::new(pattern).map_err(|source| CatalogLoadError::InvalidRegex {
                            vendor: vendor.clone(),
                            motherboard: motherboard.clone(),
                            device_type: device_type_id.clone(),
                            source,
                        })?;
                    }

                    firmware_file_count += raw.firmware_pointers.len();

                    let entry = DeviceTypeEntry {
                        id: device_type_id.clone(),
                        vendor: vendor.clone(),
                        motherboard: motherboard.clone(),
                        description: raw.description.clone(),
                        hardware_profile: HardwareProfile {
                            cpu_name: raw.hardware_specs.cpu_name.clone(),
                            cpu_model_regex: raw.hardware_specs.cpu_model_regex.clone(),
                            cpu_cores_min: raw.hardware_specs.cpu_cores_min,
                            cpu_cores_max: raw.hardware_specs.cpu_cores_max,
                            ram_gb_min: raw.hardware_specs.ram_gb_min,
                            ram_gb_max: raw.hardware_specs.ram_gb_max,
                            architecture: raw.hardware_specs.architecture.clone(),
                            vendor: raw.hardware_specs.vendor.clone().or_else(|| Some(vendor.clone())),
                        },
                        bios_settings: raw.bios_settings.clone(),
                        bios_setting_methods: raw.bios_setting_methods.clone(),
                        preferred_bios_method: raw.preferred_bios_method,
                        fallback_bios_method: raw.fallback_bios_method,
                        redfish_capable: raw.redfish_capable,
                        boot_configs: raw.boot_configs.clone(),
                        cpu_configs: raw.cpu_configs.clone(),
                        memory_configs: raw.memory_configs.clone(),
                        security_configs: raw.security_configs.clone(),
                        firmware_pointers: raw.firmware_pointers.clone(),
                    };

                    if device_types_by_id.insert(device_type_id.clone(), entry).is_some() {
                        return Err(CatalogLoadError::DuplicateDeviceTypeId(device_type_id.clone()));
                    }
                    ids.push(device_type_id.clone());
                }
                mb_map.insert(motherboard.clone(), ids);
            }
        }

        let stats = CatalogStats {
            vendor_count: tree.len(),
            motherboard_count: tree.values().map(BTreeMap::len).sum(),
            device_type_count: device_types_by_id.len(),
            firmware_file_count,
        };

        Ok(Self {
            version: doc.device_configuration.version,
            last_updated: doc.device_configuration.last_updated,
            device_types_by_id,
            tree,
            stats,
        })
    }

    /// Lookup by device-type id, walking the flat index built at load time.
    /// Per invariant 4, this is required to agree with a tree walk.
    #[must_use]
    pub fn device_type(&self, id: &str) -> Option<&DeviceTypeEntry> {
        self.device_types_by_id.get(id)
    }

    /// Lookup by motherboard: the enclosing vendor plus the device-types
    /// enumerated under it.
    #[must_use]
    pub fn device_types_for_motherboard(&self, vendor: &str, motherboard: &str) -> Vec<&DeviceTypeEntry> {
        self.tree
            .get(vendor)
            .and_then(|mbs| mbs.get(motherboard))
            .map(|ids| ids.iter().filter_map(|id| self.device_types_by_id.get(id)).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn all_device_types(&self) -> impl Iterator<Item = &DeviceTypeEntry> {
        self.device_types_by_id.values()
    }

    #[must_use]
    pub fn vendors(&self) -> impl Iterator<Item = &str> {
        self.tree.keys().map(String::as_str)
    }

    #[must_use]
    pub const fn stats(&self) -> CatalogStats {
        self.stats
    }

    /// Walks `vendor -> motherboard -> device_types` and confirms the id
    /// index agrees, used by invariant-4 tests and by operator tooling that
    /// wants to sanity-check a freshly edited catalog file.
    #[must_use]
    pub fn tree_lookup_agrees_with_index(&self, id: &str) -> bool {
        let by_id = self.device_type(id);
        let by_tree = self
            .tree
            .iter()
            .flat_map(|(_, mbs)| mbs.values())
            .any(|ids| ids.iter().any(|candidate| candidate == id));
        by_id.is_some() == by_tree
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> CatalogDocument {
        serde_yml::from_str(
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
              description: "dual-socket compute"
              preferred_bios_method: vendor_tool
              hardware_specs:
                cpu_model_regex: "Xeon\\(R\\) Gold 62\\d\\d"
                cpu_cores_min: 16
                cpu_cores_max: 20
                ram_gb_min: 128.0
                ram_gb_max: 512.0
              firmware_pointers:
                bmc: "https://example/fw/bmc-1.2.bin"
"#,
        )
        .unwrap()
    }

    #[test]
    fn builds_index_and_stats() {
        let snapshot = CatalogSnapshot::from_document(sample_doc()).unwrap();
        assert_eq!(snapshot.stats().device_type_count, 1);
        assert_eq!(snapshot.stats().vendor_count, 1);
        assert_eq!(snapshot.stats().firmware_file_count, 1);
        assert!(snapshot.device_type("s2.c2.large").is_some());
        assert!(snapshot.device_type("missing").is_none());
    }

    #[test]
    fn tree_and_index_lookup_agree() {
        let snapshot = CatalogSnapshot::from_document(sample_doc()).unwrap();
        assert!(snapshot.tree_lookup_agrees_with_index("s2.c2.large"));
        assert!(snapshot.tree_lookup_agrees_with_index("nonexistent"));
    }

    #[test]
    fn motherboard_lookup_returns_enclosing_device_types() {
        let snapshot = CatalogSnapshot::from_document(sample_doc()).unwrap();
        let found = snapshot.device_types_for_motherboard("supermicro", "X11DPi-N");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "s2.c2.large");
    }

    #[test]
    fn rejects_duplicate_device_type_ids_across_motherboards() {
        let mut doc = sample_doc();
        let extra_mb = doc.device_configuration.vendors["supermicro"].motherboards["X11DPi-N"].clone();
        doc.device_configuration.vendors.get_mut("supermicro").unwrap().motherboards.insert("X11DPi-N-2".into(), extra_mb);
        let result = CatalogSnapshot::from_document(doc);
        assert!(matches!(result, Err(CatalogLoadError::DuplicateDeviceTypeId(_))));
    }
}
