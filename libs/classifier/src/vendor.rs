//! Vendor detector (C6 §4.6).
//!
//! Four scoring methods run independently over the same fact set and are
//! merged by taking the maximum confidence across methods, not summing
//! them — a single strong signal (e.g. an exact BIOS-string match) should
//! win over several weak, coincidental ones.

use provisioner_domain::RedfishSupport;
use serde::{Deserialize, Serialize};

use crate::parsed_facts::ParsedFacts;

/// Characteristics attached to a detected vendor, consumed by C7/C8.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorCharacteristics {
    pub name: String,
    pub redfish_support: RedfishSupport,
    pub default_bmc_credentials: Vec<(String, String)>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VendorDetectionResult {
    pub vendor: String,
    pub confidence: f64,
}

/// DMI patterns scored at 0.3 each, with a +0.2 bonus when more than one
/// pattern for the same vendor matches.
const DMI_PATTERNS: &[(&str, &str)] = &[
    ("supermicro", "supermicro"),
    ("supermicro", "smci"),
    ("hp", "hewlett-packard"),
    ("hp", "hpe"),
    ("dell", "dell inc"),
    ("dell", "poweredge"),
    ("lenovo", "lenovo"),
];

const BIOS_PATTERNS: &[(&str, &str)] = &[
    ("supermicro", "american megatrends"),
    ("hp", "hpe bios"),
    ("dell", "dell bios"),
];

const HARDWARE_PATTERNS: &[(&str, &str)] = &[
    ("supermicro", "x11"),
    ("supermicro", "x12"),
    ("hp", "proliant"),
    ("dell", "poweredge"),
    ("lenovo", "thinksystem"),
];

/// Network-interface-naming hints: some vendors' default NIC naming
/// schemes lean toward particular prefixes in common deployments.
const NIC_NAMING_HINTS: &[(&str, &str)] = &[("dell", "em"), ("hp", "eno")];

fn known_vendors() -> impl Iterator<Item = &'static str> {
    ["supermicro", "hp", "dell", "lenovo"].into_iter()
}

fn score_patterns(haystack: &str, patterns: &[(&str, &str)], vendor: &str, per_match: f64, multi_bonus: f64) -> f64 {
    let lowered = haystack.to_lowercase();
    let matches = patterns
        .iter()
        .filter(|(v, pattern)| *v == vendor && lowered.contains(pattern))
        .count();

    if matches == 0 {
        0.0
    } else if matches > 1 {
        (per_match + multi_bonus).min(1.0)
    } else {
        per_match
    }
}

/// Score every known vendor by each of the four independent methods and
/// merge by maximum confidence, returning the best match.
#[must_use]
pub fn detect_vendor(facts: &ParsedFacts) -> Option<VendorDetectionResult> {
    let mut best: Option<VendorDetectionResult> = None;

    for vendor in known_vendors() {
        let dmi_score = score_patterns(&facts.dmi, DMI_PATTERNS, vendor, 0.3, 0.2);
        let bios_score = score_patterns(&facts.dmi, BIOS_PATTERNS, vendor, 0.4, 0.0);
        let hw_score = score_patterns(&format!("{}\n{}", facts.lshw, facts.pci_devices), HARDWARE_PATTERNS, vendor, 0.2, 0.0);
        let nic_score = {
            let hint_prefix = NIC_NAMING_HINTS.iter().find(|(v, _)| *v == vendor).map(|(_, prefix)| *prefix);
            match hint_prefix {
                Some(prefix) if facts.network_interface_names.iter().any(|name| name.starts_with(prefix)) => 0.3,
                _ => 0.0,
            }
        };

        let confidence = [dmi_score, bios_score, hw_score, nic_score].into_iter().fold(0.0_f64, f64::max);

        if confidence > 0.0 && best.as_ref().is_none_or(|b| confidence > b.confidence) {
            best = Some(VendorDetectionResult {
                vendor: vendor.to_string(),
                confidence,
            });
        }
    }

    best
}

/// Static characteristics table for known vendors (spec §4.6).
#[must_use]
pub fn vendor_characteristics(vendor: &str) -> VendorCharacteristics {
    match vendor {
        "supermicro" => VendorCharacteristics {
            name: "supermicro".into(),
            redfish_support: RedfishSupport::Full,
            default_bmc_credentials: vec![("ADMIN".into(), "ADMIN".into())],
        },
        "hp" => VendorCharacteristics {
            name: "hp".into(),
            redfish_support: RedfishSupport::Full,
            default_bmc_credentials: vec![("Administrator".into(), "password".into())],
        },
        "dell" => VendorCharacteristics {
            name: "dell".into(),
            redfish_support: RedfishSupport::Limited,
            default_bmc_credentials: vec![("root".into(), "calvin".into())],
        },
        other => VendorCharacteristics {
            name: other.to_string(),
            redfish_support: RedfishSupport::None,
            default_bmc_credentials: Vec::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts_with_dmi(dmi: &str) -> ParsedFacts {
        ParsedFacts {
            dmi: dmi.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn single_dmi_match_scores_point_three() {
        let facts = facts_with_dmi("Manufacturer: Supermicro");
        let result = detect_vendor(&facts).unwrap();
        assert_eq!(result.vendor, "supermicro");
        assert!((result.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn multiple_dmi_matches_get_bonus() {
        let facts = facts_with_dmi("Manufacturer: Supermicro, SMCI BIOS");
        let result = detect_vendor(&facts).unwrap();
        assert!((result.confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn no_match_returns_none() {
        let facts = facts_with_dmi("unknown vendor string");
        assert!(detect_vendor(&facts).is_none());
    }

    #[test]
    fn unknown_vendor_has_no_redfish_support() {
        let characteristics = vendor_characteristics("acme");
        assert_eq!(characteristics.redfish_support, RedfishSupport::None);
        assert!(characteristics.default_bmc_credentials.is_empty());
    }
}
