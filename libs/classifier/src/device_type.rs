//! Device-type classifier (C6 §4.6).
//!
//! Scores every catalog device-type entry against the discovered facts and
//! proposes the top match, retaining alternates. Matches below 0.3
//! confidence are dropped entirely rather than proposed as alternates.

use provisioner_domain::DeviceTypeEntry;
use serde::{Deserialize, Serialize};

use crate::parsed_facts::ParsedFacts;

const CONFIDENCE_FLOOR: f64 = 0.3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceTypeMatch {
    pub device_type_id: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub best: Option<DeviceTypeMatch>,
    pub alternates: Vec<DeviceTypeMatch>,
}

/// Score `facts` against every device-type entry in the catalog using the
/// weighted formula from spec §4.6: CPU-model regex (0.3), CPU-count range
/// (0.2), RAM range (0.2), vendor match (0.2), architecture match (0.1).
#[must_use]
pub fn classify<'a>(facts: &ParsedFacts, entries: impl Iterator<Item = &'a DeviceTypeEntry>, detected_vendor: Option<&str>) -> ClassificationResult {
    let mut matches: Vec<DeviceTypeMatch> = entries
        .filter_map(|entry| {
            let confidence = score_entry(facts, entry, detected_vendor);
            if confidence >= CONFIDENCE_FLOOR {
                Some(DeviceTypeMatch {
                    device_type_id: entry.id.clone(),
                    confidence,
                })
            } else {
                None
            }
        })
        .collect();

    matches.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));

    let best = if matches.is_empty() { None } else { Some(matches.remove(0)) };

    ClassificationResult { best, alternates: matches }
}

fn score_entry(facts: &ParsedFacts, entry: &DeviceTypeEntry, detected_vendor: Option<&str>) -> f64 {
    let profile = &entry.hardware_profile;
    let mut score = 0.0;

    if let (Some(pattern), Some(model)) = (&profile.cpu_model_regex, &facts.cpu_model) {
        let regex_hit = regex::Regex::new(pattern).is_ok_and(|re| re.is_match(model));
        // A literal CPU-name string (no regex metacharacters) falls back to
        // fuzzy similarity so minor vendor string variations ("Xeon(R)
        // Gold" vs "Xeon Gold") still contribute partial credit.
        let fuzzy_hit = !regex_hit
            && profile
                .cpu_name
                .as_deref()
                .is_some_and(|name| strsim::normalized_levenshtein(&name.to_lowercase(), &model.to_lowercase()) > 0.8);
        if regex_hit || fuzzy_hit {
            score += 0.3;
        }
    }

    if let Some(count) = facts.cpu_count {
        let min_ok = profile.cpu_cores_min.is_none_or(|min| count >= min);
        let max_ok = profile.cpu_cores_max.is_none_or(|max| count <= max);
        if min_ok && max_ok && (profile.cpu_cores_min.is_some() || profile.cpu_cores_max.is_some()) {
            score += 0.2;
        }
    }

    if let Some(ram) = facts.ram_gb {
        let min_ok = profile.ram_gb_min.is_none_or(|min| ram >= min);
        let max_ok = profile.ram_gb_max.is_none_or(|max| ram <= max);
        if min_ok && max_ok && (profile.ram_gb_min.is_some() || profile.ram_gb_max.is_some()) {
            score += 0.2;
        }
    }

    if let (Some(profile_vendor), Some(detected)) = (&profile.vendor, detected_vendor) {
        if profile_vendor.eq_ignore_ascii_case(detected) {
            score += 0.2;
        }
    }

    if let (Some(profile_arch), Some(detected_arch)) = (&profile.architecture, &facts.architecture) {
        if profile_arch.eq_ignore_ascii_case(detected_arch) {
            score += 0.1;
        }
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use provisioner_domain::{BiosMethod, HardwareProfile};
    use serde_json::Value;
    use std::collections::BTreeMap;

    fn entry(id: &str, profile: HardwareProfile) -> DeviceTypeEntry {
        DeviceTypeEntry {
            id: id.to_string(),
            vendor: "supermicro".into(),
            motherboard: "X11DPi-N".into(),
            description: None,
            hardware_profile: profile,
            bios_settings: Value::Null,
            bios_setting_methods: Value::Null,
            preferred_bios_method: BiosMethod::VendorTool,
            fallback_bios_method: None,
            redfish_capable: true,
            boot_configs: Value::Null,
            cpu_configs: Value::Null,
            memory_configs: Value::Null,
            security_configs: Value::Null,
            firmware_pointers: BTreeMap::new(),
        }
    }

    #[test]
    fn full_match_scores_one() {
        let facts = ParsedFacts {
            cpu_model: Some("Intel Xeon Gold 6230".into()),
            cpu_count: Some(16),
            ram_gb: Some(256.0),
            architecture: Some("x86_64".into()),
            ..Default::default()
        };
        let device_type = entry(
            "s2.c2.large",
            HardwareProfile {
                cpu_name: None,
                cpu_model_regex: Some("Xeon Gold 62".into()),
                cpu_cores_min: Some(8),
                cpu_cores_max: Some(32),
                ram_gb_min: Some(128.0),
                ram_gb_max: Some(512.0),
                architecture: Some("x86_64".into()),
                vendor: Some("supermicro".into()),
            },
        );

        let result = classify(&facts, std::iter::once(&device_type), Some("supermicro"));
        let best = result.best.unwrap();
        assert_eq!(best.device_type_id, "s2.c2.large");
        assert!((best.confidence - 1.0).abs() < 1e-9);
    }

    #[test]
    fn below_floor_is_dropped() {
        let facts = ParsedFacts {
            cpu_model: Some("totally different cpu".into()),
            ..Default::default()
        };
        let device_type = entry(
            "s2.c2.large",
            HardwareProfile {
                cpu_name: None,
                cpu_model_regex: Some("Xeon Gold 62".into()),
                cpu_cores_min: None,
                cpu_cores_max: None,
                ram_gb_min: None,
                ram_gb_max: None,
                architecture: None,
                vendor: None,
            },
        );

        let result = classify(&facts, std::iter::once(&device_type), None);
        assert!(result.best.is_none());
    }
}
