//! The BIOS settings document manipulated through Pull/Modify/Push/Verify
//! (C7 §4.7). Kept as a flat JSON object rather than a vendor-specific
//! schema — parsing vendor BIOS XML is explicitly out of scope (spec §1
//! Non-goals); vendor adapters are responsible for producing this shape.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BiosDocument {
    pub settings: Map<String, Value>,
    /// Set by the placeholder path when a vendor has no real adapter yet
    /// (spec §4.7 "Other vendors" / scenario 4).
    pub note: Option<String>,
}

impl BiosDocument {
    #[must_use]
    pub fn placeholder(note: impl Into<String>) -> Self {
        Self {
            settings: Map::new(),
            note: Some(note.into()),
        }
    }

    #[must_use]
    pub const fn is_placeholder(&self) -> bool {
        self.note.is_some()
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.settings.get(key)
    }
}

/// One changed key recorded by the Modify step.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingDiff {
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Value,
}

/// Overlay `device_type_settings` onto `current`, recording a diff of every
/// key whose value actually changes.
#[must_use]
pub fn overlay_settings(current: &BiosDocument, device_type_settings: &Value) -> (BiosDocument, Vec<SettingDiff>) {
    let mut merged = current.settings.clone();
    let mut diffs = Vec::new();

    if let Value::Object(overlay) = device_type_settings {
        for (key, new_value) in overlay {
            let old_value = merged.get(key).cloned();
            if old_value.as_ref() != Some(new_value) {
                diffs.push(SettingDiff {
                    key: key.clone(),
                    old_value,
                    new_value: new_value.clone(),
                });
                merged.insert(key.clone(), new_value.clone());
            }
        }
    }

    (
        BiosDocument {
            settings: merged,
            note: None,
        },
        diffs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_records_only_changed_keys() {
        let mut current = BiosDocument::default();
        current.settings.insert("boot_mode".into(), json!("legacy"));
        current.settings.insert("hyperthreading".into(), json!(true));

        let overlay = json!({ "boot_mode": "uefi", "hyperthreading": true });
        let (merged, diffs) = overlay_settings(&current, &overlay);

        assert_eq!(merged.get("boot_mode"), Some(&json!("uefi")));
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].key, "boot_mode");
    }

    #[test]
    fn placeholder_document_has_no_changes_applied() {
        let placeholder = BiosDocument::placeholder("Lenovo BIOS configuration not yet supported");
        let (_, diffs) = overlay_settings(&placeholder, &serde_json::Value::Null);
        assert!(diffs.is_empty());
        assert!(placeholder.is_placeholder());
    }
}
