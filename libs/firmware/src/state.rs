//! Per-component firmware state (C8 §4.8).

use std::time::Duration;

use provisioner_domain::{FirmwareComponent, FirmwarePriority};
use serde::{Deserialize, Serialize};

/// Computed state for one firmware component on one server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareComponentState {
    pub component: FirmwareComponent,
    pub current_version: Option<String>,
    pub latest_version: Option<String>,
    pub update_required: bool,
    pub priority: FirmwarePriority,
    #[serde(with = "duration_secs")]
    pub estimated_time: Duration,
    pub reboot_required: bool,
}

impl FirmwareComponentState {
    /// Compare `current` against `latest`; equal or already-ahead versions
    /// need no update. String comparison is deliberate — firmware version
    /// schemes are not uniformly semver across vendors, and this manager
    /// does not attempt to parse them (spec §1 Non-goals).
    #[must_use]
    pub fn compute(
        component: FirmwareComponent,
        current_version: Option<String>,
        latest_version: Option<String>,
        priority: FirmwarePriority,
        estimated_time: Duration,
        reboot_required: bool,
    ) -> Self {
        let update_required = match (&current_version, &latest_version) {
            (Some(current), Some(latest)) => current != latest,
            (None, Some(_)) => true,
            _ => false,
        };

        Self {
            component,
            current_version,
            latest_version,
            update_required,
            priority,
            estimated_time,
            reboot_required,
        }
    }
}

/// Outcome of applying one component's update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirmwareUpdateResult {
    pub component: FirmwareComponent,
    pub old_version: Option<String>,
    pub new_version: Option<String>,
    #[serde(with = "duration_secs")]
    pub elapsed: Duration,
    pub reboot_required: bool,
    pub simulated: bool,
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_versions_need_no_update() {
        let state = FirmwareComponentState::compute(
            FirmwareComponent::Bmc,
            Some("1.2.0".into()),
            Some("1.2.0".into()),
            FirmwarePriority::Normal,
            Duration::from_secs(60),
            false,
        );
        assert!(!state.update_required);
    }

    #[test]
    fn mismatched_versions_require_update() {
        let state = FirmwareComponentState::compute(
            FirmwareComponent::Bios,
            Some("1.0.0".into()),
            Some("1.1.0".into()),
            FirmwarePriority::High,
            Duration::from_secs(300),
            true,
        );
        assert!(state.update_required);
    }

    #[test]
    fn unknown_current_version_assumes_update_required() {
        let state = FirmwareComponentState::compute(
            FirmwareComponent::Nic,
            None,
            Some("7.0".into()),
            FirmwarePriority::Low,
            Duration::from_secs(120),
            false,
        );
        assert!(state.update_required);
    }
}
