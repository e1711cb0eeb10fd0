//! Stage tags and their timing table (C11 §4.11).
//!
//! `FirmwareUpdate` is not one of the six tags spec §4.11's table lists for
//! the standard strategy; it only appears in
//! [`crate::strategy::FirmwareFirstStrategy`]'s stage list, per that
//! strategy's reordering. Its timeout/retry figures are this crate's own
//! addition, not a spec table entry — a single batch firmware run can take
//! longer than any of the six canonical stages, and a partial flash is not
//! safe to blindly retry, hence the single attempt.

use std::time::Duration;

/// One stage of a provisioning run. A [`crate::strategy::ProvisioningStrategy`]
/// returns these in the order it wants them executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Commissioning,
    NetworkSetup,
    HardwareDiscovery,
    IpmiConfiguration,
    FirmwareUpdate,
    BiosConfiguration,
    Finalization,
}

impl Stage {
    /// The tag used as this stage's step name and `next_step` jump target.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Commissioning => "commissioning",
            Self::NetworkSetup => "network-setup",
            Self::HardwareDiscovery => "hardware-discovery",
            Self::IpmiConfiguration => "ipmi-configuration",
            Self::FirmwareUpdate => "firmware-update",
            Self::BiosConfiguration => "bios-configuration",
            Self::Finalization => "finalization",
        }
    }

    /// Default per-stage timeout (spec §4.11 table).
    #[must_use]
    pub const fn timeout(self) -> Duration {
        match self {
            Self::Commissioning => Duration::from_secs(1800),
            Self::NetworkSetup => Duration::from_secs(300),
            Self::HardwareDiscovery => Duration::from_secs(600),
            Self::BiosConfiguration => Duration::from_secs(600),
            Self::IpmiConfiguration => Duration::from_secs(300),
            Self::FirmwareUpdate => Duration::from_secs(2400),
            Self::Finalization => Duration::from_secs(180),
        }
    }

    /// Default per-stage retry budget (spec §4.11 table).
    #[must_use]
    pub const fn max_retries(self) -> u32 {
        match self {
            Self::Commissioning => 2,
            Self::NetworkSetup => 3,
            Self::HardwareDiscovery => 2,
            Self::BiosConfiguration => 2,
            Self::IpmiConfiguration => 3,
            Self::FirmwareUpdate => 1,
            Self::Finalization => 1,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Outcome of one [`crate::handler::StageHandler::execute`] call, mirroring
/// [`provisioner_workflow_engine::StepOutcome`] so translation to the step
/// framework is a straight 1:1 mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Success,
    Failure,
    Retry,
    Skip,
}

/// The result of running one stage, mirroring
/// [`provisioner_workflow_engine::StepExecutionResult`].
#[derive(Debug, Clone, Default)]
pub struct StageResult {
    pub outcome: Option<StageOutcome>,
    pub message: Option<String>,
    pub data: serde_json::Map<String, serde_json::Value>,
    pub next_stage: Option<Stage>,
}

impl StageResult {
    #[must_use]
    pub fn success() -> Self {
        Self {
            outcome: Some(StageOutcome::Success),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn success_with_data(data: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            outcome: Some(StageOutcome::Success),
            data,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StageOutcome::Failure),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn retry(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StageOutcome::Retry),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn skip(message: impl Into<String>) -> Self {
        Self {
            outcome: Some(StageOutcome::Skip),
            message: Some(message.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn jump_to(mut self, stage: Stage) -> Self {
        self.next_stage = Some(stage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commissioning_matches_the_spec_table() {
        assert_eq!(Stage::Commissioning.timeout(), Duration::from_secs(1800));
        assert_eq!(Stage::Commissioning.max_retries(), 2);
    }

    #[test]
    fn tags_are_kebab_case() {
        assert_eq!(Stage::NetworkSetup.tag(), "network-setup");
        assert_eq!(Stage::HardwareDiscovery.tag(), "hardware-discovery");
    }

    #[test]
    fn stage_result_builders_set_outcome() {
        assert_eq!(StageResult::success().outcome, Some(StageOutcome::Success));
        assert_eq!(StageResult::retry("busy").outcome, Some(StageOutcome::Retry));
    }
}
