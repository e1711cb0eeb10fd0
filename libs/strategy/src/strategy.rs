//! Provisioning strategies (C11 §4.11): the stage ordering a workflow runs,
//! plus any stage-level skip it wants beyond what [`crate::executor`]
//! already applies unconditionally (no target BMC IP known).

use provisioner_workflow_engine::WorkflowContext;

use crate::stage::Stage;

/// Chooses which stages run, and in what order, for a provisioning run.
/// `should_skip` is consulted in addition to — not instead of — the
/// IPMI-configuration skip rule `build_workflow_steps` always applies.
pub trait ProvisioningStrategy: Send + Sync {
    fn stages(&self) -> Vec<Stage>;

    /// Extra, strategy-specific skip rule. The default never skips;
    /// [`build_workflow_steps`](crate::executor::build_workflow_steps)'s own
    /// IPMI-without-BMC-IP rule still applies regardless of this.
    fn should_skip(&self, _stage: Stage, _context: &WorkflowContext) -> bool {
        false
    }
}

/// The default ordering (spec §4.11): commission, bring up networking,
/// discover hardware, configure the BMC out-of-band, apply BIOS settings,
/// finalize. Firmware is not part of the standard run — most fleets only
/// need it occasionally, not on every provision, so it is
/// [`FirmwareFirstStrategy`]'s concern.
pub struct StandardStrategy;

impl ProvisioningStrategy for StandardStrategy {
    fn stages(&self) -> Vec<Stage> {
        vec![
            Stage::Commissioning,
            Stage::NetworkSetup,
            Stage::HardwareDiscovery,
            Stage::IpmiConfiguration,
            Stage::BiosConfiguration,
            Stage::Finalization,
        ]
    }
}

/// Used for fleets being brought onto a firmware baseline as part of
/// onboarding: IPMI is configured early (a firmware flash goes over the
/// same out-of-band channel it just set up) and firmware is updated before
/// BIOS settings are applied, since a firmware flash can reset BIOS
/// settings on some boards (spec §4.11, "firmware-first" strategy).
pub struct FirmwareFirstStrategy;

impl ProvisioningStrategy for FirmwareFirstStrategy {
    fn stages(&self) -> Vec<Stage> {
        vec![
            Stage::Commissioning,
            Stage::NetworkSetup,
            Stage::HardwareDiscovery,
            Stage::IpmiConfiguration,
            Stage::FirmwareUpdate,
            Stage::BiosConfiguration,
            Stage::Finalization,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_strategy_has_no_firmware_stage() {
        assert!(!StandardStrategy.stages().contains(&Stage::FirmwareUpdate));
    }

    #[test]
    fn firmware_first_strategy_updates_firmware_before_bios() {
        let stages = FirmwareFirstStrategy.stages();
        let firmware_index = stages.iter().position(|s| *s == Stage::FirmwareUpdate).unwrap();
        let bios_index = stages.iter().position(|s| *s == Stage::BiosConfiguration).unwrap();
        assert!(firmware_index < bios_index);
    }

    #[test]
    fn firmware_first_strategy_configures_ipmi_before_firmware() {
        let stages = FirmwareFirstStrategy.stages();
        let ipmi_index = stages.iter().position(|s| *s == Stage::IpmiConfiguration).unwrap();
        let firmware_index = stages.iter().position(|s| *s == Stage::FirmwareUpdate).unwrap();
        assert!(ipmi_index < firmware_index);
    }
}
