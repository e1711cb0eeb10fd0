//! Batch update plan ordering (C8 §4.8): BMC → BIOS → UEFI → NIC → STORAGE
//! → CPLD, within each component type by priority (critical first).

use provisioner_domain::FirmwareComponent;

use crate::state::FirmwareComponentState;

/// Build the ordered execution plan from a set of computed states, dropping
/// any component that does not need an update.
#[must_use]
pub fn build_plan(states: &[FirmwareComponentState]) -> Vec<FirmwareComponentState> {
    let mut plan: Vec<FirmwareComponentState> = states.iter().filter(|s| s.update_required).cloned().collect();

    plan.sort_by(|a, b| {
        a.component
            .cmp(&b.component)
            .then_with(|| b.priority.cmp(&a.priority))
    });

    plan
}

/// Whether a failure on this component should abort the remainder of the
/// batch (spec §4.8: "on a critical/high failure the batch aborts").
#[must_use]
pub fn failure_aborts_batch(state: &FirmwareComponentState) -> bool {
    use provisioner_domain::FirmwarePriority::{Critical, High};
    matches!(state.priority, Critical | High)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use provisioner_domain::FirmwarePriority;

    use super::*;

    fn state(component: FirmwareComponent, priority: FirmwarePriority) -> FirmwareComponentState {
        FirmwareComponentState::compute(component, Some("1".into()), Some("2".into()), priority, Duration::from_secs(60), false)
    }

    #[test]
    fn orders_by_component_then_priority() {
        let states = vec![
            state(FirmwareComponent::Nic, FirmwarePriority::Low),
            state(FirmwareComponent::Bmc, FirmwarePriority::Normal),
            state(FirmwareComponent::Bios, FirmwarePriority::Critical),
        ];
        let plan = build_plan(&states);
        let order: Vec<_> = plan.iter().map(|s| s.component).collect();
        assert_eq!(order, vec![FirmwareComponent::Bmc, FirmwareComponent::Bios, FirmwareComponent::Nic]);
    }

    #[test]
    fn drops_components_not_requiring_update() {
        let up_to_date = FirmwareComponentState::compute(
            FirmwareComponent::Cpld,
            Some("1".into()),
            Some("1".into()),
            FirmwarePriority::Low,
            Duration::from_secs(10),
            false,
        );
        let plan = build_plan(&[up_to_date]);
        assert!(plan.is_empty());
    }

    #[test]
    fn critical_and_high_abort_batch() {
        let critical = state(FirmwareComponent::Bmc, FirmwarePriority::Critical);
        let low = state(FirmwareComponent::Nic, FirmwarePriority::Low);
        assert!(failure_aborts_batch(&critical));
        assert!(!failure_aborts_batch(&low));
    }
}
