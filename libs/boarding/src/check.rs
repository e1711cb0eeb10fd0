//! The boarding check contract (C12 §4.12).

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};

use crate::context::BoardingContext;

/// One named category of boarding validation. `required_prerequisites`
/// lists earlier categories (in dependency order) that must already have
/// at least one passing result before this check is allowed to run.
#[async_trait]
pub trait BoardingCheck: Send + Sync {
    fn check_name(&self) -> &'static str;

    fn category(&self) -> ValidationCategory;

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[]
    }

    /// If this check fails, the remaining checks in the same category are
    /// recorded as `skip` rather than run (spec §8 scenario 6: an IPMI
    /// authentication failure skips the extended IPMI checks behind it).
    fn gates_category(&self) -> bool {
        false
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult;
}
