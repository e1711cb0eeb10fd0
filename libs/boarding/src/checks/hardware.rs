//! Hardware checks (C12 §4.12): requires at least one passing connectivity
//! result, since facts are gathered in-band over the SSH session that
//! connectivity already proved reachable.

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

pub struct CpuDetected;

#[async_trait]
impl BoardingCheck for CpuDetected {
    fn check_name(&self) -> &'static str {
        "cpu-detected"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Hardware
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        match &context.server.cpu_model {
            Some(model) => ValidationResult::pass(self.check_name(), self.category(), format!("CPU model recorded: {model}")),
            None => ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no CPU model recorded",
                Some("run hardware discovery".to_string()),
            ),
        }
    }
}

pub struct MemoryDetected;

#[async_trait]
impl BoardingCheck for MemoryDetected {
    fn check_name(&self) -> &'static str {
        "memory-detected"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Hardware
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        match context.server.memory_gb {
            Some(gb) if gb > 0.0 => ValidationResult::pass(self.check_name(), self.category(), format!("{gb:.0} GB of RAM recorded")),
            _ => ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no memory size recorded",
                Some("run hardware discovery".to_string()),
            ),
        }
    }
}

pub struct HardwareValidatedFlag;

#[async_trait]
impl BoardingCheck for HardwareValidatedFlag {
    fn check_name(&self) -> &'static str {
        "hardware-validated-flag"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Hardware
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        if context.server.hardware_validated {
            ValidationResult::pass(self.check_name(), self.category(), "hardware-discovery stage marked this server validated")
        } else {
            ValidationResult::fail(
                self.check_name(),
                self.category(),
                "hardware-discovery stage has not run or did not complete",
                Some("re-run the provisioning workflow's hardware-discovery stage".to_string()),
            )
        }
    }
}
