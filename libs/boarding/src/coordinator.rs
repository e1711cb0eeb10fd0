//! Boarding validation coordinator (C12 §4.12).
//!
//! Runs every registered check in the fixed category order, skipping a
//! check with a synthetic result when its category's prerequisites are
//! unmet, and short-circuiting the rest of a category when one of its
//! own gating checks fails.

use std::collections::HashSet;

use provisioner_domain::{BoardingValidation, ValidationCategory, ValidationResult, ValidationStatus};

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

/// Runs `checks` against `context` and returns the aggregate validation.
/// `checks` is expected (but not required) to already be grouped by
/// category in dependency order, e.g. [`crate::checks::all_checks`].
pub async fn run_boarding_validation(checks: &[Box<dyn BoardingCheck>], context: &BoardingContext<'_>) -> BoardingValidation {
    let mut passed_categories: HashSet<ValidationCategory> = HashSet::new();
    let mut gated_categories: HashSet<ValidationCategory> = HashSet::new();
    let mut results = Vec::with_capacity(checks.len());

    for check in checks {
        let category = check.category();

        if let Some(missing) = check.required_prerequisites().iter().find(|c| !passed_categories.contains(c)) {
            results.push(ValidationResult::skipped_prerequisite(check.check_name(), category, &missing.to_string()));
            continue;
        }

        if gated_categories.contains(&category) {
            results.push(ValidationResult {
                check_name: check.check_name().to_string(),
                status: ValidationStatus::Skip,
                category,
                message: format!("skipping extended {category} tests due to authentication failure"),
                remediation: None,
                details: None,
            });
            continue;
        }

        let result = check.run(context).await;
        if result.status == ValidationStatus::Pass {
            passed_categories.insert(category);
        }
        if check.gates_category() && result.status == ValidationStatus::Fail {
            gated_categories.insert(category);
        }
        results.push(result);
    }

    BoardingValidation::from_results(results)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use provisioner_domain::{ServerId, ServerRecord};

    use super::*;
    use crate::check::BoardingCheck;

    struct AlwaysPass(ValidationCategory, &'static str, &'static [ValidationCategory]);

    #[async_trait]
    impl BoardingCheck for AlwaysPass {
        fn check_name(&self) -> &'static str {
            self.1
        }
        fn category(&self) -> ValidationCategory {
            self.0
        }
        fn required_prerequisites(&self) -> &'static [ValidationCategory] {
            self.2
        }
        async fn run(&self, _context: &BoardingContext<'_>) -> ValidationResult {
            ValidationResult::pass(self.1, self.0, "ok")
        }
    }

    struct AlwaysFailGate(ValidationCategory, &'static str);

    #[async_trait]
    impl BoardingCheck for AlwaysFailGate {
        fn check_name(&self) -> &'static str {
            self.1
        }
        fn category(&self) -> ValidationCategory {
            self.0
        }
        fn gates_category(&self) -> bool {
            true
        }
        async fn run(&self, _context: &BoardingContext<'_>) -> ValidationResult {
            ValidationResult::fail(self.1, self.0, "auth failed", None)
        }
    }

    fn sample_context() -> BoardingContext<'static> {
        BoardingContext::new(ServerRecord::new(ServerId::new("srv-1"), Utc::now()))
    }

    #[tokio::test]
    async fn unmet_prerequisite_skips_without_running() {
        let checks: Vec<Box<dyn BoardingCheck>> = vec![Box::new(AlwaysPass(
            ValidationCategory::Hardware,
            "needs-connectivity",
            &[ValidationCategory::Connectivity],
        ))];
        let validation = run_boarding_validation(&checks, &sample_context()).await;
        assert_eq!(validation.results[0].status, ValidationStatus::Skip);
        assert_eq!(validation.overall_status, ValidationStatus::Pass);
    }

    #[tokio::test]
    async fn met_prerequisite_runs_the_check() {
        let checks: Vec<Box<dyn BoardingCheck>> = vec![
            Box::new(AlwaysPass(ValidationCategory::Connectivity, "conn", &[])),
            Box::new(AlwaysPass(ValidationCategory::Hardware, "hw", &[ValidationCategory::Connectivity])),
        ];
        let validation = run_boarding_validation(&checks, &sample_context()).await;
        assert_eq!(validation.results[1].status, ValidationStatus::Pass);
    }

    #[tokio::test]
    async fn gate_failure_skips_rest_of_category() {
        let checks: Vec<Box<dyn BoardingCheck>> = vec![
            Box::new(AlwaysFailGate(ValidationCategory::Ipmi, "ipmi-authentication")),
            Box::new(AlwaysPass(ValidationCategory::Ipmi, "ipmi-power-control", &[])),
        ];
        let validation = run_boarding_validation(&checks, &sample_context()).await;
        assert_eq!(validation.results[0].status, ValidationStatus::Fail);
        assert_eq!(validation.results[1].status, ValidationStatus::Skip);
        assert!(validation.results[1].message.contains("authentication failure"));
        assert_eq!(validation.overall_status, ValidationStatus::Fail);
        assert_eq!(validation.summary().failed, 1);
    }
}
