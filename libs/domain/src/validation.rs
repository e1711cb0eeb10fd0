//! Boarding validation result types (C12).

use serde::{Deserialize, Serialize};

use crate::enums::{ValidationCategory, ValidationStatus};

/// Outcome of one named boarding check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub check_name: String,
    pub status: ValidationStatus,
    pub category: ValidationCategory,
    pub message: String,
    pub remediation: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl ValidationResult {
    #[must_use]
    pub fn pass(check_name: impl Into<String>, category: ValidationCategory, message: impl Into<String>) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Pass,
            category,
            message: message.into(),
            remediation: None,
            details: None,
        }
    }

    #[must_use]
    pub fn fail(
        check_name: impl Into<String>,
        category: ValidationCategory,
        message: impl Into<String>,
        remediation: Option<String>,
    ) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Fail,
            category,
            message: message.into(),
            remediation,
            details: None,
        }
    }

    /// A synthetic result produced when a handler's prerequisites were not
    /// met, so the coordinator skips it without invoking the check body.
    #[must_use]
    pub fn skipped_prerequisite(check_name: impl Into<String>, category: ValidationCategory, missing: &str) -> Self {
        Self {
            check_name: check_name.into(),
            status: ValidationStatus::Skip,
            category,
            message: format!("skipped: prerequisite category '{missing}' has no passing result"),
            remediation: None,
            details: None,
        }
    }
}

/// Per-status counts over a [`BoardingValidation`]'s results, used by
/// callers that want a one-line summary without walking `results` again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardingSummary {
    pub passed: usize,
    pub failed: usize,
    pub warning: usize,
    pub skipped: usize,
}

/// Aggregate outcome of a full boarding validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardingValidation {
    pub results: Vec<ValidationResult>,
    pub overall_status: ValidationStatus,
}

impl BoardingValidation {
    /// Derive `overall_status` from the result counts: any fail dominates,
    /// then any warning, else pass.
    #[must_use]
    pub fn from_results(results: Vec<ValidationResult>) -> Self {
        let overall_status = if results.iter().any(|r| r.status == ValidationStatus::Fail) {
            ValidationStatus::Fail
        } else if results.iter().any(|r| r.status == ValidationStatus::Warning) {
            ValidationStatus::Warning
        } else {
            ValidationStatus::Pass
        };

        Self {
            results,
            overall_status,
        }
    }

    #[must_use]
    pub fn summary(&self) -> BoardingSummary {
        let mut summary = BoardingSummary::default();
        for result in &self.results {
            match result.status {
                ValidationStatus::Pass => summary.passed += 1,
                ValidationStatus::Fail => summary.failed += 1,
                ValidationStatus::Warning => summary.warning += 1,
                ValidationStatus::Skip => summary.skipped += 1,
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_fail_dominates() {
        let validation = BoardingValidation::from_results(vec![
            ValidationResult::pass("ssh-reachable", ValidationCategory::Connectivity, "ok"),
            ValidationResult::fail("ipmi-power", ValidationCategory::Ipmi, "power control failed", None),
        ]);
        assert_eq!(validation.overall_status, ValidationStatus::Fail);
    }

    #[test]
    fn warning_without_fail() {
        let mut warn = ValidationResult::pass("bios-version", ValidationCategory::Bios, "stale but non-blocking");
        warn.status = ValidationStatus::Warning;
        let validation = BoardingValidation::from_results(vec![warn]);
        assert_eq!(validation.overall_status, ValidationStatus::Warning);
    }

    #[test]
    fn all_pass() {
        let validation = BoardingValidation::from_results(vec![ValidationResult::pass(
            "ssh-reachable",
            ValidationCategory::Connectivity,
            "ok",
        )]);
        assert_eq!(validation.overall_status, ValidationStatus::Pass);
    }
}
