//! Configuration checks (C12 §4.12): the last category, requires at least
//! one passing BIOS result, since both checks here cross-reference the
//! device-type the BIOS stage configured against.

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

pub struct DeviceTypeAssigned;

#[async_trait]
impl BoardingCheck for DeviceTypeAssigned {
    fn check_name(&self) -> &'static str {
        "device-type-assigned"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Configuration
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Bios]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        match &context.server.device_type {
            Some(device_type) => ValidationResult::pass(self.check_name(), self.category(), format!("assigned device-type {device_type}")),
            None => ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no device-type assigned",
                Some("classify the server against the catalog before provisioning".to_string()),
            ),
        }
    }
}

pub struct CatalogEntryExists;

#[async_trait]
impl BoardingCheck for CatalogEntryExists {
    fn check_name(&self) -> &'static str {
        "catalog-entry-exists"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Configuration
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Bios]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some(device_type) = &context.server.device_type else {
            return ValidationResult::fail(self.check_name(), self.category(), "no device-type assigned, cannot look up catalog entry", None);
        };

        let Some(catalog) = context.catalog else {
            return ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no catalog snapshot available for this boarding run",
                None,
            );
        };

        match catalog.device_type(device_type) {
            Some(_) => ValidationResult::pass(self.check_name(), self.category(), format!("'{device_type}' found in catalog")),
            None => ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("'{device_type}' not found in catalog"),
                Some("the catalog may be stale, or the device-type id was mistyped".to_string()),
            ),
        }
    }
}
