//! Network checks (C12 §4.12): requires at least one passing connectivity
//! result, since these re-examine the same IP connectivity already proved
//! but from the "is it recorded correctly" angle rather than "is it live".

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

pub struct IpAddressAssigned;

#[async_trait]
impl BoardingCheck for IpAddressAssigned {
    fn check_name(&self) -> &'static str {
        "ip-address-assigned"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Network
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        match (&context.server.ip_address, context.server.ip_address_works) {
            (Some(ip), true) => ValidationResult::pass(self.check_name(), self.category(), format!("{ip} assigned and working")),
            (Some(ip), false) => ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("{ip} assigned but last probe marked it non-working"),
                Some("re-run network-setup".to_string()),
            ),
            (None, _) => ValidationResult::fail(self.check_name(), self.category(), "no IP address assigned", None),
        }
    }
}

pub struct NetworkInterfacesDiscovered;

#[async_trait]
impl BoardingCheck for NetworkInterfacesDiscovered {
    fn check_name(&self) -> &'static str {
        "network-interfaces-discovered"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Network
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        match &context.server.network_interfaces {
            Some(raw) if !raw.is_empty() && raw != "[]" => {
                ValidationResult::pass(self.check_name(), self.category(), "network interfaces recorded")
            }
            _ => ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no network interfaces recorded",
                Some("run hardware discovery".to_string()),
            ),
        }
    }
}
