//! IPMI checks (C12 §4.12). Scenario 6: when `ipmi-authentication` fails,
//! the coordinator records the remaining IPMI checks as `skip` rather than
//! running them, since an adapter that can't authenticate can't usefully
//! answer "is power control verified" or "is the LAN channel configured".

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};
use provisioner_ipmi::IpmiError;

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

pub struct IpmiReachable;

#[async_trait]
impl BoardingCheck for IpmiReachable {
    fn check_name(&self) -> &'static str {
        "ipmi-reachable"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Ipmi
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    fn gates_category(&self) -> bool {
        true
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some((adapter, creds)) = context.ipmi else {
            return ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no IPMI adapter/credentials configured for this boarding run",
                Some("supply a BMC IP and credentials".to_string()),
            );
        };

        if adapter.ping_test(creds).await {
            ValidationResult::pass(self.check_name(), self.category(), format!("BMC at {} responds to mc info", creds.bmc_ip))
        } else {
            ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("BMC at {} did not respond", creds.bmc_ip),
                Some("check the BMC IP and that it is on the management network".to_string()),
            )
        }
    }
}

/// The auth gate named in spec §8 scenario 6. Distinguishes an
/// authentication failure from a transport/timeout failure, since only the
/// former implies the credentials themselves are wrong.
pub struct IpmiAuthentication;

#[async_trait]
impl BoardingCheck for IpmiAuthentication {
    fn check_name(&self) -> &'static str {
        "ipmi-authentication"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Ipmi
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    fn gates_category(&self) -> bool {
        true
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some((adapter, creds)) = context.ipmi else {
            return ValidationResult::fail(self.check_name(), self.category(), "no IPMI credentials configured", None);
        };

        match adapter.mc_info(creds).await {
            Ok(_) => ValidationResult::pass(self.check_name(), self.category(), "authenticated to BMC"),
            Err(IpmiError::AuthFailed { bmc_ip }) => ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("authentication to BMC {bmc_ip} failed"),
                Some("verify the configured IPMI username/password".to_string()),
            ),
            Err(error) => ValidationResult::fail(self.check_name(), self.category(), format!("could not reach BMC: {error}"), None),
        }
    }
}

pub struct IpmiPowerControl;

#[async_trait]
impl BoardingCheck for IpmiPowerControl {
    fn check_name(&self) -> &'static str {
        "ipmi-power-control"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Ipmi
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some((adapter, creds)) = context.ipmi else {
            return ValidationResult::fail(self.check_name(), self.category(), "no IPMI credentials configured", None);
        };

        match adapter.power_status(creds).await {
            Ok(state) => ValidationResult::pass(self.check_name(), self.category(), format!("power status readable, currently {state}")),
            Err(error) => ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("power status read failed: {error}"),
                Some("verify IPMI LAN channel access and user privilege".to_string()),
            ),
        }
    }
}

pub struct IpmiLanConfigured;

#[async_trait]
impl BoardingCheck for IpmiLanConfigured {
    fn check_name(&self) -> &'static str {
        "ipmi-lan-configured"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Ipmi
    }

    fn required_prerequisites(&self) -> &'static [ValidationCategory] {
        &[ValidationCategory::Connectivity]
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        if !context.server.ipmi_configured {
            return ValidationResult::fail(
                self.check_name(),
                self.category(),
                "ipmi-configuration stage has not completed for this server",
                Some("re-run the provisioning workflow's ipmi-configuration stage".to_string()),
            );
        }

        let Some((adapter, creds)) = context.ipmi else {
            return ValidationResult::fail(self.check_name(), self.category(), "no IPMI credentials configured", None);
        };

        match adapter.lan_print(creds).await {
            Ok(_) => ValidationResult::pass(self.check_name(), self.category(), "LAN channel 1 configuration readable"),
            Err(error) => ValidationResult::fail(self.check_name(), self.category(), format!("LAN channel read failed: {error}"), None),
        }
    }
}
