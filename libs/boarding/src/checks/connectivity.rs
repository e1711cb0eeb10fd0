//! Connectivity checks (C12 §4.12): the root category, nothing else runs
//! before it has at least one passing result.

use async_trait::async_trait;
use provisioner_domain::{ValidationCategory, ValidationResult};
use provisioner_ssh::connection_test;

use crate::check::BoardingCheck;
use crate::context::BoardingContext;

/// TCP/22 reachability. Gates the category: if this fails, `ssh-reachable`
/// below is pointless to run (spec §4.3's probe already treats "no TCP" and
/// "TCP but no SSH" as distinct, but without TCP there's nothing to learn).
pub struct TcpReachable;

#[async_trait]
impl BoardingCheck for TcpReachable {
    fn check_name(&self) -> &'static str {
        "tcp-reachable"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Connectivity
    }

    fn gates_category(&self) -> bool {
        true
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some(ip) = &context.server.ip_address else {
            return ValidationResult::fail(
                self.check_name(),
                self.category(),
                "no IP address recorded for this server",
                Some("run hardware/network discovery before boarding validation".to_string()),
            );
        };

        let probe = connection_test(ip, context.ssh_probe_timeout).await;
        if probe.tcp_reachable {
            ValidationResult::pass(self.check_name(), self.category(), format!("{ip} reachable over TCP/22"))
        } else {
            ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("{ip} not reachable over TCP/22"),
                Some("check the machine is powered on and the network path is up".to_string()),
            )
        }
    }
}

pub struct SshReachable;

#[async_trait]
impl BoardingCheck for SshReachable {
    fn check_name(&self) -> &'static str {
        "ssh-reachable"
    }

    fn category(&self) -> ValidationCategory {
        ValidationCategory::Connectivity
    }

    async fn run(&self, context: &BoardingContext<'_>) -> ValidationResult {
        let Some(ip) = &context.server.ip_address else {
            return ValidationResult::fail(self.check_name(), self.category(), "no IP address recorded for this server", None);
        };

        let probe = connection_test(ip, context.ssh_probe_timeout).await;
        if probe.ssh_reachable {
            ValidationResult::pass(self.check_name(), self.category(), format!("SSH answers on {ip}"))
        } else if probe.tcp_reachable {
            ValidationResult::fail(
                self.check_name(),
                self.category(),
                format!("{ip} accepts TCP/22 but SSH did not answer"),
                Some("check sshd is running and the key/password is accepted".to_string()),
            )
        } else {
            ValidationResult::fail(self.check_name(), self.category(), format!("{ip} unreachable, cannot test SSH"), None)
        }
    }
}
