//! IPMI/BMC adapter (C4): wraps the `ipmitool` CLI over `lanplus`.
//!
//! Every call is stateless beyond the transient child process it spawns;
//! the adapter instance itself holds only the tool path and default
//! timeout, so it is cheap to construct per-workflow (spec §5 "shared-
//! resource policy": C4 is not shared across workflows).

use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::errors::IpmiError;
use crate::power::{PowerCommand, PowerState};
use crate::vendor::BmcVendor;

#[derive(Debug, Clone)]
pub struct IpmiCredentials {
    pub bmc_ip: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct IpmiAdapter {
    ipmitool_path: String,
    command_timeout: Duration,
}

impl IpmiAdapter {
    #[must_use]
    pub fn new(ipmitool_path: impl Into<String>, command_timeout: Duration) -> Self {
        Self {
            ipmitool_path: ipmitool_path.into(),
            command_timeout,
        }
    }

    async fn run(&self, creds: &IpmiCredentials, subcommand: &[&str]) -> Result<String, IpmiError> {
        let mut args: Vec<String> = vec![
            "-I".into(),
            "lanplus".into(),
            "-H".into(),
            creds.bmc_ip.clone(),
            "-U".into(),
            creds.username.clone(),
            "-P".into(),
            creds.password.clone(),
        ];
        args.extend(subcommand.iter().map(|s| (*s).to_string()));

        let fut = Command::new(&self.ipmitool_path).args(&args).output();
        let output = timeout(self.command_timeout, fut)
            .await
            .map_err(|_| IpmiError::Timeout {
                bmc_ip: creds.bmc_ip.clone(),
                timeout_secs: self.command_timeout.as_secs(),
            })?
            .map_err(IpmiError::Transport)?;

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        if !output.status.success() {
            if stderr.to_lowercase().contains("unable to establish") || stderr.to_lowercase().contains("authentication") {
                return Err(IpmiError::AuthFailed {
                    bmc_ip: creds.bmc_ip.clone(),
                });
            }
            return Err(IpmiError::CommandFailed {
                bmc_ip: creds.bmc_ip.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Ping-test the BMC IP: `mc info` succeeding is treated as reachable.
    pub async fn ping_test(&self, creds: &IpmiCredentials) -> bool {
        self.run(creds, &["mc", "info"]).await.is_ok()
    }

    pub async fn mc_info(&self, creds: &IpmiCredentials) -> Result<String, IpmiError> {
        self.run(creds, &["mc", "info"]).await
    }

    pub async fn bmc_info(&self, creds: &IpmiCredentials) -> Result<String, IpmiError> {
        self.run(creds, &["bmc", "info"]).await
    }

    pub async fn sensor_list(&self, creds: &IpmiCredentials) -> Result<String, IpmiError> {
        self.run(creds, &["sensor", "list"]).await
    }

    pub async fn fru_list(&self, creds: &IpmiCredentials) -> Result<String, IpmiError> {
        self.run(creds, &["fru", "list"]).await
    }

    /// Detect the BMC's vendor dialect from `mc info`.
    pub async fn detect_vendor(&self, creds: &IpmiCredentials) -> Result<BmcVendor, IpmiError> {
        let info = self.mc_info(creds).await?;
        Ok(BmcVendor::detect_from_mc_info(&info))
    }

    pub async fn power_status(&self, creds: &IpmiCredentials) -> Result<PowerState, IpmiError> {
        let output = self.run(creds, &["chassis", "power", "status"]).await?;
        Ok(PowerState::parse_status_output(&output))
    }

    pub async fn power_control(&self, creds: &IpmiCredentials, command: PowerCommand) -> Result<(), IpmiError> {
        let subcommand = command.to_string();
        self.run(creds, &["chassis", "power", &subcommand]).await?;
        Ok(())
    }

    /// A required post-condition of the configure-IPMI step: set power
    /// state, then re-read it back and fail if it does not match.
    pub async fn power_control_and_verify(
        &self,
        creds: &IpmiCredentials,
        command: PowerCommand,
        expected: PowerState,
        settle: Duration,
    ) -> Result<(), IpmiError> {
        self.power_control(creds, command).await?;
        tokio::time::sleep(settle).await;
        let observed = self.power_status(creds).await?;
        if observed != expected {
            return Err(IpmiError::PowerVerificationFailed {
                bmc_ip: creds.bmc_ip.clone(),
                expected: expected.to_string(),
                observed: observed.to_string(),
            });
        }
        Ok(())
    }

    /// Set a static LAN configuration on channel 1.
    pub async fn set_lan_static(
        &self,
        creds: &IpmiCredentials,
        ip_address: &str,
        netmask: &str,
        gateway: &str,
    ) -> Result<(), IpmiError> {
        self.run(creds, &["lan", "set", "1", "ipsrc", "static"]).await?;
        self.run(creds, &["lan", "set", "1", "ipaddr", ip_address]).await?;
        self.run(creds, &["lan", "set", "1", "netmask", netmask]).await?;
        self.run(creds, &["lan", "set", "1", "defgw", "ipaddr", gateway]).await?;
        self.run(creds, &["lan", "set", "1", "access", "on"]).await?;
        Ok(())
    }

    pub async fn lan_print(&self, creds: &IpmiCredentials) -> Result<String, IpmiError> {
        self.run(creds, &["lan", "print", "1"]).await
    }

    /// Create or modify the user in `slot` (per spec: slot 2) with the
    /// given password and administrator privilege on channel 1.
    pub async fn configure_user(
        &self,
        creds: &IpmiCredentials,
        slot: u8,
        name: &str,
        password: &str,
    ) -> Result<(), IpmiError> {
        let slot_str = slot.to_string();
        self.run(creds, &["user", "set", "name", &slot_str, name]).await?;
        self.run(creds, &["user", "set", "password", &slot_str, password]).await?;
        self.run(creds, &["user", "enable", &slot_str]).await?;
        self.run(creds, &["channel", "setaccess", "1", &slot_str, "privilege=4"]).await?;
        Ok(())
    }

    /// Attempt a vendor-specific setting (KCS control / host-interface
    /// disable for Supermicro, IPMI-over-LAN / RBSU-login for HP iLO).
    /// Returns `Err(RequiresManualConfiguration)` for any vendor/setting
    /// pair ipmitool does not expose directly.
    pub async fn apply_vendor_setting(
        &self,
        creds: &IpmiCredentials,
        vendor: BmcVendor,
        setting: &str,
    ) -> Result<(), IpmiError> {
        if !vendor.supported_vendor_settings().contains(&setting) {
            return Err(IpmiError::RequiresManualConfiguration {
                vendor,
                setting: setting.to_string(),
            });
        }

        match (vendor, setting) {
            (BmcVendor::Supermicro, "kcs_control") => {
                self.run(creds, &["raw", "0x3c", "0x21", "0x00"]).await?;
            }
            (BmcVendor::Supermicro, "host_interface_disable") => {
                self.run(creds, &["raw", "0x3c", "0x22", "0x00"]).await?;
            }
            (BmcVendor::HpIlo, "ipmi_over_lan") => {
                self.run(creds, &["lan", "set", "1", "access", "on"]).await?;
            }
            (BmcVendor::HpIlo, "rbsu_login") => {
                self.run(creds, &["raw", "0x30", "0xa1", "0x01"]).await?;
            }
            _ => unreachable!("checked by supported_vendor_settings above"),
        }

        Ok(())
    }
}
