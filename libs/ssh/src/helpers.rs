//! Higher-level helpers built on [`crate::session::SshSession`] primitives,
//! used by the hardware-discovery and BIOS-configuration steps (C3 §4.3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::SshConnectionError;
use crate::session::SshSession;

/// Raw facts gathered for hardware discovery and device classification.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HardwareFacts {
    pub dmi: String,
    pub lshw: String,
    pub cpu_info: String,
    pub memory_info: String,
    pub disk_info: String,
    pub kernel: String,
    pub pci_devices: String,
}

impl SshSession {
    /// Install packages via the system package manager, trying `apt-get`
    /// first and falling back to `yum` when it is absent.
    pub async fn install_packages(&self, packages: &[String]) -> Result<Vec<crate::session::CommandOutput>, SshConnectionError> {
        let list = packages.join(" ");
        let probe = self.exec_one("command -v apt-get").await?;
        let command = if probe.success() {
            format!("DEBIAN_FRONTEND=noninteractive apt-get install -y {list}")
        } else {
            format!("yum install -y {list}")
        };
        self.exec_batch(&[command], true).await
    }

    /// Query a systemd unit's `ActiveState`.
    pub async fn service_status(&self, unit: &str) -> Result<String, SshConnectionError> {
        let output = self
            .exec_one(&format!("systemctl show -p ActiveState --value {unit}"))
            .await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Gather the standard set of DMI/kernel/CPU/memory/disk facts used by
    /// vendor detection (C6) and the BIOS engine (C7).
    pub async fn gather_hardware_facts(&self) -> Result<HardwareFacts, SshConnectionError> {
        let dmi = self.exec_one("dmidecode 2>/dev/null").await?;
        let lshw = self.exec_one("lshw -json 2>/dev/null").await?;
        let cpu_info = self.exec_one("cat /proc/cpuinfo").await?;
        let memory_info = self.exec_one("cat /proc/meminfo").await?;
        let disk_info = self.exec_one("lsblk -J 2>/dev/null").await?;
        let kernel = self.exec_one("uname -a").await?;
        let pci_devices = self.exec_one("lspci 2>/dev/null").await?;

        Ok(HardwareFacts {
            dmi: dmi.stdout,
            lshw: lshw.stdout,
            cpu_info: cpu_info.stdout,
            memory_info: memory_info.stdout,
            disk_info: disk_info.stdout,
            kernel: kernel.stdout,
            pci_devices: pci_devices.stdout,
        })
    }

    /// Enumerate hardware tools commonly needed by later steps
    /// (`ipmitool`, `dmidecode`, `lshw`, ...) along with their versions, if
    /// present.
    pub async fn enumerate_tool_versions(&self, tools: &[&str]) -> Result<BTreeMap<String, Option<String>>, SshConnectionError> {
        let mut versions = BTreeMap::new();
        for tool in tools {
            let probe = self.exec_one(&format!("command -v {tool} >/dev/null 2>&1 && {tool} --version 2>&1 | head -n1")).await?;
            let version = if probe.success() && !probe.stdout.trim().is_empty() {
                Some(probe.stdout.trim().to_string())
            } else {
                None
            };
            versions.insert((*tool).to_string(), version);
        }
        Ok(versions)
    }
}
