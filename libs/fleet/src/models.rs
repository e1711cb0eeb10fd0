//! Fleet-controller wire types (C5, spec §6).

use std::net::IpAddr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The fleet controller's status-name enumeration (spec §6). Kept as a
/// string-backed enum rather than a bare `String` so stage handlers can
/// match on it exhaustively; `Other` absorbs anything the controller adds
/// in a future release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MachineStatus {
    New,
    Ready,
    Commissioning,
    Commissioned,
    Testing,
    Deployed,
    Deploying,
    FailedCommissioning,
    FailedTesting,
    FailedDeployment,
    Broken,
    Allocated,
    Other(String),
}

impl Serialize for MachineStatus {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MachineStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "New" => Self::New,
            "Ready" => Self::Ready,
            "Commissioning" => Self::Commissioning,
            "Commissioned" => Self::Commissioned,
            "Testing" => Self::Testing,
            "Deployed" => Self::Deployed,
            "Deploying" => Self::Deploying,
            "Failed commissioning" => Self::FailedCommissioning,
            "Failed testing" => Self::FailedTesting,
            "Failed deployment" => Self::FailedDeployment,
            "Broken" => Self::Broken,
            "Allocated" => Self::Allocated,
            other => Self::Other(other.to_string()),
        })
    }
}

impl MachineStatus {
    #[must_use]
    pub const fn is_terminal_failure(&self) -> bool {
        matches!(self, Self::FailedCommissioning | Self::FailedTesting | Self::FailedDeployment | Self::Broken)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::New => "New",
            Self::Ready => "Ready",
            Self::Commissioning => "Commissioning",
            Self::Commissioned => "Commissioned",
            Self::Testing => "Testing",
            Self::Deployed => "Deployed",
            Self::Deploying => "Deploying",
            Self::FailedCommissioning => "Failed commissioning",
            Self::FailedTesting => "Failed testing",
            Self::FailedDeployment => "Failed deployment",
            Self::Broken => "Broken",
            Self::Allocated => "Allocated",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceLink {
    #[serde(default)]
    pub ip_address: Option<IpAddr>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceEntry {
    #[serde(default)]
    pub links: Vec<InterfaceLink>,
    #[serde(default)]
    pub discovered: Vec<InterfaceLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineRecord {
    pub system_id: String,
    #[serde(default)]
    pub hostname: Option<String>,
    pub status_name: MachineStatus,
    #[serde(default)]
    pub interface_set: Vec<InterfaceEntry>,
}

impl MachineRecord {
    /// Extract usable IPs from both `links` and `discovered` arrays,
    /// deduping and skipping loopback/link-local addresses (spec §4.5).
    #[must_use]
    pub fn extract_ips(&self) -> Vec<IpAddr> {
        let mut seen = Vec::new();
        for iface in &self.interface_set {
            for link in iface.links.iter().chain(iface.discovered.iter()) {
                if let Some(ip) = link.ip_address {
                    if ip.is_loopback() || is_link_local(ip) {
                        continue;
                    }
                    if !seen.contains(&ip) {
                        seen.push(ip);
                    }
                }
            }
        }
        seen
    }
}

fn is_link_local(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_link_local(),
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_ips_dedupes_and_skips_loopback_and_link_local() {
        let machine = MachineRecord {
            system_id: "abc12".into(),
            hostname: None,
            status_name: MachineStatus::Ready,
            interface_set: vec![InterfaceEntry {
                links: vec![
                    InterfaceLink { ip_address: Some("10.0.0.5".parse().unwrap()) },
                    InterfaceLink { ip_address: Some("127.0.0.1".parse().unwrap()) },
                    InterfaceLink { ip_address: Some("169.254.1.1".parse().unwrap()) },
                ],
                discovered: vec![InterfaceLink { ip_address: Some("10.0.0.5".parse().unwrap()) }],
            }],
        };

        let ips = machine.extract_ips();
        assert_eq!(ips, vec!["10.0.0.5".parse::<IpAddr>().unwrap()]);
    }

    #[test]
    fn failed_commissioning_is_terminal_failure() {
        assert!(MachineStatus::FailedCommissioning.is_terminal_failure());
        assert!(!MachineStatus::Ready.is_terminal_failure());
    }
}
