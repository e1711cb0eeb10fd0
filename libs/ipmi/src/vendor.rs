//! BMC vendor dialect detection (C4 §4.4).
//!
//! `mc info` output is scanned for vendor-identifying substrings; a falling
//! back to a vendor-specific raw command probe is left to callers that hold
//! an [`crate::adapter::IpmiAdapter`], since the probe itself needs to run
//! an ipmitool subcommand.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmcVendor {
    Supermicro,
    HpIlo,
    DellIdrac,
    Unknown,
}

impl BmcVendor {
    /// Scan `mc info` output for vendor-identifying substrings.
    #[must_use]
    pub fn detect_from_mc_info(mc_info_output: &str) -> Self {
        let lowered = mc_info_output.to_lowercase();
        if lowered.contains("supermicro") {
            Self::Supermicro
        } else if lowered.contains("ilo") || lowered.contains("hewlett") || lowered.contains("hpe") {
            Self::HpIlo
        } else if lowered.contains("idrac") || lowered.contains("dell") {
            Self::DellIdrac
        } else {
            Self::Unknown
        }
    }

    /// Vendor-specific settings this adapter attempts for the "configure
    /// IPMI" step: KCS control and host-interface disable for Supermicro;
    /// IPMI-over-LAN and RBSU-login for HP iLO. Anything not listed here
    /// is reported by callers as "requires manual configuration".
    #[must_use]
    pub fn supported_vendor_settings(self) -> &'static [&'static str] {
        match self {
            Self::Supermicro => &["kcs_control", "host_interface_disable"],
            Self::HpIlo => &["ipmi_over_lan", "rbsu_login"],
            Self::DellIdrac | Self::Unknown => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_supermicro() {
        assert_eq!(BmcVendor::detect_from_mc_info("Manufacturer Name : Supermicro"), BmcVendor::Supermicro);
    }

    #[test]
    fn detects_hp_ilo() {
        assert_eq!(BmcVendor::detect_from_mc_info("Firmware: iLO 5"), BmcVendor::HpIlo);
    }

    #[test]
    fn detects_dell_idrac() {
        assert_eq!(BmcVendor::detect_from_mc_info("Product: iDRAC9"), BmcVendor::DellIdrac);
    }

    #[test]
    fn unknown_vendor_has_no_supported_settings() {
        assert!(BmcVendor::Unknown.supported_vendor_settings().is_empty());
        assert_eq!(BmcVendor::detect_from_mc_info("nothing recognizable"), BmcVendor::Unknown);
    }
}
