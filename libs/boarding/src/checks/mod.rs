//! Concrete boarding checks (C12 §4.12), one module per category.

pub mod bios;
pub mod configuration;
pub mod connectivity;
pub mod hardware;
pub mod ipmi;
pub mod network;

use crate::check::BoardingCheck;

/// All checks, in the fixed dependency order connectivity -> hardware ->
/// ipmi -> bios -> network -> configuration. The coordinator does not
/// re-sort these; it trusts this ordering and only consults
/// `required_prerequisites` to decide whether to skip.
#[must_use]
pub fn all_checks() -> Vec<Box<dyn BoardingCheck>> {
    vec![
        Box::new(connectivity::TcpReachable),
        Box::new(connectivity::SshReachable),
        Box::new(hardware::CpuDetected),
        Box::new(hardware::MemoryDetected),
        Box::new(hardware::HardwareValidatedFlag),
        Box::new(ipmi::IpmiReachable),
        Box::new(ipmi::IpmiAuthentication),
        Box::new(ipmi::IpmiPowerControl),
        Box::new(ipmi::IpmiLanConfigured),
        Box::new(bios::BiosConfigApplied),
        Box::new(bios::BiosPasswordSet),
        Box::new(network::IpAddressAssigned),
        Box::new(network::NetworkInterfacesDiscovered),
        Box::new(configuration::DeviceTypeAssigned),
        Box::new(configuration::CatalogEntryExists),
    ]
}
