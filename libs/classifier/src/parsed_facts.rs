//! Interprets the raw text blobs gathered by C3 into the numeric facts the
//! classifier's scoring formulas need (CPU count, RAM, architecture).
//! Kept separate from `provisioner-ssh` so the adapter stays a thin
//! transport and all device-typing heuristics live here.

use provisioner_ssh::HardwareFacts;

#[derive(Debug, Clone, Default)]
pub struct ParsedFacts {
    pub cpu_model: Option<String>,
    pub cpu_count: Option<u32>,
    pub ram_gb: Option<f64>,
    pub architecture: Option<String>,
    pub dmi: String,
    pub lshw: String,
    pub pci_devices: String,
    pub network_interface_names: Vec<String>,
}

impl ParsedFacts {
    #[must_use]
    pub fn from_hardware_facts(facts: &HardwareFacts) -> Self {
        Self {
            cpu_model: extract_cpu_model(&facts.cpu_info),
            cpu_count: extract_cpu_count(&facts.cpu_info),
            ram_gb: extract_ram_gb(&facts.memory_info),
            architecture: extract_architecture(&facts.kernel),
            dmi: facts.dmi.clone(),
            lshw: facts.lshw.clone(),
            pci_devices: facts.pci_devices.clone(),
            network_interface_names: extract_interface_names(&facts.lshw),
        }
    }
}

fn extract_cpu_model(cpu_info: &str) -> Option<String> {
    cpu_info
        .lines()
        .find(|line| line.starts_with("model name"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
}

fn extract_cpu_count(cpu_info: &str) -> Option<u32> {
    let count = cpu_info.lines().filter(|line| line.starts_with("processor")).count();
    if count == 0 {
        None
    } else {
        Some(count as u32)
    }
}

fn extract_ram_gb(mem_info: &str) -> Option<f64> {
    mem_info
        .lines()
        .find(|line| line.starts_with("MemTotal:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<f64>().ok())
        .map(|kb| kb / 1024.0 / 1024.0)
}

fn extract_architecture(uname: &str) -> Option<String> {
    uname.split_whitespace().find(|token| matches!(*token, "x86_64" | "aarch64" | "arm64" | "i686")).map(str::to_string)
}

fn extract_interface_names(lshw_json: &str) -> Vec<String> {
    // `lshw -json` output is not parsed as JSON here since the classifier
    // only needs interface-name substrings (e.g. "eno1", "enp"), which are
    // cheap to scan for directly without pulling in a JSON schema for lshw.
    lshw_json
        .split('"')
        .filter(|token| token.starts_with("en") || token.starts_with("eth"))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_cpu_model_and_count() {
        let cpu_info = "processor\t: 0\nmodel name\t: Intel(R) Xeon(R) Gold 6230\nprocessor\t: 1\nmodel name\t: Intel(R) Xeon(R) Gold 6230\n";
        assert_eq!(extract_cpu_count(cpu_info), Some(2));
        assert_eq!(extract_cpu_model(cpu_info).as_deref(), Some("Intel(R) Xeon(R) Gold 6230"));
    }

    #[test]
    fn extracts_ram_gb_from_kb() {
        let mem_info = "MemTotal:       263921152 kB\nMemFree:        1000 kB\n";
        let ram = extract_ram_gb(mem_info).unwrap();
        assert!((ram - 251.7).abs() < 0.5);
    }

    #[test]
    fn extracts_architecture() {
        assert_eq!(extract_architecture("Linux host 5.15.0 #1 SMP x86_64 GNU/Linux"), Some("x86_64".to_string()));
    }
}
