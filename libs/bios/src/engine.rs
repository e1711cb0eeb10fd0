//! The PullCurrent → Modify → Push → Verify state machine (C7 §4.7).
//!
//! Only Supermicro targets have a real vendor-tool path today; every other
//! vendor takes the placeholder branch and reports "no changes applied"
//! rather than failing the workflow (spec §4.7 scenario 4). Push is the
//! only retryable step (2 retries, 5s fixed backoff) — a failed push can
//! leave the BMC in a transient "busy" state that a short wait clears, but
//! a failed pull or verify means something is structurally wrong and
//! retrying blindly would just mask it.

use serde_json::Value;
use tracing::{info, warn};

use provisioner_ssh::SshSession;

use crate::document::{overlay_settings, BiosDocument, SettingDiff};
use crate::errors::BiosConfigurationError;
use crate::vendor_tool::{self, VendorToolConfig};

const PUSH_MAX_ATTEMPTS: u32 = 3;
const PUSH_RETRY_DELAY_SECS: u64 = 5;

/// Outcome of a full run through the state machine, handed back to the
/// workflow engine's BIOS-configuration stage handler.
#[derive(Debug, Clone)]
pub struct BiosRunResult {
    pub diffs_applied: Vec<SettingDiff>,
    pub reboot_required: bool,
    pub skipped: bool,
    pub messages: Vec<String>,
}

/// Vendors with an adapter that implements the real Pull/Push/Verify path.
/// Anything else takes the placeholder branch.
fn has_vendor_adapter(vendor: &str) -> bool {
    vendor.eq_ignore_ascii_case("supermicro")
}

/// Drive the full Pull → Modify → Push → Verify sequence over `ssh`,
/// applying `device_type_settings` (the catalog's `bios_settings` object
/// for this device type) on top of whatever is currently configured.
pub async fn run(
    ssh: &mut SshSession,
    vendor: &str,
    device_type_settings: &Value,
    tool_cfg: &VendorToolConfig,
) -> Result<BiosRunResult, BiosConfigurationError> {
    if !has_vendor_adapter(vendor) {
        let message = format!("No changes applied - {vendor} BIOS configuration not yet supported");
        warn!(vendor, "skipping bios configuration: no vendor adapter");
        return Ok(BiosRunResult {
            diffs_applied: Vec::new(),
            reboot_required: false,
            skipped: true,
            messages: vec![message],
        });
    }

    let current = pull_current(ssh, vendor, tool_cfg).await?;
    let (desired, diffs) = modify(&current, device_type_settings);

    if diffs.is_empty() {
        info!(vendor, "bios already matches desired settings, nothing to push");
        return Ok(BiosRunResult {
            diffs_applied: Vec::new(),
            reboot_required: false,
            skipped: false,
            messages: vec!["current settings already match desired configuration".to_string()],
        });
    }

    let reboot_required = push_with_retry(ssh, &desired, vendor, tool_cfg).await?;
    verify(ssh, vendor, tool_cfg, &diffs).await?;

    Ok(BiosRunResult {
        diffs_applied: diffs,
        reboot_required,
        skipped: false,
        messages: Vec::new(),
    })
}

/// Read the current settings document from the target.
pub async fn pull_current(ssh: &mut SshSession, vendor: &str, tool_cfg: &VendorToolConfig) -> Result<BiosDocument, BiosConfigurationError> {
    if !has_vendor_adapter(vendor) {
        return Ok(BiosDocument::placeholder(format!("No changes applied - {vendor} BIOS configuration not yet supported")));
    }
    vendor_tool::ensure_tool_available(ssh, tool_cfg).await?;
    vendor_tool::pull_current(ssh, tool_cfg).await
}

/// Overlay the device type's desired settings onto the current document,
/// returning the merged document and the list of keys that actually changed.
#[must_use]
pub fn modify(current: &BiosDocument, device_type_settings: &Value) -> (BiosDocument, Vec<SettingDiff>) {
    if current.is_placeholder() {
        return (current.clone(), Vec::new());
    }
    overlay_settings(current, device_type_settings)
}

/// Push `document` to the target, retrying up to [`PUSH_MAX_ATTEMPTS`]
/// times with a fixed 5-second backoff between attempts.
async fn push_with_retry(ssh: &mut SshSession, document: &BiosDocument, vendor: &str, tool_cfg: &VendorToolConfig) -> Result<bool, BiosConfigurationError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match push(ssh, document, vendor, tool_cfg).await {
            Ok(reboot_required) => return Ok(reboot_required),
            Err(error) if attempt < PUSH_MAX_ATTEMPTS => {
                warn!(attempt, %error, "bios push failed, retrying");
                tokio::time::sleep(std::time::Duration::from_secs(PUSH_RETRY_DELAY_SECS)).await;
            }
            Err(error) => return Err(error),
        }
    }
}

pub async fn push(ssh: &mut SshSession, document: &BiosDocument, vendor: &str, tool_cfg: &VendorToolConfig) -> Result<bool, BiosConfigurationError> {
    if !has_vendor_adapter(vendor) {
        return Ok(false);
    }
    vendor_tool::push(ssh, document, tool_cfg).await
}

/// Re-read current settings and confirm every expected diff actually took.
pub async fn verify(ssh: &mut SshSession, vendor: &str, tool_cfg: &VendorToolConfig, expected_diffs: &[SettingDiff]) -> Result<(), BiosConfigurationError> {
    if !has_vendor_adapter(vendor) {
        return Ok(());
    }

    let observed = vendor_tool::verify(ssh, tool_cfg).await?;
    for diff in expected_diffs {
        let observed_value = observed.get(&diff.key);
        if observed_value != Some(&diff.new_value) {
            return Err(BiosConfigurationError::VerifyMismatch {
                key: diff.key.clone(),
                expected: diff.new_value.to_string(),
                observed: observed_value.map_or_else(|| "<missing>".to_string(), ToString::to_string),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn unsupported_vendor_has_no_adapter() {
        assert!(!has_vendor_adapter("lenovo"));
        assert!(has_vendor_adapter("Supermicro"));
    }

    #[test]
    fn modify_skips_placeholder_documents() {
        let placeholder = BiosDocument::placeholder("no adapter");
        let (result, diffs) = modify(&placeholder, &json!({"boot_mode": "uefi"}));
        assert!(result.is_placeholder());
        assert!(diffs.is_empty());
    }

    #[test]
    fn modify_applies_overlay_on_real_documents() {
        let mut current = BiosDocument::default();
        current.settings.insert("boot_mode".into(), json!("legacy"));
        let (merged, diffs) = modify(&current, &json!({"boot_mode": "uefi"}));
        assert_eq!(merged.get("boot_mode"), Some(&json!("uefi")));
        assert_eq!(diffs.len(), 1);
    }
}
