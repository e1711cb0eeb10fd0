//! Supermicro vendor-tool plumbing used by [`crate::engine`] (C7 §4.7
//! "PullCurrent. Supermicro path").
//!
//! The actual vendor CLI (`sum`) and its binary archive are out of scope
//! (spec §1 Non-goals: "does not itself... parse vendor BIOS XML") — this
//! module only knows how to probe for it, install a bundled archive over
//! SSH when it is missing, and shell out to it once present. Parsing its
//! dump format is a minimal flat `key = value` reader, not a real BIOS XML
//! parser.

use serde_json::{Map, Value};

use provisioner_ssh::SshSession;

use crate::document::BiosDocument;
use crate::errors::BiosConfigurationError;

/// Where the Supermicro `sum` tool lives on the target and where its
/// bundled install archive can be found locally, if it needs installing.
#[derive(Debug, Clone)]
pub struct VendorToolConfig {
    pub remote_tool_path: String,
    pub remote_dump_path: String,
    pub local_archive_path: Option<String>,
    pub remote_archive_path: String,
}

impl Default for VendorToolConfig {
    fn default() -> Self {
        Self {
            remote_tool_path: "/opt/sum/sum".to_string(),
            remote_dump_path: "/tmp/bios_current.cfg".to_string(),
            local_archive_path: None,
            remote_archive_path: "/tmp/sum.tar.gz".to_string(),
        }
    }
}

/// Probe for the tool, uploading and installing the bundled archive if it
/// is absent. A missing `local_archive_path` with a missing remote tool is
/// reported as [`BiosConfigurationError::VendorToolUnavailable`] rather than
/// attempted blindly.
pub async fn ensure_tool_available(ssh: &mut SshSession, cfg: &VendorToolConfig) -> Result<(), BiosConfigurationError> {
    let probe = ssh.exec_one(&format!("test -x '{}'", cfg.remote_tool_path)).await?;
    if probe.success() {
        return Ok(());
    }

    let Some(local_archive) = &cfg.local_archive_path else {
        return Err(BiosConfigurationError::VendorToolUnavailable(format!(
            "tool missing at {} and no install archive configured",
            cfg.remote_tool_path
        )));
    };

    ssh.upload(local_archive, &cfg.remote_archive_path).await?;
    let install = ssh
        .exec_one(&format!(
            "mkdir -p '{}' && tar -xzf '{}' -C '{}' --strip-components=1",
            parent_dir(&cfg.remote_tool_path),
            cfg.remote_archive_path,
            parent_dir(&cfg.remote_tool_path),
        ))
        .await?;
    if !install.success() {
        return Err(BiosConfigurationError::VendorToolUnavailable(format!(
            "failed to install sum archive: {}",
            install.stderr
        )));
    }

    let validate = ssh.exec_one(&format!("test -x '{}'", cfg.remote_tool_path)).await?;
    if !validate.success() {
        return Err(BiosConfigurationError::VendorToolUnavailable(
            "sum binary still not executable after install".to_string(),
        ));
    }
    Ok(())
}

fn parent_dir(path: &str) -> String {
    path.rsplit_once('/').map_or_else(|| "/opt/sum".to_string(), |(dir, _)| dir.to_string())
}

/// Dump current settings to `cfg.remote_dump_path`, fetch the file back,
/// and parse it into a [`BiosDocument`].
pub async fn pull_current(ssh: &mut SshSession, cfg: &VendorToolConfig) -> Result<BiosDocument, BiosConfigurationError> {
    let dump = ssh
        .exec_one(&format!("'{}' -c GetCurrentBiosCfg --file '{}'", cfg.remote_tool_path, cfg.remote_dump_path))
        .await?;
    if !dump.success() {
        return Err(BiosConfigurationError::PullFailed(dump.stderr));
    }

    let local_tmp = format!("/tmp/provisioner-bios-dump-{}.cfg", uuid::Uuid::new_v4());
    ssh.download(&cfg.remote_dump_path, &local_tmp).await?;
    let raw = tokio::fs::read_to_string(&local_tmp)
        .await
        .map_err(|e| BiosConfigurationError::PullFailed(e.to_string()))?;
    let _ = tokio::fs::remove_file(&local_tmp).await;

    Ok(parse_dump(&raw))
}

/// Write `document` back through the tool's "change setting" invocation,
/// one key per call (the dump/restore format this tool family uses is a
/// flat key/value list, so there is no single "load file" path that also
/// reports which keys actually required a reboot).
pub async fn push(ssh: &mut SshSession, document: &BiosDocument, cfg: &VendorToolConfig) -> Result<bool, BiosConfigurationError> {
    let mut reboot_required = false;
    for (key, value) in &document.settings {
        let value_str = value_to_cli_string(value);
        let output = ssh
            .exec_one(&format!("'{}' -c ChangeCmosSetting --key '{key}' --value '{value_str}'", cfg.remote_tool_path))
            .await?;
        if !output.success() {
            return Err(BiosConfigurationError::PushFailed(format!("{key}: {}", output.stderr)));
        }
        if output.stdout.to_lowercase().contains("reboot required") {
            reboot_required = true;
        }
    }
    Ok(reboot_required)
}

/// Re-read current settings and return them for the Verify step to diff
/// against the expected changes.
pub async fn verify(ssh: &mut SshSession, cfg: &VendorToolConfig) -> Result<BiosDocument, BiosConfigurationError> {
    pull_current(ssh, cfg).await
}

fn value_to_cli_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Parse the tool's flat `key = value` dump format into a [`BiosDocument`].
/// Blank lines and lines starting with `#` are ignored.
fn parse_dump(raw: &str) -> BiosDocument {
    let mut settings = Map::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            settings.insert(key.trim().to_string(), Value::String(value.trim().to_string()));
        }
    }
    BiosDocument { settings, note: None }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flat_key_value_dump() {
        let raw = "# comment\nboot_mode = UEFI\nhyperthreading = Enabled\n\n";
        let doc = parse_dump(raw);
        assert_eq!(doc.get("boot_mode"), Some(&Value::String("UEFI".to_string())));
        assert_eq!(doc.get("hyperthreading"), Some(&Value::String("Enabled".to_string())));
        assert!(!doc.is_placeholder());
    }

    #[test]
    fn ignores_malformed_lines() {
        let doc = parse_dump("not a setting line\nboot_mode = UEFI");
        assert_eq!(doc.settings.len(), 1);
    }
}
