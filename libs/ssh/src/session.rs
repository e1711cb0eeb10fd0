//! Scoped SSH session and command execution (C3).
//!
//! Commands are shelled out to the system `ssh`/`scp` binaries via
//! `tokio::process::Command` rather than an in-process SSH library, so the
//! documented wire contract (`BatchMode=yes`, `StrictHostKeyChecking=no`,
//! `UserKnownHostsFile=/dev/null`, `ConnectTimeout=10`, spec §6) is exactly
//! what runs, not an approximation of it.

use std::time::{Duration, Instant};

use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::errors::SshConnectionError;
use crate::options::{SshAuth, SshConnectOptions};

/// Output of a single command execution.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub elapsed: Duration,
}

impl CommandOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A scoped, authenticated handle to a remote host. Callers are expected to
/// call [`Self::close`] on every exit path (the workflow engine's step
/// `cleanup` hook is where this happens in practice); dropping without
/// calling it only logs a warning since there is no non-blocking way to
/// run the remote cleanup commands from `Drop`.
pub struct SshSession {
    opts: SshConnectOptions,
    command_timeout: Duration,
    uploaded_temp_paths: Vec<String>,
    closed: bool,
}

impl SshSession {
    /// Acquire a session, confirming the host is reachable and that the
    /// supplied credentials actually authenticate before handing back a
    /// handle callers will build steps on top of.
    pub async fn acquire(opts: SshConnectOptions) -> Result<Self, SshConnectionError> {
        let probe = crate::connectivity::connection_test(&opts.host, opts.connect_timeout).await;
        if !probe.tcp_reachable {
            return Err(SshConnectionError::TcpUnreachable { host: opts.host.clone() });
        }
        if !probe.ssh_reachable {
            return Err(SshConnectionError::AuthFailed { host: opts.host.clone() });
        }

        Ok(Self {
            command_timeout: opts.connect_timeout,
            opts,
            uploaded_temp_paths: Vec::new(),
            closed: false,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.opts.host
    }

    fn base_args(&self) -> Vec<String> {
        vec![
            "-o".into(),
            "BatchMode=yes".into(),
            "-o".into(),
            "StrictHostKeyChecking=no".into(),
            "-o".into(),
            "UserKnownHostsFile=/dev/null".into(),
            "-o".into(),
            format!("ConnectTimeout={}", self.opts.connect_timeout.as_secs()),
        ]
    }

    fn identity_args(&self) -> Vec<String> {
        match &self.opts.auth {
            SshAuth::KeyFile(path) => vec!["-i".into(), path.display().to_string()],
            SshAuth::Password(_) => Vec::new(),
        }
    }

    /// One-shot command execution, returning `(stdout, stderr, exit_code,
    /// elapsed)`. Timeouts surface as [`SshConnectionError::Timeout`]
    /// rather than a generic transport error.
    pub async fn exec_one(&self, command: &str) -> Result<CommandOutput, SshConnectionError> {
        let start = Instant::now();
        let mut args = self.base_args();
        args.extend(self.identity_args());
        args.push(format!("{}@{}", self.opts.user, self.opts.host));
        args.push(command.to_string());

        let fut = Command::new("ssh").args(&args).output();
        let output = timeout(self.command_timeout, fut)
            .await
            .map_err(|_| SshConnectionError::Timeout {
                host: self.opts.host.clone(),
                timeout_secs: self.command_timeout.as_secs(),
            })?
            .map_err(SshConnectionError::Transport)?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
            elapsed: start.elapsed(),
        })
    }

    /// Run `commands` in order. When `stop_on_error` is set, the batch
    /// halts at the first non-zero exit and the remaining commands are
    /// not attempted.
    pub async fn exec_batch(
        &self,
        commands: &[String],
        stop_on_error: bool,
    ) -> Result<Vec<CommandOutput>, SshConnectionError> {
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let output = self.exec_one(command).await?;
            let failed = !output.success();
            results.push(output);
            if failed && stop_on_error {
                break;
            }
        }
        Ok(results)
    }

    /// Poll `command` until its stdout contains `expected_substring` or
    /// `timeout` elapses.
    pub async fn wait_for_condition(
        &self,
        command: &str,
        expected_substring: &str,
        poll_interval: Duration,
        timeout_duration: Duration,
    ) -> Result<bool, SshConnectionError> {
        let deadline = Instant::now() + timeout_duration;
        loop {
            let output = self.exec_one(command).await?;
            if output.stdout.contains(expected_substring) {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Upload a local file to `remote_path`, creating any missing parent
    /// directories first.
    pub async fn upload(&mut self, local_path: &str, remote_path: &str) -> Result<(), SshConnectionError> {
        if let Some(parent) = remote_path.rsplit_once('/').map(|(dir, _)| dir) {
            if !parent.is_empty() {
                self.exec_one(&format!("mkdir -p '{parent}'")).await?;
            }
        }

        let mut args = self.base_args();
        args.extend(self.identity_args());
        args.push(local_path.to_string());
        args.push(format!("{}@{}:{}", self.opts.user, self.opts.host, remote_path));

        let fut = Command::new("scp").args(&args).output();
        let output = timeout(self.command_timeout, fut)
            .await
            .map_err(|_| SshConnectionError::Timeout {
                host: self.opts.host.clone(),
                timeout_secs: self.command_timeout.as_secs(),
            })?
            .map_err(SshConnectionError::Transport)?;

        if !output.status.success() {
            return Err(SshConnectionError::CommandFailed {
                host: self.opts.host.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        self.uploaded_temp_paths.push(remote_path.to_string());
        Ok(())
    }

    /// Download `remote_path` to `local_path`.
    pub async fn download(&self, remote_path: &str, local_path: &str) -> Result<(), SshConnectionError> {
        let mut args = self.base_args();
        args.extend(self.identity_args());
        args.push(format!("{}@{}:{}", self.opts.user, self.opts.host, remote_path));
        args.push(local_path.to_string());

        let fut = Command::new("scp").args(&args).output();
        let output = timeout(self.command_timeout, fut)
            .await
            .map_err(|_| SshConnectionError::Timeout {
                host: self.opts.host.clone(),
                timeout_secs: self.command_timeout.as_secs(),
            })?
            .map_err(SshConnectionError::Transport)?;

        if !output.status.success() {
            return Err(SshConnectionError::CommandFailed {
                host: self.opts.host.clone(),
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }

    /// Release the session: best-effort removal of any files this session
    /// uploaded. Always called on every exit path by step `cleanup` hooks.
    pub async fn close(mut self) {
        for path in std::mem::take(&mut self.uploaded_temp_paths) {
            if let Err(error) = self.exec_one(&format!("rm -f '{path}'")).await {
                warn!(host = %self.opts.host, path, %error, "failed to clean up uploaded temp file");
            }
        }
        self.closed = true;
        debug!(host = %self.opts.host, "ssh session closed");
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if !self.closed && !self.uploaded_temp_paths.is_empty() {
            warn!(
                host = %self.opts.host,
                pending = self.uploaded_temp_paths.len(),
                "ssh session dropped without close(); uploaded temp files were not cleaned up"
            );
        }
    }
}
