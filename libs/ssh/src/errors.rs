//! SSH adapter errors (C3, spec §7 `SSHConnectionError`).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SshConnectionError {
    #[error("TCP connect to {host}:22 failed")]
    TcpUnreachable { host: String },

    #[error("SSH authentication to {host} failed")]
    AuthFailed { host: String },

    #[error("SSH command on {host} timed out after {timeout_secs}s")]
    Timeout { host: String, timeout_secs: u64 },

    #[error("SSH command exited with status {status} on {host}: {stderr}")]
    CommandFailed { host: String, status: i32, stderr: String },

    #[error("failed to spawn ssh/scp process")]
    Transport(#[source] std::io::Error),
}
