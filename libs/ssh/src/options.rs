//! Connection parameters accepted by [`crate::session::acquire`].

use std::path::PathBuf;
use std::time::Duration;

/// How the session authenticates to the remote host.
#[derive(Debug, Clone)]
pub enum SshAuth {
    KeyFile(PathBuf),
    Password(String),
}

#[derive(Debug, Clone)]
pub struct SshConnectOptions {
    pub host: String,
    pub user: String,
    pub auth: SshAuth,
    pub connect_timeout: Duration,
}

impl SshConnectOptions {
    #[must_use]
    pub fn new(host: impl Into<String>, user: impl Into<String>, auth: SshAuth) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            auth,
            connect_timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}
