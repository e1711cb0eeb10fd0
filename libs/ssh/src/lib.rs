//! SSH session & command adapter (C3).
//!
//! Scoped acquisition of an authenticated remote shell over the system
//! `ssh`/`scp` binaries: one-shot and batch command execution, conditional
//! waits, file transfer, and fact-gathering helpers used by hardware
//! discovery and BIOS configuration.

pub mod connectivity;
pub mod errors;
pub mod helpers;
pub mod options;
pub mod session;

pub use connectivity::{connection_test, ConnectivityProbe};
pub use errors::SshConnectionError;
pub use helpers::HardwareFacts;
pub use options::{SshAuth, SshConnectOptions};
pub use session::{CommandOutput, SshSession};
