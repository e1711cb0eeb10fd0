//! Connectivity probing (C3 §4.3): distinguishes "TCP/22 reachable but SSH
//! auth/handshake failed" from "nothing listening at all", since the
//! commissioning stage handler (C11) uses exactly that distinction to
//! decide whether to force-recommission a machine.

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivityProbe {
    pub tcp_reachable: bool,
    pub ssh_reachable: bool,
}

/// TCP port-22 probe with a short timeout, followed by a non-interactive
/// `ssh ... echo` using `BatchMode=yes` and relaxed host-key checking.
pub async fn connection_test(host: &str, probe_timeout: Duration) -> ConnectivityProbe {
    let tcp_reachable = timeout(probe_timeout, TcpStream::connect((host, 22)))
        .await
        .map(|result| result.is_ok())
        .unwrap_or(false);

    if !tcp_reachable {
        return ConnectivityProbe {
            tcp_reachable: false,
            ssh_reachable: false,
        };
    }

    let ssh_reachable = timeout(probe_timeout, ssh_echo(host, probe_timeout))
        .await
        .unwrap_or(false);

    ConnectivityProbe {
        tcp_reachable,
        ssh_reachable,
    }
}

async fn ssh_echo(host: &str, connect_timeout: Duration) -> bool {
    let output = Command::new("ssh")
        .args([
            "-o",
            "BatchMode=yes",
            "-o",
            "StrictHostKeyChecking=no",
            "-o",
            "UserKnownHostsFile=/dev/null",
            "-o",
            &format!("ConnectTimeout={}", connect_timeout.as_secs()),
            host,
            "echo",
            "ok",
        ])
        .output()
        .await;

    matches!(output, Ok(out) if out.status.success())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_host_reports_both_false() {
        // TEST-NET-1, guaranteed unroutable.
        let probe = connection_test("192.0.2.1", Duration::from_millis(200)).await;
        assert!(!probe.tcp_reachable);
        assert!(!probe.ssh_reachable);
    }
}
