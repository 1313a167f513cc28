//! TCP Connect Scanner implementation.
//!
//! Performs standard TCP connect scans using the operating system's
//! socket API: the full handshake is completed, then one best-effort
//! banner grab is attempted on open ports.

use crate::banner::grab_banner;
use crate::error::{ProbeError, ProbeResult};
use crate::scanner::traits::{PortResult, PortStatus};
use crate::services::classify;
use crate::types::{Protocol, ScanTask};
use rand::Rng;
use std::future::Future;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;

/// Bounds of the random pre-connect delay used in stealth mode, in ms.
const STEALTH_DELAY_MS: (u64, u64) = (100, 500);

/// TCP Connect Scanner.
///
/// Uses standard socket connect() calls to determine port status.
/// Does not require elevated privileges.
pub struct TcpConnectScanner {
    target: IpAddr,
    timeout: Duration,
    stealth: bool,
}

/// How a bounded connect attempt ended.
#[derive(Debug)]
enum ConnectOutcome<S> {
    Connected(S),
    Failed(io::Error),
    TimedOut,
}

impl TcpConnectScanner {
    /// Create a new TCP connect scanner.
    ///
    /// # Arguments
    /// * `target` - Target IP address to scan
    /// * `timeout` - Bound for the connect and for each banner I/O step
    /// * `stealth` - Sleep a random 100-500ms before each connect
    pub fn new(target: IpAddr, timeout: Duration, stealth: bool) -> Self {
        Self {
            target,
            timeout,
            stealth,
        }
    }

    /// Scan a single TCP port. Never fails: errors become `ERROR` results.
    pub async fn scan_port(&self, port: u32) -> PortResult {
        let task = ScanTask::new(Protocol::Tcp, port);
        match self.probe(task).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(%task, "tcp probe failed: {}", e);
                PortResult::error(task, e)
            }
        }
    }

    async fn probe(&self, task: ScanTask) -> ProbeResult<PortResult> {
        let port = u16::try_from(task.port).map_err(|_| ProbeError::PortOutOfRange(task.port))?;

        if self.stealth {
            let delay = stealth_delay();
            tracing::trace!(%task, ?delay, "stealth delay");
            tokio::time::sleep(delay).await;
        }

        let addr = SocketAddr::new(self.target, port);
        let socket = match self.target {
            IpAddr::V4(_) => TcpSocket::new_v4(),
            IpAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(ProbeError::Socket)?;

        match connect_with_timeout(socket.connect(addr), self.timeout).await {
            ConnectOutcome::Connected(stream) => Ok(self.on_open(task, stream).await),
            ConnectOutcome::Failed(e) => {
                tracing::trace!(%task, "connect failed: {}", e);
                Ok(PortResult::new(task, PortStatus::Closed))
            }
            ConnectOutcome::TimedOut => Ok(PortResult::new(task, PortStatus::Timeout)),
        }
    }

    /// Grab a banner and classify. The stream is dropped, and the socket
    /// closed, when this returns.
    async fn on_open(&self, task: ScanTask, mut stream: TcpStream) -> PortResult {
        let banner = grab_banner(&mut stream, self.timeout).await;
        let service = classify(task.port, &banner);
        PortResult::new(task, PortStatus::Open)
            .with_service(service)
            .with_banner(banner)
    }
}

/// Run a connect future under `limit`.
///
/// An OS-level `TimedOut` error counts as a timeout too, so a slow SYN is
/// never reported as closed.
async fn connect_with_timeout<S, F>(connect: F, limit: Duration) -> ConnectOutcome<S>
where
    F: Future<Output = io::Result<S>>,
{
    match timeout(limit, connect).await {
        Ok(Ok(stream)) => ConnectOutcome::Connected(stream),
        Ok(Err(e)) if e.kind() == io::ErrorKind::TimedOut => ConnectOutcome::TimedOut,
        Ok(Err(e)) => ConnectOutcome::Failed(e),
        Err(_) => ConnectOutcome::TimedOut,
    }
}

/// Uniformly random stealth delay.
fn stealth_delay() -> Duration {
    let (lo, hi) = STEALTH_DELAY_MS;
    Duration::from_millis(rand::thread_rng().gen_range(lo..=hi))
}
