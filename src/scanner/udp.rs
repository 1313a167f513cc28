//! UDP Scanner implementation.
//!
//! Sends one protocol-specific probe (or a single zero byte) and waits for
//! a reply. UDP scanning is inherently ambiguous:
//!
//! 1. **UDP Response**: the port is open
//! 2. **No Response**: the port is open and silent, or filtered. This is
//!    reported as `OPEN|FILTERED`, never as open or closed.
//!
//! The socket is left unconnected, so ICMP port-unreachable replies are not
//! surfaced by the kernel and cannot be mistaken for a closed port.

use crate::banner::{decode_banner, MAX_BANNER_SIZE};
use crate::error::{ProbeError, ProbeResult};
use crate::scanner::traits::{PortResult, PortStatus};
use crate::services::classify;
use crate::types::{Protocol, ScanTask};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// DNS header: id 0, standard query, no questions.
const DNS_PROBE: &[u8] = b"\x00\x00\x10\x00\x00\x00\x00\x00\x00\x00\x00\x00";

/// NTP v3 client request (LI 0, VN 3, mode 3) followed by a zeroed body.
const NTP_PROBE: &[u8] = &[
    0x1b, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// SNMP v1 get-request prefix with community "public".
const SNMP_PROBE: &[u8] = b"\x30\x26\x02\x01\x00\x04\x06\x70\x75\x62\x6c\x69\x63";

/// Default probe for ports without a known payload.
const DEFAULT_PROBE: &[u8] = b"\x00";

/// UDP Scanner for detecting open UDP ports.
pub struct UdpScanner {
    target: IpAddr,
    timeout: Duration,
}

impl UdpScanner {
    /// Create a new UDP scanner.
    ///
    /// # Arguments
    /// * `target` - Target IP address
    /// * `timeout` - How long to wait for the send and for a response
    pub fn new(target: IpAddr, timeout: Duration) -> Self {
        Self { target, timeout }
    }

    /// Scan a single UDP port. Never fails: errors become `ERROR` results.
    pub async fn scan_port(&self, port: u32) -> PortResult {
        let task = ScanTask::new(Protocol::Udp, port);
        match self.probe(task).await {
            Ok(result) => result,
            Err(e) => {
                tracing::debug!(%task, "udp probe failed: {}", e);
                PortResult::error(task, e)
            }
        }
    }

    /// Send the probe and wait for a single datagram.
    async fn probe(&self, task: ScanTask) -> ProbeResult<PortResult> {
        let port = u16::try_from(task.port).map_err(|_| ProbeError::PortOutOfRange(task.port))?;
        let addr = SocketAddr::new(self.target, port);

        let local_addr = match self.target {
            IpAddr::V4(_) => SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            IpAddr::V6(_) => SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), 0),
        };
        let socket = UdpSocket::bind(local_addr)
            .await
            .map_err(ProbeError::Socket)?;

        let payload = probe_for_port(port);
        match timeout(self.timeout, socket.send_to(payload, addr)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ProbeError::Send(e)),
            Err(_) => return Ok(self.open_filtered(task)),
        }

        let mut buf = [0u8; MAX_BANNER_SIZE];
        match timeout(self.timeout, socket.recv_from(&mut buf)).await {
            Ok(Ok((n, from))) => {
                tracing::trace!(%task, %from, bytes = n, "udp response");
                let response = decode_banner(&buf[..n]);
                let service = classify(task.port, &response);
                Ok(PortResult::new(task, PortStatus::Open)
                    .with_service(service)
                    .with_banner(response))
            }
            Ok(Err(e)) => Err(ProbeError::Receive(e)),
            Err(_) => Ok(self.open_filtered(task)),
        }
    }

    /// No reply observed: classify from the bare port.
    fn open_filtered(&self, task: ScanTask) -> PortResult {
        PortResult::new(task, PortStatus::OpenFiltered).with_service(classify(task.port, ""))
    }
}

/// Get the appropriate probe payload for a port.
pub fn probe_for_port(port: u16) -> &'static [u8] {
    match port {
        53 => DNS_PROBE,
        123 => NTP_PROBE,
        161 => SNMP_PROBE,
        _ => DEFAULT_PROBE,
    }
}
