//! Prober trait abstraction and the per-port result types.
//!
//! The coordinator only sees [`Prober`], so the worker pool can be driven by
//! the real network probes or by instrumented ones in tests.

use crate::scanner::tcp::TcpConnectScanner;
use crate::scanner::udp::UdpScanner;
use crate::types::{Protocol, ScanTask};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use std::time::Duration;

/// Status of a scanned port.
///
/// `Error` is a tagged failure, never a classification: a probe that hit an
/// exceptional socket condition reports it here with its reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PortStatus {
    /// Connection accepted (TCP) or a datagram came back (UDP).
    Open,
    /// Connection actively refused or otherwise failed.
    Closed,
    /// TCP connect did not complete within the timeout.
    Timeout,
    /// No UDP reply: open and silent, or filtered.
    OpenFiltered,
    /// The probe itself failed.
    Error(String),
}

impl PortStatus {
    /// Open or open|filtered.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open | Self::OpenFiltered)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for PortStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "OPEN"),
            Self::Closed => write!(f, "CLOSED"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::OpenFiltered => write!(f, "OPEN|FILTERED"),
            Self::Error(reason) => write!(f, "ERROR: {}", reason),
        }
    }
}

impl FromStr for PortStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "CLOSED" => Ok(Self::Closed),
            "TIMEOUT" => Ok(Self::Timeout),
            "OPEN|FILTERED" => Ok(Self::OpenFiltered),
            _ => s
                .strip_prefix("ERROR: ")
                .map(|reason| Self::Error(reason.to_string()))
                .ok_or_else(|| format!("unknown port status: {}", s)),
        }
    }
}

impl Serialize for PortStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PortStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Result of probing a single protocol/port pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    /// The port number that was probed.
    pub port: u32,
    /// Transport used.
    pub protocol: Protocol,
    /// Status determined by the probe.
    pub status: PortStatus,
    /// Detected service label, empty when the port was not reachable.
    pub service: String,
    /// Banner or UDP response text, possibly empty.
    pub banner: String,
}

impl PortResult {
    /// Create a result with no service or banner.
    pub fn new(task: ScanTask, status: PortStatus) -> Self {
        Self {
            port: task.port,
            protocol: task.protocol,
            status,
            service: String::new(),
            banner: String::new(),
        }
    }

    /// Create an `Error` result for `task`.
    pub fn error(task: ScanTask, reason: impl fmt::Display) -> Self {
        Self::new(task, PortStatus::Error(reason.to_string()))
    }

    /// Set the banner.
    pub fn with_banner(mut self, banner: impl Into<String>) -> Self {
        self.banner = banner.into();
        self
    }

    /// Set the service label.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Check if the port is open or open|filtered.
    pub fn is_open(&self) -> bool {
        self.status.is_open()
    }

    /// The task this result answers.
    pub fn task(&self) -> ScanTask {
        ScanTask::new(self.protocol, self.port)
    }
}

/// Something that can run one scan task to completion.
///
/// Implementations must never fail the task outright: every outcome,
/// including socket errors, is reported through the returned [`PortResult`].
#[async_trait]
pub trait Prober: Send + Sync + 'static {
    /// Probe a single protocol/port pair.
    async fn probe(&self, task: ScanTask) -> PortResult;
}

/// The real network prober: TCP connect scans and UDP probe scans against
/// one target address.
pub struct NetworkProber {
    tcp: TcpConnectScanner,
    udp: UdpScanner,
}

impl NetworkProber {
    /// Create a prober for `target`.
    ///
    /// # Arguments
    /// * `target` - Resolved target address
    /// * `timeout` - Per-operation timeout for connect, send, and receive
    /// * `stealth` - Add a random pre-connect delay to TCP probes
    pub fn new(target: IpAddr, timeout: Duration, stealth: bool) -> Self {
        Self {
            tcp: TcpConnectScanner::new(target, timeout, stealth),
            udp: UdpScanner::new(target, timeout),
        }
    }
}

#[async_trait]
impl Prober for NetworkProber {
    async fn probe(&self, task: ScanTask) -> PortResult {
        match task.protocol {
            Protocol::Tcp => self.tcp.scan_port(task.port).await,
            Protocol::Udp => self.udp.scan_port(task.port).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_status_display() {
        assert_eq!(PortStatus::Open.to_string(), "OPEN");
        assert_eq!(PortStatus::Closed.to_string(), "CLOSED");
        assert_eq!(PortStatus::Timeout.to_string(), "TIMEOUT");
        assert_eq!(PortStatus::OpenFiltered.to_string(), "OPEN|FILTERED");
        assert_eq!(
            PortStatus::Error("port must be 0-65535".into()).to_string(),
            "ERROR: port must be 0-65535"
        );
    }

    #[test]
    fn test_port_status_parse_round_trip() {
        for status in [
            PortStatus::Open,
            PortStatus::Timeout,
            PortStatus::OpenFiltered,
            PortStatus::Error("network unreachable".into()),
        ] {
            assert_eq!(status.to_string().parse::<PortStatus>().unwrap(), status);
        }
        assert!("FILTERED".parse::<PortStatus>().is_err());
    }

    #[test]
    fn test_port_result_serialization() {
        let task = ScanTask::new(Protocol::Tcp, 80);
        let result = PortResult::new(task, PortStatus::Open)
            .with_service("HTTP (nginx)")
            .with_banner("nginx");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["port"], 80);
        assert_eq!(json["protocol"], "TCP");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["service"], "HTTP (nginx)");
        assert!(result.is_open());
        assert_eq!(result.task(), task);
    }

    #[test]
    fn test_error_result_is_not_open() {
        let result = PortResult::error(ScanTask::new(Protocol::Udp, 53), "boom");
        assert!(!result.is_open());
        assert!(result.status.is_error());
        assert!(result.service.is_empty());
    }
}
