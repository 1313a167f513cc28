//! Scan tasks: one protocol/port pair per probe.

use super::port::PortSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Transport protocol probed by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tcp => write!(f, "TCP"),
            Self::Udp => write!(f, "UDP"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            _ => Err(format!("unknown protocol: {}", s)),
        }
    }
}

/// A single unit of work for the scan coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScanTask {
    pub protocol: Protocol,
    pub port: u32,
}

impl ScanTask {
    pub const fn new(protocol: Protocol, port: u32) -> Self {
        Self { protocol, port }
    }
}

impl fmt::Display for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.port, self.protocol)
    }
}

/// Expand the selected protocols and ports into their cross product.
///
/// Protocols are expanded in the order given, each over the full port set.
pub fn build_tasks(protocols: &[Protocol], ports: &PortSet) -> Vec<ScanTask> {
    protocols
        .iter()
        .flat_map(|&protocol| ports.iter().map(move |port| ScanTask::new(protocol, port)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_display() {
        assert_eq!(Protocol::Tcp.to_string(), "TCP");
        assert_eq!(Protocol::Udp.to_string(), "UDP");
        assert_eq!("udp".parse::<Protocol>().unwrap(), Protocol::Udp);
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_cross_product() {
        let ports = PortSet::parse("22,80");
        let tasks = build_tasks(&[Protocol::Tcp, Protocol::Udp], &ports);
        assert_eq!(
            tasks,
            vec![
                ScanTask::new(Protocol::Tcp, 22),
                ScanTask::new(Protocol::Tcp, 80),
                ScanTask::new(Protocol::Udp, 22),
                ScanTask::new(Protocol::Udp, 80),
            ]
        );
    }

    #[test]
    fn test_empty_inputs() {
        assert!(build_tasks(&[Protocol::Tcp], &PortSet::default()).is_empty());
        assert!(build_tasks(&[], &PortSet::parse("1-10")).is_empty());
    }
}
