//! Validated scan options handed to the engine.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::MAX_WORKERS;
use crate::types::{build_tasks, PortSet, Protocol, ScanTask};
use std::net::IpAddr;
use std::time::Duration;

/// Everything the engine needs for one scan, already checked.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Resolved target address.
    pub target: IpAddr,
    /// Protocols to probe, in dispatch order.
    pub protocols: Vec<Protocol>,
    /// Ports to probe.
    pub ports: PortSet,
    /// Worker pool size.
    pub workers: usize,
    /// Per-operation timeout.
    pub timeout: Duration,
    /// Random pre-connect delay for TCP probes.
    pub stealth: bool,
}

impl ScanOptions {
    /// Validate raw inputs.
    ///
    /// `workers` must lie in `1..=1000` and `timeout_secs` must be a positive,
    /// finite number of seconds.
    pub fn new(
        target: IpAddr,
        protocols: Vec<Protocol>,
        ports: PortSet,
        workers: usize,
        timeout_secs: f64,
        stealth: bool,
    ) -> ConfigResult<Self> {
        if !(1..=MAX_WORKERS).contains(&workers) {
            return Err(ConfigError::InvalidWorkers {
                got: workers,
                min: 1,
                max: MAX_WORKERS,
            });
        }
        let timeout = Duration::try_from_secs_f64(timeout_secs)
            .ok()
            .filter(|t| !t.is_zero())
            .ok_or(ConfigError::InvalidTimeout(timeout_secs))?;

        Ok(Self {
            target,
            protocols,
            ports,
            workers,
            timeout,
            stealth,
        })
    }

    /// The protocol × port cross product.
    pub fn tasks(&self) -> Vec<ScanTask> {
        build_tasks(&self.protocols, &self.ports)
    }

    /// Total number of probes this scan will run.
    pub fn task_count(&self) -> usize {
        self.protocols.len() * self.ports.len()
    }
}
