//! # portlook - a concurrent TCP/UDP port scanner
//!
//! portlook probes a set of ports on one host with a bounded pool of async
//! workers and streams the results back as they complete.
//!
//! ## Features
//!
//! - **TCP connect scanning** with banner grabbing on open ports
//! - **UDP scanning** with protocol-specific probes (DNS, NTP, SNMP)
//! - **Bounded concurrency**: a fixed worker pool, never more sockets than workers
//! - **Cooperative cancellation** through a [`scanner::CancelHandle`]
//! - **Service identification** from well-known ports, the system services
//!   database, and banner text
//! - **Exports**: streaming CSV and a JSON report
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use portlook::scanner::{NetworkProber, ScanCoordinator};
//! use portlook::types::{build_tasks, PortSet, Protocol};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let target = "192.168.1.1".parse().unwrap();
//!     let prober = NetworkProber::new(target, Duration::from_secs(1), false);
//!     let tasks = build_tasks(&[Protocol::Tcp], &PortSet::parse("1-1024"));
//!
//!     let mut stream = ScanCoordinator::new(prober, 200).run(tasks);
//!     while let Some(result) = stream.next().await {
//!         if result.is_open() {
//!             println!("{}/{} {}", result.port, result.protocol, result.service);
//!         }
//!     }
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Port sets, protocols, and scan tasks
//! - [`scanner`] - TCP/UDP probes and the worker-pool coordinator
//! - [`services`] - Port and banner based service classification
//! - [`banner`] - Banner grabbing on open TCP connections
//! - [`config`] - Settings file and validated scan options
//! - [`output`] - Console rendering and CSV/JSON exports
//! - [`cli`] - Command-line front end
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod services;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ConfigError, ExportError, ProbeError};
pub use scanner::{
    CancelHandle, NetworkProber, PortResult, PortStatus, Prober, ScanCoordinator, ScanStream,
};
pub use services::classify;
pub use types::{PortSet, Protocol, ScanTask};
