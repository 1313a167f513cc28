//! Scanner module: per-port probes and the worker pool that drives them.
//!
//! - [`tcp`] and [`udp`] implement one probe against one `(address, port)`.
//! - [`traits`] defines the result types and the [`Prober`] seam.
//! - [`coordinator`] fans tasks out over a bounded pool and streams results
//!   back in completion order.

pub mod coordinator;
pub mod tcp;
pub mod traits;
pub mod udp;

pub use coordinator::{
    CancelHandle, ScanCoordinator, ScanProgress, ScanStream, DEFAULT_WORKERS, MAX_WORKERS,
};
pub use tcp::TcpConnectScanner;
pub use traits::{NetworkProber, PortResult, PortStatus, Prober};
pub use udp::UdpScanner;
