//! Core type definitions: port sets and scan tasks.

mod port;
mod task;

pub use port::PortSet;
pub use task::{build_tasks, Protocol, ScanTask};
