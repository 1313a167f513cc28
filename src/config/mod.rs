//! Configuration management for portlook.
//!
//! Provides XDG-compliant default settings and the validated options a scan
//! runs with.

mod options;
mod settings;

pub use options::ScanOptions;
pub use settings::{default_settings_path, Settings, DEFAULT_PORTS, DEFAULT_TIMEOUT_SECS};
