//! # parentctl-adapter-host-hints
//!
//! Host-hint directory adapters implementing the `HostHintSource` port
//! defined in `parentctl-app::ports`.
//!
//! ## Sources
//! - [`DnsmasqLeases`] reads the DHCP lease file written by dnsmasq
//! - [`StaticHostHints`] serves hosts listed in the daemon configuration
//! - [`CombinedHostHints`] merges several sources, earlier ones winning
//!
//! ## Dependency rule
//! Depends on `parentctl-app` (for port traits) and `parentctl-domain` (for domain types).

mod combined;
mod config;
mod dnsmasq;
mod error;
mod fixed;

pub use combined::{CombinedHostHints, HostHintProvider};
pub use config::{HostHintsConfig, StaticHost};
pub use dnsmasq::{DnsmasqLeases, parse_leases};
pub use error::HostHintError;
pub use fixed::StaticHostHints;
