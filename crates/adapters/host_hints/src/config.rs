//! Host-hint configuration, read from the `[host_hints]` table of the
//! daemon configuration file.

use std::path::PathBuf;

use serde::Deserialize;

use crate::combined::{CombinedHostHints, HostHintProvider};
use crate::dnsmasq::DnsmasqLeases;
use crate::error::HostHintError;
use crate::fixed::StaticHostHints;

/// A host entry written by hand in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StaticHost {
    pub mac: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub ipv4: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HostHintsConfig {
    /// Path of the dnsmasq lease file, usually `/tmp/dhcp.leases`.
    pub leases: Option<PathBuf>,
    /// Hosts known in advance.
    pub hosts: Vec<StaticHost>,
}

impl HostHintsConfig {
    /// Build the configured sources. Static hosts take precedence over
    /// lease entries for the same MAC.
    ///
    /// # Errors
    ///
    /// Returns [`HostHintError`] if a static host is malformed.
    pub fn build(&self) -> Result<CombinedHostHints, HostHintError> {
        let mut sources = Vec::new();
        if !self.hosts.is_empty() {
            sources.push(HostHintProvider::Static(StaticHostHints::from_hosts(
                &self.hosts,
            )?));
        }
        if let Some(path) = &self.leases {
            sources.push(HostHintProvider::Leases(DnsmasqLeases::new(path.clone())));
        }
        Ok(CombinedHostHints::new(sources))
    }
}
