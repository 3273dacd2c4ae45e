//! Hosts listed in the configuration.

use std::net::Ipv4Addr;
use std::str::FromStr;

use parentctl_app::ports::HostHintSource;
use parentctl_domain::error::ParentalControlError;
use parentctl_domain::host_hint::{HostHint, HostHints};
use parentctl_domain::rule::MacAddr;

use crate::config::StaticHost;
use crate::error::HostHintError;

/// A fixed set of hints, keyed by normalised MAC.
#[derive(Debug, Clone, Default)]
pub struct StaticHostHints {
    hints: HostHints,
}

impl StaticHostHints {
    /// Validate and normalise configured hosts.
    ///
    /// # Errors
    ///
    /// Returns [`HostHintError`] on the first host with an unreadable MAC
    /// or IPv4 address.
    pub fn from_hosts(hosts: &[StaticHost]) -> Result<Self, HostHintError> {
        let mut hints = HostHints::new();
        for host in hosts {
            let mac = MacAddr::from_str(&host.mac)
                .map_err(|_| HostHintError::InvalidMac(host.mac.clone()))?;
            if let Some(ipv4) = &host.ipv4 {
                Ipv4Addr::from_str(ipv4).map_err(|_| HostHintError::InvalidIpv4(ipv4.clone()))?;
            }
            hints.insert(
                mac.to_string(),
                HostHint {
                    name: host.name.clone().filter(|name| !name.is_empty()),
                    ipv4: host.ipv4.clone(),
                },
            );
        }
        Ok(Self { hints })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hints.is_empty()
    }

    pub(crate) fn hints(&self) -> &HostHints {
        &self.hints
    }
}

impl HostHintSource for StaticHostHints {
    async fn host_hints(&self) -> Result<HostHints, ParentalControlError> {
        Ok(self.hints.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host(mac: &str, name: Option<&str>, ipv4: Option<&str>) -> StaticHost {
        StaticHost {
            mac: mac.to_string(),
            name: name.map(str::to_string),
            ipv4: ipv4.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn should_key_hints_by_uppercase_mac() {
        let source =
            StaticHostHints::from_hosts(&[host("aa:bb:cc:dd:ee:ff", Some("tablet"), None)])
                .unwrap();
        let hints = source.host_hints().await.unwrap();
        assert_eq!(
            hints.get("AA:BB:CC:DD:EE:FF").and_then(|h| h.name.as_deref()),
            Some("tablet")
        );
    }

    #[test]
    fn should_drop_empty_names() {
        let source =
            StaticHostHints::from_hosts(&[host("00:11:22:33:44:55", Some(""), Some("10.0.0.2"))])
                .unwrap();
        let hint = &source.hints()["00:11:22:33:44:55"];
        assert_eq!(hint.name, None);
        assert_eq!(hint.ipv4.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn should_reject_ipv6_address() {
        let err = StaticHostHints::from_hosts(&[host("00:11:22:33:44:55", None, Some("fe80::1"))])
            .unwrap_err();
        assert!(matches!(err, HostHintError::InvalidIpv4(ref ip) if ip == "fe80::1"));
    }
}
