//! dnsmasq DHCP lease file.
//!
//! Each line reads `<expiry> <mac> <ip> <hostname> <client-id>`, hostname
//! `*` meaning unknown. IPv6 leases carry a DUID instead of a MAC and are
//! skipped.

use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use parentctl_app::ports::HostHintSource;
use parentctl_domain::error::ParentalControlError;
use parentctl_domain::host_hint::{HostHint, HostHints};
use parentctl_domain::rule::MacAddr;

use crate::error::HostHintError;

/// Reads hints from a dnsmasq lease file on every call.
#[derive(Debug, Clone)]
pub struct DnsmasqLeases {
    path: PathBuf,
}

impl DnsmasqLeases {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HostHintSource for DnsmasqLeases {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    async fn host_hints(&self) -> Result<HostHints, ParentalControlError> {
        let content =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|source| HostHintError::Io {
                    path: self.path.clone(),
                    source,
                })?;
        Ok(parse_leases(&content))
    }
}

fn parse_line(line: &str) -> Option<(MacAddr, HostHint)> {
    let mut parts = line.split_whitespace();
    let _expiry = parts.next()?;
    let mac = MacAddr::from_str(parts.next()?).ok()?;
    let ip = IpAddr::from_str(parts.next()?).ok()?;
    let hostname = parts.next()?;

    Some((
        mac,
        HostHint {
            name: (hostname != "*").then(|| hostname.to_string()),
            ipv4: ip.is_ipv4().then(|| ip.to_string()),
        },
    ))
}

/// Parse lease file content. Unreadable lines are skipped; for repeated
/// MACs the first line wins and later ones only fill missing fields.
#[must_use]
pub fn parse_leases(content: &str) -> HostHints {
    let mut hints = HostHints::new();
    for line in content.lines().filter(|line| !line.trim().is_empty()) {
        let Some((mac, hint)) = parse_line(line) else {
            tracing::debug!(line, "skipping unreadable lease line");
            continue;
        };
        let entry = hints.entry(mac.to_string()).or_default();
        if entry.name.is_none() {
            entry.name = hint.name;
        }
        if entry.ipv4.is_none() {
            entry.ipv4 = hint.ipv4;
        }
    }
    hints
}

#[cfg(test)]
mod tests {
    use super::*;

    const LEASES: &str = "\
1718000000 aa:bb:cc:dd:ee:01 192.168.1.10 tablet 01:aa:bb:cc:dd:ee:01
1718000100 aa:bb:cc:dd:ee:02 192.168.1.11 * *
duid 00:01:00:01:2c:4f:11:22:aa:bb:cc:dd:ee:ff
1718000200 3600 fd00::10 laptop 00:01:00:01:2c:4f:11:22
garbage
";

    #[test]
    fn should_parse_ipv4_leases() {
        let hints = parse_leases(LEASES);
        assert_eq!(hints.len(), 2);
        let tablet = &hints["AA:BB:CC:DD:EE:01"];
        assert_eq!(tablet.name.as_deref(), Some("tablet"));
        assert_eq!(tablet.ipv4.as_deref(), Some("192.168.1.10"));
    }

    #[test]
    fn should_treat_star_hostname_as_unknown() {
        let hints = parse_leases(LEASES);
        let anonymous = &hints["AA:BB:CC:DD:EE:02"];
        assert_eq!(anonymous.name, None);
        assert_eq!(anonymous.ipv4.as_deref(), Some("192.168.1.11"));
    }

    #[test]
    fn should_fill_missing_fields_from_repeated_mac() {
        let hints = parse_leases(
            "1 aa:bb:cc:dd:ee:01 10.0.0.1 * *\n2 AA:BB:CC:DD:EE:01 10.0.0.2 phone *\n",
        );
        let hint = &hints["AA:BB:CC:DD:EE:01"];
        assert_eq!(hint.name.as_deref(), Some("phone"));
        assert_eq!(hint.ipv4.as_deref(), Some("10.0.0.1"));
    }

    #[test]
    fn should_return_empty_hints_for_empty_file() {
        assert!(parse_leases("").is_empty());
    }

    #[tokio::test]
    async fn should_read_lease_file() {
        let path = std::env::temp_dir().join(format!("parentctl-leases-{}", std::process::id()));
        tokio::fs::write(&path, LEASES).await.unwrap();

        let hints = DnsmasqLeases::new(&path).host_hints().await.unwrap();
        tokio::fs::remove_file(&path).await.unwrap();

        assert_eq!(hints.len(), 2);
    }

    #[tokio::test]
    async fn should_fail_when_lease_file_is_missing() {
        let source = DnsmasqLeases::new("/nonexistent/parentctl/dhcp.leases");
        let err = source.host_hints().await.unwrap_err();
        assert!(matches!(err, ParentalControlError::HostHints(_)));
    }
}
