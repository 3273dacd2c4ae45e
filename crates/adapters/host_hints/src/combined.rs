//! Merging of several host-hint sources.

use parentctl_app::ports::HostHintSource;
use parentctl_domain::error::ParentalControlError;
use parentctl_domain::host_hint::HostHints;

use crate::dnsmasq::DnsmasqLeases;
use crate::fixed::StaticHostHints;

/// One configured source.
#[derive(Debug, Clone)]
pub enum HostHintProvider {
    Static(StaticHostHints),
    Leases(DnsmasqLeases),
}

impl HostHintSource for HostHintProvider {
    async fn host_hints(&self) -> Result<HostHints, ParentalControlError> {
        match self {
            Self::Static(inner) => inner.host_hints().await,
            Self::Leases(inner) => inner.host_hints().await,
        }
    }
}

/// Queries every source in order. Earlier sources win, later ones only
/// fill fields left empty.
///
/// A failing source is skipped. The call only fails when every source
/// failed.
#[derive(Debug, Clone, Default)]
pub struct CombinedHostHints {
    sources: Vec<HostHintProvider>,
}

impl CombinedHostHints {
    #[must_use]
    pub fn new(sources: Vec<HostHintProvider>) -> Self {
        Self { sources }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn fill(target: &mut HostHints, hints: HostHints) {
    for (mac, hint) in hints {
        let entry = target.entry(mac).or_default();
        if entry.name.is_none() {
            entry.name = hint.name;
        }
        if entry.ipv4.is_none() {
            entry.ipv4 = hint.ipv4;
        }
    }
}

impl HostHintSource for CombinedHostHints {
    async fn host_hints(&self) -> Result<HostHints, ParentalControlError> {
        let mut merged = HostHints::new();
        let mut last_error = None;
        let mut succeeded = 0_usize;

        for source in &self.sources {
            match source.host_hints().await {
                Ok(hints) => {
                    fill(&mut merged, hints);
                    succeeded += 1;
                }
                Err(err) => {
                    tracing::warn!(error = %err, "host hint source unavailable");
                    last_error = Some(err);
                }
            }
        }

        match last_error {
            Some(err) if succeeded == 0 => Err(err),
            _ => Ok(merged),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StaticHost;

    fn fixed(mac: &str, name: Option<&str>, ipv4: Option<&str>) -> HostHintProvider {
        HostHintProvider::Static(
            StaticHostHints::from_hosts(&[StaticHost {
                mac: mac.to_string(),
                name: name.map(str::to_string),
                ipv4: ipv4.map(str::to_string),
            }])
            .unwrap(),
        )
    }

    fn missing_leases() -> HostHintProvider {
        HostHintProvider::Leases(DnsmasqLeases::new("/nonexistent/parentctl/dhcp.leases"))
    }

    #[tokio::test]
    async fn should_return_empty_hints_without_sources() {
        let hints = CombinedHostHints::default().host_hints().await.unwrap();
        assert!(hints.is_empty());
    }

    #[tokio::test]
    async fn should_let_earlier_sources_win() {
        let combined = CombinedHostHints::new(vec![
            fixed("00:11:22:33:44:55", Some("tablet"), None),
            fixed("00:11:22:33:44:55", Some("android-1234"), Some("10.0.0.5")),
        ]);
        let hints = combined.host_hints().await.unwrap();
        let hint = &hints["00:11:22:33:44:55"];
        assert_eq!(hint.name.as_deref(), Some("tablet"));
        assert_eq!(hint.ipv4.as_deref(), Some("10.0.0.5"));
    }

    #[tokio::test]
    async fn should_skip_failing_source() {
        let combined = CombinedHostHints::new(vec![
            missing_leases(),
            fixed("00:11:22:33:44:55", Some("tablet"), None),
        ]);
        let hints = combined.host_hints().await.unwrap();
        assert_eq!(hints.len(), 1);
    }

    #[tokio::test]
    async fn should_fail_when_every_source_fails() {
        let combined = CombinedHostHints::new(vec![missing_leases()]);
        assert!(combined.host_hints().await.is_err());
    }
}
