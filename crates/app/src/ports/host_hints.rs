//! Host-hint port: read-only directory of known clients.

use std::future::Future;

use parentctl_domain::error::ParentalControlError;
use parentctl_domain::host_hint::HostHints;

/// Supplies MAC → name/IPv4 associations for target suggestions.
pub trait HostHintSource {
    /// Fetch the current hints. An empty map is a valid answer.
    fn host_hints(&self) -> impl Future<Output = Result<HostHints, ParentalControlError>> + Send;
}
