//! Host-hint adapter error type.

use std::path::PathBuf;

use parentctl_domain::error::ParentalControlError;

#[derive(Debug, thiserror::Error)]
pub enum HostHintError {
    /// The lease file could not be read.
    #[error("unable to read lease file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A configured host carries an unreadable MAC address.
    #[error("invalid MAC address in host list: {0}")]
    InvalidMac(String),

    /// A configured host carries an unreadable IPv4 address.
    #[error("invalid IPv4 address in host list: {0}")]
    InvalidIpv4(String),
}

impl From<HostHintError> for ParentalControlError {
    fn from(err: HostHintError) -> Self {
        Self::HostHints(Box::new(err))
    }
}
