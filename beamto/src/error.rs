//! Error types for beamto client operations.

use std::io;
use std::path::PathBuf;

use beamto_proto::WireError;

/// Alias for `Result<T, beamto::Error>`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by beamto client operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The service endpoint could not be opened.
    ///
    /// This is the expected condition whenever the background service is
    /// not running, and callers typically treat it as a quiet no-op
    /// (no device menu, nothing to submit to) rather than a fault.
    #[error("service unavailable at {}", .endpoint.display())]
    ServiceUnavailable {
        /// Endpoint path that could not be opened.
        endpoint: PathBuf,
        /// Underlying connect failure.
        #[source]
        source: io::Error,
    },

    /// The exchange failed after the channel was opened.
    ///
    /// Covers short reads, invalid UTF-8, and mid-sequence I/O failures.
    /// No partial result accompanies this: a device list that dies on
    /// entry three is reported as this error, not as two devices.
    #[error("protocol exchange failed")]
    Protocol(#[source] WireError),

    /// The per-call deadline elapsed before the exchange completed.
    #[error("service did not complete the exchange before the deadline")]
    Timeout,

    /// A submission was attempted with an empty file set.
    ///
    /// Rejected before any connection is made; the service would treat an
    /// empty job as a malformed request anyway.
    #[error("refusing to submit an empty file set")]
    NoFiles,
}

impl Error {
    /// Returns `true` for the expected service-not-running condition.
    ///
    /// Distinct from a successful enumeration that found zero devices,
    /// which is `Ok(vec![])` from [`crate::Client::list_devices`].
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable { .. })
    }

    /// Returns `true` if the per-call deadline elapsed.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<WireError> for Error {
    /// Classifies codec failures: deadline-driven I/O errors surface as
    /// [`Error::Timeout`], everything else as [`Error::Protocol`].
    fn from(e: WireError) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Protocol(e)
        }
    }
}
