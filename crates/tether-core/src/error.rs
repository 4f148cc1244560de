use std::io;

use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, ErrorKind>;

/// Errors surfaced by the transport layer.
///
/// Failures are reported synchronously to the caller and never retried
/// internally. After an I/O failure the owning instance is left in its
/// inactive state, so subsequent calls report the matching precondition
/// variant instead of touching a broken socket.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The host/port pair could not be resolved to a usable address.
    #[error("failed to resolve {host}:{port}: {reason}")]
    Resolution {
        /// Host name that failed to resolve.
        host: String,
        /// Port the resolution was attempted with.
        port: u16,
        /// Resolver failure description.
        reason: String,
    },

    /// Every resolved address refused the connection or was unreachable.
    #[error("failed to connect to {host}:{port}: {source}")]
    Connection {
        /// Host name the connection was attempted against.
        host: String,
        /// Port the connection was attempted against.
        port: u16,
        /// Last transport-level failure encountered.
        source: io::Error,
    },

    /// A stream operation requiring an established connection was invoked
    /// while disconnected.
    #[error("client is not connected")]
    NotConnected,

    /// A datagram send was attempted with no destination configured.
    #[error("no destination has been set")]
    NoDestination,

    /// An operation was attempted on a closed datagram socket.
    #[error("socket is closed")]
    Closed,

    /// The peer closed the connection before the read condition was met.
    #[error("connection closed by peer")]
    PeerClosed,

    /// A read/write/bind failed at the socket layer.
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
}

impl ErrorKind {
    /// Returns true for the fail-fast variants raised before any socket I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ErrorKind::NotConnected | ErrorKind::NoDestination | ErrorKind::Closed
        )
    }
}
