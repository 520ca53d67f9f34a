//! Common error types for socket and server operations

/// Result type alias for network operations
pub type NetResult<T> = std::result::Result<T, NetError>;

/// Error type covering the socket/server lifecycle and every OS-level
/// operation the crate performs.
///
/// A zero-length read is NOT represented here: the peer closing the
/// connection is a normal notification, surfaced as an empty buffer from
/// [`TcpSocket::receive`](crate::tcp::TcpSocket::receive).
#[derive(Debug, thiserror::Error)]
pub enum NetError {
    /// Operation invoked in a state that violates the lifecycle contract
    /// (listen before bind, connect on a bound socket, send/receive on an
    /// unopened socket). A caller bug, never a runtime condition.
    #[error("invalid operation: {0}")]
    Sequence(String),

    /// Address/port lookup failed
    #[error("address resolution failed: {0}")]
    Resolution(String),

    /// Descriptor creation or socket-option configuration failed
    #[error("socket setup failed: {0}")]
    Setup(String),

    /// OS refused the bind (e.g. address already in use)
    #[error("bind failed: {0}")]
    Bind(String),

    /// listen() failed
    #[error("listen failed: {0}")]
    Listen(String),

    /// connect() failed
    #[error("connect failed: {0}")]
    Connect(String),

    /// accept() failed, or the peer address was not addressable
    #[error("accept failed: {0}")]
    Accept(String),

    /// send() failed
    #[error("send failed: {0}")]
    Send(String),

    /// recv() failed
    #[error("receive failed: {0}")]
    Receive(String),

    /// close() itself failed
    #[error("close failed: {0}")]
    Close(String),

    /// A second `run` overlapped a server that is already running
    #[error("server is already running")]
    AlreadyRunning,

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A command filled the whole receive buffer without a terminator
    #[error("command too large: {size} bytes filled the {max_size}-byte receive buffer with no terminator")]
    CommandTooLarge { size: usize, max_size: usize },

    /// I/O error outside the per-operation variants
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl NetError {
    /// Check whether this error is a lifecycle-contract violation (a caller
    /// bug to fix, never something to retry).
    pub fn is_sequence(&self) -> bool {
        matches!(self, NetError::Sequence(_) | NetError::AlreadyRunning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_classification() {
        assert!(NetError::Sequence("listen before bind".into()).is_sequence());
        assert!(NetError::AlreadyRunning.is_sequence());
        assert!(!NetError::Bind("in use".into()).is_sequence());
    }

    #[test]
    fn test_display_carries_operation_context() {
        let err = NetError::CommandTooLarge {
            size: 8096,
            max_size: 8096,
        };
        let msg = err.to_string();
        assert!(msg.contains("8096"));
        assert!(msg.contains("no terminator"));
    }
}
