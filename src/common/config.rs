//! Server configuration
//!
//! The backlog and receive-buffer size are explicit per-server configuration
//! rather than process-wide constants, so both stay testable.

use serde::{Deserialize, Serialize};

/// Default depth of the pending-connection queue
pub const DEFAULT_BACKLOG: u32 = 30;

/// Default maximum bytes read per receive call
pub const DEFAULT_BUFFER_SIZE: usize = 8096;

/// Tunables for [`TcpServer`](crate::tcp::TcpServer)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Maximum number of not-yet-accepted pending connections the listening
    /// socket will queue
    pub backlog: u32,

    /// Maximum bytes read per receive call; a command must fit in one buffer
    pub buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            backlog: DEFAULT_BACKLOG,
            buffer_size: DEFAULT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    /// Create a config with the default tunables
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pending-connection queue depth
    pub fn with_backlog(mut self, backlog: u32) -> Self {
        self.backlog = backlog;
        self
    }

    /// Set the receive-buffer size
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.backlog == 0 {
            return Err("backlog must be greater than 0".to_string());
        }
        if self.buffer_size == 0 {
            return Err("buffer size must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.backlog, DEFAULT_BACKLOG);
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builders() {
        let config = ServerConfig::new().with_backlog(64).with_buffer_size(1024);
        assert_eq!(config.backlog, 64);
        assert_eq!(config.buffer_size, 1024);
    }

    #[test]
    fn test_validation_rejects_zero() {
        assert!(ServerConfig::new().with_buffer_size(0).validate().is_err());
        assert!(ServerConfig::new().with_backlog(0).validate().is_err());
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = ServerConfig::new().with_backlog(8).with_buffer_size(256);
        let json = serde_json::to_string(&config).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.backlog, 8);
        assert_eq!(back.buffer_size, 256);
    }
}
