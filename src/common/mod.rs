//! Common types shared by the socket and server layers

pub mod config;
pub mod error;

pub use config::{ServerConfig, DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE};
pub use error::{NetError, NetResult};
