//! Blocking TCP socket and single-shot dispatch server

pub mod server;
pub mod socket;

pub use server::{AcceptCallback, TcpServer};
pub use socket::{TcpSocket, DEFAULT_HOST, DEFAULT_PORT};
