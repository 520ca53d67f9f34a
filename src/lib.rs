//! # netlib
//!
//! Minimal blocking TCP transport abstraction: one socket type that unifies
//! the client and server roles, and one server type that dispatches exactly
//! one accepted connection per invocation to a user-supplied callback.
//!
//! ## Components
//!
//! - [`TcpSocket`](tcp::TcpSocket): one stream endpoint. Resolution,
//!   bind/listen/accept on the server side, connect on the client side,
//!   send/receive/close on both. Move-only ownership: `accept` returns the
//!   new connection by value, `Drop` closes the descriptor.
//! - [`TcpServer`](tcp::TcpServer): owns one listening socket; `run` binds,
//!   listens, and serves a single accept-receive-acknowledge-dispatch cycle,
//!   then returns. No internal loop.
//!
//! ## Example: single-shot command server
//!
//! ```no_run
//! use netlib::prelude::*;
//!
//! let server = TcpServer::new();
//! server.on_accept(|command, client| {
//!     println!("got command: {command}");
//!     let _ = client.close();
//! });
//!
//! // One connection per run; wrap in a loop for a long-lived service.
//! server.run("127.0.0.1", 12345)?;
//! server.stop()?;
//! # Ok::<(), netlib::NetError>(())
//! ```
//!
//! ## Example: client
//!
//! ```no_run
//! use netlib::tcp::TcpSocket;
//!
//! let mut socket = TcpSocket::new();
//! socket.connect("127.0.0.1", 12345)?;
//! socket.send(b"PING\n")?;
//! let reply = socket.receive(8096)?;
//! println!("{}", String::from_utf8_lossy(&reply));
//! # Ok::<(), netlib::NetError>(())
//! ```
//!
//! ## Concurrency model
//!
//! Single-threaded blocking I/O. Every socket operation blocks its calling
//! thread until the OS call completes; there are no timeouts and no
//! cancellation. The server's running flag is atomically checked-and-set so
//! two overlapping `run` calls cannot both pass the guard; everything else is
//! single-owner state.
//!
//! ## Wire protocol
//!
//! Ad hoc text commands: the client sends raw bytes ending in a newline (a
//! trailing NUL is tolerated), the server always replies
//! `Executing command [<command>] ...\n` before invoking the callback. A
//! command must fit in one receive buffer; one that fills the buffer without
//! a terminator is rejected with
//! [`NetError::CommandTooLarge`](common::NetError::CommandTooLarge).

pub mod common;
pub mod tcp;

// Re-export commonly used types
pub use common::{NetError, NetResult, ServerConfig, DEFAULT_BACKLOG, DEFAULT_BUFFER_SIZE};
pub use tcp::{TcpServer, TcpSocket};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::common::*;
    pub use crate::tcp::*;
}
