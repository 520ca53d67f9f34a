// Copyright 2025 Netlib Contributors
// SPDX-License-Identifier: Apache-2.0

//! TCP stream socket
//!
//! [`TcpSocket`] unifies the client and server roles of one stream endpoint:
//! resolution, bind/listen/accept on the server side, connect on the client
//! side, send/receive/close on both. The two roles are mutually exclusive for
//! the socket's lifetime: once bound, a socket can never connect, and vice
//! versa (until [`TcpSocket::close`] returns it to the unopened state).
//!
//! Ownership is exclusive and move-only: there is no `Clone`, and
//! [`TcpSocket::accept`] transfers the new connection by value. Dropping a
//! socket closes its descriptor.
//!
//! All operations block the calling thread with no timeout. There is no
//! cancellation: a pending `accept` or `receive` unblocks only when the peer
//! acts or the process terminates.

use std::io::Read;
use std::net::{SocketAddr, ToSocketAddrs};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, warn};

use crate::common::{NetError, NetResult};

/// Host a default-constructed socket is associated with
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Port a default-constructed socket is associated with
pub const DEFAULT_PORT: u16 = 12345;

/// One TCP stream endpoint
pub struct TcpSocket {
    /// Descriptor; `None` is the unopened/closed sentinel
    inner: Option<Socket>,

    /// Requested address (bind/connect) or numeric peer address (post-accept)
    host: String,
    port: u16,

    /// Cached candidate list from the last resolution
    resolved: Vec<SocketAddr>,

    /// Candidate actually used to create the descriptor; meaningful only
    /// after endpoint creation succeeded
    chosen: Option<SocketAddr>,

    /// Set by `bind`; gates `listen`/`accept` and forbids `connect`
    bound: bool,
}

impl Default for TcpSocket {
    fn default() -> Self {
        Self {
            inner: None,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            resolved: Vec::new(),
            chosen: None,
            bound: false,
        }
    }
}

impl TcpSocket {
    /// Create an unopened socket
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-accepted connection with its numeric peer address
    fn from_accepted(inner: Socket, peer: SocketAddr) -> Self {
        Self {
            inner: Some(inner),
            host: peer.ip().to_string(),
            port: peer.port(),
            resolved: Vec::new(),
            chosen: None,
            bound: false,
        }
    }

    //
    // server operations
    //

    /// Resolve `host:port`, create the descriptor, set `SO_REUSEADDR`, bind.
    ///
    /// Any failure leaves the socket unopened-equivalent. Re-binding after a
    /// `close` is allowed; binding a connected socket is not (the roles are
    /// mutually exclusive for the socket's lifetime).
    pub fn bind(&mut self, host: &str, port: u16) -> NetResult<()> {
        if self.inner.is_some() && !self.bound {
            return Err(NetError::Sequence(format!(
                "bind on a socket connected to {}:{}: connected sockets are client-role only",
                self.host, self.port
            )));
        }

        self.host = host.to_string();
        self.port = port;
        self.resolve()?;
        self.create_endpoint()?;

        // Take the descriptor out so a failure drops it and leaves the
        // socket unopened-equivalent.
        let (sock, addr) = match (self.inner.take(), self.chosen) {
            (Some(sock), Some(addr)) => (sock, addr),
            _ => return Err(NetError::Setup("endpoint missing after creation".to_string())),
        };

        if let Err(e) = sock.set_reuse_address(true) {
            self.reset();
            return Err(NetError::Setup(format!("setsockopt(SO_REUSEADDR): {e}")));
        }

        if let Err(e) = sock.bind(&SockAddr::from(addr)) {
            self.reset();
            return Err(NetError::Bind(format!("{}:{}: {e}", self.host, self.port)));
        }

        self.inner = Some(sock);
        self.bound = true;
        Ok(())
    }

    /// Mark the socket as passive, queueing up to `backlog` pending
    /// connections.
    ///
    /// A backlog above the OS maximum is clamped with a warning, not an
    /// error. Requires a prior successful [`bind`](Self::bind).
    pub fn listen(&mut self, backlog: u32) -> NetResult<()> {
        if !self.bound {
            return Err(NetError::Sequence(
                "listen requires a bound socket; call bind first".to_string(),
            ));
        }
        let sock = self
            .inner
            .as_ref()
            .ok_or_else(|| NetError::Sequence("listen on an unopened socket".to_string()))?;

        let max = Self::max_backlog();
        let effective = if backlog > max {
            warn!(requested = backlog, somaxconn = max, "backlog exceeds SOMAXCONN, clamping");
            max
        } else {
            backlog
        };

        sock.listen(effective as i32)
            .map_err(|e| NetError::Listen(format!("listen(): {e}")))
    }

    /// Block until a pending connection exists, then return it as a new
    /// socket carrying the connection descriptor and the peer's numeric
    /// host/port.
    ///
    /// The returned socket is never itself bound or connected again. This is
    /// the system's only suspension point besides `receive`; it cannot be
    /// cancelled.
    pub fn accept(&self) -> NetResult<TcpSocket> {
        if !self.bound {
            return Err(NetError::Sequence(
                "accept requires a bound, listening socket".to_string(),
            ));
        }
        let sock = self
            .inner
            .as_ref()
            .ok_or_else(|| NetError::Sequence("accept on an unopened socket".to_string()))?;

        let (conn, peer) = sock
            .accept()
            .map_err(|e| NetError::Accept(format!("accept(): {e}")))?;

        // Kernel-returned addresses are already numeric; no DNS involved.
        let peer = peer
            .as_socket()
            .ok_or_else(|| NetError::Accept("peer address is not an inet address".to_string()))?;

        debug!(peer = %peer, "accepted connection");
        Ok(TcpSocket::from_accepted(conn, peer))
    }

    //
    // client operations
    //

    /// Resolve the target, create the descriptor, connect.
    ///
    /// Invalid on a bound socket: bound sockets are server-role only.
    pub fn connect(&mut self, host: &str, port: u16) -> NetResult<()> {
        if self.bound {
            return Err(NetError::Sequence(format!(
                "connect on a socket bound to port {}: bound sockets are server-role only",
                self.port
            )));
        }

        self.host = host.to_string();
        self.port = port;
        self.resolve()?;
        self.create_endpoint()?;

        let (sock, addr) = match (self.inner.take(), self.chosen) {
            (Some(sock), Some(addr)) => (sock, addr),
            _ => return Err(NetError::Setup("endpoint missing after creation".to_string())),
        };

        if let Err(e) = sock.connect(&SockAddr::from(addr)) {
            self.reset();
            return Err(NetError::Connect(format!("{}:{}: {e}", self.host, self.port)));
        }

        self.inner = Some(sock);
        debug!(host = %self.host, port = self.port, "connected");
        Ok(())
    }

    //
    // common operations
    //

    /// Write `data` in a single call with no partial-write retry; returns
    /// the number of bytes actually written.
    pub fn send(&mut self, data: &[u8]) -> NetResult<usize> {
        let sock = self
            .inner
            .as_ref()
            .ok_or_else(|| NetError::Sequence("send on an unopened socket".to_string()))?;

        sock.send(data)
            .map_err(|e| NetError::Send(format!("send(): {e}")))
    }

    /// Read up to `max_size` bytes in a single call.
    ///
    /// The returned buffer holds only the bytes actually read. A zero-length
    /// result means the peer closed the connection; that is a notification,
    /// not an error, and this socket closes itself as a side effect.
    pub fn receive(&mut self, max_size: usize) -> NetResult<Vec<u8>> {
        let mut buffer = vec![0u8; max_size];
        let n = {
            let mut sock = self
                .inner
                .as_ref()
                .ok_or_else(|| NetError::Sequence("receive on an unopened socket".to_string()))?;
            sock.read(&mut buffer)
                .map_err(|e| NetError::Receive(format!("recv(): {e}")))?
        };

        if n == 0 {
            debug!(host = %self.host, port = self.port, "connection closed by peer");
            self.close()?;
            return Ok(Vec::new());
        }

        buffer.truncate(n);
        Ok(buffer)
    }

    /// Close the descriptor if one is open; always leaves the socket
    /// unopened. Idempotent: closing an unopened socket is a no-op.
    pub fn close(&mut self) -> NetResult<()> {
        self.bound = false;
        if let Some(sock) = self.inner.take() {
            Self::close_descriptor(sock)?;
        }
        Ok(())
    }

    //
    // accessors (no side effects)
    //

    /// Host this socket is associated with: the requested address, or the
    /// peer's numeric address for an accepted connection
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port this socket is associated with
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether `bind` has succeeded on this socket
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    /// Whether an open descriptor exists
    pub fn is_open(&self) -> bool {
        self.inner.is_some()
    }

    /// Local address of the open descriptor
    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        let sock = self
            .inner
            .as_ref()
            .ok_or_else(|| NetError::Sequence("local_addr on an unopened socket".to_string()))?;
        sock.local_addr()
            .map_err(NetError::Io)?
            .as_socket()
            .ok_or_else(|| NetError::Setup("local address is not an inet address".to_string()))
    }

    /// Peer address of the open descriptor
    pub fn peer_addr(&self) -> NetResult<SocketAddr> {
        let sock = self
            .inner
            .as_ref()
            .ok_or_else(|| NetError::Sequence("peer_addr on an unopened socket".to_string()))?;
        sock.peer_addr()
            .map_err(NetError::Io)?
            .as_socket()
            .ok_or_else(|| NetError::Setup("peer address is not an inet address".to_string()))
    }

    /// Raw descriptor, `-1` when unopened
    #[cfg(unix)]
    pub fn raw_fd(&self) -> std::os::unix::io::RawFd {
        use std::os::unix::io::AsRawFd;
        self.inner.as_ref().map(|s| s.as_raw_fd()).unwrap_or(-1)
    }

    //
    // internals
    //

    /// Resolve `host:port` into addressable candidates and cache them
    fn resolve(&mut self) -> NetResult<()> {
        let target = format!("{}:{}", self.host, self.port);
        let addrs: Vec<SocketAddr> = target
            .to_socket_addrs()
            .map_err(|e| NetError::Resolution(format!("{target}: {e}")))?
            .collect();
        if addrs.is_empty() {
            return Err(NetError::Resolution(format!("{target}: no candidates")));
        }
        self.resolved = addrs;
        Ok(())
    }

    /// Create the descriptor from the first workable resolved candidate.
    /// No-op when a descriptor already exists.
    fn create_endpoint(&mut self) -> NetResult<()> {
        if self.inner.is_some() {
            return Ok(());
        }

        let mut last_err = None;
        for addr in &self.resolved {
            match Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP)) {
                Ok(sock) => {
                    self.inner = Some(sock);
                    self.chosen = Some(*addr);
                    return Ok(());
                }
                Err(e) => {
                    warn!(candidate = %addr, error = %e, "failed to create socket, trying next candidate");
                    last_err = Some(e);
                }
            }
        }

        Err(NetError::Setup(match last_err {
            Some(e) => format!("socket() failed for every candidate: {e}"),
            None => "no resolved candidates".to_string(),
        }))
    }

    /// Return to the unopened-equivalent state after a failed setup
    fn reset(&mut self) {
        self.inner = None;
        self.chosen = None;
        self.bound = false;
    }

    #[cfg(unix)]
    fn max_backlog() -> u32 {
        libc::SOMAXCONN as u32
    }

    #[cfg(not(unix))]
    fn max_backlog() -> u32 {
        128
    }

    /// Close the descriptor, surfacing a close(2) failure
    #[cfg(unix)]
    fn close_descriptor(sock: Socket) -> NetResult<()> {
        use std::os::unix::io::IntoRawFd;
        let fd = sock.into_raw_fd();
        if unsafe { libc::close(fd) } == -1 {
            return Err(NetError::Close(format!(
                "close({fd}): {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(())
    }

    #[cfg(not(unix))]
    fn close_descriptor(sock: Socket) -> NetResult<()> {
        drop(sock);
        Ok(())
    }
}

impl Drop for TcpSocket {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_socket_is_unopened() {
        let socket = TcpSocket::new();
        assert!(!socket.is_open());
        assert!(!socket.is_bound());
        assert_eq!(socket.host(), DEFAULT_HOST);
        assert_eq!(socket.port(), DEFAULT_PORT);
        #[cfg(unix)]
        assert_eq!(socket.raw_fd(), -1);
    }

    #[test]
    fn test_listen_before_bind_is_sequence_error() {
        let mut socket = TcpSocket::new();
        let err = socket.listen(30).unwrap_err();
        assert!(err.is_sequence(), "got {err:?}");
    }

    #[test]
    fn test_send_receive_on_unopened_socket_are_sequence_errors() {
        let mut socket = TcpSocket::new();
        assert!(socket.send(b"data").unwrap_err().is_sequence());
        assert!(socket.receive(16).unwrap_err().is_sequence());
    }

    #[test]
    fn test_connect_on_bound_socket_is_sequence_error() {
        let mut socket = TcpSocket::new();
        socket.bind("127.0.0.1", 0).unwrap();
        let err = socket.connect("127.0.0.1", 1).unwrap_err();
        assert!(err.is_sequence(), "got {err:?}");
    }

    #[test]
    fn test_bind_on_connected_socket_is_sequence_error() {
        let mut listener = TcpSocket::new();
        listener.bind("127.0.0.1", 0).unwrap();
        let port = listener.local_addr().unwrap().port();
        listener.listen(4).unwrap();

        let mut socket = TcpSocket::new();
        socket.connect("127.0.0.1", port).unwrap();

        let err = socket.bind("127.0.0.1", 0).unwrap_err();
        assert!(err.is_sequence(), "got {err:?}");
        // The rejected bind must not disturb the live connection
        assert!(socket.is_open());
        assert!(!socket.is_bound());
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut socket = TcpSocket::new();
        socket.bind("127.0.0.1", 0).unwrap();
        assert!(socket.is_open());

        socket.close().unwrap();
        assert!(!socket.is_open());
        assert!(!socket.is_bound());

        socket.close().unwrap();
        assert!(!socket.is_open());
        assert!(!socket.is_bound());
    }

    #[test]
    fn test_rebind_after_close() {
        let mut socket = TcpSocket::new();
        socket.bind("127.0.0.1", 0).unwrap();
        socket.close().unwrap();

        socket.bind("127.0.0.1", 0).unwrap();
        assert!(socket.is_bound());
    }

    #[test]
    fn test_bind_failure_leaves_socket_unopened() {
        let mut first = TcpSocket::new();
        first.bind("127.0.0.1", 0).unwrap();
        let port = first.local_addr().unwrap().port();
        first.listen(4).unwrap();

        // SO_REUSEADDR does not allow a second live listener on one port
        let mut second = TcpSocket::new();
        let err = second.bind("127.0.0.1", port).unwrap_err();
        assert!(matches!(err, NetError::Bind(_)), "got {err:?}");
        assert!(!second.is_open());
        assert!(!second.is_bound());
    }

    #[test]
    fn test_resolution_failure() {
        let mut socket = TcpSocket::new();
        let err = socket.bind("no-such-host.invalid", 1).unwrap_err();
        assert!(matches!(err, NetError::Resolution(_)), "got {err:?}");
        assert!(!socket.is_bound());
    }
}
