// Copyright 2025 Netlib Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-shot TCP dispatch server
//!
//! [`TcpServer`] owns one listening [`TcpSocket`] and serves exactly one
//! accepted connection per invocation of [`TcpServer::run`]: bind, listen,
//! accept, read one terminator-delimited text command, acknowledge it, and
//! hand the command plus the accepted socket to the registered callback.
//! There is no internal loop; a long-lived service wraps `run`/`stop` in an
//! external loop.

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::common::{NetError, NetResult, ServerConfig};
use crate::tcp::TcpSocket;

/// Callback invoked once per served connection with the parsed command and
/// the accepted client socket. The socket stays open after the callback
/// returns; the callback closes it, or `Drop` does when it goes out of scope.
pub type AcceptCallback = Box<dyn FnMut(&str, &mut TcpSocket) + Send>;

/// TCP server serving one connection per `run` invocation
pub struct TcpServer {
    socket: Mutex<TcpSocket>,
    callback: Mutex<Option<AcceptCallback>>,
    config: ServerConfig,
    running: AtomicBool,
}

impl Default for TcpServer {
    fn default() -> Self {
        Self {
            socket: Mutex::new(TcpSocket::new()),
            callback: Mutex::new(None),
            config: ServerConfig::default(),
            running: AtomicBool::new(false),
        }
    }
}

impl TcpServer {
    /// Create a server with the default tunables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server with explicit tunables
    pub fn with_config(config: ServerConfig) -> NetResult<Self> {
        config.validate().map_err(NetError::InvalidConfig)?;
        Ok(Self {
            socket: Mutex::new(TcpSocket::new()),
            callback: Mutex::new(None),
            config,
            running: AtomicBool::new(false),
        })
    }

    /// Register the dispatch callback, overwriting any previous registration.
    /// The callback is read once per served connection.
    pub fn on_accept<F>(&self, callback: F)
    where
        F: FnMut(&str, &mut TcpSocket) + Send + 'static,
    {
        *self.callback.lock() = Some(Box::new(callback));
    }

    /// Bind to `host:port`, listen with the configured backlog, and serve
    /// exactly one request cycle.
    ///
    /// Returns [`NetError::AlreadyRunning`] if another `run` already passed
    /// the guard; the atomic check-and-set is the one concurrency invariant
    /// here. On success the server stays marked running until
    /// [`stop`](Self::stop); a failed cycle clears the flag before the error
    /// propagates so the server can be restarted.
    pub fn run(&self, host: &str, port: u16) -> NetResult<()> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(NetError::AlreadyRunning);
        }

        match self.serve_once(host, port) {
            Ok(()) => Ok(()),
            Err(e) => {
                let _ = self.socket.lock().close();
                self.running.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Close the listening socket and mark not-running. No-op when not
    /// running; safe to call repeatedly.
    pub fn stop(&self) -> NetResult<()> {
        if self
            .running
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Ok(());
        }
        self.socket.lock().close()?;
        info!("🦀 [TCP-SERVER] stopped");
        Ok(())
    }

    /// Whether a `run` invocation has passed the guard and `stop` has not
    /// been called since
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn serve_once(&self, host: &str, port: u16) -> NetResult<()> {
        {
            let mut sock = self.socket.lock();
            sock.bind(host, port)?;
            sock.listen(self.config.backlog)?;
        }
        info!(%host, port, backlog = self.config.backlog, "🦀 [TCP-SERVER] listening");
        self.process()
    }

    /// One accept-receive-acknowledge-dispatch cycle
    fn process(&self) -> NetResult<()> {
        let mut client = self.socket.lock().accept()?;

        let raw = client.receive(self.config.buffer_size)?;
        if raw.is_empty() {
            debug!("peer closed before sending a command");
            return Ok(());
        }

        let command = parse_command(&raw, self.config.buffer_size)?;
        let reply = format!("Executing command [{command}] ...\n");
        client.send(reply.as_bytes())?;
        debug!(command = %command, peer = %client.host(), "dispatching command");

        // Take the callback out for the call so a callback that re-registers
        // via on_accept cannot deadlock on the slot.
        let taken = self.callback.lock().take();
        if let Some(mut callback) = taken {
            callback(&command, &mut client);
            let mut slot = self.callback.lock();
            if slot.is_none() {
                *slot = Some(callback);
            }
        }
        Ok(())
    }
}

impl Drop for TcpServer {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

/// Parse a terminator-delimited command out of one receive buffer.
///
/// Trailing NULs are dropped (C-string senders pad with one), then a single
/// trailing `\n` is stripped. A command that fills the whole buffer without a
/// terminator is rejected instead of silently mis-trimmed.
fn parse_command(raw: &[u8], max_size: usize) -> NetResult<String> {
    let mut bytes = raw;
    let mut terminated = false;
    while let [rest @ .., 0] = bytes {
        bytes = rest;
        terminated = true;
    }
    if let [rest @ .., b'\n'] = bytes {
        bytes = rest;
        terminated = true;
    }
    if !terminated && raw.len() == max_size {
        return Err(NetError::CommandTooLarge {
            size: raw.len(),
            max_size,
        });
    }
    Ok(String::from_utf8_lossy(bytes).into_owned())
}
