//! Demo: command client
//!
//! Connects to the demo server, sends one command, and prints the
//! acknowledgement plus the echoed command.
//!
//! ```
//! cargo run --example echo_client
//! ```

use netlib::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let mut socket = TcpSocket::new();
    socket.connect("127.0.0.1", 12345)?;
    println!("🦀 Connected from {}", socket.local_addr()?);

    socket.send(b"PING\n")?;

    let ack = socket.receive(DEFAULT_BUFFER_SIZE)?;
    print!("📤 {}", String::from_utf8_lossy(&ack));

    let echo = socket.receive(DEFAULT_BUFFER_SIZE)?;
    print!("📨 {}", String::from_utf8_lossy(&echo));

    socket.close()?;
    Ok(())
}
