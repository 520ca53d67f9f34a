//! Demo: command server
//!
//! Serves text commands on 127.0.0.1:12345, one connection per cycle, and
//! echoes each command back to the client after the acknowledgement.
//!
//! Run this server first, then the client in another terminal:
//! ```
//! cargo run --example echo_server
//! ```

use netlib::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    let server = TcpServer::new();
    server.on_accept(|command, client| {
        println!("📨 Received command: {command}");
        let echo = format!("{command}\n");
        if let Err(e) = client.send(echo.as_bytes()) {
            eprintln!("echo failed: {e}");
        }
        let _ = client.close();
    });

    println!("🦀 Serving commands on 127.0.0.1:12345 (ctrl-c to quit)");

    // run serves exactly one connection; loop externally for a long-lived
    // service, re-arming with stop between cycles.
    loop {
        server.run("127.0.0.1", 12345)?;
        server.stop()?;
    }
}
