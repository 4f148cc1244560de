//! Simple stream echo server using tether.
//!
//! Run:
//! - cargo run -p tether --example echo_server
//! - cargo run -p tether --example echo_server -- 7777

use std::{env, sync::Arc, thread, time::Duration};

use tether::StreamServer;

fn parse_port() -> Option<u16> {
    let mut args = env::args().skip(1);
    args.next().and_then(|s| s.parse().ok())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = parse_port().unwrap_or(9000);

    let server = Arc::new(StreamServer::echo());
    let runner = Arc::clone(&server);
    let handle = thread::spawn(move || runner.start(port));

    while server.local_addr().is_none() && !handle.is_finished() {
        thread::sleep(Duration::from_millis(10));
    }

    match server.local_addr() {
        Some(addr) => {
            println!("Tether echo server listening on {}", addr);
            println!("Send from the stream_client example to see echoes; Ctrl+C to quit.");
        }
        None => eprintln!("server exited early"),
    }

    match handle.join() {
        Ok(result) => result?,
        Err(_) => eprintln!("server thread panicked"),
    }
    Ok(())
}
