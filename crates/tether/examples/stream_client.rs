//! Simple stream client using tether.
//!
//! Connects to a running echo server (see the echo_server example), sends a
//! message, and prints what comes back.
//!
//! Run:
//! - cargo run -p tether --example stream_client
//! - cargo run -p tether --example stream_client -- localhost 7777 "hi there"

use std::env;

use tether::StreamClient;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "localhost".into());
    let port = args.next().and_then(|s| s.parse().ok()).unwrap_or(9000);
    let message = args.next().unwrap_or_else(|| "hello over the wire".into());

    let mut client = StreamClient::connect_to(&host, port)?;
    println!("connected to {}:{}", host, port);

    client.send(message.as_bytes())?;
    println!("sent:     \"{}\"", message);

    let reply = client.receive()?;
    println!("received: \"{}\"", String::from_utf8_lossy(&reply));

    client.disconnect();
    Ok(())
}
