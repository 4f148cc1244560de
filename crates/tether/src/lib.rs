#![warn(missing_docs)]

//! Tether: a small public API facade for the workspace.
//!
//! This crate provides a clean, stable surface that re-exports the transport
//! primitives higher layers build on:
//!
//! - Stream client and server (`StreamClient`, `StreamServer`)
//! - Datagram client and server (`DatagramClient`, `DatagramServer`)
//! - Handler traits and the reference echo behavior
//! - Core configuration and errors (`Config`, `ErrorKind`)
//!
//! Example
//! ```ignore
//! use std::{sync::Arc, thread};
//! use tether::{StreamClient, StreamServer};
//!
//! let server = Arc::new(StreamServer::echo());
//! let runner = Arc::clone(&server);
//! let handle = thread::spawn(move || runner.start(9000));
//!
//! let mut client = StreamClient::connect_to("localhost", 9000).unwrap();
//! client.send(b"hello").unwrap();
//! assert_eq!(client.receive().unwrap(), b"hello");
//!
//! client.disconnect();
//! server.stop();
//! handle.join().unwrap().unwrap();
//! ```

// Core config, errors, endpoint resolution, and seams
pub use tether_core::{
    Config, DatagramHandler, EchoHandler, Endpoint, ErrorKind, ReceiveBuffer, Result, Service,
    StreamHandler,
};
// Datagram: connectionless client and server
pub use tether_datagram::{DatagramClient, DatagramServer};
// Stream: connection-oriented client and server
pub use tether_stream::{StreamClient, StreamServer};

/// Convenience prelude with the most commonly used items.
pub mod prelude {
    pub use crate::{
        Config, DatagramClient, DatagramHandler, DatagramServer, EchoHandler, ErrorKind, Result,
        Service, StreamClient, StreamHandler, StreamServer,
    };
}
