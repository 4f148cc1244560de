#![warn(missing_docs)]

//! tether-core: foundational types and utilities.
//!
//! This crate provides the minimal set of core utilities shared across the
//! stream and datagram layers:
//! - Error handling
//! - Configuration types
//! - Endpoint resolution
//! - Receive buffering with head-consumption semantics
//! - Handler traits for server-side payload dispatch
//! - The server lifecycle trait
//!
//! Socket-facing logic lives in the specialized crates:
//! - `tether-stream`: connection-oriented client and server
//! - `tether-datagram`: datagram client and server

/// Transport constants shared across layers.
pub mod constants {
    use std::time::Duration;

    /// Largest payload a single datagram can carry; sizes the receive scratch.
    pub const MAX_DATAGRAM_SIZE: usize = 65536;
    /// Default chunk size for draining a stream socket into the receive buffer.
    pub const DEFAULT_READ_CHUNK_SIZE: usize = 8192;
    /// Default sleep between server loop iterations.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);
}

/// Configuration options for clients and servers.
pub mod config;
/// Endpoint values and name resolution.
pub mod endpoint;
/// Error types and results.
pub mod error;
/// Handler traits for server-side dispatch.
pub mod handler;
/// Receive buffering with strict head-to-tail consumption.
pub mod receive_buffer;
/// Server lifecycle trait.
pub mod service;

pub use config::Config;
pub use endpoint::Endpoint;
pub use error::{ErrorKind, Result};
pub use handler::{DatagramHandler, EchoHandler, StreamHandler};
pub use receive_buffer::ReceiveBuffer;
pub use service::{RunState, Service};
