#![warn(missing_docs)]

//! tether-stream: connection-oriented transport primitives.
//!
//! This crate provides the stream (TCP) half of the transport layer:
//! - [`StreamClient`]: one connected socket plus a receive buffer, with
//!   blocking read variants that retain partially consumed data across calls
//! - [`StreamServer`]: an accept-and-serve loop driven on the calling thread,
//!   stoppable and restartable from any other thread
//!
//! All operations are synchronous; concurrency is obtained by running the
//! server loop on a dedicated thread.

mod client;
mod server;
mod session;
mod sockopt;

pub use client::StreamClient;
pub use server::StreamServer;
