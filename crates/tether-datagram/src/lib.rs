#![warn(missing_docs)]

//! tether-datagram: connectionless transport primitives.
//!
//! This crate provides the datagram (UDP) half of the transport layer:
//! - [`DatagramClient`]: fire-and-forget sends to a configurable destination,
//!   best-effort non-blocking receives
//! - [`DatagramServer`]: a bound receive loop driven on the calling thread,
//!   stoppable and restartable from any other thread
//!
//! Datagrams may be lost or arrive out of send order; that is surfaced to
//! the caller, never masked.

mod client;
mod server;
mod sockopt;

pub use client::DatagramClient;
pub use server::DatagramServer;
