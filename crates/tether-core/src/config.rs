use std::{default::Default, time::Duration};

use crate::constants::{DEFAULT_POLL_INTERVAL, DEFAULT_READ_CHUNK_SIZE, MAX_DATAGRAM_SIZE};

/// Configuration options to tune client and server behavior.
#[derive(Clone, Debug)]
pub struct Config {
    /// Sleep between server loop iterations; bounds how quickly a stop
    /// request is observed.
    pub poll_interval: Duration,
    /// Chunk size used when draining a stream socket into the receive buffer.
    pub read_chunk_size: usize,
    /// Size of the scratch buffer for incoming datagrams.
    pub receive_buffer_max_size: usize,
    /// Disable Nagle's algorithm on stream sockets (TCP_NODELAY).
    pub nodelay: bool,
    /// Socket receive buffer size in bytes (None = use system default).
    /// Corresponds to SO_RCVBUF socket option.
    pub socket_recv_buffer_size: Option<usize>,
    /// Socket send buffer size in bytes (None = use system default).
    /// Corresponds to SO_SNDBUF socket option.
    pub socket_send_buffer_size: Option<usize>,
    /// Time-to-live for outgoing packets (None = use system default).
    /// Corresponds to IP_TTL socket option.
    pub socket_ttl: Option<u32>,
    /// Enable broadcast mode on datagram sockets (default: false).
    /// Corresponds to SO_BROADCAST socket option.
    pub socket_broadcast: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            receive_buffer_max_size: MAX_DATAGRAM_SIZE,
            nodelay: false,
            socket_recv_buffer_size: None,
            socket_send_buffer_size: None,
            socket_ttl: None,
            socket_broadcast: false,
        }
    }
}
