use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
};

use tracing::debug;

use tether_core::{Config, Endpoint, ErrorKind, Result};

use crate::sockopt::apply_datagram_options;

/// A connectionless datagram client.
///
/// Owns one ephemeral-bound socket and an optional default destination for
/// sends. Sending is fire-and-forget; receiving is best-effort and
/// non-blocking. No delivery or ordering guarantee is added beyond what the
/// datagram transport itself offers.
///
/// After [`DatagramClient::close`] every operation fails fast with
/// [`ErrorKind::Closed`].
#[derive(Debug)]
pub struct DatagramClient {
    socket: Option<UdpSocket>,
    destination: Option<SocketAddr>,
    config: Config,
}

impl DatagramClient {
    /// Creates a client bound to an ephemeral port with no destination set.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Creates a client with the given configuration.
    pub fn with_config(config: Config) -> Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        apply_datagram_options(&socket, &config)?;
        Ok(Self { socket: Some(socket), destination: None, config })
    }

    /// Creates a client whose sends default to `host:port`.
    pub fn with_destination(host: &str, port: u16) -> Result<Self> {
        let mut client = Self::new()?;
        client.set_destination(host, port)?;
        Ok(client)
    }

    /// Resolves `host:port` and stores it as the destination for subsequent
    /// sends. May be changed at any time.
    pub fn set_destination(&mut self, host: &str, port: u16) -> Result<()> {
        if self.socket.is_none() {
            return Err(ErrorKind::Closed);
        }
        let endpoint = Endpoint::new(host, port);
        let addrs = endpoint.resolve()?;
        debug!("datagram destination set to {}", endpoint);
        self.destination = Some(addrs[0]);
        Ok(())
    }

    /// The currently configured destination, if any.
    pub fn destination(&self) -> Option<SocketAddr> {
        self.destination
    }

    /// Returns true until the socket has been closed.
    pub fn is_open(&self) -> bool {
        self.socket.is_some()
    }

    /// Sends one datagram to the current destination.
    ///
    /// Fails fast when no destination is set or the socket is closed.
    pub fn send(&self, data: &[u8]) -> Result<()> {
        let socket = self.socket.as_ref().ok_or(ErrorKind::Closed)?;
        let destination = self.destination.ok_or(ErrorKind::NoDestination)?;
        socket.send_to(data, destination)?;
        Ok(())
    }

    /// Best-effort receive: returns the next pending datagram with its
    /// sender address, or None when nothing is queued. Never blocks.
    ///
    /// Receiving is independent of the configured send destination.
    pub fn receive(&self) -> Result<Option<(Vec<u8>, SocketAddr)>> {
        let socket = self.socket.as_ref().ok_or(ErrorKind::Closed)?;

        socket.set_nonblocking(true)?;
        let mut payload = vec![0u8; self.config.receive_buffer_max_size];
        let received = socket.recv_from(&mut payload);
        let restored = socket.set_nonblocking(false);

        match received {
            Ok((count, sender)) => {
                restored?;
                payload.truncate(count);
                Ok(Some((payload, sender)))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                restored?;
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size of the next pending datagram, or 0 when nothing is queued.
    /// Works without a destination. Never blocks.
    pub fn available_byte_count(&self) -> Result<usize> {
        let socket = self.socket.as_ref().ok_or(ErrorKind::Closed)?;

        socket.set_nonblocking(true)?;
        let mut scratch = vec![0u8; self.config.receive_buffer_max_size];
        let peeked = socket.peek_from(&mut scratch);
        let restored = socket.set_nonblocking(false);

        match peeked {
            Ok((count, _)) => {
                restored?;
                Ok(count)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                restored?;
                Ok(0)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Releases the socket. Idempotent; subsequent operations fail fast.
    pub fn close(&mut self) {
        if self.socket.take().is_some() {
            debug!("datagram socket closed");
        }
    }
}
