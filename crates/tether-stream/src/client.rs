use std::{
    io::{self, Read, Write},
    net::{Shutdown, TcpStream},
};

use tracing::debug;

use tether_core::{Config, Endpoint, ErrorKind, ReceiveBuffer, Result};

use crate::sockopt::apply_stream_options;

/// Scratch size for the non-blocking peek behind `available_byte_count`.
const PEEK_SCRATCH_SIZE: usize = 65536;

/// Condition a blocking read waits for, and the matching slicing rule.
///
/// Every read variant shares one pump loop that appends arriving bytes to the
/// receive buffer until the strategy's condition holds; the strategy then
/// decides how much of the buffer is returned versus retained.
#[derive(Debug)]
enum ReadStrategy<'a> {
    /// Wait for at least `n` buffered bytes, then take everything (greedy).
    AtLeast(usize),
    /// Wait for at least `n` buffered bytes, then take exactly `n`.
    Exactly(usize),
    /// Wait until the delimiter occurs, then take the prefix including it.
    Until(&'a [u8]),
}

impl ReadStrategy<'_> {
    fn is_satisfied(&self, buffer: &ReceiveBuffer) -> bool {
        match self {
            ReadStrategy::AtLeast(count) | ReadStrategy::Exactly(count) => buffer.len() >= *count,
            ReadStrategy::Until(delimiter) => buffer.find(delimiter).is_some(),
        }
    }

    /// Slices the satisfied portion off the buffer head.
    ///
    /// Only called once `is_satisfied` holds.
    fn split(&self, buffer: &mut ReceiveBuffer) -> Vec<u8> {
        match self {
            ReadStrategy::AtLeast(_) => buffer.take_all(),
            ReadStrategy::Exactly(count) => buffer.take_front(*count),
            ReadStrategy::Until(delimiter) => {
                let position = buffer
                    .find(delimiter)
                    .expect("split is only reached once the delimiter is buffered");
                buffer.take_front(position + delimiter.len())
            }
        }
    }
}

/// A connection-oriented byte-stream client.
///
/// Owns at most one connected socket and a receive buffer. Read variants
/// block until their condition is met, appending arriving bytes to the
/// buffer; bytes left unconsumed by one call are returned by the next, so
/// concatenating the results of successive reads reproduces the wire
/// sequence exactly.
///
/// Operations requiring an established connection fail fast with
/// [`ErrorKind::NotConnected`] while disconnected and perform no socket I/O.
#[derive(Debug)]
pub struct StreamClient {
    stream: Option<TcpStream>,
    buffer: ReceiveBuffer,
    config: Config,
}

impl Default for StreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamClient {
    /// Creates a disconnected client with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a disconnected client with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self { stream: None, buffer: ReceiveBuffer::new(), config }
    }

    /// Creates a client and immediately connects it to `host:port`.
    pub fn connect_to(host: &str, port: u16) -> Result<Self> {
        let mut client = Self::new();
        client.connect(host, port)?;
        Ok(client)
    }

    /// Resolves the endpoint and establishes a connection.
    ///
    /// Candidate addresses are attempted in resolver order; the first success
    /// wins. Any previous connection is dropped first. On success the receive
    /// buffer is empty and the configured socket options are applied.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<()> {
        self.disconnect();

        let endpoint = Endpoint::new(host, port);
        debug!("connecting to {}", endpoint);

        let mut last_error =
            io::Error::new(io::ErrorKind::AddrNotAvailable, "no candidate addresses");
        for addr in endpoint.resolve()? {
            match TcpStream::connect(addr) {
                Ok(stream) => {
                    apply_stream_options(&stream, &self.config)?;
                    self.stream = Some(stream);
                    debug!("connected to {}", endpoint);
                    return Ok(());
                }
                Err(e) => last_error = e,
            }
        }

        Err(ErrorKind::Connection { host: endpoint.host, port, source: last_error })
    }

    /// Returns true while a connection is established. Never blocks.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Shuts down and releases the connection, clearing the receive buffer.
    /// No-op when already disconnected.
    pub fn disconnect(&mut self) {
        if self.stream.is_none() {
            return;
        }
        debug!("disconnecting");
        self.drop_connection();
    }

    /// Writes all of `data` to the peer.
    ///
    /// Partial writes are retried internally until the whole payload has been
    /// handed to the transport. On failure the client transitions to
    /// disconnected.
    pub fn send(&mut self, data: &[u8]) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(ErrorKind::NotConnected)?;
        debug!("sending {} bytes", data.len());

        if let Err(e) = stream.write_all(data) {
            self.drop_connection();
            return Err(e.into());
        }
        Ok(())
    }

    /// Number of bytes currently queued at the socket layer, not counting
    /// bytes already pulled into the receive buffer. Never blocks.
    pub fn available_byte_count(&mut self) -> Result<usize> {
        let stream = self.stream.as_mut().ok_or(ErrorKind::NotConnected)?;

        // A non-blocking peek reports what is queued without consuming it.
        stream.set_nonblocking(true)?;
        let mut scratch = vec![0u8; PEEK_SCRATCH_SIZE];
        let peeked = stream.peek(&mut scratch);
        let restored = stream.set_nonblocking(false);

        match peeked {
            Ok(count) => {
                restored?;
                Ok(count)
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                restored?;
                Ok(0)
            }
            Err(e) => {
                self.drop_connection();
                Err(e.into())
            }
        }
    }

    /// Blocks until at least one byte is buffered, then returns everything
    /// available. Equivalent to `receive_at_least(1, false)`.
    pub fn receive(&mut self) -> Result<Vec<u8>> {
        self.receive_at_least(1, false)
    }

    /// Blocks until the buffer holds at least `min_count` bytes, then returns
    /// the entire buffer contents (greedy), leaving it empty.
    ///
    /// If the buffer already satisfies the condition the socket is not
    /// touched. `flush` discards previously buffered bytes first.
    pub fn receive_at_least(&mut self, min_count: usize, flush: bool) -> Result<Vec<u8>> {
        self.receive_with(ReadStrategy::AtLeast(min_count), flush)
    }

    /// Blocks until `count` bytes are buffered, then returns exactly `count`
    /// bytes; any surplus already read stays buffered for the next call.
    pub fn receive_exactly(&mut self, count: usize, flush: bool) -> Result<Vec<u8>> {
        self.receive_with(ReadStrategy::Exactly(count), flush)
    }

    /// Blocks until the buffer contains `delimiter`, then returns the prefix
    /// up to and including its first occurrence; everything after it stays
    /// buffered.
    pub fn receive_until(&mut self, delimiter: &[u8], flush: bool) -> Result<Vec<u8>> {
        self.receive_with(ReadStrategy::Until(delimiter), flush)
    }

    /// Shared pump loop: ensure the strategy's condition holds on the buffer,
    /// reading from the socket otherwise, then slice per the strategy.
    ///
    /// A read of zero bytes (orderly peer close) or an I/O error fails the
    /// call and leaves the client disconnected.
    fn receive_with(&mut self, strategy: ReadStrategy<'_>, flush: bool) -> Result<Vec<u8>> {
        if self.stream.is_none() {
            return Err(ErrorKind::NotConnected);
        }
        if flush {
            self.buffer.clear();
        }

        let mut chunk = vec![0u8; self.config.read_chunk_size];
        loop {
            if strategy.is_satisfied(&self.buffer) {
                return Ok(strategy.split(&mut self.buffer));
            }

            let stream = match self.stream.as_mut() {
                Some(stream) => stream,
                None => return Err(ErrorKind::NotConnected),
            };
            match stream.read(&mut chunk) {
                Ok(0) => {
                    self.drop_connection();
                    return Err(ErrorKind::PeerClosed);
                }
                Ok(count) => self.buffer.append(&chunk[..count]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.drop_connection();
                    return Err(e.into());
                }
            }
        }
    }

    fn drop_connection(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.buffer.clear();
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_with(data: &[u8]) -> ReceiveBuffer {
        let mut buffer = ReceiveBuffer::new();
        buffer.append(data);
        buffer
    }

    #[test]
    fn test_at_least_is_greedy() {
        let strategy = ReadStrategy::AtLeast(2);
        let mut buffer = buffer_with(b"abcdef");

        assert!(strategy.is_satisfied(&buffer));
        assert_eq!(strategy.split(&mut buffer), b"abcdef");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_at_least_unsatisfied_below_minimum() {
        let strategy = ReadStrategy::AtLeast(4);
        assert!(!strategy.is_satisfied(&buffer_with(b"abc")));
    }

    #[test]
    fn test_exactly_retains_surplus() {
        let strategy = ReadStrategy::Exactly(2);
        let mut buffer = buffer_with(b"abcdef");

        assert!(strategy.is_satisfied(&buffer));
        assert_eq!(strategy.split(&mut buffer), b"ab");
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_until_includes_delimiter() {
        let strategy = ReadStrategy::Until(b"\r\n");
        let mut buffer = buffer_with(b"line\r\nrest");

        assert!(strategy.is_satisfied(&buffer));
        assert_eq!(strategy.split(&mut buffer), b"line\r\n");
        assert_eq!(buffer.take_all(), b"rest");
    }

    #[test]
    fn test_until_unsatisfied_without_delimiter() {
        let strategy = ReadStrategy::Until(b"\n");
        assert!(!strategy.is_satisfied(&buffer_with(b"no newline")));
    }

    #[test]
    fn test_disconnected_operations_fail_fast() {
        let mut client = StreamClient::new();

        assert!(!client.is_connected());
        client.disconnect(); // no-op

        assert!(matches!(client.send(b"test"), Err(ErrorKind::NotConnected)));
        assert!(matches!(client.available_byte_count(), Err(ErrorKind::NotConnected)));
        assert!(matches!(client.receive(), Err(ErrorKind::NotConnected)));
        assert!(matches!(client.receive_at_least(1, false), Err(ErrorKind::NotConnected)));
        assert!(matches!(client.receive_exactly(1, false), Err(ErrorKind::NotConnected)));
        assert!(matches!(client.receive_until(b"\0", false), Err(ErrorKind::NotConnected)));
    }

    #[test]
    fn test_connect_to_unresolvable_host() {
        let mut client = StreamClient::new();
        let result = client.connect("this-hostname-should-not-exist-12345.invalid", 1);
        assert!(matches!(result, Err(ErrorKind::Resolution { .. })));
        assert!(!client.is_connected());
    }
}
