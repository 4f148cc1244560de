use std::{
    io::{self, Read, Write},
    net::{SocketAddr, TcpStream},
};

use tracing::error;

use tether_core::{ReceiveBuffer, StreamHandler};

/// A transient per-accepted-connection unit.
///
/// Owns its socket, a receive buffer, and a queue of bytes waiting to be
/// written back; destroyed when the peer disconnects or the server stops.
#[derive(Debug)]
pub(crate) struct PeerSession {
    stream: TcpStream,
    peer: SocketAddr,
    buffer: ReceiveBuffer,
    pending_out: Vec<u8>,
}

impl PeerSession {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer, buffer: ReceiveBuffer::new(), pending_out: Vec::new() }
    }

    /// Services this session for one loop iteration: pulls everything
    /// currently readable, hands it to the handler, and flushes any queued
    /// response bytes.
    ///
    /// Returns false when the session is finished (peer closed or failed);
    /// the failure never propagates beyond this session.
    pub(crate) fn service(&mut self, handler: &mut dyn StreamHandler, chunk: &mut [u8]) -> bool {
        loop {
            match self.stream.read(chunk) {
                Ok(0) => {
                    handler.on_disconnect(self.peer);
                    return false;
                }
                Ok(count) => self.buffer.append(&chunk[..count]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("session {} read failed: {}", self.peer, e);
                    handler.on_disconnect(self.peer);
                    return false;
                }
            }
        }

        if !self.buffer.is_empty() {
            let data = self.buffer.take_all();
            if let Some(reply) = handler.on_data(self.peer, &data) {
                self.pending_out.extend_from_slice(&reply);
            }
        }

        self.flush_pending(handler)
    }

    /// Writes queued response bytes until done or the socket stops accepting;
    /// leftovers are retried on the next iteration.
    fn flush_pending(&mut self, handler: &mut dyn StreamHandler) -> bool {
        while !self.pending_out.is_empty() {
            match self.stream.write(&self.pending_out) {
                Ok(0) => break,
                Ok(count) => {
                    self.pending_out.drain(..count);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    error!("session {} write failed: {}", self.peer, e);
                    handler.on_disconnect(self.peer);
                    return false;
                }
            }
        }
        true
    }
}
