use std::net::SocketAddr;

/// Per-connection behavior supplied to a stream server.
///
/// The server invokes the handler from its run loop: once per accepted
/// connection, once per received chunk, and once when the peer goes away.
/// Returning bytes from [`StreamHandler::on_data`] queues them for delivery
/// back to that peer.
pub trait StreamHandler: Send {
    /// Called when a new connection has been accepted.
    fn on_connect(&mut self, _peer: SocketAddr) {}

    /// Called with the bytes read from a peer; the returned bytes, if any,
    /// are written back to that peer.
    fn on_data(&mut self, peer: SocketAddr, data: &[u8]) -> Option<Vec<u8>>;

    /// Called when a peer has disconnected or its session failed.
    fn on_disconnect(&mut self, _peer: SocketAddr) {}
}

/// Per-datagram behavior supplied to a datagram server.
pub trait DatagramHandler: Send {
    /// Called with each received datagram and its sender address; the
    /// returned bytes, if any, are sent back to the sender.
    fn on_datagram(&mut self, sender: SocketAddr, payload: &[u8]) -> Option<Vec<u8>>;
}

/// Reference handler that writes back exactly what it reads.
#[derive(Debug, Default)]
pub struct EchoHandler;

impl StreamHandler for EchoHandler {
    fn on_data(&mut self, _peer: SocketAddr, data: &[u8]) -> Option<Vec<u8>> {
        Some(data.to_vec())
    }
}

impl DatagramHandler for EchoHandler {
    fn on_datagram(&mut self, _sender: SocketAddr, payload: &[u8]) -> Option<Vec<u8>> {
        Some(payload.to_vec())
    }
}
