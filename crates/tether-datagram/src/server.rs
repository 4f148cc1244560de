use std::{
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    thread,
};

use parking_lot::Mutex;
use tracing::{debug, error};

use tether_core::{Config, DatagramHandler, EchoHandler, Result, RunState, Service};

use crate::sockopt::apply_datagram_options;

/// A datagram server driven on the calling thread.
///
/// [`DatagramServer::start`] binds a socket and blocks, dispatching each
/// received datagram (with its sender address) to the supplied
/// [`DatagramHandler`], until [`DatagramServer::stop`] is called from another
/// thread. Starting while already running performs an implicit stop of the
/// previous run before binding anew; after any stop the server owns no
/// socket and the port is free to be rebound.
pub struct DatagramServer {
    handler: Mutex<Box<dyn DatagramHandler>>,
    config: Config,
    state: RunState,
}

impl std::fmt::Debug for DatagramServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatagramServer")
            .field("handler", &"<handler>")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl DatagramServer {
    /// Creates a server that dispatches datagrams to `handler`.
    pub fn with_handler(handler: Box<dyn DatagramHandler>) -> Self {
        Self::with_handler_and_config(handler, Config::default())
    }

    /// Creates a server with an explicit configuration.
    pub fn with_handler_and_config(handler: Box<dyn DatagramHandler>, config: Config) -> Self {
        Self { handler: Mutex::new(handler), config, state: RunState::new() }
    }

    /// Creates the reference echo server: every datagram is sent back to its
    /// sender unchanged.
    pub fn echo() -> Self {
        Self::with_handler(Box::new(EchoHandler))
    }

    /// Binds to `port` and runs the receive loop, blocking the calling
    /// thread until a stop is requested.
    pub fn start(&self, port: u16) -> Result<()> {
        // Flag the previous run down, then wait for it to release its socket.
        self.state.request_stop();
        let _gate = self.state.enter();

        let socket = self.bind_socket(port)?;
        let addr = socket.local_addr()?;
        self.state.mark_running(addr);
        debug!("receiving on {}", addr);

        let result = self.run_loop(&socket);

        self.state.mark_stopped();
        debug!("stopped receiving on {}", addr);
        result
    }

    /// Requests the running loop, if any, to shut down. Idempotent and safe
    /// to call from any thread; a blocked `start` returns within a bounded
    /// number of poll intervals.
    pub fn stop(&self) {
        self.state.request_stop();
    }

    /// Returns true while the server loop is active.
    pub fn is_running(&self) -> bool {
        self.state.is_running()
    }

    /// The bound address while running (useful when starting on port 0).
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.state.local_addr()
    }

    fn bind_socket(&self, port: u16) -> Result<UdpSocket> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        apply_datagram_options(&socket, &self.config)?;
        socket.set_nonblocking(true)?;
        Ok(socket)
    }

    fn run_loop(&self, socket: &UdpSocket) -> Result<()> {
        let mut scratch = vec![0u8; self.config.receive_buffer_max_size];

        while !self.state.stop_requested() {
            // Drain pending datagrams; a failing receive or reply never ends
            // the loop, only a stop request does.
            loop {
                match socket.recv_from(&mut scratch) {
                    Ok((count, sender)) => {
                        let reply = self.handler.lock().on_datagram(sender, &scratch[..count]);
                        if let Some(reply) = reply {
                            if let Err(e) = socket.send_to(&reply, sender) {
                                error!("failed to reply to {}: {}", sender, e);
                            }
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        error!("receive failed: {}", e);
                        break;
                    }
                }
            }

            thread::sleep(self.config.poll_interval);
        }

        // The socket drops with this frame, freeing the port.
        Ok(())
    }
}

impl Service for DatagramServer {
    fn start(&self, port: u16) -> Result<()> {
        DatagramServer::start(self, port)
    }

    fn stop(&self) {
        DatagramServer::stop(self)
    }

    fn is_running(&self) -> bool {
        DatagramServer::is_running(self)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        DatagramServer::local_addr(self)
    }
}
