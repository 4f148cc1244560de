use std::{
    io,
    net::{Ipv4Addr, SocketAddr, TcpListener},
    thread,
};

use parking_lot::Mutex;
use socket2::{Domain, Protocol, Socket as Socket2, Type};
use tracing::{debug, error};

use tether_core::{Config, EchoHandler, Result, RunState, Service, StreamHandler};

use crate::session::PeerSession;
use crate::sockopt::apply_stream_options;

/// A stream server driven on the calling thread.
///
/// [`StreamServer::start`] binds a listener and blocks, repeatedly accepting
/// connections and servicing each live session with the supplied
/// [`StreamHandler`], until [`StreamServer::stop`] is called from another
/// thread. Starting while already running performs an implicit stop of the
/// previous run before binding anew; after any stop the server owns no
/// socket and the port is free to be rebound.
///
/// Session failures (peer reset, I/O error) remove that session only; the
/// loop itself ends solely on a stop request.
pub struct StreamServer {
    handler: Mutex<Box<dyn StreamHandler>>,
    config: Config,
    state: RunState,
}

impl std::fmt::Debug for StreamServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamServer")
            .field("handler", &"<handler>")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish()
    }
}

impl StreamServer {
    /// Creates a server that services connections with `handler`.
    pub fn with_handler(handler: Box<dyn StreamHandler>) -> Self {
        Self::with_handler_and_config(handler, Config::default())
    }

    /// Creates a server with an explicit configuration.
    pub fn with_handler_and_config(handler: Box<dyn StreamHandler>, config: Config) -> Self {
        Self { handler: Mutex::new(handler), config, state: RunState::new() }
    }

    /// Creates the reference echo server: every session gets back exactly
    /// the bytes it sent.
    pub fn echo() -> Self {
        Self::with_handler(Box::new(EchoHandler))
    }

    /// Binds to `port` and runs the accept-and-serve loop, blocking the
    /// calling thread until a stop is requested.
    pub fn start(&self, port: u16) -> Result<()> {
        // Flag the previous run down, then wait for it to release its socket.
        self.state.request_stop();
        let _gate = self.state.enter();

        let listener = bind_listener(port)?;
        let addr = listener.local_addr()?;
        self.state.mark_running(addr);
        debug!("listening on {}", addr);

        let result = self.run_loop(&listener);

        self.state.mark_stopped();
        debug!("stopped listening on {}", addr);
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

    fn run_loop(&self, listener: &TcpListener) -> Result<()> {
        let mut sessions: Vec<PeerSession> = Vec::new();
        let mut chunk = vec![0u8; self.config.read_chunk_size];

        while !self.state.stop_requested() {
            // Drain pending accepts.
            loop {
                match listener.accept() {
                    Ok((stream, peer)) => {
                        if let Err(e) = self.prepare_session_socket(&stream) {
                            error!("failed to prepare session for {}: {}", peer, e);
                            continue;
                        }
                        self.handler.lock().on_connect(peer);
                        sessions.push(PeerSession::new(stream, peer));
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                    Err(e) => {
                        error!("accept failed: {}", e);
                        break;
                    }
                }
            }

            // Service every live session; a failing session is dropped
            // without affecting the others.
            {
                let mut handler = self.handler.lock();
                sessions.retain_mut(|session| session.service(&mut **handler, &mut chunk));
            }

            thread::sleep(self.config.poll_interval);
        }

        // Sessions and the listener drop with this frame, freeing the port.
        Ok(())
    }

    fn prepare_session_socket(&self, stream: &std::net::TcpStream) -> io::Result<()> {
        stream.set_nonblocking(true)?;
        apply_stream_options(stream, &self.config)
    }
}

impl Service for StreamServer {
    fn start(&self, port: u16) -> Result<()> {
        StreamServer::start(self, port)
    }

    fn stop(&self) {
        StreamServer::stop(self)
    }

    fn is_running(&self) -> bool {
        StreamServer::is_running(self)
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        StreamServer::local_addr(self)
    }
}

/// Binds a non-blocking listener with address reuse, so a restarted server
/// can rebind its port while old sessions linger in TIME_WAIT.
fn bind_listener(port: u16) -> io::Result<TcpListener> {
    let socket = Socket2::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.bind(&SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)).into())?;
    socket.listen(128)?;

    let listener: TcpListener = socket.into();
    listener.set_nonblocking(true)?;
    Ok(listener)
}
