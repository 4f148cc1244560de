use std::{io, net::TcpStream};

use socket2::Socket as Socket2;
use tether_core::Config;

/// Applies socket options from configuration to a stream socket.
pub(crate) fn apply_stream_options(stream: &TcpStream, config: &Config) -> io::Result<()> {
    // Create socket2::Socket from TcpStream for advanced options
    let socket2 = Socket2::from(stream.try_clone()?);

    if let Some(size) = config.socket_recv_buffer_size {
        socket2.set_recv_buffer_size(size)?;
    }

    if let Some(size) = config.socket_send_buffer_size {
        socket2.set_send_buffer_size(size)?;
    }

    if let Some(ttl) = config.socket_ttl {
        stream.set_ttl(ttl)?;
    }

    if config.nodelay {
        stream.set_nodelay(true)?;
    }

    Ok(())
}
