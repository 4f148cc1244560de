use std::{io, net::UdpSocket};

use socket2::Socket as Socket2;
use tether_core::Config;

/// Applies socket options from configuration to a datagram socket.
pub(crate) fn apply_datagram_options(socket: &UdpSocket, config: &Config) -> io::Result<()> {
    // Create socket2::Socket from UdpSocket for advanced options
    let socket2 = Socket2::from(socket.try_clone()?);

    if let Some(size) = config.socket_recv_buffer_size {
        socket2.set_recv_buffer_size(size)?;
    }

    if let Some(size) = config.socket_send_buffer_size {
        socket2.set_send_buffer_size(size)?;
    }

    if let Some(ttl) = config.socket_ttl {
        socket.set_ttl(ttl)?;
    }

    if config.socket_broadcast {
        socket.set_broadcast(true)?;
    }

    Ok(())
}
