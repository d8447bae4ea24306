//! Listener factory: protocol-correct sockets for a resolved bind address.
//!
//! OS defaults only; listen backlog and socket options are not configured
//! here.

use std::net::{SocketAddr, TcpListener, UdpSocket};

use crate::error::{HostError, Result};

/// Open a passive listening socket for a stream service.
pub(crate) fn open_stream(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr).map_err(|source| HostError::Bind { addr, source })
}

/// Open a bound datagram socket, ready to send and receive.
pub(crate) fn open_datagram(addr: SocketAddr) -> Result<UdpSocket> {
    UdpSocket::bind(addr).map_err(|source| HostError::Bind { addr, source })
}
