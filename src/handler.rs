//! Handler shapes and the registration-time binder.
//!
//! A service handler is supplied in exactly one of four shapes, a closed
//! set chosen explicitly through the [`ServiceHandler`] constructors. Two
//! shapes per kind: a generic capability (any bidirectional stream, any
//! packet source) and a protocol-specific one (the raw `TcpStream` /
//! `UdpSocket`). The binder checks shape against kind once, at
//! registration time — never in the hot path.

use std::fmt;
use std::io;
use std::net::{SocketAddr, TcpStream, UdpSocket};
use std::sync::Arc;

use crate::error::{HostError, Result};

/// Transport kind of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Connection-oriented: a listener accepts ordered, bidirectional
    /// connections (TCP)
    Stream,
    /// Packet-oriented: a bound socket exchanges independent datagrams
    /// with arbitrary peers (UDP)
    Datagram,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Stream => write!(f, "stream"),
            ServiceKind::Datagram => write!(f, "datagram"),
        }
    }
}

/// What one handler invocation returns.
///
/// Failures are logged by the supervision loop and isolated to the
/// connection or datagram they occurred on; they never take down the
/// service or the process.
pub type HandlerResult = io::Result<()>;

/// Generic bidirectional-stream capability handed to stream handlers.
pub trait Conn: io::Read + io::Write + Send {
    fn peer_addr(&self) -> io::Result<SocketAddr>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl Conn for TcpStream {
    fn peer_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::peer_addr(self)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        TcpStream::local_addr(self)
    }
}

/// Generic packet-source capability handed to datagram handlers; the peer
/// address travels with every datagram.
pub trait PacketSource: Send + Sync {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)>;
    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

impl PacketSource for UdpSocket {
    fn recv_from(&self, buf: &mut [u8]) -> io::Result<(usize, SocketAddr)> {
        UdpSocket::recv_from(self, buf)
    }

    fn send_to(&self, buf: &[u8], addr: SocketAddr) -> io::Result<usize> {
        UdpSocket::send_to(self, buf, addr)
    }

    fn local_addr(&self) -> io::Result<SocketAddr> {
        UdpSocket::local_addr(self)
    }
}

type ConnFn = Box<dyn Fn(Box<dyn Conn>) -> HandlerResult + Send + Sync>;
type TcpFn = Box<dyn Fn(TcpStream) -> HandlerResult + Send + Sync>;
type PacketFn = Box<dyn Fn(&dyn PacketSource) -> HandlerResult + Send + Sync>;
type UdpFn = Box<dyn Fn(&UdpSocket) -> HandlerResult + Send + Sync>;

/// A caller-supplied handler in one of the four accepted shapes.
///
/// Stream handlers are invoked once per accepted connection, each on its
/// own thread, and own the connection for its lifetime. Datagram handlers
/// are invoked repeatedly with the service's socket and are expected to
/// perform one receive (and, typically, one reply) per invocation.
pub enum ServiceHandler {
    Conn(ConnFn),
    Tcp(TcpFn),
    Packet(PacketFn),
    Udp(UdpFn),
}

impl ServiceHandler {
    /// Stream handler over the generic connection capability.
    pub fn conn<F>(f: F) -> Self
    where
        F: Fn(Box<dyn Conn>) -> HandlerResult + Send + Sync + 'static,
    {
        ServiceHandler::Conn(Box::new(f))
    }

    /// Stream handler over the raw TCP connection.
    pub fn tcp<F>(f: F) -> Self
    where
        F: Fn(TcpStream) -> HandlerResult + Send + Sync + 'static,
    {
        ServiceHandler::Tcp(Box::new(f))
    }

    /// Datagram handler over the generic packet-source capability.
    pub fn packet<F>(f: F) -> Self
    where
        F: Fn(&dyn PacketSource) -> HandlerResult + Send + Sync + 'static,
    {
        ServiceHandler::Packet(Box::new(f))
    }

    /// Datagram handler over the raw UDP socket.
    pub fn udp<F>(f: F) -> Self
    where
        F: Fn(&UdpSocket) -> HandlerResult + Send + Sync + 'static,
    {
        ServiceHandler::Udp(Box::new(f))
    }

    pub fn shape(&self) -> HandlerShape {
        match self {
            ServiceHandler::Conn(_) => HandlerShape::Conn,
            ServiceHandler::Tcp(_) => HandlerShape::Tcp,
            ServiceHandler::Packet(_) => HandlerShape::Packet,
            ServiceHandler::Udp(_) => HandlerShape::Udp,
        }
    }
}

/// Declared shape of a supplied handler, reported in signature errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    Conn,
    Tcp,
    Packet,
    Udp,
}

impl fmt::Display for HandlerShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerShape::Conn => write!(f, "generic-stream"),
            HandlerShape::Tcp => write!(f, "tcp-stream"),
            HandlerShape::Packet => write!(f, "generic-packet"),
            HandlerShape::Udp => write!(f, "udp-socket"),
        }
    }
}

/// Handler bound to a stream service; shared by every connection thread.
pub(crate) enum StreamHandler {
    Conn(ConnFn),
    Tcp(TcpFn),
}

impl StreamHandler {
    pub(crate) fn invoke(&self, stream: TcpStream) -> HandlerResult {
        match self {
            StreamHandler::Conn(f) => f(Box::new(stream)),
            StreamHandler::Tcp(f) => f(stream),
        }
    }
}

/// Handler bound to a datagram service; owned by the supervision loop.
pub(crate) enum DatagramHandler {
    Packet(PacketFn),
    Udp(UdpFn),
}

impl DatagramHandler {
    pub(crate) fn invoke(&self, socket: &UdpSocket) -> HandlerResult {
        match self {
            DatagramHandler::Packet(f) => f(socket),
            DatagramHandler::Udp(f) => f(socket),
        }
    }
}

pub(crate) enum BoundHandler {
    Stream(Arc<StreamHandler>),
    Datagram(DatagramHandler),
}

/// Validate the supplied handler against the declared kind.
///
/// A datagram-shaped handler for a stream service (and vice versa) is
/// rejected here, before any socket is opened.
pub(crate) fn bind(kind: ServiceKind, handler: ServiceHandler) -> Result<BoundHandler> {
    match (kind, handler) {
        (ServiceKind::Stream, ServiceHandler::Conn(f)) => {
            Ok(BoundHandler::Stream(Arc::new(StreamHandler::Conn(f))))
        }
        (ServiceKind::Stream, ServiceHandler::Tcp(f)) => {
            Ok(BoundHandler::Stream(Arc::new(StreamHandler::Tcp(f))))
        }
        (ServiceKind::Datagram, ServiceHandler::Packet(f)) => {
            Ok(BoundHandler::Datagram(DatagramHandler::Packet(f)))
        }
        (ServiceKind::Datagram, ServiceHandler::Udp(f)) => {
            Ok(BoundHandler::Datagram(DatagramHandler::Udp(f)))
        }
        (kind, handler) => Err(HostError::InvalidHandlerSignature {
            kind,
            shape: handler.shape(),
        }),
    }
}
