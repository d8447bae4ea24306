//! # Quay
//! A small host-level service registry: bind one IP address and run many
//! independently-named network services on it, without an async runtime.
//! Each service is a stream (TCP) or datagram (UDP) listener on its own
//! port, dispatching arriving traffic to a caller-supplied handler.
//!
//! ## Core Guarantees
//! - **Fail-fast registration**: name and port uniqueness, address
//!   resolution and handler-shape validation are all checked before any
//!   socket is opened; a failed registration leaves no residue.
//! - **Independent supervision**: every service gets its own loop that
//!   keeps accepting or receiving until the process exits. A failure on
//!   one connection or datagram never takes down the service.
//! - **Predictable concurrency**: stream connections are handled on one
//!   thread each, unordered and unbounded; datagrams are handled strictly
//!   one at a time per service.
//!
//! ## Architecture Overview
//! ```text
//! ┌──────────┐ new_service  ┌─────────────────┐
//! │   Host   │─────────────▶│ ServiceRegistry │  name/port claims
//! └────┬─────┘              └─────────────────┘
//!      │ spawns one loop per service
//!      ▼
//! ┌───────────────────┐  accept   ┌───────────────────┐
//! │ stream loop       │──────────▶│ connection thread │──▶ handler(conn)
//! │ (blocking accept) │           │ (one per accept)  │
//! └───────────────────┘           └───────────────────┘
//! ┌───────────────────┐
//! │ datagram loop     │──▶ handler(&socket), one datagram at a time
//! └───────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use quay::{Host, ServiceHandler, ServiceKind};
//! use std::io::{Read, Write};
//!
//! fn main() -> quay::Result<()> {
//!     let host = Host::new("127.0.0.1")?;
//!
//!     host.new_service(
//!         ServiceKind::Stream,
//!         "echo",
//!         "9101",
//!         ServiceHandler::conn(|mut conn| {
//!             let mut buf = [0u8; 512];
//!             let n = conn.read(&mut buf)?;
//!             conn.write_all(&buf[..n])?;
//!             Ok(())
//!         }),
//!     )?;
//!
//!     // Block until a shutdown handle fires.
//!     host.wait();
//!     Ok(())
//! }
//! ```
//!
//! - [`Host`]: one network identity and the services registered on it
//! - [`ServiceHandler`]: the four accepted handler shapes
//! - [`Logger`]: injected logging with a no-op default
//! - [`error`]: setup-time error taxonomy

pub mod error;
pub mod handler;
pub mod log;

mod listener;
mod registry;
mod resolve;
mod signal;
mod supervisor;

pub use error::{HostError, Result};
pub use handler::{
    Conn, HandlerResult, HandlerShape, PacketSource, ServiceHandler, ServiceKind,
};
pub use log::{LogLevel, Logger, NoOpLogger, StderrLogger};
pub use signal::ShutdownHandle;

/// A convenient prelude module that re-exports the commonly used types.
///
/// ```rust
/// use quay::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{HostError, Result};
    pub use crate::handler::{ServiceHandler, ServiceKind};
    pub use crate::log::{LogLevel, Logger, NoOpLogger};
    pub use crate::{Host, ShutdownHandle};
}

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::handler::BoundHandler;
use crate::registry::{ServiceRegistry, ServiceState};
use crate::signal::ShutdownSignal;

/// One network identity and the services registered on it.
///
/// A `Host` is constructed with a single IP address and lives for the
/// process lifetime. Services are added with [`new_service`]; each gets a
/// distinct name and a distinct port, and its own supervision loop running
/// in the background. The host itself never blocks: registration returns
/// as soon as the loop is launched.
///
/// Registration is safe to call from multiple threads; the uniqueness
/// check-and-insert is atomic per host.
///
/// [`new_service`]: Host::new_service
pub struct Host {
    address: IpAddr,
    registry: ServiceRegistry,
    logger: Arc<dyn Logger>,
    shutdown: ShutdownSignal,
}

impl Host {
    /// Creates a new host with the given IP address and a no-op logger.
    ///
    /// Fails with [`HostError::AddressResolution`] if `addr` does not
    /// parse as an IP address.
    pub fn new(addr: &str) -> Result<Self> {
        Self::with_logger(addr, Arc::new(NoOpLogger))
    }

    /// Creates a new host that reports registry and supervision-loop
    /// events to the given logger.
    pub fn with_logger(addr: &str, logger: Arc<dyn Logger>) -> Result<Self> {
        let address = resolve::parse_ip(addr)?;
        Ok(Self {
            address,
            registry: ServiceRegistry::default(),
            logger,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// The IP address this host binds its services to.
    pub fn address(&self) -> IpAddr {
        self.address
    }

    /// Registers a new service and launches its supervision loop.
    ///
    /// `kind` selects the transport. The service will listen on `port`
    /// (a decimal string; `"0"` asks the OS for an ephemeral port, see
    /// [`service_addr`](Host::service_addr)). The handler must be one of
    /// the two accepted shapes for `kind`:
    ///
    /// - stream: [`ServiceHandler::conn`] or [`ServiceHandler::tcp`],
    ///   invoked once per accepted connection, each on its own thread;
    /// - datagram: [`ServiceHandler::packet`] or [`ServiceHandler::udp`],
    ///   invoked repeatedly with the bound socket, strictly one
    ///   invocation at a time.
    ///
    /// Returns as soon as the loop is launched. All failures — address
    /// resolution, handler-shape mismatch, duplicate name or port, bind —
    /// are reported synchronously and abort only this registration.
    pub fn new_service(
        &self,
        kind: ServiceKind,
        name: &str,
        port: &str,
        handler: ServiceHandler,
    ) -> Result<()> {
        let addr = resolve::resolve(self.address, port, kind)?;
        let bound = handler::bind(kind, handler)?;
        self.registry.claim(name, addr.port())?;

        match bound {
            BoundHandler::Stream(stream_handler) => {
                let listener = listener::open_stream(addr).map_err(|e| {
                    self.registry.release(name);
                    e
                })?;
                let local_addr = listener.local_addr().map_err(|source| {
                    self.registry.release(name);
                    HostError::Bind { addr, source }
                })?;

                let state = ServiceState::new(kind, local_addr);
                self.registry.activate(name, state.clone());
                self.logger.log(
                    LogLevel::Info,
                    &format!("service {name:?} listening on {local_addr} (stream)"),
                );
                supervisor::spawn_stream_loop(
                    name.to_owned(),
                    listener,
                    stream_handler,
                    state,
                    self.logger.clone(),
                );
            }
            BoundHandler::Datagram(datagram_handler) => {
                let socket = listener::open_datagram(addr).map_err(|e| {
                    self.registry.release(name);
                    e
                })?;
                let local_addr = socket.local_addr().map_err(|source| {
                    self.registry.release(name);
                    HostError::Bind { addr, source }
                })?;

                let state = ServiceState::new(kind, local_addr);
                self.registry.activate(name, state.clone());
                self.logger.log(
                    LogLevel::Info,
                    &format!("service {name:?} listening on {local_addr} (datagram)"),
                );
                supervisor::spawn_datagram_loop(
                    name.to_owned(),
                    socket,
                    datagram_handler,
                    self.logger.clone(),
                );
            }
        }

        Ok(())
    }

    /// Bound address of a registered service.
    ///
    /// For services registered with port `"0"` this carries the port the
    /// OS actually assigned.
    pub fn service_addr(&self, name: &str) -> Option<SocketAddr> {
        self.registry.state(name).map(|s| s.local_addr)
    }

    /// Transport kind of a registered service.
    pub fn service_kind(&self, name: &str) -> Option<ServiceKind> {
        self.registry.state(name).map(|s| s.kind)
    }

    /// Port claimed by a registered service name.
    pub fn service_port(&self, name: &str) -> Option<u16> {
        self.registry.lookup_port(name)
    }

    /// Live accepted connections of a stream service (always 0 for a
    /// datagram service).
    pub fn connection_count(&self, name: &str) -> Option<usize> {
        self.registry.state(name).map(|s| s.connection_count())
    }

    /// A cloneable handle that releases every thread blocked in
    /// [`wait`](Host::wait).
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.handle()
    }

    /// Blocks the calling thread until a [`ShutdownHandle`] fires.
    ///
    /// This is the keep-alive for a process whose only job is serving:
    /// register the services, then `wait()`.
    pub fn wait(&self) {
        self.shutdown.wait()
    }
}
