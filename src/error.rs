//! Error types for host construction and service registration.

use std::fmt;
use std::io;
use std::net::SocketAddr;

use crate::handler::{HandlerShape, ServiceKind};

pub type Result<T> = std::result::Result<T, HostError>;

/// Errors surfaced synchronously from host construction and service
/// registration.
///
/// Every variant here is a setup-time failure and aborts only the
/// registration that produced it; other registered services are unaffected.
/// Run-time failures inside a supervision loop (accept errors, handler I/O
/// errors) are logged and never surfaced through this type, since they
/// occur long after the registration call returned.
#[derive(Debug)]
pub enum HostError {
    /// The textual IP or port could not be resolved to a bind address
    AddressResolution {
        addr: String,
        kind: Option<ServiceKind>,
        detail: String,
    },
    /// The service name is already registered on this host
    DuplicateServiceName { name: String, existing_port: u16 },
    /// The port is already claimed by another service on this host
    DuplicatePort { port: u16, existing_name: String },
    /// The OS refused to open the listener or socket
    Bind { addr: SocketAddr, source: io::Error },
    /// The handler shape does not match the declared service kind
    InvalidHandlerSignature {
        kind: ServiceKind,
        shape: HandlerShape,
    },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostError::AddressResolution {
                addr,
                kind: Some(kind),
                detail,
            } => {
                write!(f, "cannot resolve {kind} address {addr:?}: {detail}")
            }
            HostError::AddressResolution {
                addr,
                kind: None,
                detail,
            } => {
                write!(f, "cannot resolve host address {addr:?}: {detail}")
            }
            HostError::DuplicateServiceName {
                name,
                existing_port,
            } => {
                write!(
                    f,
                    "service {name:?} is already registered at port {existing_port}"
                )
            }
            HostError::DuplicatePort {
                port,
                existing_name,
            } => {
                write!(f, "port {port} is already used by service {existing_name:?}")
            }
            HostError::Bind { addr, source } => {
                write!(f, "failed to bind {addr}: {source}")
            }
            HostError::InvalidHandlerSignature { kind, shape } => {
                write!(f, "{shape} handler cannot serve a {kind} service")
            }
        }
    }
}

impl std::error::Error for HostError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HostError::Bind { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_name_the_conflict() {
        let err = HostError::DuplicateServiceName {
            name: "echo".into(),
            existing_port: 9100,
        };
        assert_eq!(
            err.to_string(),
            "service \"echo\" is already registered at port 9100"
        );

        let err = HostError::DuplicatePort {
            port: 9100,
            existing_name: "echo".into(),
        };
        assert_eq!(err.to_string(), "port 9100 is already used by service \"echo\"");
    }

    #[test]
    fn bind_error_chains_the_io_source() {
        let err = HostError::Bind {
            addr: "127.0.0.1:80".parse().unwrap(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(std::error::Error::source(&err).is_some());
    }
}
