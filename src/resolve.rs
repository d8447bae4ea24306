//! Address resolution: textual IP and port into a protocol bind address.

use std::net::{IpAddr, SocketAddr};

use crate::error::{HostError, Result};
use crate::handler::ServiceKind;

/// Parse the host IP. Done once, at host construction.
pub(crate) fn parse_ip(addr: &str) -> Result<IpAddr> {
    addr.parse().map_err(|_| HostError::AddressResolution {
        addr: addr.to_owned(),
        kind: None,
        detail: "not a valid IP address".to_owned(),
    })
}

/// Resolve the bind address for one service: for a stream kind the TCP
/// bind address, for a datagram kind the UDP one. Failures are reported
/// synchronously to the registration caller; there are no retries.
pub(crate) fn resolve(ip: IpAddr, port: &str, kind: ServiceKind) -> Result<SocketAddr> {
    let port: u16 = port.parse().map_err(|_| HostError::AddressResolution {
        addr: format!("{ip}:{port}"),
        kind: Some(kind),
        detail: format!("{port:?} is not a valid port"),
    })?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_v4_and_v6_hosts() {
        assert!(parse_ip("127.0.0.1").is_ok());
        assert!(parse_ip("::1").is_ok());
    }

    #[test]
    fn rejects_malformed_hosts() {
        for bad in ["", "localhost", "999.0.0.1", "127.0.0.1:9100"] {
            assert!(matches!(
                parse_ip(bad),
                Err(HostError::AddressResolution { kind: None, .. })
            ));
        }
    }

    #[test]
    fn resolves_port_strings() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        let addr = resolve(ip, "9100", ServiceKind::Stream).unwrap();
        assert_eq!(addr, "127.0.0.1:9100".parse().unwrap());
    }

    #[test]
    fn rejects_malformed_ports() {
        let ip: IpAddr = "127.0.0.1".parse().unwrap();
        for bad in ["", "abc", "70000", "-1", "91 00"] {
            assert!(matches!(
                resolve(ip, bad, ServiceKind::Datagram),
                Err(HostError::AddressResolution { kind: Some(ServiceKind::Datagram), .. })
            ));
        }
    }
}
