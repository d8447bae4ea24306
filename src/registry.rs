//! Name/port bookkeeping for one host.
//!
//! The registry owns two mirrored maps — port to service name, and service
//! name to port — and keeps them consistent: no entry ever exists in one
//! without the other. Claiming is an atomic check-then-insert under a
//! single mutex, so two concurrent registrations cannot both pass the
//! uniqueness check for the same name or port. Registration is setup-time
//! only, which makes coarse locking acceptable.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Mutex};

use lockfree::map::Map as LockfreeMap;

use crate::error::{HostError, Result};
use crate::handler::ServiceKind;

/// Live state of one registered service.
///
/// Held in the registry under the same mutex as the name/port maps. The
/// connection map itself is lockfree so the stream loop and its
/// connection threads never contend with registrations.
pub(crate) struct ServiceState {
    pub(crate) kind: ServiceKind,
    pub(crate) local_addr: SocketAddr,
    pub(crate) connections: LockfreeMap<u64, SocketAddr>,
    pub(crate) next_conn_id: AtomicU64,
}

impl ServiceState {
    pub(crate) fn new(kind: ServiceKind, local_addr: SocketAddr) -> Arc<Self> {
        Arc::new(Self {
            kind,
            local_addr,
            connections: LockfreeMap::new(),
            next_conn_id: AtomicU64::new(1),
        })
    }

    pub(crate) fn connection_count(&self) -> usize {
        self.connections.iter().count()
    }
}

#[derive(Default)]
struct RegistryInner {
    services_by_port: HashMap<u16, String>,
    ports_by_name: HashMap<String, u16>,
    states: HashMap<String, Arc<ServiceState>>,
}

#[derive(Default)]
pub(crate) struct ServiceRegistry {
    inner: Mutex<RegistryInner>,
}

impl ServiceRegistry {
    /// Claim a (name, port) pair. The name is checked first, then the
    /// port; on success both maps are updated before the lock is dropped.
    pub(crate) fn claim(&self, name: &str, port: u16) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(&existing_port) = inner.ports_by_name.get(name) {
            return Err(HostError::DuplicateServiceName {
                name: name.to_owned(),
                existing_port,
            });
        }
        if let Some(existing_name) = inner.services_by_port.get(&port) {
            return Err(HostError::DuplicatePort {
                port,
                existing_name: existing_name.clone(),
            });
        }
        inner.services_by_port.insert(port, name.to_owned());
        inner.ports_by_name.insert(name.to_owned(), port);
        Ok(())
    }

    /// Undo a claim when a later setup step fails, so a failed
    /// registration leaves no residue.
    pub(crate) fn release(&self, name: &str) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(port) = inner.ports_by_name.remove(name) {
            inner.services_by_port.remove(&port);
        }
        inner.states.remove(name);
    }

    /// Record the bound state once the listener is open.
    pub(crate) fn activate(&self, name: &str, state: Arc<ServiceState>) {
        let mut inner = self.inner.lock().unwrap();
        inner.states.insert(name.to_owned(), state);
    }

    pub(crate) fn state(&self, name: &str) -> Option<Arc<ServiceState>> {
        self.inner.lock().unwrap().states.get(name).cloned()
    }

    pub(crate) fn lookup_port(&self, name: &str) -> Option<u16> {
        self.inner.lock().unwrap().ports_by_name.get(name).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_succeeds_for_distinct_pairs() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        registry.claim("beta", 9101).unwrap();
        assert_eq!(registry.lookup_port("alpha"), Some(9100));
        assert_eq!(registry.lookup_port("beta"), Some(9101));
    }

    #[test]
    fn duplicate_name_is_rejected_with_existing_port() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        match registry.claim("alpha", 9101) {
            Err(HostError::DuplicateServiceName {
                name,
                existing_port,
            }) => {
                assert_eq!(name, "alpha");
                assert_eq!(existing_port, 9100);
            }
            other => panic!("expected duplicate name, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_port_is_rejected_with_existing_name() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        match registry.claim("beta", 9100) {
            Err(HostError::DuplicatePort {
                port,
                existing_name,
            }) => {
                assert_eq!(port, 9100);
                assert_eq!(existing_name, "alpha");
            }
            other => panic!("expected duplicate port, got {other:?}"),
        }
    }

    #[test]
    fn name_is_checked_before_port() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        // Both conflict; the name violation wins.
        assert!(matches!(
            registry.claim("alpha", 9100),
            Err(HostError::DuplicateServiceName { .. })
        ));
    }

    #[test]
    fn release_restores_both_maps() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        registry.release("alpha");
        assert_eq!(registry.lookup_port("alpha"), None);
        // Both the name and the port are reusable again.
        registry.claim("beta", 9100).unwrap();
        registry.claim("alpha", 9101).unwrap();
    }

    #[test]
    fn activate_exposes_state_until_release() {
        let registry = ServiceRegistry::default();
        registry.claim("alpha", 9100).unwrap();
        let state = ServiceState::new(ServiceKind::Stream, "127.0.0.1:9100".parse().unwrap());
        registry.activate("alpha", state);
        assert!(registry.state("alpha").is_some());
        registry.release("alpha");
        assert!(registry.state("alpha").is_none());
    }
}
