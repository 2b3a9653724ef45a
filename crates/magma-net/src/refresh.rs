//! Topology refresh: a paged TRANSMIT_TOPOLOGY exchange coalesced by a
//! try-lock, atomically swapped into the installed ring only if every
//! page decodes cleanly and no node advertises port 0.
//!
//! A `port == 0` entry anywhere in the transmitted topology is fatal
//! to the whole refresh: the previously-installed ring is left in
//! place rather than swapped to a half-built one, mirroring the
//! original client's abort-on-bad-node behavior.

use magma_ring::{InstalledRing, NodeDescriptor, Ring, RingBuildError};
use magma_wire::{NodeRecord, TopologyPage};
use parking_lot::Mutex;
use std::net::Ipv4Addr;
use tracing::{debug, warn};

use crate::error::ProtocolError;

/// What a refresh attempt did.
#[derive(Debug, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Another refresh was already in progress; this call coalesced
    /// into it and did no work of its own.
    Coalesced,
    /// The ring was rebuilt and installed.
    Installed { participants: usize },
}

/// Fetches one page of the topology starting at `cursor`. Implemented
/// against a real node by `magma` (using `magma-net`'s connection
/// cache and `magma-wire`'s `TopologyPage` codec); kept as a trait
/// here so refresh logic is testable without a socket.
pub trait TopologySource {
    fn fetch_page(&mut self, cursor: u32) -> Result<TopologyPage, ProtocolError>;
}

fn record_to_descriptor(record: &NodeRecord) -> Result<NodeDescriptor, ProtocolError> {
    if record.port == 0 {
        return Err(ProtocolError::FatalTopologyEntry { id: record.id.clone() });
    }
    Ok(NodeDescriptor {
        id: record.id.clone(),
        ip: record.ip,
        port: record.port,
        start_key: magma_key::Key::from_bytes(record.start_key),
        stop_key: magma_key::Key::from_bytes(record.stop_key),
    })
}

/// Run a topology refresh, coalescing concurrent callers via
/// `refresh_lock.try_lock`.
pub fn refresh_topology<S: TopologySource>(
    refresh_lock: &Mutex<()>,
    installed: &InstalledRing,
    mut source: S,
) -> Result<RefreshOutcome, ProtocolError> {
    let _guard = match refresh_lock.try_lock() {
        Some(guard) => guard,
        None => {
            debug!("topology refresh already in progress, coalescing");
            return Ok(RefreshOutcome::Coalesced);
        }
    };

    let mut nodes = Vec::new();
    let mut cursor = 0u32;
    loop {
        let page = source.fetch_page(cursor)?;
        for record in &page.nodes {
            match record_to_descriptor(record) {
                Ok(descriptor) => nodes.push(descriptor),
                Err(err) => {
                    warn!(error = %err, "aborting topology refresh, keeping previously installed ring");
                    return Err(err);
                }
            }
        }
        if !page.has_more {
            break;
        }
        cursor += 1;
    }

    let ring = Ring::build(nodes).map_err(|err: RingBuildError| {
        ProtocolError::FatalTopologyEntry {
            id: err.to_string(),
        }
    })?;
    let participants = ring.participants();
    installed.replace_atomically(ring);
    Ok(RefreshOutcome::Installed { participants })
}

#[allow(dead_code)]
fn fake_node_record(id: &str, port: u16) -> NodeRecord {
    NodeRecord {
        id: id.to_string(),
        ip: Ipv4Addr::new(127, 0, 0, 1),
        port,
        start_key: [0u8; 20],
        stop_key: [0xffu8; 20],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SinglePageSource(Vec<NodeRecord>);

    impl TopologySource for SinglePageSource {
        fn fetch_page(&mut self, _cursor: u32) -> Result<TopologyPage, ProtocolError> {
            Ok(TopologyPage {
                nodes: std::mem::take(&mut self.0),
                has_more: false,
            })
        }
    }

    struct TwoPageSource {
        pages: Vec<Vec<NodeRecord>>,
    }

    impl TopologySource for TwoPageSource {
        fn fetch_page(&mut self, cursor: u32) -> Result<TopologyPage, ProtocolError> {
            let idx = cursor as usize;
            let has_more = idx + 1 < self.pages.len();
            Ok(TopologyPage {
                nodes: self.pages[idx].clone(),
                has_more,
            })
        }
    }

    #[test]
    fn refresh_installs_single_page_topology() {
        let installed = InstalledRing::default();
        let lock = Mutex::new(());
        let source = SinglePageSource(vec![fake_node_record("a", 12000)]);
        let outcome = refresh_topology(&lock, &installed, source).unwrap();
        assert_eq!(outcome, RefreshOutcome::Installed { participants: 1 });
    }

    #[test]
    fn refresh_walks_multiple_pages() {
        let installed = InstalledRing::default();
        let lock = Mutex::new(());
        let source = TwoPageSource {
            pages: vec![
                vec![fake_node_record("a", 12000)],
                vec![fake_node_record("b", 12001)],
            ],
        };
        let outcome = refresh_topology(&lock, &installed, source).unwrap();
        assert_eq!(outcome, RefreshOutcome::Installed { participants: 2 });
    }

    #[test]
    fn refresh_aborts_on_port_zero_and_keeps_old_ring() {
        let old_ring = Ring::build(vec![magma_ring::NodeDescriptor {
            id: "old".to_string(),
            ip: Ipv4Addr::LOCALHOST,
            port: 9999,
            start_key: magma_key::Key::ZERO,
            stop_key: magma_key::Key::MAX,
        }])
        .unwrap();
        let installed = InstalledRing::new(old_ring);
        let lock = Mutex::new(());
        let source = SinglePageSource(vec![fake_node_record("bad", 0)]);
        let err = refresh_topology(&lock, &installed, source).unwrap_err();
        assert!(matches!(err, ProtocolError::FatalTopologyEntry { .. }));
        assert_eq!(installed.current().first_node().unwrap().id, "old");
    }

    #[test]
    fn concurrent_refresh_coalesces() {
        let installed = InstalledRing::default();
        let lock = Mutex::new(());
        let _held = lock.lock();
        let source = SinglePageSource(vec![fake_node_record("a", 12000)]);
        // try_lock fails while _held is alive, simulating a concurrent refresh.
        let guard_attempt = lock.try_lock();
        assert!(guard_attempt.is_none());
        drop(guard_attempt);
        drop(_held);
        let outcome = refresh_topology(&lock, &installed, source).unwrap();
        assert_eq!(outcome, RefreshOutcome::Installed { participants: 1 });
    }
}
