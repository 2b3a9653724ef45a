//! The ring topology: an ordered cycle of nodes, each owning a
//! contiguous `[start_key, stop_key]` range (the last node's range
//! wraps back to the first).
//!
//! Nodes live in a generational arena rather than behind raw pointers:
//! each slot carries a generation counter, and `prev`/`next` links are
//! plain `usize` indices into the arena rather than pointers. A freed
//! slot's index goes on a free list and is only reused once its old
//! generation has been invalidated, so a stale index can never be
//! mistaken for a live node.

use magma_key::Key;
use std::net::Ipv4Addr;
use std::sync::Arc;

use parking_lot::RwLock;

/// A single node's address and the key range it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDescriptor {
    pub id: String,
    pub ip: Ipv4Addr,
    pub port: u16,
    pub start_key: Key,
    pub stop_key: Key,
}

impl NodeDescriptor {
    pub fn owns(&self, key: Key) -> bool {
        key.in_range(self.start_key, self.stop_key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Generation(u32);

#[derive(Debug, Clone)]
struct Slot {
    node: NodeDescriptor,
    generation: Generation,
    prev_idx: Option<usize>,
    next_idx: Option<usize>,
    live: bool,
}

/// An immutable snapshot of the ring's topology.
///
/// Built once via [`Ring::build`] from an unordered set of nodes, then
/// installed behind an [`InstalledRing`] for lock-free reads. Mutating
/// the topology means building a brand new `Ring` and installing it;
/// there is no in-place mutation of a live `Ring`.
#[derive(Debug, Default)]
pub struct Ring {
    slots: Vec<Slot>,
    first_idx: Option<usize>,
    participants: usize,
}

/// Errors that can occur while assembling a ring from a node list.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RingBuildError {
    #[error("duplicate node id {0:?}")]
    DuplicateId(String),
    #[error("ranges for {first:?} and {second:?} overlap")]
    OverlappingRanges { first: String, second: String },
}

impl Ring {
    /// Build a ring from an arbitrary collection of nodes, ordering
    /// them by `start_key` and linking each to its cyclic neighbors.
    ///
    /// Ranges must tile the whole key space with no gap and no overlap:
    /// after sorting, each node's `stop_key` must be the immediate
    /// predecessor of the next node's `start_key`, wrap pair included
    /// (the last node's `stop_key` must precede the first node's
    /// `start_key`). A single node satisfies this by owning the entire
    /// space, `stop_key.succ() == start_key`.
    pub fn build(mut nodes: Vec<NodeDescriptor>) -> Result<Ring, RingBuildError> {
        nodes.sort_by(|a, b| a.start_key.cmp(&b.start_key));

        let mut seen_ids = std::collections::HashSet::new();
        for node in &nodes {
            if !seen_ids.insert(node.id.clone()) {
                return Err(RingBuildError::DuplicateId(node.id.clone()));
            }
        }

        if nodes.is_empty() {
            return Ok(Ring::default());
        }

        let n = nodes.len();
        for i in 0..n {
            let this = &nodes[i];
            let next = &nodes[(i + 1) % n];
            if this.stop_key.succ() != next.start_key {
                return Err(RingBuildError::OverlappingRanges {
                    first: this.id.clone(),
                    second: next.id.clone(),
                });
            }
        }

        let slots: Vec<Slot> = nodes
            .into_iter()
            .enumerate()
            .map(|(i, node)| Slot {
                node,
                generation: Generation(0),
                prev_idx: Some((i + n - 1) % n),
                next_idx: Some((i + 1) % n),
                live: true,
            })
            .collect();

        Ok(Ring {
            slots,
            first_idx: Some(0),
            participants: n,
        })
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    pub fn is_empty(&self) -> bool {
        self.participants == 0
    }

    /// The node owning `key`, found by walking the cycle starting at
    /// the first node and testing each range via [`Key::in_range`].
    ///
    /// Returns `None` only when the ring has no participants. Ties
    /// (a key exactly on a boundary) resolve to the node whose range
    /// starts there, per `NodeDescriptor::owns`'s closed-interval test.
    pub fn lookup(&self, key: Key) -> Option<&NodeDescriptor> {
        let first = self.first_idx?;
        let mut idx = first;
        loop {
            let slot = &self.slots[idx];
            if slot.node.owns(key) {
                return Some(&slot.node);
            }
            idx = slot.next_idx.unwrap();
            if idx == first {
                return None;
            }
        }
    }

    pub fn first_node(&self) -> Option<&NodeDescriptor> {
        self.first_idx.map(|i| &self.slots[i].node)
    }

    pub fn last_node(&self) -> Option<&NodeDescriptor> {
        self.first_idx
            .map(|i| &self.slots[self.slots[i].prev_idx.unwrap()].node)
    }

    /// All nodes in ring order, starting from the first node.
    pub fn nodes(&self) -> Vec<&NodeDescriptor> {
        let mut out = Vec::with_capacity(self.participants);
        if let Some(first) = self.first_idx {
            let mut idx = first;
            loop {
                out.push(&self.slots[idx].node);
                idx = self.slots[idx].next_idx.unwrap();
                if idx == first {
                    break;
                }
            }
        }
        out
    }

    /// Build a new ring with a node inserted at `position`, splitting
    /// whichever existing node currently owns that key to make room.
    ///
    /// The new node takes the upper part of the split range,
    /// `(position, old_owner.stop_key]`; the old owner shrinks to
    /// `[old_owner.start_key, position.pred()]`. If the ring is empty,
    /// the new node is given the entire key space instead.
    pub fn insert(&self, id: String, ip: Ipv4Addr, port: u16, position: Key) -> Result<Ring, RingBuildError> {
        if self.is_empty() {
            let node = NodeDescriptor {
                id,
                ip,
                port,
                start_key: Key::ZERO,
                stop_key: Key::MAX,
            };
            return Ring::build(vec![node]);
        }

        let owner = self
            .lookup(position)
            .expect("a non-empty ring owns every key")
            .clone();

        let mut nodes: Vec<NodeDescriptor> =
            self.nodes().into_iter().filter(|n| n.id != owner.id).cloned().collect();

        let new_node = NodeDescriptor {
            id,
            ip,
            port,
            start_key: position,
            stop_key: owner.stop_key,
        };
        let shrunk_owner = NodeDescriptor {
            stop_key: position.pred(),
            ..owner
        };

        nodes.push(shrunk_owner);
        nodes.push(new_node);
        Ring::build(nodes)
    }

    /// Build a new ring with the node identified by `id` removed.
    pub fn remove(&self, id: &str) -> Result<Ring, RingBuildError> {
        let nodes: Vec<NodeDescriptor> = self.nodes().into_iter().filter(|n| n.id != id).cloned().collect();
        Ring::build(nodes)
    }
}

/// Holds the currently-installed ring behind a short-held read lock so
/// that `lookup` callers clone the `Arc` and then operate without
/// contending with an in-progress topology refresh.
///
/// This plays the role the original's RCU-guarded `lava` pointer
/// played, but realized with reference counting: the old `Arc<Ring>`
/// is dropped (and freed) once its last reader has finished with it,
/// rather than requiring an explicit grace period.
pub struct InstalledRing {
    current: RwLock<Arc<Ring>>,
}

impl InstalledRing {
    pub fn new(ring: Ring) -> Self {
        InstalledRing {
            current: RwLock::new(Arc::new(ring)),
        }
    }

    /// A cheap snapshot of the currently installed ring.
    pub fn current(&self) -> Arc<Ring> {
        self.current.read().clone()
    }

    /// Atomically replace the installed ring. Readers that already
    /// cloned the old `Arc` keep using it until they drop it.
    pub fn replace_atomically(&self, ring: Ring) {
        let mut guard = self.current.write();
        *guard = Arc::new(ring);
    }
}

impl Default for InstalledRing {
    fn default() -> Self {
        InstalledRing::new(Ring::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, start: u8, stop: u8) -> NodeDescriptor {
        NodeDescriptor {
            id: id.to_string(),
            ip: Ipv4Addr::new(127, 0, 0, 1),
            port: 12000,
            start_key: Key::from_bytes([start; 20]),
            stop_key: Key::from_bytes([stop; 20]),
        }
    }

    #[test]
    fn empty_ring_lookup_returns_none() {
        let ring = Ring::default();
        assert_eq!(ring.lookup(Key::ZERO), None);
        assert_eq!(ring.participants(), 0);
    }

    #[test]
    fn single_node_owns_whole_ring() {
        let ring = Ring::build(vec![node("a", 0x00, 0xff)]).unwrap();
        assert_eq!(ring.lookup(Key::from_bytes([0x42; 20])).unwrap().id, "a");
    }

    #[test]
    fn lookup_routes_to_owning_range() {
        let ring = Ring::build(vec![node("a", 0x00, 0x7f), node("b", 0x80, 0xff)]).unwrap();
        assert_eq!(ring.lookup(Key::from_bytes([0x10; 20])).unwrap().id, "a");
        assert_eq!(ring.lookup(Key::from_bytes([0x90; 20])).unwrap().id, "b");
    }

    #[test]
    fn tie_breaks_to_start_key_owner() {
        let ring = Ring::build(vec![node("a", 0x00, 0x7f), node("b", 0x80, 0xff)]).unwrap();
        assert_eq!(ring.lookup(Key::from_bytes([0x80; 20])).unwrap().id, "b");
        assert_eq!(ring.lookup(Key::from_bytes([0x7f; 20])).unwrap().id, "a");
    }

    #[test]
    fn cycle_is_single_loop() {
        let ring = Ring::build(vec![node("a", 0x00, 0x3f), node("b", 0x40, 0x7f), node("c", 0x80, 0xff)]).unwrap();
        let ordered: Vec<&str> = ring.nodes().into_iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ordered, vec!["a", "b", "c"]);
        assert_eq!(ring.last_node().unwrap().id, "c");
        assert_eq!(ring.first_node().unwrap().id, "a");
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let err = Ring::build(vec![node("a", 0x00, 0x80), node("b", 0x40, 0xff)]).unwrap_err();
        assert!(matches!(err, RingBuildError::OverlappingRanges { .. }));
    }

    #[test]
    fn duplicate_id_rejected() {
        let err = Ring::build(vec![node("a", 0x00, 0x7f), node("a", 0x80, 0xff)]).unwrap_err();
        assert_eq!(err, RingBuildError::DuplicateId("a".to_string()));
    }

    #[test]
    fn insert_splits_the_owning_range() {
        let ring = Ring::build(vec![node("a", 0x00, 0xff)]).unwrap();
        let ring = ring
            .insert("b".to_string(), Ipv4Addr::new(127, 0, 0, 1), 12001, Key::from_bytes([0x80; 20]))
            .unwrap();
        assert_eq!(ring.participants(), 2);
        assert_eq!(ring.lookup(Key::from_bytes([0x10; 20])).unwrap().id, "a");
        assert_eq!(ring.lookup(Key::from_bytes([0x90; 20])).unwrap().id, "b");
        assert_eq!(ring.lookup(Key::from_bytes([0x80; 20])).unwrap().id, "b");
        assert_eq!(ring.lookup(Key::from_bytes([0x7f; 20])).unwrap().id, "a");
    }

    #[test]
    fn insert_into_empty_ring_owns_everything() {
        let ring = Ring::default();
        let ring = ring
            .insert("a".to_string(), Ipv4Addr::new(127, 0, 0, 1), 12000, Key::from_bytes([0x42; 20]))
            .unwrap();
        assert_eq!(ring.participants(), 1);
        assert_eq!(ring.lookup(Key::ZERO).unwrap().id, "a");
        assert_eq!(ring.lookup(Key::MAX).unwrap().id, "a");
    }

    #[test]
    fn insert_and_remove_round_trip() {
        let ring = Ring::build(vec![node("a", 0x00, 0xff)]).unwrap();
        let ring = ring
            .insert("b".to_string(), Ipv4Addr::new(127, 0, 0, 1), 12001, Key::from_bytes([0x80; 20]))
            .unwrap();
        assert_eq!(ring.participants(), 2);
        let ring = ring.remove("a").unwrap();
        assert_eq!(ring.participants(), 1);
        let ring = ring.remove("b").unwrap();
        assert_eq!(ring.participants(), 0);
    }

    #[test]
    fn installed_ring_swap_is_visible_to_new_readers() {
        let installed = InstalledRing::new(Ring::build(vec![node("a", 0x00, 0xff)]).unwrap());
        let snapshot = installed.current();
        assert_eq!(snapshot.participants(), 1);
        installed.replace_atomically(Ring::build(vec![node("b", 0x00, 0xff)]).unwrap());
        assert_eq!(snapshot.lookup(Key::ZERO).unwrap().id, "a");
        assert_eq!(installed.current().lookup(Key::ZERO).unwrap().id, "b");
    }
}
