//! Path-to-owner routing: hash the path, look it up in the currently
//! installed ring.

use magma_key::Key;
use magma_ring::{InstalledRing, NodeDescriptor};

use crate::error::ConnectError;

/// Resolve `path` to the node that currently owns it.
///
/// Returns the owning node's descriptor (cloned out of the snapshot,
/// since the snapshot itself is dropped as soon as this call returns).
pub fn route_path(ring: &InstalledRing, path: &str) -> Result<NodeDescriptor, ConnectError> {
    let snapshot = ring.current();
    let key = Key::hash(path.as_bytes());
    snapshot.lookup(key).cloned().ok_or(ConnectError::NoOwner)
}
