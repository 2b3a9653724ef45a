//! The per-mount state every binding function operates against:
//! the installed ring, the connection cache, the refresh-coalescing
//! lock, and the open-file table — encapsulated in one explicit value
//! rather than scattered globals.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use magma_net::ConnectionCache;
use magma_ring::InstalledRing;
use parking_lot::{Mutex, RwLock};

use crate::config::MagmaConfig;

/// A single open file: the commit URL it was opened against and the
/// routing key derived from it.
#[derive(Debug, Clone)]
pub struct OpenFileHandle {
    pub commit_url: String,
    pub key: String,
}

#[derive(Debug, thiserror::Error)]
pub enum BootError {
    #[error("failed to reach bootstrap node: {0}")]
    Connect(#[from] magma_net::ConnectError),
    #[error("initial topology fetch failed: {0}")]
    Refresh(#[from] magma_net::ProtocolError),
}

pub struct Context {
    pub(crate) installed: InstalledRing,
    pub(crate) cache: ConnectionCache,
    pub(crate) refresh_lock: Mutex<()>,
    pub(crate) open_files: RwLock<HashMap<String, OpenFileHandle>>,
    pub(crate) config: MagmaConfig,
}

/// Identity of the user on whose behalf a binding call is made —
/// captured from the host's FUSE context, defaulting to root/root
/// when the host provides none.
#[derive(Debug, Clone, Copy, Default)]
pub struct CallerContext {
    pub uid: u32,
    pub gid: u32,
}

impl Context {
    /// Assemble a context with an empty ring installed. Callers that
    /// already know the ring (tests, the harness) can skip talking to
    /// a real bootstrap node entirely.
    pub fn new(config: MagmaConfig) -> Context {
        let timeout = config.request_timeout();
        Context {
            installed: InstalledRing::default(),
            cache: ConnectionCache::new(timeout),
            refresh_lock: Mutex::new(()),
            open_files: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Build a context and populate its ring from a single bootstrap
    /// node by running the same TRANSMIT_TOPOLOGY exchange a later
    /// refresh would use. Mirrors the original main()'s initial
    /// connect-and-join-the-network step, minus the JOIN handshake
    /// itself (a client only ever reads the topology, never joins it).
    pub fn bootstrap(config: MagmaConfig) -> Result<Context, BootError> {
        let remote_ip = config.remote_ip.ok_or(BootError::Connect(magma_net::ConnectError::NoOwner))?;
        let remote_port = config.remote_port;
        let ctx = Context::new(config);

        let endpoint = ctx.cache.acquire(remote_ip, remote_port)?;
        let source = crate::client::bootstrap_topology_source(&endpoint);
        magma_net::refresh_topology(&ctx.refresh_lock, &ctx.installed, source).map_err(BootError::from)?;
        Ok(ctx)
    }

    pub fn config(&self) -> &MagmaConfig {
        &self.config
    }

    pub fn installed_ring(&self) -> &InstalledRing {
        &self.installed
    }

    pub fn cache(&self) -> &ConnectionCache {
        &self.cache
    }

    /// The lock a manual topology refresh should coalesce on. Exposed
    /// for callers (the conformance harness, a future admin tool)
    /// that need to trigger a refresh outside the normal
    /// REFRESH_TOPOLOGY-flag-driven path.
    pub fn refresh_lock(&self) -> &Mutex<()> {
        &self.refresh_lock
    }

    pub(crate) fn remember_open_file(&self, path: &str, handle: OpenFileHandle) {
        self.open_files.write().insert(path.to_string(), handle);
    }

    pub(crate) fn forget_open_file(&self, path: &str) -> Option<OpenFileHandle> {
        self.open_files.write().remove(path)
    }

    pub(crate) fn open_file(&self, path: &str) -> Option<OpenFileHandle> {
        self.open_files.read().get(path).cloned()
    }

    pub fn bootstrap_remote_ip(&self) -> Option<Ipv4Addr> {
        self.config.remote_ip
    }
}
