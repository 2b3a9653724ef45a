//! Connection cache keyed by `(ip, port)`, so repeated calls to the
//! same node reuse one endpoint instead of reconnecting per call.

use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::endpoint::Endpoint;
use crate::error::ConnectError;

type CacheKey = (Ipv4Addr, u16);

pub struct ConnectionCache {
    endpoints: Mutex<HashMap<CacheKey, Arc<Endpoint>>>,
    timeout: Duration,
}

impl ConnectionCache {
    pub fn new(timeout: Duration) -> Self {
        ConnectionCache {
            endpoints: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Acquire the cached endpoint for `(ip, port)`, connecting a new
    /// one on first use.
    pub fn acquire(&self, ip: Ipv4Addr, port: u16) -> Result<Arc<Endpoint>, ConnectError> {
        let key = (ip, port);
        if let Some(endpoint) = self.endpoints.lock().get(&key).cloned() {
            return Ok(endpoint);
        }
        let endpoint = Arc::new(Endpoint::connect_udp(ip, port, self.timeout)?);
        self.endpoints.lock().insert(key, endpoint.clone());
        Ok(endpoint)
    }

    /// Drop the cached endpoint for `(ip, port)` so the next
    /// `acquire` reconnects. Called after any failure other than the
    /// benign `ENOENT` the remote end is allowed to answer with.
    pub fn invalidate(&self, ip: Ipv4Addr, port: u16) {
        self.endpoints.lock().remove(&(ip, port));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::UdpSocket;

    #[test]
    fn acquire_reuses_the_same_endpoint() {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = server.local_addr().unwrap().port();
        let cache = ConnectionCache::new(Duration::from_millis(200));
        let a = cache.acquire(Ipv4Addr::LOCALHOST, port).unwrap();
        let b = cache.acquire(Ipv4Addr::LOCALHOST, port).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn invalidate_forces_reconnect() {
        let server = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = server.local_addr().unwrap().port();
        let cache = ConnectionCache::new(Duration::from_millis(200));
        let a = cache.acquire(Ipv4Addr::LOCALHOST, port).unwrap();
        cache.invalidate(Ipv4Addr::LOCALHOST, port);
        let b = cache.acquire(Ipv4Addr::LOCALHOST, port).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
