//! Routing and connection layer: turns a path into an owning node, and
//! a node into a live, cached, serialized connection.

mod cache;
mod endpoint;
mod error;
mod refresh;
mod route;

pub use cache::ConnectionCache;
pub use endpoint::{Endpoint, MAX_UDP_PAYLOAD};
pub use error::{ConnectError, ProtocolError};
pub use refresh::{refresh_topology, RefreshOutcome, TopologySource};
pub use route::route_path;
