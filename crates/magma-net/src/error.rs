//! Error taxonomy for the routing and connection layer: routing
//! failures, connection failures, and protocol-level failures the
//! peer reported. Each maps to an errno at the `magma` facade, not
//! here — this crate stays errno-free.

#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error("no node in the topology owns this key")]
    NoOwner,
    #[error("i/o error talking to {addr}: {source}")]
    Io {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("frame error: {0}")]
    Frame(#[from] magma_wire::FrameError),
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error(transparent)]
    Connect(#[from] ConnectError),
    #[error("remote reported failure, errno {0}")]
    Remote(i32),
    #[error("topology refresh aborted: node {id} advertised port 0")]
    FatalTopologyEntry { id: String },
}
