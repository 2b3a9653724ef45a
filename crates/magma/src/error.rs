//! The one error type every client binding function returns.
//!
//! Per the errno-return convention inherited from the original
//! protocol, the only thing a host adapter needs to do with a
//! `BindingError` is call [`BindingError::to_errno`] and hand that
//! number to whatever glue code talks to its filesystem API.

#[derive(Debug, thiserror::Error)]
pub enum BindingError {
    #[error("routing failure: {0}")]
    Routing(#[from] magma_net::ConnectError),

    #[error("connection failure: {0}")]
    Connection(magma_net::ConnectError),

    #[error("frame error: {0}")]
    Frame(#[from] magma_wire::FrameError),

    #[error("remote reported failure, errno {0}")]
    Remote(i32),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(&'static str),

    #[error("topology refresh failed: {0}")]
    RefreshFailed(#[from] magma_net::ProtocolError),
}

/// Generic POSIX errno fallback for routing/connection/frame failures
/// that have no single obvious errno of their own.
const EPROTO: i32 = 71;
const ENOMEM: i32 = 12;
const ENOENT: i32 = 2;

impl BindingError {
    /// Negative-errno convention: callers that want a raw POSIX-style
    /// return value use this directly as a syscall-style result.
    pub fn to_errno(&self) -> i32 {
        match self {
            BindingError::Routing(_) => -ENOENT,
            BindingError::Connection(_) => -EPROTO,
            BindingError::Frame(_) => -EPROTO,
            BindingError::Remote(errno) => *errno,
            BindingError::ResourceExhausted(_) => -ENOMEM,
            BindingError::RefreshFailed(_) => -EPROTO,
        }
    }
}
