//! Frame-level errors: malformed bytes, not remote-reported failures.
//!
//! A remote-reported failure (the peer understood the request and
//! answered with `res == -1`) is not a `FrameError` — it is a valid
//! frame whose payload says "no". `FrameError` is reserved for bytes
//! that don't parse as a frame at all.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    #[error("buffer too short: expected at least {expected} bytes, got {got}")]
    Truncated { expected: usize, got: usize },

    #[error("unknown op code {0}")]
    UnknownOpCode(u8),

    #[error("page entry count {0} exceeds the protocol's per-page maximum")]
    PageTooLarge(usize),
}
