//! Frame encoding/decoding for the MAGMA wire protocol: fixed headers,
//! the operation-code catalogue, flag bits, and the payload codecs for
//! paged exchanges (READDIR_EXTENDED, TRANSMIT_TOPOLOGY).
//!
//! This crate is pure logic: it never touches a socket. `magma-net`
//! drives actual I/O against the types defined here.

mod body;
mod error;
mod flags;
mod header;
mod opcode;

pub use body::{DirEntry, NodeRecord, PathRequest, ReadDirPage, TopologyPage, MAX_PAGE_ENTRIES};
pub use error::FrameError;
pub use flags::Flags;
pub use header::{RequestHeader, ResponseHeader, REQUEST_HEADER_LEN, RESPONSE_HEADER_LEN};
pub use opcode::OpCode;
