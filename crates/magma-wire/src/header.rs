//! Fixed-width request and response headers.
//!
//! Every field is big-endian, matching the wire dissector's
//! `ENC_BIG_ENDIAN` decoding of `op_type`/`transaction_id`/`ttl`/
//! `uid`/`gid`. Encoding is hand-rolled rather than pulled in from a
//! byte-order crate, since the layout is small and fixed.

use crate::flags::Flags;
use crate::opcode::OpCode;
use crate::FrameError;

pub const REQUEST_HEADER_LEN: usize = 1 + 2 + 2 + 2 + 2 + 2 + 4;
pub const RESPONSE_HEADER_LEN: usize = 1 + 2 + 1 + 4 + 4 + 2 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestHeader {
    pub op_type: OpCode,
    pub transaction_id: u16,
    pub ttl: u16,
    pub uid: u16,
    pub gid: u16,
    pub flags: Flags,
    pub payload_len: u32,
}

impl RequestHeader {
    pub fn encode(&self) -> [u8; REQUEST_HEADER_LEN] {
        let mut out = [0u8; REQUEST_HEADER_LEN];
        out[0] = self.op_type.as_u8();
        out[1..3].copy_from_slice(&self.transaction_id.to_be_bytes());
        out[3..5].copy_from_slice(&self.ttl.to_be_bytes());
        out[5..7].copy_from_slice(&self.uid.to_be_bytes());
        out[7..9].copy_from_slice(&self.gid.to_be_bytes());
        out[9..11].copy_from_slice(&self.flags.bits().to_be_bytes());
        out[11..15].copy_from_slice(&self.payload_len.to_be_bytes());
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < REQUEST_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: REQUEST_HEADER_LEN,
                got: buf.len(),
            });
        }
        let op_type = OpCode::try_from(buf[0]).map_err(FrameError::UnknownOpCode)?;
        let transaction_id = u16::from_be_bytes([buf[1], buf[2]]);
        let ttl = u16::from_be_bytes([buf[3], buf[4]]);
        let uid = u16::from_be_bytes([buf[5], buf[6]]);
        let gid = u16::from_be_bytes([buf[7], buf[8]]);
        let flags = Flags::from_bits(u16::from_be_bytes([buf[9], buf[10]]));
        let payload_len = u32::from_be_bytes([buf[11], buf[12], buf[13], buf[14]]);
        Ok(RequestHeader {
            op_type,
            transaction_id,
            ttl,
            uid,
            gid,
            flags,
            payload_len,
        })
    }

    /// Decrement the TTL, the way each hop must before forwarding a
    /// request it does not own.
    pub fn with_decremented_ttl(mut self) -> Option<Self> {
        if self.ttl == 0 {
            return None;
        }
        self.ttl -= 1;
        Some(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub op_type: OpCode,
    pub transaction_id: u16,
    pub status: u8,
    pub res: i32,
    pub err_no: i32,
    pub flags: Flags,
    pub payload_len: u32,
}

impl ResponseHeader {
    pub fn encode(&self) -> [u8; RESPONSE_HEADER_LEN] {
        let mut out = [0u8; RESPONSE_HEADER_LEN];
        out[0] = self.op_type.as_u8();
        out[1..3].copy_from_slice(&self.transaction_id.to_be_bytes());
        out[3] = self.status;
        out[4..8].copy_from_slice(&self.res.to_be_bytes());
        out[8..12].copy_from_slice(&self.err_no.to_be_bytes());
        out[12..14].copy_from_slice(&self.flags.bits().to_be_bytes());
        out[14..18].copy_from_slice(&self.payload_len.to_be_bytes());
        out
    }

    pub fn decode(buf: &[u8]) -> Result<Self, FrameError> {
        if buf.len() < RESPONSE_HEADER_LEN {
            return Err(FrameError::Truncated {
                expected: RESPONSE_HEADER_LEN,
                got: buf.len(),
            });
        }
        let op_type = OpCode::try_from(buf[0]).map_err(FrameError::UnknownOpCode)?;
        let transaction_id = u16::from_be_bytes([buf[1], buf[2]]);
        let status = buf[3];
        let res = i32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let err_no = i32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);
        let flags = Flags::from_bits(u16::from_be_bytes([buf[12], buf[13]]));
        let payload_len = u32::from_be_bytes([buf[14], buf[15], buf[16], buf[17]]);
        Ok(ResponseHeader {
            op_type,
            transaction_id,
            status,
            res,
            err_no,
            flags,
            payload_len,
        })
    }

    /// A response is a remote-reported failure when `res == -1`, per
    /// the original client's `response.header.res == -1` check; on
    /// failure the caller negates `err_no` to produce a POSIX errno.
    pub fn is_failure(&self) -> bool {
        self.res == -1
    }
}
