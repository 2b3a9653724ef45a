//! One function per filesystem verb. Every function follows the same
//! six-step skeleton:
//!
//! 1. capture the caller's uid/gid (already done by [`CallerContext`]),
//! 2. route the path to its owning node,
//! 3. acquire (or create) a cached connection to that node,
//! 4. send the request and receive the response,
//! 5. translate a remote-reported failure (`res == -1`) into an
//!    errno, or compute the verb's success value,
//! 6. if the response carries `REFRESH_TOPOLOGY`, refresh the ring —
//!    strictly after the result above is already decided, so a
//!    refresh never changes the outcome of the call that triggered it.
//!
//! `LINK` is intentionally implemented as a direct call to `symlink`:
//! that is observed protocol behavior, not an oversight.

use magma_net::route_path;
use magma_ring::NodeDescriptor;
use magma_wire::{Flags, OpCode, PathRequest, RequestHeader, ResponseHeader, TopologyPage};
use tracing::{debug, trace};

use crate::context::{CallerContext, Context, OpenFileHandle};
use crate::error::BindingError;

const DEFAULT_TTL: u16 = 2;
const ENOENT: i32 = 2;
const MAX_FRAME: usize = 64 * 1024;

struct CallResult {
    header: ResponseHeader,
    payload: Vec<u8>,
    node: NodeDescriptor,
}

fn perform_call(ctx: &Context, caller: CallerContext, path: &str, op: OpCode, payload: &[u8]) -> Result<CallResult, BindingError> {
    let node = route_path(ctx.installed_ring(), path)?;
    let endpoint = ctx
        .cache()
        .acquire(node.ip, node.port)
        .map_err(BindingError::Connection)?;

    let header = RequestHeader {
        op_type: op,
        transaction_id: endpoint.next_transaction_id(),
        ttl: DEFAULT_TTL,
        uid: caller.uid as u16,
        gid: caller.gid as u16,
        flags: Flags::empty(),
        payload_len: payload.len() as u32,
    };

    let mut request_buf = Vec::with_capacity(magma_wire::REQUEST_HEADER_LEN + payload.len());
    request_buf.extend_from_slice(&header.encode());
    request_buf.extend_from_slice(payload);

    let mut response_buf = vec![0u8; MAX_FRAME];
    let n = endpoint
        .exchange(&request_buf, &mut response_buf)
        .map_err(BindingError::Connection)?;
    response_buf.truncate(n);

    let resp_header = ResponseHeader::decode(&response_buf)?;
    let resp_payload = response_buf[magma_wire::RESPONSE_HEADER_LEN..].to_vec();

    if resp_header.is_failure() && resp_header.err_no != ENOENT {
        trace!(node = %node.id, errno = resp_header.err_no, "dropping connection after non-ENOENT failure");
        ctx.cache().invalidate(node.ip, node.port);
    }

    Ok(CallResult {
        header: resp_header,
        payload: resp_payload,
        node,
    })
}

/// Query the node that served `result` for the latest topology and
/// install it, if the response asked for a refresh.
fn maybe_refresh(ctx: &Context, result: &CallResult) {
    if !result.header.flags.is_refresh_topology() {
        return;
    }
    debug!(node = %result.node.id, "refreshing topology after REFRESH_TOPOLOGY flag");
    let node = result.node.clone();
    let endpoint = match ctx.cache().acquire(node.ip, node.port) {
        Ok(endpoint) => endpoint,
        Err(_) => return,
    };
    let source = EndpointTopologySource { endpoint: &endpoint };
    let _ = magma_net::refresh_topology(&ctx.refresh_lock, ctx.installed_ring(), source);
}

/// Build a `TopologySource` that queries `endpoint` directly, for use
/// by `Context::bootstrap`'s initial topology fetch, and by anything
/// else that needs to drive a manual refresh against a known endpoint.
pub fn bootstrap_topology_source(endpoint: &magma_net::Endpoint) -> EndpointTopologySource<'_> {
    EndpointTopologySource { endpoint }
}

pub struct EndpointTopologySource<'a> {
    endpoint: &'a magma_net::Endpoint,
}

impl<'a> magma_net::TopologySource for EndpointTopologySource<'a> {
    fn fetch_page(&mut self, cursor: u32) -> Result<TopologyPage, magma_net::ProtocolError> {
        let header = RequestHeader {
            op_type: OpCode::TransmitTopology,
            transaction_id: self.endpoint.next_transaction_id(),
            ttl: DEFAULT_TTL,
            uid: 0,
            gid: 0,
            flags: Flags::empty(),
            payload_len: 4,
        };
        let mut request_buf = Vec::with_capacity(magma_wire::REQUEST_HEADER_LEN + 4);
        request_buf.extend_from_slice(&header.encode());
        request_buf.extend_from_slice(&cursor.to_be_bytes());

        let mut response_buf = vec![0u8; MAX_FRAME];
        let n = self.endpoint.exchange(&request_buf, &mut response_buf)?;
        response_buf.truncate(n);

        let resp_header: ResponseHeader =
            ResponseHeader::decode(&response_buf).map_err(magma_net::ConnectError::from)?;
        if resp_header.is_failure() {
            return Err(magma_net::ProtocolError::Remote(resp_header.err_no));
        }
        let page = TopologyPage::decode(&response_buf[magma_wire::RESPONSE_HEADER_LEN..])
            .map_err(magma_net::ConnectError::from)?;
        Ok(page)
    }
}

fn result_errno(header: &ResponseHeader) -> Result<(), BindingError> {
    if header.is_failure() {
        Err(BindingError::Remote(-header.err_no))
    } else {
        Ok(())
    }
}

pub fn getattr(ctx: &Context, caller: CallerContext, path: &str) -> Result<Vec<u8>, BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::GetAttr, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(result.payload)
}

pub fn readlink(ctx: &Context, caller: CallerContext, path: &str) -> Result<String, BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::ReadLink, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(String::from_utf8_lossy(&result.payload).into_owned())
}

/// Feed every entry of `path`'s listing to `filler`, paging through
/// READDIR_EXTENDED until the remote signals no more pages or `filler`
/// short-circuits by returning `true`, matching the original's
/// `filler(...)` return check. Unlike the original's "continue the
/// loop on abnormal status", an abnormal status here retries the same
/// page once against the same endpoint before giving up — the safer
/// interpretation this binding adopts.
pub fn readdir(
    ctx: &Context,
    caller: CallerContext,
    path: &str,
    mut filler: impl FnMut(String) -> bool,
) -> Result<(), BindingError> {
    let mut cursor: u32 = 0;
    loop {
        let mut payload = PathRequest { path: path.to_string() }.encode();
        payload.extend_from_slice(&cursor.to_be_bytes());

        let mut result = perform_call(ctx, caller, path, OpCode::ReadDirExtended, &payload);
        if result.is_err() {
            // retry once on the same endpoint before surfacing the error
            result = perform_call(ctx, caller, path, OpCode::ReadDirExtended, &payload);
        }
        let result = result?;
        result_errno(&result.header)?;

        let page = magma_wire::ReadDirPage::decode(&result.payload)?;
        for entry in page.entries {
            if filler(entry.name) {
                return Ok(());
            }
        }
        maybe_refresh(ctx, &result);

        if !page.has_more {
            return Ok(());
        }
        cursor += 1;
    }
}

pub fn mknod(ctx: &Context, caller: CallerContext, path: &str, mode: u32) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&mode.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::MkNod, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn mkdir(ctx: &Context, caller: CallerContext, path: &str, mode: u32) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&mode.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::MkDir, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn symlink(ctx: &Context, caller: CallerContext, target: &str, linkpath: &str) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: linkpath.to_string() }.encode();
    let target_bytes = target.as_bytes();
    payload.extend_from_slice(&(target_bytes.len() as u32).to_be_bytes());
    payload.extend_from_slice(target_bytes);
    let result = perform_call(ctx, caller, linkpath, OpCode::SymLink, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

/// `LINK` is the original protocol's alias for `SYMLINK` — preserved
/// as-is rather than given real hard-link semantics.
pub fn link(ctx: &Context, caller: CallerContext, from: &str, to: &str) -> Result<(), BindingError> {
    symlink(ctx, caller, from, to)
}

pub fn unlink(ctx: &Context, caller: CallerContext, path: &str) -> Result<(), BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::Unlink, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn rmdir(ctx: &Context, caller: CallerContext, path: &str) -> Result<(), BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::RmDir, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn rename(ctx: &Context, caller: CallerContext, from: &str, to: &str) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: from.to_string() }.encode();
    let to_bytes = to.as_bytes();
    payload.extend_from_slice(&(to_bytes.len() as u32).to_be_bytes());
    payload.extend_from_slice(to_bytes);
    let result = perform_call(ctx, caller, from, OpCode::Rename, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn chmod(ctx: &Context, caller: CallerContext, path: &str, mode: u32) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&mode.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::Chmod, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn chown(ctx: &Context, caller: CallerContext, path: &str, uid: u32, gid: u32) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&uid.to_be_bytes());
    payload.extend_from_slice(&gid.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::Chown, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn truncate(ctx: &Context, caller: CallerContext, path: &str, size: u64) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&size.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::Truncate, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn utime(ctx: &Context, caller: CallerContext, path: &str, atime: i64, mtime: i64) -> Result<(), BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&atime.to_be_bytes());
    payload.extend_from_slice(&mtime.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::Utime, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(())
}

/// Open `path`, deriving its `commit_url`/key pair and recording it in
/// the context's open-file table for later `read`/`write`/`release`.
pub fn open(ctx: &Context, caller: CallerContext, path: &str, commit_url: &str) -> Result<(), BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::Open, &payload)?;
    result_errno(&result.header)?;
    ctx.remember_open_file(
        path,
        OpenFileHandle {
            commit_url: commit_url.to_string(),
            key: magma_key::Key::armour_of(commit_url.as_bytes()),
        },
    );
    maybe_refresh(ctx, &result);
    Ok(())
}

pub fn read(ctx: &Context, caller: CallerContext, path: &str, offset: u64, size: u32) -> Result<Vec<u8>, BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&offset.to_be_bytes());
    payload.extend_from_slice(&size.to_be_bytes());
    let result = perform_call(ctx, caller, path, OpCode::Read, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(result.payload)
}

pub fn write(ctx: &Context, caller: CallerContext, path: &str, offset: u64, data: &[u8]) -> Result<usize, BindingError> {
    let mut payload = PathRequest { path: path.to_string() }.encode();
    payload.extend_from_slice(&offset.to_be_bytes());
    payload.extend_from_slice(&(data.len() as u32).to_be_bytes());
    payload.extend_from_slice(data);
    let result = perform_call(ctx, caller, path, OpCode::Write, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(result.header.res.max(0) as usize)
}

pub fn statfs(ctx: &Context, caller: CallerContext, path: &str) -> Result<Vec<u8>, BindingError> {
    let payload = PathRequest { path: path.to_string() }.encode();
    let result = perform_call(ctx, caller, path, OpCode::StatFs, &payload)?;
    result_errno(&result.header)?;
    maybe_refresh(ctx, &result);
    Ok(result.payload)
}

/// Evicts the open-file entry on close. The original left these
/// entries in place forever; this binding fixes that unbounded growth.
pub fn release(ctx: &Context, _caller: CallerContext, path: &str) -> Result<(), BindingError> {
    ctx.forget_open_file(path);
    Ok(())
}

/// Stubbed as a no-op success, matching the original's unimplemented
/// FSYNC handling.
pub fn fsync(_ctx: &Context, _caller: CallerContext, _path: &str) -> Result<(), BindingError> {
    Ok(())
}

pub fn setxattr(_ctx: &Context, _caller: CallerContext, _path: &str, _name: &str, _value: &[u8]) -> Result<(), BindingError> {
    Ok(())
}

pub fn getxattr(_ctx: &Context, _caller: CallerContext, _path: &str, _name: &str) -> Result<Vec<u8>, BindingError> {
    Ok(Vec::new())
}

pub fn listxattr(_ctx: &Context, _caller: CallerContext, _path: &str) -> Result<Vec<String>, BindingError> {
    Ok(Vec::new())
}

pub fn removexattr(_ctx: &Context, _caller: CallerContext, _path: &str, _name: &str) -> Result<(), BindingError> {
    Ok(())
}
