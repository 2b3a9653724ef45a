//! An in-process mock node: just enough of the wire protocol to answer
//! GETATTR and TRANSMIT_TOPOLOGY, so the scenarios in [`crate::scenario`]
//! can exercise real sockets without a real storage node.

use std::net::{Ipv4Addr, UdpSocket};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use magma_wire::{Flags, OpCode, ResponseHeader, TopologyPage};

pub struct MockNode {
    pub port: u16,
    handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
}

impl MockNode {
    /// Start a mock node that answers every GETATTR with `behavior`
    /// and every TRANSMIT_TOPOLOGY with a single page advertising
    /// `topology_port` for node "mock" (or, if `fatal_topology` is
    /// set, a port-0 record that must abort the refresh).
    pub fn spawn(behavior_errno: Arc<AtomicI32>, refresh_flag: Arc<AtomicBool>, fatal_topology: bool) -> MockNode {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        socket.set_read_timeout(Some(std::time::Duration::from_millis(200))).unwrap();
        let port = socket.local_addr().unwrap().port();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = stop.clone();

        let handle = std::thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while !stop_clone.load(Ordering::Relaxed) {
                let (n, from) = match socket.recv_from(&mut buf) {
                    Ok(v) => v,
                    Err(_) => continue,
                };
                if n < magma_wire::REQUEST_HEADER_LEN {
                    continue;
                }
                let req = match magma_wire::RequestHeader::decode(&buf[..n]) {
                    Ok(req) => req,
                    Err(_) => continue,
                };

                let out = match req.op_type {
                    OpCode::GetAttr => {
                        let err_no = behavior_errno.load(Ordering::Relaxed);
                        let refresh = refresh_flag.load(Ordering::Relaxed);
                        let resp = ResponseHeader {
                            op_type: OpCode::GetAttr,
                            transaction_id: req.transaction_id,
                            status: if err_no == 0 { 0 } else { 1 },
                            res: if err_no == 0 { 0 } else { -1 },
                            err_no,
                            flags: if refresh { Flags::REFRESH_TOPOLOGY } else { Flags::empty() },
                            payload_len: 0,
                        };
                        resp.encode().to_vec()
                    }
                    OpCode::TransmitTopology => {
                        let page = if fatal_topology {
                            TopologyPage {
                                nodes: vec![magma_wire::NodeRecord {
                                    id: "bad".to_string(),
                                    ip: Ipv4Addr::LOCALHOST,
                                    port: 0,
                                    start_key: [0u8; 20],
                                    stop_key: [0xffu8; 20],
                                }],
                                has_more: false,
                            }
                        } else {
                            TopologyPage {
                                nodes: vec![magma_wire::NodeRecord {
                                    id: "mock".to_string(),
                                    ip: Ipv4Addr::LOCALHOST,
                                    port,
                                    start_key: [0u8; 20],
                                    stop_key: [0xffu8; 20],
                                }],
                                has_more: false,
                            }
                        };
                        let payload = page.encode();
                        let resp = ResponseHeader {
                            op_type: OpCode::TransmitTopology,
                            transaction_id: req.transaction_id,
                            status: 0,
                            res: 0,
                            err_no: 0,
                            flags: Flags::empty(),
                            payload_len: payload.len() as u32,
                        };
                        let mut out = resp.encode().to_vec();
                        out.extend_from_slice(&payload);
                        out
                    }
                    OpCode::ReadDirExtended => {
                        let cursor_offset = n.saturating_sub(4);
                        let cursor = u32::from_be_bytes(buf[cursor_offset..n].try_into().unwrap_or([0; 4]));
                        let page = magma_wire::ReadDirPage {
                            entries: vec![magma_wire::DirEntry {
                                name: format!("entry-{cursor}"),
                            }],
                            has_more: cursor < 1,
                        };
                        let payload = page.encode();
                        let resp = ResponseHeader {
                            op_type: OpCode::ReadDirExtended,
                            transaction_id: req.transaction_id,
                            status: 0,
                            res: 0,
                            err_no: 0,
                            flags: Flags::empty(),
                            payload_len: payload.len() as u32,
                        };
                        let mut out = resp.encode().to_vec();
                        out.extend_from_slice(&payload);
                        out
                    }
                    _ => continue,
                };
                let _ = socket.send_to(&out, from);
            }
        });

        MockNode {
            port,
            handle: Some(handle),
            stop,
        }
    }
}

impl Drop for MockNode {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
