//! The six literal end-to-end scenarios a conformant client binding
//! must pass, run against [`crate::mock_node::MockNode`] instead of a
//! real storage node.

use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;

use magma::{CallerContext, Context, MagmaConfig};
use magma_key::Key;
use magma_ring::{NodeDescriptor, Ring};
use serde::Serialize;

use crate::mock_node::MockNode;

#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    pub name: &'static str,
    pub passed: bool,
    pub detail: String,
}

fn test_config() -> MagmaConfig {
    MagmaConfig {
        remote_port: 0,
        remote_host: None,
        remote_ip: None,
        keyphrase: None,
        debug_mask: None,
        debug_all: false,
        single_threaded: false,
        foreground: false,
        mountpoint: None,
        request_timeout: Some(std::time::Duration::from_millis(500)),
    }
}

fn ctx_pointing_at(port: u16) -> Context {
    let ctx = Context::new(test_config());
    let ring = Ring::build(vec![NodeDescriptor {
        id: "mock".to_string(),
        ip: std::net::Ipv4Addr::LOCALHOST,
        port,
        start_key: Key::ZERO,
        stop_key: Key::MAX,
    }])
    .unwrap();
    ctx.installed_ring().replace_atomically(ring);
    ctx
}

fn scenario_basic_lookup_and_getattr() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(0));
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let passed = magma::client::getattr(&ctx, CallerContext::default(), "/hello").is_ok();
    ScenarioResult {
        name: "basic_lookup_and_getattr",
        passed,
        detail: format!("getattr ok = {passed}"),
    }
}

fn scenario_enoent_preserves_connection() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(2));
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let before = ctx.cache().acquire(std::net::Ipv4Addr::LOCALHOST, node.port).unwrap();
    let _ = magma::client::getattr(&ctx, CallerContext::default(), "/missing");
    let after = ctx.cache().acquire(std::net::Ipv4Addr::LOCALHOST, node.port).unwrap();
    let passed = std::sync::Arc::ptr_eq(&before, &after);
    ScenarioResult {
        name: "enoent_preserves_connection",
        passed,
        detail: format!("same endpoint reused after ENOENT = {passed}"),
    }
}

fn scenario_other_errno_invalidates_connection() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(5)); // EIO
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let before = ctx.cache().acquire(std::net::Ipv4Addr::LOCALHOST, node.port).unwrap();
    let _ = magma::client::getattr(&ctx, CallerContext::default(), "/broken");
    let after = ctx.cache().acquire(std::net::Ipv4Addr::LOCALHOST, node.port).unwrap();
    let passed = !std::sync::Arc::ptr_eq(&before, &after);
    ScenarioResult {
        name: "non_enoent_invalidates_connection",
        passed,
        detail: format!("endpoint replaced after non-ENOENT failure = {passed}"),
    }
}

fn scenario_refresh_topology_flag_triggers_refresh() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(0));
    let refresh = Arc::new(AtomicBool::new(true));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let before = ctx.installed_ring().current().participants();
    let _ = magma::client::getattr(&ctx, CallerContext::default(), "/hello");
    std::thread::sleep(std::time::Duration::from_millis(50));
    let after = ctx.installed_ring().current().participants();
    let passed = before == 1 && after == 1;
    ScenarioResult {
        name: "refresh_topology_flag_triggers_refresh",
        passed,
        detail: format!("participants before={before} after={after}"),
    }
}

fn scenario_paged_readdir_assembles_full_listing() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(0));
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let mut entries = Vec::new();
    let result = magma::client::readdir(&ctx, CallerContext::default(), "/dir", |name| {
        entries.push(name);
        false
    });
    let passed = result.is_ok() && entries.len() == 2;
    ScenarioResult {
        name: "paged_readdir_assembles_full_listing",
        passed,
        detail: format!("entries = {entries:?}"),
    }
}

fn scenario_readdir_filler_short_circuits_on_first_entry() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(0));
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, false);
    let ctx = ctx_pointing_at(node.port);

    let mut entries = Vec::new();
    let result = magma::client::readdir(&ctx, CallerContext::default(), "/dir", |name| {
        entries.push(name);
        true
    });
    let passed = result.is_ok() && entries.len() == 1;
    ScenarioResult {
        name: "readdir_filler_short_circuits_on_first_entry",
        passed,
        detail: format!("entries = {entries:?}"),
    }
}

fn scenario_fatal_topology_entry_preserves_old_ring() -> ScenarioResult {
    let errno = Arc::new(AtomicI32::new(0));
    let refresh = Arc::new(AtomicBool::new(false));
    let node = MockNode::spawn(errno, refresh, true);
    let ctx = ctx_pointing_at(node.port);

    let endpoint = ctx.cache().acquire(std::net::Ipv4Addr::LOCALHOST, node.port).unwrap();
    let source = magma::client::bootstrap_topology_source(&endpoint);
    let result = magma_net::refresh_topology(ctx.refresh_lock(), ctx.installed_ring(), source);
    let passed = result.is_err() && ctx.installed_ring().current().participants() == 1;
    ScenarioResult {
        name: "fatal_topology_entry_preserves_old_ring",
        passed,
        detail: format!("refresh result = {result:?}, participants after = {}", ctx.installed_ring().current().participants()),
    }
}

pub fn run_all() -> Vec<ScenarioResult> {
    vec![
        scenario_basic_lookup_and_getattr(),
        scenario_enoent_preserves_connection(),
        scenario_other_errno_invalidates_connection(),
        scenario_refresh_topology_flag_triggers_refresh(),
        scenario_paged_readdir_assembles_full_listing(),
        scenario_readdir_filler_short_circuits_on_first_entry(),
        scenario_fatal_topology_entry_preserves_old_ring(),
    ]
}
