#![no_main]
use libfuzzer_sys::fuzz_target;
use magma_wire::TopologyPage;

fuzz_target!(|data: &[u8]| {
    let _ = TopologyPage::decode(data);
});
