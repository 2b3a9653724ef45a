#![no_main]
use libfuzzer_sys::fuzz_target;
use magma_wire::RequestHeader;

fuzz_target!(|data: &[u8]| {
    let _ = RequestHeader::decode(data);
});
