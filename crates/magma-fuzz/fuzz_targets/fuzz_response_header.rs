#![no_main]
use libfuzzer_sys::fuzz_target;
use magma_wire::ResponseHeader;

fuzz_target!(|data: &[u8]| {
    let _ = ResponseHeader::decode(data);
});
