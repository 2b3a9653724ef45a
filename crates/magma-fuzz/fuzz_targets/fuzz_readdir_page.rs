#![no_main]
use libfuzzer_sys::fuzz_target;
use magma_wire::ReadDirPage;

fuzz_target!(|data: &[u8]| {
    let _ = ReadDirPage::decode(data);
});
