#![no_main]

use csp_zmqproxy::core::header::{CspCodec, CspVersion, HeaderCodec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Decoding arbitrary bytes must never panic, whatever the version
    let _ = CspCodec::new(CspVersion::V1).decode(data);
    let _ = CspCodec::new(CspVersion::V2).decode(data);
});
