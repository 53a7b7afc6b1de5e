#![no_main]

use bytes::Bytes;
use csp_zmqproxy::utils::capture_log::split_records;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let records = split_records(Bytes::copy_from_slice(data));
    let total: usize = records.iter().map(|r| r.len()).sum();
    assert!(total <= data.len());
});
