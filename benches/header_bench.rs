use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use csp_zmqproxy::core::header::{CspCodec, CspHeader, CspVersion, HeaderCodec};
use csp_zmqproxy::utils::capture_log::{split_records, DELIMITER};

#[allow(clippy::unwrap_used)]
fn bench_header_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("header_decode");
    let header = CspHeader {
        pri: 2,
        src: 10,
        dst: 20,
        dport: 15,
        sport: 33,
        flags: 0x0A,
        length: 0,
    };

    for version in [CspVersion::V1, CspVersion::V2] {
        let codec = CspCodec::new(version);
        let mut frame = header.to_bytes(version);
        frame.resize(256, 0xAB);

        group.throughput(Throughput::Elements(1));
        group.bench_function(format!("decode_v{}", version.tag()), |b| {
            b.iter(|| {
                let decoded = codec.decode(black_box(&frame)).unwrap();
                black_box(decoded);
            })
        });
        group.bench_function(format!("decode_and_format_v{}", version.tag()), |b| {
            b.iter(|| {
                let decoded = codec.decode(black_box(&frame)).unwrap();
                black_box(decoded.to_string());
            })
        });
    }

    group.finish();
}

fn bench_split_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("capture_log_split");
    let record_counts = [10usize, 1_000, 10_000];

    for &count in &record_counts {
        let mut log = Vec::with_capacity(count * (DELIMITER.len() + 64));
        for i in 0..count {
            log.extend_from_slice(DELIMITER);
            log.extend(std::iter::repeat((i % 251) as u8 & 0x7F).take(64));
        }
        let log = Bytes::from(log);

        group.throughput(Throughput::Bytes(log.len() as u64));
        group.bench_function(format!("split_{count}_records"), |b| {
            b.iter(|| black_box(split_records(log.clone())))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_header_decode, bench_split_records);
criterion_main!(benches);
