use criterion::{black_box, criterion_group, criterion_main, Criterion};
use magma_wire::{Flags, OpCode, RequestHeader, ResponseHeader};

fn bench_header_codec(c: &mut Criterion) {
    let request = RequestHeader {
        op_type: OpCode::GetAttr,
        transaction_id: 42,
        ttl: 16,
        uid: 1000,
        gid: 1000,
        flags: Flags::empty(),
        payload_len: 256,
    };

    c.bench_function("request_header_encode", |b| {
        b.iter(|| black_box(request.encode()))
    });

    let encoded = request.encode();
    c.bench_function("request_header_decode", |b| {
        b.iter(|| RequestHeader::decode(black_box(&encoded)).unwrap())
    });

    let response = ResponseHeader {
        op_type: OpCode::GetAttr,
        transaction_id: 42,
        status: 0,
        res: 0,
        err_no: 0,
        flags: Flags::REFRESH_TOPOLOGY,
        payload_len: 128,
    };
    let encoded_resp = response.encode();
    c.bench_function("response_header_decode", |b| {
        b.iter(|| ResponseHeader::decode(black_box(&encoded_resp)).unwrap())
    });
}

criterion_group!(benches, bench_header_codec);
criterion_main!(benches);
