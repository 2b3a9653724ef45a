use criterion::{black_box, criterion_group, criterion_main, Criterion};
use magma_key::Key;
use magma_ring::{NodeDescriptor, Ring};
use std::net::Ipv4Addr;

fn build_ring(participants: u8) -> Ring {
    let step = 256 / participants as u32;
    let nodes = (0..participants)
        .map(|i| {
            let start = (i as u32 * step) as u8;
            let stop = if i + 1 == participants {
                0xff
            } else {
                ((i as u32 + 1) * step - 1) as u8
            };
            NodeDescriptor {
                id: format!("node-{i}"),
                ip: Ipv4Addr::new(10, 0, 0, i),
                port: 12000,
                start_key: Key::from_bytes([start; 20]),
                stop_key: Key::from_bytes([stop; 20]),
            }
        })
        .collect();
    Ring::build(nodes).unwrap()
}

fn bench_lookup(c: &mut Criterion) {
    let ring = build_ring(32);
    let key = Key::hash(b"/some/deep/path/to/a/file");
    c.bench_function("ring_lookup_32_nodes", |b| {
        b.iter(|| ring.lookup(black_box(key)))
    });
}

criterion_group!(benches, bench_lookup);
criterion_main!(benches);
