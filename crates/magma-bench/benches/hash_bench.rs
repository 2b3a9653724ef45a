use criterion::{black_box, criterion_group, criterion_main, Criterion};
use magma_key::Key;

fn bench_hash(c: &mut Criterion) {
    c.bench_function("key_hash_short_path", |b| {
        b.iter(|| Key::hash(black_box(b"/home/user/file.txt")))
    });

    c.bench_function("key_armour", |b| {
        let key = Key::hash(b"/home/user/file.txt");
        b.iter(|| black_box(key.armour()))
    });
}

criterion_group!(benches, bench_hash);
criterion_main!(benches);
