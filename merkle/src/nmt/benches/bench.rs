use criterion::criterion_main;

mod build;

criterion_main!(build::benches, prove_range::benches);
