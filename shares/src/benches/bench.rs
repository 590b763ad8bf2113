use criterion::criterion_main;

mod split_txs;

criterion_main!(create_commitment::benches, split_txs::benches);
