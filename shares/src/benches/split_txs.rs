use criterion::{criterion_group, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tessera_shares::compact::split_txs;

fn bench_split_txs(c: &mut Criterion) {
    let mut sampler = StdRng::seed_from_u64(0);
    for count in [10, 1_000, 10_000] {
        let txs: Vec<Vec<u8>> = (0..count)
            .map(|_| vec![0u8; sampler.gen_range(1..500)])
            .collect();
        c.bench_function(&format!("{}/txs={}", module_path!(), count), |b| {
            b.iter(|| split_txs(&txs).unwrap());
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_split_txs
}
