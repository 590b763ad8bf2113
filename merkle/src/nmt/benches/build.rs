use criterion::{criterion_group, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tessera_merkle::nmt::{Hasher, Tree};

const NAMESPACE_SIZE: usize = 29;
const LEAF_SIZE: usize = NAMESPACE_SIZE + 512;

fn bench_build(c: &mut Criterion) {
    for n in [64, 256, 1_024, 4_096] {
        let mut sampler = StdRng::seed_from_u64(0);
        let mut leaves: Vec<Vec<u8>> = (0..n)
            .map(|_| {
                let mut leaf = vec![0u8; LEAF_SIZE];
                sampler.fill(&mut leaf[..]);
                leaf
            })
            .collect();
        leaves.sort();

        c.bench_function(&format!("{}/n={}", module_path!(), n), |b| {
            b.iter(|| {
                let mut tree = Tree::<NAMESPACE_SIZE>::with_capacity(Hasher::default(), n);
                for leaf in &leaves {
                    tree.push(leaf).unwrap();
                }
                tree.root().unwrap()
            })
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_build
}
