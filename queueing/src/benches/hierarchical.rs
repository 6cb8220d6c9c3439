use commonware_queueing::mva::hierarchical::{solve, Config};
use criterion::{criterion_group, Criterion};
use std::hint::black_box;

fn bench_solve(c: &mut Criterion) {
    for (groups, nodes_per_group) in [(3, 3), (9, 3), (3, 9)] {
        for population in [10, 50, 200] {
            let cfg = Config {
                groups,
                nodes_per_group,
                service_rate: 5.0,
                population,
            };
            c.bench_function(
                &format!(
                    "{}/groups={groups} nodes_per_group={nodes_per_group} population={population}",
                    module_path!()
                ),
                |b| {
                    b.iter(|| solve(black_box(&cfg)));
                },
            );
        }
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().sample_size(10);
    targets = bench_solve,
}
