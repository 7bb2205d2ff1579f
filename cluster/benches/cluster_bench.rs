use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hotspot_cluster::{
    LatticeIndex, MeanShiftParams, SingleLinkage3d, dbscan, lattice_distance, merge_clusters,
    neighbor_merge, single_linkage_3d, weighted_mean_shift,
};
use hotspot_vptree::Euclidean;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Gaussian-ish blobs: `k` centers, `per` points each.
fn blobs(k: usize, per: usize, seed: u64) -> Vec<[f64; 3]> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut out = Vec::with_capacity(k * per);
    for _ in 0..k {
        let c = [
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
        ];
        for _ in 0..per {
            let mut p = c;
            for x in &mut p {
                *x += rng.gen_range(-2.0..2.0) + rng.gen_range(-2.0..2.0);
            }
            out.push(p);
        }
    }
    out
}

fn bench_neighbor_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("neighbor_merge");
    for n in [1_000, 5_000] {
        let points = blobs(20, n / 20, 1);
        group.bench_with_input(BenchmarkId::from_parameter(n), &points, |b, points| {
            b.iter(|| neighbor_merge(points.iter().copied(), Euclidean, black_box(1.5)).count());
        });
    }
    group.finish();
}

fn bench_dbscan(c: &mut Criterion) {
    let points = blobs(20, 250, 2);
    c.bench_function("dbscan_5k", |b| {
        b.iter(|| dbscan(points.iter().copied(), Euclidean, black_box(1.5), 4).into_labels());
    });
}

fn bench_mean_shift(c: &mut Criterion) {
    let points = blobs(10, 100, 3);
    c.bench_function("mean_shift_1k", |b| {
        b.iter(|| {
            weighted_mean_shift(
                points.iter().copied(),
                |_: &[f64; 3]| 1.0,
                Euclidean,
                Euclidean,
                MeanShiftParams::new(black_box(6.0)),
            )
            .map(|c| c.count())
        });
    });
}

fn bench_single_linkage(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(4);
    let voxels: Vec<LatticeIndex> = (0..4_000)
        .map(|_| {
            [
                rng.gen_range(0..40),
                rng.gen_range(0..40),
                rng.gen_range(0..40),
            ]
        })
        .collect();
    let params = SingleLinkage3d::new(1.8);
    c.bench_function("single_linkage_3d_4k", |b| {
        b.iter(|| {
            let voxels = voxels.iter().copied();
            single_linkage_3d(voxels, |_| Some(()), lattice_distance, &params).len()
        });
    });
}

fn bench_merge_clusters(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(5);
    let clusters: Vec<(Vec<u32>, usize)> = (0..500)
        .map(|i| {
            let start = rng.gen_range(0..20_000u32);
            ((start..start + rng.gen_range(10..200)).collect(), i % 8)
        })
        .collect();
    c.bench_function("merge_clusters_500", |b| {
        b.iter(|| merge_clusters(black_box(&clusters), 0.5).len());
    });
}

criterion_group!(
    benches,
    bench_neighbor_merge,
    bench_dbscan,
    bench_mean_shift,
    bench_single_linkage,
    bench_merge_clusters
);
criterion_main!(benches);
