//! Criterion microbenches for the per-draw samplers.
//!
//! - Directions: isotropic, sky (nadir histogram), cosine-law angular.
//! - Vertices: bulk rejection (with and without fiducial shrink), box surface.
//! - Energy: Fermi–Dirac rejection, beta-fit, linear grid.
//!
//! Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Point3;
use primgen::direction::{DirectionDoc, DirectionGenerator};
use primgen::energy::{EnergyDoc, EnergySampler};
use primgen::geometry::{Solid, VolumeStore};
use primgen::sampling::sample_isotropic_direction;
use primgen::vertex::{VertexGenDoc, VertexGenerator};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn store() -> VolumeStore {
    VolumeStore::new()
        .with("world", Solid::Box { half: [10_000.0; 3] }, [0.0; 3], "rock")
        .unwrap()
        .with("tank", Solid::Cylinder { radius: 1500.0, half_z: 2000.0 }, [0.0; 3], "water")
        .unwrap()
}

fn bench_directions(c: &mut Criterion) {
    let mut group = c.benchmark_group("direction");
    let geo = store();
    let mut rng = StdRng::seed_from_u64(1);
    group.bench_function("isotropic", |b| b.iter(|| sample_isotropic_direction(&mut rng)));

    let docs = [
        (
            "sun",
            json!({"mode": "sun", "nadir_hist": {"edges": [0.0, 0.25, 0.5, 0.75, 1.0], "weights": [1.0, 2.0, 4.0, 8.0]}}),
        ),
        ("cos", json!({"mode": "gps_dir", "ang_type": "cos"})),
    ];
    let vertex = Point3::origin();
    for (name, doc) in docs {
        let doc: DirectionDoc = serde_json::from_value(doc).unwrap();
        let gen = DirectionGenerator::from_doc(&doc, &geo).unwrap();
        group.bench_function(BenchmarkId::new("sample", name), |b| {
            b.iter(|| gen.sample(&mut rng, &vertex))
        });
    }
    group.finish();
}

fn bench_vertices(c: &mut Criterion) {
    let mut group = c.benchmark_group("vertex");
    let geo = store();
    let mut rng = StdRng::seed_from_u64(2);
    let docs = [
        ("bulk_full", json!({"type": "bulk", "config": {"volume": "tank"}})),
        (
            "bulk_fid50",
            json!({"type": "bulk", "config": {"volume": "tank", "fiducial_fraction": 0.5}}),
        ),
        (
            "bulk_material",
            json!({"type": "bulk", "config": {"volume": "world", "material": "water"}}),
        ),
        ("boxsurface", json!({"type": "boxsurface", "config": {"volume": "tank"}})),
    ];
    for (name, doc) in docs {
        let doc: VertexGenDoc = serde_json::from_value(doc).unwrap();
        let gen = VertexGenerator::from_doc(&doc, &geo).unwrap();
        group.bench_function(BenchmarkId::new("shoot", name), |b| {
            b.iter(|| gen.shoot_vertex(&mut rng, &geo, 0).unwrap())
        });
    }
    group.finish();
}

fn bench_energy(c: &mut Criterion) {
    let mut group = c.benchmark_group("energy");
    let mut rng = StdRng::seed_from_u64(3);
    let docs = [
        (
            "fermi_dirac",
            json!({"mode": "custom", "shape": {"kind": "fermi_dirac", "e_min": 0.0, "e_max": 50.0, "temperature": 4.0}}),
        ),
        (
            "beta_fit",
            json!({"mode": "custom", "shape": {"kind": "beta_fit", "e_min": 0.0, "e_max": 60.0, "mean": 12.0, "beta": 2.5}}),
        ),
        (
            "grid",
            json!({"mode": "custom", "shape": {"kind": "grid", "energies": [0.0, 5.0, 10.0, 20.0], "weights": [0.0, 3.0, 2.0, 0.0]}}),
        ),
    ];
    for (name, doc) in docs {
        let doc: EnergyDoc = serde_json::from_value(doc).unwrap();
        let sampler = EnergySampler::from_doc(&doc).unwrap();
        group.bench_function(BenchmarkId::new("sample", name), |b| {
            b.iter(|| sampler.sample_energy(&mut rng).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_directions, bench_vertices, bench_energy);
criterion_main!(benches);
