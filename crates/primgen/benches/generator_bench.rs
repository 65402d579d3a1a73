//! Criterion benches for whole-event generation through the registry.
//!
//! Results live under `target/criterion`.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use primgen::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn bench_events(c: &mut Criterion) {
    let mut group = c.benchmark_group("event");
    let geo = VolumeStore::new()
        .with("world", Solid::Box { half: [10_000.0; 3] }, [0.0; 3], "rock")
        .unwrap()
        .with("cube", Solid::Box { half: [1000.0; 3] }, [0.0; 3], "water")
        .unwrap();
    let mixes = [
        (
            "gun_point_x10",
            vec![json!({
                "type": "gun", "label": "gun", "n_particles": 10, "particle": "e-",
                "energy": {"mode": "monoenergetic", "energy": 10.0},
                "direction": {"mode": "isotropic"},
                "vertex_gen": {"type": "point", "config": {"position": [0.0, 0.0, 0.0]}}
            })],
        ),
        (
            "bomb_bulk_fid_x10",
            vec![json!({
                "type": "bomb", "label": "bomb", "n_particles": 10, "particle": "gamma",
                "energy": {"mode": "monoenergetic", "energy": 2.2},
                "direction": {"mode": "isotropic"},
                "vertex_gen": {"type": "bulk", "config": {"volume": "cube", "fiducial_fraction": 0.7}}
            })],
        ),
        (
            "cosmic_plus_decay",
            vec![
                json!({
                    "type": "cosmic", "label": "mu", "n_particles": 1, "particle": "mu-",
                    "energy": {"mode": "custom", "shape": {"kind": "beta_fit", "e_min": 100.0, "e_max": 1e6, "mean": 4000.0, "beta": 0.0}},
                    "direction": {"mode": "sun", "nadir_hist": {"edges": [0.0, 0.5, 1.0], "weights": [1.0, 3.0]}},
                    "vertex_gen": {"type": "boxsurface", "config": {"volume": "cube", "face": 3}}
                }),
                json!({
                    "type": "decay", "label": "pi0", "n_particles": 1, "model": "pi0_decay",
                    "vertex_gen": {"type": "bulk", "config": {"volume": "cube"}}
                }),
            ],
        ),
    ];
    for (name, docs) in mixes {
        let mut reg = GeneratorRegistry::new(ModelRegistry::with_builtin());
        reg.register_all(&docs, &geo).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut sink = EventProvenance::new();
        let mut event_id = 0u64;
        group.bench_function(BenchmarkId::new("generate_primaries", name), |b| {
            b.iter(|| {
                event_id += 1;
                reg.generate_primaries(EventRequest { event_id }, &mut rng, &geo, &mut sink)
                    .unwrap()
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_events);
criterion_main!(benches);
