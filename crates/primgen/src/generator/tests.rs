use super::*;
use crate::error::SamplingError;
use crate::geometry::{Solid, VolumeStore};
use crate::provenance::EventProvenance;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn lab() -> VolumeStore {
    VolumeStore::new()
        .with("world", Solid::Box { half: [5000.0; 3] }, [0.0; 3], "air")
        .unwrap()
        .with("target", Solid::Box { half: [100.0; 3] }, [0.0, 0.0, 500.0], "lead")
        .unwrap()
}

fn gun_doc() -> Value {
    json!({
        "type": "gun",
        "label": "beam",
        "n_particles": 3,
        "particle": "e-",
        "energy": {"mode": "monoenergetic", "energy": {"val": 2.0, "unit": "GeV"}},
        "direction": {"mode": "fixed", "dir": [0.0, 0.0, 2.0]},
        "vertex_gen": {"type": "point", "config": {"position": [0.0, 0.0, -100.0]}}
    })
}

fn build(doc: &Value, geo: &VolumeStore) -> Result<ParticleGenerator, ConfigError> {
    ParticleGenerator::from_doc("beam", doc, geo, &ModelRegistry::with_builtin())
}

fn run(gen: &mut ParticleGenerator, geo: &VolumeStore, seed: u64) -> (Vec<PrimaryVertex>, EventProvenance) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut sink = EventProvenance::new();
    sink.begin_event(7);
    let mut ctx = EventContext {
        request: EventRequest { event_id: 7 },
        rng: &mut rng,
        geometry: geo,
        sink: &mut sink,
    };
    let out = gen.generate(&mut ctx).unwrap();
    (out, sink)
}

#[test]
fn kind_names_round_trip() {
    for kind in GeneratorKind::ALL {
        assert_eq!(GeneratorKind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(GeneratorKind::parse("laser"), None);
}

#[test]
fn gun_emits_one_vertex_per_particle() {
    let geo = lab();
    let mut gen = build(&gun_doc(), &geo).unwrap();
    let (vertices, sink) = run(&mut gen, &geo, 1);
    assert_eq!(vertices.len(), 3);
    assert_eq!(sink.len(), 3);
    for (v, rec) in vertices.iter().zip(&sink.records) {
        assert_eq!(v.position, Point3::new(0.0, 0.0, -100.0));
        let p = &v.particles[0];
        assert!((p.kinetic_energy - 2000.0).abs() < 1e-9);
        let expected = p.species.momentum_magnitude(2000.0);
        assert!((p.momentum - Vector3::new(0.0, 0.0, expected)).norm() < 1e-9);
        assert_eq!(rec.label, "beam");
        assert_eq!(rec.generator_code, GeneratorKind::Gun.code());
        assert_eq!(rec.direction, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn bomb_shares_one_vertex() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["type"] = json!("bomb");
    doc["n_particles"] = json!(4);
    doc["direction"] = json!({"mode": "isotropic"});
    doc["vertex_gen"] = json!({"type": "bulk", "config": {"volume": "target"}});
    let mut gen = build(&doc, &geo).unwrap();
    let (vertices, sink) = run(&mut gen, &geo, 3);
    assert_eq!(vertices.len(), 1);
    assert_eq!(vertices[0].particles.len(), 4);
    assert_eq!(sink.len(), 4);
    let p = vertices[0].position;
    assert!(p.x.abs() <= 100.0 && p.y.abs() <= 100.0 && (p.z - 500.0).abs() <= 100.0);
}

#[test]
fn missing_sections_are_named() {
    let geo = lab();
    for field in ["particle", "energy", "direction", "vertex_gen", "n_particles"] {
        let mut doc = gun_doc();
        doc.as_object_mut().unwrap().remove(field);
        let err = build(&doc, &geo).err().unwrap();
        assert!(
            matches!(&err, ConfigError::Missing { field: f } if f == field),
            "{field}: {err}"
        );
    }
}

#[test]
fn unknown_type_and_model_are_rejected() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["type"] = json!("laser");
    assert!(matches!(build(&doc, &geo), Err(ConfigError::UnknownKind(k)) if k == "laser"));

    let doc = json!({
        "type": "decay",
        "n_particles": 1,
        "model": "k0_decay",
        "vertex_gen": {"type": "point", "config": {"position": [0.0, 0.0, 0.0]}}
    });
    assert!(matches!(build(&doc, &geo), Err(ConfigError::UnknownModel(m)) if m == "k0_decay"));
}

#[test]
fn vertex_errors_carry_section_prefix() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["vertex_gen"] = json!({"type": "bulk", "config": {"volume": "target", "fiducial_fraction": 1.5}});
    let err = build(&doc, &geo).err().unwrap();
    assert!(err.to_string().contains("vertex_gen.config.fiducial_fraction"), "{err}");
}

#[test]
fn random_polarization_is_transverse() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["particle"] = json!(22);
    doc["polarization"] = json!("random");
    doc["direction"] = json!({"mode": "isotropic"});
    let mut gen = build(&doc, &geo).unwrap();
    let (vertices, _) = run(&mut gen, &geo, 11);
    for v in &vertices {
        let p = &v.particles[0];
        let pol = p.polarization.unwrap();
        assert!((pol.norm() - 1.0).abs() < 1e-9);
        assert!(pol.dot(&p.momentum.normalize()).abs() < 1e-9);
    }
}

#[test]
fn decay_emits_model_products_on_one_vertex() {
    let geo = lab();
    let doc = json!({
        "type": "decay",
        "n_particles": 2,
        "model": "pi0_decay",
        "vertex_gen": {
            "type": "point",
            "config": {"position": [1.0, 2.0, 3.0]},
            "time": {"mode": "fixed", "time": {"val": 5.0, "unit": "ns"}}
        }
    });
    let mut gen = build(&doc, &geo).unwrap();
    let (vertices, sink) = run(&mut gen, &geo, 5);
    assert_eq!(vertices.len(), 2);
    assert_eq!(sink.len(), 4);
    for v in &vertices {
        assert_eq!(v.time, 5.0);
        assert_eq!(v.particles.len(), 2);
        assert!(v.particles.iter().all(|p| p.species.name == "gamma"));
    }
    assert!(sink.records.iter().all(|r| r.generator_code == GeneratorKind::Decay.code()));
}

struct Broken;

impl FinalStateModel for Broken {
    fn generate(
        &self,
        _rng: &mut dyn RngCore,
        _vertex: &Point3<f64>,
        _time: f64,
    ) -> Result<Vec<FinalStateParticle>, String> {
        Err("no channel open".into())
    }
}

#[test]
fn model_failure_surfaces_as_sampling_error() {
    let geo = lab();
    let mut models = ModelRegistry::new();
    models.insert("broken", Broken);
    let doc = json!({
        "type": "reaction",
        "n_particles": 1,
        "model": "broken",
        "vertex_gen": {"type": "point", "config": {"position": [0.0, 0.0, 0.0]}}
    });
    let mut gen = ParticleGenerator::from_doc("rx", &doc, &geo, &models).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let mut sink = EventProvenance::new();
    let mut ctx = EventContext {
        request: EventRequest::default(),
        rng: &mut rng,
        geometry: &geo,
        sink: &mut sink,
    };
    let err = gen.generate(&mut ctx).unwrap_err();
    assert!(matches!(err, SamplingError::Model { model, .. } if model == "broken"));
}

#[test]
fn flux_count_is_poisson_with_configured_mean() {
    let geo = lab();
    // 1e-3 /mm²/ns · (20 mm)² · 10 ns = 4 per event.
    let doc = json!({
        "type": "flux",
        "particle": "mu-",
        "flux": {"val": 1e-3, "unit": "1/mm2/ns"},
        "energy": {"mode": "monoenergetic", "energy": 1000.0},
        "direction": {"mode": "gps_dir", "ang_type": "cos"},
        "vertex_gen": {
            "type": "gps_pos",
            "config": {"shape": "square", "halfx": 10.0, "centre": [0.0, 0.0, 1000.0]},
            "time": {"mode": "window", "t_min": 0.0, "t_max": 10.0}
        }
    });
    let mut gen = build(&doc, &geo).unwrap();
    assert!((gen.expected_count() - 4.0).abs() < 1e-9);

    let mut rng = StdRng::seed_from_u64(99);
    let mut sink = EventProvenance::new();
    let events = 4000;
    let mut total = 0usize;
    for id in 0..events {
        sink.begin_event(id);
        let mut ctx = EventContext {
            request: EventRequest { event_id: id },
            rng: &mut rng,
            geometry: &geo,
            sink: &mut sink,
        };
        let out = gen.generate(&mut ctx).unwrap();
        assert!(out.iter().all(|v| (0.0..=10.0).contains(&v.time)));
        total += out.len();
    }
    let mean = total as f64 / events as f64;
    assert!((mean - 4.0).abs() < 0.15, "mean {mean}");
}

#[test]
fn flux_without_area_is_rejected() {
    let geo = lab();
    let doc = json!({
        "type": "flux",
        "particle": "mu-",
        "flux": 1.0,
        "energy": {"mode": "monoenergetic", "energy": 1000.0},
        "direction": {"mode": "isotropic"},
        "vertex_gen": {
            "type": "point",
            "config": {"position": [0.0, 0.0, 0.0]},
            "time": {"mode": "window", "t_min": 0.0, "t_max": 10.0}
        }
    });
    let err = build(&doc, &geo).err().unwrap();
    assert!(matches!(err, ConfigError::Invalid { field, .. } if field == "vertex_gen"));
}

#[test]
fn describe_exports_normalized_doc_that_rebuilds() {
    let geo = lab();
    let mut gen = build(&gun_doc(), &geo).unwrap();
    let exported = gen.describe();
    assert_eq!(exported["type"], "gun");
    assert_eq!(exported["label"], "beam");
    assert_eq!(exported["derived"]["expected_count_per_event"], 3.0);
    assert!(exported["derived"]["vertex"].is_object());

    let mut rebuilt = build(&exported, &geo).unwrap();
    let (a, _) = run(&mut gen, &geo, 42);
    let (b, _) = run(&mut rebuilt, &geo, 42);
    assert_eq!(a, b);
}

#[test]
fn zero_energy_gun_keeps_sampled_direction() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["energy"] = json!({"mode": "monoenergetic", "energy": 0.0});
    let mut gen = build(&doc, &geo).unwrap();
    let (vertices, sink) = run(&mut gen, &geo, 1);
    assert_eq!(sink.len(), 3);
    for (v, rec) in vertices.iter().zip(&sink.records) {
        assert_eq!(v.particles[0].momentum, Vector3::zeros());
        assert_eq!(rec.energy, 0.0);
        assert_eq!(rec.direction, [0.0, 0.0, 1.0]);
    }
}

#[test]
fn failed_generate_records_nothing() {
    let geo = lab();
    let mut doc = gun_doc();
    doc["vertex_gen"] = json!({"type": "bulk", "config": {"volume": "target", "material": "gold", "max_tries": 10}});
    let mut gen = build(&doc, &geo).unwrap();
    let mut rng = StdRng::seed_from_u64(0);
    let mut sink = EventProvenance::new();
    sink.begin_event(1);
    let mut ctx = EventContext {
        request: EventRequest { event_id: 1 },
        rng: &mut rng,
        geometry: &geo,
        sink: &mut sink,
    };
    assert!(gen.generate(&mut ctx).is_err());
    assert!(sink.is_empty());
}
