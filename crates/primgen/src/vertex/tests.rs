use super::*;
use crate::geometry::{Placement, Solid, Volume, VolumeStore};
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn cube_store() -> VolumeStore {
    VolumeStore::new()
        .with(
            "world",
            Solid::Box {
                half: [10_000.0; 3],
            },
            [0.0; 3],
            "rock",
        )
        .unwrap()
        .with(
            "cube",
            Solid::Box {
                half: [1000.0; 3],
            },
            [0.0; 3],
            "water",
        )
        .unwrap()
}

fn vertex(doc: serde_json::Value, geo: &VolumeStore) -> VertexGenerator {
    let doc: VertexGenDoc = serde_json::from_value(doc).unwrap();
    VertexGenerator::from_doc(&doc, geo).unwrap()
}

#[test]
fn point_cycles_positions_by_event_index() {
    let geo = VolumeStore::new()
        .with("det", Solid::Sphere { radius: 10.0 }, [0.0, 0.0, 100.0], "lab")
        .unwrap();
    let v = vertex(
        json!({"type": "point", "config": {
            "positions": [[0.0, 0.0, 0.0], {"val": [1.0, 0.0, 0.0], "unit": "cm"}],
            "volume": "det"
        }}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(0);
    let p0 = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
    let p1 = v.shoot_vertex(&mut rng, &geo, 1).unwrap();
    let p2 = v.shoot_vertex(&mut rng, &geo, 2).unwrap();
    assert_eq!(p0, Point3::new(0.0, 0.0, 100.0));
    assert_eq!(p1, Point3::new(10.0, 0.0, 100.0));
    assert_eq!(p2, p0);
    assert_eq!(v.exposed_area(), None);
}

#[test]
fn point_without_position_is_config_error() {
    let geo = cube_store();
    let doc: VertexGenDoc =
        serde_json::from_value(json!({"type": "point", "config": {}})).unwrap();
    let err = VertexGenerator::from_doc(&doc, &geo).unwrap_err();
    assert!(err.to_string().contains("config.position"), "{err}");
}

#[test]
fn point_with_position_and_positions_is_rejected() {
    let geo = cube_store();
    let doc: VertexGenDoc = serde_json::from_value(json!({"type": "point", "config": {
        "position": [0.0, 0.0, 0.0],
        "positions": [[1.0, 0.0, 0.0], [2.0, 0.0, 0.0]]
    }}))
    .unwrap();
    let err = VertexGenerator::from_doc(&doc, &geo).unwrap_err();
    assert!(err.to_string().contains("config.positions"), "{err}");
}

#[test]
fn bulk_full_fraction_stays_inside_sphere() {
    let geo = VolumeStore::new()
        .with("ball", Solid::Sphere { radius: 500.0 }, [100.0, 0.0, 0.0], "scint")
        .unwrap();
    let v = vertex(
        json!({"type": "bulk", "config": {"volume": "ball"}}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(8);
    for _ in 0..5000 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        let local = p - Point3::new(100.0, 0.0, 0.0);
        assert!(local.norm() <= 500.0 + 1e-9);
    }
}

#[test]
fn bulk_half_fraction_respects_solved_shrink() {
    let geo = cube_store();
    let v = vertex(
        json!({"type": "bulk", "config": {"volume": "cube", "fiducial_fraction": 0.5}}),
        &geo,
    );
    let VertexStrategy::Bulk(bulk) = v.strategy() else {
        panic!("expected bulk strategy");
    };
    let delta = bulk.shrink();
    let want = 2000.0 * (1.0 - 0.5f64.cbrt());
    assert!((delta - want).abs() < 1e-6);
    let limit = 1000.0 - delta / 2.0;
    let mut rng = StdRng::seed_from_u64(21);
    for _ in 0..10_000 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        for i in 0..3 {
            assert!(p[i].abs() <= limit + 1e-9, "{p:?} outside ±{limit}");
        }
    }
}

#[test]
fn bulk_range_shrinks_with_fraction() {
    let geo = cube_store();
    let mut previous = f64::INFINITY;
    for fraction in [1.0, 0.8, 0.5, 0.2] {
        let v = vertex(
            json!({"type": "bulk", "config": {"volume": "cube", "fiducial_fraction": fraction}}),
            &geo,
        );
        let mut rng = StdRng::seed_from_u64(3);
        let extent = (0..2000)
            .map(|_| {
                let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
                p.x.abs().max(p.y.abs()).max(p.z.abs())
            })
            .fold(0.0, f64::max);
        assert!(extent < previous, "fraction {fraction}: {extent} >= {previous}");
        previous = extent;
    }
}

#[test]
fn bulk_material_filter_selects_inner_volume() {
    let geo = cube_store()
        .with("core", Solid::Sphere { radius: 300.0 }, [0.0; 3], "lead")
        .unwrap();
    let v = vertex(
        json!({"type": "bulk", "config": {"volume": "cube", "material": "lead"}}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(4);
    for _ in 0..500 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        assert!(p.coords.norm() <= 300.0 + 1e-9);
    }
}

#[test]
fn bulk_impossible_material_exhausts() {
    let geo = cube_store();
    let v = vertex(
        json!({"type": "bulk", "config": {"volume": "cube", "material": "gold", "max_tries": 50}}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(4);
    let err = v.shoot_vertex(&mut rng, &geo, 0).unwrap_err();
    assert!(matches!(err, SamplingError::Exhausted { tries: 50, .. }));
}

#[test]
fn bulk_rejects_bad_fraction_and_unknown_volume() {
    let geo = cube_store();
    for config in [
        json!({"volume": "cube", "fiducial_fraction": 0.0}),
        json!({"volume": "cube", "fiducial_fraction": 1.5}),
        json!({"volume": "nowhere"}),
    ] {
        let doc: VertexGenDoc =
            serde_json::from_value(json!({"type": "bulk", "config": config})).unwrap();
        assert!(VertexGenerator::from_doc(&doc, &geo).is_err());
    }
}

#[test]
fn box_surface_fixed_face_lies_on_face() {
    let geo = cube_store();
    for face in 0..6u8 {
        let v = vertex(
            json!({"type": "boxsurface", "config": {"volume": "cube", "face": face, "tolerance": 5.0}}),
            &geo,
        );
        let axis = (face / 2) as usize;
        let offset = if face % 2 == 0 { -1000.0 } else { 1000.0 };
        let mut rng = StdRng::seed_from_u64(face as u64);
        for _ in 0..500 {
            let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
            assert!((p[axis] - offset).abs() < 1e-9);
            for i in (0..3).filter(|&i| i != axis) {
                assert!(p[i].abs() <= 1005.0);
            }
        }
    }
}

#[test]
fn box_surface_random_faces_follow_area() {
    let geo = VolumeStore::new()
        .with(
            "slab",
            Solid::Box {
                half: [100.0, 200.0, 400.0],
            },
            [0.0; 3],
            "air",
        )
        .unwrap();
    let v = vertex(
        json!({"type": "boxsurface", "config": {"volume": "slab"}}),
        &geo,
    );
    let VertexStrategy::BoxSurface(s) = v.strategy() else {
        panic!("expected box surface");
    };
    let areas = s.face_areas();
    let total = s.total_area();
    assert_eq!(v.exposed_area(), Some(total));

    let mut counts = [0usize; 6];
    let n = 60_000;
    let mut rng = StdRng::seed_from_u64(77);
    for _ in 0..n {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        let face = if (p.x + 100.0).abs() < 1e-9 {
            0
        } else if (p.x - 100.0).abs() < 1e-9 {
            1
        } else if (p.y + 200.0).abs() < 1e-9 {
            2
        } else if (p.y - 200.0).abs() < 1e-9 {
            3
        } else if (p.z + 400.0).abs() < 1e-9 {
            4
        } else {
            5
        };
        counts[face] += 1;
    }
    for f in 0..6 {
        let want = areas[f] / total;
        let got = counts[f] as f64 / n as f64;
        assert!((got - want).abs() < 0.01, "face {f}: {got} vs {want}");
    }
}

#[test]
fn box_surface_face_out_of_range_rejected() {
    let geo = cube_store();
    let doc: VertexGenDoc = serde_json::from_value(
        json!({"type": "boxsurface", "config": {"volume": "cube", "face": 6}}),
    )
    .unwrap();
    assert!(VertexGenerator::from_doc(&doc, &geo).is_err());
}

#[test]
fn box_surface_follows_rotated_placement() {
    let mut geo = VolumeStore::new();
    geo.add(Volume {
        name: "tilted".into(),
        solid: Solid::Box {
            half: [10.0, 20.0, 30.0],
        },
        placement: Placement {
            translation: [0.0, 0.0, 500.0],
            rotation: [0.0, 0.0, std::f64::consts::FRAC_PI_2],
        },
        material: "air".into(),
    })
    .unwrap();
    let v = vertex(
        json!({"type": "boxsurface", "config": {"volume": "tilted", "face": 1}}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(1);
    // Local +x face maps to world +y after the 90° turn about z.
    for _ in 0..100 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        assert!((p.y - 10.0).abs() < 1e-9);
    }
}

#[test]
fn positional_circle_lies_in_rotated_plane() {
    let geo = cube_store();
    let v = vertex(
        json!({"type": "gps_pos", "config": {
            "shape": "circle",
            "radius": {"val": 1.0, "unit": "m"},
            "centre": [0.0, 0.0, 2000.0],
            "rot1": [0.0, 1.0, 0.0],
            "rot2": [0.0, 0.0, 1.0]
        }}),
        &geo,
    );
    let area = v.exposed_area().unwrap();
    assert!((area - std::f64::consts::PI * 1e6).abs() < 1e-3);
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..1000 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        // Plane spanned by y and z: x stays 0.
        assert!(p.x.abs() < 1e-9);
        let r = ((p.y).powi(2) + (p.z - 2000.0).powi(2)).sqrt();
        assert!(r <= 1000.0 + 1e-9);
    }
}

#[test]
fn positional_confine_keeps_points_inside() {
    let geo = cube_store();
    let v = vertex(
        json!({"type": "gps_pos", "config": {
            "shape": "sphere",
            "radius": 1500.0,
            "confine": "cube"
        }}),
        &geo,
    );
    let mut rng = StdRng::seed_from_u64(12);
    for _ in 0..2000 {
        let p = v.shoot_vertex(&mut rng, &geo, 0).unwrap();
        for i in 0..3 {
            assert!(p[i].abs() <= 1000.0 + 1e-9);
        }
    }
}

#[test]
fn positional_parallel_frame_rejected() {
    let geo = cube_store();
    let doc: VertexGenDoc = serde_json::from_value(json!({"type": "gps_pos", "config": {
        "shape": "square", "halfx": 1.0, "rot1": [1.0, 0.0, 0.0], "rot2": [2.0, 0.0, 0.0]
    }}))
    .unwrap();
    assert!(VertexGenerator::from_doc(&doc, &geo).is_err());
}

#[test]
fn time_section_is_owned_by_vertex() {
    let geo = cube_store();
    let v = vertex(
        json!({"type": "point", "config": {"position": [0.0, 0.0, 0.0]},
               "time": {"mode": "window", "t_min": 0.0, "t_max": {"val": 1.0, "unit": "ms"}}}),
        &geo,
    );
    assert_eq!(v.time_generator().total_window(), 1e6);
    assert_eq!(v.derived()["time_window_ns"], json!(1e6));
}

#[test]
fn unknown_vertex_type_rejected() {
    let res: Result<VertexGenDoc, _> =
        serde_json::from_value(json!({"type": "torus", "config": {}}));
    assert!(res.is_err());
}
