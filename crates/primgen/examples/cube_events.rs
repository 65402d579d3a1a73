//! Generate a few events from a water cube and print them as JSON lines.
//!
//! Run: `cargo run -p primgen --example cube_events`

use primgen::prelude::*;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let geo = VolumeStore::new()
        .with("hall", Solid::Box { half: [5000.0; 3] }, [0.0; 3], "air")?
        .with("cube", Solid::Box { half: [1000.0; 3] }, [0.0; 3], "water")?;

    let docs = [
        json!({
            "type": "bomb",
            "label": "gammas",
            "n_particles": 3,
            "particle": "gamma",
            "energy": {"mode": "monoenergetic", "energy": {"val": 2.2, "unit": "MeV"}},
            "direction": {"mode": "isotropic"},
            "vertex_gen": {"type": "bulk", "config": {"volume": "cube", "fiducial_fraction": 0.5}}
        }),
        json!({
            "type": "cosmic",
            "label": "muons",
            "n_particles": 1,
            "particle": "mu-",
            "energy": {"mode": "monoenergetic", "energy": {"val": 4.0, "unit": "GeV"}},
            "direction": {"mode": "sun", "nadir_hist": {"edges": [0.0, 0.5, 1.0], "weights": [1.0, 3.0]}},
            "vertex_gen": {"type": "boxsurface", "config": {"volume": "cube", "face": 3}}
        }),
    ];
    let mut reg = GeneratorRegistry::new(ModelRegistry::with_builtin());
    reg.register_all(&docs, &geo)?;

    let mut rng = StdRng::seed_from_u64(2024);
    let mut sink = EventProvenance::new();
    for event_id in 0..3 {
        let vertices = reg.generate_primaries(EventRequest { event_id }, &mut rng, &geo, &mut sink)?;
        let line = json!({"event": event_id, "vertices": vertices, "provenance": sink.records});
        println!("{line}");
    }
    Ok(())
}
