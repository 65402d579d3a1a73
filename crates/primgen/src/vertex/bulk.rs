//! Uniform vertices inside a named volume, by rejection in its bounding box.
//!
//! With `fiducial_fraction < 1` the box is shrunk symmetrically by the
//! per-axis `δ` from `solve_fiducial_shrink`, so the candidate box keeps that
//! fraction of its volume. An optional material filter keeps only points where
//! the geometry reports the requested material.
//!
//! `avoid_daughters` is accepted and exported but not enforced yet; daughter
//! solids are not excluded from the accepted region.

use nalgebra::{Isometry3, Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ConfigError, SamplingError};
use crate::geometry::GeometryPort;
use crate::sampling::{sample_in_box, solve_fiducial_shrink};

pub const DEFAULT_MAX_TRIES: u64 = 100_000;

fn one() -> f64 {
    1.0
}

fn default_tries() -> u64 {
    DEFAULT_MAX_TRIES
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BulkVolumeDoc {
    pub volume: String,
    #[serde(default = "one")]
    pub fiducial_fraction: f64,
    #[serde(default)]
    pub avoid_daughters: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(default = "default_tries")]
    pub max_tries: u64,
}

#[derive(Clone, Debug)]
pub struct BulkVolume {
    volume: String,
    material: Option<String>,
    avoid_daughters: bool,
    to_world: Isometry3<f64>,
    /// Candidate box in local coordinates, already shrunk.
    lo: Point3<f64>,
    hi: Point3<f64>,
    shrink: f64,
    max_tries: u64,
}

impl BulkVolume {
    pub fn from_doc(doc: &BulkVolumeDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        let f = doc.fiducial_fraction;
        if !(f > 0.0 && f <= 1.0) {
            return Err(ConfigError::invalid(
                "fiducial_fraction",
                format!("{f} is outside (0, 1]"),
            ));
        }
        if doc.max_tries == 0 {
            return Err(ConfigError::invalid("max_tries", "must be > 0"));
        }
        let to_world = geometry.transform_to_world(&doc.volume)?;
        let (lo, hi) = geometry.bounding_box(&doc.volume)?;
        let dims: Vector3<f64> = hi - lo;
        let shrink = if f < 1.0 {
            solve_fiducial_shrink(&dims, f)
        } else {
            0.0
        };
        let half = Vector3::repeat(0.5 * shrink);
        if doc.avoid_daughters {
            tracing::warn!(
                volume = %doc.volume,
                "avoid_daughters is set but daughter volumes are not excluded"
            );
        }
        tracing::debug!(volume = %doc.volume, fraction = f, shrink, "bulk volume configured");
        Ok(Self {
            volume: doc.volume.clone(),
            material: doc.material.clone(),
            avoid_daughters: doc.avoid_daughters,
            to_world,
            lo: lo + half,
            hi: hi - half,
            shrink,
            max_tries: doc.max_tries,
        })
    }

    /// Solved per-axis shrink `δ` (mm); 0 for the full volume.
    pub fn shrink(&self) -> f64 {
        self.shrink
    }

    pub fn candidate_box(&self) -> (Point3<f64>, Point3<f64>) {
        (self.lo, self.hi)
    }

    pub fn avoid_daughters(&self) -> bool {
        self.avoid_daughters
    }

    pub fn shoot<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        geometry: &dyn GeometryPort,
    ) -> Result<Point3<f64>, SamplingError> {
        for _ in 0..self.max_tries {
            let local = sample_in_box(rng, &self.lo, &self.hi);
            if !geometry.point_is_inside(&self.volume, &local)? {
                continue;
            }
            let world = self.to_world * local;
            if let Some(want) = &self.material {
                if geometry.material_at(&world).as_deref() != Some(want.as_str()) {
                    continue;
                }
            }
            return Ok(world);
        }
        tracing::error!(
            volume = %self.volume,
            tries = self.max_tries,
            "bulk vertex sampling exhausted"
        );
        Err(SamplingError::Exhausted {
            volume: self.volume.clone(),
            tries: self.max_tries,
        })
    }

    pub(crate) fn derived(&self) -> Value {
        json!({
            "fiducial_shrink_mm": self.shrink,
            "candidate_box_mm": [super::point_json(&self.lo), super::point_json(&self.hi)],
        })
    }
}
