//! Direction generators.
//!
//! - `fixed`: a configured unit vector, optionally rotated into a volume's frame.
//! - `isotropic`: uniform on the sphere.
//! - `sun`: sky-angle sampler from a nadir-angle histogram.
//! - `gps_dir`: general angular distributions (see `angular`).
//!
//! `sample` returns a `DirectionSample`; nothing is cached on the generator.

mod angular;
mod sky;

pub use angular::{AngularDistribution, AngularDoc, AngularType};
pub use sky::{SkyDirection, DEFAULT_DECLINATION_DEG};

use nalgebra::{Point3, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::geometry::GeometryPort;
use crate::sampling::{sample_isotropic_direction, HistogramSource};
use crate::units::Quantity;

/// Document form of the `direction` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DirectionDoc {
    Fixed {
        dir: [f64; 3],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        volume: Option<String>,
    },
    Isotropic,
    Sun {
        nadir_hist: HistogramSource,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        declination: Option<Quantity<f64>>,
    },
    GpsDir(AngularDoc),
}

/// One draw: the emitted direction plus sampler-specific extras.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionSample {
    pub direction: Vector3<f64>,
    /// Cosine of the nadir angle, sky sampler only.
    pub cos_nadir: Option<f64>,
}

impl From<Vector3<f64>> for DirectionSample {
    fn from(direction: Vector3<f64>) -> Self {
        Self {
            direction,
            cos_nadir: None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum DirectionGenerator {
    Fixed(Vector3<f64>),
    Isotropic,
    Sky(SkyDirection),
    Angular(AngularDistribution),
}

impl DirectionGenerator {
    pub fn from_doc(doc: &DirectionDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        match doc {
            DirectionDoc::Fixed { dir, volume } => {
                let v = Vector3::from(*dir);
                if !(v.iter().all(|c| c.is_finite()) && v.norm() > 1e-12) {
                    return Err(ConfigError::invalid("dir", "must be a finite non-zero vector"));
                }
                let v = v.normalize();
                let v = match volume {
                    Some(name) => geometry.transform_to_world(name)?.rotation * v,
                    None => v,
                };
                Ok(Self::Fixed(v))
            }
            DirectionDoc::Isotropic => Ok(Self::Isotropic),
            DirectionDoc::Sun {
                nadir_hist,
                declination,
            } => SkyDirection::new(nadir_hist, declination.as_ref()).map(Self::Sky),
            DirectionDoc::GpsDir(a) => AngularDistribution::from_doc(a).map(Self::Angular),
        }
    }

    /// `vertex` is the emission point, used by focused beams.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, vertex: &Point3<f64>) -> DirectionSample {
        match self {
            Self::Fixed(v) => (*v).into(),
            Self::Isotropic => sample_isotropic_direction(rng).into(),
            Self::Sky(s) => s.sample(rng),
            Self::Angular(a) => a.sample(rng, vertex).into(),
        }
    }

    pub(crate) fn derived(&self) -> Value {
        match self {
            Self::Fixed(v) => json!({"world_dir": [v.x, v.y, v.z]}),
            Self::Isotropic => json!({}),
            Self::Sky(s) => json!({"declination_deg": s.declination().to_degrees()}),
            Self::Angular(a) => json!({"frame": a.frame_columns()}),
        }
    }
}
