//! Vertices on the faces of a volume's bounding box.
//!
//! Face order: -x, +x, -y, +y, -z, +z. A random face is picked with
//! probability proportional to its area. In-plane coordinates are uniform over
//! the face extent grown by `tolerance` on each side; the normal coordinate
//! sits exactly on the face.

use nalgebra::{Isometry3, Point3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::geometry::GeometryPort;
use crate::units::{resolve_or, Dimension, Quantity};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FaceChoice {
    Fixed(u8),
    Random(RandomFace),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RandomFace {
    Random,
}

impl Default for FaceChoice {
    fn default() -> Self {
        FaceChoice::Random(RandomFace::Random)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoxSurfaceDoc {
    pub volume: String,
    #[serde(default)]
    pub face: FaceChoice,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<Quantity<f64>>,
}

#[derive(Clone, Debug)]
pub struct BoxSurface {
    face: Option<usize>,
    tolerance: f64,
    lo: Point3<f64>,
    hi: Point3<f64>,
    to_world: Isometry3<f64>,
    face_areas: [f64; 6],
    /// Cumulative normalized face areas.
    face_cdf: [f64; 6],
}

impl BoxSurface {
    pub fn from_doc(doc: &BoxSurfaceDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        let face = match doc.face {
            FaceChoice::Fixed(i) if i < 6 => Some(i as usize),
            FaceChoice::Fixed(i) => {
                return Err(ConfigError::invalid("face", format!("{i} is not in 0..=5")))
            }
            FaceChoice::Random(_) => None,
        };
        let tolerance = resolve_or(&doc.tolerance, Dimension::Length, "tolerance", 0.0)?;
        if tolerance < 0.0 {
            return Err(ConfigError::invalid("tolerance", "must be >= 0"));
        }
        let to_world = geometry.transform_to_world(&doc.volume)?;
        let (lo, hi) = geometry.bounding_box(&doc.volume)?;
        let d = hi - lo;
        let face_areas = [
            d.y * d.z,
            d.y * d.z,
            d.x * d.z,
            d.x * d.z,
            d.x * d.y,
            d.x * d.y,
        ];
        let total: f64 = face_areas.iter().sum();
        let mut face_cdf = [0.0; 6];
        let mut acc = 0.0;
        for (c, a) in face_cdf.iter_mut().zip(face_areas) {
            acc += a;
            *c = acc / total;
        }
        Ok(Self {
            face,
            tolerance,
            lo,
            hi,
            to_world,
            face_areas,
            face_cdf,
        })
    }

    pub fn face_areas(&self) -> [f64; 6] {
        self.face_areas
    }

    /// Sum of the six face areas (mm²).
    pub fn total_area(&self) -> f64 {
        self.face_areas.iter().sum()
    }

    /// Area vertices are spread over: the fixed face, or all six.
    pub fn exposed_area(&self) -> f64 {
        match self.face {
            Some(i) => self.face_areas[i],
            None => self.total_area(),
        }
    }

    fn pick_face<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        match self.face {
            Some(i) => i,
            None => {
                let u: f64 = rng.gen();
                self.face_cdf.partition_point(|&c| c <= u).min(5)
            }
        }
    }

    /// Point on `face` in local coordinates.
    pub fn sample_local<R: Rng + ?Sized>(&self, rng: &mut R, face: usize) -> Point3<f64> {
        let axis = face / 2;
        let mut p = Point3::origin();
        for i in 0..3 {
            if i == axis {
                p[i] = if face % 2 == 0 { self.lo[i] } else { self.hi[i] };
            } else {
                let u: f64 = rng.gen();
                let lo = self.lo[i] - self.tolerance;
                let hi = self.hi[i] + self.tolerance;
                p[i] = lo + u * (hi - lo);
            }
        }
        p
    }

    pub fn shoot<R: Rng + ?Sized>(&self, rng: &mut R) -> Point3<f64> {
        let face = self.pick_face(rng);
        self.to_world * self.sample_local(rng, face)
    }

    pub(crate) fn derived(&self) -> Value {
        json!({
            "face_areas_mm2": self.face_areas,
            "total_area_mm2": self.total_area(),
            "exposed_area_mm2": self.exposed_area(),
        })
    }
}
