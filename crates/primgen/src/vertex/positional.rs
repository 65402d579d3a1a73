//! General-purpose positional distributions (point, planar, volumetric,
//! spherical surface), placed by a centre and a `rot1`/`rot2` frame.
//!
//! Planar shapes lie in the local x'y' plane; `x' = rot1`, `z' = rot1 × rot2`,
//! `y' = z' × x'`. An optional `confine` volume rejects points outside it.

use nalgebra::{Isometry3, Matrix3, Point3, Rotation3, UnitQuaternion, Vector3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f64::consts::PI;

use crate::error::{ConfigError, SamplingError};
use crate::geometry::GeometryPort;
use crate::sampling::{sample_in_box, sample_isotropic_direction};
use crate::units::{Dimension, Quantity};

use super::bulk::DEFAULT_MAX_TRIES;

fn default_tries() -> u64 {
    DEFAULT_MAX_TRIES
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PositionalShape {
    Point,
    Circle {
        radius: Quantity<f64>,
    },
    Annulus {
        radius0: Quantity<f64>,
        radius: Quantity<f64>,
    },
    Square {
        halfx: Quantity<f64>,
    },
    Rectangle {
        halfx: Quantity<f64>,
        halfy: Quantity<f64>,
    },
    Sphere {
        radius: Quantity<f64>,
    },
    Box {
        halfx: Quantity<f64>,
        halfy: Quantity<f64>,
        halfz: Quantity<f64>,
    },
    Cylinder {
        radius: Quantity<f64>,
        halfz: Quantity<f64>,
    },
    SphereSurface {
        radius: Quantity<f64>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionalDoc {
    #[serde(flatten)]
    pub shape: PositionalShape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub centre: Option<Quantity<[f64; 3]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot1: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot2: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confine: Option<String>,
    #[serde(default = "default_tries")]
    pub max_tries: u64,
}

/// Resolved shape, lengths in mm.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Shape {
    Point,
    Annulus { r0: f64, r: f64 },
    Rectangle { hx: f64, hy: f64 },
    Sphere { r: f64 },
    Box { h: Vector3<f64> },
    Cylinder { r: f64, hz: f64 },
    SphereSurface { r: f64 },
}

#[derive(Clone, Debug)]
pub struct PositionalDistribution {
    shape: Shape,
    placement: Isometry3<f64>,
    confine: Option<(String, Isometry3<f64>)>,
    max_tries: u64,
}

fn positive(q: &Quantity<f64>, field: &str) -> Result<f64, ConfigError> {
    let v = q.resolve(Dimension::Length, field)?;
    if v > 0.0 {
        Ok(v)
    } else {
        Err(ConfigError::invalid(field, "must be > 0"))
    }
}

/// Orthonormal frame from `rot1` (x') and `rot2` (in the x'y' plane).
pub(crate) fn frame_from_rot(
    rot1: Option<[f64; 3]>,
    rot2: Option<[f64; 3]>,
) -> Result<Rotation3<f64>, ConfigError> {
    let x = Vector3::from(rot1.unwrap_or([1.0, 0.0, 0.0]));
    let y = Vector3::from(rot2.unwrap_or([0.0, 1.0, 0.0]));
    let z = x.cross(&y);
    if x.norm() < 1e-12 || z.norm() < 1e-12 {
        return Err(ConfigError::invalid(
            "rot2",
            "rot1 and rot2 must be non-zero and not parallel",
        ));
    }
    let x = x.normalize();
    let z = z.normalize();
    let y = z.cross(&x);
    Ok(Rotation3::from_matrix_unchecked(Matrix3::from_columns(&[
        x, y, z,
    ])))
}

impl PositionalDistribution {
    pub fn from_doc(doc: &PositionalDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        let shape = match &doc.shape {
            PositionalShape::Point => Shape::Point,
            PositionalShape::Circle { radius } => Shape::Annulus {
                r0: 0.0,
                r: positive(radius, "radius")?,
            },
            PositionalShape::Annulus { radius0, radius } => {
                let r0 = radius0.resolve(Dimension::Length, "radius0")?;
                let r = positive(radius, "radius")?;
                if !(0.0..r).contains(&r0) {
                    return Err(ConfigError::invalid("radius0", "need 0 <= radius0 < radius"));
                }
                Shape::Annulus { r0, r }
            }
            PositionalShape::Square { halfx } => {
                let h = positive(halfx, "halfx")?;
                Shape::Rectangle { hx: h, hy: h }
            }
            PositionalShape::Rectangle { halfx, halfy } => Shape::Rectangle {
                hx: positive(halfx, "halfx")?,
                hy: positive(halfy, "halfy")?,
            },
            PositionalShape::Sphere { radius } => Shape::Sphere {
                r: positive(radius, "radius")?,
            },
            PositionalShape::Box {
                halfx,
                halfy,
                halfz,
            } => Shape::Box {
                h: Vector3::new(
                    positive(halfx, "halfx")?,
                    positive(halfy, "halfy")?,
                    positive(halfz, "halfz")?,
                ),
            },
            PositionalShape::Cylinder { radius, halfz } => Shape::Cylinder {
                r: positive(radius, "radius")?,
                hz: positive(halfz, "halfz")?,
            },
            PositionalShape::SphereSurface { radius } => Shape::SphereSurface {
                r: positive(radius, "radius")?,
            },
        };
        let centre = match &doc.centre {
            Some(c) => c.resolve(Dimension::Length, "centre")?,
            None => Vector3::zeros(),
        };
        let rotation = frame_from_rot(doc.rot1, doc.rot2)?;
        let placement = Isometry3::from_parts(
            centre.into(),
            UnitQuaternion::from_rotation_matrix(&rotation),
        );
        let confine = match &doc.confine {
            Some(name) => Some((name.clone(), geometry.transform_to_world(name)?)),
            None => None,
        };
        if doc.max_tries == 0 {
            return Err(ConfigError::invalid("max_tries", "must be > 0"));
        }
        Ok(Self {
            shape,
            placement,
            confine,
            max_tries: doc.max_tries,
        })
    }

    /// Area of planar shapes (mm²); `None` for points, volumes and surfaces.
    pub fn exposed_area(&self) -> Option<f64> {
        match self.shape {
            Shape::Annulus { r0, r } => Some(PI * (r * r - r0 * r0)),
            Shape::Rectangle { hx, hy } => Some(4.0 * hx * hy),
            _ => None,
        }
    }

    fn sample_local<R: Rng + ?Sized>(&self, rng: &mut R) -> Point3<f64> {
        match self.shape {
            Shape::Point => Point3::origin(),
            Shape::Annulus { r0, r } => {
                let u: f64 = rng.gen();
                let rho = (r0 * r0 + u * (r * r - r0 * r0)).sqrt();
                let phi: f64 = rng.gen_range(0.0..2.0 * PI);
                Point3::new(rho * phi.cos(), rho * phi.sin(), 0.0)
            }
            Shape::Rectangle { hx, hy } => Point3::new(
                rng.gen_range(-hx..=hx),
                rng.gen_range(-hy..=hy),
                0.0,
            ),
            Shape::Sphere { r } => {
                let u: f64 = rng.gen();
                Point3::from(sample_isotropic_direction(rng) * (r * u.cbrt()))
            }
            Shape::Box { h } => sample_in_box(rng, &Point3::from(-h), &Point3::from(h)),
            Shape::Cylinder { r, hz } => {
                let u: f64 = rng.gen();
                let rho = r * u.sqrt();
                let phi: f64 = rng.gen_range(0.0..2.0 * PI);
                Point3::new(rho * phi.cos(), rho * phi.sin(), rng.gen_range(-hz..=hz))
            }
            Shape::SphereSurface { r } => Point3::from(sample_isotropic_direction(rng) * r),
        }
    }

    pub fn shoot<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        geometry: &dyn GeometryPort,
    ) -> Result<Point3<f64>, SamplingError> {
        let Some((volume, to_world)) = &self.confine else {
            return Ok(self.placement * self.sample_local(rng));
        };
        for _ in 0..self.max_tries {
            let world = self.placement * self.sample_local(rng);
            let local = to_world.inverse_transform_point(&world);
            if geometry.point_is_inside(volume, &local)? {
                return Ok(world);
            }
        }
        tracing::error!(volume = %volume, tries = self.max_tries, "confined vertex sampling exhausted");
        Err(SamplingError::Exhausted {
            volume: volume.clone(),
            tries: self.max_tries,
        })
    }

    pub(crate) fn derived(&self) -> Value {
        json!({
            "centre_mm": super::point_json(&Point3::from(self.placement.translation.vector)),
            "exposed_area_mm2": self.exposed_area(),
        })
    }
}
