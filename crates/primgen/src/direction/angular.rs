//! General angular distributions for beams and incoming fluxes.
//!
//! Angles are measured in a reference frame built from `rot1`/`rot2`
//! (x' = rot1, z' = rot1 × rot2). `iso`, `cos` and `user` emit inward-going
//! directions `-(sinθcosφ, sinθsinφ, cosθ)`; beams travel along -z' with a
//! Gaussian angular spread; `focused` aims from the vertex at `focus_point`.

use nalgebra::{Point3, Rotation3, Vector3};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::ConfigError;
use crate::sampling::{Histogram1D, HistogramSource};
use crate::units::{resolve_or, Dimension, Quantity};
use crate::vertex::frame_from_rot;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngularType {
    Iso,
    Cos,
    Beam1d,
    Beam2d,
    Focused,
    User,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AngularDoc {
    pub ang_type: AngularType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_theta: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_theta: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_phi: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_phi: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_r: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_x: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigma_y: Option<Quantity<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_point: Option<Quantity<[f64; 3]>>,
    /// θ histogram, bin edges in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theta_hist: Option<HistogramSource>,
    /// φ histogram, bin edges in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phi_hist: Option<HistogramSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot1: Option<[f64; 3]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rot2: Option<[f64; 3]>,
}

#[derive(Clone, Debug)]
enum Mode {
    /// `cosθ` uniform in `[cos_lo, cos_hi]`.
    Iso { cos_lo: f64, cos_hi: f64 },
    /// `sin²θ` uniform in `[s2_lo, s2_hi]` (cosine-law flux).
    Cos { s2_lo: f64, s2_hi: f64 },
    Beam1d { spread: Normal<f64> },
    Beam2d { spread_x: Normal<f64>, spread_y: Normal<f64> },
    Focused { focus: Point3<f64> },
    User { theta: Histogram1D, phi: Option<Histogram1D> },
}

#[derive(Clone, Debug)]
pub struct AngularDistribution {
    mode: Mode,
    phi_lo: f64,
    phi_hi: f64,
    frame: Rotation3<f64>,
}

fn gaussian(q: &Option<Quantity<f64>>, field: &str) -> Result<Normal<f64>, ConfigError> {
    let sigma = resolve_or(q, Dimension::Angle, field, 0.0)?;
    Normal::new(0.0, sigma).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

impl AngularDistribution {
    pub fn from_doc(doc: &AngularDoc) -> Result<Self, ConfigError> {
        let theta_lo = resolve_or(&doc.min_theta, Dimension::Angle, "min_theta", 0.0)?;
        let theta_hi = resolve_or(&doc.max_theta, Dimension::Angle, "max_theta", PI)?;
        if !(0.0 <= theta_lo && theta_lo <= theta_hi && theta_hi <= PI) {
            return Err(ConfigError::invalid(
                "max_theta",
                "need 0 <= min_theta <= max_theta <= pi",
            ));
        }
        let phi_lo = resolve_or(&doc.min_phi, Dimension::Angle, "min_phi", 0.0)?;
        let phi_hi = resolve_or(&doc.max_phi, Dimension::Angle, "max_phi", 2.0 * PI)?;
        if phi_hi < phi_lo {
            return Err(ConfigError::invalid("max_phi", "need min_phi <= max_phi"));
        }
        let mode = match doc.ang_type {
            AngularType::Iso => Mode::Iso {
                cos_lo: theta_hi.cos(),
                cos_hi: theta_lo.cos(),
            },
            AngularType::Cos => {
                // Cosine-law flux only makes sense on one hemisphere.
                let hi = theta_hi.min(PI / 2.0);
                Mode::Cos {
                    s2_lo: theta_lo.sin().powi(2),
                    s2_hi: hi.sin().powi(2),
                }
            }
            AngularType::Beam1d => Mode::Beam1d {
                spread: gaussian(&doc.sigma_r, "sigma_r")?,
            },
            AngularType::Beam2d => Mode::Beam2d {
                spread_x: gaussian(&doc.sigma_x, "sigma_x")?,
                spread_y: gaussian(&doc.sigma_y, "sigma_y")?,
            },
            AngularType::Focused => {
                let focus = doc
                    .focus_point
                    .as_ref()
                    .ok_or_else(|| ConfigError::missing("focus_point"))?
                    .resolve(Dimension::Length, "focus_point")?;
                Mode::Focused {
                    focus: Point3::from(focus),
                }
            }
            AngularType::User => {
                let theta = doc
                    .theta_hist
                    .as_ref()
                    .ok_or_else(|| ConfigError::missing("theta_hist"))?
                    .load("theta_hist")?;
                let phi = match &doc.phi_hist {
                    Some(h) => Some(h.load("phi_hist")?),
                    None => None,
                };
                Mode::User { theta, phi }
            }
        };
        Ok(Self {
            mode,
            phi_lo,
            phi_hi,
            frame: frame_from_rot(doc.rot1, doc.rot2)?,
        })
    }

    pub(crate) fn frame_columns(&self) -> [[f64; 3]; 3] {
        let m = self.frame.matrix();
        [0, 1, 2].map(|c| [m[(0, c)], m[(1, c)], m[(2, c)]])
    }

    fn phi<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        self.phi_lo + u * (self.phi_hi - self.phi_lo)
    }

    fn inward(theta_sin: f64, theta_cos: f64, phi: f64) -> Vector3<f64> {
        -Vector3::new(theta_sin * phi.cos(), theta_sin * phi.sin(), theta_cos)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, vertex: &Point3<f64>) -> Vector3<f64> {
        let local = match &self.mode {
            Mode::Iso { cos_lo, cos_hi } => {
                let u: f64 = rng.gen();
                let c = cos_lo + u * (cos_hi - cos_lo);
                let s = (1.0 - c * c).max(0.0).sqrt();
                Self::inward(s, c, self.phi(rng))
            }
            Mode::Cos { s2_lo, s2_hi } => {
                let u: f64 = rng.gen();
                let s = (s2_lo + u * (s2_hi - s2_lo)).sqrt();
                let c = (1.0 - s * s).max(0.0).sqrt();
                Self::inward(s, c, self.phi(rng))
            }
            Mode::Beam1d { spread } => {
                let theta: f64 = spread.sample(rng);
                let phi: f64 = rng.gen_range(0.0..2.0 * PI);
                Self::inward(theta.sin(), theta.cos(), phi)
            }
            Mode::Beam2d { spread_x, spread_y } => {
                let ax: f64 = spread_x.sample(rng);
                let ay: f64 = spread_y.sample(rng);
                let theta = (ax * ax + ay * ay).sqrt();
                let phi = ay.atan2(ax);
                Self::inward(theta.sin(), theta.cos(), phi)
            }
            Mode::Focused { focus } => {
                let d = focus - vertex;
                // Vertex sitting on the focus: fall back to the beam axis.
                return if d.norm() > 1e-12 {
                    d.normalize()
                } else {
                    self.frame * -Vector3::z()
                };
            }
            Mode::User { theta, phi } => {
                let t = theta.sample(rng);
                let p = match phi {
                    Some(h) => h.sample(rng),
                    None => self.phi(rng),
                };
                Self::inward(t.sin(), t.cos(), p)
            }
        };
        (self.frame * local).normalize()
    }
}
