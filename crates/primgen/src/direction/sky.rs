//! Sky-angle ("sun") directions from a nadir-angle histogram.
//!
//! `cos n` comes from the histogram, azimuth `φ ~ U(0, π)`, and a fixed
//! declination `δ` tilts the result:
//!
//! ```text
//! x =  cosδ·sin n·cosφ + sinδ·sin n·sinφ
//! y = -cos n
//! z = -sinδ·sin n·cosφ + cosδ·sin n·sinφ
//! ```
//!
//! The half-range azimuth is deliberate. Two different declinations
//! (107.7° and 102.5°) exist for this sampler in prior setups; the default
//! is 107.7° and `declination` overrides it.

use nalgebra::Vector3;
use rand::Rng;
use std::f64::consts::PI;

use super::DirectionSample;
use crate::error::ConfigError;
use crate::sampling::{sample_from_histogram, Histogram1D, HistogramSource};
use crate::units::{Dimension, Quantity};

pub const DEFAULT_DECLINATION_DEG: f64 = 107.7;

#[derive(Clone, Debug)]
pub struct SkyDirection {
    nadir: Histogram1D,
    declination: f64,
    sin_dec: f64,
    cos_dec: f64,
}

impl SkyDirection {
    pub fn new(
        nadir_hist: &HistogramSource,
        declination: Option<&Quantity<f64>>,
    ) -> Result<Self, ConfigError> {
        let nadir = nadir_hist.load("nadir_hist")?;
        let (lo, hi) = nadir.range();
        if lo < -1.0 || hi > 1.0 {
            return Err(ConfigError::invalid(
                "nadir_hist",
                format!("cos(nadir) bins [{lo}, {hi}] exceed [-1, 1]"),
            ));
        }
        let declination = match declination {
            Some(q) => q.resolve(Dimension::Angle, "declination")?,
            None => DEFAULT_DECLINATION_DEG.to_radians(),
        };
        Ok(Self {
            nadir,
            declination,
            sin_dec: declination.sin(),
            cos_dec: declination.cos(),
        })
    }

    pub fn declination(&self) -> f64 {
        self.declination
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> DirectionSample {
        let cos_n = sample_from_histogram(&self.nadir, rng);
        let sin_n = (1.0 - cos_n * cos_n).max(0.0).sqrt();
        let phi: f64 = rng.gen_range(0.0..PI);
        let (sin_phi, cos_phi) = phi.sin_cos();
        let d = Vector3::new(
            self.cos_dec * sin_n * cos_phi + self.sin_dec * sin_n * sin_phi,
            -cos_n,
            -self.sin_dec * sin_n * cos_phi + self.cos_dec * sin_n * sin_phi,
        );
        DirectionSample {
            direction: d.normalize(),
            cos_nadir: Some(cos_n),
        }
    }
}
