//! Kinetic-energy sampling.
//!
//! Modes
//! - `monoenergetic`: a fixed value.
//! - `custom`: closed-form or tabulated shapes (Fermi–Dirac, beta-fit,
//!   piecewise histogram, linear grid).
//! - `ext_spectrum`: a histogram bound at setup (inline or from a file).
//!
//! Energies are MeV internally. Each draw is returned to the caller; the
//! sampler itself holds only setup-time state.

use rand::Rng;
use rand_distr::{Distribution, Gamma};
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SamplingError};
use crate::sampling::{Histogram1D, HistogramSource};
use crate::units::{Dimension, Quantity};

/// Rejection cap for range-truncated shapes.
pub const MAX_ENERGY_TRIES: u64 = 100_000;

/// Grid points used to bound the Fermi–Dirac density at setup.
const FD_GRID: usize = 2000;

/// Document form of the `energy` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum EnergyDoc {
    Monoenergetic {
        energy: Quantity<f64>,
    },
    Custom {
        shape: CustomShapeDoc,
    },
    ExtSpectrum {
        spectrum: HistogramSource,
        /// Unit of the spectrum's bin edges.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomShapeDoc {
    FermiDirac {
        e_min: Quantity<f64>,
        e_max: Quantity<f64>,
        temperature: Quantity<f64>,
        #[serde(default)]
        eta: f64,
    },
    BetaFit {
        e_min: Quantity<f64>,
        e_max: Quantity<f64>,
        mean: Quantity<f64>,
        beta: f64,
    },
    Histogram {
        edges: Quantity<Vec<f64>>,
        weights: Vec<f64>,
    },
    Grid {
        energies: Quantity<Vec<f64>>,
        weights: Vec<f64>,
    },
}

#[derive(Clone, Debug)]
pub enum EnergySampler {
    Fixed(f64),
    FermiDirac(FermiDirac),
    BetaFit(BetaFit),
    Histogram(Histogram1D),
    Grid(LinearGrid),
    ExternalSpectrum(Histogram1D),
}

impl EnergySampler {
    pub fn from_doc(doc: &EnergyDoc) -> Result<Self, ConfigError> {
        match doc {
            EnergyDoc::Monoenergetic { energy } => {
                let e = energy.resolve(Dimension::Energy, "energy")?;
                if e < 0.0 {
                    return Err(ConfigError::invalid("energy", "must be >= 0"));
                }
                Ok(Self::Fixed(e))
            }
            EnergyDoc::Custom { shape } => {
                Self::custom_from_doc(shape).map_err(|e| e.within("shape"))
            }
            EnergyDoc::ExtSpectrum { spectrum, unit } => {
                let unit = unit.as_deref().unwrap_or(Dimension::Energy.natural_unit());
                let scale = Dimension::Energy.scale(unit).ok_or_else(|| {
                    ConfigError::invalid("unit", format!("`{unit}` is not an energy unit"))
                })?;
                let hist = spectrum.load("spectrum")?;
                Ok(Self::ExternalSpectrum(hist.scaled(scale)))
            }
        }
    }

    fn custom_from_doc(shape: &CustomShapeDoc) -> Result<Self, ConfigError> {
        match shape {
            CustomShapeDoc::FermiDirac {
                e_min,
                e_max,
                temperature,
                eta,
            } => {
                let (e_min, e_max) = energy_range(e_min, e_max)?;
                let t = temperature.resolve(Dimension::Energy, "temperature")?;
                if t <= 0.0 {
                    return Err(ConfigError::invalid("temperature", "must be > 0"));
                }
                Ok(Self::FermiDirac(FermiDirac::new(e_min, e_max, t, *eta)?))
            }
            CustomShapeDoc::BetaFit {
                e_min,
                e_max,
                mean,
                beta,
            } => {
                let (e_min, e_max) = energy_range(e_min, e_max)?;
                let mean = mean.resolve(Dimension::Energy, "mean")?;
                if mean <= 0.0 {
                    return Err(ConfigError::invalid("mean", "must be > 0"));
                }
                let gamma = Gamma::new(beta + 1.0, mean / (beta + 1.0))
                    .map_err(|e| ConfigError::invalid("beta", format!("{e} (need beta > -1)")))?;
                Ok(Self::BetaFit(BetaFit {
                    e_min,
                    e_max,
                    gamma,
                }))
            }
            CustomShapeDoc::Histogram { edges, weights } => {
                let edges = edges.resolve(Dimension::Energy, "edges")?;
                Histogram1D::new(edges, weights.clone())
                    .map(Self::Histogram)
                    .map_err(|r| ConfigError::invalid("weights", r))
            }
            CustomShapeDoc::Grid { energies, weights } => {
                let energies = energies.resolve(Dimension::Energy, "energies")?;
                LinearGrid::new(energies, weights.clone())
                    .map(Self::Grid)
                    .map_err(|r| ConfigError::invalid("weights", r))
            }
        }
    }

    pub fn sample_energy<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SamplingError> {
        match self {
            Self::Fixed(e) => Ok(*e),
            Self::FermiDirac(fd) => fd.sample(rng),
            Self::BetaFit(bf) => bf.sample(rng),
            Self::Histogram(h) | Self::ExternalSpectrum(h) => Ok(h.sample(rng)),
            Self::Grid(g) => Ok(g.sample(rng)),
        }
    }
}

fn energy_range(
    e_min: &Quantity<f64>,
    e_max: &Quantity<f64>,
) -> Result<(f64, f64), ConfigError> {
    let lo = e_min.resolve(Dimension::Energy, "e_min")?;
    let hi = e_max.resolve(Dimension::Energy, "e_max")?;
    if lo < 0.0 || hi <= lo {
        return Err(ConfigError::invalid("e_max", "need 0 <= e_min < e_max"));
    }
    Ok((lo, hi))
}

/// Density `∝ E² / (1 + exp(E/T − η))` on `[e_min, e_max]`.
#[derive(Clone, Debug)]
pub struct FermiDirac {
    e_min: f64,
    e_max: f64,
    temperature: f64,
    eta: f64,
    envelope: f64,
}

impl FermiDirac {
    fn new(e_min: f64, e_max: f64, temperature: f64, eta: f64) -> Result<Self, ConfigError> {
        let mut fd = Self {
            e_min,
            e_max,
            temperature,
            eta,
            envelope: 0.0,
        };
        let step = (e_max - e_min) / FD_GRID as f64;
        let peak = (0..=FD_GRID)
            .map(|i| fd.density(e_min + step * i as f64))
            .fold(0.0, f64::max);
        // Grid maximum underestimates the true peak by at most one step.
        fd.envelope = peak * 1.01;
        // exp(E/T − η) overflows for E ≫ T, leaving no density on the range.
        if !fd.envelope.is_finite() || fd.envelope <= 0.0 {
            return Err(ConfigError::invalid(
                "temperature",
                "density vanishes on [e_min, e_max]; temperature too low for this range",
            ));
        }
        Ok(fd)
    }

    pub fn density(&self, e: f64) -> f64 {
        e * e / (1.0 + (e / self.temperature - self.eta).exp())
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SamplingError> {
        for _ in 0..MAX_ENERGY_TRIES {
            let e = rng.gen_range(self.e_min..=self.e_max);
            if rng.gen::<f64>() * self.envelope <= self.density(e) {
                return Ok(e);
            }
        }
        Err(SamplingError::RangeExhausted {
            what: "fermi_dirac",
            tries: MAX_ENERGY_TRIES,
        })
    }
}

/// Pinched spectrum `∝ E^β exp(−(β+1)E/⟨E⟩)`, truncated to `[e_min, e_max]`.
#[derive(Clone, Debug)]
pub struct BetaFit {
    e_min: f64,
    e_max: f64,
    gamma: Gamma<f64>,
}

impl BetaFit {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64, SamplingError> {
        for _ in 0..MAX_ENERGY_TRIES {
            let e = self.gamma.sample(rng);
            if (self.e_min..=self.e_max).contains(&e) {
                return Ok(e);
            }
        }
        Err(SamplingError::RangeExhausted {
            what: "beta_fit",
            tries: MAX_ENERGY_TRIES,
        })
    }
}

/// Piecewise-linear density through `(energies[i], weights[i])`.
#[derive(Clone, Debug)]
pub struct LinearGrid {
    energies: Vec<f64>,
    weights: Vec<f64>,
    /// Normalized cumulative trapezoid areas, one per segment.
    cdf: Vec<f64>,
}

impl LinearGrid {
    pub fn new(energies: Vec<f64>, weights: Vec<f64>) -> Result<Self, String> {
        if energies.len() < 2 || energies.len() != weights.len() {
            return Err("need at least two grid points with one weight each".into());
        }
        if energies.windows(2).any(|w| w[1] <= w[0]) {
            return Err("grid energies must be strictly increasing".into());
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".into());
        }
        let areas: Vec<f64> = energies
            .windows(2)
            .zip(weights.windows(2))
            .map(|(e, w)| 0.5 * (w[0] + w[1]) * (e[1] - e[0]))
            .collect();
        let total: f64 = areas.iter().sum();
        if total <= 0.0 {
            return Err("total weight must be positive".into());
        }
        let mut acc = 0.0;
        let cdf = areas
            .iter()
            .map(|a| {
                acc += a;
                acc / total
            })
            .collect();
        Ok(Self {
            energies,
            weights,
            cdf,
        })
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        let i = self.cdf.partition_point(|&c| c <= u).min(self.cdf.len() - 1);
        let below = if i == 0 { 0.0 } else { self.cdf[i - 1] };
        let width = self.cdf[i] - below;
        let frac = if width > 0.0 { (u - below) / width } else { 0.5 };

        let (x0, x1) = (self.energies[i], self.energies[i + 1]);
        let (y0, y1) = (self.weights[i], self.weights[i + 1]);
        let h = x1 - x0;
        let area = 0.5 * (y0 + y1) * h;
        let slope = (y1 - y0) / h;
        // Invert y0 t + slope t²/2 = frac·area in a form stable for slope → 0.
        let target = frac * area;
        let denom = y0 + (y0 * y0 + 2.0 * slope * target).max(0.0).sqrt();
        let t = if denom > 0.0 { 2.0 * target / denom } else { 0.0 };
        x0 + t.clamp(0.0, h)
    }
}
