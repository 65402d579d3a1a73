//! Physical quantities in generator documents.
//!
//! A quantity is written either as `{"val": x, "unit": "cm"}` or as a bare
//! value in the natural unit of its kind. Internally everything is stored in
//! mm, ns, MeV and rad.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Quantity kinds with their accepted units.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Time,
    Energy,
    Angle,
    /// Particles per area per time.
    Flux,
}

impl Dimension {
    pub fn natural_unit(self) -> &'static str {
        match self {
            Self::Length => "mm",
            Self::Time => "ns",
            Self::Energy => "MeV",
            Self::Angle => "rad",
            Self::Flux => "1/mm2/ns",
        }
    }

    /// Multiplier from `unit` to the internal unit, `None` if not accepted.
    pub fn scale(self, unit: &str) -> Option<f64> {
        let s = match (self, unit) {
            (Self::Length, "nm") => 1e-6,
            (Self::Length, "um") => 1e-3,
            (Self::Length, "mm") => 1.0,
            (Self::Length, "cm") => 10.0,
            (Self::Length, "m") => 1e3,
            (Self::Length, "km") => 1e6,
            (Self::Time, "ps") => 1e-3,
            (Self::Time, "ns") => 1.0,
            (Self::Time, "us") => 1e3,
            (Self::Time, "ms") => 1e6,
            (Self::Time, "s") => 1e9,
            (Self::Energy, "eV") => 1e-6,
            (Self::Energy, "keV") => 1e-3,
            (Self::Energy, "MeV") => 1.0,
            (Self::Energy, "GeV") => 1e3,
            (Self::Energy, "TeV") => 1e6,
            (Self::Angle, "rad") => 1.0,
            (Self::Angle, "mrad") => 1e-3,
            (Self::Angle, "deg") => std::f64::consts::PI / 180.0,
            (Self::Flux, "1/mm2/ns") => 1.0,
            // 1 cm² = 100 mm², 1 s = 1e9 ns
            (Self::Flux, "1/cm2/s") => 1e-11,
            (Self::Flux, "1/m2/s") => 1e-15,
            _ => return None,
        };
        Some(s)
    }
}

/// A value with an optional unit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity<T> {
    Tagged {
        val: T,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
    },
    Bare(T),
}

impl<T> Quantity<T> {
    pub fn new(val: T, unit: &str) -> Self {
        Self::Tagged {
            val,
            unit: Some(unit.to_string()),
        }
    }

    pub fn raw(&self) -> &T {
        match self {
            Self::Tagged { val, .. } | Self::Bare(val) => val,
        }
    }

    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::Tagged { unit, .. } => unit.as_deref(),
            Self::Bare(_) => None,
        }
    }

    fn factor(&self, dim: Dimension, field: &str) -> Result<f64, ConfigError> {
        let unit = self.unit().unwrap_or(dim.natural_unit());
        dim.scale(unit).ok_or_else(|| {
            ConfigError::invalid(field, format!("unit `{unit}` is not a {dim:?} unit"))
        })
    }
}

impl Quantity<f64> {
    pub fn resolve(&self, dim: Dimension, field: &str) -> Result<f64, ConfigError> {
        let v = *self.raw();
        if !v.is_finite() {
            return Err(ConfigError::invalid(field, "value must be finite"));
        }
        Ok(v * self.factor(dim, field)?)
    }
}

impl Quantity<[f64; 3]> {
    pub fn resolve(&self, dim: Dimension, field: &str) -> Result<Vector3<f64>, ConfigError> {
        let [x, y, z] = *self.raw();
        if !(x.is_finite() && y.is_finite() && z.is_finite()) {
            return Err(ConfigError::invalid(field, "components must be finite"));
        }
        Ok(Vector3::new(x, y, z) * self.factor(dim, field)?)
    }
}

impl Quantity<Vec<f64>> {
    pub fn resolve(&self, dim: Dimension, field: &str) -> Result<Vec<f64>, ConfigError> {
        let f = self.factor(dim, field)?;
        self.raw()
            .iter()
            .map(|&v| {
                if v.is_finite() {
                    Ok(v * f)
                } else {
                    Err(ConfigError::invalid(field, "values must be finite"))
                }
            })
            .collect()
    }
}

/// Resolve an optional quantity, falling back to `default` (internal units).
pub(crate) fn resolve_or(
    q: &Option<Quantity<f64>>,
    dim: Dimension,
    field: &str,
    default: f64,
) -> Result<f64, ConfigError> {
    match q {
        Some(q) => q.resolve(dim, field),
        None => Ok(default),
    }
}
