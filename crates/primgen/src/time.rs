//! Vertex time sampling: a fixed time or a uniform window.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::units::{Dimension, Quantity};

/// Document form of the `time` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TimeDoc {
    Fixed { time: Quantity<f64> },
    Window { t_min: Quantity<f64>, t_max: Quantity<f64> },
}

impl Default for TimeDoc {
    fn default() -> Self {
        TimeDoc::Fixed {
            time: Quantity::new(0.0, "ns"),
        }
    }
}

/// Times in ns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeGenerator {
    Fixed(f64),
    Window { t_min: f64, t_max: f64 },
}

impl TimeGenerator {
    pub fn from_doc(doc: &TimeDoc) -> Result<Self, ConfigError> {
        match doc {
            TimeDoc::Fixed { time } => Ok(Self::Fixed(time.resolve(Dimension::Time, "time")?)),
            TimeDoc::Window { t_min, t_max } => {
                let t_min = t_min.resolve(Dimension::Time, "t_min")?;
                let t_max = t_max.resolve(Dimension::Time, "t_max")?;
                if t_max < t_min {
                    return Err(ConfigError::invalid("t_max", "t_max must be >= t_min"));
                }
                Ok(Self::Window { t_min, t_max })
            }
        }
    }

    pub fn sample_time<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Self::Fixed(t) => t,
            Self::Window { t_min, t_max } => {
                let u: f64 = rng.gen();
                t_min + u * (t_max - t_min)
            }
        }
    }

    /// Window length used for flux-to-count conversion; 0 for a fixed time.
    pub fn total_window(&self) -> f64 {
        match *self {
            Self::Fixed(_) => 0.0,
            Self::Window { t_min, t_max } => t_max - t_min,
        }
    }
}
