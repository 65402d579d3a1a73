//! Fixed-bin empirical distributions with inverse-CDF sampling.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Read-only histogram: `edges.len() == weights.len() + 1`.
///
/// Invariants
/// - edges strictly increasing and finite, weights finite and `>= 0`,
///   total weight `> 0`.
/// - `cdf[i]` is the normalized cumulative weight up to and including bin i.
#[derive(Clone, Debug, PartialEq)]
pub struct Histogram1D {
    edges: Vec<f64>,
    weights: Vec<f64>,
    cdf: Vec<f64>,
}

impl Histogram1D {
    pub fn new(edges: Vec<f64>, weights: Vec<f64>) -> Result<Self, String> {
        if weights.is_empty() {
            return Err("need at least one bin".into());
        }
        if edges.len() != weights.len() + 1 {
            return Err(format!(
                "{} edges for {} bins (want bins + 1)",
                edges.len(),
                weights.len()
            ));
        }
        if edges.iter().any(|e| !e.is_finite()) || edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err("edges must be finite and strictly increasing".into());
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("weights must be finite and non-negative".into());
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err("total weight must be positive".into());
        }
        let mut acc = 0.0;
        let cdf = weights
            .iter()
            .map(|w| {
                acc += w;
                acc / total
            })
            .collect();
        Ok(Self {
            edges,
            weights,
            cdf,
        })
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn range(&self) -> (f64, f64) {
        (self.edges[0], self.edges[self.edges.len() - 1])
    }

    /// Weighted mean of bin centres.
    pub fn mean(&self) -> f64 {
        let total: f64 = self.weights.iter().sum();
        self.edges
            .windows(2)
            .zip(&self.weights)
            .map(|(e, w)| 0.5 * (e[0] + e[1]) * w)
            .sum::<f64>()
            / total
    }

    /// Copy with every edge multiplied by `factor` (> 0).
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            edges: self.edges.iter().map(|e| e * factor).collect(),
            weights: self.weights.clone(),
            cdf: self.cdf.clone(),
        }
    }

    /// Pick a bin by its cumulative weight, then a uniform value inside it.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        let i = self
            .cdf
            .partition_point(|&c| c <= u)
            .min(self.weights.len() - 1);
        let below = if i == 0 { 0.0 } else { self.cdf[i - 1] };
        let width = self.cdf[i] - below;
        let frac = if width > 0.0 {
            ((u - below) / width).clamp(0.0, 1.0)
        } else {
            0.5
        };
        self.edges[i] + frac * (self.edges[i + 1] - self.edges[i])
    }
}

/// Document form: inline bins or a JSON file holding `{"edges", "weights"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HistogramSource {
    Inline { edges: Vec<f64>, weights: Vec<f64> },
    File { file: String },
}

#[derive(Deserialize)]
struct HistogramFile {
    edges: Vec<f64>,
    weights: Vec<f64>,
}

impl HistogramSource {
    /// Materialize the histogram. Files are read once, here.
    pub fn load(&self, field: &str) -> Result<Histogram1D, ConfigError> {
        let (edges, weights) = match self {
            HistogramSource::Inline { edges, weights } => (edges.clone(), weights.clone()),
            HistogramSource::File { file } => {
                let bytes = std::fs::read(file).map_err(|source| ConfigError::Io {
                    path: file.clone(),
                    source,
                })?;
                let parsed: HistogramFile = serde_json::from_slice(&bytes)
                    .map_err(|e| ConfigError::invalid(field, format!("{file}: {e}")))?;
                (parsed.edges, parsed.weights)
            }
        };
        Histogram1D::new(edges, weights).map_err(|reason| ConfigError::invalid(field, reason))
    }
}
