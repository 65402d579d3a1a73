//! Final-state models for `decay` and `reaction` generators.
//!
//! A model is an opaque black box: given a vertex and a time it returns the
//! outgoing particles. Models are registered by name before generators are
//! configured; a document naming an unknown model fails setup.

use nalgebra::{Point3, Vector3};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;

use crate::sampling::sample_isotropic_direction;
use crate::species::Species;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FinalStateParticle {
    pub species: Species,
    /// MeV/c.
    pub momentum: Vector3<f64>,
    /// Absolute emission time, ns.
    pub time: f64,
}

impl FinalStateParticle {
    pub fn kinetic_energy(&self) -> f64 {
        let m = self.species.mass;
        (self.momentum.norm_squared() + m * m).sqrt() - m
    }
}

pub trait FinalStateModel: Send + Sync {
    fn generate(
        &self,
        rng: &mut dyn RngCore,
        vertex: &Point3<f64>,
        time: f64,
    ) -> Result<Vec<FinalStateParticle>, String>;
}

#[derive(Clone, Default)]
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn FinalStateModel>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the built-in models (`pi0_decay`).
    pub fn with_builtin() -> Self {
        let mut reg = Self::new();
        if let (Some(pi0), Some(gamma)) = (Species::by_name("pi0"), Species::by_name("gamma")) {
            if let Some(decay) = TwoBodyDecay::new(pi0.mass, gamma, gamma) {
                reg.insert("pi0_decay", decay);
            }
        }
        reg
    }

    pub fn insert(&mut self, name: &str, model: impl FinalStateModel + 'static) {
        self.models.insert(name.to_string(), Arc::new(model));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn FinalStateModel>> {
        self.models.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Isotropic two-body decay of a parent at rest.
#[derive(Clone, Copy, Debug)]
pub struct TwoBodyDecay {
    a: Species,
    b: Species,
    /// Daughter momentum in the rest frame, MeV/c.
    p_star: f64,
}

impl TwoBodyDecay {
    /// `None` when the decay is kinematically forbidden.
    pub fn new(parent_mass: f64, a: Species, b: Species) -> Option<Self> {
        let (m1, m2) = (a.mass, b.mass);
        if parent_mass < m1 + m2 {
            return None;
        }
        let m2p = parent_mass * parent_mass;
        let lambda = (m2p - (m1 + m2).powi(2)) * (m2p - (m1 - m2).powi(2));
        Some(Self {
            a,
            b,
            p_star: lambda.max(0.0).sqrt() / (2.0 * parent_mass),
        })
    }

    pub fn daughter_momentum(&self) -> f64 {
        self.p_star
    }
}

impl FinalStateModel for TwoBodyDecay {
    fn generate(
        &self,
        rng: &mut dyn RngCore,
        _vertex: &Point3<f64>,
        time: f64,
    ) -> Result<Vec<FinalStateParticle>, String> {
        let dir = sample_isotropic_direction(rng);
        Ok(vec![
            FinalStateParticle {
                species: self.a,
                momentum: dir * self.p_star,
                time,
            },
            FinalStateParticle {
                species: self.b,
                momentum: -dir * self.p_star,
                time,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn pi0_decays_to_back_to_back_photons() {
        let reg = ModelRegistry::with_builtin();
        assert_eq!(reg.names(), vec!["pi0_decay"]);
        let model = reg.get("pi0_decay").unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let out = model.generate(&mut rng, &Point3::origin(), 3.0).unwrap();
        assert_eq!(out.len(), 2);
        assert!((out[0].momentum + out[1].momentum).norm() < 1e-9);
        let half_mass = Species::by_name("pi0").unwrap().mass / 2.0;
        assert!((out[0].kinetic_energy() - half_mass).abs() < 1e-9);
        assert_eq!(out[1].time, 3.0);
    }

    #[test]
    fn forbidden_decay_is_none() {
        let e = Species::by_name("e-").unwrap();
        assert!(TwoBodyDecay::new(0.5, e, e).is_none());
    }
}
