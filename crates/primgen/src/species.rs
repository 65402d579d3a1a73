//! Particle species known to the generators (PDG code, name, rest mass).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Species {
    pub pdg: i32,
    pub name: &'static str,
    /// Rest mass in MeV.
    pub mass: f64,
}

const fn sp(pdg: i32, name: &'static str, mass: f64) -> Species {
    Species { pdg, name, mass }
}

const TABLE: &[Species] = &[
    sp(0, "geantino", 0.0),
    sp(22, "gamma", 0.0),
    sp(11, "e-", 0.510_998_95),
    sp(-11, "e+", 0.510_998_95),
    sp(13, "mu-", 105.658_375_5),
    sp(-13, "mu+", 105.658_375_5),
    sp(12, "nu_e", 0.0),
    sp(-12, "anti_nu_e", 0.0),
    sp(14, "nu_mu", 0.0),
    sp(-14, "anti_nu_mu", 0.0),
    sp(211, "pi+", 139.570_39),
    sp(-211, "pi-", 139.570_39),
    sp(111, "pi0", 134.976_8),
    sp(2212, "proton", 938.272_088),
    sp(2112, "neutron", 939.565_421),
    sp(1_000_020_040, "alpha", 3727.379_4),
];

impl Species {
    pub fn by_name(name: &str) -> Option<Species> {
        TABLE.iter().copied().find(|s| s.name == name)
    }

    pub fn by_pdg(pdg: i32) -> Option<Species> {
        TABLE.iter().copied().find(|s| s.pdg == pdg)
    }

    /// `|p| = √(T² + 2Tm)` for kinetic energy `T`.
    pub fn momentum_magnitude(&self, kinetic: f64) -> f64 {
        (kinetic * kinetic + 2.0 * kinetic * self.mass).sqrt()
    }
}

/// Document form: a species name or a PDG code.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpeciesDoc {
    Pdg(i32),
    Name(String),
}

impl SpeciesDoc {
    pub fn resolve(&self, field: &str) -> Result<Species, ConfigError> {
        match self {
            SpeciesDoc::Pdg(code) => Species::by_pdg(*code)
                .ok_or_else(|| ConfigError::invalid(field, format!("unknown PDG code {code}"))),
            SpeciesDoc::Name(name) => Species::by_name(name)
                .ok_or_else(|| ConfigError::invalid(field, format!("unknown particle `{name}`"))),
        }
    }
}

impl Serialize for Species {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.name)
    }
}
