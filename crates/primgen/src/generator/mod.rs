//! Configured primary generators.
//!
//! A `ParticleGenerator` is built once from a JSON document: the factory
//! picks a vertex strategy (which owns the time strategy), a direction and an
//! energy strategy, and a generator kind. Per event it runs its sampling loop
//! and appends one provenance record per emitted particle.
//!
//! Vertex grouping depends on the kind: `gun`, `cosmic` and `flux` emit one
//! vertex per particle, `bomb` puts all particles on one vertex, `decay` and
//! `reaction` emit one vertex per model call.

pub mod models;

pub use models::{FinalStateModel, FinalStateParticle, ModelRegistry, TwoBodyDecay};

use nalgebra::{Point3, Vector3};
use rand::{Rng, RngCore};
use rand_distr::{Distribution, Poisson};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::sync::Arc;

use crate::direction::{DirectionDoc, DirectionGenerator, DirectionSample};
use crate::energy::{EnergyDoc, EnergySampler};
use crate::error::{ConfigError, SamplingError};
use crate::geometry::GeometryPort;
use crate::provenance::{ProvenanceRecord, ProvenanceSink};
use crate::sampling::sample_linear_polarization;
use crate::species::{Species, SpeciesDoc};
use crate::units::{Dimension, Quantity};
use crate::vertex::{VertexGenDoc, VertexGenerator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorKind {
    Gun,
    Bomb,
    Decay,
    Reaction,
    Cosmic,
    Flux,
}

impl GeneratorKind {
    pub const ALL: [GeneratorKind; 6] = [
        Self::Gun,
        Self::Bomb,
        Self::Decay,
        Self::Reaction,
        Self::Cosmic,
        Self::Flux,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gun => "gun",
            Self::Bomb => "bomb",
            Self::Decay => "decay",
            Self::Reaction => "reaction",
            Self::Cosmic => "cosmic",
            Self::Flux => "flux",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Numeric code written into provenance records.
    pub fn code(self) -> u32 {
        match self {
            Self::Gun => 1,
            Self::Bomb => 2,
            Self::Decay => 3,
            Self::Reaction => 4,
            Self::Cosmic => 5,
            Self::Flux => 6,
        }
    }

    fn uses_model(self) -> bool {
        matches!(self, Self::Decay | Self::Reaction)
    }
}

/// Which event is being generated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EventRequest {
    pub event_id: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrimaryParticle {
    pub species: Species,
    /// MeV/c.
    pub momentum: Vector3<f64>,
    /// MeV.
    pub kinetic_energy: f64,
    /// ns.
    pub time: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarization: Option<Vector3<f64>>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrimaryVertex {
    /// World coordinates, mm.
    pub position: Point3<f64>,
    pub time: f64,
    pub particles: Vec<PrimaryParticle>,
}

/// Everything a generator may touch while producing one event.
pub struct EventContext<'a> {
    pub request: EventRequest,
    pub rng: &'a mut dyn RngCore,
    pub geometry: &'a dyn GeometryPort,
    pub sink: &'a mut dyn ProvenanceSink,
}

/// Capability shared by every registry entry.
pub trait PrimaryGenerator {
    fn label(&self) -> &str;

    fn kind(&self) -> GeneratorKind;

    fn generate(&mut self, ctx: &mut EventContext<'_>) -> Result<Vec<PrimaryVertex>, SamplingError>;

    /// Resolved configuration for run-provenance logging.
    fn describe(&self) -> Value;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarization {
    #[serde(rename = "none")]
    Unpolarized,
    Random,
}

/// Normalized generator document, written back by `describe`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneratorDoc {
    #[serde(rename = "type")]
    pub kind: GeneratorKind,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_particles: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub particle: Option<SpeciesDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergyDoc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<DirectionDoc>,
    pub vertex_gen: VertexGenDoc,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarization: Option<Polarization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flux: Option<Quantity<f64>>,
}

fn section<T: DeserializeOwned>(doc: &Map<String, Value>, field: &str) -> Result<Option<T>, ConfigError> {
    match doc.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => T::deserialize(v)
            .map(Some)
            .map_err(|e| ConfigError::invalid(field, e.to_string())),
    }
}

fn required<T: DeserializeOwned>(doc: &Map<String, Value>, field: &str) -> Result<T, ConfigError> {
    section(doc, field)?.ok_or_else(|| ConfigError::missing(field))
}

/// Read the `type` field and map it to a kind.
pub fn parse_kind(doc: &Value) -> Result<GeneratorKind, ConfigError> {
    let raw = doc.get("type").ok_or_else(|| ConfigError::missing("type"))?;
    let s = raw
        .as_str()
        .ok_or_else(|| ConfigError::invalid("type", "must be a string"))?;
    GeneratorKind::parse(s).ok_or_else(|| ConfigError::UnknownKind(s.to_string()))
}

/// Particle species, energy and direction for kinds that emit their own particles.
#[derive(Clone, Debug)]
struct ParticleSource {
    species: Species,
    energy: EnergySampler,
    direction: DirectionGenerator,
    polarize: bool,
}

impl ParticleSource {
    fn emit<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        position: &Point3<f64>,
        time: f64,
    ) -> Result<(PrimaryParticle, DirectionSample), SamplingError> {
        let sample = self.direction.sample(rng, position);
        let dir = sample.direction;
        let kinetic_energy = self.energy.sample_energy(rng)?;
        let polarization = self
            .polarize
            .then(|| sample_linear_polarization(rng, &dir));
        let particle = PrimaryParticle {
            species: self.species,
            momentum: dir * self.species.momentum_magnitude(kinetic_energy),
            kinetic_energy,
            time,
            polarization,
        };
        Ok((particle, sample))
    }
}

enum Emission {
    /// One vertex per particle (`shared == false`) or one for all (`bomb`).
    Particles { source: ParticleSource, shared: bool },
    FinalState { model: Arc<dyn FinalStateModel>, name: String },
}

enum Multiplicity {
    Fixed(u32),
    /// Flux generators: `Poisson(flux · area · window)` per event.
    Poisson { mean: f64, dist: Poisson<f64> },
}

pub struct ParticleGenerator {
    doc: GeneratorDoc,
    vertex: VertexGenerator,
    emission: Emission,
    multiplicity: Multiplicity,
}

impl ParticleGenerator {
    /// Build from a generator document. `label` overrides the document's own.
    pub fn from_doc(
        label: &str,
        doc: &Value,
        geometry: &dyn GeometryPort,
        models: &ModelRegistry,
    ) -> Result<Self, ConfigError> {
        let kind = parse_kind(doc)?;
        let map = doc
            .as_object()
            .ok_or_else(|| ConfigError::invalid("document", "must be a JSON object"))?;

        let vertex_doc: VertexGenDoc = required(map, "vertex_gen")?;
        let vertex =
            VertexGenerator::from_doc(&vertex_doc, geometry).map_err(|e| e.within("vertex_gen"))?;

        let n_particles: Option<u32> = section(map, "n_particles")?;
        let flux: Option<Quantity<f64>> = section(map, "flux")?;
        let multiplicity = match kind {
            GeneratorKind::Flux => {
                let q = flux.as_ref().ok_or_else(|| ConfigError::missing("flux"))?;
                let rate = q.resolve(Dimension::Flux, "flux")?;
                let area = vertex.exposed_area().ok_or_else(|| {
                    ConfigError::invalid("vertex_gen", "flux needs a vertex generator with an exposed area")
                })?;
                let window = vertex.time_generator().total_window();
                let mean = rate * area * window;
                if !(mean > 0.0 && mean.is_finite()) {
                    return Err(ConfigError::invalid(
                        "flux",
                        format!("expected count {mean} must be positive (flux, area and time window > 0)"),
                    ));
                }
                let dist = Poisson::new(mean).map_err(|e| ConfigError::invalid("flux", e.to_string()))?;
                Multiplicity::Poisson { mean, dist }
            }
            _ => {
                let n = n_particles.ok_or_else(|| ConfigError::missing("n_particles"))?;
                Multiplicity::Fixed(n)
            }
        };

        let particle: Option<SpeciesDoc> = section(map, "particle")?;
        let energy_doc: Option<EnergyDoc> = section(map, "energy")?;
        let direction_doc: Option<DirectionDoc> = section(map, "direction")?;
        let polarization: Option<Polarization> = section(map, "polarization")?;
        let model_name: Option<String> = section(map, "model")?;

        let emission = if kind.uses_model() {
            let name = model_name.clone().ok_or_else(|| ConfigError::missing("model"))?;
            let model = models
                .get(&name)
                .ok_or_else(|| ConfigError::UnknownModel(name.clone()))?;
            Emission::FinalState { model, name }
        } else {
            let species = particle
                .as_ref()
                .ok_or_else(|| ConfigError::missing("particle"))?
                .resolve("particle")?;
            let energy_doc = energy_doc.as_ref().ok_or_else(|| ConfigError::missing("energy"))?;
            let energy = EnergySampler::from_doc(energy_doc).map_err(|e| e.within("energy"))?;
            let direction_doc = direction_doc
                .as_ref()
                .ok_or_else(|| ConfigError::missing("direction"))?;
            let direction = DirectionGenerator::from_doc(direction_doc, geometry)
                .map_err(|e| e.within("direction"))?;
            Emission::Particles {
                source: ParticleSource {
                    species,
                    energy,
                    direction,
                    polarize: polarization == Some(Polarization::Random),
                },
                shared: kind == GeneratorKind::Bomb,
            }
        };

        let normalized = GeneratorDoc {
            kind,
            label: label.to_string(),
            n_particles,
            particle,
            energy: energy_doc,
            direction: direction_doc,
            vertex_gen: vertex.doc().clone(),
            polarization,
            model: model_name,
            flux,
        };
        tracing::info!(label, kind = kind.as_str(), "generator configured");
        Ok(Self {
            doc: normalized,
            vertex,
            emission,
            multiplicity,
        })
    }

    pub fn doc(&self) -> &GeneratorDoc {
        &self.doc
    }

    pub fn vertex_generator(&self) -> &VertexGenerator {
        &self.vertex
    }

    /// Particles (or model calls) expected per event.
    pub fn expected_count(&self) -> f64 {
        match &self.multiplicity {
            Multiplicity::Fixed(n) => *n as f64,
            Multiplicity::Poisson { mean, .. } => *mean,
        }
    }

    fn draw_count<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        match &self.multiplicity {
            Multiplicity::Fixed(n) => *n,
            Multiplicity::Poisson { dist, .. } => {
                let n: f64 = dist.sample(rng);
                n as u32
            }
        }
    }

    fn record(&self, energy: f64, direction: &Vector3<f64>) -> ProvenanceRecord {
        ProvenanceRecord::new(self.doc.kind.code(), &self.doc.label, energy, direction)
    }
}

impl PrimaryGenerator for ParticleGenerator {
    fn label(&self) -> &str {
        &self.doc.label
    }

    fn kind(&self) -> GeneratorKind {
        self.doc.kind
    }

    fn generate(&mut self, ctx: &mut EventContext<'_>) -> Result<Vec<PrimaryVertex>, SamplingError> {
        let event = ctx.request.event_id;
        let count = self.draw_count(&mut *ctx.rng);
        let mut vertices = Vec::new();
        // Held back until every draw succeeded, so a failed event leaves no
        // records for vertices that were never returned.
        let mut records = Vec::new();
        match &self.emission {
            Emission::Particles { source, shared: true } => {
                if count > 0 {
                    let position = self.vertex.shoot_vertex(&mut *ctx.rng, ctx.geometry, event)?;
                    let time = self.vertex.sample_time(&mut *ctx.rng);
                    let mut particles = Vec::with_capacity(count as usize);
                    for _ in 0..count {
                        let (particle, sample) = source.emit(&mut *ctx.rng, &position, time)?;
                        records.push(self.record(particle.kinetic_energy, &sample.direction));
                        particles.push(particle);
                    }
                    vertices.push(PrimaryVertex {
                        position,
                        time,
                        particles,
                    });
                }
            }
            Emission::Particles { source, shared: false } => {
                for _ in 0..count {
                    let position = self.vertex.shoot_vertex(&mut *ctx.rng, ctx.geometry, event)?;
                    let time = self.vertex.sample_time(&mut *ctx.rng);
                    let (particle, sample) = source.emit(&mut *ctx.rng, &position, time)?;
                    records.push(self.record(particle.kinetic_energy, &sample.direction));
                    vertices.push(PrimaryVertex {
                        position,
                        time,
                        particles: vec![particle],
                    });
                }
            }
            Emission::FinalState { model, name } => {
                for _ in 0..count {
                    let position = self.vertex.shoot_vertex(&mut *ctx.rng, ctx.geometry, event)?;
                    let time = self.vertex.sample_time(&mut *ctx.rng);
                    let out = model
                        .generate(&mut *ctx.rng, &position, time)
                        .map_err(|reason| SamplingError::Model {
                            model: name.clone(),
                            reason,
                        })?;
                    let particles: Vec<PrimaryParticle> = out
                        .into_iter()
                        .map(|fs| PrimaryParticle {
                            species: fs.species,
                            momentum: fs.momentum,
                            kinetic_energy: fs.kinetic_energy(),
                            time: fs.time,
                            polarization: None,
                        })
                        .collect();
                    for particle in &particles {
                        let p = particle.momentum;
                        let dir = if p.norm() > 0.0 { p.normalize() } else { p };
                        records.push(self.record(particle.kinetic_energy, &dir));
                    }
                    vertices.push(PrimaryVertex {
                        position,
                        time,
                        particles,
                    });
                }
            }
        }
        tracing::debug!(
            label = %self.doc.label,
            event,
            count,
            vertices = vertices.len(),
            "generated primaries"
        );
        for record in records {
            ctx.sink.record(record);
        }
        Ok(vertices)
    }

    fn describe(&self) -> Value {
        let mut doc = serde_json::to_value(&self.doc).unwrap_or_else(|_| json!({}));
        let mut derived = json!({
            "generator_code": self.doc.kind.code(),
            "expected_count_per_event": self.expected_count(),
            "vertex": self.vertex.derived(),
        });
        if let Emission::Particles { source, .. } = &self.emission {
            derived["direction"] = source.direction.derived();
            derived["particle_pdg"] = json!(source.species.pdg);
        }
        if let Value::Object(map) = &mut doc {
            map.insert("derived".into(), derived);
        }
        doc
    }
}

#[cfg(test)]
mod tests;
