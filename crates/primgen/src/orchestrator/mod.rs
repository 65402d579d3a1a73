//! Generator registry and per-event loop.
//!
//! Generators are kept in registration order; `generate_primaries` visits the
//! active ones in that order and concatenates their vertices. The provenance
//! sink is reset once per event before any generator runs, and again when a
//! generator fails, so it never holds records for an event that errored.

use rand::RngCore;
use serde_json::Value;

use crate::error::{ConfigError, GeneratorError, Result};
use crate::generator::{
    EventContext, EventRequest, ModelRegistry, ParticleGenerator, PrimaryGenerator, PrimaryVertex,
};
use crate::geometry::GeometryPort;
use crate::provenance::ProvenanceSink;

struct Entry {
    active: bool,
    generator: Box<dyn PrimaryGenerator>,
}

#[derive(Default)]
pub struct GeneratorRegistry {
    models: ModelRegistry,
    entries: Vec<Entry>,
}

impl GeneratorRegistry {
    pub fn new(models: ModelRegistry) -> Self {
        Self {
            models,
            entries: Vec::new(),
        }
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    /// Configure a generator from `doc` and store it under `label`.
    pub fn register(&mut self, label: &str, doc: &Value, geometry: &dyn GeometryPort) -> Result<()> {
        self.ensure_free(label)?;
        let generator = ParticleGenerator::from_doc(label, doc, geometry, &self.models).map_err(|source| {
            GeneratorError::Setup {
                label: label.to_string(),
                source,
            }
        })?;
        self.push(Box::new(generator));
        Ok(())
    }

    /// Store a generator built outside the document factory.
    pub fn register_boxed(&mut self, generator: Box<dyn PrimaryGenerator>) -> Result<()> {
        self.ensure_free(generator.label())?;
        self.push(generator);
        Ok(())
    }

    /// Register an ordered list of documents, each naming itself via `label`.
    /// Stops at the first failure; earlier generators stay registered.
    pub fn register_all(&mut self, docs: &[Value], geometry: &dyn GeometryPort) -> Result<()> {
        for (i, doc) in docs.iter().enumerate() {
            let label = doc
                .get("label")
                .and_then(Value::as_str)
                .ok_or_else(|| GeneratorError::Setup {
                    label: format!("#{i}"),
                    source: ConfigError::missing("label"),
                })?;
            self.register(label, doc, geometry)?;
        }
        Ok(())
    }

    pub fn set_active(&mut self, label: &str, active: bool) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.generator.label() == label)
            .ok_or_else(|| GeneratorError::UnknownLabel(label.to_string()))?;
        entry.active = active;
        tracing::info!(label, active, "generator toggled");
        Ok(())
    }

    pub fn is_active(&self, label: &str) -> Option<bool> {
        self.entries
            .iter()
            .find(|e| e.generator.label() == label)
            .map(|e| e.active)
    }

    /// Labels in registration order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.generator.label()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized document of every generator, in registration order.
    pub fn describe(&self) -> Vec<Value> {
        self.entries.iter().map(|e| e.generator.describe()).collect()
    }

    /// Run every active generator once for `request`.
    pub fn generate_primaries(
        &mut self,
        request: EventRequest,
        rng: &mut dyn RngCore,
        geometry: &dyn GeometryPort,
        sink: &mut dyn ProvenanceSink,
    ) -> Result<Vec<PrimaryVertex>> {
        sink.begin_event(request.event_id);
        let mut ctx = EventContext {
            request,
            rng,
            geometry,
            sink,
        };
        let mut out = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| e.active) {
            match entry.generator.generate(&mut ctx) {
                Ok(vertices) => out.extend(vertices),
                Err(source) => {
                    // Drop records of generators that already succeeded this event.
                    ctx.sink.begin_event(request.event_id);
                    return Err(GeneratorError::Sampling {
                        label: entry.generator.label().to_string(),
                        event_id: request.event_id,
                        source,
                    });
                }
            }
        }
        tracing::debug!(event = request.event_id, vertices = out.len(), "event generated");
        Ok(out)
    }

    fn ensure_free(&self, label: &str) -> Result<()> {
        if self.entries.iter().any(|e| e.generator.label() == label) {
            return Err(GeneratorError::DuplicateLabel(label.to_string()));
        }
        Ok(())
    }

    fn push(&mut self, generator: Box<dyn PrimaryGenerator>) {
        tracing::info!(
            label = generator.label(),
            kind = generator.kind().as_str(),
            "generator registered"
        );
        self.entries.push(Entry {
            active: true,
            generator,
        });
    }
}
