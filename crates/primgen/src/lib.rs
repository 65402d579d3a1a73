//! Primary-particle generation for detector Monte Carlo.
//!
//! A run registers labelled generators from JSON documents, then asks the
//! registry for the primary vertices of each event. Each generator combines
//! one vertex strategy (with its time strategy), one direction strategy and
//! one energy strategy; geometry is reached only through `GeometryPort`.
//!
//! API Policy
//! - This crate is project-internal. There is no stable public API.
//! - Internal units are mm, ns, MeV and rad; documents may carry other units
//!   via `{"val": x, "unit": "..."}`.

pub mod direction;
pub mod energy;
pub mod error;
pub mod generator;
pub mod geometry;
pub mod orchestrator;
pub mod provenance;
pub mod sampling;
pub mod species;
pub mod time;
pub mod units;
pub mod vertex;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::{ConfigError, GeneratorError, GeometryError, SamplingError};
pub use generator::{EventRequest, GeneratorKind, PrimaryParticle, PrimaryVertex};
pub use geometry::{GeometryPort, VolumeStore};
pub use orchestrator::GeneratorRegistry;
pub use provenance::{EventProvenance, ProvenanceRecord, ProvenanceSink};

/// Common exports for callers driving a run.
pub mod prelude {
    pub use crate::generator::{
        EventRequest, FinalStateModel, FinalStateParticle, GeneratorKind, ModelRegistry,
        PrimaryGenerator, PrimaryParticle, PrimaryVertex,
    };
    pub use crate::geometry::{GeometryPort, Placement, Solid, Volume, VolumeStore};
    pub use crate::orchestrator::GeneratorRegistry;
    pub use crate::provenance::{EventProvenance, ProvenanceRecord, ProvenanceSink};
    pub use crate::species::Species;
    pub use nalgebra::{Point3, Vector3};
}
