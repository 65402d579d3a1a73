//! Error taxonomy for setup and event generation.
//!
//! - `GeometryError`: a geometry lookup failed (unknown volume, bad store).
//! - `ConfigError`: a generator document section is missing, mistyped or
//!   names something that does not exist. Always fatal for that generator.
//! - `SamplingError`: a per-event failure (rejection loop exhausted, external
//!   model failed). Surfaced to the caller, never swallowed.
//! - `GeneratorError`: what the orchestrator returns; attaches the generator
//!   label to the lower-level errors.
//!
//! Degenerate numeric cases (no admissible fiducial root) are not errors;
//! they log a warning and fall back, see `sampling::solve_fiducial_shrink`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("unknown volume `{0}`")]
    UnknownVolume(String),
    #[error("invalid solid for volume `{volume}`: {reason}")]
    InvalidSolid { volume: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing mandatory field `{field}`")]
    Missing { field: String },
    #[error("invalid field `{field}`: {reason}")]
    Invalid { field: String, reason: String },
    #[error("unknown generator type `{0}`")]
    UnknownKind(String),
    #[error("unknown final-state model `{0}`")]
    UnknownModel(String),
    #[error("geometry lookup failed: {0}")]
    Geometry(#[from] GeometryError),
    #[error("reading `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    pub(crate) fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Prefix the field path with an enclosing section name.
    pub(crate) fn within(self, section: &str) -> Self {
        match self {
            Self::Missing { field } => Self::Missing {
                field: format!("{section}.{field}"),
            },
            Self::Invalid { field, reason } => Self::Invalid {
                field: format!("{section}.{field}"),
                reason,
            },
            other => other,
        }
    }
}

#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("no accepted point in `{volume}` after {tries} tries (fiducial fraction or material filter too restrictive?)")]
    Exhausted { volume: String, tries: u64 },
    #[error("{what}: no draw inside the configured range after {tries} tries")]
    RangeExhausted { what: &'static str, tries: u64 },
    #[error("geometry lookup failed: {0}")]
    Geometry(#[from] GeometryError),
    #[error("final-state model `{model}` failed: {reason}")]
    Model { model: String, reason: String },
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("generator `{label}`: {source}")]
    Setup {
        label: String,
        #[source]
        source: ConfigError,
    },
    #[error("generator label `{0}` is already registered")]
    DuplicateLabel(String),
    #[error("no generator registered under `{0}`")]
    UnknownLabel(String),
    #[error("generator `{label}` failed during event {event_id}: {source}")]
    Sampling {
        label: String,
        event_id: u64,
        #[source]
        source: SamplingError,
    },
}

pub type Result<T, E = GeneratorError> = std::result::Result<T, E>;
