//! Vertex generators: where a primary originates and when.
//!
//! Lifecycle: `VertexGenerator::from_doc` once at setup (geometry lookups,
//! fiducial solve, face areas), then `shoot_vertex` per particle or vertex.
//! Each generator owns its `TimeGenerator`.
//!
//! Document shape:
//! `{"type": "point"|"bulk"|"boxsurface"|"gps_pos", "config": {...}, "time": {...}}`

mod box_surface;
mod bulk;
mod point;
mod positional;

pub use box_surface::{BoxSurface, BoxSurfaceDoc, FaceChoice};
pub use bulk::{BulkVolume, BulkVolumeDoc, DEFAULT_MAX_TRIES};
pub use point::{PointDoc, PointVertex};
pub use positional::{PositionalDistribution, PositionalDoc, PositionalShape};
pub(crate) use positional::frame_from_rot;

use nalgebra::Point3;
use rand::Rng;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ConfigError, SamplingError};
use crate::geometry::GeometryPort;
use crate::time::{TimeDoc, TimeGenerator};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VertexType {
    #[serde(rename = "point")]
    Point,
    #[serde(rename = "bulk")]
    Bulk,
    #[serde(rename = "boxsurface")]
    BoxSurface,
    #[serde(rename = "gps_pos")]
    GpsPos,
}

/// Document form of the `vertex_gen` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexGenDoc {
    #[serde(rename = "type")]
    pub kind: VertexType,
    pub config: Value,
    #[serde(default)]
    pub time: TimeDoc,
}

#[derive(Clone, Debug)]
pub enum VertexStrategy {
    Point(PointVertex),
    Bulk(BulkVolume),
    BoxSurface(BoxSurface),
    Positional(PositionalDistribution),
}

#[derive(Clone, Debug)]
pub struct VertexGenerator {
    strategy: VertexStrategy,
    time: TimeGenerator,
    doc: VertexGenDoc,
}

fn parse_config<T: DeserializeOwned>(config: &Value) -> Result<T, ConfigError> {
    T::deserialize(config).map_err(|e| ConfigError::invalid("config", e.to_string()))
}

impl VertexGenerator {
    pub fn from_doc(doc: &VertexGenDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        let time = TimeGenerator::from_doc(&doc.time).map_err(|e| e.within("time"))?;
        let (strategy, config) = match doc.kind {
            VertexType::Point => {
                let d: PointDoc = parse_config(&doc.config)?;
                let v = PointVertex::from_doc(&d, geometry).map_err(|e| e.within("config"))?;
                (VertexStrategy::Point(v), to_value(&d))
            }
            VertexType::Bulk => {
                let d: BulkVolumeDoc = parse_config(&doc.config)?;
                let v = BulkVolume::from_doc(&d, geometry).map_err(|e| e.within("config"))?;
                (VertexStrategy::Bulk(v), to_value(&d))
            }
            VertexType::BoxSurface => {
                let d: BoxSurfaceDoc = parse_config(&doc.config)?;
                let v = BoxSurface::from_doc(&d, geometry).map_err(|e| e.within("config"))?;
                (VertexStrategy::BoxSurface(v), to_value(&d))
            }
            VertexType::GpsPos => {
                let d: PositionalDoc = parse_config(&doc.config)?;
                let v = PositionalDistribution::from_doc(&d, geometry)
                    .map_err(|e| e.within("config"))?;
                (VertexStrategy::Positional(v), to_value(&d))
            }
        };
        // Keep the normalized config (defaults filled in) for export.
        let doc = VertexGenDoc {
            kind: doc.kind,
            config,
            time: doc.time.clone(),
        };
        Ok(Self {
            strategy,
            time,
            doc,
        })
    }

    pub fn strategy(&self) -> &VertexStrategy {
        &self.strategy
    }

    pub fn time_generator(&self) -> &TimeGenerator {
        &self.time
    }

    /// World-space vertex position.
    pub fn shoot_vertex<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        geometry: &dyn GeometryPort,
        event_index: u64,
    ) -> Result<Point3<f64>, SamplingError> {
        match &self.strategy {
            VertexStrategy::Point(p) => Ok(p.shoot(event_index)),
            VertexStrategy::Bulk(b) => b.shoot(rng, geometry),
            VertexStrategy::BoxSurface(s) => Ok(s.shoot(rng)),
            VertexStrategy::Positional(p) => p.shoot(rng, geometry),
        }
    }

    pub fn sample_time<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.time.sample_time(rng)
    }

    /// Area particles enter through, for flux generators (mm²).
    pub fn exposed_area(&self) -> Option<f64> {
        match &self.strategy {
            VertexStrategy::BoxSurface(s) => Some(s.exposed_area()),
            VertexStrategy::Positional(p) => p.exposed_area(),
            VertexStrategy::Point(_) | VertexStrategy::Bulk(_) => None,
        }
    }

    pub fn doc(&self) -> &VertexGenDoc {
        &self.doc
    }

    /// Setup-time derived quantities for diagnostic export.
    pub fn derived(&self) -> Value {
        let mut out = match &self.strategy {
            VertexStrategy::Point(p) => p.derived(),
            VertexStrategy::Bulk(b) => b.derived(),
            VertexStrategy::BoxSurface(s) => s.derived(),
            VertexStrategy::Positional(p) => p.derived(),
        };
        if let Value::Object(map) = &mut out {
            map.insert("time_window_ns".into(), json!(self.time.total_window()));
        }
        out
    }
}

fn to_value<T: Serialize>(doc: &T) -> Value {
    // Docs are plain data (strings, numbers, arrays); serialization cannot fail.
    serde_json::to_value(doc).unwrap_or(Value::Null)
}

pub(crate) fn point_json(p: &Point3<f64>) -> Value {
    json!([p.x, p.y, p.z])
}

#[cfg(test)]
mod tests;
