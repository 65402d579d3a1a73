//! Fixed vertex position, optionally cycling through a list by event index.

use nalgebra::{Isometry3, Point3};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ConfigError;
use crate::geometry::GeometryPort;
use crate::units::{Dimension, Quantity};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointDoc {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Quantity<[f64; 3]>>,
    /// Alternate positions, selected by `event_index mod len`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positions: Vec<Quantity<[f64; 3]>>,
    /// Positions are given in this volume's local frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
}

/// World-space positions, resolved at setup.
#[derive(Clone, Debug)]
pub struct PointVertex {
    positions: Vec<Point3<f64>>,
}

impl PointVertex {
    pub fn from_doc(doc: &PointDoc, geometry: &dyn GeometryPort) -> Result<Self, ConfigError> {
        let to_world = match &doc.volume {
            Some(name) => geometry.transform_to_world(name)?,
            None => Isometry3::identity(),
        };
        if doc.position.is_some() && !doc.positions.is_empty() {
            return Err(ConfigError::invalid(
                "positions",
                "give either `position` or `positions`, not both",
            ));
        }
        let locals = if doc.positions.is_empty() {
            let p = doc
                .position
                .as_ref()
                .ok_or_else(|| ConfigError::missing("position"))?;
            vec![p.resolve(Dimension::Length, "position")?]
        } else {
            doc.positions
                .iter()
                .map(|p| p.resolve(Dimension::Length, "positions"))
                .collect::<Result<Vec<_>, _>>()?
        };
        let positions = locals
            .into_iter()
            .map(|v| to_world * Point3::from(v))
            .collect();
        Ok(Self { positions })
    }

    pub fn shoot(&self, event_index: u64) -> Point3<f64> {
        let i = (event_index % self.positions.len() as u64) as usize;
        self.positions[i]
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub(crate) fn derived(&self) -> Value {
        json!({
            "world_positions_mm": self.positions.iter().map(super::point_json).collect::<Vec<_>>(),
        })
    }
}
