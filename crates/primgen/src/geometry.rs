//! Geometry query port and a small in-memory volume store.
//!
//! Conventions
//! - `bounding_box` and `point_is_inside` work in the volume's local frame.
//! - `transform_to_world` maps local coordinates to world coordinates.
//! - `material_at` takes a world point and reports the innermost volume's
//!   material, `None` outside every volume.
//!
//! The transport engine's navigator normally sits behind this trait; the
//! `VolumeStore` covers tests, benches and the CLI.

use nalgebra::{Isometry3, Point3, Translation3, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::GeometryError;

/// Material name as reported by the geometry.
pub type MaterialId = String;

pub trait GeometryPort {
    fn transform_to_world(&self, volume: &str) -> Result<Isometry3<f64>, GeometryError>;

    /// Axis-aligned bounding box `(lo, hi)` in local coordinates.
    fn bounding_box(&self, volume: &str) -> Result<(Point3<f64>, Point3<f64>), GeometryError>;

    fn point_is_inside(&self, volume: &str, local: &Point3<f64>) -> Result<bool, GeometryError>;

    fn material_at(&self, world: &Point3<f64>) -> Option<MaterialId>;
}

/// Primitive solids, centred on their local origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum Solid {
    Box { half: [f64; 3] },
    Sphere { radius: f64 },
    /// Axis along local z.
    Cylinder { radius: f64, half_z: f64 },
}

impl Solid {
    fn validate(&self, name: &str) -> Result<(), GeometryError> {
        let ok = match *self {
            Solid::Box { half } => half.iter().all(|h| h.is_finite() && *h > 0.0),
            Solid::Sphere { radius } => radius.is_finite() && radius > 0.0,
            Solid::Cylinder { radius, half_z } => {
                radius.is_finite() && radius > 0.0 && half_z.is_finite() && half_z > 0.0
            }
        };
        if ok {
            Ok(())
        } else {
            Err(GeometryError::InvalidSolid {
                volume: name.to_string(),
                reason: "dimensions must be finite and positive".into(),
            })
        }
    }

    pub fn bounding_box(&self) -> (Point3<f64>, Point3<f64>) {
        let h = match *self {
            Solid::Box { half } => Vector3::from(half),
            Solid::Sphere { radius } => Vector3::repeat(radius),
            Solid::Cylinder { radius, half_z } => Vector3::new(radius, radius, half_z),
        };
        (Point3::from(-h), Point3::from(h))
    }

    pub fn contains(&self, p: &Point3<f64>) -> bool {
        match *self {
            Solid::Box { half } => {
                p.x.abs() <= half[0] && p.y.abs() <= half[1] && p.z.abs() <= half[2]
            }
            Solid::Sphere { radius } => p.coords.norm_squared() <= radius * radius,
            Solid::Cylinder { radius, half_z } => {
                p.x * p.x + p.y * p.y <= radius * radius && p.z.abs() <= half_z
            }
        }
    }
}

/// Placement of a volume: translation plus an axis-angle rotation (radians).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    #[serde(default)]
    pub translation: [f64; 3],
    #[serde(default)]
    pub rotation: [f64; 3],
}

impl Placement {
    pub fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(
            Translation3::from(Vector3::from(self.translation)),
            UnitQuaternion::from_scaled_axis(Vector3::from(self.rotation)),
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Volume {
    pub name: String,
    pub solid: Solid,
    #[serde(default)]
    pub placement: Placement,
    pub material: MaterialId,
}

/// Ordered list of placed volumes. Later entries count as nested deeper.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct VolumeStore {
    volumes: Vec<Volume>,
}

impl VolumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_volumes(volumes: Vec<Volume>) -> Result<Self, GeometryError> {
        let mut store = Self::new();
        for v in volumes {
            store.add(v)?;
        }
        Ok(store)
    }

    /// Add a volume; replaces an existing volume of the same name.
    pub fn add(&mut self, volume: Volume) -> Result<&mut Self, GeometryError> {
        volume.solid.validate(&volume.name)?;
        self.volumes.retain(|v| v.name != volume.name);
        self.volumes.push(volume);
        Ok(self)
    }

    /// Convenience for an unrotated volume.
    pub fn with(
        mut self,
        name: &str,
        solid: Solid,
        translation: [f64; 3],
        material: &str,
    ) -> Result<Self, GeometryError> {
        self.add(Volume {
            name: name.to_string(),
            solid,
            placement: Placement {
                translation,
                rotation: [0.0; 3],
            },
            material: material.to_string(),
        })?;
        Ok(self)
    }

    pub fn volumes(&self) -> &[Volume] {
        &self.volumes
    }

    fn get(&self, name: &str) -> Result<&Volume, GeometryError> {
        self.volumes
            .iter()
            .find(|v| v.name == name)
            .ok_or_else(|| GeometryError::UnknownVolume(name.to_string()))
    }
}

impl GeometryPort for VolumeStore {
    fn transform_to_world(&self, volume: &str) -> Result<Isometry3<f64>, GeometryError> {
        Ok(self.get(volume)?.placement.isometry())
    }

    fn bounding_box(&self, volume: &str) -> Result<(Point3<f64>, Point3<f64>), GeometryError> {
        Ok(self.get(volume)?.solid.bounding_box())
    }

    fn point_is_inside(&self, volume: &str, local: &Point3<f64>) -> Result<bool, GeometryError> {
        Ok(self.get(volume)?.solid.contains(local))
    }

    fn material_at(&self, world: &Point3<f64>) -> Option<MaterialId> {
        self.volumes
            .iter()
            .rev()
            .find(|v| {
                let local = v.placement.isometry().inverse_transform_point(world);
                v.solid.contains(&local)
            })
            .map(|v| v.material.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> VolumeStore {
        VolumeStore::new()
            .with(
                "world",
                Solid::Box {
                    half: [5000.0, 5000.0, 5000.0],
                },
                [0.0; 3],
                "air",
            )
            .unwrap()
            .with(
                "tank",
                Solid::Cylinder {
                    radius: 1000.0,
                    half_z: 1500.0,
                },
                [0.0, 0.0, 200.0],
                "water",
            )
            .unwrap()
    }

    #[test]
    fn material_prefers_innermost_volume() {
        let s = store();
        assert_eq!(s.material_at(&Point3::new(0.0, 0.0, 0.0)).as_deref(), Some("water"));
        assert_eq!(s.material_at(&Point3::new(2000.0, 0.0, 0.0)).as_deref(), Some("air"));
        assert_eq!(s.material_at(&Point3::new(9000.0, 0.0, 0.0)), None);
    }

    #[test]
    fn unknown_volume_is_an_error() {
        let s = store();
        assert!(matches!(
            s.bounding_box("cryostat"),
            Err(GeometryError::UnknownVolume(_))
        ));
    }

    #[test]
    fn placement_rotates_and_translates() {
        let p = Placement {
            translation: [1.0, 0.0, 0.0],
            rotation: [0.0, 0.0, std::f64::consts::FRAC_PI_2],
        };
        let w = p.isometry() * Point3::new(1.0, 0.0, 0.0);
        assert!((w - Point3::new(1.0, 1.0, 0.0)).norm() < 1e-12);
    }

    #[test]
    fn degenerate_solid_rejected() {
        let err = VolumeStore::new()
            .with("flat", Solid::Sphere { radius: 0.0 }, [0.0; 3], "air")
            .unwrap_err();
        assert!(matches!(err, GeometryError::InvalidSolid { .. }));
    }
}
