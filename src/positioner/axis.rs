// Axis registry for the cable positioner
//
// Each axis is one winch: a cable drum anchored at a fixed point in the world
// frame. Axes are fixed for the lifetime of the robot, so the registry only
// supports insertion and lookup.

use std::collections::BTreeMap;

use nalgebra::{Point3, Vector3};
use tracing::debug;

use super::PositionerError;

/// Motor controller identifier of an axis (as addressed on the drive bus)
pub type AxisId = u8;

/// Fixed geometric description of one winch
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    id: AxisId,
    anchor: Point3<f64>,
    drum_diameter: f64,
    attachment: Vector3<f64>,
}

impl Axis {
    pub fn id(&self) -> AxisId {
        self.id
    }

    /// Anchor point in meters
    pub fn anchor(&self) -> Point3<f64> {
        self.anchor
    }

    /// Drum diameter in meters (always > 0)
    pub fn drum_diameter(&self) -> f64 {
        self.drum_diameter
    }

    /// Offset from the platform reference point to where the cable is fixed
    pub fn attachment(&self) -> Vector3<f64> {
        self.attachment
    }
}

/// Registered axes keyed by id, iterated in ascending id order
#[derive(Debug, Clone, Default)]
pub struct AxisRegistry {
    axes: BTreeMap<AxisId, Axis>,
}

impl AxisRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an axis whose cable is fixed at the platform reference point
    pub fn register(
        &mut self,
        id: AxisId,
        anchor: Point3<f64>,
        drum_diameter: f64,
    ) -> Result<&Axis, PositionerError> {
        self.register_with_attachment(id, anchor, drum_diameter, Vector3::zeros())
    }

    /// Register an axis with a cable attachment offset on the platform
    pub fn register_with_attachment(
        &mut self,
        id: AxisId,
        anchor: Point3<f64>,
        drum_diameter: f64,
        attachment: Vector3<f64>,
    ) -> Result<&Axis, PositionerError> {
        if self.axes.contains_key(&id) {
            return Err(PositionerError::DuplicateAxis { id });
        }

        // NaN fails the comparison, so it lands here too
        if !(drum_diameter > 0.0) || drum_diameter.is_infinite() {
            return Err(PositionerError::InvalidGeometry {
                id,
                reason: format!("drum diameter must be positive, got {}", drum_diameter),
            });
        }
        if !anchor.iter().all(|c| c.is_finite()) {
            return Err(PositionerError::InvalidGeometry {
                id,
                reason: format!("anchor is not finite: {:?}", anchor),
            });
        }
        if !attachment.iter().all(|c| c.is_finite()) {
            return Err(PositionerError::InvalidGeometry {
                id,
                reason: format!("attachment offset is not finite: {:?}", attachment),
            });
        }

        debug!(
            "Registering axis {}: anchor=({:.3}, {:.3}, {:.3}), drum={:.4}m",
            id, anchor.x, anchor.y, anchor.z, drum_diameter
        );

        let axis = Axis {
            id,
            anchor,
            drum_diameter,
            attachment,
        };
        Ok(&*self.axes.entry(id).or_insert(axis))
    }

    pub fn lookup(&self, id: AxisId) -> Option<&Axis> {
        self.axes.get(&id)
    }

    /// All axes in ascending id order
    pub fn all_axes(&self) -> impl Iterator<Item = &Axis> {
        self.axes.values()
    }

    pub fn len(&self) -> usize {
        self.axes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.axes.is_empty()
    }
}
