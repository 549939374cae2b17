use crate::all::*;

use nalgebra::{Isometry3, Translation3, UnitQuaternion};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PoseEstimate {
  // World units.
  pub position: Vector3d,
  // Radians about the x (pitch), y (heading) and z (roll) axes.
  pub rotation: Vector3d,
  pub plane_center: Vector2d,
  pub confidence: f64,
}

impl PoseEstimate {
  pub fn isometry(&self) -> Isometry3<f64> {
    let r = &self.rotation;
    Isometry3::from_parts(
      Translation3::from(self.position),
      UnitQuaternion::from_euler_angles(r[0], r[1], r[2]),
    )
  }
}

// Lateral placement from the aggregate image motion, orientation straight
// from the sensor. There is no depth estimation: the plane is assumed to be
// at a fixed distance, and the sensor angles are not filtered.
pub struct PoseEstimator {
  position_scale: f64,
  standoff_depth: f64,
}

impl PoseEstimator {
  pub fn new(p: &ParameterSet) -> PoseEstimator {
    PoseEstimator {
      position_scale: p.position_scale,
      standoff_depth: p.standoff_depth,
    }
  }

  pub fn estimate(&self, plane: &PlaneHypothesis, orientation: OrientationSample) -> PoseEstimate {
    PoseEstimate {
      position: Vector3d::new(
        plane.motion[0] * self.position_scale,
        plane.motion[1] * self.position_scale,
        self.standoff_depth,
      ),
      rotation: Vector3d::new(
        orientation.pitch.to_radians(),
        orientation.heading.to_radians(),
        orientation.roll.to_radians(),
      ),
      plane_center: plane.center,
      confidence: plane.confidence,
    }
  }
}
