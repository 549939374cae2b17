use crate::all::*;

// The current generation of tracked points, and the policy for replacing it.
pub struct FeatureSet {
  min_features: usize,
  refresh_interval: usize,
  corner_parameters: CornerParameters,
  points: Vec<Vector2d>,
}

impl FeatureSet {
  pub fn new(p: &ParameterSet) -> FeatureSet {
    FeatureSet {
      min_features: p.min_features,
      refresh_interval: p.refresh_interval,
      corner_parameters: p.corner_parameters(),
      points: vec![],
    }
  }

  pub fn points(&self) -> &[Vector2d] {
    &self.points
  }

  pub fn len(&self) -> usize {
    self.points.len()
  }

  pub fn is_empty(&self) -> bool {
    self.points.is_empty()
  }

  pub fn needs_refresh(&self, frame_number: usize) -> bool {
    self.points.len() < self.min_features || frame_number % self.refresh_interval == 0
  }

  // Replaces all points with fresh detections from `image`. On failure the
  // set is left empty so that the next frame tries again.
  pub fn refresh(&mut self, vision: &mut dyn VisionPrimitives, image: &Image) {
    if let Err(err) = vision.detect_corners(image, &self.corner_parameters, &mut self.points) {
      warn!("Corner detection failed: {:#}", err);
      self.points.clear();
    }
    self.points.retain(is_finite);
    debug!("Detected {} corners.", self.points.len());
  }

  // Gives the buffer to the motion tracker, which swaps in the survivors.
  pub fn points_mut(&mut self) -> &mut Vec<Vector2d> {
    &mut self.points
  }

  pub fn clear(&mut self) {
    self.points.clear();
  }
}
