use crate::all::*;

// A point tracked from the previous frame to the current one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Correspondence {
  pub previous: Vector2d,
  pub current: Vector2d,
}

impl Correspondence {
  pub fn displacement(&self) -> Vector2d {
    self.current - self.previous
  }
}

pub struct MotionTracker {
  max_displacement: f64,
  flow_parameters: FlowParameters,
  // Workspace.
  predicted: Vec<Vector2d>,
  statuses: Vec<bool>,
}

impl MotionTracker {
  pub fn new(p: &ParameterSet) -> MotionTracker {
    MotionTracker {
      max_displacement: p.max_displacement,
      flow_parameters: p.flow_parameters(),
      predicted: vec![],
      statuses: vec![],
    }
  }

  // Moves `points` from `image0` to `image1`. Lost and outlier points are
  // dropped from `points`, the survivors are written to `correspondences`.
  // If the flow computation fails, both end up empty.
  pub fn process(
    &mut self,
    vision: &mut dyn VisionPrimitives,
    image0: &Image,
    image1: &Image,
    points: &mut Vec<Vector2d>,
    correspondences: &mut Vec<Correspondence>,
  ) {
    correspondences.clear();
    if points.is_empty() { return }

    let result = vision.track(
      image0,
      image1,
      points,
      &self.flow_parameters,
      &mut self.predicted,
      &mut self.statuses,
    ).and_then(|()| {
      if self.predicted.len() != points.len() || self.statuses.len() != points.len() {
        bail!("Optical flow returned {} points and {} statuses for {} inputs.",
          self.predicted.len(), self.statuses.len(), points.len());
      }
      Ok(())
    });
    if let Err(err) = result {
      warn!("Optical flow failed: {:#}", err);
      points.clear();
      return;
    }

    for ((previous, current), status) in points.iter().zip(&self.predicted).zip(&self.statuses) {
      if !status || !is_finite(current) { continue }
      if (current - previous).norm() >= self.max_displacement { continue }
      correspondences.push(Correspondence { previous: *previous, current: *current });
    }
    points.clear();
    points.extend(correspondences.iter().map(|c| c.current));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  // Moves every point by its entry in `moves`, or fails.
  struct Flow {
    moves: Vec<(Vector2d, bool)>,
    fail: bool,
  }

  impl VisionPrimitives for Flow {
    fn to_grayscale(&mut self, input: &RgbaImage, output: &mut Image) -> Result<()> {
      rgba_to_gray(input, output)
    }

    fn detect_corners(&mut self, _: &Image, _: &CornerParameters, _: &mut Vec<Vector2d>) -> Result<()> {
      unreachable!()
    }

    fn track(&mut self, _: &Image, _: &Image, points0: &[Vector2d], _: &FlowParameters, points1: &mut Vec<Vector2d>, statuses: &mut Vec<bool>) -> Result<()> {
      points1.clear();
      statuses.clear();
      if self.fail { bail!("Flow exploded.") }
      for (p, (m, status)) in points0.iter().zip(&self.moves) {
        points1.push(p + m);
        statuses.push(*status);
      }
      Ok(())
    }
  }

  fn run(flow: &mut Flow, points: &mut Vec<Vector2d>) -> Vec<Correspondence> {
    let mut tracker = MotionTracker::new(&ParameterSet::default());
    let image = Image::new(4, 4);
    let mut correspondences = vec![Correspondence { previous: Vector2d::zeros(), current: Vector2d::zeros() }];
    tracker.process(flow, &image, &image, points, &mut correspondences);
    correspondences
  }

  #[test]
  fn test_filtering() {
    let mut flow = Flow {
      moves: vec![
        (Vector2d::new(1., 2.), true),
        (Vector2d::new(60., 0.), true),
        (Vector2d::new(30., 40.), true),
        (Vector2d::new(29., 40.), true),
        (Vector2d::new(1., 1.), false),
        (Vector2d::new(f64::NAN, 0.), true),
        (Vector2d::new(0., f64::INFINITY), true),
      ],
      fail: false,
    };
    let mut points: Vec<Vector2d> = (0..7).map(|i| Vector2d::new(10. * i as f64, 5.)).collect();
    let correspondences = run(&mut flow, &mut points);
    assert_eq!(correspondences, vec![
      Correspondence { previous: Vector2d::new(0., 5.), current: Vector2d::new(1., 7.) },
      Correspondence { previous: Vector2d::new(30., 5.), current: Vector2d::new(59., 45.) },
    ]);
    assert_eq!(points, vec![Vector2d::new(1., 7.), Vector2d::new(59., 45.)]);
    assert_eq!(correspondences[1].displacement(), Vector2d::new(29., 40.));
  }

  #[test]
  fn test_failure_clears_state() {
    let mut flow = Flow { moves: vec![(Vector2d::zeros(), true); 3], fail: true };
    let mut points = vec![Vector2d::new(1., 1.); 3];
    assert!(run(&mut flow, &mut points).is_empty());
    assert!(points.is_empty());
  }

  #[test]
  fn test_wrong_output_length_is_a_failure() {
    let mut flow = Flow { moves: vec![(Vector2d::zeros(), true); 2], fail: false };
    let mut points = vec![Vector2d::new(1., 1.); 3];
    assert!(run(&mut flow, &mut points).is_empty());
    assert!(points.is_empty());
  }

  #[test]
  fn test_empty_input() {
    let mut flow = Flow { moves: vec![], fail: true };
    let mut points = vec![];
    assert!(run(&mut flow, &mut points).is_empty());
  }
}
