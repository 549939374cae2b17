use crate::all::*;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaneHypothesis {
  // Mean of the tracked feature positions.
  pub center: Vector2d,
  pub confidence: f64,
  // Mean per-point displacement in pixels.
  pub motion: Vector2d,
}

// Decides whether the tracked points move like a single rigid plane.
//
// Confidence rises by a fixed step on every coherent frame and falls by
// another on every other frame, so a plane needs several coherent frames to
// be accepted but single bad frames only dent it. Steps are per frame, not
// per second.
pub struct PlaneEstimator {
  min_correspondences: usize,
  coherence_variance: f64,
  confidence_increment: f64,
  confidence_decrement: f64,
  acceptance_threshold: f64,
  confidence: f64,
  // Kept when coherence is lost, so it may be stale.
  hypothesis: Option<PlaneHypothesis>,
}

impl PlaneEstimator {
  pub fn new(p: &ParameterSet) -> PlaneEstimator {
    PlaneEstimator {
      min_correspondences: p.min_correspondences,
      coherence_variance: p.coherence_variance,
      confidence_increment: p.confidence_increment,
      confidence_decrement: p.confidence_decrement,
      acceptance_threshold: p.acceptance_threshold,
      confidence: 0.,
      hypothesis: None,
    }
  }

  pub fn confidence(&self) -> f64 {
    self.confidence
  }

  pub fn hypothesis(&self) -> Option<&PlaneHypothesis> {
    self.hypothesis.as_ref()
  }

  pub fn reset(&mut self) {
    self.confidence = 0.;
    self.hypothesis = None;
  }

  // Returns true if a plane is trackable on this frame.
  pub fn update(&mut self, correspondences: &[Correspondence], features: &[Vector2d]) -> bool {
    if correspondences.len() < self.min_correspondences {
      self.decrease();
      return false;
    }
    let (motion, variance) = motion_statistics(correspondences);
    if !(variance < self.coherence_variance) {
      debug!("Incoherent motion, variance {:.1}.", variance);
      self.decrease();
      return false;
    }
    self.increase();
    // Correspondences only come from tracked features, so this is not empty.
    let center = match mean(features) {
      Some(center) => center,
      None => mean(&correspondences.iter().map(|c| c.current).collect::<Vec<_>>())
        .unwrap_or(Vector2d::zeros()),
    };
    self.hypothesis = Some(PlaneHypothesis {
      center,
      confidence: self.confidence,
      motion,
    });
    // Strict, a confidence that lands exactly on the threshold is not enough.
    self.confidence > self.acceptance_threshold
  }

  fn increase(&mut self) {
    self.confidence = snap(self.confidence + self.confidence_increment);
  }

  fn decrease(&mut self) {
    self.confidence = snap(self.confidence - self.confidence_decrement);
  }

  #[cfg(test)]
  fn set_confidence(&mut self, confidence: f64) {
    self.confidence = confidence;
  }
}

// Steps like 0.15 and 0.1 are not exact in binary, so sums drift by an ulp or
// two and could cross the threshold on the wrong side. Round to a fixed grid.
fn snap(confidence: f64) -> f64 {
  ((confidence * 1e9).round() / 1e9).clamp(0., 1.)
}

// Mean displacement and the population variance of the displacements around
// it, summed over both axes. Squared pixels.
pub fn motion_statistics(correspondences: &[Correspondence]) -> (Vector2d, f64) {
  if correspondences.is_empty() { return (Vector2d::zeros(), 0.) }
  let n = correspondences.len() as f64;
  let motion = correspondences.iter().map(|c| c.displacement()).sum::<Vector2d>() / n;
  let variance = correspondences.iter()
    .map(|c| (c.displacement() - motion).norm_squared())
    .sum::<f64>() / n;
  (motion, variance)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::{Rng, SeedableRng};
  use rand_xoshiro::Xoshiro256PlusPlus;

  fn coherent(n: usize, motion: Vector2d) -> (Vec<Correspondence>, Vec<Vector2d>) {
    let correspondences: Vec<_> = (0..n).map(|i| {
      let previous = Vector2d::new(10. + 7. * i as f64, 20. + 3. * i as f64);
      Correspondence { previous, current: previous + motion }
    }).collect();
    let features = correspondences.iter().map(|c| c.current).collect();
    (correspondences, features)
  }

  fn incoherent(n: usize, seed: u64) -> (Vec<Correspondence>, Vec<Vector2d>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let correspondences: Vec<_> = (0..n).map(|_| {
      let previous = Vector2d::new(rng.gen_range(0. ..640.), rng.gen_range(0. ..480.));
      let motion = Vector2d::new(rng.gen_range(-40. ..40.), rng.gen_range(-40. ..40.));
      Correspondence { previous, current: previous + motion }
    }).collect();
    let features = correspondences.iter().map(|c| c.current).collect();
    (correspondences, features)
  }

  #[test]
  fn test_confidence_stays_bounded() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (good, good_features) = coherent(20, Vector2d::new(1., -2.));
    let (bad, bad_features) = incoherent(20, 1);
    for _ in 0..20 {
      estimator.update(&good, &good_features);
      assert!((0. ..=1.).contains(&estimator.confidence()));
    }
    assert_eq!(estimator.confidence(), 1.);
    for _ in 0..20 {
      estimator.update(&bad, &bad_features);
      assert!((0. ..=1.).contains(&estimator.confidence()));
    }
    assert_eq!(estimator.confidence(), 0.);
  }

  #[test]
  fn test_too_few_correspondences() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (correspondences, features) = coherent(7, Vector2d::new(1., 1.));
    estimator.set_confidence(0.8);
    assert!(!estimator.update(&correspondences, &features));
    assert!((estimator.confidence() - 0.7).abs() < 1e-9);
    assert!(estimator.hypothesis().is_none());

    estimator.set_confidence(0.);
    assert!(!estimator.update(&[], &[]));
    assert_eq!(estimator.confidence(), 0.);
  }

  #[test]
  fn test_coherent_motion_builds_hypothesis() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let motion = Vector2d::new(3., -1.);
    let (correspondences, features) = coherent(20, motion);
    assert!(!estimator.update(&correspondences, &features));
    assert!((estimator.confidence() - 0.15).abs() < 1e-9);

    let hypothesis = estimator.hypothesis().unwrap();
    let center = features.iter().sum::<Vector2d>() / features.len() as f64;
    assert!((hypothesis.center - center).norm() < 1e-9);
    assert!((hypothesis.motion - motion).norm() < 1e-9);
    assert_eq!(hypothesis.confidence, estimator.confidence());
  }

  #[test]
  fn test_acceptance_after_sustained_coherence() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (correspondences, features) = coherent(20, Vector2d::new(0.5, 0.5));
    // 0.15, 0.30, 0.45 are not enough.
    for _ in 0..3 {
      assert!(!estimator.update(&correspondences, &features));
    }
    assert!(estimator.update(&correspondences, &features));
  }

  #[test]
  fn test_near_zero_variance_crosses_threshold() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (mut correspondences, features) = coherent(20, Vector2d::new(2., 0.));
    correspondences[3].current[0] += 0.1;
    estimator.set_confidence(0.4);
    assert!(estimator.update(&correspondences, &features));
    assert!((estimator.confidence() - 0.55).abs() < 1e-9);
  }

  #[test]
  fn test_incoherent_motion_at_boundary() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (correspondences, features) = coherent(20, Vector2d::new(1., 1.));
    estimator.update(&correspondences, &features);
    let stale = estimator.hypothesis().cloned();

    let (bad, bad_features) = incoherent(20, 7);
    assert!(motion_statistics(&bad).1 > 100.);
    estimator.set_confidence(0.6);
    assert!(!estimator.update(&bad, &bad_features));
    assert!((estimator.confidence() - 0.5).abs() < 1e-9);
    // Not cleared.
    assert_eq!(estimator.hypothesis().cloned(), stale);
  }

  #[test]
  fn test_acceptance_is_strict() {
    let mut p = ParameterSet::default();
    p.confidence_increment = 0.25;
    let mut estimator = PlaneEstimator::new(&p);
    let (correspondences, features) = coherent(20, Vector2d::new(1., 1.));
    estimator.set_confidence(0.25);
    // Exactly at the threshold.
    assert!(!estimator.update(&correspondences, &features));
    assert_eq!(estimator.confidence(), 0.5);
    assert!(estimator.update(&correspondences, &features));
  }

  #[test]
  fn test_confidence_steps_do_not_drift() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (good, good_features) = coherent(20, Vector2d::new(1., 1.));
    estimator.set_confidence(1.);
    for _ in 0..8 {
      assert!(!estimator.update(&[], &[]));
    }
    assert_eq!(estimator.confidence(), 0.2);
    assert!(!estimator.update(&good, &good_features));
    // Lands on the threshold exactly, which is not accepted.
    assert!(!estimator.update(&good, &good_features));
    assert_eq!(estimator.confidence(), 0.5);
    assert!(estimator.update(&good, &good_features));
  }

  #[test]
  fn test_motion_statistics() {
    let c = |dx: f64, dy: f64| Correspondence { previous: Vector2d::zeros(), current: Vector2d::new(dx, dy) };
    let (motion, variance) = motion_statistics(&[c(1., 0.), c(3., 0.), c(2., 2.), c(2., -2.)]);
    assert_eq!(motion, Vector2d::new(2., 0.));
    assert_eq!(variance, (1. + 1. + 4. + 4.) / 4.);
  }

  #[test]
  fn test_reset() {
    let mut estimator = PlaneEstimator::new(&ParameterSet::default());
    let (correspondences, features) = coherent(20, Vector2d::new(1., 1.));
    estimator.update(&correspondences, &features);
    estimator.reset();
    assert_eq!(estimator.confidence(), 0.);
    assert!(estimator.hypothesis().is_none());
  }
}
