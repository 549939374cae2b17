use crate::all::*;

// Every field is both a command line flag and an optional JSON key. Missing
// JSON keys fall back to the command line defaults.
#[derive(Clone, Debug, PartialEq)]
#[derive(clap::Parser)]
#[derive(Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParameterSet {
  // Corner detector.
  /// Maximum number of tracked points, 0 for no limit.
  #[clap(long, default_value_t = 100)]
  pub max_corners: usize,
  /// Corners weaker than this fraction of the strongest one are rejected.
  #[clap(long, default_value_t = 0.01)]
  pub quality_level: f64,
  /// Minimum distance in pixels between detected corners.
  #[clap(long, default_value_t = 10.)]
  pub min_distance: f64,
  /// Side of the window over which the corner response is summed.
  #[clap(long, default_value_t = 3)]
  pub block_size: usize,

  // Pyramidal Lucas-Kanade feature tracker.
  #[clap(long, default_value_t = 15)]
  pub lk_win_size: usize,
  /// Pyramid levels above the full resolution image.
  #[clap(long, default_value_t = 2)]
  pub lk_levels: usize,
  #[clap(long, default_value_t = 10)]
  pub lk_iters: usize,
  #[clap(long, default_value_t = 0.03)]
  pub lk_epsilon: f64,

  // Feature set refresh.
  /// Re-detect when fewer points than this are tracked.
  #[clap(long, default_value_t = 15)]
  pub min_features: usize,
  /// Re-detect on every frame number divisible by this.
  #[clap(long, default_value_t = 15)]
  pub refresh_interval: usize,
  /// Tracked points that move more pixels than this in one frame are dropped.
  #[clap(long, default_value_t = 50.)]
  pub max_displacement: f64,

  // Plane hypothesis.
  #[clap(long, default_value_t = 8)]
  pub min_correspondences: usize,
  /// Squared pixels.
  #[clap(long, default_value_t = 100.)]
  pub coherence_variance: f64,
  #[clap(long, default_value_t = 0.15)]
  pub confidence_increment: f64,
  #[clap(long, default_value_t = 0.1)]
  pub confidence_decrement: f64,
  /// A coherent plane is trackable when confidence is strictly above this.
  #[clap(long, default_value_t = 0.5)]
  pub acceptance_threshold: f64,

  // Pose.
  /// World units per pixel of aggregate motion.
  #[clap(long, default_value_t = 0.001)]
  pub position_scale: f64,
  /// Assumed distance to the plane in world units.
  #[clap(long, default_value_t = 3.)]
  pub standoff_depth: f64,

  // Visualizations.
  /// The plane marker is drawn when confidence is above this.
  #[clap(long, default_value_t = 0.3)]
  pub plane_draw_threshold: f64,
}

impl Default for ParameterSet {
  fn default() -> ParameterSet {
    use clap::Parser;
    ParameterSet::parse_from(["markerless"])
  }
}

impl ParameterSet {
  pub fn from_json_file(path: &Path) -> Result<ParameterSet> {
    let s = std::fs::read_to_string(path)
      .context(format!("Failed to read file {}.", path.display()))?;
    let p: ParameterSet = serde_json::from_str(&s)
      .context(format!("Failed to parse {}.", path.display()))?;
    p.validate()?;
    Ok(p)
  }

  pub fn validate(&self) -> Result<()> {
    if self.lk_win_size % 2 != 1 {
      bail!("Lucas-Kanade window size must be odd number.");
    }
    if self.lk_win_size < 3 {
      bail!("Lucas-Kanade window size must be at least 3.");
    }
    if self.lk_iters == 0 {
      bail!("Lucas-Kanade iteration count must be positive.");
    }
    if self.block_size == 0 {
      bail!("Corner detector block size must be positive.");
    }
    if self.refresh_interval == 0 {
      bail!("Refresh interval must be positive.");
    }
    if !(0. ..=1.).contains(&self.quality_level) {
      bail!("Corner quality level must be within [0, 1].");
    }
    for (name, value) in [
      ("Acceptance threshold", self.acceptance_threshold),
      ("Plane draw threshold", self.plane_draw_threshold),
    ] {
      if !(0. ..=1.).contains(&value) {
        bail!("{} must be within [0, 1].", name);
      }
    }
    for (name, value) in [
      ("Confidence increment", self.confidence_increment),
      ("Confidence decrement", self.confidence_decrement),
      ("Minimum corner distance", self.min_distance),
      ("Maximum displacement", self.max_displacement),
      ("Coherence variance", self.coherence_variance),
    ] {
      if !(value >= 0.) {
        bail!("{} must be non-negative.", name);
      }
    }
    Ok(())
  }

  pub fn corner_parameters(&self) -> CornerParameters {
    CornerParameters {
      max_corners: self.max_corners,
      quality_level: self.quality_level,
      min_distance: self.min_distance,
      block_size: self.block_size,
    }
  }

  pub fn flow_parameters(&self) -> FlowParameters {
    FlowParameters {
      win_size: self.lk_win_size,
      levels: self.lk_levels,
      max_iters: self.lk_iters,
      epsilon: self.lk_epsilon,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults() {
    let p = ParameterSet::default();
    assert_eq!(p.min_features, 15);
    assert_eq!(p.refresh_interval, 15);
    assert_eq!(p.min_correspondences, 8);
    assert_eq!(p.max_displacement, 50.);
    assert_eq!(p.coherence_variance, 100.);
    assert_eq!(p.confidence_increment, 0.15);
    assert_eq!(p.confidence_decrement, 0.1);
    assert_eq!(p.acceptance_threshold, 0.5);
    assert_eq!(p.plane_draw_threshold, 0.3);
    assert_eq!(p.standoff_depth, 3.);
    assert!(p.validate().is_ok());
  }

  #[test]
  fn test_partial_json_override() {
    let p: ParameterSet = serde_json::from_str(r#"{ "min_features": 4, "lk_win_size": 9 }"#).unwrap();
    assert_eq!(p.min_features, 4);
    assert_eq!(p.lk_win_size, 9);
    assert_eq!(p.refresh_interval, 15);
    assert_eq!(p.max_corners, 100);
    assert!(serde_json::from_str::<ParameterSet>(r#"{ "min_featurez": 4 }"#).is_err());
  }

  #[test]
  fn test_command_line_override() {
    use clap::Parser;
    let p = ParameterSet::parse_from(["markerless", "--coherence-variance", "25", "--lk-levels", "4"]);
    assert_eq!(p.coherence_variance, 25.);
    assert_eq!(p.lk_levels, 4);
    assert_eq!(p.min_features, 15);
  }

  #[test]
  fn test_validate() {
    let mut p = ParameterSet::default();
    p.lk_win_size = 8;
    assert!(p.validate().is_err());
    let mut p = ParameterSet::default();
    p.refresh_interval = 0;
    assert!(p.validate().is_err());
    let mut p = ParameterSet::default();
    p.acceptance_threshold = 1.5;
    assert!(p.validate().is_err());
    let mut p = ParameterSet::default();
    p.confidence_decrement = -0.1;
    assert!(p.validate().is_err());
  }
}
