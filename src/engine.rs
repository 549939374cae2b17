use crate::all::*;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FrameResult {
  pub tracking: bool,
  // At least one point was tracked from the previous frame.
  pub has_features: bool,
  pub feature_count: usize,
  pub plane_count: usize,
  // Only set when `tracking` is true.
  pub pose: Option<PoseEstimate>,
  pub orientation: OrientationSample,
}

impl FrameResult {
  fn empty(orientation: OrientationSample) -> FrameResult {
    FrameResult {
      tracking: false,
      has_features: false,
      feature_count: 0,
      plane_count: 0,
      pose: None,
      orientation,
    }
  }
}

// Frame buffers sized to the capture device.
struct Buffers {
  width: usize,
  height: usize,
  frame: Image,
  // Grayscale of the last processed frame, the source for optical flow.
  // Empty when there is none.
  previous_frame: Image,
  correspondences: Vec<Correspondence>,
}

impl Buffers {
  fn new(width: usize, height: usize) -> Buffers {
    Buffers {
      width,
      height,
      frame: Image::new(width, height),
      previous_frame: Image::empty(),
      correspondences: vec![],
    }
  }
}

// Everything that exists between `initialize()` and `dispose()`.
struct State {
  buffers: Option<Buffers>,
  feature_set: FeatureSet,
  motion_tracker: MotionTracker,
  plane_estimator: PlaneEstimator,
  pose_estimator: PoseEstimator,
  last_pose: Option<PoseEstimate>,
  overlay: Overlay,
  frame_number: usize,
  tracking: bool,
}

impl State {
  fn new(p: &ParameterSet) -> State {
    State {
      buffers: None,
      feature_set: FeatureSet::new(p),
      motion_tracker: MotionTracker::new(p),
      plane_estimator: PlaneEstimator::new(p),
      pose_estimator: PoseEstimator::new(p),
      last_pose: None,
      overlay: Overlay::empty(),
      frame_number: 0,
      tracking: false,
    }
  }

  fn reset(&mut self) {
    self.feature_set.clear();
    self.plane_estimator.reset();
    self.last_pose = None;
    self.overlay = Overlay::empty();
    self.frame_number = 0;
    self.tracking = false;
    if let Some(buffers) = &mut self.buffers {
      buffers.correspondences.clear();
      buffers.previous_frame.clear();
    }
  }

  // Converts `input` into the current frame buffer. Nothing else changes
  // unless the conversion succeeds. Tracked points refer to the old geometry,
  // so they go when the capture size changes.
  fn convert_frame(&mut self, vision: &mut dyn VisionPrimitives, input: &RgbaImage) -> Result<()> {
    let buffers = self.buffers.get_or_insert_with(|| Buffers::new(input.width, input.height));
    vision.to_grayscale(input, &mut buffers.frame)?;
    if buffers.width != input.width || buffers.height != input.height {
      info!(
        "Capture size changed from {}x{} to {}x{}.",
        buffers.width, buffers.height, input.width, input.height,
      );
      buffers.width = input.width;
      buffers.height = input.height;
      buffers.previous_frame.clear();
      buffers.correspondences.clear();
      self.feature_set.clear();
    }
    Ok(())
  }
}

// Single-threaded, frame synchronous tracking engine. Orientation samples may
// be written from other threads through `orientation_handle()`.
pub struct Engine {
  parameters: ParameterSet,
  vision: Box<dyn VisionPrimitives>,
  orientation: Arc<SharedOrientation>,
  state: Option<State>,
}

impl Engine {
  pub fn new(parameters: ParameterSet, vision: Box<dyn VisionPrimitives>) -> Result<Engine> {
    parameters.validate().context("Invalid engine parameters.")?;
    Ok(Engine {
      parameters,
      vision,
      orientation: Arc::new(SharedOrientation::new()),
      state: None,
    })
  }

  pub fn with_builtin_primitives(parameters: ParameterSet) -> Result<Engine> {
    Engine::new(parameters, Box::new(BuiltinPrimitives::new()))
  }

  // Does nothing if already initialized.
  pub fn initialize(&mut self) -> Result<()> {
    if self.state.is_some() { return Ok(()) }
    self.vision.check_available().context("Vision primitives are not available.")?;
    self.state = Some(State::new(&self.parameters));
    info!("Tracking engine initialized.");
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.state.is_some()
  }

  // Clears tracking state, keeps configuration and buffers.
  pub fn reset(&mut self) {
    if let Some(state) = &mut self.state {
      state.reset();
      info!("Tracking engine reset.");
    }
  }

  // Releases all buffers. `initialize()` must be called again before use.
  pub fn dispose(&mut self) {
    if self.state.take().is_some() {
      info!("Tracking engine disposed.");
    }
  }

  pub fn orientation_handle(&self) -> Arc<SharedOrientation> {
    self.orientation.clone()
  }

  pub fn set_orientation(&self, sample: OrientationSample) {
    self.orientation.store(sample);
  }

  pub fn process_frame(&mut self, input: &RgbaImage) -> Result<FrameResult> {
    let state = match &mut self.state {
      Some(state) => state,
      None => bail!("Engine is not initialized."),
    };
    if !input.is_valid() {
      warn!("Skipping invalid {}x{} frame with {} bytes.", input.width, input.height, input.data.len());
      return Ok(FrameResult::empty(self.orientation.load()));
    }

    let vision = &mut *self.vision;
    if let Err(err) = state.convert_frame(vision, input) {
      warn!("Grayscale conversion failed: {:#}", err);
      return Ok(FrameResult::empty(self.orientation.load()));
    }
    state.frame_number += 1;
    let frame_number = state.frame_number;

    let buffers = match &mut state.buffers {
      Some(buffers) => buffers,
      None => bail!("Frame buffers missing after conversion."),
    };
    buffers.correspondences.clear();
    if state.feature_set.needs_refresh(frame_number) {
      // Fresh points have no correspondences until the next frame.
      state.feature_set.refresh(vision, &buffers.frame);
    }
    else if !buffers.previous_frame.is_empty() {
      state.motion_tracker.process(
        vision,
        &buffers.previous_frame,
        &buffers.frame,
        state.feature_set.points_mut(),
        &mut buffers.correspondences,
      );
    }

    let tracking = state.plane_estimator.update(&buffers.correspondences, state.feature_set.points());
    let orientation = self.orientation.load();
    let pose = match (tracking, state.plane_estimator.hypothesis()) {
      (true, Some(plane)) => Some(state.pose_estimator.estimate(plane, orientation)),
      _ => None,
    };
    if pose.is_some() {
      state.last_pose = pose.clone();
    }
    if tracking && !state.tracking {
      info!("Plane acquired on frame {}.", frame_number);
    }
    else if !tracking && state.tracking {
      info!("Plane lost on frame {}.", frame_number);
    }
    state.tracking = tracking;

    state.overlay = produce_overlay(&OverlayArgs {
      width: buffers.width,
      height: buffers.height,
      frame_number,
      features: state.feature_set.points(),
      correspondences: &buffers.correspondences,
      plane: state.plane_estimator.hypothesis(),
      confidence: state.plane_estimator.confidence(),
      tracking,
      plane_draw_threshold: self.parameters.plane_draw_threshold,
    });

    // The current frame becomes the previous one, and the old previous frame
    // buffer is reused for the next input.
    std::mem::swap(&mut buffers.previous_frame, &mut buffers.frame);

    let result = FrameResult {
      tracking: pose.is_some(),
      has_features: !buffers.correspondences.is_empty(),
      feature_count: state.feature_set.len(),
      plane_count: pose.is_some() as usize,
      pose,
      orientation,
    };
    debug!(
      "Frame {}: {} features, {} tracked, confidence {:.2}, tracking {}.",
      frame_number,
      result.feature_count,
      buffers.correspondences.len(),
      state.plane_estimator.confidence(),
      result.tracking,
    );
    Ok(result)
  }

  pub fn parameters(&self) -> &ParameterSet {
    &self.parameters
  }

  pub fn frame_count(&self) -> usize {
    self.state.as_ref().map_or(0, |s| s.frame_number)
  }

  pub fn confidence(&self) -> f64 {
    self.state.as_ref().map_or(0., |s| s.plane_estimator.confidence())
  }

  pub fn plane(&self) -> Option<&PlaneHypothesis> {
    self.state.as_ref().and_then(|s| s.plane_estimator.hypothesis())
  }

  // The most recent pose, which may be from an earlier frame. Check
  // `FrameResult::tracking` before using it.
  pub fn last_pose(&self) -> Option<&PoseEstimate> {
    self.state.as_ref().and_then(|s| s.last_pose.as_ref())
  }

  pub fn features(&self) -> &[Vector2d] {
    match &self.state {
      Some(state) => state.feature_set.points(),
      None => &[],
    }
  }

  // Correspondences of the last processed frame.
  pub fn correspondences(&self) -> &[Correspondence] {
    match self.state.as_ref().and_then(|s| s.buffers.as_ref()) {
      Some(buffers) => &buffers.correspondences,
      None => &[],
    }
  }

  pub fn overlay(&self) -> Option<&Overlay> {
    self.state.as_ref().map(|s| &s.overlay)
  }

  // Grayscale version of the last processed frame.
  pub fn last_frame(&self) -> Option<&Image> {
    self.state.as_ref()
      .and_then(|s| s.buffers.as_ref())
      .map(|b| &b.previous_frame)
      .filter(|image| !image.is_empty())
  }
}
