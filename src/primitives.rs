use crate::all::*;

#[derive(Clone, Debug, PartialEq)]
pub struct CornerParameters {
  pub max_corners: usize,
  pub quality_level: f64,
  pub min_distance: f64,
  pub block_size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FlowParameters {
  pub win_size: usize,
  pub levels: usize,
  pub max_iters: usize,
  pub epsilon: f64,
}

// Image processing the engine relies on but does not implement itself.
// Errors returned from the per-frame operations are treated as transient by
// the engine: the frame is processed as if the operation produced nothing.
pub trait VisionPrimitives {
  // Called on `Engine::initialize()`. An error means the engine cannot be
  // used at all.
  fn check_available(&self) -> Result<()> {
    Ok(())
  }

  // Resizes `output` to the input dimensions.
  fn to_grayscale(&mut self, input: &RgbaImage, output: &mut Image) -> Result<()>;

  fn detect_corners(
    &mut self,
    image: &Image,
    p: &CornerParameters,
    corners: &mut Vec<Vector2d>,
  ) -> Result<()>;

  // Must push exactly one position and one status per point of `points0`.
  fn track(
    &mut self,
    image0: &Image,
    image1: &Image,
    points0: &[Vector2d],
    p: &FlowParameters,
    points1: &mut Vec<Vector2d>,
    statuses: &mut Vec<bool>,
  ) -> Result<()>;
}

// Pure Rust implementation of the primitives.
pub struct BuiltinPrimitives {
  detector: Detector,
  optical_flow: OpticalFlow,
}

impl BuiltinPrimitives {
  pub fn new() -> BuiltinPrimitives {
    BuiltinPrimitives {
      detector: Detector::new(),
      optical_flow: OpticalFlow::new(),
    }
  }
}

impl VisionPrimitives for BuiltinPrimitives {
  fn to_grayscale(&mut self, input: &RgbaImage, output: &mut Image) -> Result<()> {
    rgba_to_gray(input, output)
  }

  fn detect_corners(
    &mut self,
    image: &Image,
    p: &CornerParameters,
    corners: &mut Vec<Vector2d>,
  ) -> Result<()> {
    self.detector.process(image, p, corners)
  }

  fn track(
    &mut self,
    image0: &Image,
    image1: &Image,
    points0: &[Vector2d],
    p: &FlowParameters,
    points1: &mut Vec<Vector2d>,
    statuses: &mut Vec<bool>,
  ) -> Result<()> {
    self.optical_flow.process(image0, image1, points0, p, points1, statuses)
  }
}

// Luma with the ITU-R BT.601 weights, alpha is ignored.
pub fn rgba_to_gray(input: &RgbaImage, output: &mut Image) -> Result<()> {
  if !input.is_valid() {
    bail!("Malformed {}x{} RGBA image with {} bytes.", input.width, input.height, input.data.len());
  }
  output.resize(input.width, input.height);
  for (gray, rgba) in output.data.iter_mut().zip(input.data.chunks_exact(4)) {
    let v = 0.299 * rgba[0] as f32 + 0.587 * rgba[1] as f32 + 0.114 * rgba[2] as f32;
    *gray = v.round().min(255.) as u8;
  }
  Ok(())
}
