// Shi-Tomasi corner detector, "Good Features to Track" (Shi and Tomasi, 1994).
// Corner response is the smaller eigenvalue of the gradient structure tensor
// summed over a square block.

use crate::all::*;

pub struct Detector {
  // Workspace.
  gxx: Vec<f32>,
  gxy: Vec<f32>,
  gyy: Vec<f32>,
  response: Vec<f32>,
  candidates: Vec<(f32, usize)>,
}

impl Detector {
  pub fn new() -> Detector {
    Detector {
      gxx: vec![],
      gxy: vec![],
      gyy: vec![],
      response: vec![],
      candidates: vec![],
    }
  }

  pub fn process(
    &mut self,
    image: &Image,
    p: &CornerParameters,
    detections: &mut Vec<Vector2d>,
  ) -> Result<()> {
    detections.clear();
    if p.block_size == 0 {
      bail!("Corner detector block size must be positive.");
    }
    let w = image.width;
    let h = image.height;
    // Sobel needs a one pixel border, the block sum another `r` pixels.
    let r = p.block_size / 2;
    let border = 1 + r;
    if w < 2 * border + 1 || h < 2 * border + 1 { return Ok(()) }

    self.gradient_products(image);
    let max_response = self.block_response(w, h, p.block_size, border);
    if max_response <= 0. { return Ok(()) }

    let threshold = (p.quality_level * max_response as f64) as f32;
    self.candidates.clear();
    for y in (border + 1)..(h - border - 1) {
      for x in (border + 1)..(w - border - 1) {
        let v = self.response[y * w + x];
        if v <= threshold || v <= 0. { continue }
        if !self.is_local_maximum(x, y, w) { continue }
        self.candidates.push((v, y * w + x));
      }
    }
    // Strongest first, ties in scan order so the result is deterministic.
    self.candidates.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let min_distance2 = p.min_distance * p.min_distance;
    for (_, ind) in &self.candidates {
      let c = Vector2d::new((ind % w) as f64, (ind / w) as f64);
      if detections.iter().any(|d| (d - c).norm_squared() < min_distance2) { continue }
      detections.push(c);
      if p.max_corners > 0 && detections.len() >= p.max_corners { break }
    }
    Ok(())
  }

  // Products of Sobel derivatives, zero on the one pixel border.
  fn gradient_products(&mut self, image: &Image) {
    let w = image.width;
    let h = image.height;
    for buffer in [&mut self.gxx, &mut self.gxy, &mut self.gyy] {
      buffer.clear();
      buffer.resize(w * h, 0.);
    }
    let v = |x: usize, y: usize| image.value(x, y) as f32;
    for y in 1..(h - 1) {
      for x in 1..(w - 1) {
        let gx = (v(x + 1, y - 1) + 2. * v(x + 1, y) + v(x + 1, y + 1)
          - v(x - 1, y - 1) - 2. * v(x - 1, y) - v(x - 1, y + 1)) / 8.;
        let gy = (v(x - 1, y + 1) + 2. * v(x, y + 1) + v(x + 1, y + 1)
          - v(x - 1, y - 1) - 2. * v(x, y - 1) - v(x + 1, y - 1)) / 8.;
        self.gxx[y * w + x] = gx * gx;
        self.gxy[y * w + x] = gx * gy;
        self.gyy[y * w + x] = gy * gy;
      }
    }
  }

  // Fills `response` and returns its maximum.
  fn block_response(&mut self, w: usize, h: usize, block_size: usize, border: usize) -> f32 {
    self.response.clear();
    self.response.resize(w * h, 0.);
    // Even block sizes lean towards the top-left.
    let r0 = block_size / 2;
    let r1 = block_size - r0 - 1;
    let mut max_response = 0f32;
    for y in border..(h - border) {
      for x in border..(w - border) {
        let mut a = 0.;
        let mut b = 0.;
        let mut c = 0.;
        for by in (y - r0)..=(y + r1) {
          for bx in (x - r0)..=(x + r1) {
            a += self.gxx[by * w + bx];
            b += self.gxy[by * w + bx];
            c += self.gyy[by * w + bx];
          }
        }
        let half_trace = 0.5 * (a + c);
        let d = 0.5 * (a - c);
        let min_eigenvalue = half_trace - (d * d + b * b).sqrt();
        self.response[y * w + x] = min_eigenvalue;
        max_response = max_response.max(min_eigenvalue);
      }
    }
    max_response
  }

  fn is_local_maximum(&self, x: usize, y: usize, w: usize) -> bool {
    let v = self.response[y * w + x];
    for ny in (y - 1)..=(y + 1) {
      for nx in (x - 1)..=(x + 1) {
        if self.response[ny * w + nx] > v { return false }
      }
    }
    true
  }
}
