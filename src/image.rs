use crate::all::*;

// Row-major grayscale image storage.
// Could also have used nalebgra::DMatrix, but the added complexity
// only seems to help with algorithms like the optical flow.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
}

// Row-major interleaved RGBA, four bytes per pixel, as handed over by the
// capture device.
#[derive(Clone, Debug)]
pub struct RgbaImage {
  pub data: Vec<u8>,
  pub width: usize,
  pub height: usize,
}

impl Image {
  pub fn empty() -> Image {
    Image {
      data: vec![],
      width: 0,
      height: 0,
    }
  }

  pub fn new(width: usize, height: usize) -> Image {
    Image {
      data: vec![0; width * height],
      width,
      height,
    }
  }

  // Marks the image as holding no frame. The pixel allocation is kept for
  // the next `resize()`.
  pub fn clear(&mut self) {
    self.data.clear();
    self.width = 0;
    self.height = 0;
  }

  // Keeps the allocation when the size stays the same.
  pub fn resize(&mut self, width: usize, height: usize) {
    self.data.resize(width * height, 0);
    self.width = width;
    self.height = height;
  }

  pub fn is_empty(&self) -> bool {
    self.width == 0 || self.height == 0
  }

  #[inline(always)]
  pub fn value(&self, x: usize, y: usize) -> u8 {
    self.data[y * self.width + x]
  }

  #[inline(always)]
  pub fn set_value(&mut self, x: usize, y: usize, value: u8) {
    self.data[y * self.width + x] = value;
  }

  // Bilinear interpolation. The caller must keep `u` inside
  // `[0, width - 1] x [0, height - 1]`.
  #[inline(always)]
  pub fn bilinear(&self, u: Vector2d) -> f64 {
    debug_assert!(u[0] >= 0.0 && u[0] <= self.width as f64 - 1.);
    debug_assert!(u[1] >= 0.0 && u[1] <= self.height as f64 - 1.);
    let x0 = u[0] as usize;
    let y0 = u[1] as usize;
    let xa = u[0].fract();
    let ya = u[1].fract();
    // Besides improving computation speed, these allow to work one pixel
    // closer to the right and bottom edges when coordinates are integers.
    let eps = 1e-5;
    let v = |x: usize, y: usize| self.data[y * self.width + x] as f64;
    if xa < eps && ya < eps {
      v(x0, y0)
    }
    else if xa < eps {
      (1. - ya) * v(x0, y0) + ya * v(x0, y0 + 1)
    }
    else if ya < eps {
      (1. - xa) * v(x0, y0) + xa * v(x0 + 1, y0)
    }
    else {
      (1. - xa) * (1. - ya) * v(x0, y0)
        + xa * (1. - ya) * v(x0 + 1, y0)
        + (1. - xa) * ya * v(x0, y0 + 1)
        + xa * ya * v(x0 + 1, y0 + 1)
    }
  }
}

impl RgbaImage {
  pub fn new(width: usize, height: usize) -> RgbaImage {
    RgbaImage {
      data: vec![0; 4 * width * height],
      width,
      height,
    }
  }

  pub fn is_valid(&self) -> bool {
    self.width > 0 && self.height > 0 && self.data.len() == 4 * self.width * self.height
  }

  pub fn from_gray(image: &Image) -> RgbaImage {
    let mut data = Vec::with_capacity(4 * image.data.len());
    for v in &image.data {
      data.extend_from_slice(&[*v, *v, *v, 255]);
    }
    RgbaImage {
      data,
      width: image.width,
      height: image.height,
    }
  }
}
