// Pyramidal Lucas-Kanade tracker based on:
// <http://robots.stanford.edu/cs223b04/algo_tracking.pdf>
// “Pyramidal Implementation of the Lucas Kanade Feature Tracker
//   Description of the algorithm” by Jean-Yves Bouguet

use crate::all::*;

// Below this determinant the spatial gradient matrix is treated as singular.
const MIN_GRADIENT_DETERMINANT: f64 = 1e-6;

#[allow(non_snake_case)]
pub struct OpticalFlow {
  pyramid0: Pyramid,
  pyramid1: Pyramid,
  Ix: Matrixd,
  Iy: Matrixd,
  It: Matrixd,
  // Workspace.
  grid0: Matrixd,
  grid1: Matrixd,
}

impl OpticalFlow {
  pub fn new() -> OpticalFlow {
    OpticalFlow {
      pyramid0: Pyramid::empty(),
      pyramid1: Pyramid::empty(),
      Ix: dmatrix!(),
      Iy: dmatrix!(),
      It: dmatrix!(),
      grid0: dmatrix!(),
      grid1: dmatrix!(),
    }
  }

  // For every point of `features0` pushes a position into `features1` and a
  // status into `statuses`. Failed points keep their original position.
  pub fn process(
    &mut self,
    image0: &Image,
    image1: &Image,
    features0: &[Vector2d],
    p: &FlowParameters,
    features1: &mut Vec<Vector2d>,
    statuses: &mut Vec<bool>,
  ) -> Result<()> {
    features1.clear();
    statuses.clear();
    if p.win_size % 2 != 1 || p.win_size < 3 {
      bail!("Invalid Lucas-Kanade window size {}.", p.win_size);
    }
    if image0.width != image1.width || image0.height != image1.height {
      bail!("Optical flow images differ in size: {}x{} vs {}x{}.",
        image0.width, image0.height, image1.width, image1.height);
    }
    self.pyramid0.compute(image0, p.levels, p.win_size);
    self.pyramid1.compute(image1, p.levels, p.win_size);
    for feature0 in features0 {
      if let Some(feature1) = self.process_feature(image0, image1, p, *feature0) {
        features1.push(feature1);
        statuses.push(true);
      }
      else {
        features1.push(*feature0);
        statuses.push(false);
      }
    }
    Ok(())
  }

  #[allow(non_snake_case)]
  fn process_feature(
    &mut self,
    image0: &Image,
    image1: &Image,
    p: &FlowParameters,
    feature0: Vector2d,
  ) -> Option<Vector2d> {
    if !is_finite(&feature0) { return None }
    let r = ((p.win_size - 1) / 2) as i32;
    let mut g = Vector2d::zeros();
    let top = usize::min(self.pyramid0.len(), self.pyramid1.len()) - 1;
    for L in (0..=top).rev() {
      let level0 = self.pyramid0.get_level(image0, L);
      let level1 = self.pyramid1.get_level(image1, L);
      let u = feature0 / u32::pow(2, L as u32) as f64;
      let d = track_level(
        level0,
        level1,
        u,
        g,
        r,
        p,
        [&mut self.Ix, &mut self.Iy, &mut self.It],
        [&mut self.grid0, &mut self.grid1],
      );
      match d {
        Some(d) if L == 0 => return Some(feature0 + g + d),
        Some(d) => g = 2. * (g + d),
        // Points near the border may still be trackable on finer levels.
        None if L > 0 => g = 2. * g,
        None => return None,
      }
    }
    None
  }
}

// Returns the residual flow `d` on one pyramid level given the guess `g`
// propagated from the coarser levels.
#[allow(non_snake_case)]
fn track_level(
  level0: &Image,
  level1: &Image,
  u: Vector2d,
  g: Vector2d,
  r: i32,
  p: &FlowParameters,
  [Ix, Iy, It]: [&mut Matrixd; 3],
  [grid0, grid1]: [&mut Matrixd; 2],
) -> Option<Vector2d> {
  // The template needs one extra pixel for the derivatives.
  if !is_inside(level0, u, r + 1) { return None }
  fill_grid(level0, u, r + 1, grid0);
  scharr(grid0, Ix, Iy);
  let G = spatial_gradient(Ix, Iy);
  let invG = if G.determinant() > MIN_GRADIENT_DETERMINANT { G.try_inverse()? } else { return None };

  let mut nu = Vector2d::zeros();
  for _ in 0..p.max_iters {
    let v = u + g + nu;
    if !is_inside(level1, v, r) { return None }
    fill_grid(level1, v, r, grid1);
    image_difference(grid0, grid1, It);
    let eta = invG * mismatch_vector(Ix, Iy, It);
    nu += eta;
    if eta.norm() < p.epsilon { break }
  }
  if !is_finite(&nu) { return None }
  Some(nu)
}

// Template without the derivative border, minus the moved window.
#[allow(non_snake_case)]
fn image_difference(grid0: &Matrixd, grid1: &Matrixd, It: &mut Matrixd) {
  if It.shape() != grid1.shape() {
    *It = Matrixd::zeros(grid1.nrows(), grid1.ncols());
  }
  It.copy_from(&grid0.slice((1, 1), (grid1.nrows(), grid1.ncols())));
  *It -= grid1;
}

#[allow(non_snake_case)]
fn mismatch_vector(Ix: &Matrixd, Iy: &Matrixd, It: &Matrixd) -> Vector2d {
  Vector2d::new(It.dot(Ix), It.dot(Iy))
}

#[allow(non_snake_case)]
fn spatial_gradient(Ix: &Matrixd, Iy: &Matrixd) -> Matrix2d {
  assert_eq!(Ix.shape(), Iy.shape());
  let xy = Ix.dot(Iy);
  Matrix2d::new(Ix.dot(Ix), xy, xy, Iy.dot(Iy))
}

// Whether the square window of radius `r` around `center` can be sampled
// bilinearly. Also false for non-finite centers.
fn is_inside(level: &Image, center: Vector2d, r: i32) -> bool {
  let r = r as f64;
  center[0] - r >= 0.
    && center[1] - r >= 0.
    && center[0] + r <= (level.width as f64 - 1.)
    && center[1] + r <= (level.height as f64 - 1.)
}

fn fill_grid(level: &Image, center: Vector2d, r: i32, grid: &mut Matrixd) {
  let n = (2 * r + 1) as usize;
  if grid.shape() != (n, n) {
    *grid = Matrixd::zeros(n, n);
  }
  for (y_ind, y) in (-r..=r).enumerate() {
    for (x_ind, x) in (-r..=r).enumerate() {
      grid[(y_ind, x_ind)] = level.bilinear(center + Vector2d::new(x as f64, y as f64));
    }
  }
}

// Derivatives of the interior of `grid`, so the outputs are two smaller in
// both dimensions.
fn scharr(grid: &Matrixd, out_x: &mut Matrixd, out_y: &mut Matrixd) {
  let shape = (grid.nrows() - 2, grid.ncols() - 2);
  if out_x.shape() != shape {
    *out_x = Matrixd::zeros(shape.0, shape.1);
  }
  if out_y.shape() != shape {
    *out_y = Matrixd::zeros(shape.0, shape.1);
  }
  for y in 1..(grid.nrows() - 1) {
    for x in 1..(grid.ncols() - 1) {
      out_x[(y - 1, x - 1)] = (10. * grid[(y, x + 1)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y - 1, x + 1)]
        - 10. * grid[(y, x - 1)]
        - 3. * grid[(y + 1, x - 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
      out_y[(y - 1, x - 1)] = (10. * grid[(y + 1, x)]
        + 3. * grid[(y + 1, x + 1)]
        + 3. * grid[(y + 1, x - 1)]
        - 10. * grid[(y - 1, x)]
        - 3. * grid[(y - 1, x + 1)]
        - 3. * grid[(y - 1, x - 1)]
      ) / 32.;
    }
  }
}
