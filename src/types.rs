// Eigen-like aliases.
pub type Vector2d = nalgebra::Vector2::<f64>;
pub type Vector3d = nalgebra::Vector3::<f64>;
pub type Vector2i = nalgebra::Vector2::<i32>;
pub type Matrix2d = nalgebra::Matrix2::<f64>;
pub type Matrixd = nalgebra::DMatrix::<f64>;

pub fn from_f64(p: &Vector2d) -> Vector2i {
  Vector2i::new(p[0].round() as i32, p[1].round() as i32)
}

pub fn is_finite(p: &Vector2d) -> bool {
  p[0].is_finite() && p[1].is_finite()
}

pub fn mean(points: &[Vector2d]) -> Option<Vector2d> {
  if points.is_empty() { return None }
  Some(points.iter().sum::<Vector2d>() / points.len() as f64)
}
