use crate::all::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TrackingStatus {
  NoFeatures,
  Searching,
  Tracking,
}

impl TrackingStatus {
  pub fn label(&self) -> &'static str {
    match self {
      TrackingStatus::NoFeatures => "NO FEATURES",
      TrackingStatus::Searching => "SEARCHING",
      TrackingStatus::Tracking => "TRACKING",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaneMarker {
  pub center: Vector2d,
  pub radius: f64,
  // In [0, 1].
  pub opacity: f64,
}

// Everything the diagnostics view shows for one frame, in image coordinates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Overlay {
  pub width: usize,
  pub height: usize,
  pub markers: Vec<Vector2d>,
  pub motion_lines: Vec<[Vector2d; 2]>,
  pub plane: Option<PlaneMarker>,
  pub status: TrackingStatus,
  pub text: Vec<String>,
}

impl Overlay {
  pub fn empty() -> Overlay {
    Overlay {
      width: 0,
      height: 0,
      markers: vec![],
      motion_lines: vec![],
      plane: None,
      status: TrackingStatus::NoFeatures,
      text: vec![],
    }
  }
}

pub struct OverlayArgs<'a> {
  pub width: usize,
  pub height: usize,
  pub frame_number: usize,
  pub features: &'a [Vector2d],
  pub correspondences: &'a [Correspondence],
  pub plane: Option<&'a PlaneHypothesis>,
  pub confidence: f64,
  pub tracking: bool,
  pub plane_draw_threshold: f64,
}

pub fn tracking_status(feature_count: usize, tracking: bool) -> TrackingStatus {
  if feature_count == 0 { TrackingStatus::NoFeatures }
  else if tracking { TrackingStatus::Tracking }
  else { TrackingStatus::Searching }
}

pub fn produce_overlay(args: &OverlayArgs) -> Overlay {
  let status = tracking_status(args.features.len(), args.tracking);
  let plane = match args.plane {
    Some(plane) if args.confidence > args.plane_draw_threshold => Some(PlaneMarker {
      center: plane.center,
      radius: 20. + 40. * args.confidence,
      opacity: args.confidence.clamp(0., 1.),
    }),
    _ => None,
  };
  Overlay {
    width: args.width,
    height: args.height,
    markers: args.features.to_vec(),
    motion_lines: args.correspondences.iter().map(|c| [c.previous, c.current]).collect(),
    plane,
    status,
    text: vec![
      format!("Frame: {}", args.frame_number),
      format!("Features: {}", args.features.len()),
      format!("Tracked: {}", args.correspondences.len()),
      format!("Confidence: {:.0}%", 100. * args.confidence),
      format!("Status: {}", status.label()),
    ],
  }
}

const MARKER_COLOR: u32 = 0x00ff00;
const LINE_COLOR: u32 = 0xffff00;
const PLANE_COLOR: u32 = 0x00a0ff;
const RING_COLOR: u32 = 0xffffff;

pub struct DrawArgs<'a> {
  pub buffer: &'a mut Vec<u32>,
  pub buffer_w: usize,
  pub buffer_h: usize,
}

#[inline(always)]
fn draw_pixel(args: &mut DrawArgs, p: &Vector2i, v: u32) {
  if p[0] < 0 || p[0] >= args.buffer_w as i32 { return }
  if p[1] < 0 || p[1] >= args.buffer_h as i32 { return }
  args.buffer[p[1] as usize * args.buffer_w + p[0] as usize] = v;
}

#[inline(always)]
fn blend_pixel(args: &mut DrawArgs, p: &Vector2i, v: u32, alpha: f64) {
  if p[0] < 0 || p[0] >= args.buffer_w as i32 { return }
  if p[1] < 0 || p[1] >= args.buffer_h as i32 { return }
  let i = p[1] as usize * args.buffer_w + p[0] as usize;
  let old = args.buffer[i];
  let mut out = 0;
  for shift in [0, 8, 16] {
    let a = ((old >> shift) & 0xff) as f64;
    let b = ((v >> shift) & 0xff) as f64;
    out |= ((a + alpha * (b - a)).round() as u32) << shift;
  }
  args.buffer[i] = out;
}

fn draw_square(args: &mut DrawArgs, p: &Vector2i, v: u32, r: i32) {
  for z in (-r)..(r+1) {
    draw_pixel(args, &(p + Vector2i::new(z, -r)), v);
    draw_pixel(args, &(p + Vector2i::new(z, r)), v);
    draw_pixel(args, &(p + Vector2i::new(-r, z)), v);
    draw_pixel(args, &(p + Vector2i::new(r, z)), v);
  }
}

fn draw_line(args: &mut DrawArgs, mut p0: Vector2i, mut p1: Vector2i, v: u32) {
  let dx = p1[0] - p0[0];
  let dy = p1[1] - p0[1];
  if dx == 0 && dy == 0 {
    draw_pixel(args, &p0, v);
  }
  else if dx.abs() < dy.abs() {
    if p0[1] > p1[1] { (p0, p1) = (p1, p0); }
    let k = dx as f32 / dy as f32;
    for y in p0[1] ..= p1[1] {
      let x = p0[0] + (k * (y - p0[1]) as f32).round() as i32;
      draw_pixel(args, &Vector2i::new(x, y), v);
    }
  }
  else {
    if p0[0] > p1[0] { (p0, p1) = (p1, p0); }
    let k = dy as f32 / dx as f32;
    for x in p0[0] ..= p1[0] {
      let y = p0[1] + (k * (x - p0[0]) as f32).round() as i32;
      draw_pixel(args, &Vector2i::new(x, y), v);
    }
  }
}

// Disc blended with `alpha`, plus an opaque ring of width `ring` on its edge.
fn draw_disc(args: &mut DrawArgs, c: Vector2d, r: f64, v: u32, alpha: f64, ring: f64, ring_v: u32) {
  let ri = r.ceil() as i32;
  let ci = from_f64(&c);
  for y in -ri..=ri {
    for x in -ri..=ri {
      let d = ((x * x + y * y) as f64).sqrt();
      if d > r { continue }
      let p = ci + Vector2i::new(x, y);
      if d > r - ring {
        blend_pixel(args, &p, ring_v, alpha.max(0.5));
      }
      else {
        blend_pixel(args, &p, v, 0.5 * alpha);
      }
    }
  }
}

fn draw_background(args: &mut DrawArgs, image: Option<&Image>) {
  for y in 0..args.buffer_h {
    for x in 0..args.buffer_w {
      let gray = match image {
        Some(image) if x < image.width && y < image.height => image.value(x, y) as u32,
        _ => 0,
      };
      args.buffer[y * args.buffer_w + x] = gray | (gray << 8) | (gray << 16);
    }
  }
}

// Rasterizes the overlay on top of `background` into a 0RGB buffer.
pub fn draw_overlay(
  overlay: &Overlay,
  background: Option<&Image>,
  buffer: &mut Vec<u32>,
  buffer_w: usize,
  buffer_h: usize,
) {
  buffer.resize(buffer_w * buffer_h, 0);
  let mut args = DrawArgs { buffer, buffer_w, buffer_h };
  draw_background(&mut args, background);

  if let Some(plane) = &overlay.plane {
    draw_disc(&mut args, plane.center, plane.radius, PLANE_COLOR, plane.opacity, 3., RING_COLOR);
  }
  for [p0, p1] in &overlay.motion_lines {
    draw_line(&mut args, from_f64(p0), from_f64(p1), LINE_COLOR);
  }
  for marker in &overlay.markers {
    draw_square(&mut args, &from_f64(marker), MARKER_COLOR, 2);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn args<'a>(
    features: &'a [Vector2d],
    correspondences: &'a [Correspondence],
    plane: Option<&'a PlaneHypothesis>,
    confidence: f64,
    tracking: bool,
  ) -> OverlayArgs<'a> {
    OverlayArgs {
      width: 64,
      height: 48,
      frame_number: 7,
      features,
      correspondences,
      plane,
      confidence,
      tracking,
      plane_draw_threshold: 0.3,
    }
  }

  #[test]
  fn test_status() {
    assert_eq!(tracking_status(0, false), TrackingStatus::NoFeatures);
    assert_eq!(tracking_status(0, true), TrackingStatus::NoFeatures);
    assert_eq!(tracking_status(3, false), TrackingStatus::Searching);
    assert_eq!(tracking_status(3, true), TrackingStatus::Tracking);
  }

  #[test]
  fn test_overlay_contents() {
    let features = vec![Vector2d::new(10., 10.), Vector2d::new(20., 30.)];
    let correspondences = vec![Correspondence { previous: Vector2d::new(9., 10.), current: features[0] }];
    let plane = PlaneHypothesis { center: Vector2d::new(15., 20.), confidence: 0.55, motion: Vector2d::new(1., 0.) };
    let overlay = produce_overlay(&args(&features, &correspondences, Some(&plane), 0.55, true));
    assert_eq!(overlay.markers, features);
    assert_eq!(overlay.motion_lines, vec![[Vector2d::new(9., 10.), Vector2d::new(10., 10.)]]);
    let marker = overlay.plane.as_ref().unwrap();
    assert_eq!(marker.center, plane.center);
    assert_eq!(marker.opacity, 0.55);
    assert!((marker.radius - 42.).abs() < 1e-9);
    assert_eq!(overlay.status, TrackingStatus::Tracking);
    assert_eq!(overlay.text, vec![
      "Frame: 7", "Features: 2", "Tracked: 1", "Confidence: 55%", "Status: TRACKING",
    ]);
  }

  #[test]
  fn test_plane_hidden_at_low_confidence() {
    let features = vec![Vector2d::new(10., 10.)];
    let plane = PlaneHypothesis { center: Vector2d::new(15., 20.), confidence: 0.3, motion: Vector2d::zeros() };
    let overlay = produce_overlay(&args(&features, &[], Some(&plane), 0.3, false));
    assert!(overlay.plane.is_none());
    assert_eq!(overlay.status, TrackingStatus::Searching);
    let overlay = produce_overlay(&args(&features, &[], None, 0.9, false));
    assert!(overlay.plane.is_none());
  }

  #[test]
  fn test_draw_overlay() {
    let mut background = Image::new(16, 16);
    background.set_value(0, 15, 100);
    let overlay = Overlay {
      width: 16,
      height: 16,
      markers: vec![Vector2d::new(5., 5.)],
      motion_lines: vec![[Vector2d::new(0., 0.), Vector2d::new(3., 0.)]],
      plane: None,
      status: TrackingStatus::Searching,
      text: vec![],
    };
    let mut buffer = vec![];
    draw_overlay(&overlay, Some(&background), &mut buffer, 16, 16);
    assert_eq!(buffer.len(), 256);
    assert_eq!(buffer[15 * 16], 100 | (100 << 8) | (100 << 16));
    for x in 0..=3 {
      assert_eq!(buffer[x], LINE_COLOR);
    }
    assert_eq!(buffer[3 * 16 + 3], MARKER_COLOR);
    assert_eq!(buffer[5 * 16 + 5], 0);
  }

  #[test]
  fn test_draw_plane_blends() {
    let overlay = Overlay {
      plane: Some(PlaneMarker { center: Vector2d::new(30., 30.), radius: 20., opacity: 1. }),
      ..Overlay::empty()
    };
    let mut buffer = vec![];
    // Marker partly outside of the buffer must not panic.
    draw_overlay(&overlay, None, &mut buffer, 40, 40);
    let center = buffer[30 * 40 + 30];
    assert_eq!(center, (0x50 << 8) | 0x80);
    assert_eq!(buffer[0], 0);
  }
}
