use crate::all::*;

use std::sync::atomic::{AtomicU64, Ordering};

// Device orientation angles in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct OrientationSample {
  pub heading: f64,
  pub pitch: f64,
  pub roll: f64,
}

// Latest orientation sample, written by the sensor callback and read by the
// frame pipeline without locking. Every angle is stored atomically on its
// own, so a reader racing with a writer may see angles from two consecutive
// samples. Last write wins.
#[derive(Debug, Default)]
pub struct SharedOrientation {
  heading: AtomicU64,
  pitch: AtomicU64,
  roll: AtomicU64,
}

impl SharedOrientation {
  pub fn new() -> SharedOrientation {
    SharedOrientation::default()
  }

  pub fn store(&self, sample: OrientationSample) {
    self.heading.store(sample.heading.to_bits(), Ordering::Relaxed);
    self.pitch.store(sample.pitch.to_bits(), Ordering::Relaxed);
    self.roll.store(sample.roll.to_bits(), Ordering::Relaxed);
  }

  pub fn load(&self) -> OrientationSample {
    OrientationSample {
      heading: f64::from_bits(self.heading.load(Ordering::Relaxed)),
      pitch: f64::from_bits(self.pitch.load(Ordering::Relaxed)),
      roll: f64::from_bits(self.roll.load(Ordering::Relaxed)),
    }
  }
}
