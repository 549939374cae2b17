//! Markerless planar surface tracking.
//!
//! Frames go into an [`Engine`](engine::Engine) one at a time. The engine keeps a
//! set of tracked corners alive with pyramidal optical flow, decides whether
//! their motion looks like a single rigid plane, and when it does, fuses the
//! aggregate motion with the device orientation into a placement pose.

pub mod all;
pub mod detector;
pub mod engine;
pub mod feature_set;
pub mod image;
pub mod motion_tracker;
pub mod optical_flow;
pub mod orientation;
pub mod parameters;
pub mod plane;
pub mod pose;
pub mod primitives;
pub mod pyramid;
pub mod types;
pub mod util;
pub mod visualize;
