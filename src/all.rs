// NOTE This kind of import-all file isn't a common Rust idiom.

pub use crate::{
  detector::*,
  engine::*,
  feature_set::*,
  image::*,
  motion_tracker::*,
  optical_flow::*,
  orientation::*,
  parameters::*,
  plane::*,
  pose::*,
  primitives::*,
  pyramid::*,
  types::*,
  util::*,
  visualize::*,
};

pub use {
  std::{
    fs::File,
    io::{BufRead, BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
  },
  log::{debug, error, info, warn, LevelFilter},
  nalgebra::{dmatrix, DMatrix},
  serde::{Deserialize, Serialize},
  anyhow::{anyhow, bail, Context as AnyhowContext, Result},
};
