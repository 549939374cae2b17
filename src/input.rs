use markerless::all::*;

use crate::video::VideoInput;

// Recorded session: `data.jsonl` with sensor and frame events, and the video
// they refer to in `data.mp4`.
pub struct Input {
  reader: BufReader<File>,
  line: String,
  video: VideoInput,
}

pub enum InputData<'a> {
  Orientation { time: f64, sample: OrientationSample },
  Frame { time: f64, image: &'a RgbaImage },
}

#[derive(Deserialize)]
struct OrientationRecord {
  alpha: f64,
  beta: f64,
  gamma: f64,
}

#[derive(Deserialize)]
struct FrameRecord {
  width: usize,
  height: usize,
}

impl Input {
  pub fn new(folder: &Path) -> Result<Input> {
    let data_path = folder.join("data.jsonl");
    let file = File::open(&data_path)
      .context(format!("Failed to open {}.", data_path.display()))?;
    Ok(Input {
      reader: BufReader::new(file),
      line: String::new(),
      video: VideoInput::new(&folder.join("data.mp4"))?,
    })
  }

  // Not using `impl Iterator` to allow returning `Result`.
  // End of data is signaled by `Result::Ok(Option::None)`.
  pub fn next(&mut self) -> Result<Option<InputData>> {
    loop {
      self.line.clear();
      match self.reader.read_line(&mut self.line) {
        Ok(0) => return Ok(None),
        Err(err) => bail!("Failed to read line. {}", err),
        _ => {},
      }
      if self.line.trim().is_empty() { continue }
      let value: serde_json::Value = serde_json::from_str(&self.line)
        .context(format!("Input::next JSON deserialization failed for line: {}", self.line))?;
      let value = value.as_object()
        .ok_or(anyhow!("JSONL line is not a map."))?;
      let time = value.get("time").and_then(|t| t.as_f64())
        .ok_or(anyhow!("Time is not a number."))?;

      if let Some(orientation) = value.get("orientation") {
        let r: OrientationRecord = serde_json::from_value(orientation.clone())
          .context("Malformed orientation record.")?;
        let sample = OrientationSample { heading: r.alpha, pitch: r.beta, roll: r.gamma };
        return Ok(Some(InputData::Orientation { time, sample }));
      }
      else if let Some(frames) = value.get("frames") {
        let frames: Vec<FrameRecord> = serde_json::from_value(frames.clone())
          .context("Malformed frames record.")?;
        // TODO Support stereo recordings, for now only the first camera is read.
        let frame = frames.first().ok_or(anyhow!("Frames record without frames."))?;
        let image = self.video.read(frame.width, frame.height)?;
        return Ok(Some(InputData::Frame { time, image }));
      }
      else if value.contains_key("groundTruth") {
        // Pass.
      }
      else {
        warn!("Unrecognized data: {}", self.line.trim());
      }
    }
  }
}
