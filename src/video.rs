use markerless::all::*;

use std::process::{Child, ChildStdout, Command, Stdio};

// Decodes a video file to raw RGBA frames with an `ffmpeg` child process.
pub struct VideoInput {
  child: Child,
  child_stdout: ChildStdout,
  video_frame: RgbaImage,
}

impl VideoInput {
  pub fn new(path: &Path) -> Result<VideoInput> {
    if !path.exists() {
      bail!("Video file {} does not exist.", path.display());
    }
    let mut child = Command::new("ffmpeg")
      .arg("-i").arg(path)
      .args(["-f", "rawvideo", "-vcodec", "rawvideo", "-vsync", "vfr", "-pix_fmt", "rgba", "-"])
      .stdout(Stdio::piped())
      .stderr(Stdio::null())
      .spawn()
      .context("Failed to start ffmpeg.")?;
    let child_stdout = child.stdout.take().ok_or(anyhow!("Failed to capture ffmpeg output."))?;
    Ok(VideoInput {
      child,
      child_stdout,
      video_frame: RgbaImage::new(0, 0),
    })
  }

  // The dimensions come from the recording metadata since raw video has no
  // header.
  pub fn read(&mut self, width: usize, height: usize) -> Result<&RgbaImage> {
    let n = 4 * width * height;
    if self.video_frame.data.len() != n {
      self.video_frame.data.resize(n, 0);
    }
    self.child_stdout.read_exact(&mut self.video_frame.data)
      .context("Reading bytes from video input failed.")?;
    self.video_frame.width = width;
    self.video_frame.height = height;
    Ok(&self.video_frame)
  }
}

impl Drop for VideoInput {
  fn drop(&mut self) {
    let _ = self.child.kill();
    let _ = self.child.wait();
  }
}
