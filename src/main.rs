mod event_loop;
mod input;
mod video;

use markerless::all::*;

use clap::Parser;

use event_loop::{handle_event, EventLoopArgs, Session};
use input::Input;

use softbuffer::GraphicsContext;
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::WindowBuilder;
use winit::platform::run_return::EventLoopExtRunReturn;

#[derive(Parser)]
struct Args {
  /// Folder with `data.jsonl` and `data.mp4`.
  #[clap(short)]
  input_folder: String,
  /// JSON file overriding any subset of the tracking parameters. When given,
  /// the parameter flags are ignored.
  #[clap(long)]
  config: Option<String>,
  /// Write one JSON result per frame to this file.
  #[clap(long)]
  output: Option<String>,
  /// Show the diagnostics overlay in a window.
  #[clap(long)]
  show: bool,
  #[clap(long, default_value = "info")]
  log_level: LevelFilter,
  #[clap(flatten)]
  parameters: ParameterSet,
}

fn handle_error(err: &anyhow::Error) {
  for (i, e) in err.chain().enumerate() {
    println!("  {}: {}", i + 1, e);
  }
}

fn main() {
  if let Err(err) = run() {
    handle_error(&err);
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let args = Args::parse();
  init_logging(args.log_level);

  let parameters = match &args.config {
    Some(path) => ParameterSet::from_json_file(Path::new(path))?,
    None => args.parameters.clone(),
  };
  let mut engine = Engine::with_builtin_primitives(parameters)?;
  engine.initialize()?;

  let output = match &args.output {
    Some(path) => Some(BufWriter::new(
      File::create(path).context(format!("Failed to create {}.", path))?,
    )),
    None => None,
  };
  let mut session = Session {
    input: Input::new(Path::new(&args.input_folder))?,
    engine,
    output,
    frame_count: 0,
    tracking_count: 0,
  };

  if args.show {
    show(&mut session)?;
  }
  else {
    while session.step()? {}
  }
  session.finish()
}

fn show(session: &mut Session) -> Result<()> {
  let width = 1280;
  let height = 720;
  let size = winit::dpi::PhysicalSize::new(width, height);
  let mut event_loop = EventLoop::new();
  let window = WindowBuilder::new()
    .with_title("markerless")
    .with_resizable(false)
    .with_min_inner_size(size)
    .with_max_inner_size(size)
    .build(&event_loop)
    .context("Failed to create window.")?;
  let mut graphics_context = unsafe { GraphicsContext::new(window) }
    .map_err(|_| anyhow!("Failed to create graphics context."))?;

  let mut buffer = vec![];
  let mut args = EventLoopArgs {
    session,
    buffer: &mut buffer,
    graphics_context: &mut graphics_context,
    paused: false,
  };

  let mut result = Ok(());
  event_loop.run_return(|event, _, control_flow| {
    if let Err(err) = handle_event(event, control_flow, &mut args) {
      result = Err(err);
      *control_flow = ControlFlow::Exit;
    }
  });
  result
}
