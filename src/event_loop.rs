use markerless::all::*;

use softbuffer::GraphicsContext;
use winit::event::{ElementState, Event, KeyboardInput, VirtualKeyCode, WindowEvent};
use winit::event_loop::ControlFlow;
use winit::window::Window;

use crate::input::{Input, InputData};

// Drives the engine with recorded input, shared by the headless and the
// windowed modes.
pub struct Session {
  pub input: Input,
  pub engine: Engine,
  pub output: Option<BufWriter<File>>,
  pub frame_count: usize,
  pub tracking_count: usize,
}

impl Session {
  // Returns false when the input has ended.
  pub fn step(&mut self) -> Result<bool> {
    let data = match self.input.next()? {
      Some(data) => data,
      None => return Ok(false),
    };
    match data {
      InputData::Orientation { time: _, sample } => {
        self.engine.set_orientation(sample);
      },
      InputData::Frame { time, image } => {
        let result = self.engine.process_frame(image)?;
        self.frame_count += 1;
        if result.tracking { self.tracking_count += 1 }
        if let Some(output) = &mut self.output {
          serde_json::to_writer(&mut *output, &FrameRecord { time, result: &result })?;
          writeln!(output)?;
        }
      },
    }
    Ok(true)
  }

  pub fn finish(&mut self) -> Result<()> {
    if let Some(output) = &mut self.output {
      output.flush()?;
    }
    info!("Processed {} frames, plane tracked on {}.", self.frame_count, self.tracking_count);
    self.engine.dispose();
    Ok(())
  }
}

#[derive(Serialize)]
struct FrameRecord<'a> {
  time: f64,
  #[serde(flatten)]
  result: &'a FrameResult,
}

pub struct EventLoopArgs<'a> {
  pub session: &'a mut Session,
  pub buffer: &'a mut Vec<u32>,
  pub graphics_context: &'a mut GraphicsContext<Window>,
  pub paused: bool,
}

pub fn handle_event(
  event: Event<()>,
  control_flow: &mut ControlFlow,
  args: &mut EventLoopArgs,
) -> Result<()> {
  let (window_width, window_height) = {
    let size = args.graphics_context.window().inner_size();
    (size.width as usize, size.height as usize)
  };
  if args.buffer.len() != window_width * window_height {
    *args.buffer = vec![0; window_width * window_height];
  }

  match event {
    Event::RedrawRequested(window_id) if window_id == args.graphics_context.window().id() => {
      args.graphics_context.set_buffer(&args.buffer, window_width as u16, window_height as u16);
    },
    Event::WindowEvent {
      event,
      window_id,
    } => {
      if event == WindowEvent::CloseRequested && window_id == args.graphics_context.window().id() {
        *control_flow = ControlFlow::Exit;
      }
      match event {
        WindowEvent::KeyboardInput {
          input: KeyboardInput {
            state: ElementState::Pressed,
            virtual_keycode: Some(keycode),
            scancode: _,
            ..
          },
          is_synthetic: _,
          device_id: _,
        } => {
          match keycode {
            VirtualKeyCode::Escape | VirtualKeyCode::Q => {
              *control_flow = ControlFlow::Exit;
            },
            VirtualKeyCode::Space => {
              args.paused = !args.paused;
            },
            VirtualKeyCode::R => {
              args.session.engine.reset();
            },
            _ => {}, // Other keys.
          }
        },
        _ => {}, // Other window events.
      }
    },
    Event::MainEventsCleared if !args.paused => {
      // Consume input until the next frame so that every redraw shows one.
      let frame_count = args.session.frame_count;
      while args.session.frame_count == frame_count {
        if !args.session.step()? {
          *control_flow = ControlFlow::Exit;
          return Ok(());
        }
      }
      if let Some(overlay) = args.session.engine.overlay() {
        draw_overlay(
          overlay,
          args.session.engine.last_frame(),
          args.buffer,
          window_width,
          window_height,
        );
        args.graphics_context.window().set_title(&overlay.text.join("  "));
      }
      args.graphics_context.window().request_redraw();
    },
    _ => {}, // Other events.
  }
  Ok(())
}
