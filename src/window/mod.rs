//! The host window the media engine renders into.
//!
//! - `handle.rs` - native window id shared with the parent and the engine
//! - `style.rs` - platform styling that keeps the window out of the switcher

mod handle;
mod style;

use async_channel::Sender;
use thiserror::Error;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowId};

use crate::player::ControlMessage;
use crate::report::{Reporter, Stage};

pub use handle::NativeHandle;

#[derive(Error, Debug)]
pub enum ShellError {
  #[error("Failed to create window: {0}")]
  Create(#[from] winit::error::OsError),
  #[error("Window handle unavailable: {0}")]
  Handle(#[from] raw_window_handle::HandleError),
  #[error("Unsupported window handle: {0}")]
  UnsupportedHandle(String),
  #[error("Failed to style window: {0}")]
  Style(String),
}

/// Events posted to the UI thread from the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellEvent {
  /// The controller has torn down; leave the event loop.
  Exit,
}

/// Called once with the native handle after the window is up.
pub type OnReady = Box<dyn FnOnce(NativeHandle)>;

pub struct Shell {
  title: String,
  window: Option<Window>,
  on_ready: Option<OnReady>,
  control: Sender<ControlMessage>,
  reporter: Reporter,
}

impl Shell {
  pub fn new(
    title: String,
    control: Sender<ControlMessage>,
    reporter: Reporter,
    on_ready: OnReady,
  ) -> Self {
    Self {
      title,
      window: None,
      on_ready: Some(on_ready),
      control,
      reporter,
    }
  }

  fn create_window(&self, event_loop: &ActiveEventLoop) -> Result<(Window, NativeHandle), ShellError> {
    let attributes = Window::default_attributes()
      .with_title(self.title.clone())
      .with_decorations(false)
      .with_active(false);

    #[cfg(windows)]
    let attributes = {
      use winit::platform::windows::WindowAttributesExtWindows;
      attributes.with_skip_taskbar(true)
    };

    let window = event_loop.create_window(attributes)?;
    let handle = NativeHandle::of(&window)?;

    // A window stuck in the switcher is ugly but still a working wallpaper
    if let Err(e) = style::apply(&window, handle) {
      self.reporter.error(Stage::Window, e.to_string());
    }

    Ok((window, handle))
  }

  /// Ask the controller to tear down; it posts `ShellEvent::Exit` when done.
  fn request_shutdown(&self, event_loop: &ActiveEventLoop) {
    if self.control.try_send(ControlMessage::Shutdown).is_err() {
      // No controller left to wait for
      event_loop.exit();
    }
  }
}

impl ApplicationHandler<ShellEvent> for Shell {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if self.window.is_some() {
      return;
    }

    match self.create_window(event_loop) {
      Ok((window, handle)) => {
        log::info!("Window created: {}", handle);
        if let Err(e) = self.reporter.announce_window(handle) {
          log::error!("Failed to send window handle to parent: {}", e);
        }
        self.window = Some(window);
        if let Some(on_ready) = self.on_ready.take() {
          on_ready(handle);
        }
      }
      Err(e) => {
        self.reporter.error(Stage::Window, e.to_string());
        event_loop.exit();
      }
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
    match event {
      WindowEvent::CloseRequested => {
        log::info!("Window close requested");
        self.request_shutdown(event_loop);
      }
      WindowEvent::Destroyed => {
        self.window = None;
        self.request_shutdown(event_loop);
      }
      _ => {}
    }
  }

  fn user_event(&mut self, event_loop: &ActiveEventLoop, event: ShellEvent) {
    match event {
      ShellEvent::Exit => {
        log::info!("Leaving event loop");
        self.window = None;
        event_loop.exit();
      }
    }
  }
}
