//! The seam between the playback controller and whatever renders the video.

use std::future::Future;

use async_channel::Receiver;

use crate::window::NativeHandle;

/// How the engine should be brought up.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineOptions {
  /// Window to render into. `None` lets the engine open its own.
  pub window: Option<NativeHandle>,
  pub hardware_decoding: bool,
  /// Stretch the video over the whole surface, ignoring its aspect ratio.
  pub fill_window: bool,
  /// Let the OS screensaver and monitor sleep kick in during playback.
  pub allow_screensaver: bool,
  /// Extra engine-specific arguments, appended last.
  pub extra_args: Vec<String>,
}

impl Default for EngineOptions {
  fn default() -> Self {
    Self {
      window: None,
      hardware_decoding: true,
      fill_window: true,
      allow_screensaver: true,
      extra_args: Vec::new(),
    }
  }
}

/// Notifications flowing from the engine to the controller.
///
/// `play` only queues a load; whether the media actually opened arrives later
/// as `Loaded` or `LoadFailed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
  /// The media opened and decoding started.
  Loaded,
  /// The media could not be played: missing, unsupported or unreachable.
  LoadFailed(String),
  /// The loaded media played to its natural end.
  EndReached,
}

/// A native media engine: owns the decoder, the player and the loaded item.
///
/// All methods are driven from a single task, so implementations need no
/// internal locking. Once [`close`](MediaEngine::close) has run, the engine is
/// not reused.
pub trait MediaEngine: Send {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the engine and player instances.
  fn open(&mut self, options: &EngineOptions)
    -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Load `location` and start playing it, optionally from a normalized
  /// position in `[0, 1]`.
  fn play(
    &mut self,
    location: &str,
    start: Option<f32>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Stop playback and unload the decoder.
  fn stop(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Freeze playback without unloading.
  fn suspend(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// Continue after [`suspend`](MediaEngine::suspend).
  fn resume(&mut self) -> impl Future<Output = Result<(), Self::Error>> + Send;

  /// True while media is loaded and not suspended.
  fn is_playing(&mut self) -> impl Future<Output = Result<bool, Self::Error>> + Send;

  /// Normalized playback position in `[0, 1]`.
  fn position(&mut self) -> impl Future<Output = Result<f32, Self::Error>> + Send;

  /// Subscribe to engine events. The stream closes when the engine goes away.
  fn events(&self) -> Option<Receiver<EngineEvent>>;

  /// Release player and engine. Must tolerate a partially opened engine and
  /// being called twice.
  fn close(&mut self) -> impl Future<Output = ()> + Send;
}
