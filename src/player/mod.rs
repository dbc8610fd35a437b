//! Playback lifecycle independent of any particular media engine.
//!
//! - `engine.rs` - the `MediaEngine` seam the controller drives
//! - `source.rs` - classifying the command-line target as file or stream
//! - `resolver.rs` - resolving a stream to its first playable sub-item
//! - `controller.rs` - the single task that owns engine, state and position

mod controller;
mod engine;
mod resolver;
mod source;

use thiserror::Error;

pub use controller::{ControlMessage, ControllerOptions, PlaybackController, PlayerState};
pub use engine::{EngineEvent, EngineOptions, MediaEngine};
pub use resolver::{ResolveError, StreamResolver, YtDlpResolver};
pub use source::MediaSource;

#[derive(Error, Debug)]
pub enum PlayerError {
  #[error("Engine error: {0}")]
  Engine(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("Stream resolution failed: {0}")]
  Resolve(#[from] ResolveError),
}

impl PlayerError {
  pub fn engine<E: std::error::Error + Send + Sync + 'static>(err: E) -> Self {
    PlayerError::Engine(Box::new(err))
  }
}
