//! [`MediaEngine`] backed by an embedded MPV process.

use std::path::PathBuf;

use async_channel::{Receiver, Sender};

use super::client::{MpvClient, MpvError};
use super::protocol::MpvEvent;
use crate::player::{EngineEvent, EngineOptions, MediaEngine};

/// MPV rendering into the host window through `--wid`.
pub struct MpvEngine {
  client: MpvClient,
  events: Option<Receiver<EngineEvent>>,
}

impl MpvEngine {
  pub fn new(mpv_path: Option<PathBuf>) -> Self {
    Self {
      client: MpvClient::new(mpv_path),
      events: None,
    }
  }
}

/// Translate engine options into MPV command-line flags.
pub fn player_args(options: &EngineOptions) -> Vec<String> {
  let mut args = Vec::new();

  match options.window {
    Some(handle) => args.push(format!("--wid={}", handle)),
    None => args.push("--force-window=yes".to_string()),
  }

  let hwdec = if options.hardware_decoding { "auto-safe" } else { "no" };
  args.push(format!("--hwdec={}", hwdec));

  if options.fill_window {
    args.push("--keepaspect=no".to_string());
  }

  let stop_screensaver = if options.allow_screensaver { "no" } else { "yes" };
  args.push(format!("--stop-screensaver={}", stop_screensaver));

  // A wallpaper never takes input or draws an on-screen UI
  args.extend(
    [
      "--no-input-default-bindings",
      "--input-vo-keyboard=no",
      "--input-cursor=no",
      "--osc=no",
      "--osd-level=0",
      "--cursor-autohide=always",
    ]
    .map(String::from),
  );

  args.extend(options.extra_args.iter().cloned());
  args
}

/// Forward the events the controller cares about; drops the sender when MPV
/// goes away so the controller sees the stream close.
async fn forward_events(mpv_events: Receiver<MpvEvent>, tx: Sender<EngineEvent>) {
  while let Ok(event) = mpv_events.recv().await {
    let forwarded = if event.is_file_loaded() {
      EngineEvent::Loaded
    } else if event.is_end_of_file() {
      EngineEvent::EndReached
    } else if let Some(error) = event.load_error() {
      log::warn!("MPV failed to play file: {}", error);
      EngineEvent::LoadFailed(error.to_string())
    } else {
      continue;
    };

    if tx.send(forwarded).await.is_err() {
      break;
    }
  }
  log::debug!("MPV event forwarder finished");
}

impl MediaEngine for MpvEngine {
  type Error = MpvError;

  async fn open(&mut self, options: &EngineOptions) -> Result<(), MpvError> {
    self.client.start(&player_args(options)).await?;

    let mpv_events = self.client.events().ok_or(MpvError::NotConnected)?;
    let (tx, rx) = async_channel::unbounded();
    tokio::spawn(forward_events(mpv_events, tx));
    self.events = Some(rx);
    Ok(())
  }

  async fn play(&mut self, location: &str, start: Option<f32>) -> Result<(), MpvError> {
    // `start` applies to the next loadfile, so it has to be reset on every call
    let start = match start {
      Some(pos) if pos > 0.0 => format!("{:.4}%", pos.clamp(0.0, 1.0) * 100.0),
      _ => "none".to_string(),
    };
    self.client.set_property_string("start", &start).await?;
    self.client.set_pause(false).await?;
    self.client.loadfile(location).await
  }

  async fn stop(&mut self) -> Result<(), MpvError> {
    self.client.stop_playback().await
  }

  async fn suspend(&mut self) -> Result<(), MpvError> {
    self.client.set_pause(true).await
  }

  async fn resume(&mut self) -> Result<(), MpvError> {
    self.client.set_pause(false).await
  }

  async fn is_playing(&mut self) -> Result<bool, MpvError> {
    if self.client.get_idle().await? {
      return Ok(false);
    }
    Ok(!self.client.get_pause().await?)
  }

  async fn position(&mut self) -> Result<f32, MpvError> {
    let percent = self.client.get_percent_pos().await?;
    Ok((percent / 100.0).clamp(0.0, 1.0) as f32)
  }

  fn events(&self) -> Option<Receiver<EngineEvent>> {
    self.events.clone()
  }

  async fn close(&mut self) {
    self.events = None;
    self.client.shutdown().await;
  }
}
