//! High-level MPV client with command methods.

use std::path::PathBuf;
use std::process::Child;
use std::time::Duration;

use async_channel::Receiver;
use thiserror::Error;

use super::ipc::{IpcError, MpvIpc};
use super::process::{cleanup_ipc, ipc_path, spawn_mpv, ProcessError};
use super::protocol::{MpvCommand, MpvEvent, MpvResponse, PropertyValue};

#[derive(Error, Debug)]
pub enum MpvError {
  #[error("Process error: {0}")]
  Process(#[from] ProcessError),
  #[error("IPC error: {0}")]
  Ipc(#[from] IpcError),
  #[error("MPV command failed: {0}")]
  CommandFailed(String),
  #[error("Not connected")]
  NotConnected,
}

/// High-level MPV client. Owns the child process and its IPC connection.
pub struct MpvClient {
  mpv_path: Option<PathBuf>,
  process: Option<Child>,
  ipc: Option<MpvIpc>,
  ipc_path: String,
}

impl MpvClient {
  /// Create a new MPV client. `None` means auto-detect the executable.
  pub fn new(mpv_path: Option<PathBuf>) -> Self {
    Self {
      mpv_path,
      process: None,
      ipc: None,
      ipc_path: ipc_path(),
    }
  }

  /// Start MPV with the given arguments and connect to IPC.
  pub async fn start(&mut self, player_args: &[String]) -> Result<(), MpvError> {
    cleanup_ipc(&self.ipc_path);

    let child = spawn_mpv(self.mpv_path.as_ref(), &self.ipc_path, player_args)?;
    self.process = Some(child);

    // Wait a bit for MPV to create the socket
    tokio::time::sleep(Duration::from_millis(500)).await;

    match MpvIpc::connect(&self.ipc_path, 10).await {
      Ok(conn) => {
        self.ipc = Some(conn);
        log::info!("MPV client connected");
        Ok(())
      }
      Err(e) => {
        log::error!("Could not reach MPV over IPC: {}", e);
        self.kill_process().await;
        Err(e.into())
      }
    }
  }

  /// Quit MPV, close the connection and reap the process.
  pub async fn shutdown(&mut self) {
    if let Some(conn) = self.ipc.take() {
      // Best effort: a wedged MPV is killed below anyway
      let quit = tokio::time::timeout(
        Duration::from_secs(1),
        conn.send_command(MpvCommand::quit()),
      )
      .await;
      if let Ok(Err(e)) = quit {
        log::debug!("MPV quit command failed: {}", e);
      }
      conn.close();
    }

    self.kill_process().await;
    cleanup_ipc(&self.ipc_path);
    log::info!("MPV client stopped");
  }

  async fn kill_process(&mut self) {
    let Some(mut child) = self.process.take() else {
      return;
    };
    let pid = child.id();
    log::debug!("Reaping MPV process (pid: {})", pid);

    let result = tokio::task::spawn_blocking(move || {
      // quit may already have ended it; kill then fails harmlessly
      let _ = child.kill();
      child.wait()
    })
    .await;

    match result {
      Ok(Ok(status)) => log::info!("MPV process exited with: {}", status),
      Ok(Err(e)) => log::error!("wait() failed: {}", e),
      Err(e) => log::error!("spawn_blocking panicked during process cleanup: {}", e),
    }
  }

  /// Check if connected.
  pub fn is_connected(&self) -> bool {
    self.ipc.is_some()
  }

  /// Send a command to MPV.
  async fn send(&self, cmd: MpvCommand) -> Result<MpvResponse, MpvError> {
    let ipc = self.ipc.as_ref().ok_or(MpvError::NotConnected)?;
    let response = ipc.send_command(cmd).await?;

    if !response.is_success() {
      return Err(MpvError::CommandFailed(response.error));
    }

    Ok(response)
  }

  /// Load a file for playback, replacing the current one.
  pub async fn loadfile(&self, url: &str) -> Result<(), MpvError> {
    log::info!("Loading file: {}", url);
    self.send(MpvCommand::loadfile(url)).await?;
    Ok(())
  }

  /// Stop playback; MPV goes idle.
  pub async fn stop_playback(&self) -> Result<(), MpvError> {
    self.send(MpvCommand::stop()).await?;
    Ok(())
  }

  /// Set pause state.
  pub async fn set_pause(&self, paused: bool) -> Result<(), MpvError> {
    self.send(MpvCommand::set_pause(paused)).await?;
    Ok(())
  }

  /// Set a string property (e.g., `start`).
  pub async fn set_property_string(&self, name: &str, value: &str) -> Result<(), MpvError> {
    self.send(MpvCommand::set_property_string(name, value)).await?;
    Ok(())
  }

  /// Get a property value.
  pub async fn get_property(&self, name: &str) -> Result<PropertyValue, MpvError> {
    let response = self.send(MpvCommand::get_property(name)).await?;
    Ok(
      response
        .data
        .map(PropertyValue::from)
        .unwrap_or(PropertyValue::Null),
    )
  }

  /// Get current pause state.
  pub async fn get_pause(&self) -> Result<bool, MpvError> {
    match self.get_property("pause").await? {
      PropertyValue::Bool(b) => Ok(b),
      _ => Ok(true),
    }
  }

  /// True while MPV has nothing loaded.
  pub async fn get_idle(&self) -> Result<bool, MpvError> {
    match self.get_property("idle-active").await? {
      PropertyValue::Bool(b) => Ok(b),
      _ => Ok(true),
    }
  }

  /// Playback position in percent (0-100).
  ///
  /// Unavailable while idle or before the file's duration is known; that reads as 0.
  pub async fn get_percent_pos(&self) -> Result<f64, MpvError> {
    match self.get_property("percent-pos").await {
      Ok(PropertyValue::Number(n)) => Ok(n),
      Ok(_) | Err(MpvError::CommandFailed(_)) => Ok(0.0),
      Err(e) => Err(e),
    }
  }

  /// Get event receiver for playback events.
  pub fn events(&self) -> Option<Receiver<MpvEvent>> {
    self.ipc.as_ref().map(|ipc| ipc.events())
  }
}
