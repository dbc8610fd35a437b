//! MPV JSON IPC protocol types.
//!
//! Reference: https://mpv.io/manual/master/#json-ipc

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};

/// Global request ID counter for unique command identification.
static REQUEST_ID: AtomicI64 = AtomicI64::new(1);

/// Generate a unique request ID for MPV commands.
pub fn next_request_id() -> i64 {
  REQUEST_ID.fetch_add(1, Ordering::SeqCst)
}

/// Command sent to MPV via IPC.
#[derive(Debug, Clone, Serialize)]
pub struct MpvCommand {
  pub command: Vec<serde_json::Value>,
  pub request_id: i64,
}

impl MpvCommand {
  /// Create a new command with auto-generated request ID.
  pub fn new(args: Vec<serde_json::Value>) -> Self {
    Self {
      command: args,
      request_id: next_request_id(),
    }
  }

  /// Load a file, replacing whatever is currently playing.
  pub fn loadfile(url: &str) -> Self {
    Self::new(vec!["loadfile".into(), url.into(), "replace".into()])
  }

  /// Stop playback and clear the playlist. MPV stays idle afterwards.
  pub fn stop() -> Self {
    Self::new(vec!["stop".into()])
  }

  /// Set pause state.
  pub fn set_pause(paused: bool) -> Self {
    Self::new(vec!["set_property".into(), "pause".into(), paused.into()])
  }

  /// Set a string property (e.g., `start`).
  pub fn set_property_string(name: &str, value: &str) -> Self {
    Self::new(vec!["set_property".into(), name.into(), value.into()])
  }

  /// Get a property value.
  pub fn get_property(name: &str) -> Self {
    Self::new(vec!["get_property".into(), name.into()])
  }

  /// Quit MPV.
  pub fn quit() -> Self {
    Self::new(vec!["quit".into()])
  }
}

/// Response from MPV for a command.
#[derive(Debug, Clone, Deserialize)]
pub struct MpvResponse {
  /// "success" or error message.
  pub error: String,
  /// Response data (command-specific).
  pub data: Option<serde_json::Value>,
  /// Matching request ID.
  pub request_id: i64,
}

impl MpvResponse {
  /// Check if the command succeeded.
  pub fn is_success(&self) -> bool {
    self.error == "success"
  }
}

/// Event sent by MPV (playback events, property changes, etc.).
#[derive(Debug, Clone, Deserialize)]
pub struct MpvEvent {
  /// Event type (e.g., "end-file", "file-loaded", "idle").
  pub event: String,
  /// Reason for end-file events (e.g., "eof", "stop", "quit", "error").
  pub reason: Option<String>,
  /// Error text attached to end-file events with reason "error".
  pub file_error: Option<String>,
}

impl MpvEvent {
  /// True when playback ran to the natural end of the file.
  ///
  /// `stop`, `quit` and `redirect` end-file reasons are caused by our own
  /// commands and must not trigger a restart.
  pub fn is_end_of_file(&self) -> bool {
    self.event == "end-file" && self.reason.as_deref() == Some("eof")
  }

  /// True once MPV has opened the file and started decoding it.
  pub fn is_file_loaded(&self) -> bool {
    self.event == "file-loaded"
  }

  /// The error text of an end-file event caused by a file that could not be
  /// played (missing, unsupported, unreachable).
  pub fn load_error(&self) -> Option<&str> {
    if self.event == "end-file" && self.reason.as_deref() == Some("error") {
      Some(self.file_error.as_deref().unwrap_or("unknown error"))
    } else {
      None
    }
  }
}

/// Property values the player reads back from MPV.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
  Bool(bool),
  Number(f64),
  /// Null, or a type no caller asks for.
  Null,
}

impl From<serde_json::Value> for PropertyValue {
  fn from(value: serde_json::Value) -> Self {
    match value {
      serde_json::Value::Bool(b) => PropertyValue::Bool(b),
      serde_json::Value::Number(n) => PropertyValue::Number(n.as_f64().unwrap_or(0.0)),
      _ => PropertyValue::Null,
    }
  }
}

/// Message received from MPV IPC (either response or event).
#[derive(Debug, Clone)]
pub enum MpvMessage {
  Response(MpvResponse),
  Event(MpvEvent),
}

impl MpvMessage {
  /// Parse a JSON line from MPV.
  pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
    // Responses always carry request_id; everything else is an event
    if line.contains("request_id") {
      let response: MpvResponse = serde_json::from_str(line)?;
      Ok(MpvMessage::Response(response))
    } else {
      let event: MpvEvent = serde_json::from_str(line)?;
      Ok(MpvMessage::Event(event))
    }
  }
}
