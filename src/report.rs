//! Machine-readable lines for the parent process.
//!
//! Stdout belongs to the parent: it reads the window handle from it and,
//! optionally, structured diagnostics. Logs go to stderr.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::window::NativeHandle;

/// Prefix of every diagnostic line.
pub const ERROR_PREFIX: &str = "lively:error";

/// Where a failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
  /// The config file was unreadable or invalid; defaults are in use.
  Config,
  Initialize,
  Playback,
  Listener,
  Teardown,
  Window,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
  pub stage: Stage,
  pub message: String,
}

/// Single writer for everything the parent parses.
#[derive(Clone)]
pub struct Reporter {
  out: Arc<Mutex<Box<dyn Write + Send>>>,
  errors_enabled: bool,
}

impl Reporter {
  pub fn stdout(errors_enabled: bool) -> Self {
    Self::with_writer(Box::new(io::stdout()), errors_enabled)
  }

  pub fn with_writer(out: Box<dyn Write + Send>, errors_enabled: bool) -> Self {
    Self {
      out: Arc::new(Mutex::new(out)),
      errors_enabled,
    }
  }

  /// Hand the window to the parent: `HWND<decimal handle>`.
  pub fn announce_window(&self, handle: NativeHandle) -> io::Result<()> {
    self.write_line(&format!("HWND{}", handle))
  }

  /// Report a failure. Never fails itself; a broken stdout is only logged.
  pub fn error(&self, stage: Stage, message: impl Into<String>) {
    let diagnostic = Diagnostic {
      stage,
      message: message.into(),
    };
    log::error!("{:?} failed: {}", diagnostic.stage, diagnostic.message);

    if !self.errors_enabled {
      return;
    }
    match serde_json::to_string(&diagnostic) {
      Ok(json) => {
        if let Err(e) = self.write_line(&format!("{} {}", ERROR_PREFIX, json)) {
          log::warn!("Could not report diagnostic to parent: {}", e);
        }
      }
      Err(e) => log::warn!("Could not serialize diagnostic: {}", e),
    }
  }

  fn write_line(&self, line: &str) -> io::Result<()> {
    let mut out = self.out.lock();
    writeln!(out, "{}", line)?;
    out.flush()
  }
}
