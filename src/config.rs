//! Player configuration, read from a JSON file next to the user's other configs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const CONFIG_DIR: &str = "lively-player";
const CONFIG_FILE: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("Failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    source: std::io::Error,
  },
  #[error("Failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
  #[error("Invalid configuration: {0}")]
  Invalid(String),
}

/// What `lively:vid-pause` does to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PauseMode {
  /// Remember the position and unload the decoder; resume reloads from there.
  #[default]
  Stop,
  /// Freeze the decoder in place; resume is instant but memory stays allocated.
  Suspend,
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
  /// Custom MPV executable path (None = auto-detect).
  #[serde(default)]
  pub mpv_path: Option<String>,

  /// Additional MPV command-line arguments.
  #[serde(default)]
  pub mpv_args: Vec<String>,

  /// Custom yt-dlp path used to resolve streams (None = look on PATH).
  #[serde(default)]
  pub ytdl_path: Option<String>,

  #[serde(default = "default_true")]
  pub hardware_decoding: bool,

  /// Stretch video over the whole window.
  #[serde(default = "default_true")]
  pub fill_window: bool,

  /// Let the screensaver and monitor sleep run while the wallpaper plays.
  #[serde(default = "default_true")]
  pub allow_screensaver: bool,

  #[serde(default)]
  pub pause_mode: PauseMode,

  /// Resolve network sources to their first playable item before playing.
  #[serde(default = "default_true")]
  pub resolve_streams: bool,

  #[serde(default = "default_resolve_timeout")]
  pub resolve_timeout_secs: u32,

  #[serde(default = "default_shutdown_timeout")]
  pub shutdown_timeout_secs: u32,

  /// Write `lively:error` lines to stdout.
  #[serde(default = "default_true")]
  pub report_errors: bool,

  #[serde(default = "default_window_title")]
  pub window_title: String,
}

fn default_true() -> bool {
  true
}

fn default_resolve_timeout() -> u32 {
  30
}

fn default_shutdown_timeout() -> u32 {
  5
}

fn default_window_title() -> String {
  "Lively Video Player".to_string()
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      mpv_path: None,
      mpv_args: Vec::new(),
      ytdl_path: None,
      hardware_decoding: true,
      fill_window: true,
      allow_screensaver: true,
      pause_mode: PauseMode::default(),
      resolve_streams: true,
      resolve_timeout_secs: default_resolve_timeout(),
      shutdown_timeout_secs: default_shutdown_timeout(),
      report_errors: true,
      window_title: default_window_title(),
    }
  }
}

impl AppConfig {
  /// Default location: `<config dir>/lively-player/config.json`.
  pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
  }

  /// Load from `path`. A missing file yields the defaults.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let text = match std::fs::read_to_string(path) {
      Ok(text) => text,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        })
      }
    };

    let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    config.validate()?;
    Ok(config)
  }

  /// Validate configuration values.
  pub fn validate(&self) -> Result<(), ConfigError> {
    if self.resolve_timeout_secs < 1 || self.resolve_timeout_secs > 300 {
      return Err(ConfigError::Invalid(
        "Resolve timeout must be between 1 and 300 seconds".to_string(),
      ));
    }
    if self.shutdown_timeout_secs < 1 || self.shutdown_timeout_secs > 60 {
      return Err(ConfigError::Invalid(
        "Shutdown timeout must be between 1 and 60 seconds".to_string(),
      ));
    }
    if self.mpv_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
      return Err(ConfigError::Invalid("MPV path cannot be empty".to_string()));
    }
    Ok(())
  }

  pub fn mpv_path(&self) -> Option<PathBuf> {
    self.mpv_path.as_ref().map(PathBuf::from)
  }

  pub fn ytdl_path(&self) -> Option<PathBuf> {
    self
      .ytdl_path
      .as_ref()
      .filter(|s| !s.is_empty())
      .map(PathBuf::from)
  }

  pub fn resolve_timeout(&self) -> Duration {
    Duration::from_secs(self.resolve_timeout_secs as u64)
  }

  pub fn shutdown_timeout(&self) -> Duration {
    Duration::from_secs(self.shutdown_timeout_secs as u64)
  }
}
