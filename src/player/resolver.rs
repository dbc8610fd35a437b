//! Resolving a network location to its first playable sub-item.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum ResolveError {
  #[error("yt-dlp executable not found")]
  NotFound,
  #[error("Failed to run resolver: {0}")]
  Spawn(#[from] std::io::Error),
  #[error("Resolver exited with {status}: {stderr}")]
  Failed { status: String, stderr: String },
  #[error("Resolver timed out after {0:?}")]
  Timeout(Duration),
  #[error("No playable item found for {0}")]
  Empty(String),
}

/// Turns a container/page/playlist URL into something the engine can play.
pub trait StreamResolver: Send + Sync {
  /// Parse `location` over the network and return its first sub-item.
  fn resolve_first(
    &self,
    location: &str,
  ) -> impl Future<Output = Result<String, ResolveError>> + Send;
}

/// Resolver backed by `yt-dlp --get-url`.
pub struct YtDlpResolver {
  program: Option<PathBuf>,
  timeout: Duration,
}

impl YtDlpResolver {
  /// `program: None` looks for `yt-dlp` on PATH at resolve time.
  pub fn new(program: Option<PathBuf>, timeout: Duration) -> Self {
    Self { program, timeout }
  }

  fn program(&self) -> Result<PathBuf, ResolveError> {
    if let Some(path) = &self.program {
      return Ok(path.clone());
    }
    which::which("yt-dlp").map_err(|_| ResolveError::NotFound)
  }
}

impl StreamResolver for YtDlpResolver {
  async fn resolve_first(&self, location: &str) -> Result<String, ResolveError> {
    let program = self.program()?;
    log::info!("Resolving stream {} with {:?}", location, program);

    let mut cmd = Command::new(&program);
    cmd
      .arg("--no-playlist")
      .arg("--no-warnings")
      .arg("--format")
      .arg("best")
      .arg("--get-url")
      .arg(location)
      .stdin(Stdio::null())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      // The future may be dropped on shutdown; take the child with it
      .kill_on_drop(true);

    let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
      Ok(output) => output?,
      Err(_) => return Err(ResolveError::Timeout(self.timeout)),
    };

    if !output.status.success() {
      return Err(ResolveError::Failed {
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = first_entry(&stdout).ok_or_else(|| ResolveError::Empty(location.to_string()))?;
    log::debug!("Resolved {} -> {}", location, first);
    Ok(first.to_string())
  }
}

/// First non-empty line of resolver output.
pub fn first_entry(output: &str) -> Option<&str> {
  output.lines().map(str::trim).find(|line| !line.is_empty())
}
