//! MPV process detection and spawning.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
  #[error("MPV executable not found")]
  NotFound,
  #[error("Failed to spawn MPV: {0}")]
  SpawnFailed(#[from] std::io::Error),
}

/// Build a fresh IPC socket/pipe path for one MPV instance.
///
/// Lively can run several wallpaper windows at once, so every player gets its
/// own endpoint.
pub fn ipc_path() -> String {
  let id = uuid::Uuid::new_v4().simple().to_string();
  #[cfg(windows)]
  {
    format!(r"\\.\pipe\lively-player-{}", id)
  }
  #[cfg(not(windows))]
  {
    std::env::temp_dir()
      .join(format!("lively-player-{}.sock", id))
      .to_string_lossy()
      .into_owned()
  }
}

/// Find MPV executable in common locations.
pub fn find_mpv() -> Option<PathBuf> {
  // Check PATH first
  if let Ok(path) = which::which("mpv") {
    return Some(path);
  }

  // Lively ships its own copy next to the player
  if let Some(dir) = std::env::current_exe()
    .ok()
    .and_then(|exe| exe.parent().map(|p| p.to_path_buf()))
  {
    let bundled = dir.join(if cfg!(windows) { "mpv.exe" } else { "mpv" });
    if bundled.exists() {
      return Some(bundled);
    }
  }

  #[cfg(windows)]
  {
    let common_paths = [
      r"C:\Program Files\mpv\mpv.exe",
      r"C:\Program Files (x86)\mpv\mpv.exe",
      r"C:\mpv\mpv.exe",
    ];
    for path in common_paths {
      let p = PathBuf::from(path);
      if p.exists() {
        return Some(p);
      }
    }
  }

  #[cfg(target_os = "linux")]
  {
    let common_paths = ["/usr/bin/mpv", "/usr/local/bin/mpv"];
    for path in common_paths {
      let p = PathBuf::from(path);
      if p.exists() {
        return Some(p);
      }
    }
  }

  None
}

/// Spawn MPV in idle mode with the IPC server enabled.
///
/// `player_args` carry the embedding and playback flags; they come after the
/// fixed flags so a user's `mpvArgs` can override anything.
pub fn spawn_mpv(
  mpv_path: Option<&PathBuf>,
  ipc: &str,
  player_args: &[String],
) -> Result<Child, ProcessError> {
  let mpv_exe = mpv_path
    .cloned()
    .or_else(find_mpv)
    .ok_or(ProcessError::NotFound)?;

  log::info!("Spawning MPV: {:?} with IPC: {}", mpv_exe, ipc);
  log::debug!("MPV args: {:?}", player_args);

  let mut cmd = Command::new(&mpv_exe);
  cmd
    .arg(format!("--input-ipc-server={}", ipc))
    .arg("--idle=yes")
    .arg("--keep-open=no")
    .arg("--no-terminal")
    .args(player_args);

  let child = cmd
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()?;

  Ok(child)
}

/// Remove a stale IPC socket.
pub fn cleanup_ipc(path: &str) {
  #[cfg(not(windows))]
  {
    let _ = std::fs::remove_file(path);
  }
  #[cfg(windows)]
  {
    // Windows named pipes are cleaned up automatically
    let _ = path;
  }
}
