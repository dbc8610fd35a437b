use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use tokio::io::BufReader;
use winit::event_loop::EventLoop;

pub mod cli;
pub mod command;
pub mod config;
pub mod mpv;
pub mod player;
pub mod report;
pub mod window;

pub use config::AppConfig;
use cli::Args;
use command::ListenerExit;
use config::ConfigError;
use mpv::MpvEngine;
use player::{
  ControlMessage, ControllerOptions, EngineOptions, MediaSource, PlaybackController, YtDlpResolver,
};
use report::{Reporter, Stage};
use window::{NativeHandle, Shell, ShellEvent};

/// Grace period for runtime tasks (the blocking stdin reader) once the window is gone.
const RUNTIME_SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Error, Debug)]
pub enum AppError {
  #[error("Failed to start async runtime: {0}")]
  Runtime(#[from] std::io::Error),
  #[error("Event loop error: {0}")]
  EventLoop(#[from] winit::error::EventLoopError),
}

pub fn run() -> Result<(), AppError> {
  let args = Args::parse();
  init_logging(args.verbosity);
  log::debug!("Command-line args: {:?}", args);

  let (config, config_error) = load_config_or_default(args.config.as_ref());
  let reporter = Reporter::stdout(config.report_errors);
  if let Some(e) = config_error {
    reporter.error(Stage::Config, format!("{}; using defaults", e));
  }
  let source = MediaSource::parse(&args.source);
  log::info!("Lively player starting with {}", source);

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .thread_name("lively-player")
    .build()?;

  let event_loop = EventLoop::<ShellEvent>::with_user_event().build()?;
  let proxy = event_loop.create_proxy();
  let (control_tx, control_rx) = async_channel::unbounded();

  // Parent commands
  let listener_tx = control_tx.clone();
  let listener_reporter = reporter.clone();
  runtime.spawn(async move {
    let stdin = BufReader::new(tokio::io::stdin());
    match command::listen(stdin, &listener_tx).await {
      Ok(ListenerExit::ControllerGone) => {}
      Ok(exit) => log::info!("Stdin listener finished: {:?}", exit),
      Err(e) => listener_reporter.error(Stage::Listener, e.to_string()),
    }
    let _ = listener_tx.send(ControlMessage::Shutdown).await;
  });

  // Playback starts once the window exists
  let runtime_handle = runtime.handle().clone();
  let player_reporter = reporter.clone();
  let player_config = config.clone();
  let on_ready = Box::new(move |handle: NativeHandle| {
    let controller = PlaybackController::new(
      MpvEngine::new(player_config.mpv_path()),
      YtDlpResolver::new(player_config.ytdl_path(), player_config.resolve_timeout()),
      source,
      controller_options(&player_config, handle),
      player_reporter,
    );
    runtime_handle.spawn(async move {
      let state = controller.run(control_rx).await;
      log::info!("Playback controller finished in state {:?}", state);
      let _ = proxy.send_event(ShellEvent::Exit);
    });
  });

  let mut shell = Shell::new(config.window_title.clone(), control_tx, reporter, on_ready);
  let result = event_loop.run_app(&mut shell);

  runtime.shutdown_timeout(RUNTIME_SHUTDOWN_GRACE);
  log::info!("Lively player exiting");
  result.map_err(AppError::from)
}

fn controller_options(config: &AppConfig, handle: NativeHandle) -> ControllerOptions {
  ControllerOptions {
    engine: EngineOptions {
      window: Some(handle),
      hardware_decoding: config.hardware_decoding,
      fill_window: config.fill_window,
      allow_screensaver: config.allow_screensaver,
      extra_args: config.mpv_args.clone(),
    },
    pause_mode: config.pause_mode,
    resolve_streams: config.resolve_streams,
    shutdown_timeout: config.shutdown_timeout(),
  }
}

fn load_config(explicit: Option<&PathBuf>) -> Result<AppConfig, ConfigError> {
  let path = match explicit {
    Some(path) => path.clone(),
    None => match AppConfig::default_path() {
      Some(path) => path,
      None => {
        log::warn!("No config directory on this system, using defaults");
        return Ok(AppConfig::default());
      }
    },
  };
  log::info!("Config path: {}", path.display());
  AppConfig::load(&path)
}

/// Defaults when the config file is unreadable or invalid, along with the
/// error to report once the parent can hear it.
fn load_config_or_default(explicit: Option<&PathBuf>) -> (AppConfig, Option<ConfigError>) {
  match load_config(explicit) {
    Ok(config) => (config, None),
    Err(e) => (AppConfig::default(), Some(e)),
  }
}

/// Logs go to stderr; stdout is reserved for the parent.
fn init_logging(verbosity: u8) {
  let default_level = match verbosity {
    0 => "warn",
    1 => "info",
    2 => "debug",
    _ => "trace",
  };

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
    .target(env_logger::Target::Stderr)
    .format_timestamp_millis()
    .init();
}
