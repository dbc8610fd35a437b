use clap::Parser;
use std::path::PathBuf;

/// Video wallpaper window for Lively, controlled over stdin
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// Path or URL of the media to play
  #[arg(value_name = "SOURCE")]
  pub source: String,

  /// Configuration file (default: <config dir>/lively-player/config.json)
  #[arg(short = 'c', long = "config", value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
  #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
  pub verbosity: u8,
}
