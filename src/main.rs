// Prevents additional console window on Windows in release
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

fn main() {
  if let Err(e) = player_lib::run() {
    eprintln!("lively-player: {}", e);
    std::process::exit(1);
  }
}
