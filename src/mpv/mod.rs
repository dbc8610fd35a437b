//! MPV IPC module - spawns and controls an embedded MPV player via JSON IPC.
//!
//! Architecture:
//! - `process.rs` - MPV binary detection and process spawning
//! - `ipc.rs` - Async IPC connection (Named Pipes on Windows, Unix Sockets on Linux/macOS)
//! - `protocol.rs` - JSON command/response types and serialization
//! - `client.rs` - High-level MPV client with command methods
//! - `engine.rs` - `MediaEngine` implementation on top of the client

mod client;
mod engine;
mod ipc;
mod process;
mod protocol;

pub use client::MpvError;
pub use engine::MpvEngine;
