//! Async IPC connection to MPV.
//!
//! Handles platform-specific socket/pipe connections.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_channel::{Receiver, Sender};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use super::protocol::{MpvCommand, MpvEvent, MpvMessage, MpvResponse};

/// How long a single command may wait for its response.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum IpcError {
  #[error("Connection failed: {0}")]
  ConnectionFailed(String),
  #[error("Write failed: {0}")]
  WriteFailed(#[from] std::io::Error),
  #[error("Command timeout")]
  Timeout,
  #[error("Disconnected")]
  Disconnected,
}

/// Pending request waiting for response.
type PendingRequest = oneshot::Sender<Result<MpvResponse, IpcError>>;

/// IPC connection state shared between writer and reader.
struct IpcState {
  pending: HashMap<i64, PendingRequest>,
}

/// Writer channel message.
enum WriteMessage {
  Command(Vec<u8>),
  Close,
}

/// MPV IPC connection.
pub struct MpvIpc {
  state: Arc<Mutex<IpcState>>,
  write_tx: Sender<WriteMessage>,
  event_rx: Receiver<MpvEvent>,
  cancel: CancellationToken,
}

impl MpvIpc {
  /// Connect to MPV IPC socket/pipe.
  pub async fn connect(path: &str, retry_count: u32) -> Result<Self, IpcError> {
    let mut last_error = None;

    for attempt in 0..retry_count {
      if attempt > 0 {
        tokio::time::sleep(Duration::from_millis(100 * (attempt as u64 + 1))).await;
      }

      match Self::try_connect(path).await {
        Ok(ipc) => return Ok(ipc),
        Err(e) => {
          log::debug!("IPC connect attempt {} failed: {}", attempt + 1, e);
          last_error = Some(e);
        }
      }
    }

    Err(last_error.unwrap_or_else(|| IpcError::ConnectionFailed("Unknown error".into())))
  }

  #[cfg(windows)]
  async fn try_connect(path: &str) -> Result<Self, IpcError> {
    use tokio::net::windows::named_pipe::ClientOptions;

    let client = ClientOptions::new()
      .open(path)
      .map_err(|e| IpcError::ConnectionFailed(format!("Failed to open pipe: {}", e)))?;

    let (reader, writer) = tokio::io::split(client);
    Ok(Self::setup(reader, writer))
  }

  #[cfg(not(windows))]
  async fn try_connect(path: &str) -> Result<Self, IpcError> {
    use tokio::net::UnixStream;

    let stream = UnixStream::connect(path)
      .await
      .map_err(|e| IpcError::ConnectionFailed(e.to_string()))?;

    let (reader, writer) = tokio::io::split(stream);
    Ok(Self::setup(reader, writer))
  }

  /// Wire reader and writer tasks around an already-open stream.
  pub(crate) fn setup<R, W>(reader: R, writer: W) -> Self
  where
    R: tokio::io::AsyncRead + Send + Unpin + 'static,
    W: tokio::io::AsyncWrite + Send + Unpin + 'static,
  {
    let state = Arc::new(Mutex::new(IpcState {
      pending: HashMap::new(),
    }));
    let cancel = CancellationToken::new();

    let (event_tx, event_rx) = async_channel::unbounded();
    let (write_tx, write_rx) = async_channel::unbounded::<WriteMessage>();

    let reader_state = state.clone();
    let reader_cancel = cancel.clone();
    tokio::spawn(async move {
      Self::reader_loop(reader, reader_state, event_tx, reader_cancel).await;
    });

    tokio::spawn(async move {
      Self::writer_loop(writer, write_rx).await;
    });

    Self {
      state,
      write_tx,
      event_rx,
      cancel,
    }
  }

  async fn reader_loop<R: tokio::io::AsyncRead + Unpin>(
    reader: R,
    state: Arc<Mutex<IpcState>>,
    event_tx: Sender<MpvEvent>,
    cancel: CancellationToken,
  ) {
    log::debug!("MPV IPC reader loop started");
    let mut buf_reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
      line.clear();
      let read = tokio::select! {
        _ = cancel.cancelled() => {
          log::debug!("MPV IPC reader cancelled");
          break;
        }
        read = buf_reader.read_line(&mut line) => read,
      };

      match read {
        Ok(0) => {
          log::info!("MPV IPC connection closed");
          break;
        }
        Ok(_) => {
          let trimmed = line.trim();
          if trimmed.is_empty() {
            continue;
          }

          match MpvMessage::parse(trimmed) {
            Ok(MpvMessage::Response(response)) => {
              log::trace!("MPV reader: response for request_id={}", response.request_id);
              let mut state = state.lock();
              if let Some(tx) = state.pending.remove(&response.request_id) {
                let _ = tx.send(Ok(response));
              }
            }
            Ok(MpvMessage::Event(event)) => {
              log::debug!("MPV reader: event {:?}", event);
              let _ = event_tx.send(event).await;
            }
            Err(e) => {
              log::warn!("Failed to parse MPV message: {} - {}", e, trimmed);
            }
          }
        }
        Err(e) => {
          log::error!("MPV IPC read error: {}", e);
          break;
        }
      }
    }

    // Fail everything still waiting so callers do not sit out the timeout
    let pending: Vec<PendingRequest> = state.lock().pending.drain().map(|(_, tx)| tx).collect();
    for tx in pending {
      let _ = tx.send(Err(IpcError::Disconnected));
    }
  }

  async fn writer_loop<W: tokio::io::AsyncWrite + Unpin>(
    mut writer: W,
    write_rx: Receiver<WriteMessage>,
  ) {
    log::debug!("MPV IPC writer loop started");

    while let Ok(msg) = write_rx.recv().await {
      match msg {
        WriteMessage::Command(mut data) => {
          data.push(b'\n');
          if let Err(e) = writer.write_all(&data).await {
            log::error!("MPV IPC write error: {}", e);
            break;
          }
          if let Err(e) = writer.flush().await {
            log::error!("MPV IPC flush error: {}", e);
            break;
          }
        }
        WriteMessage::Close => {
          log::debug!("MPV IPC writer closing");
          let _ = writer.shutdown().await;
          break;
        }
      }
    }
  }

  /// Send a command to MPV and wait for response.
  pub async fn send_command(&self, cmd: MpvCommand) -> Result<MpvResponse, IpcError> {
    let request_id = cmd.request_id;

    let (tx, rx) = oneshot::channel();
    self.state.lock().pending.insert(request_id, tx);

    let json = serde_json::to_string(&cmd).map_err(|e| IpcError::WriteFailed(e.into()))?;
    log::debug!("Sending MPV command: {}", json);

    if self
      .write_tx
      .send(WriteMessage::Command(json.into_bytes()))
      .await
      .is_err()
    {
      self.state.lock().pending.remove(&request_id);
      return Err(IpcError::Disconnected);
    }

    match tokio::time::timeout(COMMAND_TIMEOUT, rx).await {
      Ok(Ok(result)) => result,
      Ok(Err(_)) => {
        log::error!("MPV IPC channel closed unexpectedly");
        Err(IpcError::Disconnected)
      }
      Err(_) => {
        log::error!(
          "MPV command timeout after {:?}, request_id={}",
          COMMAND_TIMEOUT,
          request_id
        );
        self.state.lock().pending.remove(&request_id);
        Err(IpcError::Timeout)
      }
    }
  }

  /// Get the event receiver.
  pub fn events(&self) -> Receiver<MpvEvent> {
    self.event_rx.clone()
  }

  /// Close the connection. The event receiver closes once the reader stops.
  pub fn close(&self) {
    let _ = self.write_tx.try_send(WriteMessage::Close);
    self.cancel.cancel();
  }
}
