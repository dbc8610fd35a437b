//! Line protocol spoken by the parent process on stdin.

use async_channel::Sender;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::player::ControlMessage;

#[derive(Error, Debug)]
pub enum ListenerError {
  #[error("Failed to read from parent: {0}")]
  Read(#[from] std::io::Error),
}

/// Commands understood on stdin, matched case-insensitively.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentCommand {
  /// `lively:vid-pause`
  Pause,
  /// `lively:vid-play`
  Play,
  /// `lively:terminate`
  Terminate,
}

impl ParentCommand {
  pub fn parse(line: &str) -> Option<Self> {
    let line = line.trim();
    if line.eq_ignore_ascii_case("lively:vid-pause") {
      Some(ParentCommand::Pause)
    } else if line.eq_ignore_ascii_case("lively:vid-play") {
      Some(ParentCommand::Play)
    } else if line.eq_ignore_ascii_case("lively:terminate") {
      Some(ParentCommand::Terminate)
    } else {
      None
    }
  }
}

/// Why the read loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerExit {
  /// The parent sent `lively:terminate`.
  Terminated,
  /// Stdin closed: the parent is gone.
  EndOfInput,
  /// The controller stopped accepting messages.
  ControllerGone,
}

/// Read commands until terminate, end of input or a read error, forwarding
/// playback commands to the controller. The caller shuts the application
/// down afterwards whatever the outcome.
pub async fn listen<R>(reader: R, control: &Sender<ControlMessage>) -> Result<ListenerExit, ListenerError>
where
  R: AsyncBufRead + Unpin,
{
  let mut lines = reader.lines();

  while let Some(line) = lines.next_line().await? {
    let msg = match ParentCommand::parse(&line) {
      Some(ParentCommand::Terminate) => {
        log::info!("Parent requested termination");
        return Ok(ListenerExit::Terminated);
      }
      Some(ParentCommand::Pause) => ControlMessage::Pause,
      Some(ParentCommand::Play) => ControlMessage::Play,
      None => {
        log::debug!("Ignoring unknown parent message: {:?}", line);
        continue;
      }
    };

    if control.send(msg).await.is_err() {
      log::warn!("Controller is gone, stop listening");
      return Ok(ListenerExit::ControllerGone);
    }
  }

  log::info!("Parent closed stdin");
  Ok(ListenerExit::EndOfInput)
}
