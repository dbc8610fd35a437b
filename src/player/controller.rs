//! Playback lifecycle: one task owns the engine and reacts to parent commands
//! and engine events delivered over channels.

use std::time::Duration;

use async_channel::Receiver;

use super::engine::{EngineEvent, EngineOptions, MediaEngine};
use super::resolver::StreamResolver;
use super::source::MediaSource;
use super::PlayerError;
use crate::config::PauseMode;
use crate::report::{Reporter, Stage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerState {
  /// Engine not (yet) running; commands are ignored.
  Uninitialized,
  /// Playback commands are honored.
  Ready,
  /// Initialization failed or the engine died; commands are ignored.
  Failed,
  /// Torn down. Terminal.
  Closed,
}

/// Requests sent to the controller task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMessage {
  Play,
  Pause,
  Stop,
  Shutdown,
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
  pub engine: EngineOptions,
  pub pause_mode: PauseMode,
  pub resolve_streams: bool,
  /// Upper bound on engine teardown.
  pub shutdown_timeout: Duration,
}

impl Default for ControllerOptions {
  fn default() -> Self {
    Self {
      engine: EngineOptions::default(),
      pause_mode: PauseMode::Stop,
      resolve_streams: true,
      shutdown_timeout: Duration::from_secs(5),
    }
  }
}

enum InitOutcome {
  Finished(Result<(), PlayerError>),
  ShutdownRequested,
}

pub struct PlaybackController<E, R> {
  engine: E,
  resolver: R,
  source: MediaSource,
  options: ControllerOptions,
  reporter: Reporter,
  state: PlayerState,
  /// Normalized position captured by the last pause.
  position: f32,
  /// Location actually handed to the engine (the resolved sub-item for streams).
  current: Option<String>,
  suspended: bool,
  /// The engine has confirmed at least one load.
  confirmed: bool,
  /// The parent paused or stopped playback; end-of-media must not restart it.
  held: bool,
}

impl<E: MediaEngine, R: StreamResolver> PlaybackController<E, R> {
  pub fn new(
    engine: E,
    resolver: R,
    source: MediaSource,
    options: ControllerOptions,
    reporter: Reporter,
  ) -> Self {
    Self {
      engine,
      resolver,
      source,
      options,
      reporter,
      state: PlayerState::Uninitialized,
      position: 0.0,
      current: None,
      suspended: false,
      confirmed: false,
      held: false,
    }
  }

  pub fn state(&self) -> PlayerState {
    self.state
  }

  pub fn position(&self) -> f32 {
    self.position
  }

  /// Open the engine, resolve the source and start playing it.
  ///
  /// The state is `Ready` once the load is queued. If the engine later
  /// reports that this first load failed, the player becomes `Failed`.
  pub async fn initialize(&mut self) -> Result<(), PlayerError> {
    if self.state != PlayerState::Uninitialized {
      return Ok(());
    }
    log::info!("Initializing playback of {}", self.source);

    self
      .engine
      .open(&self.options.engine)
      .await
      .map_err(PlayerError::engine)?;

    let location =
      resolve_location(&self.resolver, &self.source, self.options.resolve_streams).await?;
    self
      .engine
      .play(&location, None)
      .await
      .map_err(PlayerError::engine)?;

    self.current = Some(location);
    self.state = PlayerState::Ready;
    log::info!("Playback started");
    Ok(())
  }

  /// Dispatch one control message. `Shutdown` is handled by [`run`](Self::run).
  pub async fn handle(&mut self, msg: ControlMessage) -> Result<(), PlayerError> {
    match msg {
      ControlMessage::Play => self.play().await,
      ControlMessage::Pause => self.pause().await,
      ControlMessage::Stop => self.stop().await,
      ControlMessage::Shutdown => Ok(()),
    }
  }

  /// React to a notification from the engine.
  pub async fn on_engine_event(&mut self, event: EngineEvent) -> Result<(), PlayerError> {
    match event {
      EngineEvent::Loaded => {
        self.confirmed = true;
        Ok(())
      }
      EngineEvent::LoadFailed(reason) => {
        self.on_load_failed(&reason);
        Ok(())
      }
      EngineEvent::EndReached => self.on_end_reached().await,
    }
  }

  /// Resume if ready and not already playing, from the cached position.
  pub async fn play(&mut self) -> Result<(), PlayerError> {
    if self.state != PlayerState::Ready {
      log::debug!("Ignoring play: player is {:?}", self.state);
      return Ok(());
    }
    self.held = false;
    if self.engine.is_playing().await.map_err(PlayerError::engine)? {
      return Ok(());
    }

    if self.suspended {
      self.engine.resume().await.map_err(PlayerError::engine)?;
      self.suspended = false;
      return Ok(());
    }

    let Some(location) = self.current.clone() else {
      return Ok(());
    };
    log::debug!("Resuming at {:.3}", self.position);
    self
      .engine
      .play(&location, Some(self.position))
      .await
      .map_err(PlayerError::engine)
  }

  /// Capture the position and stop (or suspend) if ready and playing.
  pub async fn pause(&mut self) -> Result<(), PlayerError> {
    if self.state != PlayerState::Ready {
      log::debug!("Ignoring pause: player is {:?}", self.state);
      return Ok(());
    }
    self.held = true;
    if !self.engine.is_playing().await.map_err(PlayerError::engine)? {
      return Ok(());
    }

    self.position = self.engine.position().await.map_err(PlayerError::engine)?;
    match self.options.pause_mode {
      PauseMode::Stop => self.engine.stop().await.map_err(PlayerError::engine),
      PauseMode::Suspend => {
        self.engine.suspend().await.map_err(PlayerError::engine)?;
        self.suspended = true;
        Ok(())
      }
    }
  }

  /// Stop if ready, whatever the playback state.
  pub async fn stop(&mut self) -> Result<(), PlayerError> {
    if self.state != PlayerState::Ready {
      return Ok(());
    }
    self.suspended = false;
    self.held = true;
    self.engine.stop().await.map_err(PlayerError::engine)
  }

  /// Loop: replay the file, or re-resolve the stream and play its first item.
  /// Held playback stays stopped; the next play starts from the beginning.
  pub async fn on_end_reached(&mut self) -> Result<(), PlayerError> {
    if self.state != PlayerState::Ready {
      return Ok(());
    }
    if self.held {
      log::debug!("End of media while held by the parent, not restarting");
      self.position = 0.0;
      return Ok(());
    }

    let location = if self.source.is_stream() {
      let location =
        resolve_location(&self.resolver, &self.source, self.options.resolve_streams).await?;
      self.current = Some(location.clone());
      location
    } else {
      match self.current.clone() {
        Some(location) => location,
        None => return Ok(()),
      }
    };

    log::debug!("End of media, restarting {}", location);
    self
      .engine
      .play(&location, None)
      .await
      .map_err(PlayerError::engine)
  }

  fn on_load_failed(&mut self, reason: &str) {
    if self.state != PlayerState::Ready {
      return;
    }
    let location = self.current.as_deref().unwrap_or_default();
    if self.confirmed {
      self
        .reporter
        .error(Stage::Playback, format!("failed to play {}: {}", location, reason));
    } else {
      self.state = PlayerState::Failed;
      self
        .reporter
        .error(Stage::Initialize, format!("failed to load {}: {}", location, reason));
    }
  }

  fn on_engine_lost(&mut self) {
    if self.state == PlayerState::Ready {
      self.state = PlayerState::Failed;
      self
        .reporter
        .error(Stage::Playback, "media engine exited unexpectedly");
    }
  }

  /// Release the engine. Tolerates partial initialization and repeat calls.
  pub async fn teardown(&mut self) {
    if self.state == PlayerState::Closed {
      return;
    }
    self.state = PlayerState::Closed;
    self.suspended = false;

    let timeout = self.options.shutdown_timeout;
    if tokio::time::timeout(timeout, self.engine.close()).await.is_err() {
      self.reporter.error(
        Stage::Teardown,
        format!("media engine did not close within {:?}", timeout),
      );
    }
    log::info!("Playback torn down");
  }

  /// Drive the controller until `Shutdown` arrives or every sender is gone.
  /// Returns the final state, which is always `Closed`.
  pub async fn run(mut self, control: Receiver<ControlMessage>) -> PlayerState {
    // The parent may have given up before the window even existed
    while let Ok(msg) = control.try_recv() {
      if msg == ControlMessage::Shutdown {
        log::info!("Shutdown requested before initialization");
        self.teardown().await;
        return self.state;
      }
    }

    let outcome = {
      let init = self.initialize();
      tokio::pin!(init);
      loop {
        tokio::select! {
          biased;
          result = &mut init => break InitOutcome::Finished(result),
          msg = control.recv() => match msg {
            Ok(ControlMessage::Shutdown) | Err(_) => break InitOutcome::ShutdownRequested,
            Ok(msg) => log::debug!("Ignoring {:?}: player is still initializing", msg),
          },
        }
      }
    };

    match outcome {
      InitOutcome::ShutdownRequested => {
        log::info!("Shutdown requested during initialization");
        self.teardown().await;
        return self.state;
      }
      InitOutcome::Finished(Err(e)) => {
        self.state = PlayerState::Failed;
        self.reporter.error(Stage::Initialize, e.to_string());
      }
      InitOutcome::Finished(Ok(())) => {}
    }

    let mut events = self.engine.events();
    loop {
      let event_rx = events.clone();
      tokio::select! {
        msg = control.recv() => match msg {
          Ok(ControlMessage::Shutdown) | Err(_) => break,
          Ok(msg) => {
            if let Err(e) = self.handle(msg).await {
              self.reporter.error(Stage::Playback, e.to_string());
            }
          }
        },
        event = next_event(event_rx) => match event {
          Some(event) => {
            if let Err(e) = self.on_engine_event(event).await {
              self.reporter.error(Stage::Playback, e.to_string());
            }
          }
          None => {
            events = None;
            self.on_engine_lost();
          }
        },
      }
    }

    self.teardown().await;
    self.state
  }
}

async fn resolve_location<R: StreamResolver>(
  resolver: &R,
  source: &MediaSource,
  resolve_streams: bool,
) -> Result<String, PlayerError> {
  match source {
    MediaSource::Stream(url) if resolve_streams => Ok(resolver.resolve_first(url).await?),
    source => Ok(source.location()),
  }
}

/// Next engine event; `None` once the stream closed. Pending forever when
/// there is no subscription.
async fn next_event(events: Option<Receiver<EngineEvent>>) -> Option<EngineEvent> {
  match events {
    Some(rx) => rx.recv().await.ok(),
    None => std::future::pending().await,
  }
}

#[cfg(test)]
mod tests {
  use std::path::PathBuf;
  use std::sync::Arc;

  use async_channel::Sender;
  use parking_lot::Mutex;
  use thiserror::Error;

  use super::*;
  use crate::player::ResolveError;
  use crate::report::testing::SharedBuffer;

  const FILE: &str = "/home/me/Videos/waves.mp4";
  const PAGE: &str = "https://www.youtube.com/watch?v=abc";

  #[derive(Debug, Clone, PartialEq)]
  enum Call {
    Open,
    Play(String, Option<f32>),
    Stop,
    Suspend,
    Resume,
    Close,
  }

  #[derive(Default)]
  struct FakeState {
    calls: Vec<Call>,
    loaded: bool,
    paused: bool,
    position: f32,
    fail_open: bool,
  }

  #[derive(Debug, Error)]
  #[error("fake engine failure")]
  struct FakeError;

  struct FakeEngine {
    state: Arc<Mutex<FakeState>>,
    events: Receiver<EngineEvent>,
  }

  impl MediaEngine for FakeEngine {
    type Error = FakeError;

    async fn open(&mut self, _options: &EngineOptions) -> Result<(), FakeError> {
      let mut s = self.state.lock();
      s.calls.push(Call::Open);
      if s.fail_open {
        Err(FakeError)
      } else {
        Ok(())
      }
    }

    async fn play(&mut self, location: &str, start: Option<f32>) -> Result<(), FakeError> {
      let mut s = self.state.lock();
      s.calls.push(Call::Play(location.to_string(), start));
      s.loaded = true;
      s.paused = false;
      s.position = start.unwrap_or(0.0);
      Ok(())
    }

    async fn stop(&mut self) -> Result<(), FakeError> {
      let mut s = self.state.lock();
      s.calls.push(Call::Stop);
      s.loaded = false;
      Ok(())
    }

    async fn suspend(&mut self) -> Result<(), FakeError> {
      let mut s = self.state.lock();
      s.calls.push(Call::Suspend);
      s.paused = true;
      Ok(())
    }

    async fn resume(&mut self) -> Result<(), FakeError> {
      let mut s = self.state.lock();
      s.calls.push(Call::Resume);
      s.paused = false;
      Ok(())
    }

    async fn is_playing(&mut self) -> Result<bool, FakeError> {
      let s = self.state.lock();
      Ok(s.loaded && !s.paused)
    }

    async fn position(&mut self) -> Result<f32, FakeError> {
      Ok(self.state.lock().position)
    }

    fn events(&self) -> Option<Receiver<EngineEvent>> {
      Some(self.events.clone())
    }

    async fn close(&mut self) {
      let mut s = self.state.lock();
      s.calls.push(Call::Close);
      s.loaded = false;
    }
  }

  /// Answers `https://cdn.example.com/item-N` on the N-th call.
  #[derive(Default)]
  struct FakeResolver {
    calls: Arc<Mutex<Vec<String>>>,
    hang: bool,
    fail: bool,
  }

  impl StreamResolver for FakeResolver {
    async fn resolve_first(&self, location: &str) -> Result<String, ResolveError> {
      let n = {
        let mut calls = self.calls.lock();
        calls.push(location.to_string());
        calls.len()
      };
      if self.hang {
        std::future::pending::<()>().await;
      }
      if self.fail {
        return Err(ResolveError::Empty(location.to_string()));
      }
      Ok(format!("https://cdn.example.com/item-{}", n))
    }
  }

  struct Harness {
    state: Arc<Mutex<FakeState>>,
    resolves: Arc<Mutex<Vec<String>>>,
    events: Sender<EngineEvent>,
    stdout: SharedBuffer,
  }

  impl Harness {
    fn calls(&self) -> Vec<Call> {
      self.state.lock().calls.clone()
    }

    fn plays(&self) -> usize {
      self
        .calls()
        .iter()
        .filter(|c| matches!(c, Call::Play(..)))
        .count()
    }
  }

  fn controller_with(
    source: &str,
    resolver: FakeResolver,
    options: ControllerOptions,
  ) -> (PlaybackController<FakeEngine, FakeResolver>, Harness) {
    let state = Arc::new(Mutex::new(FakeState::default()));
    let (events_tx, events_rx) = async_channel::unbounded();
    let stdout = SharedBuffer::default();
    let harness = Harness {
      state: state.clone(),
      resolves: resolver.calls.clone(),
      events: events_tx,
      stdout: stdout.clone(),
    };
    let engine = FakeEngine {
      state,
      events: events_rx,
    };
    let controller = PlaybackController::new(
      engine,
      resolver,
      MediaSource::parse(source),
      options,
      stdout.reporter(true),
    );
    (controller, harness)
  }

  fn controller(source: &str) -> (PlaybackController<FakeEngine, FakeResolver>, Harness) {
    controller_with(source, FakeResolver::default(), ControllerOptions::default())
  }

  async fn wait_until(mut cond: impl FnMut() -> bool) {
    for _ in 0..200 {
      if cond() {
        return;
      }
      tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached in time");
  }

  #[tokio::test]
  async fn test_local_file_becomes_ready_and_plays() {
    let (mut controller, harness) = controller(FILE);
    assert_eq!(controller.state(), PlayerState::Uninitialized);

    controller.initialize().await.unwrap();

    assert_eq!(controller.state(), PlayerState::Ready);
    assert_eq!(
      harness.calls(),
      vec![Call::Open, Call::Play(PathBuf::from(FILE).to_string_lossy().into_owned(), None)]
    );
    assert!(harness.resolves.lock().is_empty());
  }

  #[tokio::test]
  async fn test_stream_plays_first_resolved_item() {
    let (mut controller, harness) = controller(PAGE);
    controller.initialize().await.unwrap();

    assert_eq!(*harness.resolves.lock(), vec![PAGE.to_string()]);
    assert_eq!(
      harness.calls(),
      vec![
        Call::Open,
        Call::Play("https://cdn.example.com/item-1".to_string(), None)
      ]
    );
    assert!(!harness.calls().contains(&Call::Play(PAGE.to_string(), None)));
  }

  #[tokio::test]
  async fn test_stream_passed_through_when_resolution_disabled() {
    let options = ControllerOptions {
      resolve_streams: false,
      ..Default::default()
    };
    let (mut controller, harness) = controller_with(PAGE, FakeResolver::default(), options);
    controller.initialize().await.unwrap();

    assert!(harness.resolves.lock().is_empty());
    assert_eq!(harness.calls()[1], Call::Play(PAGE.to_string(), None));
  }

  #[tokio::test]
  async fn test_pause_then_play_restores_position() {
    let (mut controller, harness) = controller(FILE);
    controller.initialize().await.unwrap();
    harness.state.lock().position = 0.42;

    controller.handle(ControlMessage::Pause).await.unwrap();
    assert_eq!(harness.calls().last(), Some(&Call::Stop));
    assert!((controller.position() - 0.42).abs() < f32::EPSILON);

    controller.handle(ControlMessage::Play).await.unwrap();
    match harness.calls().last() {
      Some(Call::Play(_, Some(start))) => assert!((start - 0.42).abs() < 1e-6),
      other => panic!("expected resume with position, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_pause_when_stopped_is_noop() {
    let (mut controller, harness) = controller(FILE);
    controller.initialize().await.unwrap();
    controller.handle(ControlMessage::Stop).await.unwrap();
    let before = harness.calls();

    controller.handle(ControlMessage::Pause).await.unwrap();

    assert_eq!(harness.calls(), before);
    assert_eq!(controller.position(), 0.0);
    assert_eq!(controller.state(), PlayerState::Ready);
  }

  #[tokio::test]
  async fn test_play_while_playing_is_noop() {
    let (mut controller, harness) = controller(FILE);
    controller.initialize().await.unwrap();
    let before = harness.calls();

    controller.handle(ControlMessage::Play).await.unwrap();
    assert_eq!(harness.calls(), before);
  }

  #[tokio::test]
  async fn test_commands_before_ready_are_ignored() {
    let (mut controller, harness) = controller(FILE);
    for msg in [ControlMessage::Play, ControlMessage::Pause, ControlMessage::Stop] {
      controller.handle(msg).await.unwrap();
    }
    assert!(harness.calls().is_empty());
  }

  #[tokio::test]
  async fn test_suspend_mode_pauses_in_place() {
    let options = ControllerOptions {
      pause_mode: PauseMode::Suspend,
      ..Default::default()
    };
    let (mut controller, harness) = controller_with(FILE, FakeResolver::default(), options);
    controller.initialize().await.unwrap();

    controller.handle(ControlMessage::Pause).await.unwrap();
    assert_eq!(harness.calls().last(), Some(&Call::Suspend));

    controller.handle(ControlMessage::Play).await.unwrap();
    assert_eq!(harness.calls().last(), Some(&Call::Resume));
    assert_eq!(harness.plays(), 1);
  }

  #[tokio::test]
  async fn test_end_of_local_file_loops_forever() {
    let (mut controller, harness) = controller(FILE);
    controller.initialize().await.unwrap();

    for _ in 0..3 {
      controller.on_end_reached().await.unwrap();
    }

    let file = PathBuf::from(FILE).to_string_lossy().into_owned();
    let calls = harness.calls();
    assert_eq!(harness.plays(), 4);
    assert!(calls
      .iter()
      .filter(|c| matches!(c, Call::Play(..)))
      .all(|c| *c == Call::Play(file.clone(), None)));
  }

  #[tokio::test]
  async fn test_end_of_stream_re_resolves() {
    let (mut controller, harness) = controller(PAGE);
    controller.initialize().await.unwrap();
    controller.on_end_reached().await.unwrap();

    assert_eq!(harness.resolves.lock().len(), 2);
    assert_eq!(
      harness.calls().last(),
      Some(&Call::Play("https://cdn.example.com/item-2".to_string(), None))
    );
  }

  #[tokio::test]
  async fn test_failed_initialization_reports_and_stays_inert() {
    let (controller, harness) = controller(FILE);
    harness.state.lock().fail_open = true;
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let out = harness.stdout.clone();
    wait_until(|| !out.contents().is_empty()).await;
    tx.send(ControlMessage::Play).await.unwrap();
    tx.send(ControlMessage::Pause).await.unwrap();
    tx.send(ControlMessage::Shutdown).await.unwrap();

    assert_eq!(task.await.unwrap(), PlayerState::Closed);
    assert_eq!(harness.calls(), vec![Call::Open, Call::Close]);
    let stdout = harness.stdout.contents();
    assert!(stdout.starts_with("lively:error "));
    assert!(stdout.contains("\"stage\":\"initialize\""));
  }

  #[tokio::test]
  async fn test_failed_resolution_reports() {
    let resolver = FakeResolver {
      fail: true,
      ..Default::default()
    };
    let (mut controller, _harness) =
      controller_with(PAGE, resolver, ControllerOptions::default());
    let result = controller.initialize().await;
    assert!(matches!(result, Err(PlayerError::Resolve(_))));
    assert_eq!(controller.state(), PlayerState::Uninitialized);
  }

  #[tokio::test]
  async fn test_shutdown_during_initialization() {
    let resolver = FakeResolver {
      hang: true,
      ..Default::default()
    };
    let (controller, harness) = controller_with(PAGE, resolver, ControllerOptions::default());
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let resolves = harness.resolves.clone();
    wait_until(|| !resolves.lock().is_empty()).await;
    tx.send(ControlMessage::Shutdown).await.unwrap();

    let final_state = tokio::time::timeout(Duration::from_secs(5), task)
      .await
      .expect("shutdown in bounded time")
      .unwrap();
    assert_eq!(final_state, PlayerState::Closed);
    assert_eq!(harness.calls(), vec![Call::Open, Call::Close]);
    assert!(harness.stdout.contents().is_empty());
  }

  #[tokio::test]
  async fn test_shutdown_queued_before_start_skips_engine() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded();
    tx.send(ControlMessage::Play).await.unwrap();
    tx.send(ControlMessage::Shutdown).await.unwrap();

    assert_eq!(controller.run(rx).await, PlayerState::Closed);
    assert_eq!(harness.calls(), vec![Call::Close]);
  }

  #[tokio::test]
  async fn test_closed_channel_shuts_down() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded::<ControlMessage>();
    drop(tx);

    let final_state = tokio::time::timeout(Duration::from_secs(5), controller.run(rx))
      .await
      .unwrap();
    assert_eq!(final_state, PlayerState::Closed);
    assert_eq!(harness.calls().last(), Some(&Call::Close));
  }

  #[tokio::test]
  async fn test_run_loops_on_end_reached_events() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let state = harness.state.clone();
    wait_until(|| state.lock().loaded).await;
    harness.events.send(EngineEvent::EndReached).await.unwrap();
    harness.events.send(EngineEvent::EndReached).await.unwrap();
    wait_until(|| harness.plays() == 3).await;

    tx.send(ControlMessage::Shutdown).await.unwrap();
    assert_eq!(task.await.unwrap(), PlayerState::Closed);
  }

  #[tokio::test]
  async fn test_run_dispatches_pause_and_play() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let state = harness.state.clone();
    wait_until(|| state.lock().loaded).await;
    state.lock().position = 0.5;
    tx.send(ControlMessage::Pause).await.unwrap();
    tx.send(ControlMessage::Play).await.unwrap();
    tx.send(ControlMessage::Shutdown).await.unwrap();
    assert_eq!(task.await.unwrap(), PlayerState::Closed);

    let calls = harness.calls();
    let file = PathBuf::from(FILE).to_string_lossy().into_owned();
    assert_eq!(
      calls,
      vec![
        Call::Open,
        Call::Play(file.clone(), None),
        Call::Stop,
        Call::Play(file, Some(0.5)),
        Call::Close,
      ]
    );
  }

  #[tokio::test]
  async fn test_engine_loss_marks_failed_and_reports() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let state = harness.state.clone();
    wait_until(|| state.lock().loaded).await;
    let Harness {
      events, stdout, ..
    } = harness;
    drop(events);

    let out = stdout.clone();
    wait_until(|| out.contents().contains("exited unexpectedly")).await;
    tx.send(ControlMessage::Shutdown).await.unwrap();
    assert_eq!(task.await.unwrap(), PlayerState::Closed);
    assert!(stdout.contents().contains("\"stage\":\"playback\""));
  }

  #[tokio::test]
  async fn test_rejected_first_load_fails_initialization() {
    let (controller, harness) = controller(FILE);
    let (tx, rx) = async_channel::unbounded();
    let task = tokio::spawn(controller.run(rx));

    let state = harness.state.clone();
    wait_until(|| state.lock().loaded).await;
    // The engine accepted the load, then gave up on the file and went idle
    harness.state.lock().loaded = false;
    harness
      .events
      .send(EngineEvent::LoadFailed("No such file or directory".to_string()))
      .await
      .unwrap();

    let out = harness.stdout.clone();
    wait_until(|| !out.contents().is_empty()).await;
    tx.send(ControlMessage::Play).await.unwrap();
    tx.send(ControlMessage::Pause).await.unwrap();
    tx.send(ControlMessage::Shutdown).await.unwrap();
    assert_eq!(task.await.unwrap(), PlayerState::Closed);

    let file = PathBuf::from(FILE).to_string_lossy().into_owned();
    assert_eq!(
      harness.calls(),
      vec![Call::Open, Call::Play(file, None), Call::Close]
    );
    let stdout = harness.stdout.contents();
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("lively:error "));
    assert!(stdout.contains("\"stage\":\"initialize\""));
    assert!(stdout.contains("No such file or directory"));
  }

  #[tokio::test]
  async fn test_failed_replay_reports_playback_and_stays_ready() {
    let (mut controller, harness) = controller(PAGE);
    controller.initialize().await.unwrap();
    controller.on_engine_event(EngineEvent::Loaded).await.unwrap();
    controller.on_engine_event(EngineEvent::EndReached).await.unwrap();
    controller
      .on_engine_event(EngineEvent::LoadFailed("HTTP error 403 Forbidden".to_string()))
      .await
      .unwrap();

    assert_eq!(controller.state(), PlayerState::Ready);
    assert_eq!(harness.plays(), 2);
    let stdout = harness.stdout.contents();
    assert!(stdout.contains("\"stage\":\"playback\""));
    assert!(stdout.contains("https://cdn.example.com/item-2"));
    assert!(stdout.contains("403 Forbidden"));
  }

  #[tokio::test]
  async fn test_end_of_media_after_pause_stays_paused() {
    let (mut controller, harness) = controller(FILE);
    controller.initialize().await.unwrap();
    harness.state.lock().position = 0.9;
    controller.handle(ControlMessage::Pause).await.unwrap();
    controller.handle(ControlMessage::Play).await.unwrap();
    let plays = harness.plays();

    // The file ends; the engine is idle by the time the parent's pause lands
    harness.state.lock().loaded = false;
    controller.handle(ControlMessage::Pause).await.unwrap();
    controller.on_end_reached().await.unwrap();
    assert_eq!(harness.plays(), plays);

    let file = PathBuf::from(FILE).to_string_lossy().into_owned();
    controller.handle(ControlMessage::Play).await.unwrap();
    assert_eq!(harness.calls().last(), Some(&Call::Play(file, Some(0.0))));

    // Playing again lifts the hold
    controller.on_end_reached().await.unwrap();
    assert_eq!(harness.plays(), plays + 2);
  }

  #[tokio::test]
  async fn test_teardown_twice_is_harmless() {
    let (mut controller, harness) = controller(FILE);
    controller.teardown().await;
    controller.teardown().await;
    assert_eq!(controller.state(), PlayerState::Closed);
    assert_eq!(harness.calls(), vec![Call::Close]);

    // Nothing revives a closed player
    controller.initialize().await.unwrap();
    controller.handle(ControlMessage::Play).await.unwrap();
    assert_eq!(harness.calls(), vec![Call::Close]);
  }
}
