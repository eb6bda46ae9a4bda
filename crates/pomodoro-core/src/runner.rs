//! Async driver for the timer engine.
//!
//! One tokio task owns the engine and serializes everything that touches
//! it: the 1-second clock, presence changes, user commands and config
//! updates. Events fan out on a broadcast channel (the signal bus) and the
//! latest snapshot is kept in a watch channel for renderers.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::TimerError;
use crate::events::Event;
use crate::timer::{DisplaySnapshot, Output, TimerConfig, TimerEngine};

pub const TICK: Duration = Duration::from_secs(1);

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start,
    Stop,
    Reset,
    SkipOrRestart,
    /// Presence change from the desktop session.
    SetIdle(bool),
    UpdateConfig(TimerConfig),
    SetCountdown(bool),
    Shutdown,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RunnerError {
    #[error(transparent)]
    Timer(#[from] TimerError),

    #[error("invalid timer config: {0}")]
    InvalidConfig(String),

    #[error("timer task has shut down")]
    Closed,
}

struct Envelope {
    command: Command,
    reply: oneshot::Sender<Result<(), RunnerError>>,
}

/// Cloneable handle for talking to a running [`TimerRunner`].
#[derive(Clone)]
pub struct TimerHandle {
    commands: mpsc::Sender<Envelope>,
    events: broadcast::Sender<Event>,
    snapshots: watch::Receiver<DisplaySnapshot>,
}

impl TimerHandle {
    /// Send a command and wait until the engine has applied it.
    ///
    /// # Errors
    /// The engine's rejection (e.g. `AlreadyRunning`), or `Closed` if the
    /// runner is gone.
    pub async fn send(&self, command: Command) -> Result<(), RunnerError> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Envelope { command, reply })
            .await
            .map_err(|_| RunnerError::Closed)?;
        response.await.map_err(|_| RunnerError::Closed)?
    }

    /// Subscribe to events emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<DisplaySnapshot> {
        self.snapshots.clone()
    }
}

pub struct TimerRunner {
    engine: TimerEngine,
    commands: mpsc::Receiver<Envelope>,
    events: broadcast::Sender<Event>,
    snapshots: watch::Sender<DisplaySnapshot>,
}

impl TimerRunner {
    pub fn new(engine: TimerEngine) -> (Self, TimerHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let handle = TimerHandle {
            commands: command_tx,
            events: event_tx.clone(),
            snapshots: snapshot_rx,
        };
        let runner = Self {
            engine,
            commands: command_rx,
            events: event_tx,
            snapshots: snapshot_tx,
        };
        (runner, handle)
    }

    /// Drive the engine until `Shutdown` or until every handle is dropped.
    /// Returns the engine so the caller can persist it.
    pub async fn run(mut self) -> TimerEngine {
        let mut clock = tokio::time::interval(TICK);
        clock.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("timer runner started");

        loop {
            tokio::select! {
                msg = self.commands.recv() => {
                    let Some(Envelope { command, reply }) = msg else {
                        debug!("all timer handles dropped");
                        break;
                    };
                    if command == Command::Shutdown {
                        let _ = reply.send(Ok(()));
                        break;
                    }
                    let restarts_phase = matches!(
                        command,
                        Command::Start | Command::Reset | Command::SkipOrRestart
                    );
                    let result = self.apply(command);
                    if restarts_phase && result.is_ok() && self.engine.is_running() {
                        clock.reset();
                    }
                    let _ = reply.send(result);
                }
                _ = clock.tick(), if self.engine.is_running() => {
                    let out = self.engine.tick();
                    self.publish(out);
                }
            }
        }

        info!("timer runner stopped");
        self.engine
    }

    fn apply(&mut self, command: Command) -> Result<(), RunnerError> {
        debug!(?command, "timer command");
        let out = match command {
            Command::Start => self.engine.start()?,
            Command::Stop => self.engine.stop()?,
            Command::Reset => self.engine.reset(),
            Command::SkipOrRestart => self.engine.skip_or_restart()?,
            Command::SetIdle(idle) => self.engine.set_idle(idle),
            Command::UpdateConfig(config) => {
                self.engine.update_config(config).map_err(|e| {
                    warn!("rejected timer config: {e}");
                    RunnerError::InvalidConfig(e.to_string())
                })?;
                Output {
                    events: Vec::new(),
                    snapshot: self.engine.snapshot(),
                }
            }
            Command::SetCountdown(countdown) => {
                self.engine.set_countdown(countdown);
                Output {
                    events: Vec::new(),
                    snapshot: self.engine.snapshot(),
                }
            }
            Command::Shutdown => return Ok(()),
        };
        self.publish(out);
        Ok(())
    }

    fn publish(&self, out: Output) {
        for event in out.events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
        self.snapshots.send_replace(out.snapshot);
    }
}

/// Spawn a runner on the current tokio runtime.
pub fn spawn(engine: TimerEngine) -> (TimerHandle, tokio::task::JoinHandle<TimerEngine>) {
    let (runner, handle) = TimerRunner::new(engine);
    (handle, tokio::spawn(runner.run()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Mode;

    fn config() -> TimerConfig {
        TimerConfig {
            work_duration: 3,
            short_break_duration: 2,
            long_break_duration: 4,
            long_break_interval: 4,
            idle_grace_seconds: 10,
        }
    }

    fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<&'static str> {
        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            names.push(event.name());
        }
        names
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_only_while_running() {
        let (handle, task) = spawn(TimerEngine::new(config()).unwrap());
        let mut events = handle.subscribe();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.snapshot().elapsed_secs, 0);

        handle.send(Command::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(
            drain(&mut events),
            ["work_started", "work_ended", "short_break_started"]
        );
        assert_eq!(handle.snapshot().mode, Mode::OnBreak);

        handle.send(Command::Stop).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(drain(&mut events), ["stopped"]);
        assert_eq!(handle.snapshot().mode, Mode::Stopped);

        handle.send(Command::Shutdown).await.unwrap();
        let engine = task.await.unwrap();
        assert_eq!(engine.sessions_completed(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn out_of_sequence_commands_are_reported() {
        let (handle, _task) = spawn(TimerEngine::new(config()).unwrap());
        assert_eq!(
            handle.send(Command::Stop).await,
            Err(RunnerError::Timer(TimerError::NotRunning))
        );
        handle.send(Command::Start).await.unwrap();
        assert_eq!(
            handle.send(Command::Start).await,
            Err(RunnerError::Timer(TimerError::AlreadyRunning))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn presence_changes_go_through_engine() {
        let (handle, _task) = spawn(TimerEngine::new(config()).unwrap());
        let mut events = handle.subscribe();
        handle.send(Command::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        handle.send(Command::SetIdle(true)).await.unwrap();
        assert_eq!(drain(&mut events), ["work_started", "idle_invalidated"]);
        assert_eq!(handle.snapshot().sessions_completed, 0);

        handle.send(Command::SetIdle(false)).await.unwrap();
        assert_eq!(drain(&mut events), ["break_ended", "work_started"]);
        assert_eq!(handle.snapshot().mode, Mode::Working);
    }

    #[tokio::test(start_paused = true)]
    async fn config_update_mid_break_applies_on_next_tick() {
        let mut long_rest = config();
        long_rest.short_break_duration = 10;
        let (handle, _task) = spawn(TimerEngine::new(long_rest).unwrap());
        let mut events = handle.subscribe();

        handle.send(Command::Start).await.unwrap();
        tokio::time::sleep(Duration::from_millis(4500)).await;
        assert_eq!(handle.snapshot().mode, Mode::OnBreak);
        assert_eq!(handle.snapshot().elapsed_secs, 1);
        drain(&mut events);

        let mut short_rest = long_rest;
        short_rest.short_break_duration = 2;
        handle.send(Command::UpdateConfig(short_rest)).await.unwrap();
        assert!(drain(&mut events).is_empty());
        assert_eq!(handle.snapshot().mode, Mode::OnBreak);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(drain(&mut events), ["break_ended", "work_started"]);
        assert_eq!(handle.snapshot().mode, Mode::Working);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_is_rejected() {
        let (handle, _task) = spawn(TimerEngine::new(config()).unwrap());
        let mut bad = config();
        bad.long_break_duration = 0;
        let err = handle.send(Command::UpdateConfig(bad)).await.unwrap_err();
        assert!(matches!(err, RunnerError::InvalidConfig(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handles_ends_runner() {
        let (handle, task) = spawn(TimerEngine::new(config()).unwrap());
        handle.send(Command::Start).await.unwrap();
        drop(handle);
        let engine = task.await.unwrap();
        assert!(engine.is_running());
    }
}
