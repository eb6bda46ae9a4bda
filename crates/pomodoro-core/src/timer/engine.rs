//! Timer engine implementation.
//!
//! The engine is a tick-driven state machine. It does not use internal
//! threads or read the clock - the caller invokes `tick()` once per second
//! while `is_running()` and forwards presence changes to `set_idle()`.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Working -> OnBreak(Short | Long) -> Working -> ...
//!               |  ^
//!    idle early |  | user back, break over
//!               v  |
//!          OnBreak (held)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default())?;
//! engine.start()?;
//! // Once per second:
//! let out = engine.tick();
//! for event in &out.events { /* notify */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::config::TimerConfig;
use super::display::{session_glyphs, DisplaySnapshot};
use crate::error::{ConfigError, TimerError};
use crate::events::Event;

/// Elapsed value that ends a break at the next transition check.
const SKIP_SENTINEL: u64 = u64::MAX / 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Stopped,
    Working,
    OnBreak,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakKind {
    #[default]
    None,
    Short,
    Long,
}

/// Result of an engine call: the ordered events it produced and the
/// snapshot to render afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub events: Vec<Event>,
    pub snapshot: DisplaySnapshot,
}

/// Core timer engine.
///
/// Single owner, serialized access. Serializable so a caller can persist it
/// between processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    mode: Mode,
    elapsed_seconds: u64,
    break_kind: BreakKind,
    short_breaks_since_long: u32,
    sessions_completed: u64,
    is_user_idle: bool,
    /// Set once the user has been told about an idle situation for the
    /// current break; swallows the next "break finished" notice.
    idle_notified: bool,
    /// Show remaining time instead of elapsed time.
    #[serde(default = "default_countdown")]
    countdown: bool,
}

fn default_countdown() -> bool {
    true
}

impl TimerEngine {
    /// Create a stopped engine with zeroed counters.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the config does not validate.
    pub fn new(config: TimerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            mode: Mode::Stopped,
            elapsed_seconds: 0,
            break_kind: BreakKind::None,
            short_breaks_since_long: 0,
            sessions_completed: 0,
            is_user_idle: false,
            idle_notified: false,
            countdown: true,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.mode != Mode::Stopped
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn break_kind(&self) -> BreakKind {
        self.break_kind
    }

    pub fn short_breaks_since_long(&self) -> u32 {
        self.short_breaks_since_long
    }

    pub fn sessions_completed(&self) -> u64 {
        self.sessions_completed
    }

    pub fn is_user_idle(&self) -> bool {
        self.is_user_idle
    }

    pub fn idle_notified(&self) -> bool {
        self.idle_notified
    }

    pub fn countdown(&self) -> bool {
        self.countdown
    }

    /// Duration of the current phase; zero while stopped.
    pub fn current_duration(&self) -> u64 {
        match self.mode {
            Mode::Stopped => 0,
            Mode::Working => self.config.work_duration,
            Mode::OnBreak => self.break_duration(self.break_kind),
        }
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.current_duration().saturating_sub(self.elapsed_seconds)
    }

    /// Break the next completed work session leads to.
    pub fn upcoming_break_kind(&self) -> BreakKind {
        if self.short_breaks_since_long + 1 >= self.config.long_break_interval {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        let duration = self.current_duration();
        let remaining = self.remaining_seconds();
        let elapsed = self.elapsed_seconds.min(duration);
        let shown = if self.countdown { remaining } else { elapsed };
        DisplaySnapshot {
            mode: self.mode,
            break_kind: self.break_kind,
            minutes: shown / 60,
            seconds: shown % 60,
            remaining_secs: remaining,
            elapsed_secs: elapsed,
            sessions_completed: self.sessions_completed,
            glyphs: session_glyphs(
                self.sessions_completed,
                self.mode,
                self.config.long_break_interval,
            ),
            upcoming_break: self.upcoming_break_kind(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// # Errors
    /// `TimerError::AlreadyRunning` unless stopped.
    pub fn start(&mut self) -> Result<Output, TimerError> {
        if self.is_running() {
            return Err(TimerError::AlreadyRunning);
        }
        let mut events = Vec::new();
        self.begin_work(&mut events);
        info!(sessions = self.sessions_completed, "timer started");
        Ok(self.output(events))
    }

    /// Discard the current phase without counting it.
    ///
    /// # Errors
    /// `TimerError::NotRunning` when already stopped.
    pub fn stop(&mut self) -> Result<Output, TimerError> {
        if !self.is_running() {
            return Err(TimerError::NotRunning);
        }
        let mut events = Vec::new();
        self.halt(&mut events);
        info!(sessions = self.sessions_completed, "timer stopped");
        Ok(self.output(events))
    }

    /// Zero all counters. A running timer restarts with a fresh work session.
    pub fn reset(&mut self) -> Output {
        let was_running = self.is_running();
        self.sessions_completed = 0;
        self.short_breaks_since_long = 0;
        self.elapsed_seconds = 0;
        self.break_kind = BreakKind::None;
        self.idle_notified = false;

        let mut events = vec![Event::CountersReset { at: Utc::now() }];
        if was_running {
            self.halt(&mut events);
            self.begin_work(&mut events);
        }
        info!(was_running, "counters reset");
        self.output(events)
    }

    /// Abandon the current break, or restart the current work session.
    ///
    /// A skipped break still honours presence: if the user is idle it is
    /// held at its end like any other expired break.
    ///
    /// # Errors
    /// `TimerError::NotRunning` when stopped.
    pub fn skip_or_restart(&mut self) -> Result<Output, TimerError> {
        match self.mode {
            Mode::Stopped => Err(TimerError::NotRunning),
            Mode::OnBreak => {
                debug!(elapsed = self.elapsed_seconds, "skipping break");
                self.elapsed_seconds = SKIP_SENTINEL;
                let mut events = Vec::new();
                self.check_transition(&mut events);
                Ok(self.output(events))
            }
            Mode::Working => {
                debug!(elapsed = self.elapsed_seconds, "restarting work session");
                let mut events = Vec::new();
                self.halt(&mut events);
                self.begin_work(&mut events);
                Ok(self.output(events))
            }
        }
    }

    /// Advance one second. No-op while stopped.
    pub fn tick(&mut self) -> Output {
        let mut events = Vec::new();
        if self.is_running() {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
            self.check_transition(&mut events);
        }
        self.output(events)
    }

    /// Advance `seconds` ticks at once, collecting every event in order.
    pub fn advance(&mut self, seconds: u64) -> Output {
        let mut events = Vec::new();
        for _ in 0..seconds {
            if !self.is_running() {
                break;
            }
            events.extend(self.tick().events);
        }
        self.output(events)
    }

    /// Record a presence change.
    ///
    /// Going idle within the grace period of a work session turns the
    /// session into a break that is already over, so it is held until the
    /// user comes back and no session is counted.
    pub fn set_idle(&mut self, idle: bool) -> Output {
        let entering_idle = idle && !self.is_user_idle;
        self.is_user_idle = idle;
        let mut events = Vec::new();

        if entering_idle {
            self.idle_notified = false;
        }
        if !self.is_running() {
            return self.output(events);
        }

        if entering_idle
            && self.mode == Mode::Working
            && self.elapsed_seconds.saturating_add(1) < self.config.idle_grace_seconds
        {
            let kind = self.upcoming_break_kind();
            debug!(elapsed = self.elapsed_seconds, ?kind, "idle within grace, invalidating session");
            self.mode = Mode::OnBreak;
            self.break_kind = kind;
            self.elapsed_seconds = self
                .break_duration(kind)
                .saturating_add(self.elapsed_seconds);
            self.idle_notified = true;
            events.push(Event::IdleInvalidated { at: Utc::now() });
        }

        self.check_transition(&mut events);
        self.output(events)
    }

    /// Swap in a new config. Elapsed progress is kept; the new durations
    /// apply from the next transition check.
    ///
    /// # Errors
    /// Returns the validation error and keeps the previous config.
    pub fn update_config(&mut self, config: TimerConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        self.short_breaks_since_long = self
            .short_breaks_since_long
            .min(config.long_break_interval - 1);
        debug!(?config, "timer config updated");
        Ok(())
    }

    pub fn set_countdown(&mut self, countdown: bool) {
        self.countdown = countdown;
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn break_duration(&self, kind: BreakKind) -> u64 {
        match kind {
            BreakKind::Long => self.config.long_break_duration,
            BreakKind::Short | BreakKind::None => self.config.short_break_duration,
        }
    }

    fn begin_work(&mut self, events: &mut Vec<Event>) {
        self.mode = Mode::Working;
        self.elapsed_seconds = 0;
        self.break_kind = BreakKind::None;
        self.idle_notified = false;
        events.push(Event::WorkStarted {
            remaining: self.config.work_duration,
            at: Utc::now(),
        });
    }

    fn halt(&mut self, events: &mut Vec<Event>) {
        self.mode = Mode::Stopped;
        self.elapsed_seconds = 0;
        self.break_kind = BreakKind::None;
        events.push(Event::Stopped { at: Utc::now() });
    }

    fn check_transition(&mut self, events: &mut Vec<Event>) {
        match self.mode {
            Mode::OnBreak => {
                if self.elapsed_seconds < self.break_duration(self.break_kind) {
                    return;
                }
                if !self.is_user_idle {
                    let notify = !self.idle_notified;
                    debug!(kind = ?self.break_kind, notify, "break over");
                    events.push(Event::BreakEnded {
                        notify,
                        at: Utc::now(),
                    });
                    self.begin_work(events);
                } else if !self.idle_notified {
                    debug!("break over, holding until user returns");
                    self.idle_notified = true;
                    events.push(Event::BreakOverWhileIdle { at: Utc::now() });
                }
            }
            Mode::Working if self.elapsed_seconds >= self.config.work_duration => {
                self.short_breaks_since_long += 1;
                self.sessions_completed += 1;
                let kind = if self.short_breaks_since_long >= self.config.long_break_interval {
                    self.short_breaks_since_long = 0;
                    BreakKind::Long
                } else {
                    BreakKind::Short
                };
                self.mode = Mode::OnBreak;
                self.break_kind = kind;
                self.elapsed_seconds = 0;

                let remaining = self.break_duration(kind);
                let now = Utc::now();
                events.push(Event::WorkEnded { at: now });
                events.push(match kind {
                    BreakKind::Long => Event::LongBreakStarted { remaining, at: now },
                    _ => Event::ShortBreakStarted { remaining, at: now },
                });
                debug!(sessions = self.sessions_completed, ?kind, "work session complete");
            }
            _ => {}
        }
    }

    fn output(&self, events: Vec<Event>) -> Output {
        Output {
            events,
            snapshot: self.snapshot(),
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self {
            config: TimerConfig::default(),
            mode: Mode::Stopped,
            elapsed_seconds: 0,
            break_kind: BreakKind::None,
            short_breaks_since_long: 0,
            sessions_completed: 0,
            is_user_idle: false,
            idle_notified: false,
            countdown: true,
        }
    }
}
