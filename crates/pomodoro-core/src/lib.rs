//! # Pomodoro Core Library
//!
//! Business logic for a work/break interval timer. The CLI (and any other
//! frontend) is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a tick-driven state machine; the caller invokes
//!   `tick()` once per second and forwards presence changes
//! - **Notices**: maps engine events to messages, dialogs and sounds
//! - **Storage**: layered TOML configuration and JSON engine state
//! - **Runner**: tokio task that owns an engine, ticks it and publishes
//!   its events
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Event`]: Everything the engine reports
//! - [`Config`]: Application configuration management
//! - [`PresentationSink`]: Trait implemented by frontends

pub mod error;
pub mod events;
pub mod notify;
pub mod runner;
pub mod storage;
pub mod timer;

pub use error::{ConfigError, CoreError, TimerError};
pub use events::Event;
pub use notify::{Notice, NoticeAction, NoticeKind, NoticePolicy, PresentationSink};
pub use runner::{Command, RunnerError, TimerHandle, TimerRunner};
pub use storage::{Config, StateStore, TimerOptions, UiConfig};
pub use timer::{
    BreakKind, DisplaySnapshot, Mode, Output, SessionGlyph, TimerConfig, TimerEngine,
};
