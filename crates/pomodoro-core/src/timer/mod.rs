mod config;
mod display;
mod engine;

pub use config::{
    TimerConfig, DEFAULT_IDLE_GRACE_SECONDS, DEFAULT_LONG_BREAK_DURATION,
    DEFAULT_LONG_BREAK_INTERVAL, DEFAULT_SHORT_BREAK_DURATION, DEFAULT_WORK_DURATION,
};
pub use display::{session_glyphs, DisplaySnapshot, SessionGlyph};
pub use engine::{BreakKind, Mode, Output, TimerEngine};
