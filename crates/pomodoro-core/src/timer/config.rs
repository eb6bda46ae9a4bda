use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Durations and thresholds the engine evaluates against.
///
/// All durations are in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work_duration: u64,
    pub short_break_duration: u64,
    pub long_break_duration: u64,
    /// Completed work sessions per long break.
    pub long_break_interval: u32,
    /// Going idle before this many seconds of work invalidates the session.
    pub idle_grace_seconds: u64,
}

pub const DEFAULT_WORK_DURATION: u64 = 1500;
pub const DEFAULT_SHORT_BREAK_DURATION: u64 = 300;
pub const DEFAULT_LONG_BREAK_DURATION: u64 = 900;
pub const DEFAULT_LONG_BREAK_INTERVAL: u32 = 4;
pub const DEFAULT_IDLE_GRACE_SECONDS: u64 = 300;

impl TimerConfig {
    /// Reject zero durations and a zero long-break interval.
    ///
    /// Negative values cannot be represented, so the grace period needs no
    /// check beyond its type.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.work_duration == 0 {
            return Err(ConfigError::invalid("work_duration", "must be positive"));
        }
        if self.short_break_duration == 0 {
            return Err(ConfigError::invalid("short_break_duration", "must be positive"));
        }
        if self.long_break_duration == 0 {
            return Err(ConfigError::invalid("long_break_duration", "must be positive"));
        }
        if self.long_break_interval == 0 {
            return Err(ConfigError::invalid("long_break_interval", "must be at least 1"));
        }
        Ok(())
    }
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: DEFAULT_WORK_DURATION,
            short_break_duration: DEFAULT_SHORT_BREAK_DURATION,
            long_break_duration: DEFAULT_LONG_BREAK_DURATION,
            long_break_interval: DEFAULT_LONG_BREAK_INTERVAL,
            idle_grace_seconds: DEFAULT_IDLE_GRACE_SECONDS,
        }
    }
}
