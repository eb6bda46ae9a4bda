use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change of the timer produces an Event.
/// Presentation sinks and the signal bus subscribe to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    WorkStarted {
        /// Seconds left in the new work session.
        remaining: u64,
        at: DateTime<Utc>,
    },
    WorkEnded {
        at: DateTime<Utc>,
    },
    ShortBreakStarted {
        remaining: u64,
        at: DateTime<Utc>,
    },
    LongBreakStarted {
        remaining: u64,
        at: DateTime<Utc>,
    },
    BreakEnded {
        /// False when the user was already told (idle invalidation or a
        /// held break), so the "break finished" notice is skipped once.
        notify: bool,
        at: DateTime<Utc>,
    },
    /// Break time is up but the user is still away. Fired once per hold.
    BreakOverWhileIdle {
        at: DateTime<Utc>,
    },
    Stopped {
        at: DateTime<Utc>,
    },
    CountersReset {
        at: DateTime<Utc>,
    },
    /// User went idle right after a work session started; the session
    /// was turned into a held break without being counted.
    IdleInvalidated {
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Stable snake_case name, matching the serialized `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Event::WorkStarted { .. } => "work_started",
            Event::WorkEnded { .. } => "work_ended",
            Event::ShortBreakStarted { .. } => "short_break_started",
            Event::LongBreakStarted { .. } => "long_break_started",
            Event::BreakEnded { .. } => "break_ended",
            Event::BreakOverWhileIdle { .. } => "break_over_while_idle",
            Event::Stopped { .. } => "stopped",
            Event::CountersReset { .. } => "counters_reset",
            Event::IdleInvalidated { .. } => "idle_invalidated",
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::WorkStarted { at, .. }
            | Event::WorkEnded { at }
            | Event::ShortBreakStarted { at, .. }
            | Event::LongBreakStarted { at, .. }
            | Event::BreakEnded { at, .. }
            | Event::BreakOverWhileIdle { at }
            | Event::Stopped { at }
            | Event::CountersReset { at }
            | Event::IdleInvalidated { at } => *at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_name() {
        let events = [
            Event::WorkStarted { remaining: 1500, at: Utc::now() },
            Event::BreakEnded { notify: false, at: Utc::now() },
            Event::IdleInvalidated { at: Utc::now() },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["type"], event.name());
        }
    }

    #[test]
    fn deserializes_from_tagged_json() {
        let json = r#"{"type":"short_break_started","remaining":300,"at":"2026-01-01T00:00:00Z"}"#;
        let event: Event = serde_json::from_str(json).unwrap();
        assert!(matches!(event, Event::ShortBreakStarted { remaining: 300, .. }));
    }
}
