//! Display snapshot rendered by presentation sinks after every engine call.

use serde::{Deserialize, Serialize};

use super::engine::{BreakKind, Mode};

const FILLED: char = '\u{25cf}'; // ● BLACK CIRCLE
const HALF: char = '\u{25d6}'; // ◖ LEFT HALF BLACK CIRCLE

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionGlyph {
    Completed,
    InProgress,
}

impl SessionGlyph {
    pub fn as_char(self) -> char {
        match self {
            SessionGlyph::Completed => FILLED,
            SessionGlyph::InProgress => HALF,
        }
    }
}

/// Glyphs for the sessions of the current cycle.
///
/// The filled count wraps every `cycle` sessions while `sessions_completed`
/// keeps growing.
pub fn session_glyphs(sessions_completed: u64, mode: Mode, cycle: u32) -> Vec<SessionGlyph> {
    let cycle = u64::from(cycle.max(1));
    match mode {
        Mode::Working => {
            let filled = (sessions_completed % cycle) as usize;
            let mut glyphs = vec![SessionGlyph::Completed; filled];
            glyphs.push(SessionGlyph::InProgress);
            glyphs
        }
        Mode::OnBreak | Mode::Stopped => {
            if sessions_completed == 0 {
                return Vec::new();
            }
            let filled = ((sessions_completed - 1) % cycle + 1) as usize;
            vec![SessionGlyph::Completed; filled]
        }
    }
}

/// Everything a sink needs to draw the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySnapshot {
    pub mode: Mode,
    pub break_kind: BreakKind,
    /// Clock minutes: remaining time in countdown mode, elapsed otherwise.
    pub minutes: u64,
    pub seconds: u64,
    pub remaining_secs: u64,
    pub elapsed_secs: u64,
    pub sessions_completed: u64,
    pub glyphs: Vec<SessionGlyph>,
    /// Kind of the break the next completed work session leads to.
    pub upcoming_break: BreakKind,
}

impl DisplaySnapshot {
    /// Panel label, e.g. `[03] 12:34`.
    pub fn label(&self) -> String {
        format!(
            "[{:02}] {:02}:{:02}",
            self.sessions_completed, self.minutes, self.seconds
        )
    }

    /// Glyph string; empty when nothing has been collected yet.
    pub fn glyph_text(&self) -> String {
        self.glyphs.iter().map(|g| g.as_char()).collect()
    }
}
