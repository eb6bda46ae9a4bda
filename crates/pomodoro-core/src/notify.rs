//! Presentation side of the timer.
//!
//! The engine only emits [`Event`]s. [`NoticePolicy`] turns them into the
//! messages, dialogs and sounds a desktop would show, honouring the user's
//! UI toggles, and [`PresentationSink`] is the seam a frontend implements.

use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::storage::UiConfig;
use crate::timer::{DisplaySnapshot, Output};

pub const NOTICE_SOURCE: &str = "Pomodoro Timer";
pub const DIALOG_TITLE: &str = "Pomodoro Finished!";
pub const MSG_PAUSE_FINISHED: &str = "Pause finished, a new pomodoro is starting!";
pub const MSG_TAKE_A_BREAK: &str = "Pomodoro finished, take a break!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Disappears on its own.
    Transient,
    /// Stays until dismissed or replaced.
    Resident,
    /// Modal dialog.
    Dialog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeAction {
    /// Offer to skip the break / restart work.
    StartNewPomodoro,
}

impl NoticeAction {
    pub fn label(self) -> &'static str {
        match self {
            NoticeAction::StartNewPomodoro => "Start a new Pomodoro",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "notice", rename_all = "snake_case")]
pub enum Notice {
    /// Close whatever notification or dialog is open.
    CloseAll,
    Message {
        kind: NoticeKind,
        title: String,
        body: String,
        action: Option<NoticeAction>,
    },
    Sound,
}

/// Decides what the user sees for each event.
#[derive(Debug, Clone)]
pub struct NoticePolicy {
    pub ui: UiConfig,
    pub long_break_interval: u32,
}

impl NoticePolicy {
    pub fn new(ui: UiConfig, long_break_interval: u32) -> Self {
        Self {
            ui,
            long_break_interval,
        }
    }

    pub fn notices_for(&self, event: &Event) -> Vec<Notice> {
        match event {
            Event::BreakEnded { notify: true, .. } | Event::BreakOverWhileIdle { .. } => {
                self.work_starting()
            }
            Event::ShortBreakStarted { remaining, .. } => {
                self.work_finished(MSG_TAKE_A_BREAK.to_string(), *remaining)
            }
            Event::LongBreakStarted { remaining, .. } => {
                let text = format!(
                    "{} pomodoro in a row finished, starting a long pause...",
                    ordinal(self.long_break_interval)
                );
                self.work_finished(text, *remaining)
            }
            Event::Stopped { .. } => vec![Notice::CloseAll],
            _ => Vec::new(),
        }
    }

    fn work_starting(&self) -> Vec<Notice> {
        let mut notices = vec![Notice::CloseAll];
        if self.ui.show_messages {
            notices.push(Notice::Message {
                kind: NoticeKind::Transient,
                title: NOTICE_SOURCE.to_string(),
                body: MSG_PAUSE_FINISHED.to_string(),
                action: None,
            });
        }
        if self.ui.play_sound {
            notices.push(Notice::Sound);
        }
        notices
    }

    fn work_finished(&self, text: String, break_remaining: u64) -> Vec<Notice> {
        let mut notices = vec![Notice::CloseAll];
        if self.ui.show_dialog_messages {
            notices.push(Notice::Message {
                kind: NoticeKind::Dialog,
                title: DIALOG_TITLE.to_string(),
                body: break_reminder(break_remaining),
                action: Some(NoticeAction::StartNewPomodoro),
            });
        } else if self.ui.show_messages {
            notices.push(Notice::Message {
                kind: NoticeKind::Resident,
                title: NOTICE_SOURCE.to_string(),
                body: text,
                action: Some(NoticeAction::StartNewPomodoro),
            });
        }
        notices
    }
}

/// Reminder shown in the break dialog.
///
/// Under 47 seconds the count is rounded to 5 seconds, otherwise to whole
/// minutes.
pub fn break_reminder(remaining_secs: u64) -> String {
    if remaining_secs < 47 {
        let secs = (remaining_secs + 2) / 5 * 5;
        format!("Take a break! You have {secs} seconds")
    } else {
        let mins = (remaining_secs + 30) / 60;
        format!("Take a break! You have {mins} minutes")
    }
}

fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// A frontend: notifications, dialogs, sounds and the panel label.
///
/// Implementations must not report failures back; the engine never waits
/// on a sink.
pub trait PresentationSink {
    fn notice(&mut self, notice: &Notice);

    fn render(&mut self, snapshot: &DisplaySnapshot);

    /// Show every notice for `output` in event order, then render.
    fn present(&mut self, policy: &NoticePolicy, output: &Output) {
        for event in &output.events {
            for notice in policy.notices_for(event) {
                self.notice(&notice);
            }
        }
        self.render(&output.snapshot);
    }
}
