//! Terminal presentation: notices as lines, the panel label redrawn in
//! place, both on the one writer the sink wraps (stdout in `run`).

use std::io::Write;

use pomodoro_core::{DisplaySnapshot, Mode, Notice, NoticeKind, PresentationSink};

pub struct TerminalSink<W: Write> {
    out: W,
    /// A label line is on screen and must be ended before other output.
    label_open: bool,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            label_open: false,
        }
    }

    /// Print a line of text, moving past the label first.
    pub fn line(&mut self, text: &str) {
        self.end_label();
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }

    fn end_label(&mut self) {
        if self.label_open {
            let _ = writeln!(self.out);
            self.label_open = false;
        }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> PresentationSink for TerminalSink<W> {
    fn notice(&mut self, notice: &Notice) {
        match notice {
            // Nothing persistent on a terminal.
            Notice::CloseAll => {}
            Notice::Sound => {
                let _ = write!(self.out, "\x07");
                let _ = self.out.flush();
            }
            Notice::Message {
                kind,
                title,
                body,
                action,
            } => {
                let marker = match kind {
                    NoticeKind::Transient => "*",
                    NoticeKind::Resident => "!",
                    NoticeKind::Dialog => "#",
                };
                let mut text = format!("{marker} {title}: {body}");
                if let Some(action) = action {
                    text.push_str(&format!(" (type 'skip' to {})", action.label().to_lowercase()));
                }
                self.line(&text);
            }
        }
    }

    fn render(&mut self, snapshot: &DisplaySnapshot) {
        let phase = match snapshot.mode {
            Mode::Stopped => "stopped",
            Mode::Working => "work",
            Mode::OnBreak => "break",
        };
        let glyphs = match snapshot.glyph_text() {
            g if g.is_empty() => "None".to_string(),
            g => g,
        };
        let _ = write!(
            self.out,
            "\r{} {:<7} {:<8}",
            snapshot.label(),
            phase,
            glyphs
        );
        let _ = self.out.flush();
        self.label_open = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomodoro_core::{NoticeAction, TimerEngine};

    fn rendered(sink: TerminalSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_inner()).unwrap()
    }

    #[test]
    fn render_overwrites_label_line() {
        let mut engine = TimerEngine::default();
        let mut sink = TerminalSink::new(Vec::new());
        sink.render(&engine.snapshot());
        let out = engine.start().unwrap();
        sink.render(&out.snapshot);
        let text = rendered(sink);
        assert!(text.starts_with("\r[00] 00:00 stopped None"));
        assert!(text.contains("\r[00] 25:00 work    ◖"));
    }

    #[test]
    fn message_ends_label_line() {
        let engine = TimerEngine::default();
        let mut sink = TerminalSink::new(Vec::new());
        sink.render(&engine.snapshot());
        sink.notice(&Notice::Message {
            kind: NoticeKind::Resident,
            title: "Pomodoro Timer".into(),
            body: "Pomodoro finished, take a break!".into(),
            action: Some(NoticeAction::StartNewPomodoro),
        });
        let text = rendered(sink);
        assert!(text.contains(
            "\n! Pomodoro Timer: Pomodoro finished, take a break! (type 'skip' to start a new pomodoro)\n"
        ));
    }

    #[test]
    fn sound_rings_bell() {
        let mut sink = TerminalSink::new(Vec::new());
        sink.notice(&Notice::Sound);
        assert_eq!(rendered(sink), "\x07");
    }
}
