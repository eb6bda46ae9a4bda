use chrono::Utc;
use clap::Subcommand;
use pomodoro_core::{Config, Mode, Output, StateStore};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a work session
    Start,
    /// Stop the timer, discarding the current phase
    Stop,
    /// Start when stopped, stop when running
    Toggle,
    /// Zero the session counters (restarts work when running)
    Reset,
    /// Skip the current break, or restart the current work session
    Skip,
    /// Report that the user went idle
    Idle,
    /// Report that the user is back
    Active,
    /// Print current timer state as JSON
    Status,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();
    let store = StateStore::open()?;
    let now = Utc::now();
    let (mut engine, mut events) = store.load(config.timer_config(), now);
    engine.set_countdown(config.ui.show_countdown_timer);

    let out = match action {
        TimerAction::Start => engine.start()?,
        TimerAction::Stop => engine.stop()?,
        TimerAction::Toggle => {
            if engine.mode() == Mode::Stopped {
                engine.start()?
            } else {
                engine.stop()?
            }
        }
        TimerAction::Reset => engine.reset(),
        TimerAction::Skip => engine.skip_or_restart()?,
        TimerAction::Idle => engine.set_idle(true),
        TimerAction::Active => engine.set_idle(false),
        TimerAction::Status => Output {
            events: Vec::new(),
            snapshot: engine.snapshot(),
        },
    };
    events.extend(out.events);

    store.save(&engine, now)?;

    let report = serde_json::json!({
        "label": out.snapshot.label(),
        "glyphs": out.snapshot.glyph_text(),
        "snapshot": out.snapshot,
        "events": events,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
