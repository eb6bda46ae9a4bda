//! Foreground timer.
//!
//! Owns a [`TimerRunner`](pomodoro_core::TimerRunner) and wires it to the
//! terminal: stdin lines are commands and presence reports, events become
//! notices, and every snapshot redraws the label. The timer keeps running
//! after stdin closes; only `quit`, Ctrl-C or a runner shutdown end it.

use clap::Args;
use pomodoro_core::runner::{self, RunnerError, TimerHandle};
use pomodoro_core::{
    Command, Config, Mode, NoticePolicy, PresentationSink, TimerConfig, TimerEngine,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::sink::TerminalSink;

const HELP: &str = "commands: start | stop | toggle | reset | skip | idle | active | \
                    countdown on|off | set <key> <value> | quit";

#[derive(Args)]
pub struct RunArgs {
    /// Wait for a `start` command instead of starting a work session
    #[arg(long)]
    pub stopped: bool,

    /// Override the work duration (seconds)
    #[arg(long)]
    pub work: Option<u64>,

    /// Override the short break duration (seconds)
    #[arg(long)]
    pub short_break: Option<u64>,

    /// Override the long break duration (seconds)
    #[arg(long)]
    pub long_break: Option<u64>,
}

/// Command-line duration overrides layered over the loaded config.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Overrides {
    work: Option<u64>,
    short_break: Option<u64>,
    long_break: Option<u64>,
}

impl Overrides {
    fn from_args(args: &RunArgs) -> Self {
        Self {
            work: args.work,
            short_break: args.short_break,
            long_break: args.long_break,
        }
    }

    fn apply(&self, mut config: TimerConfig) -> TimerConfig {
        if let Some(work) = self.work {
            config.work_duration = work;
        }
        if let Some(short) = self.short_break {
            config.short_break_duration = short;
        }
        if let Some(long) = self.long_break {
            config.long_break_duration = long;
        }
        config
    }

    /// An explicit `set` of a duration wins over its command-line override.
    fn forget(&mut self, key: &str) {
        match key {
            "timer.pomodoro_duration" => self.work = None,
            "timer.short_pause_duration" => self.short_break = None,
            "timer.long_pause_duration" => self.long_break = None,
            _ => {}
        }
    }
}

#[derive(Debug, PartialEq)]
enum Input {
    Engine(Command),
    Toggle,
    Set { key: String, value: String },
    Help,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let words: Vec<&str> = line.split_whitespace().collect();
    let input = match words.as_slice() {
        ["start"] => Input::Engine(Command::Start),
        ["stop"] => Input::Engine(Command::Stop),
        ["toggle"] => Input::Toggle,
        ["reset"] => Input::Engine(Command::Reset),
        ["skip"] => Input::Engine(Command::SkipOrRestart),
        ["idle"] => Input::Engine(Command::SetIdle(true)),
        ["active"] => Input::Engine(Command::SetIdle(false)),
        ["countdown", "on"] => Input::Engine(Command::SetCountdown(true)),
        ["countdown", "off"] => Input::Engine(Command::SetCountdown(false)),
        ["set", key, value] => Input::Set {
            key: (*key).to_string(),
            value: (*value).to_string(),
        },
        ["help"] => Input::Help,
        ["quit" | "exit"] => Input::Quit,
        _ => return None,
    };
    Some(input)
}

/// Live settings of a foreground session.
struct Session {
    config: Config,
    overrides: Overrides,
    policy: NoticePolicy,
}

impl Session {
    fn new(config: Config, overrides: Overrides) -> Self {
        let policy = NoticePolicy::new(
            config.ui.clone(),
            overrides.apply(config.timer_config()).long_break_interval,
        );
        Self {
            config,
            overrides,
            policy,
        }
    }

    fn timer_config(&self) -> TimerConfig {
        self.overrides.apply(self.config.timer_config())
    }

    /// Change one option, persist it and push it into the running timer.
    async fn set(
        &mut self,
        handle: &TimerHandle,
        key: &str,
        value: &str,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let mut config = self.config.clone();
        config.set(key, value)?;
        let mut overrides = self.overrides;
        overrides.forget(key);
        let timer_config = overrides.apply(config.timer_config());
        timer_config.validate()?;

        config.save()?;
        handle.send(Command::UpdateConfig(timer_config)).await?;
        handle
            .send(Command::SetCountdown(config.ui.show_countdown_timer))
            .await?;

        self.policy = NoticePolicy::new(config.ui.clone(), timer_config.long_break_interval);
        self.config = config;
        self.overrides = overrides;
        info!(key, value, "setting applied");
        Ok(())
    }
}

pub fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run_foreground(args))
}

async fn run_foreground(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(Config::load(), Overrides::from_args(&args));
    let timer_config = session.timer_config();

    let mut engine = TimerEngine::new(timer_config)?;
    engine.set_countdown(session.config.ui.show_countdown_timer);

    let (handle, task) = runner::spawn(engine);
    let mut events = handle.subscribe();
    let mut snapshots = handle.watch();
    let mut sink = TerminalSink::new(std::io::stdout());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    sink.line(HELP);
    sink.render(&handle.snapshot());
    if !args.stopped {
        handle.send(Command::Start).await?;
    }
    info!(?timer_config, "foreground timer running");

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    debug!("stdin closed, timer keeps running");
                    stdin_open = false;
                    continue;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let command = match parse_input(&line) {
                    Some(Input::Quit) => break,
                    Some(Input::Help) => {
                        sink.line(HELP);
                        continue;
                    }
                    Some(Input::Set { key, value }) => {
                        match session.set(&handle, &key, &value).await {
                            Ok(()) => sink.line(&format!("{key} = {value}")),
                            Err(e) => sink.line(&format!("{e}")),
                        }
                        continue;
                    }
                    Some(Input::Toggle) => {
                        if handle.snapshot().mode == Mode::Stopped {
                            Command::Start
                        } else {
                            Command::Stop
                        }
                    }
                    Some(Input::Engine(command)) => command,
                    None => {
                        sink.line(&format!("unknown command: {}", line.trim()));
                        continue;
                    }
                };
                match handle.send(command).await {
                    Ok(()) => {}
                    Err(RunnerError::Closed) => break,
                    Err(e) => sink.line(&format!("{e}")),
                }
            }
            event = events.recv() => match event {
                Ok(event) => {
                    for notice in session.policy.notices_for(&event) {
                        sink.notice(&notice);
                    }
                }
                Err(RecvError::Lagged(missed)) => warn!(missed, "dropped timer events"),
                Err(RecvError::Closed) => break,
            },
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                sink.render(&snapshot);
            }
            _ = &mut ctrl_c => break,
        }
    }

    let _ = handle.send(Command::Shutdown).await;
    let engine = task.await?;
    sink.line(&format!(
        "sessions completed: {}",
        engine.sessions_completed()
    ));
    Ok(())
}
