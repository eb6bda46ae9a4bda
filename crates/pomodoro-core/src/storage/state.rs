//! Engine persistence for one-shot callers.
//!
//! A CLI invocation loads the engine, applies one command and saves it
//! again. The seconds that passed between invocations are replayed as
//! ticks on load so the timer appears to have kept running.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::data_dir;
use crate::error::Result;
use crate::events::Event;
use crate::timer::{TimerConfig, TimerEngine};

/// Longest gap replayed on load.
pub const MAX_CATCH_UP_SECS: u64 = 24 * 60 * 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedEngine {
    pub engine: TimerEngine,
    pub saved_at: DateTime<Utc>,
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Store at `<data dir>/state.json`.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("state.json")))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the engine and replay the time since it was saved.
    ///
    /// Missing or unreadable state yields a fresh engine built from
    /// `config`. A stored engine gets `config` applied before replay; if
    /// the config is rejected the stored one is kept.
    pub fn load(&self, config: TimerConfig, now: DateTime<Utc>) -> (TimerEngine, Vec<Event>) {
        let saved = match std::fs::read_to_string(&self.path) {
            Ok(json) => match serde_json::from_str::<SavedEngine>(&json) {
                Ok(saved) => Some(saved),
                Err(e) => {
                    warn!(path = %self.path.display(), "discarding unreadable timer state: {e}");
                    None
                }
            },
            Err(_) => None,
        };

        let Some(SavedEngine { mut engine, saved_at }) = saved else {
            let engine = TimerEngine::new(config).unwrap_or_default();
            return (engine, Vec::new());
        };

        if let Err(e) = engine.update_config(config) {
            warn!("keeping stored timer config: {e}");
        }

        let gap = now.signed_duration_since(saved_at).num_seconds().max(0) as u64;
        let gap = gap.min(MAX_CATCH_UP_SECS);
        debug!(gap, "replaying ticks since last save");
        let events = engine.advance(gap).events;
        (engine, events)
    }

    /// # Errors
    /// Returns an error if the engine cannot be serialized or written.
    pub fn save(&self, engine: &TimerEngine, now: DateTime<Utc>) -> Result<()> {
        let saved = SavedEngine {
            engine: engine.clone(),
            saved_at: now,
        };
        let json = serde_json::to_string_pretty(&saved)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
