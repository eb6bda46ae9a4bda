mod config;
pub mod state;

pub use config::{Config, TimerOptions, UiConfig, CONFIG_VERSION};
pub use state::{SavedEngine, StateStore};

use std::path::PathBuf;

use crate::error::Result;

/// Returns `~/.config/pomodoro[-dev]/`, creating it if needed.
///
/// Set POMODORO_ENV=dev to use the development directory, or
/// POMODORO_CONFIG_DIR to point somewhere else entirely.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POMODORO_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::config_dir()
                .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
                .unwrap_or_else(|| PathBuf::from("."));
            let env = std::env::var("POMODORO_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomodoro-dev")
            } else {
                base_dir.join("pomodoro")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// System-wide config file, read before the user's own file.
pub fn system_config_path() -> Option<PathBuf> {
    if cfg!(unix) && std::env::var_os("POMODORO_CONFIG_DIR").is_none() {
        Some(PathBuf::from("/etc/xdg/pomodoro/config.toml"))
    } else {
        None
    }
}
