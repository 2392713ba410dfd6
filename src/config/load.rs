use std::{env, path::PathBuf};

use super::schema::Settings;
use crate::visualizer::MAX_COLUMNS;

const APP_DIR: &str = "cadenza";

/// Configuration loading helpers.
///
/// `Settings::load` layers an optional config file under environment variables
/// (prefix `CADENZA__`) and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let mut builder = ::config::Config::builder();

        if let Some(path) = resolve_config_path() {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENZA")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Reject values the runtime cannot work with.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(format!("audio.volume must be within 0..=1, got {}", self.audio.volume));
        }
        if !(self.audio.volume_step > 0.0 && self.audio.volume_step <= 1.0) {
            return Err(format!(
                "audio.volume_step must be within (0, 1], got {}",
                self.audio.volume_step
            ));
        }
        if self.playback.max_load_retries == 0 {
            return Err("playback.max_load_retries must be >= 1".to_string());
        }
        if !(1..=MAX_COLUMNS).contains(&self.visualizer.columns) {
            return Err(format!("visualizer.columns must be within 1..={MAX_COLUMNS}"));
        }
        if self.controls.queue_capacity == 0 {
            return Err("controls.queue_capacity must be >= 1".to_string());
        }
        if !(1..=120).contains(&self.ui.tick_rate_hz) {
            return Err("ui.tick_rate_hz must be within 1..=120".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `CADENZA_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENZA_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// `$XDG_CONFIG_HOME/cadenza/config.toml`, or `~/.config/cadenza/config.toml`
/// when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join(APP_DIR).join("config.toml"))
}

/// `$XDG_STATE_HOME/cadenza/cadenza.log`, or `~/.local/state/cadenza/cadenza.log`.
pub fn default_log_path() -> Option<PathBuf> {
    xdg_dir("XDG_STATE_HOME", &[".local", "state"])
        .map(|d| d.join(APP_DIR).join(format!("{APP_DIR}.log")))
}

fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    if let Some(dir) = env::var_os(var).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    env::var_os("HOME").map(|home| {
        home_fallback
            .iter()
            .fold(PathBuf::from(home), |p, segment| p.join(segment))
    })
}
