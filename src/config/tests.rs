use super::load::{default_config_path, default_log_path, resolve_config_path};
use super::schema::*;
use crate::playback::{LoopMode, VisualizerMode};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_explicit_variable() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", "/tmp/cadenza-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        PathBuf::from("/tmp/cadenza-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/xdg-config-home/cadenza/config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        default_config_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.config/cadenza/config.toml")
    );
}

#[test]
fn default_log_path_uses_state_dir() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_STATE_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");
    assert_eq!(
        default_log_path().unwrap(),
        PathBuf::from("/tmp/home-dir/.local/state/cadenza/cadenza.log")
    );

    let _g3 = EnvGuard::set("XDG_STATE_HOME", "/tmp/state");
    assert_eq!(
        default_log_path().unwrap(),
        PathBuf::from("/tmp/state/cadenza/cadenza.log")
    );
}

#[test]
fn settings_load_from_config_file_and_parse_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
loop_mode = "repeat-one"
max_load_retries = 5

[audio]
volume = 0.25
volume_step = 0.1
fade_out_ms = 0

[visualizer]
mode = "spectrum"
columns = 32

[controls]
seek_seconds = 9

[ui]
tick_rate_hz = 30
header_text = "hello"
now_playing_track_fields = ["artist", "title"]
now_playing_track_separator = " • "
now_playing_time_fields = ["elapsed", "remaining"]
show_playlist = false

[library]
extensions = ["mp3"]
recursive = false
include_hidden = true
display_fields = ["filename"]
display_separator = "::"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CADENZA__AUDIO__VOLUME");

    let s = Settings::load().unwrap();
    assert_eq!(LoopMode::from(s.playback.loop_mode), LoopMode::LoopOne);
    assert_eq!(s.playback.max_load_retries, 5);
    assert_eq!(s.audio.volume, 0.25);
    assert_eq!(s.audio.volume_step, 0.1);
    assert_eq!(s.audio.fade_out_ms, 0);
    assert_eq!(s.visualizer.mode, VisualizerMode::Spectrum);
    assert_eq!(s.visualizer.columns, 32);
    assert_eq!(s.controls.seek_seconds, 9);
    assert_eq!(s.controls.queue_capacity, 64);
    assert_eq!(s.ui.tick_rate_hz, 30);
    assert_eq!(s.ui.header_text, "hello");
    assert!(matches!(
        s.ui.now_playing_track_fields.as_slice(),
        [TrackDisplayField::Artist, TrackDisplayField::Title]
    ));
    assert_eq!(s.ui.now_playing_track_separator, " • ");
    assert!(matches!(
        s.ui.now_playing_time_fields.as_slice(),
        [TimeField::Elapsed, TimeField::Remaining]
    ));
    assert!(!s.ui.show_playlist);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert_eq!(s.library.display_separator, "::");
    assert!(matches!(s.library.display_fields[0], TrackDisplayField::Filename));
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(&cfg_path, "[controls]\nseek_seconds = 10\n").unwrap();

    let _g1 = EnvGuard::set("CADENZA_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CADENZA__CONTROLS__SEEK_SECONDS", "2");

    let s = Settings::load().unwrap();
    assert_eq!(s.controls.seek_seconds, 2);
}

#[test]
fn missing_config_file_yields_defaults() {
    let _lock = env_lock();
    let dir = tempfile::tempdir().unwrap();
    let _g1 = EnvGuard::set(
        "CADENZA_CONFIG_PATH",
        dir.path().join("absent.toml").to_str().unwrap(),
    );

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.volume, 0.7);
    assert_eq!(s.visualizer.mode, VisualizerMode::Bars);
    assert_eq!(LoopMode::from(s.playback.loop_mode), LoopMode::LoopAll);
}

#[test]
fn schema_deserializes_straight_from_toml() {
    let s: Settings = toml::from_str(
        r#"
[playback]
loop_mode = "no_loop"

[visualizer]
mode = "wave"
"#,
    )
    .unwrap();
    assert_eq!(s.playback.loop_mode, LoopModeSetting::NoLoop);
    assert_eq!(s.visualizer.mode, VisualizerMode::Wave);
    assert_eq!(s.visualizer.columns, 64);
}

#[test]
fn validate_rejects_out_of_range_values() {
    assert!(Settings::default().validate().is_ok());

    let mut s = Settings::default();
    s.audio.volume = 1.5;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.audio.volume_step = 0.0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.playback.max_load_retries = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.visualizer.columns = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.ui.tick_rate_hz = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.controls.queue_capacity = 0;
    assert!(s.validate().is_err());
}
