use serde::Deserialize;

use crate::playback::{LoopMode, VisualizerMode};

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Command line flags (applied by the runtime)
/// 2) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 3) Config file (if present)
/// 4) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub visualizer: VisualizerSettings,
    pub controls: ControlsSettings,
    pub ui: UiSettings,
    pub library: LibrarySettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Initial volume in `[0, 1]`.
    pub volume: f32,
    /// Amount one volume key press moves the volume.
    pub volume_step: f32,
    /// Fade-out applied when playback is stopped, including on quit (milliseconds).
    /// Set to 0 to stop immediately.
    pub fade_out_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 0.7,
            volume_step: 0.05,
            fade_out_ms: 300,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// What happens when a track ends.
    pub loop_mode: LoopModeSetting,
    /// Consecutive load failures tolerated before playback halts.
    pub max_load_retries: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            loop_mode: LoopModeSetting::LoopAll,
            max_load_retries: 3,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoopModeSetting {
    #[serde(alias = "no_loop", alias = "noloop")]
    NoLoop,
    #[serde(
        alias = "loopall",
        alias = "loop_all",
        alias = "loop-around"
    )]
    LoopAll,
    #[serde(
        alias = "loopone",
        alias = "loop_one",
        alias = "repeat-one"
    )]
    LoopOne,
}

impl From<LoopModeSetting> for LoopMode {
    fn from(value: LoopModeSetting) -> Self {
        match value {
            LoopModeSetting::NoLoop => LoopMode::NoLoop,
            LoopModeSetting::LoopAll => LoopMode::LoopAll,
            LoopModeSetting::LoopOne => LoopMode::LoopOne,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisualizerSettings {
    /// Mode shown at startup.
    pub mode: VisualizerMode,
    /// Number of columns computed per frame; the renderer resamples to fit.
    pub columns: usize,
}

impl Default for VisualizerSettings {
    fn default() -> Self {
        Self {
            mode: VisualizerMode::Bars,
            columns: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to seek when pressing left / right.
    pub seek_seconds: u64,
    /// Capacity of the queue between the input thread and the loop.
    pub queue_capacity: usize,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            seek_seconds: 5,
            queue_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Ticks per second of the coordination loop (and therefore frames per second).
    pub tick_rate_hz: u32,

    /// The text rendered in the header block title.
    pub header_text: String,

    /// Which track fields to show in the "now playing" line, and in what order.
    ///
    /// Example: ["artist", "title", "album"]
    pub now_playing_track_fields: Vec<TrackDisplayField>,

    /// Separator used to join `now_playing_track_fields`.
    pub now_playing_track_separator: String,

    /// Which time fields to show next to the progress bar, and in what order.
    ///
    /// Example: ["elapsed", "total", "remaining"]
    pub now_playing_time_fields: Vec<TimeField>,

    /// Separator used to join `now_playing_time_fields`.
    pub now_playing_time_separator: String,

    /// Whether the playlist panel is drawn next to the visualizer.
    pub show_playlist: bool,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            tick_rate_hz: 20,
            header_text: " ♫ cadenza ".to_string(),
            now_playing_track_fields: vec![TrackDisplayField::Title, TrackDisplayField::Artist],
            now_playing_track_separator: " - ".to_string(),
            now_playing_time_fields: vec![TimeField::Elapsed, TimeField::Total],
            now_playing_time_separator: " / ".to_string(),
            show_playlist: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TimeField {
    Elapsed,
    Total,
    Remaining,
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrackDisplayField {
    /// Use `track.display` (whatever the scanner produced).
    Display,
    Title,
    Artist,
    Album,
    Filename,
    Path,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,

    /// Which fields to use to build `Track.display` and its ordering.
    ///
    /// Example: ["artist", "title"] -> "Artist - Title"
    pub display_fields: Vec<TrackDisplayField>,
    /// Separator used to join `display_fields`.
    pub display_separator: String,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
            display_fields: vec![TrackDisplayField::Artist, TrackDisplayField::Title],
            display_separator: " - ".to_string(),
        }
    }
}
