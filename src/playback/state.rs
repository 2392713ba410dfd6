//! Playback state value and the small enums it is built from.

use serde::Deserialize;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Status {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Stopped => "Stopped",
            Status::Playing => "Playing",
            Status::Paused => "Paused",
        }
    }
}

/// Visualization style drawn by the visualizer.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizerMode {
    #[default]
    Bars,
    Wave,
    Spectrum,
}

impl VisualizerMode {
    /// Bars -> Wave -> Spectrum -> Bars.
    pub fn next(self) -> Self {
        match self {
            VisualizerMode::Bars => VisualizerMode::Wave,
            VisualizerMode::Wave => VisualizerMode::Spectrum,
            VisualizerMode::Spectrum => VisualizerMode::Bars,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VisualizerMode::Bars => "Bars",
            VisualizerMode::Wave => "Wave",
            VisualizerMode::Spectrum => "Spectrum",
        }
    }
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop after the last track of the catalog.
    NoLoop,
    /// Wrap around to the first track.
    #[default]
    LoopAll,
    /// Repeat the current track when it ends.
    LoopOne,
}

impl LoopMode {
    /// NoLoop -> LoopAll -> LoopOne -> NoLoop.
    pub fn next(self) -> Self {
        match self {
            LoopMode::NoLoop => LoopMode::LoopAll,
            LoopMode::LoopAll => LoopMode::LoopOne,
            LoopMode::LoopOne => LoopMode::NoLoop,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoopMode::NoLoop => "No-loop",
            LoopMode::LoopAll => "Loop-around",
            LoopMode::LoopOne => "Repeat-one",
        }
    }
}

/// Terminal playback error. Cleared by the next explicit Play.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Too many tracks in a row failed to load.
    LoadRetriesExhausted,
}

impl Fault {
    pub fn message(self) -> &'static str {
        match self {
            Fault::LoadRetriesExhausted => "too many tracks failed to load, playback stopped",
        }
    }
}

/// Snapshot of everything the rest of the program may know about playback.
///
/// `current` is `Some` exactly when `status` is not `Stopped`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PlaybackState {
    pub status: Status,
    /// Catalog index of the loaded track.
    pub current: Option<usize>,
    /// Seconds into the current track.
    pub elapsed: f64,
    pub volume: f32,
    pub mode: VisualizerMode,
    pub loop_mode: LoopMode,
    /// Total number of failed loads since startup.
    pub load_errors: u32,
    pub fault: Option<Fault>,
    /// Set once the backend refused a seek; seeking only shifts the clock afterwards.
    pub seek_degraded: bool,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self {
            status: Status::Stopped,
            current: None,
            elapsed: 0.0,
            volume: 0.7,
            mode: VisualizerMode::Bars,
            loop_mode: LoopMode::LoopAll,
            load_errors: 0,
            fault: None,
            seek_degraded: false,
        }
    }
}
