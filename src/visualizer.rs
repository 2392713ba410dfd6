//! Procedural visualizer.
//!
//! Frames are not derived from audio samples. Each one is a deterministic
//! function of the visualizer mode, the playback status, the elapsed time and
//! a per-track seed, which makes the animation look driven by the music while
//! staying reproducible and cheap.

mod noise;
mod patterns;

use crate::playback::{Status, VisualizerMode};

/// Highest level a column can reach.
pub const MAX_LEVEL: u8 = 64;

/// Upper bound on the number of columns in a frame.
pub const MAX_COLUMNS: usize = 512;

pub const IDLE_CAPTION: &str = "♫ Press SPACE to play music ♫";

/// Inputs of [`compose`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRequest {
    pub mode: VisualizerMode,
    pub activity: Status,
    /// Seconds into the current track.
    pub elapsed: f64,
    /// Seed of the current track, 0 when nothing is loaded.
    pub seed: u64,
    /// Requested number of columns.
    pub width: usize,
}

/// One frame of visualization output.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualFrame {
    pub mode: VisualizerMode,
    /// Per-column levels in `0..=MAX_LEVEL`.
    pub columns: Vec<u8>,
    /// True when nothing is playing.
    pub idle: bool,
    pub caption: String,
}

/// Build the frame for `req`. Pure: equal requests give equal frames.
pub fn compose(req: &FrameRequest) -> VisualFrame {
    let width = req.width.min(MAX_COLUMNS);

    let (columns, caption) = match req.activity {
        Status::Stopped => (sample(width, patterns::ripple), IDLE_CAPTION.to_string()),
        Status::Playing => (
            sample(width, |x| patterns::level(req.mode, x, req.elapsed, req.seed)),
            String::new(),
        ),
        Status::Paused => (
            sample(width, |x| {
                patterns::level(req.mode, x, req.elapsed, req.seed) * patterns::PAUSED_DIM
            }),
            "Paused".to_string(),
        ),
    };

    VisualFrame {
        mode: req.mode,
        columns,
        idle: req.activity == Status::Stopped,
        caption,
    }
}

/// Evaluate `field` at the centre of each of `width` columns spread over `[0, 1]`.
fn sample(width: usize, field: impl Fn(f64) -> f64) -> Vec<u8> {
    (0..width)
        .map(|c| {
            let x = (c as f64 + 0.5) / width as f64;
            quantize(field(x))
        })
        .collect()
}

fn quantize(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * f64::from(MAX_LEVEL)).round() as u8
}
