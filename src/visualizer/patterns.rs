//! Amplitude fields for each visualizer mode.
//!
//! Every function maps a horizontal position `x` in `[0, 1]` to an amplitude
//! that is roughly in `[0, 1]`; the caller clamps and quantizes.

use std::f64::consts::TAU;

use super::noise::{hash, unit};
use crate::playback::VisualizerMode;

/// Brightness multiplier applied to a frozen (paused) frame.
pub(super) const PAUSED_DIM: f64 = 0.4;

/// Resolution of the simulated analyser behind Bars.
const BINS: usize = 64;
/// Simulated analyser updates per second.
const STEPS_PER_SEC: f64 = 20.0;
const PEAKS_PER_STEP: u64 = 5;
const NOISE_FLOOR: f64 = 0.3;
/// Weight kept from the previous step when smoothing (new data gets `1 - SMOOTHING`).
const SMOOTHING: f64 = 0.7;
const SMOOTHING_DEPTH: i64 = 6;
const BARS_GAIN: f64 = 1.6;

const SPECTRUM_BANDS: usize = 32;

const PEAK_SALT: u64 = 0x5045_414b;
const JITTER_SALT: u64 = 0x4a49_5454;

pub(super) fn level(mode: VisualizerMode, x: f64, elapsed: f64, seed: u64) -> f64 {
    match mode {
        VisualizerMode::Bars => bars(x, elapsed, seed),
        VisualizerMode::Wave => wave(x, elapsed, seed),
        VisualizerMode::Spectrum => spectrum(x, elapsed, seed),
    }
}

/// Static low ripple drawn while stopped.
pub(super) fn ripple(x: f64) -> f64 {
    0.12 + 0.08 * (TAU * 3.0 * x).sin()
}

fn step_at(elapsed: f64) -> i64 {
    (elapsed.max(0.0) * STEPS_PER_SEC).floor() as i64
}

/// One analyser step before smoothing: noise floor plus a handful of peaks.
fn raw_bin(seed: u64, step: i64, bin: usize) -> f64 {
    let step = step as u64;
    let noise = NOISE_FLOOR * unit(seed, step, bin as u64);

    let peak = (0..PEAKS_PER_STEP)
        .filter(|p| hash(seed ^ PEAK_SALT, step, *p) % BINS as u64 == bin as u64)
        .map(|p| 0.5 + 0.5 * unit(seed ^ PEAK_SALT, step, p + BINS as u64))
        .fold(0.0, f64::max);

    noise.max(peak)
}

/// Exponentially smoothed bin, recomputed from the last few steps so the
/// result depends only on the inputs.
fn smoothed_bin(seed: u64, step: i64, bin: usize) -> f64 {
    let mut total = 0.0;
    let mut norm = 0.0;
    let mut weight = 1.0;
    for k in 0..SMOOTHING_DEPTH {
        total += weight * raw_bin(seed, step - k, bin);
        norm += weight;
        weight *= SMOOTHING;
    }
    total / norm
}

fn pulse(seed: u64, elapsed: f64) -> f64 {
    let rate = 0.5 + unit(seed, 7, 0);
    0.85 + 0.15 * (TAU * rate * elapsed).sin()
}

fn bars(x: f64, elapsed: f64, seed: u64) -> f64 {
    let step = step_at(elapsed);

    let pos = (x * BINS as f64 - 0.5).clamp(0.0, (BINS - 1) as f64);
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(BINS - 1);
    let frac = pos - lo as f64;

    let value = smoothed_bin(seed, step, lo) * (1.0 - frac) + smoothed_bin(seed, step, hi) * frac;
    value * BARS_GAIN * pulse(seed, elapsed)
}

fn wave(x: f64, elapsed: f64, seed: u64) -> f64 {
    const AMPS: [f64; 3] = [0.5, 0.3, 0.2];
    const FREQS: [f64; 3] = [1.0, 2.5, 4.0];

    let sum: f64 = (0..3)
        .map(|i| {
            let k = i as u64;
            let freq = FREQS[i] * (0.8 + 0.4 * unit(seed, k, 1));
            let speed = 0.3 + 0.7 * unit(seed, k, 2);
            let phase = TAU * unit(seed, k, 3);
            AMPS[i] * (TAU * (freq * x - speed * elapsed) + phase).sin()
        })
        .sum();

    0.5 + 0.5 * sum
}

fn spectrum(x: f64, elapsed: f64, seed: u64) -> f64 {
    let band = ((x * SPECTRUM_BANDS as f64) as usize).min(SPECTRUM_BANDS - 1);
    let b = band as u64;
    let centre = (band as f64 + 0.5) / SPECTRUM_BANDS as f64;

    // Bass-heavy envelope.
    let weight = 0.2 + 0.8 * (1.0 - centre).powf(1.5);

    let rate = 0.5 + 2.0 * unit(seed, b, 1);
    let phase = unit(seed, b, 2);
    let pulse = 0.5 + 0.5 * (TAU * (rate * elapsed + phase)).sin();

    let step = step_at(elapsed) as u64;
    let jitter = 0.8 + 0.2 * unit(seed ^ JITTER_SALT, step, b);

    let linear = weight * (0.35 + 0.65 * pulse) * jitter;
    (1.0 + 9.0 * linear).log10()
}
