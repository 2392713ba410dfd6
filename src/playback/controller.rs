use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::audio::AudioBackend;
use crate::config::Settings;
use crate::library::{Catalog, Track};

use super::command::Command;
use super::state::{Fault, LoopMode, PlaybackState, Status, VisualizerMode};

/// Startup parameters of a [`PlaybackController`].
#[derive(Debug, Clone, Copy)]
pub struct ControllerOptions {
    pub volume: f32,
    pub volume_step: f32,
    pub mode: VisualizerMode,
    pub loop_mode: LoopMode,
    /// Consecutive load failures tolerated before playback halts.
    pub max_load_retries: u32,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            volume: 0.7,
            volume_step: 0.05,
            mode: VisualizerMode::Bars,
            loop_mode: LoopMode::LoopAll,
            max_load_retries: 3,
        }
    }
}

impl ControllerOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            volume: settings.audio.volume,
            volume_step: settings.audio.volume_step,
            mode: settings.visualizer.mode,
            loop_mode: settings.playback.loop_mode.into(),
            max_load_retries: settings.playback.max_load_retries,
        }
    }
}

/// State machine translating [`Command`]s into transport calls on an
/// [`AudioBackend`].
pub struct PlaybackController<B: AudioBackend> {
    backend: B,
    catalog: Arc<Catalog>,
    state: PlaybackState,
    /// Track used by Play / Next / Prev while stopped.
    cursor: usize,
    consecutive_failures: u32,
    max_load_retries: u32,
    volume_step: f32,
    /// Added to backend-reported positions once seeking is degraded.
    seek_offset: f64,
}

impl<B: AudioBackend> PlaybackController<B> {
    pub fn new(mut backend: B, catalog: Arc<Catalog>, options: ControllerOptions) -> Self {
        let volume = options.volume.clamp(0.0, 1.0);
        backend.set_volume(volume);

        let state = PlaybackState {
            volume,
            mode: options.mode,
            loop_mode: options.loop_mode,
            ..PlaybackState::default()
        };

        Self {
            backend,
            catalog,
            state,
            cursor: 0,
            consecutive_failures: 0,
            max_load_retries: options.max_load_retries.max(1),
            volume_step: if options.volume_step > 0.0 {
                options.volume_step
            } else {
                ControllerOptions::default().volume_step
            },
            seek_offset: 0.0,
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> PlaybackState {
        self.state
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current.and_then(|i| self.catalog.get(i))
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[cfg(test)]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Apply one command. `Quit` is handled by the loop and ignored here.
    pub fn apply(&mut self, cmd: Command) {
        debug!(?cmd, status = ?self.state.status, "apply command");
        match cmd {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::PlayPause => {
                if self.state.status == Status::Playing {
                    self.pause();
                } else {
                    self.play();
                }
            }
            Command::Stop => self.stop(),
            Command::Next => self.step(true),
            Command::Prev => self.step(false),
            Command::Seek(delta) => self.seek(delta),
            Command::VolumeUp => self.nudge_volume(1.0),
            Command::VolumeDown => self.nudge_volume(-1.0),
            Command::CycleVisualizerMode => {
                self.state.mode = self.state.mode.next();
            }
            Command::CycleLoopMode => {
                self.state.loop_mode = self.state.loop_mode.next();
            }
            Command::Quit => {}
        }
    }

    /// Advance the playback clock by one tick and handle end of track.
    pub fn refresh(&mut self, dt: Duration) {
        if self.state.status != Status::Playing {
            return;
        }

        let duration = self.current_track().and_then(Track::duration_secs);

        let position = self.backend.query_position();
        let mut elapsed = match position {
            Some(pos) => pos + self.seek_offset,
            None => self.state.elapsed + dt.as_secs_f64(),
        };
        elapsed = elapsed.max(0.0);
        if let Some(d) = duration {
            elapsed = elapsed.min(d);
        }
        self.state.elapsed = elapsed;

        // The seek offset only moves the displayed clock, so the end of the
        // track is judged on the backend's own position when it has one.
        let reached_end = position.unwrap_or(elapsed);
        let finished = self.backend.is_finished() || duration.is_some_and(|d| reached_end >= d);
        if finished {
            self.on_track_end();
        }
    }

    /// Stop the backend and release the output device.
    pub fn shutdown(&mut self) {
        info!("shutting down playback");
        self.backend.stop();
        self.backend.close();
        self.reset_to_stopped();
    }

    fn play(&mut self) {
        match self.state.status {
            Status::Playing => {}
            Status::Paused => {
                self.backend.resume();
                self.state.status = Status::Playing;
            }
            Status::Stopped => {
                if self.catalog.is_empty() {
                    return;
                }
                self.state.fault = None;
                self.consecutive_failures = 0;
                self.start(self.cursor);
            }
        }
    }

    fn pause(&mut self) {
        if self.state.status == Status::Playing {
            self.backend.pause();
            self.state.status = Status::Paused;
        }
    }

    fn stop(&mut self) {
        if self.state.status == Status::Stopped {
            return;
        }
        self.backend.stop();
        self.reset_to_stopped();
    }

    fn step(&mut self, forward: bool) {
        let n = self.catalog.len();
        if n == 0 {
            return;
        }
        let base = self.state.current.unwrap_or(self.cursor) % n;
        let target = if forward { (base + 1) % n } else { (base + n - 1) % n };
        self.start(target);
    }

    /// Load and play `index`, skipping forward past tracks that fail to load.
    fn start(&mut self, index: usize) {
        let catalog = Arc::clone(&self.catalog);
        let n = catalog.len();
        if n == 0 {
            return;
        }

        let mut i = index % n;
        loop {
            let track = &catalog.tracks()[i];
            match self.backend.load(track) {
                Ok(()) => {
                    self.consecutive_failures = 0;
                    self.cursor = i;
                    self.seek_offset = 0.0;
                    self.backend.play();
                    self.state.status = Status::Playing;
                    self.state.current = Some(i);
                    self.state.elapsed = 0.0;
                    self.state.fault = None;
                    debug!(index = i, track = %track.display, "track started");
                    return;
                }
                Err(err) => {
                    self.state.load_errors += 1;
                    self.consecutive_failures += 1;
                    warn!(index = i, error = %err, "failed to load track");

                    if self.consecutive_failures >= self.max_load_retries {
                        warn!(
                            failures = self.consecutive_failures,
                            "load retry budget exhausted, stopping playback"
                        );
                        self.consecutive_failures = 0;
                        self.backend.stop();
                        self.reset_to_stopped();
                        self.state.fault = Some(Fault::LoadRetriesExhausted);
                        return;
                    }
                    i = (i + 1) % n;
                }
            }
        }
    }

    fn seek(&mut self, delta: f64) {
        if self.state.status == Status::Stopped || !delta.is_finite() {
            return;
        }

        let mut target = (self.state.elapsed + delta).max(0.0);
        if let Some(d) = self.current_track().and_then(Track::duration_secs) {
            target = target.min(d);
        }

        if !self.state.seek_degraded {
            match self.backend.seek(target) {
                Ok(()) => {
                    self.seek_offset = 0.0;
                    self.state.elapsed = target;
                    return;
                }
                Err(err) => {
                    warn!(error = %err, "seeking degraded to clock offset");
                    self.state.seek_degraded = true;
                }
            }
        }

        if let Some(pos) = self.backend.query_position() {
            self.seek_offset = target - pos;
        }
        self.state.elapsed = target;
    }

    fn nudge_volume(&mut self, direction: f32) {
        let step = self.volume_step;
        let slot = (self.state.volume / step).round() + direction;
        let volume = (slot * step).clamp(0.0, 1.0);
        self.state.volume = volume;
        self.backend.set_volume(volume);
    }

    fn on_track_end(&mut self) {
        let Some(i) = self.state.current else {
            return;
        };
        debug!(index = i, loop_mode = ?self.state.loop_mode, "track finished");

        match self.state.loop_mode {
            LoopMode::LoopOne => self.start(i),
            LoopMode::LoopAll => self.step(true),
            LoopMode::NoLoop => {
                if i + 1 >= self.catalog.len() {
                    self.backend.stop();
                    self.reset_to_stopped();
                    self.cursor = 0;
                } else {
                    self.step(true);
                }
            }
        }
    }

    fn reset_to_stopped(&mut self) {
        self.state.status = Status::Stopped;
        self.state.current = None;
        self.state.elapsed = 0.0;
        self.seek_offset = 0.0;
    }
}
