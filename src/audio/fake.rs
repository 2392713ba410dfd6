//! Scriptable in-memory backend used by the controller and loop tests.

use std::collections::HashSet;
use std::io;
use std::path::PathBuf;

use crate::library::Track;

use super::types::{AudioBackend, LoadError, SeekUnsupported};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load(PathBuf),
    Play,
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
    Seek(f64),
    Close,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub calls: Vec<Call>,
    /// Paths whose load fails with a missing-file error.
    pub failing: HashSet<PathBuf>,
    pub fail_all: bool,
    /// Reported by `query_position`; `None` leaves the controller on its own clock.
    pub position: Option<f64>,
    pub finished: bool,
    pub seekable: bool,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            failing: paths.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Recorded calls without `SetVolume`.
    pub fn transport(&self) -> Vec<Call> {
        self.calls
            .iter()
            .filter(|c| !matches!(c, Call::SetVolume(_)))
            .cloned()
            .collect()
    }

    pub fn loads(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, Call::Load(_)))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl AudioBackend for FakeBackend {
    fn load(&mut self, track: &Track) -> Result<(), LoadError> {
        self.calls.push(Call::Load(track.path.clone()));
        if self.fail_all || self.failing.contains(&track.path) {
            return Err(LoadError::Open {
                path: track.path.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            });
        }
        self.finished = false;
        if self.position.is_some() {
            self.position = Some(0.0);
        }
        Ok(())
    }

    fn play(&mut self) {
        self.calls.push(Call::Play);
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn resume(&mut self) {
        self.calls.push(Call::Resume);
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
    }

    fn set_volume(&mut self, volume: f32) {
        self.calls.push(Call::SetVolume(volume));
    }

    fn query_position(&self) -> Option<f64> {
        self.position
    }

    fn is_finished(&self) -> bool {
        self.finished
    }

    fn seek(&mut self, position: f64) -> Result<(), SeekUnsupported> {
        self.calls.push(Call::Seek(position));
        if !self.seekable {
            return Err(SeekUnsupported);
        }
        if self.position.is_some() {
            self.position = Some(position);
        }
        Ok(())
    }

    fn close(&mut self) {
        self.calls.push(Call::Close);
    }
}
