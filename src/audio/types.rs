//! Backend trait and the errors it reports.

use std::path::PathBuf;

use thiserror::Error;

use crate::library::Track;

/// Why a track could not be prepared for playback.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported audio format: {path:?}")]
    Unsupported { path: PathBuf },
    #[error("cannot decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
}

/// No usable audio output device.
#[derive(Debug, Error)]
#[error("audio output unavailable: {0}")]
pub struct BackendUnavailable(pub String);

/// The backend cannot reposition within the current track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("seeking is not supported by this backend")]
pub struct SeekUnsupported;

/// Single-track transport driven by the playback controller.
///
/// All calls return promptly; `load` may touch the filesystem to open and
/// probe the file but never waits on the output device.
pub trait AudioBackend {
    /// Prepare `track` for playback, replacing whatever was loaded. The track
    /// stays paused until [`AudioBackend::play`].
    fn load(&mut self, track: &Track) -> Result<(), LoadError>;

    fn play(&mut self);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Drop the loaded track.
    fn stop(&mut self);

    fn set_volume(&mut self, volume: f32);

    /// Seconds into the loaded track, if the backend can tell.
    fn query_position(&self) -> Option<f64>;

    /// True once the loaded track has played to its end.
    fn is_finished(&self) -> bool;

    /// Jump to an absolute position in seconds.
    fn seek(&mut self, _position: f64) -> Result<(), SeekUnsupported> {
        Err(SeekUnsupported)
    }

    /// Release the output device. Called once at shutdown.
    fn close(&mut self) {}
}
