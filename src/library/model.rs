use std::path::{Path, PathBuf};
use std::time::Duration;

/// One playable entry of the catalog.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub duration: Option<Duration>,
    pub display: String,
    /// Stable per-track value feeding the visualizer, derived from `path`.
    pub seed: u64,
}

impl Track {
    /// Build a track with no tag metadata; `title` doubles as display string.
    pub fn untagged(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        let path = path.into();
        let title = title.into();
        Self {
            seed: track_seed(&path),
            display: title.clone(),
            path,
            title,
            artist: None,
            album: None,
            duration: None,
        }
    }

    /// Duration in seconds, when known and non-zero.
    pub fn duration_secs(&self) -> Option<f64> {
        self.duration
            .map(|d| d.as_secs_f64())
            .filter(|secs| *secs > 0.0)
    }
}

/// FNV-1a over the path bytes.
pub fn track_seed(path: &Path) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    path.to_string_lossy()
        .bytes()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(b)).wrapping_mul(PRIME))
}

/// Ordered, immutable list of tracks.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}
