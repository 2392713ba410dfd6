use std::path::Path;

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::{Catalog, Track};

fn is_audio_file(path: &Path, settings: &LibrarySettings) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_ascii_lowercase();

    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.'))
        .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(&ext))
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

/// Drop a leading track number such as `01 - `, `7.` or `03 ` from a file stem.
///
/// Stems that are nothing but a number are left untouched.
pub(super) fn strip_track_number(stem: &str) -> &str {
    let digits = stem.len() - stem.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return stem;
    }

    let rest = &stem[digits..];
    let trimmed = rest.trim_start_matches([' ', '.', '-', '_']);
    if trimmed.len() == rest.len() || trimmed.is_empty() {
        stem
    } else {
        trimmed
    }
}

fn read_track(path: &Path, settings: &LibrarySettings) -> Track {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("UNKNOWN");
    let mut track = Track::untagged(path, strip_track_number(stem));
    track.display.clear();

    match lofty::read_from_path(path) {
        Ok(tagged) => {
            track.duration = Some(tagged.properties().duration());

            if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                if let Some(v) = tag.title().filter(|v| !v.trim().is_empty()) {
                    track.title = v.trim().to_string();
                }
                track.artist = tag
                    .artist()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
                track.album = tag
                    .album()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty());
            }
        }
        Err(e) => debug!(path = %path.display(), error = %e, "no readable tags"),
    }

    track.display = display_from_fields(&track, &settings.display_fields, &settings.display_separator);
    track
}

/// Walk `dir` and build the catalog, sorted case-insensitively by display string.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Catalog {
    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.path().is_file() && is_audio_file(e.path(), settings))
        .map(|e| read_track(e.path(), settings))
        .collect();

    tracks.sort_by_cached_key(|t| t.display.to_lowercase());
    info!(dir = %dir.display(), tracks = tracks.len(), "library scanned");
    Catalog::new(tracks)
}
