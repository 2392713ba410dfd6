use crate::config::TrackDisplayField;

use super::model::Track;

fn non_blank(s: &str) -> Option<&str> {
    let s = s.trim();
    (!s.is_empty()).then_some(s)
}

/// Join the requested `fields` of `track` with `sep`.
///
/// Blank fields are skipped. When nothing is produced the title is returned so
/// the caller always has something to show. `Display` uses the precomputed
/// display string, or "artist, title" while that string is still empty
/// (which is the case during scanning).
pub fn display_from_fields(track: &Track, fields: &[TrackDisplayField], sep: &str) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(fields.len());

    for field in fields {
        match field {
            TrackDisplayField::Display => {
                if let Some(d) = non_blank(&track.display) {
                    parts.push(d.to_string());
                } else {
                    parts.extend(track.artist.as_deref().and_then(non_blank).map(str::to_string));
                    parts.extend(non_blank(&track.title).map(str::to_string));
                }
            }
            TrackDisplayField::Title => {
                parts.extend(non_blank(&track.title).map(str::to_string));
            }
            TrackDisplayField::Artist => {
                parts.extend(track.artist.as_deref().and_then(non_blank).map(str::to_string));
            }
            TrackDisplayField::Album => {
                parts.extend(track.album.as_deref().and_then(non_blank).map(str::to_string));
            }
            TrackDisplayField::Filename => {
                parts.extend(
                    track
                        .path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(non_blank)
                        .map(str::to_string),
                );
            }
            TrackDisplayField::Path => parts.push(track.path.display().to_string()),
        }
    }

    if parts.is_empty() {
        track.title.clone()
    } else {
        parts.join(sep)
    }
}
