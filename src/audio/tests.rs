use super::source::open_source;
use super::{AudioBackend, LoadError, SeekUnsupported};
use crate::library::Track;

#[test]
fn open_source_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nope.mp3");

    match open_source(&path) {
        Err(LoadError::Open { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected Open error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn open_source_rejects_non_audio_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("garbage.mp3");
    std::fs::write(&path, b"this is certainly not an audio stream").unwrap();

    let err = open_source(&path).map(|_| ()).unwrap_err();
    assert!(
        matches!(err, LoadError::Unsupported { .. } | LoadError::Decode { .. }),
        "unexpected error: {err}"
    );
}

#[test]
fn load_error_messages_name_the_file() {
    let err = LoadError::Unsupported {
        path: "/music/a.xyz".into(),
    };
    assert!(err.to_string().contains("/music/a.xyz"));
}

struct Minimal;

impl AudioBackend for Minimal {
    fn load(&mut self, _track: &Track) -> Result<(), LoadError> {
        Ok(())
    }
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn resume(&mut self) {}
    fn stop(&mut self) {}
    fn set_volume(&mut self, _volume: f32) {}
    fn query_position(&self) -> Option<f64> {
        None
    }
    fn is_finished(&self) -> bool {
        false
    }
}

#[test]
fn seek_is_unsupported_by_default() {
    let mut backend = Minimal;
    assert_eq!(backend.seek(10.0), Err(SeekUnsupported));
    backend.close();
}
