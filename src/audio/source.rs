//! Opening and decoding audio files into rodio sources.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use rodio::Decoder;
use rodio::decoder::DecoderError;

use super::types::LoadError;

pub(super) type FileSource = Decoder<BufReader<File>>;

/// Open `path` and probe its format.
pub(super) fn open_source(path: &Path) -> Result<FileSource, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    Decoder::new(BufReader::new(file)).map_err(|err| match err {
        DecoderError::UnrecognizedFormat => LoadError::Unsupported {
            path: path.to_path_buf(),
        },
        other => LoadError::Decode {
            path: path.to_path_buf(),
            reason: other.to_string(),
        },
    })
}
