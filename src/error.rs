use std::path::PathBuf;

use thiserror::Error;

/// Rejected control-surface input. The tick path itself never fails.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    #[error("tempo must be a positive number of beats per minute, got {0}")]
    InvalidTempo(f64),
    #[error("song index {index} is out of range for a library of {len} songs")]
    SongIndexOutOfRange { index: usize, len: usize },
    #[error("the song library is empty")]
    EmptyLibrary,
    #[error("clock rate must be a positive number of hertz, got {0}")]
    InvalidClockRate(f64),
}

#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed song library: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("failed to serialize song library: {0}")]
    Serialize(#[from] ron::Error),
    #[error("song {song:?}: {reason}")]
    InvalidSong { song: String, reason: String },
}
