use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::LibraryError;

const BUNDLED_LIBRARY: &str = include_str!("../assets/songs.ron");

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    /// Hz, 0.0 is a rest
    pub frequency: f64,
    /// Beats
    pub value: f64,
}

impl Note {
    pub fn new(frequency: f64, value: f64) -> Self {
        Self { frequency, value }
    }

    pub fn rest(value: f64) -> Self {
        Self::new(0.0, value)
    }

    pub fn is_rest(&self) -> bool {
        self.frequency == 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub name: String,
    /// Beats per minute
    pub default_tempo: f64,
    pub notes: Vec<Note>,
}

impl Song {
    fn validate(&self) -> Result<(), LibraryError> {
        let invalid = |reason: String| LibraryError::InvalidSong {
            song: self.name.clone(),
            reason,
        };

        if !(self.default_tempo.is_finite() && self.default_tempo > 0.0) {
            return Err(invalid(format!(
                "default tempo {} is not a positive BPM",
                self.default_tempo
            )));
        }

        for (i, note) in self.notes.iter().enumerate() {
            if !(note.frequency.is_finite() && note.frequency >= 0.0) {
                return Err(invalid(format!(
                    "note {} has invalid frequency {}",
                    i, note.frequency
                )));
            }
            if !(note.value.is_finite() && note.value > 0.0) {
                return Err(invalid(format!("note {} has invalid value {}", i, note.value)));
            }
        }

        Ok(())
    }
}

/// Read-only source of songs for the player.
pub trait SongRepository {
    fn list_songs(&self) -> &[Song];
}

impl<R: SongRepository + ?Sized> SongRepository for Arc<R> {
    fn list_songs(&self) -> &[Song] {
        (**self).list_songs()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SongLibrary {
    pub songs: Vec<Song>,
}

impl SongLibrary {
    pub fn new(songs: Vec<Song>) -> Result<Self, LibraryError> {
        let library = Self { songs };
        library.validate()?;
        Ok(library)
    }

    pub fn bundled() -> Result<Self, LibraryError> {
        Self::from_ron(BUNDLED_LIBRARY)
    }

    pub fn from_ron(source: &str) -> Result<Self, LibraryError> {
        let library: SongLibrary = ron::from_str(source)?;
        library.validate()?;
        Ok(library)
    }

    pub fn load(path: &Path) -> Result<Self, LibraryError> {
        let source = fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_ron(&source)
    }

    pub fn save(&self, path: &Path) -> Result<(), LibraryError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, ron_string).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn names(&self) -> Vec<String> {
        self.songs.iter().map(|s| s.name.clone()).collect()
    }

    fn validate(&self) -> Result<(), LibraryError> {
        self.songs.iter().try_for_each(Song::validate)
    }
}

impl SongRepository for SongLibrary {
    fn list_songs(&self) -> &[Song] {
        &self.songs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_library_parses() {
        let library = SongLibrary::bundled().unwrap();
        assert!(!library.list_songs().is_empty());
        for song in library.list_songs() {
            assert!(!song.notes.is_empty(), "{} has no notes", song.name);
        }
    }

    #[test]
    fn parses_library_with_rest() {
        let input = r#"
            SongLibrary(
                songs: [
                    Song(
                        name: "Two",
                        default_tempo: 150.0,
                        notes: [
                            (frequency: 100.0, value: 1.0),
                            (frequency: 0.0, value: 0.5),
                        ],
                    ),
                ],
            )
        "#;

        let library = SongLibrary::from_ron(input).unwrap();
        assert_eq!(library.names(), vec!["Two".to_string()]);
        let notes = &library.songs[0].notes;
        assert_eq!(notes[0], Note::new(100.0, 1.0));
        assert!(notes[1].is_rest());
        assert_eq!(notes[1].value, 0.5);
    }

    #[test]
    fn rejects_negative_frequency() {
        let song = Song {
            name: "Bad".into(),
            default_tempo: 120.0,
            notes: vec![Note::new(-5.0, 1.0)],
        };
        match SongLibrary::new(vec![song]) {
            Err(LibraryError::InvalidSong { song, .. }) => assert_eq!(song, "Bad"),
            other => panic!("expected InvalidSong, got {:?}", other),
        }
    }

    #[test]
    fn rejects_zero_value_and_zero_tempo() {
        let zero_value = Song {
            name: "Zero value".into(),
            default_tempo: 120.0,
            notes: vec![Note::new(440.0, 0.0)],
        };
        assert!(SongLibrary::new(vec![zero_value]).is_err());

        let zero_tempo = Song {
            name: "Zero tempo".into(),
            default_tempo: 0.0,
            notes: vec![Note::new(440.0, 1.0)],
        };
        assert!(SongLibrary::new(vec![zero_tempo]).is_err());
    }

    #[test]
    fn malformed_input_is_a_parse_error() {
        assert!(matches!(
            SongLibrary::from_ron("SongLibrary(songs: [Song(name: 3)])"),
            Err(LibraryError::Parse(_))
        ));
    }

    #[test]
    fn save_then_load_from_disk() {
        let path = std::env::temp_dir().join(format!("tickpulse-{}.ron", std::process::id()));
        let library = SongLibrary::new(vec![Song {
            name: "Saved".into(),
            default_tempo: 90.0,
            notes: vec![Note::new(220.0, 2.0), Note::rest(1.0)],
        }])
        .unwrap();

        library.save(&path).unwrap();
        let loaded = SongLibrary::load(&path).unwrap();
        let _ = fs::remove_file(&path);

        assert_eq!(loaded, library);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = SongLibrary::load(Path::new("/nonexistent/tickpulse/songs.ron"));
        assert!(matches!(result, Err(LibraryError::Io { .. })));
    }
}
