use std::time::Instant;

use crate::timing::{NoteSequencer, PlaybackState, Tempo, TickOutcome, validate_rate};
use crate::{Actuator, Note, PlayerError, Song, SongRepository};

/// User-adjustable settings. Tempo is read whenever a note starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub tempo: Tempo,
    pub song_index: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tempo: Tempo::DEFAULT,
            song_index: 0,
        }
    }
}

/// Control surface over the note sequencer. Every song switch goes through
/// `stop()` first, so playback never continues mid-note into another song.
pub struct Player<R> {
    songs: R,
    config: Config,
    sequencer: NoteSequencer,
}

impl<R: SongRepository> Player<R> {
    pub fn new(songs: R, clock_rate_hz: f64) -> Result<Self, PlayerError> {
        let clock_rate_hz = validate_rate(clock_rate_hz)?;
        Ok(Self {
            songs,
            config: Config::default(),
            sequencer: NoteSequencer::new(clock_rate_hz),
        })
    }

    pub fn songs(&self) -> &R {
        &self.songs
    }

    pub fn config(&self) -> Config {
        self.config
    }

    pub fn tempo(&self) -> Tempo {
        self.config.tempo
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.songs.list_songs().get(self.config.song_index)
    }

    pub fn is_playing(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_note(&self) -> Option<(usize, Note)> {
        self.sequencer.active_note()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.sequencer.playback_state()
    }

    /// Plays the selected song from its first note. Restarts if already playing.
    pub fn start(&mut self, now: Instant) -> Result<(), PlayerError> {
        let songs = self.songs.list_songs();
        let song = songs
            .get(self.config.song_index)
            .ok_or(match songs.len() {
                0 => PlayerError::EmptyLibrary,
                len => PlayerError::SongIndexOutOfRange {
                    index: self.config.song_index,
                    len,
                },
            })?;

        tracing::info!(song = %song.name, tempo = self.config.tempo.bpm(), "start");
        self.sequencer.start(&song.notes, self.config.tempo, now);
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.sequencer.is_playing() {
            tracing::info!("stop");
        }
        self.sequencer.stop();
    }

    /// Starts when idle, stops when playing. Returns whether it is now playing.
    pub fn toggle(&mut self, now: Instant) -> Result<bool, PlayerError> {
        if self.is_playing() {
            self.stop();
        } else {
            self.start(now)?;
        }
        Ok(self.is_playing())
    }

    /// Takes effect from the next note; the sounding note keeps its deadline.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), PlayerError> {
        let tempo = Tempo::new(bpm).inspect_err(|_| tracing::warn!(bpm, "rejected tempo"))?;
        self.config.tempo = tempo;
        Ok(())
    }

    /// Stops playback, switches song and adopts the song's default tempo.
    pub fn set_song_index(&mut self, index: usize) -> Result<(), PlayerError> {
        let songs = self.songs.list_songs();
        let Some(song) = songs.get(index) else {
            tracing::warn!(index, len = songs.len(), "rejected song index");
            return Err(PlayerError::SongIndexOutOfRange {
                index,
                len: songs.len(),
            });
        };
        let tempo = Tempo::new(song.default_tempo)?;
        tracing::info!(index, song = %song.name, "song selected");

        self.stop();
        self.config = Config {
            tempo,
            song_index: index,
        };
        Ok(())
    }

    /// Swaps in a new repository. Playback stops; the selection survives when
    /// it still points at a song.
    pub fn replace_songs(&mut self, songs: R) {
        self.stop();
        self.songs = songs;
        if self.config.song_index >= self.songs.list_songs().len() {
            self.config.song_index = 0;
        }
    }

    pub fn on_tick<A: Actuator + ?Sized>(&mut self, now: Instant, actuator: &mut A) -> TickOutcome {
        if !self.sequencer.is_playing() {
            return TickOutcome::default();
        }
        let notes = self
            .songs
            .list_songs()
            .get(self.config.song_index)
            .map(|song| song.notes.as_slice())
            .unwrap_or_default();
        self.sequencer.on_tick(notes, self.config.tempo, now, actuator)
    }
}
