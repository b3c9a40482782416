//! Note sequencer: walks a song's notes against wall-clock deadlines and
//! feeds the active note's frequency to the tone pulser on every tick.

use std::time::Instant;

use super::{Tempo, TonePulser};
use crate::{Actuator, Note};

#[derive(Debug, Clone, Copy, PartialEq)]
enum SequencerState {
    Idle,
    PlayingNote {
        note_index: usize,
        note: Note,
        deadline: Instant,
    },
}

/// Flat view of the sequencer for inspection and display.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackState {
    pub running: bool,
    pub note_index: usize,
    pub active_note: Option<Note>,
    pub note_deadline: Option<Instant>,
    pub ticks_since_last_pulse: u64,
}

impl PlaybackState {
    pub fn stopped() -> Self {
        Self {
            running: false,
            note_index: 0,
            active_note: None,
            note_deadline: None,
            ticks_since_last_pulse: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// A new note was loaded or the song finished on this tick.
    pub advanced: bool,
    pub pulsed: bool,
}

#[derive(Debug, Clone)]
pub struct NoteSequencer {
    state: SequencerState,
    pulser: TonePulser,
}

impl NoteSequencer {
    pub fn new(clock_rate_hz: f64) -> Self {
        Self {
            state: SequencerState::Idle,
            pulser: TonePulser::new(clock_rate_hz),
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, SequencerState::PlayingNote { .. })
    }

    pub fn active_note(&self) -> Option<(usize, Note)> {
        match self.state {
            SequencerState::Idle => None,
            SequencerState::PlayingNote {
                note_index, note, ..
            } => Some((note_index, note)),
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        match self.state {
            SequencerState::Idle => PlaybackState {
                ticks_since_last_pulse: self.pulser.ticks_since_last_pulse(),
                ..PlaybackState::stopped()
            },
            SequencerState::PlayingNote {
                note_index,
                note,
                deadline,
            } => PlaybackState {
                running: true,
                note_index,
                active_note: Some(note),
                note_deadline: Some(deadline),
                ticks_since_last_pulse: self.pulser.ticks_since_last_pulse(),
            },
        }
    }

    /// Restarts from the first note, whatever the current state.
    pub fn start(&mut self, notes: &[Note], tempo: Tempo, now: Instant) {
        self.enqueue(0, notes, tempo, now);
    }

    pub fn stop(&mut self) {
        if self.is_playing() {
            tracing::debug!("sequencer stopped");
        }
        self.state = SequencerState::Idle;
        self.pulser.reset();
    }

    /// Advances past an elapsed deadline, then pulses for whichever note is
    /// active afterwards. A tick that finishes the song never pulses.
    pub fn on_tick<A: Actuator + ?Sized>(
        &mut self,
        notes: &[Note],
        tempo: Tempo,
        now: Instant,
        actuator: &mut A,
    ) -> TickOutcome {
        let SequencerState::PlayingNote {
            note_index,
            deadline,
            ..
        } = self.state
        else {
            return TickOutcome::default();
        };

        let mut outcome = TickOutcome::default();
        if now > deadline {
            self.enqueue(note_index + 1, notes, tempo, now);
            outcome.advanced = true;
        }

        if let SequencerState::PlayingNote { note, .. } = self.state {
            outcome.pulsed = self.pulser.on_tick(note.frequency, actuator);
        }

        outcome
    }

    fn enqueue(&mut self, index: usize, notes: &[Note], tempo: Tempo, now: Instant) {
        let Some(&note) = notes.get(index) else {
            tracing::info!(notes = notes.len(), "song complete");
            self.stop();
            return;
        };

        let duration = tempo.note_duration(note.value);
        tracing::debug!(
            index,
            frequency = note.frequency,
            value = note.value,
            duration_ms = duration.as_secs_f64() * 1_000.0,
            "next note"
        );

        self.pulser.reset();
        self.state = SequencerState::PlayingNote {
            note_index: index,
            note,
            deadline: now + duration,
        };
    }
}
