use std::time::Duration;

use crate::PlayerError;

/// Upper bound for a single note so deadline arithmetic cannot overflow.
const LONGEST_NOTE: Duration = Duration::from_secs(24 * 60 * 60);

/// Beats per minute. Always finite and positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Tempo(f64);

impl Tempo {
    pub const DEFAULT: Tempo = Tempo(144.0);

    pub fn new(bpm: f64) -> Result<Self, PlayerError> {
        if bpm.is_finite() && bpm > 0.0 {
            Ok(Self(bpm))
        } else {
            Err(PlayerError::InvalidTempo(bpm))
        }
    }

    pub fn bpm(self) -> f64 {
        self.0
    }

    /// Milliseconds in one beat.
    pub fn beat_ms(self) -> f64 {
        60_000.0 / self.0
    }

    /// How long a note of `value` beats lasts at this tempo.
    pub fn note_duration(self, value: f64) -> Duration {
        let ms = self.beat_ms() * value;
        Duration::try_from_secs_f64(ms / 1_000.0)
            .unwrap_or(LONGEST_NOTE)
            .min(LONGEST_NOTE)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}
