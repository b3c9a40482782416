mod clock;
mod pulser;
mod sequencer;
mod tempo;

pub use clock::{DEFAULT_CLOCK_RATE_HZ, MasterClock};
pub(crate) use clock::validate_rate;
pub use pulser::TonePulser;
pub use sequencer::{NoteSequencer, PlaybackState, TickOutcome};
pub use tempo::Tempo;
