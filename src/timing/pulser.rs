use crate::Actuator;

/// Software PWM against the master clock.
///
/// A note of frequency `f` pulses once every `floor(clock_rate / f)` ticks.
/// The floor is deliberate: the achieved rate is always one the clock can
/// represent exactly, so frequencies near the clock rate round downwards and
/// anything above it pulses on every tick.
#[derive(Debug, Clone)]
pub struct TonePulser {
    clock_rate_hz: f64,
    ticks_since_last_pulse: u64,
}

impl TonePulser {
    pub fn new(clock_rate_hz: f64) -> Self {
        Self {
            clock_rate_hz,
            ticks_since_last_pulse: 0,
        }
    }

    pub fn clock_rate_hz(&self) -> f64 {
        self.clock_rate_hz
    }

    pub fn ticks_since_last_pulse(&self) -> u64 {
        self.ticks_since_last_pulse
    }

    pub fn reset(&mut self) {
        self.ticks_since_last_pulse = 0;
    }

    /// Clock ticks between pulses, or `None` for a rest.
    pub fn ticks_per_pulse(&self, frequency: f64) -> Option<u64> {
        if frequency == 0.0 {
            return None;
        }
        Some((self.clock_rate_hz / frequency).floor() as u64)
    }

    /// Returns whether the actuator fired on this tick.
    pub fn on_tick<A: Actuator + ?Sized>(&mut self, frequency: f64, actuator: &mut A) -> bool {
        let Some(ticks_per_pulse) = self.ticks_per_pulse(frequency) else {
            return false;
        };
        let skip_threshold = ticks_per_pulse.saturating_sub(1);

        if self.ticks_since_last_pulse < skip_threshold {
            self.ticks_since_last_pulse += 1;
            return false;
        }

        tracing::trace!(frequency, "pulse");
        actuator.pulse();
        self.ticks_since_last_pulse = 0;
        true
    }
}
