use std::ops::ControlFlow;
use std::thread;
use std::time::{Duration, Instant};

use crate::PlayerError;

pub const DEFAULT_CLOCK_RATE_HZ: f64 = 1000.0;

pub(crate) fn validate_rate(rate_hz: f64) -> Result<f64, PlayerError> {
    if rate_hz.is_finite() && rate_hz > 0.0 {
        Ok(rate_hz)
    } else {
        Err(PlayerError::InvalidClockRate(rate_hz))
    }
}

/// Fixed-rate tick source. Ticks run on the caller's thread, one at a time.
///
/// Deadlines are absolute (`start + n * period`), so sleep jitter does not
/// accumulate. A tick that arrives more than one period late resynchronises
/// the schedule to the present rather than firing a burst of catch-up ticks.
#[derive(Debug, Clone, Copy)]
pub struct MasterClock {
    rate_hz: f64,
    period: Duration,
}

impl MasterClock {
    pub fn new(rate_hz: f64) -> Result<Self, PlayerError> {
        let rate_hz = validate_rate(rate_hz)?;
        let period = Duration::try_from_secs_f64(1.0 / rate_hz)
            .map_err(|_| PlayerError::InvalidClockRate(rate_hz))?;
        if period.is_zero() {
            return Err(PlayerError::InvalidClockRate(rate_hz));
        }
        Ok(Self { rate_hz, period })
    }

    pub fn rate_hz(&self) -> f64 {
        self.rate_hz
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Calls `on_tick` once per period until it returns `Break`.
    pub fn run<F>(&self, mut on_tick: F)
    where
        F: FnMut(Instant) -> ControlFlow<()>,
    {
        let mut next = Instant::now() + self.period;

        loop {
            let now = Instant::now();
            if now < next {
                thread::sleep(next - now);
            }

            if on_tick(Instant::now()).is_break() {
                return;
            }

            next += self.period;
            let after = Instant::now();
            if after.saturating_duration_since(next) > self.period {
                tracing::trace!(
                    behind_us = after.duration_since(next).as_micros() as u64,
                    "clock fell behind, resynchronising"
                );
                next = after;
            }
        }
    }
}

impl Default for MasterClock {
    fn default() -> Self {
        Self {
            rate_hz: DEFAULT_CLOCK_RATE_HZ,
            period: Duration::from_millis(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_clock_is_one_kilohertz() {
        let clock = MasterClock::default();
        assert_eq!(clock.rate_hz(), 1000.0);
        assert_eq!(clock.period(), Duration::from_millis(1));
        assert_eq!(
            MasterClock::new(1000.0).unwrap().period(),
            Duration::from_millis(1)
        );
    }

    #[test]
    fn rejects_invalid_rates() {
        assert!(MasterClock::new(0.0).is_err());
        assert!(MasterClock::new(-1.0).is_err());
        assert!(MasterClock::new(f64::NAN).is_err());
        assert!(MasterClock::new(f64::INFINITY).is_err());
    }

    #[test]
    fn ticks_are_ordered_and_paced() {
        let clock = MasterClock::new(1000.0).unwrap();
        let mut stamps = Vec::new();
        let started = Instant::now();

        clock.run(|now| {
            stamps.push(now);
            if stamps.len() == 20 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });

        assert_eq!(stamps.len(), 20);
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
        // Twenty ticks at 1 ms cannot complete in less than 20 ms.
        assert!(started.elapsed() >= Duration::from_millis(20));
    }
}
