use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// The physical output driven by the tone pulser. Invoked synchronously from
/// the tick handler, so implementations must not block.
pub trait Actuator {
    fn pulse(&mut self);
}

impl<F: FnMut()> Actuator for F {
    fn pulse(&mut self) {
        self()
    }
}

/// Counts pulses in a shared atomic so another thread can render them.
#[derive(Debug, Clone, Default)]
pub struct PulseMeter {
    count: Arc<AtomicU64>,
}

impl PulseMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Actuator for PulseMeter {
    fn pulse(&mut self) {
        self.count.fetch_add(1, Ordering::Relaxed);
    }
}
