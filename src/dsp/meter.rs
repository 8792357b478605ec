//! # Peak Meters
//!
//! The audio thread records the loudest output sample it has produced, and
//! a display thread periodically collects that value and starts a new
//! measurement. The two threads run at unrelated rates, so the hand-off is
//! a single atomic `f32` per channel: no locks, no torn reads.

use portable_atomic::{AtomicF32, Ordering};

/// Max-hold accumulator for one channel.
#[derive(Debug)]
pub struct PeakMeter {
    value: AtomicF32,
}

impl Default for PeakMeter {
    fn default() -> Self {
        Self::new()
    }
}

impl PeakMeter {
    pub const fn new() -> Self {
        Self {
            value: AtomicF32::new(0.0),
        }
    }

    pub fn reset(&self) {
        self.value.store(0.0, Ordering::Relaxed);
    }

    /// Raise the stored peak to `candidate` if it is larger.
    ///
    /// Uses a compare-and-swap loop rather than a load/store pair: if the
    /// display thread drains the meter between our load and our store, the
    /// CAS fails, we reload the freshly reset value and try again, so no
    /// measurement is lost or resurrected.
    pub fn update_if_greater(&self, candidate: f32) {
        let mut current = self.value.load(Ordering::Relaxed);
        while candidate > current {
            match self.value.compare_exchange_weak(
                current,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Return the peak since the last call and start over from zero.
    pub fn read_and_reset(&self) -> f32 {
        self.value.swap(0.0, Ordering::Relaxed)
    }

    /// Look at the current peak without resetting it.
    pub fn peek(&self) -> f32 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Left and right output peaks, shared between the processor and readers.
#[derive(Debug, Default)]
pub struct StereoPeakMeter {
    pub left: PeakMeter,
    pub right: PeakMeter,
}

impl StereoPeakMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.left.reset();
        self.right.reset();
    }

    /// Drain both channels, returning `(left, right)`.
    pub fn read_and_reset(&self) -> (f32, f32) {
        (self.left.read_and_reset(), self.right.read_and_reset())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_keeps_the_maximum() {
        let meter = PeakMeter::new();

        meter.update_if_greater(0.3);
        meter.update_if_greater(0.7);
        meter.update_if_greater(0.5);
        meter.update_if_greater(0.1);

        assert_eq!(meter.peek(), 0.7);
    }

    #[test]
    fn test_read_and_reset_returns_max_then_zero() {
        let meter = PeakMeter::new();
        meter.update_if_greater(0.9);

        assert_eq!(meter.read_and_reset(), 0.9);
        assert_eq!(meter.read_and_reset(), 0.0);

        meter.update_if_greater(0.2);
        assert_eq!(meter.read_and_reset(), 0.2);
    }

    /// Hammering the meter with lower values from several threads never
    /// pulls the stored peak down.
    #[test]
    fn test_concurrent_lower_values_never_decrease_peak() {
        let meter = Arc::new(PeakMeter::new());
        meter.update_if_greater(0.8);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let meter = Arc::clone(&meter);
                thread::spawn(move || {
                    for i in 0..10_000 {
                        meter.update_if_greater(((i + t) % 80) as f32 / 100.0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(meter.read_and_reset(), 0.8);
    }

    /// Concurrent writers racing to set the peak agree on the true max.
    #[test]
    fn test_concurrent_writers_find_true_max() {
        let meter = Arc::new(PeakMeter::new());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let meter = Arc::clone(&meter);
                thread::spawn(move || {
                    for i in 0..1000 {
                        meter.update_if_greater((t * 1000 + i) as f32 / 4000.0);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(meter.read_and_reset(), 3999.0 / 4000.0);
    }

    #[test]
    fn test_stereo_meter_channels_are_independent() {
        let meters = StereoPeakMeter::new();
        meters.left.update_if_greater(0.4);
        meters.right.update_if_greater(0.6);

        assert_eq!(meters.read_and_reset(), (0.4, 0.6));
        assert_eq!(meters.read_and_reset(), (0.0, 0.0));
    }
}
