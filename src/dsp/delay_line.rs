//! # Delay Line (Ring Buffer)
//!
//! A delay line stores audio samples and lets you read them back after a
//! specified time delay. It is the "tape loop" at the heart of the echo.
//!
//! ## Write, Then Read
//!
//! Every sample the write head first moves forward one slot (wrapping at
//! the end of the buffer) and then stores the incoming sample there. Reads
//! are measured backward from that freshly written slot:
//!
//! ```text
//! read(0)  → the sample just written
//! read(1)  → the sample written one step earlier
//! read(N)  → the sample written N steps earlier
//! ```
//!
//! Because a read of `N` samples needs `N + 1` stored slots (the current
//! one plus `N` older ones), the buffer is always one slot longer than the
//! longest delay it has to serve.
//!
//! ## Linear Interpolation
//!
//! Delay times rarely land on whole samples (100.3 ms at 44.1 kHz is
//! 4423.23 samples), so a read blends the two slots that bracket the
//! fractional position:
//!
//! ```text
//! A = integer part behind the write head
//! B = one slot further back (older)
//! result = A + fraction * (B - A)
//! ```
//!
//! With a fraction of zero this is exactly `A`, so whole-sample delays
//! come back bit-for-bit.

use std::num::NonZeroUsize;

use nih_plug::nih_debug_assert;

/// A ring buffer with fractional (linearly interpolated) reads.
///
/// The buffer starts empty and is sized by [`set_capacity()`](Self::set_capacity)
/// during the plugin's `initialize()`, so the audio thread never allocates.
pub struct DelayLine {
    /// The circular buffer of stored samples.
    buffer: Vec<f32>,

    /// Index of the most recently written sample.
    write_pos: usize,
}

impl Default for DelayLine {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayLine {
    /// Create an empty delay line. It must be given a capacity before use.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            write_pos: 0,
        }
    }

    /// Make room for delays of up to `max_delay_samples`.
    ///
    /// The buffer only ever grows. If it is already large enough (for
    /// example when the host switches from 96 kHz back to 48 kHz) this does
    /// nothing, which keeps the old allocation around for the next time the
    /// sample rate goes up. Growing the buffer discards its contents.
    ///
    /// Taking a `NonZeroUsize` turns "capacity must be positive" into a
    /// compile-time guarantee instead of a runtime check.
    pub fn set_capacity(&mut self, max_delay_samples: NonZeroUsize) {
        let padded_len = max_delay_samples.get() + 1;

        if self.buffer.len() < padded_len {
            self.buffer = vec![0.0; padded_len];
            self.write_pos = padded_len - 1;
        }
    }

    /// Number of slots in the buffer (`max_delay_samples + 1`).
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// The longest delay, in samples, that [`read()`](Self::read) accepts.
    pub fn max_delay(&self) -> f32 {
        self.buffer.len().saturating_sub(1) as f32
    }

    /// Silence the buffer and park the write head on the last slot, so the
    /// next [`write()`](Self::write) lands at index 0.
    pub fn reset(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = self.buffer.len().saturating_sub(1);
    }

    /// Advance the write head by one slot and store `sample` there.
    pub fn write(&mut self, sample: f32) {
        let len = self.buffer.len();
        nih_debug_assert!(len > 0, "DelayLine::write() called before set_capacity()");
        if len == 0 {
            return;
        }

        self.write_pos += 1;
        if self.write_pos >= len {
            self.write_pos = 0;
        }

        self.buffer[self.write_pos] = sample;
    }

    /// Read the sample `delay_samples` behind the most recent write, using
    /// linear interpolation for the fractional part.
    ///
    /// `delay_samples` must lie in `0.0..=max_delay()`. The processor clamps
    /// every delay before it gets here; an out-of-range value trips a debug
    /// assertion and is clamped in release builds.
    pub fn read(&self, delay_samples: f32) -> f32 {
        let len = self.buffer.len();
        if len == 0 {
            return 0.0;
        }

        let max_delay = (len - 1) as f32;
        nih_debug_assert!(
            (0.0..=max_delay).contains(&delay_samples),
            "delay of {} samples is outside 0..={}",
            delay_samples,
            max_delay
        );
        let delay = delay_samples.clamp(0.0, max_delay);

        // For delay = 441.3: integer_delay = 441, fraction = 0.3
        let integer_delay = delay as usize;
        let fraction = delay - integer_delay as f32;

        // Adding `len` before subtracting keeps the usize arithmetic
        // from underflowing.
        let index_a = (self.write_pos + len - integer_delay) % len;
        let index_b = (index_a + len - 1) % len;

        let sample_a = self.buffer[index_a];
        let sample_b = self.buffer[index_b];

        sample_a + fraction * (sample_b - sample_a)
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
