//! # Feedback Tone Filters
//!
//! Two one-pole filters shape the echoes as they circulate through the
//! feedback loop:
//!
//! - **Low cut** (highpass) removes rumble and mud below its cutoff, so
//!   long feedback tails don't build up bass.
//! - **High cut** (lowpass) tames brightness above its cutoff, so each
//!   repeat gets a little darker, like a tape or bucket-brigade echo.
//!
//! ## The One-Pole Lowpass
//!
//! ```text
//! y[n] = (1 - a) * x[n] + a * y[n-1]
//! a    = e^(-2π * cutoff_hz / sample_rate)
//! ```
//!
//! A weighted average of the new input and the previous output. Higher
//! `a` means more smoothing, i.e. a lower cutoff.
//!
//! ## The One-Pole Highpass
//!
//! Whatever the lowpass removes is exactly the high-frequency part of the
//! signal, so the highpass is simply the difference:
//!
//! ```text
//! highpass[n] = x[n] - lowpass[n]
//! ```
//!
//! Both stages roll off at 6 dB/octave, which is gentle enough that the
//! filters can sit inside the feedback loop without making the repeats
//! sound hollow.

use std::f32::consts::PI;

/// Which half of the spectrum a [`OnePoleFilter`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Keep everything below the cutoff.
    LowPass,
    /// Keep everything above the cutoff.
    HighPass,
}

/// A one-pole (6 dB/octave) lowpass or highpass filter.
pub struct OnePoleFilter {
    mode: FilterMode,

    /// Smoothing coefficient derived from the cutoff.
    /// Range: 0.0 (no smoothing) to ~0.999 (extreme smoothing).
    coefficient: f32,

    /// The internal lowpass state, `y[n-1]`. The highpass output is
    /// derived from it, so both modes share the same memory.
    lowpass_state: f32,
}

impl OnePoleFilter {
    /// Create a filter that passes its input unchanged until a cutoff is set.
    ///
    /// With `coefficient = 0.0` the lowpass tracks its input exactly, so
    /// a lowpass is transparent and a highpass outputs silence. Both are
    /// overwritten by the first `set_cutoff()` call from the processor.
    pub fn new(mode: FilterMode) -> Self {
        Self {
            mode,
            coefficient: 0.0,
            lowpass_state: 0.0,
        }
    }

    /// Update the coefficient for a cutoff frequency in Hz.
    ///
    /// The cutoff is clamped to `20 Hz..=0.49 * sample_rate`. Below 20 Hz
    /// the coefficient gets so close to 1.0 that the filter stalls, and
    /// near Nyquist the mapping stops being meaningful.
    pub fn set_cutoff(&mut self, cutoff_hz: f32, sample_rate: f32) {
        // Not `clamp()`: at very low sample rates the upper bound drops below
        // 20 Hz, and the Nyquist limit has to win.
        let safe_cutoff = cutoff_hz.max(20.0).min(sample_rate * 0.49);
        self.coefficient = (-2.0 * PI * safe_cutoff / sample_rate).exp();
    }

    /// Process one sample through the filter.
    pub fn process(&mut self, input: f32) -> f32 {
        let lowpass = (1.0 - self.coefficient) * input + self.coefficient * self.lowpass_state;
        self.lowpass_state = lowpass;

        match self.mode {
            FilterMode::LowPass => lowpass,
            FilterMode::HighPass => input - lowpass,
        }
    }

    /// Clear the filter's memory.
    pub fn reset(&mut self) {
        self.lowpass_state = 0.0;
    }
}

/// The low cut and high cut stages for one channel, in series.
///
/// Each channel owns its own pair, so moving a cutoff on a signal that is
/// only present on the left never leaks filter state into the right.
pub struct ToneFilterPair {
    low_cut: OnePoleFilter,
    high_cut: OnePoleFilter,
}

impl Default for ToneFilterPair {
    fn default() -> Self {
        Self::new()
    }
}

impl ToneFilterPair {
    pub fn new() -> Self {
        Self {
            low_cut: OnePoleFilter::new(FilterMode::HighPass),
            high_cut: OnePoleFilter::new(FilterMode::LowPass),
        }
    }

    /// Set both cutoffs. Called every sample with the smoothed values.
    pub fn set_cutoffs(&mut self, low_cut_hz: f32, high_cut_hz: f32, sample_rate: f32) {
        self.low_cut.set_cutoff(low_cut_hz, sample_rate);
        self.high_cut.set_cutoff(high_cut_hz, sample_rate);
    }

    /// Low cut first, then high cut.
    pub fn process(&mut self, input: f32) -> f32 {
        self.high_cut.process(self.low_cut.process(input))
    }

    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.high_cut.reset();
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
