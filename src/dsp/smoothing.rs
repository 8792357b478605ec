//! # Parameter Smoothing
//!
//! The host hands us raw parameter values once per block. Applying them
//! as-is would step the gain, mix or filter cutoff at block boundaries,
//! which is audible as "zipper noise". Instead every value is ramped one
//! step per sample toward its latest target using nih-plug's `Smoother`.
//!
//! - Levels, mix, feedback, stereo pan and the filter cutoffs use a 20 ms
//!   **linear** ramp. After exactly 20 ms worth of samples the smoother
//!   lands on the target, with no residual error.
//! - The delay length used in glide mode follows a slower 200 ms
//!   **exponential** (one-pole) ramp. Moving the read head gradually
//!   bends the pitch of the echoes like a tape machine changing speed.
//!
//! All smoothing lives on the audio thread; the shared `Params` only store
//! the raw targets.

use nih_plug::prelude::{Smoother, SmoothingStyle};

/// Ramp time for the level and tone parameters.
pub const LINEAR_SMOOTHING_MS: f32 = 20.0;

/// Ramp time for the delay length in glide mode.
pub const DELAY_GLIDE_MS: f32 = 200.0;

/// One value per smoothed control. Used both for targets and for the
/// per-sample smoothed output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmoothedValues {
    /// Linear output gain (not dB).
    pub gain: f32,
    pub mix: f32,
    pub feedback: f32,
    /// Stereo position of the echoes, -1.0 (left) to 1.0 (right).
    pub stereo: f32,
    pub low_cut_hz: f32,
    pub high_cut_hz: f32,
}

/// The audio thread's set of smoothers.
pub struct ParameterSmoothers {
    sample_rate: f32,

    gain: Smoother<f32>,
    mix: Smoother<f32>,
    feedback: Smoother<f32>,
    stereo: Smoother<f32>,
    low_cut: Smoother<f32>,
    high_cut: Smoother<f32>,
    /// Targets from the last `set_targets()` or `reset()`.
    targets: SmoothedValues,

    delay_glide: Smoother<f32>,
    /// Last target handed to `delay_glide`. Re-sending an unchanged target
    /// would restart the ramp and the smoother would never settle.
    delay_target: Option<f32>,
}

impl ParameterSmoothers {
    pub fn new(sample_rate: f32, initial: &SmoothedValues) -> Self {
        let linear = |value: f32| {
            let smoother = Smoother::new(SmoothingStyle::Linear(LINEAR_SMOOTHING_MS));
            smoother.reset(value);
            smoother
        };

        Self {
            sample_rate,
            gain: linear(initial.gain),
            mix: linear(initial.mix),
            feedback: linear(initial.feedback),
            stereo: linear(initial.stereo),
            low_cut: linear(initial.low_cut_hz),
            high_cut: linear(initial.high_cut_hz),
            targets: *initial,
            delay_glide: Smoother::new(SmoothingStyle::Exponential(DELAY_GLIDE_MS)),
            delay_target: None,
        }
    }

    /// Ramp lengths are counted in samples, so a new sample rate needs a
    /// follow-up [`reset()`](Self::reset) before the next block.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Jump straight to `values` with no ramp, and forget the delay glide.
    pub fn reset(&mut self, values: &SmoothedValues) {
        self.gain.reset(values.gain);
        self.mix.reset(values.mix);
        self.feedback.reset(values.feedback);
        self.stereo.reset(values.stereo);
        self.low_cut.reset(values.low_cut_hz);
        self.high_cut.reset(values.high_cut_hz);
        self.targets = *values;
        self.delay_target = None;
    }

    /// Start ramping toward new targets. Called once per block.
    ///
    /// Unchanged targets are skipped so a ramp already in flight keeps its
    /// original end time instead of being stretched block after block.
    pub fn set_targets(&mut self, values: &SmoothedValues) {
        let sample_rate = self.sample_rate;
        let retarget = |smoother: &Smoother<f32>, previous: f32, target: f32| {
            if previous != target {
                smoother.set_target(sample_rate, target);
            }
        };

        let previous = self.targets;
        retarget(&self.gain, previous.gain, values.gain);
        retarget(&self.mix, previous.mix, values.mix);
        retarget(&self.feedback, previous.feedback, values.feedback);
        retarget(&self.stereo, previous.stereo, values.stereo);
        retarget(&self.low_cut, previous.low_cut_hz, values.low_cut_hz);
        retarget(&self.high_cut, previous.high_cut_hz, values.high_cut_hz);
        self.targets = *values;
    }

    /// Advance every linear smoother by one sample.
    pub fn next(&mut self) -> SmoothedValues {
        SmoothedValues {
            gain: self.gain.next(),
            mix: self.mix.next(),
            feedback: self.feedback.next(),
            stereo: self.stereo.next(),
            low_cut_hz: self.low_cut.next(),
            high_cut_hz: self.high_cut.next(),
        }
    }

    /// Start the glide from `from_samples` rather than from the first
    /// target, so switching into glide mode continues from wherever the
    /// read head already is.
    pub fn start_delay_glide(&mut self, from_samples: f32) {
        self.delay_glide.reset(from_samples);
        self.delay_target = Some(from_samples);
    }

    /// Advance the delay glide one sample toward `target_samples`.
    ///
    /// The first target after a reset is taken as-is, so glide mode starts
    /// at the right delay instead of sweeping up from zero.
    pub fn next_delay(&mut self, target_samples: f32) -> f32 {
        match self.delay_target {
            None => self.delay_glide.reset(target_samples),
            Some(previous) if previous != target_samples => {
                self.delay_glide.set_target(self.sample_rate, target_samples);
            }
            Some(_) => {}
        }
        self.delay_target = Some(target_samples);

        self.delay_glide.next()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
