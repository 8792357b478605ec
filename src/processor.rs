//! # The Delay Processor
//!
//! Everything that happens to a sample between the host's input buffer and
//! its output buffer. The processor knows nothing about plugin formats: the
//! `Plugin` impl in `lib.rs` hands it a [`ProcessorSettings`] snapshot and
//! the host tempo once per block, then lets it run over the audio.
//!
//! ## Signal Flow (stereo)
//!
//! ```text
//!  L ──┬──────────────────────────────────────────────────────(+)── × gain ──► L
//!      │                                                       ▲
//!      ├─► (L+R)/2 ─┬─ × panL ─(+)─► [Delay L] ─► × fade ─┬─ × mix
//!      │            │           ▲                          │
//!      │            │           └── tone(wet × feedback) ◄─┘
//!      │            │
//!  R ──┴────────────┴─ × panR ─(+)─► [Delay R] ─► ...  (same as L) ──────────► R
//! ```
//!
//! ## Per Sample
//!
//! 1. Advance the parameter smoothers.
//! 2. Work out the delay length: the free time, or the tempo-synced note
//!    length, in samples.
//! 3. Let the ducking controller (or the glide smoother) pick the length
//!    the lines are actually read at.
//! 4. Write the panned mono input plus feedback into each line.
//! 5. Read the lines and apply the ducking fade: the wet signal.
//! 6. Filter the wet signal into next sample's feedback.
//! 7. Mix dry and wet, apply the output gain, update the peak meters.

use std::num::NonZeroUsize;
use std::sync::Arc;

use nih_plug::prelude::Enum;

use crate::dsp::delay_line::DelayLine;
use crate::dsp::ducking::DuckingController;
use crate::dsp::filter::ToneFilterPair;
use crate::dsp::meter::StereoPeakMeter;
use crate::dsp::smoothing::{ParameterSmoothers, SmoothedValues};
use crate::dsp::tempo::{NoteLength, TempoClock};

/// Shortest delay time the processor will use.
pub const MIN_DELAY_MS: f32 = 5.0;

/// Longest delay time the processor will use. The delay lines are sized
/// for this at the current sample rate.
pub const MAX_DELAY_MS: f32 = 5000.0;

/// How the read head reacts when the delay time changes.
#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TimeMode {
    /// Fade the echoes out, jump to the new time, fade back in.
    #[id = "duck"]
    #[name = "Duck"]
    #[default]
    Duck,
    /// Slide the read head to the new time, bending the pitch of the
    /// echoes on the way like a tape machine.
    #[id = "glide"]
    #[name = "Glide"]
    Glide,
}

/// Raw (unsmoothed) control values for one block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessorSettings {
    /// Output gain as a linear factor.
    pub output_gain: f32,
    /// Free delay time, used when tempo sync is off.
    pub delay_time_ms: f32,
    pub mix: f32,
    pub feedback: f32,
    /// Stereo position of the echoes, -1.0 (left) to 1.0 (right).
    pub stereo: f32,
    pub low_cut_hz: f32,
    pub high_cut_hz: f32,
    pub tempo_sync: bool,
    pub note_length: NoteLength,
    pub time_mode: TimeMode,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            output_gain: 1.0,
            delay_time_ms: 100.0,
            mix: 1.0,
            feedback: 0.0,
            stereo: 0.0,
            low_cut_hz: 20.0,
            high_cut_hz: 20000.0,
            tempo_sync: false,
            note_length: NoteLength::Quarter,
            time_mode: TimeMode::Duck,
        }
    }
}

impl ProcessorSettings {
    fn smoothed_targets(&self) -> SmoothedValues {
        SmoothedValues {
            gain: self.output_gain,
            mix: self.mix,
            feedback: self.feedback,
            stereo: self.stereo,
            low_cut_hz: self.low_cut_hz,
            high_cut_hz: self.high_cut_hz,
        }
    }
}

/// Balance-law pan weights for the left and right taps.
///
/// Centered, both taps get the full signal; panning one way fades the
/// opposite tap out and leaves the near one untouched.
fn pan_weights(stereo: f32) -> (f32, f32) {
    ((1.0 - stereo).min(1.0), (1.0 + stereo).min(1.0))
}

/// Everything one sample needs from the control side.
struct Frame {
    values: SmoothedValues,
    delay: f32,
    fade: f32,
}

/// The complete stereo delay: two delay lines, their feedback filters,
/// the smoothers, the ducking controller and the tempo clock.
pub struct DelayProcessor {
    sample_rate: f32,
    settings: ProcessorSettings,
    /// Mode used for the previous sample, to hand the read position over
    /// when the mode changes.
    active_mode: TimeMode,

    delay_lines: [DelayLine; 2],
    tone_filters: [ToneFilterPair; 2],
    /// Filtered feedback waiting to be written with the next input sample.
    feedback: [f32; 2],

    smoothers: ParameterSmoothers,
    ducking: DuckingController,
    tempo: TempoClock,
    meters: Arc<StereoPeakMeter>,

    /// Length the lines were read at on the last sample.
    current_delay: f32,
    /// Wet gain applied on the last sample.
    current_fade: f32,
}

impl DelayProcessor {
    /// Create a processor with unsized delay lines. Call
    /// [`prepare()`](Self::prepare) before processing audio.
    pub fn new(meters: Arc<StereoPeakMeter>) -> Self {
        let settings = ProcessorSettings::default();
        // Placeholder until the host reports the real rate in prepare().
        let sample_rate = 44100.0;

        Self {
            sample_rate,
            settings,
            active_mode: settings.time_mode,
            delay_lines: [DelayLine::new(), DelayLine::new()],
            tone_filters: [ToneFilterPair::new(), ToneFilterPair::new()],
            feedback: [0.0; 2],
            smoothers: ParameterSmoothers::new(sample_rate, &settings.smoothed_targets()),
            ducking: DuckingController::new(sample_rate),
            tempo: TempoClock::new(),
            meters,
            current_delay: 0.0,
            current_fade: 1.0,
        }
    }

    /// Size the delay lines for `sample_rate` and reset all state.
    ///
    /// This allocates, so it must only be called from the host's
    /// non-realtime setup path. Returns `false` if the sample rate is
    /// unusable.
    pub fn prepare(&mut self, sample_rate: f32) -> bool {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return false;
        }

        let max_delay = (MAX_DELAY_MS * sample_rate / 1000.0).ceil() as usize;
        let Some(max_delay_samples) = NonZeroUsize::new(max_delay) else {
            return false;
        };

        self.sample_rate = sample_rate;
        for line in &mut self.delay_lines {
            line.set_capacity(max_delay_samples);
        }
        self.smoothers.set_sample_rate(sample_rate);
        self.ducking.set_sample_rate(sample_rate);

        self.reset();
        true
    }

    /// Silence the delay lines and return every piece of state to where it
    /// was right after `prepare()`. Smoothers jump to the latest settings.
    pub fn reset(&mut self) {
        for line in &mut self.delay_lines {
            line.reset();
        }
        for filter in &mut self.tone_filters {
            filter.reset();
        }
        self.feedback = [0.0; 2];

        self.smoothers.reset(&self.settings.smoothed_targets());
        self.ducking.reset();
        self.tempo.reset();
        self.meters.reset();

        self.active_mode = self.settings.time_mode;
        self.current_delay = 0.0;
        self.current_fade = 1.0;
    }

    /// Take the control values and host tempo for the coming block.
    pub fn update(&mut self, settings: &ProcessorSettings, host_tempo: Option<f64>) {
        self.settings = *settings;
        self.tempo.update(host_tempo);
        self.smoothers.set_targets(&settings.smoothed_targets());
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn meters(&self) -> &Arc<StereoPeakMeter> {
        &self.meters
    }

    /// Longest delay the lines can currently serve, in samples.
    pub fn max_delay_samples(&self) -> f32 {
        self.delay_lines[0].max_delay()
    }

    /// The delay length the settings ask for, in samples.
    ///
    /// Tempo-synced lengths are limited to the same 5..5000 ms window as
    /// the free delay time, so slow tempos with long notes can't run past
    /// the end of the delay line.
    pub fn target_delay_samples(&self) -> f32 {
        let delay_ms = if self.settings.tempo_sync {
            self.tempo.millis_for_note_length(self.settings.note_length) as f32
        } else {
            self.settings.delay_time_ms
        };

        let delay_ms = delay_ms.clamp(MIN_DELAY_MS, MAX_DELAY_MS);
        (delay_ms * self.sample_rate / 1000.0).min(self.max_delay_samples())
    }

    /// Length the delay lines were read at on the most recent sample.
    pub fn current_delay(&self) -> f32 {
        self.current_delay
    }

    /// Ducking gain applied to the wet signal on the most recent sample.
    pub fn current_fade(&self) -> f32 {
        self.current_fade
    }

    /// How many samples of echo remain audible after the input goes quiet.
    ///
    /// Each repeat is scaled by the feedback amount, so after `N` repeats
    /// the level is `feedback^N`. Solving `feedback^N = 0.001` (-60 dB)
    /// gives `N = -3 / log10(feedback)` repeats of one delay period each.
    pub fn tail_samples(&self) -> u32 {
        let delay = self.current_delay.max(self.target_delay_samples());
        let feedback = self.settings.feedback;

        if feedback > 0.001 {
            let repeats = -3.0 / feedback.log10();
            (repeats * delay + delay) as u32
        } else {
            delay as u32
        }
    }

    /// Advance the control side by one sample.
    fn next_frame(&mut self) -> Frame {
        let values = self.smoothers.next();
        let target = self.target_delay_samples();

        let mode = self.settings.time_mode;
        if mode != self.active_mode {
            // Start the glide from the current read position so the read
            // head doesn't jump. Going the other way needs nothing: the
            // ducking controller already follows the glide.
            if mode == TimeMode::Glide && self.current_delay > 0.0 {
                self.smoothers.start_delay_glide(self.current_delay);
            }
            self.active_mode = mode;
        }

        let delay = match mode {
            TimeMode::Duck => self.ducking.step(target),
            TimeMode::Glide => {
                let delay = self.smoothers.next_delay(target);
                // Releases a duck that was still in progress at its normal
                // rate instead of snapping the wet gain back to 1.
                self.ducking.follow(delay);
                delay
            }
        };
        let fade = self.ducking.fade();

        self.current_delay = delay;
        self.current_fade = fade;

        Frame {
            values,
            delay,
            fade,
        }
    }

    /// Process a stereo block in place. Both slices must be the same length.
    pub fn process_stereo(&mut self, left: &mut [f32], right: &mut [f32]) {
        debug_assert_eq!(left.len(), right.len());

        for (left_sample, right_sample) in left.iter_mut().zip(right.iter_mut()) {
            let Frame {
                values,
                delay,
                fade,
            } = self.next_frame();

            let dry = [*left_sample, *right_sample];
            let mono = (dry[0] + dry[1]) * 0.5;
            let (pan_left, pan_right) = pan_weights(values.stereo);
            let feeds = [mono * pan_left, mono * pan_right];

            let mut output = [0.0; 2];
            for channel in 0..2 {
                let line = &mut self.delay_lines[channel];
                line.write(feeds[channel] + self.feedback[channel]);
                let wet = line.read(delay) * fade;

                let filter = &mut self.tone_filters[channel];
                filter.set_cutoffs(values.low_cut_hz, values.high_cut_hz, self.sample_rate);
                self.feedback[channel] = filter.process(wet * values.feedback);

                output[channel] = (dry[channel] + wet * values.mix) * values.gain;
            }

            *left_sample = output[0];
            *right_sample = output[1];
            self.meters.left.update_if_greater(output[0].abs());
            self.meters.right.update_if_greater(output[1].abs());
        }
    }

    /// Process a mono block in place.
    ///
    /// There is only one tap, so the stereo control has nothing to pan and
    /// the input goes straight into the left delay line. The single output
    /// feeds both meters.
    pub fn process_mono(&mut self, samples: &mut [f32]) {
        for sample in samples.iter_mut() {
            let Frame {
                values,
                delay,
                fade,
            } = self.next_frame();

            let dry = *sample;
            let line = &mut self.delay_lines[0];
            line.write(dry + self.feedback[0]);
            let wet = line.read(delay) * fade;

            let filter = &mut self.tone_filters[0];
            filter.set_cutoffs(values.low_cut_hz, values.high_cut_hz, self.sample_rate);
            self.feedback[0] = filter.process(wet * values.feedback);

            let output = (dry + wet * values.mix) * values.gain;
            *sample = output;
            self.meters.left.update_if_greater(output.abs());
            self.meters.right.update_if_greater(output.abs());
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
