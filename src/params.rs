//! # Plugin Parameters
//!
//! Parameters are the knobs and switches the user sees in the DAW. Each
//! parameter has:
//!
//! - A **unique string ID** (`#[id = "..."]`) that the host uses to
//!   save and recall presets. Once published, never change these IDs
//!   or existing presets will break.
//! - A **human-readable name** shown in the DAW's UI.
//! - A **range** (min, max, and optional skew), or a fixed set of choices.
//! - A **default value**.
//!
//! ## Where Did the Smoothing Go?
//!
//! None of these parameters use nih-plug's built-in smoothers. The audio
//! thread reads the raw values once per block via
//! [`PluginParams::settings()`] and the
//! [`DelayProcessor`](crate::processor::DelayProcessor) ramps them itself.
//! That keeps all of the DSP state in one place, where it can be reset and
//! tested without a host.

use nih_plug::prelude::*;

use crate::dsp::tempo::NoteLength;
use crate::processor::{ProcessorSettings, TimeMode, MAX_DELAY_MS, MIN_DELAY_MS};

/// All user-facing parameters for the Loveless Delay plugin.
#[derive(Params)]
pub struct PluginParams {
    /// **Output Gain** — overall level after the dry and wet signals are
    /// mixed.
    ///
    /// Range: -12 dB to +12 dB. Default: 0 dB (unity).
    #[id = "gain"]
    pub gain: FloatParam,

    /// **Delay Time** — how long before you hear the echo, when tempo sync
    /// is off.
    ///
    /// Range: 5 ms to 5 s. Default: 100 ms, a short slapback.
    ///
    /// The range spans three orders of magnitude, so it is strongly skewed:
    /// the first half of the knob covers roughly 5-500 ms, where small
    /// changes are easy to hear, and the rest covers the long echoes.
    #[id = "delay"]
    pub delay_time: FloatParam,

    /// **Mix** — how much of the delayed signal is added to the dry one.
    ///
    /// The dry signal always passes at full level; this only sets the level
    /// of the echoes on top of it.
    ///
    /// - 0% = no echoes
    /// - 100% = echoes at the same level as the input (the default)
    #[id = "mix"]
    pub mix: FloatParam,

    /// **Feedback** — how many times the echo repeats.
    ///
    /// Capped at 95%. At 100% the echoes would never decay, and the tone
    /// filters are the only other loss in the loop.
    #[id = "fdbk"]
    pub feedback: FloatParam,

    /// **Stereo** — where the echoes sit in the stereo field.
    ///
    /// The input is summed to mono before entering the delay lines, then
    /// split between the left and right lines by this control:
    ///
    /// - -100% = echoes on the left only
    /// - 0% = echoes on both sides (the default)
    /// - +100% = echoes on the right only
    #[id = "stereo"]
    pub stereo: FloatParam,

    /// **Low Cut** — removes low end from the feedback path, so repeats get
    /// thinner as they decay. Default: 20 Hz, effectively off.
    #[id = "locut"]
    pub low_cut: FloatParam,

    /// **High Cut** — removes top end from the feedback path, so repeats get
    /// darker as they decay. Default: 20 kHz, effectively off.
    #[id = "hicut"]
    pub high_cut: FloatParam,

    /// **Tempo Sync** — take the delay time from the host tempo and the
    /// note length below instead of the Delay Time knob.
    #[id = "sync"]
    pub tempo_sync: BoolParam,

    /// **Note** — the synced delay time as a note length, from 1/32 to a
    /// whole note, with dotted and triplet variants.
    #[id = "note"]
    pub note_length: EnumParam<NoteLength>,

    /// **Time Mode** — what happens when the delay time changes: duck the
    /// echoes while the read head jumps, or glide to the new time.
    #[id = "mode"]
    pub time_mode: EnumParam<TimeMode>,
}

impl Default for PluginParams {
    fn default() -> Self {
        // Both tone filters share one frequency range.
        let cutoff = |name: &str, default: f32| {
            FloatParam::new(
                name,
                default,
                FloatRange::Skewed {
                    min: 20.0,
                    max: 20000.0,
                    // Pitch perception is roughly logarithmic, so give the
                    // low frequencies most of the knob travel.
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_value_to_string(formatters::v2s_f32_hz_then_khz(0))
            .with_string_to_value(formatters::s2v_f32_hz_then_khz())
        };

        Self {
            gain: FloatParam::new(
                "Output Gain",
                0.0,
                FloatRange::Linear {
                    min: -12.0,
                    max: 12.0,
                },
            )
            .with_unit(" dB")
            .with_step_size(0.1),

            delay_time: FloatParam::new(
                "Delay Time",
                100.0,
                FloatRange::Skewed {
                    min: MIN_DELAY_MS,
                    max: MAX_DELAY_MS,
                    factor: FloatRange::skew_factor(-2.0),
                },
            )
            .with_unit(" ms")
            .with_step_size(0.1),

            mix: FloatParam::new("Mix", 1.0, FloatRange::Linear { min: 0.0, max: 1.0 })
                .with_unit("%")
                .with_value_to_string(formatters::v2s_f32_percentage(1))
                .with_string_to_value(formatters::s2v_f32_percentage()),

            feedback: FloatParam::new(
                "Feedback",
                0.0,
                FloatRange::Linear {
                    min: 0.0,
                    max: 0.95,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(1))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            stereo: FloatParam::new(
                "Stereo",
                0.0,
                FloatRange::Linear {
                    min: -1.0,
                    max: 1.0,
                },
            )
            .with_unit("%")
            .with_value_to_string(formatters::v2s_f32_percentage(0))
            .with_string_to_value(formatters::s2v_f32_percentage()),

            low_cut: cutoff("Low Cut", 20.0),
            high_cut: cutoff("High Cut", 20000.0),

            tempo_sync: BoolParam::new("Tempo Sync", false),
            note_length: EnumParam::new("Note", NoteLength::Quarter),
            time_mode: EnumParam::new("Time Mode", TimeMode::Duck),
        }
    }
}

impl PluginParams {
    /// Snapshot the current (unsmoothed) values for the processor.
    pub fn settings(&self) -> ProcessorSettings {
        ProcessorSettings {
            output_gain: util::db_to_gain(self.gain.value()),
            delay_time_ms: self.delay_time.value(),
            mix: self.mix.value(),
            feedback: self.feedback.value(),
            stereo: self.stereo.value(),
            low_cut_hz: self.low_cut.value(),
            high_cut_hz: self.high_cut.value(),
            tempo_sync: self.tempo_sync.value(),
            note_length: self.note_length.value(),
            time_mode: self.time_mode.value(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fresh parameters describe the same plugin state as the processor's
    /// own defaults.
    #[test]
    fn test_defaults_match_processor_defaults() {
        let settings = PluginParams::default().settings();
        let expected = ProcessorSettings::default();

        assert!((settings.output_gain - expected.output_gain).abs() < 1e-6);
        assert_eq!(settings.delay_time_ms, expected.delay_time_ms);
        assert_eq!(settings.mix, expected.mix);
        assert_eq!(settings.feedback, expected.feedback);
        assert_eq!(settings.stereo, expected.stereo);
        assert_eq!(settings.low_cut_hz, expected.low_cut_hz);
        assert_eq!(settings.high_cut_hz, expected.high_cut_hz);
        assert_eq!(settings.tempo_sync, expected.tempo_sync);
        assert_eq!(settings.note_length, expected.note_length);
        assert_eq!(settings.time_mode, expected.time_mode);
    }

    #[test]
    fn test_parameter_ids_are_stable() {
        let params = PluginParams::default();
        let ids: Vec<String> = params.param_map().into_iter().map(|(id, _, _)| id).collect();

        assert_eq!(
            ids,
            [
                "gain", "delay", "mix", "fdbk", "stereo", "locut", "hicut", "sync", "note", "mode"
            ]
        );
    }

    #[test]
    fn test_ranges() {
        let params = PluginParams::default();

        assert_eq!(params.delay_time.preview_plain(0.0), MIN_DELAY_MS);
        assert_eq!(params.delay_time.preview_plain(1.0), MAX_DELAY_MS);
        assert!((params.feedback.preview_plain(1.0) - 0.95).abs() < 1e-6);
        assert_eq!(params.gain.preview_plain(0.0), -12.0);
        assert_eq!(params.gain.preview_plain(1.0), 12.0);
        assert_eq!(params.low_cut.preview_plain(0.0), 20.0);
        assert_eq!(params.high_cut.preview_plain(1.0), 20000.0);
    }
}
