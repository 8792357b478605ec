//! # Loveless Delay v2 — A Stereo Echo for AU/VST3/CLAP
//!
//! A tempo-syncable stereo delay built with
//! [nih-plug](https://github.com/robbert-vdh/nih-plug). The delay time can be
//! changed while audio is running without clicks: the echoes duck out, the
//! read head jumps, and they fade back in. Outputs Audio Unit (AUv2), VST3,
//! and CLAP formats from a single codebase.
//!
//! ## Signal Flow
//!
//! ```text
//! Input ──┬─────────────────────────────────────────────────(+)──► × gain ──► Output
//!         │                                                  ▲
//!         │    ┌────────────────────────────────────────┐    │
//!         │    │             FEEDBACK LOOP              │    │
//!         │    │                                        │    │
//!         └─► mono ─► pan ─►(+)──► [Delay Line] ──► × duck fade ──┬──► × mix
//!                            ▲                                    │
//!                            └──── [Low Cut] ◄─ [High Cut] ◄─ × feedback
//! ```
//!
//! One delay line per output channel; the stereo control decides how much
//! of the mono sum each one receives. The DSP lives in [`processor`] and
//! [`dsp`]; this file is only the glue between nih-plug and the processor.

pub mod dsp;
#[cfg(debug_assertions)]
mod guard;
pub mod params;
pub mod processor;

use std::num::NonZeroU32;
use std::sync::Arc;

use nih_plug::prelude::*;

use dsp::meter::StereoPeakMeter;
#[cfg(debug_assertions)]
use guard::OutputGuard;
use params::PluginParams;
use processor::DelayProcessor;

/// The main plugin struct.
///
/// Parameters (`PluginParams`) are shared with the host via `Arc` and can
/// be read from any thread. The processor is owned by the audio thread and
/// only touched in `initialize()`, `reset()` and `process()`. The peak
/// meters are the one piece of audio-thread state other threads may read,
/// through [`LovelessDelay::meters()`].
pub struct LovelessDelay {
    params: Arc<PluginParams>,
    processor: DelayProcessor,

    #[cfg(debug_assertions)]
    output_guard: OutputGuard,
}

impl Default for LovelessDelay {
    fn default() -> Self {
        Self {
            params: Arc::new(PluginParams::default()),
            processor: DelayProcessor::new(Arc::new(StereoPeakMeter::new())),
            #[cfg(debug_assertions)]
            output_guard: OutputGuard::new(),
        }
    }
}

impl LovelessDelay {
    /// Output peak meters. Each read through `read_and_reset()` returns the
    /// loudest sample since the previous read.
    pub fn meters(&self) -> Arc<StereoPeakMeter> {
        Arc::clone(self.processor.meters())
    }
}

impl Plugin for LovelessDelay {
    const NAME: &'static str = "Loveless Delay";
    const VENDOR: &'static str = "Loveless Audio";
    const URL: &'static str = "";
    const EMAIL: &'static str = "steve.loveless@gmail.com";
    const VERSION: &'static str = env!("CARGO_PKG_VERSION");

    // Stereo first, since most DAW tracks are stereo. On a mono track the
    // stereo control has nothing to pan and is ignored.
    const AUDIO_IO_LAYOUTS: &'static [AudioIOLayout] = &[
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(2),
            main_output_channels: NonZeroU32::new(2),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
        AudioIOLayout {
            main_input_channels: NonZeroU32::new(1),
            main_output_channels: NonZeroU32::new(1),
            aux_input_ports: &[],
            aux_output_ports: &[],
            names: PortNames::const_default(),
        },
    ];

    const MIDI_INPUT: MidiConfig = MidiConfig::None;

    // Parameter values are only read once per block, so there is nothing
    // to gain from splitting blocks at automation points.
    const SAMPLE_ACCURATE_AUTOMATION: bool = false;

    type SysExMessage = ();
    type BackgroundTask = ();

    fn params(&self) -> Arc<dyn Params> {
        self.params.clone()
    }

    /// Size the delay lines for the host's sample rate.
    ///
    /// This is the only place that allocates. The lines are sized for the
    /// longest delay time (5 s) so nothing has to grow while processing;
    /// at 48 kHz that is 240,001 samples, just under 1 MB per channel.
    fn initialize(
        &mut self,
        audio_io_layout: &AudioIOLayout,
        buffer_config: &BufferConfig,
        _context: &mut impl InitContext<Self>,
    ) -> bool {
        let sample_rate = buffer_config.sample_rate;
        if !self.processor.prepare(sample_rate) {
            nih_log!("Refusing to initialize at a sample rate of {sample_rate} Hz");
            return false;
        }

        self.processor.update(&self.params.settings(), None);
        self.processor.reset();

        let channels = audio_io_layout
            .main_output_channels
            .map_or(0, NonZeroU32::get);
        nih_log!(
            "Initialized {channels} channel(s) at {sample_rate} Hz with {} samples of delay",
            self.processor.max_delay_samples()
        );
        true
    }

    /// Called when playback stops or the plugin is bypassed. Clears the
    /// delay lines so stale echoes don't play when the transport restarts,
    /// and snaps all smoothers to the current parameter values.
    fn reset(&mut self) {
        self.processor.update(&self.params.settings(), None);
        self.processor.reset();
    }

    fn process(
        &mut self,
        buffer: &mut Buffer,
        _aux: &mut AuxiliaryBuffers,
        context: &mut impl ProcessContext<Self>,
    ) -> ProcessStatus {
        let host_tempo = context.transport().tempo;
        self.processor.update(&self.params.settings(), host_tempo);

        let channels = buffer.as_slice();
        match channels {
            [left, right] => self.processor.process_stereo(left, right),
            [mono] => self.processor.process_mono(mono),
            _ => nih_debug_assert_failure!("Unsupported channel count: {}", channels.len()),
        }

        #[cfg(debug_assertions)]
        self.output_guard.check(channels);

        // Keep the host calling process() after the input goes silent so
        // the echoes aren't cut off.
        ProcessStatus::Tail(self.processor.tail_samples())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Plugin format trait implementations
// ─────────────────────────────────────────────────────────────────────

impl ClapPlugin for LovelessDelay {
    const CLAP_ID: &'static str = "com.loveless-audio.loveless-delay-v2";
    const CLAP_DESCRIPTION: Option<&'static str> =
        Some("A tempo-synced stereo delay with click-free time changes");
    const CLAP_MANUAL_URL: Option<&'static str> = None;
    const CLAP_SUPPORT_URL: Option<&'static str> = None;
    const CLAP_FEATURES: &'static [ClapFeature] = &[
        ClapFeature::AudioEffect,
        ClapFeature::Stereo,
        ClapFeature::Mono,
        ClapFeature::Delay,
    ];
}

impl Vst3Plugin for LovelessDelay {
    // Must differ from v1's ID so both versions can be installed side by
    // side.
    const VST3_CLASS_ID: [u8; 16] = *b"LvlssDelay__v002";

    const VST3_SUBCATEGORIES: &'static [Vst3SubCategory] =
        &[Vst3SubCategory::Fx, Vst3SubCategory::Delay, Vst3SubCategory::Stereo];
}

// ─────────────────────────────────────────────────────────────────────
// Export macros
// ─────────────────────────────────────────────────────────────────────
//
// nih_export_clap! exports the `clap_entry` symbol for CLAP hosts.
// nih_export_vst3! exports `GetPluginFactory` for VST3 hosts.
// clap_wrapper wraps the CLAP entry point as an AUv2 component for
// Logic Pro.

nih_export_clap!(LovelessDelay);
nih_export_vst3!(LovelessDelay);

clap_wrapper::export_auv2!();
