//! # Tempo Sync
//!
//! When tempo sync is on, the delay time comes from the host's tempo and a
//! note length instead of the free millisecond knob.
//!
//! One beat (a quarter note) lasts `60000 / bpm` milliseconds. At 120 BPM
//! that is 500 ms, so an eighth note is 250 ms and a dotted eighth 375 ms.
//! Every note length is just a multiple of that beat:
//!
//! ```text
//! dotted  = 1.5 × plain
//! triplet = 2/3 × plain   (three in the space of two)
//! ```

use nih_plug::prelude::Enum;

/// Tempo used until the host reports one.
pub const DEFAULT_BPM: f64 = 120.0;

/// Musical note lengths the delay can lock to, shortest first.
///
/// The order is the order of the selector in the DAW, so the index of a
/// variant is stable and must not be reshuffled once presets exist.
#[derive(Enum, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum NoteLength {
    #[id = "1_32"]
    #[name = "1/32"]
    ThirtySecond,
    #[id = "1_16t"]
    #[name = "1/16 triplet"]
    SixteenthTriplet,
    #[id = "1_32d"]
    #[name = "1/32 dotted"]
    ThirtySecondDotted,
    #[id = "1_16"]
    #[name = "1/16"]
    Sixteenth,
    #[id = "1_8t"]
    #[name = "1/8 triplet"]
    EighthTriplet,
    #[id = "1_16d"]
    #[name = "1/16 dotted"]
    SixteenthDotted,
    #[id = "1_8"]
    #[name = "1/8"]
    Eighth,
    #[id = "1_4t"]
    #[name = "1/4 triplet"]
    QuarterTriplet,
    #[id = "1_8d"]
    #[name = "1/8 dotted"]
    EighthDotted,
    #[id = "1_4"]
    #[name = "1/4"]
    #[default]
    Quarter,
    #[id = "1_2t"]
    #[name = "1/2 triplet"]
    HalfTriplet,
    #[id = "1_4d"]
    #[name = "1/4 dotted"]
    QuarterDotted,
    #[id = "1_2"]
    #[name = "1/2"]
    Half,
    #[id = "1_1t"]
    #[name = "1/1 triplet"]
    WholeTriplet,
    #[id = "1_2d"]
    #[name = "1/2 dotted"]
    HalfDotted,
    #[id = "1_1"]
    #[name = "1/1"]
    Whole,
}

impl NoteLength {
    /// Length of the note in beats, where one beat is a quarter note.
    pub fn beats(self) -> f64 {
        match self {
            Self::ThirtySecond => 0.125,
            Self::SixteenthTriplet => 0.5 / 3.0,
            Self::ThirtySecondDotted => 0.1875,
            Self::Sixteenth => 0.25,
            Self::EighthTriplet => 1.0 / 3.0,
            Self::SixteenthDotted => 0.375,
            Self::Eighth => 0.5,
            Self::QuarterTriplet => 2.0 / 3.0,
            Self::EighthDotted => 0.75,
            Self::Quarter => 1.0,
            Self::HalfTriplet => 4.0 / 3.0,
            Self::QuarterDotted => 1.5,
            Self::Half => 2.0,
            Self::WholeTriplet => 8.0 / 3.0,
            Self::HalfDotted => 3.0,
            Self::Whole => 4.0,
        }
    }
}

/// Tracks the host tempo and turns note lengths into milliseconds.
#[derive(Debug, Clone)]
pub struct TempoClock {
    bpm: f64,
}

impl Default for TempoClock {
    fn default() -> Self {
        Self { bpm: DEFAULT_BPM }
    }
}

impl TempoClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the host tempo and go back to 120 BPM.
    pub fn reset(&mut self) {
        self.bpm = DEFAULT_BPM;
    }

    /// Refresh the tempo from the host transport. Called once per block.
    ///
    /// Hosts without a tempo (or standalone wrappers with no transport)
    /// pass `None`; the last known tempo is kept in that case. A zero or
    /// negative tempo is treated the same way, since it would turn every
    /// note into an infinite delay.
    pub fn update(&mut self, host_tempo: Option<f64>) {
        if let Some(bpm) = host_tempo.filter(|bpm| bpm.is_finite() && *bpm > 0.0) {
            self.bpm = bpm;
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Duration of `note` in milliseconds at the current tempo.
    ///
    /// Not clamped: the caller limits the result to the longest delay the
    /// plugin supports.
    pub fn millis_for_note_length(&self, note: NoteLength) -> f64 {
        60_000.0 / self.bpm * note.beats()
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────
