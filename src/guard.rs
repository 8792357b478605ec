//! # Output Guard (debug builds only)
//!
//! A bug in a feedback loop can turn into a full-scale blast or a stream
//! of NaNs within a few milliseconds. While developing, this sits after
//! the processor and silences any block that contains a non-finite sample
//! or one louder than [`OUTPUT_LIMIT`], logging the first occurrence.
//! Release builds don't include it.

use nih_plug::nih_log;
use nih_plug::util::permit_alloc;

/// Largest sample magnitude let through. About +6 dBFS.
pub const OUTPUT_LIMIT: f32 = 2.0;

#[derive(Debug, Default)]
pub struct OutputGuard {
    warned: bool,
}

impl OutputGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero every channel if any sample is out of bounds. Returns `true`
    /// if the block was silenced.
    pub fn check(&mut self, channels: &mut [&mut [f32]]) -> bool {
        let offending = channels
            .iter()
            .flat_map(|channel| channel.iter())
            .copied()
            .find(|sample| !sample.is_finite() || sample.abs() > OUTPUT_LIMIT);

        let Some(sample) = offending else {
            return false;
        };

        if !self.warned {
            self.warned = true;
            // Formatting the message may allocate; this only runs once.
            permit_alloc(|| {
                nih_log!("Output guard tripped on sample {sample}, silencing output");
            });
        }

        for channel in channels.iter_mut() {
            channel.fill(0.0);
        }
        true
    }
}
