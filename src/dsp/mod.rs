//! # DSP (Digital Signal Processing) Primitives
//!
//! The building blocks the [`DelayProcessor`](crate::processor::DelayProcessor)
//! is assembled from. None of them know about the host or about each other:
//!
//! - **`delay_line`**: A ring buffer that stores past audio samples and
//!   reads them back after a fractional number of samples.
//!
//! - **`ducking`**: Fades the echoes out before a delay time change and back
//!   in afterwards, so moving the read head doesn't click.
//!
//! - **`filter`**: One-pole low and high pass filters. A pair of them shapes
//!   the feedback path, darkening and thinning each repeat a little more.
//!
//! - **`meter`**: Lock-free peak meters the audio thread writes and any
//!   other thread can read.
//!
//! - **`smoothing`**: Per-sample ramps for every continuous parameter.
//!
//! - **`tempo`**: Note lengths and the host tempo, for synced delay times.

pub mod delay_line;
pub mod ducking;
pub mod filter;
pub mod meter;
pub mod smoothing;
pub mod tempo;
