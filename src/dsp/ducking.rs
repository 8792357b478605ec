//! # Click-Free Delay Time Changes
//!
//! Moving a delay line's read head while it is audible makes the output
//! jump from one point in the past to another, which is heard as a click.
//! The ducking controller hides that jump:
//!
//! ```text
//!  fade
//!  1.0 ───────┐                          ┌───────────
//!             │╲                        ╱
//!             │ ╲                     ╱
//!             │  ╲___________________╱
//!  0.0        │   Ducking │ Waiting  │ Restoring
//!             ▲                      ▲
//!      new delay time          read head jumps
//!        requested           (inaudible, fade ≈ 0)
//! ```
//!
//! 1. A new delay length is requested: the wet signal fades toward silence
//!    (one-pole, 50 ms time constant) and a 300 ms wait timer starts.
//! 2. When the timer runs out the fade is down at about 0.25%, so the read
//!    head can jump to the new length without anyone hearing it.
//! 3. The fade then rises back to 1.
//!
//! Each new request while this is in progress restarts the timer, so
//! sweeping the knob keeps the echoes ducked until it comes to rest.
//!
//! The very first length after a reset is applied immediately: there is
//! nothing in the delay line yet that a jump could disturb.

/// Time constant of the fade in and out.
pub const FADE_TIME_SECONDS: f32 = 0.05;

/// How long the timer runs before the read head jumps.
pub const WAIT_TIME_SECONDS: f32 = 0.3;

/// Fade level below which the wet signal counts as silent.
pub const DUCK_FLOOR: f32 = 0.01;

/// Distance from 1.0 at which a restoring fade is considered finished.
const SETTLE_EPSILON: f32 = 1e-4;

/// Where the controller is in the duck/jump/restore cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuckPhase {
    /// No delay length has been applied since the last reset.
    Unset,
    /// Fade fully open, no change pending.
    Stable,
    /// Fading out toward the new length.
    Ducking,
    /// Faded below [`DUCK_FLOOR`], waiting for the timer to finish.
    Waiting,
    /// Jumped to the new length, fading back in.
    Restoring,
}

pub struct DuckingController {
    phase: DuckPhase,

    /// The length the delay line is actually read at.
    delay_in_samples: f32,
    /// The most recently requested length.
    target_delay: f32,

    fade: f32,
    fade_target: f32,
    /// One-pole coefficient for `fade`.
    coefficient: f32,

    /// Timer in 0..1. Zero means no jump is pending.
    wait: f32,
    wait_increment: f32,
}

impl DuckingController {
    pub fn new(sample_rate: f32) -> Self {
        let mut controller = Self {
            phase: DuckPhase::Unset,
            delay_in_samples: 0.0,
            target_delay: 0.0,
            fade: 1.0,
            fade_target: 1.0,
            coefficient: 0.0,
            wait: 0.0,
            wait_increment: 0.0,
        };
        controller.set_sample_rate(sample_rate);
        controller
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.coefficient = 1.0 - (-1.0 / (FADE_TIME_SECONDS * sample_rate)).exp();
        self.wait_increment = 1.0 / (WAIT_TIME_SECONDS * sample_rate);
    }

    /// Back to the "never given a delay" state with the fade wide open.
    pub fn reset(&mut self) {
        self.phase = DuckPhase::Unset;
        self.delay_in_samples = 0.0;
        self.target_delay = 0.0;
        self.fade = 1.0;
        self.fade_target = 1.0;
        self.wait = 0.0;
    }

    /// Advance one sample while something else (the glide smoother) moves
    /// the read head to `delay_in_samples`.
    ///
    /// Any pending jump is cancelled and the fade heads back to 1 at its
    /// usual rate, so a duck that was in progress is released without a
    /// step in the wet gain. The position is tracked as the current length,
    /// so handing control back to [`step()`](Self::step) continues from it.
    pub fn follow(&mut self, delay_in_samples: f32) {
        self.delay_in_samples = delay_in_samples;
        self.target_delay = delay_in_samples;
        self.wait = 0.0;
        self.fade_target = 1.0;
        if self.phase != DuckPhase::Stable {
            self.phase = DuckPhase::Restoring;
        }

        self.advance_fade();
    }

    /// Advance one sample with the currently requested delay length and
    /// return the length to read the delay line at. Multiply the wet
    /// signal by [`fade()`](Self::fade) afterwards.
    pub fn step(&mut self, requested_delay: f32) -> f32 {
        if self.phase == DuckPhase::Unset {
            self.target_delay = requested_delay;
            self.delay_in_samples = requested_delay;
            self.phase = DuckPhase::Stable;
        } else if requested_delay != self.target_delay {
            self.target_delay = requested_delay;
            self.wait = self.wait_increment;
            self.fade_target = 0.0;
            self.phase = DuckPhase::Ducking;
        }

        if self.wait > 0.0 {
            self.wait += self.wait_increment;
            if self.wait >= 1.0 {
                self.delay_in_samples = self.target_delay;
                self.wait = 0.0;
                self.fade_target = 1.0;
                self.phase = DuckPhase::Restoring;
            }
        }

        self.advance_fade();

        self.delay_in_samples
    }

    fn advance_fade(&mut self) {
        self.fade += (self.fade_target - self.fade) * self.coefficient;

        match self.phase {
            DuckPhase::Ducking if self.fade <= DUCK_FLOOR => self.phase = DuckPhase::Waiting,
            DuckPhase::Restoring if self.fade >= 1.0 - SETTLE_EPSILON => {
                self.fade = 1.0;
                self.phase = DuckPhase::Stable;
            }
            _ => {}
        }
    }

    pub fn phase(&self) -> DuckPhase {
        self.phase
    }

    /// Gain for the wet signal, in `0.0..=1.0`.
    pub fn fade(&self) -> f32 {
        self.fade
    }

    pub fn delay_in_samples(&self) -> f32 {
        self.delay_in_samples
    }

    pub fn target_delay(&self) -> f32 {
        self.target_delay
    }
}

// ─────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 48000.0;

    /// Run until the controller is stable again (or give up after 2 s),
    /// recording `(delay, fade, phase)` for every sample.
    fn run_until_stable(controller: &mut DuckingController, request: f32) -> Vec<(f32, f32, DuckPhase)> {
        let mut trace = Vec::new();
        for _ in 0..(2.0 * SAMPLE_RATE) as usize {
            let delay = controller.step(request);
            trace.push((delay, controller.fade(), controller.phase()));
            if controller.phase() == DuckPhase::Stable {
                break;
            }
        }
        trace
    }

    #[test]
    fn test_first_request_snaps_without_fading() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        assert_eq!(controller.phase(), DuckPhase::Unset);

        for _ in 0..1000 {
            assert_eq!(controller.step(4800.0), 4800.0);
            assert_eq!(controller.fade(), 1.0);
            assert_eq!(controller.phase(), DuckPhase::Stable);
        }
    }

    #[test]
    fn test_unchanged_request_stays_stable() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(100.0);

        for _ in 0..SAMPLE_RATE as usize {
            controller.step(100.0);
        }
        assert_eq!(controller.phase(), DuckPhase::Stable);
        assert_eq!(controller.fade(), 1.0);
    }

    /// Fade goes down monotonically, the jump happens below the floor,
    /// then the fade comes back up monotonically to exactly 1.
    #[test]
    fn test_change_ducks_before_jumping() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);

        let trace = run_until_stable(&mut controller, 2000.0);
        let jump = trace
            .iter()
            .position(|&(delay, _, _)| delay == 2000.0)
            .expect("delay never jumped to the new length");

        let mut previous_fade = 1.0;
        for &(delay, fade, _) in &trace[..jump] {
            assert_eq!(delay, 1000.0);
            assert!(fade <= previous_fade, "fade rose while ducking");
            previous_fade = fade;
        }

        let (_, fade_at_jump, phase_at_jump) = trace[jump];
        assert!(fade_at_jump < DUCK_FLOOR, "jumped with fade at {fade_at_jump}");
        assert_eq!(phase_at_jump, DuckPhase::Restoring);

        let mut previous_fade = fade_at_jump;
        for &(delay, fade, _) in &trace[jump..] {
            assert_eq!(delay, 2000.0);
            assert!(fade >= previous_fade, "fade dropped while restoring");
            previous_fade = fade;
        }

        assert_eq!(controller.phase(), DuckPhase::Stable);
        assert_eq!(controller.fade(), 1.0);
    }

    /// The jump lands roughly 300 ms after the request.
    #[test]
    fn test_jump_timing() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);

        let trace = run_until_stable(&mut controller, 2000.0);
        let jump = trace.iter().position(|&(delay, _, _)| delay == 2000.0).unwrap();

        // f32 accumulation in the timer costs a few samples either way.
        let expected = (WAIT_TIME_SECONDS * SAMPLE_RATE) as usize;
        assert!(
            jump.abs_diff(expected) <= expected / 100,
            "jumped after {jump} samples, expected about {expected}"
        );
    }

    #[test]
    fn test_phases_run_in_order() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);

        let mut phases: Vec<DuckPhase> = run_until_stable(&mut controller, 500.0)
            .into_iter()
            .map(|(_, _, phase)| phase)
            .collect();
        phases.dedup();

        assert_eq!(
            phases,
            [
                DuckPhase::Ducking,
                DuckPhase::Waiting,
                DuckPhase::Restoring,
                DuckPhase::Stable
            ]
        );
    }

    /// A second request while ducking restarts the timer and the read head
    /// goes straight to the newest length.
    #[test]
    fn test_new_request_restarts_timer() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);

        let head_start = (0.2 * SAMPLE_RATE) as usize;
        for _ in 0..head_start {
            assert_eq!(controller.step(2000.0), 1000.0);
        }

        let trace = run_until_stable(&mut controller, 3000.0);
        assert!(trace.iter().all(|&(delay, _, _)| delay != 2000.0));

        let jump = trace.iter().position(|&(delay, _, _)| delay == 3000.0).unwrap();
        let expected = (WAIT_TIME_SECONDS * SAMPLE_RATE) as usize;
        assert!(jump.abs_diff(expected) <= expected / 100, "jumped after {jump} samples");
    }

    /// A request arriving while restoring ducks again from where it is.
    #[test]
    fn test_request_while_restoring_ducks_again() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);

        while controller.phase() != DuckPhase::Restoring {
            controller.step(2000.0);
        }
        for _ in 0..(0.05 * SAMPLE_RATE) as usize {
            controller.step(2000.0);
        }
        let fade_before = controller.fade();

        controller.step(500.0);
        assert_eq!(controller.phase(), DuckPhase::Ducking);
        assert!(controller.fade() < fade_before);
        assert_eq!(controller.delay_in_samples(), 2000.0);
        assert_eq!(controller.target_delay(), 500.0);
    }

    #[test]
    fn test_reset_returns_to_unset() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);
        controller.step(2000.0);
        assert_eq!(controller.phase(), DuckPhase::Ducking);

        controller.reset();
        assert_eq!(controller.phase(), DuckPhase::Unset);
        assert_eq!(controller.fade(), 1.0);

        assert_eq!(controller.step(3000.0), 3000.0);
        assert_eq!(controller.fade(), 1.0);
    }

    /// Following an outside read position releases a duck gradually and
    /// hands the position back to `step()`.
    #[test]
    fn test_follow_releases_duck_smoothly() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.step(1000.0);
        for _ in 0..(0.25 * SAMPLE_RATE) as usize {
            controller.step(2000.0);
        }
        assert_eq!(controller.phase(), DuckPhase::Waiting);

        let max_step = 1.0 - (-1.0 / (FADE_TIME_SECONDS * SAMPLE_RATE)).exp();
        let mut previous = controller.fade();
        for i in 0..SAMPLE_RATE as usize {
            controller.follow(1000.0 + i as f32 * 0.01);
            let fade = controller.fade();
            assert!(fade >= previous, "fade dropped while released");
            assert!(fade - previous <= max_step, "fade jumped by {}", fade - previous);
            previous = fade;
        }
        assert_eq!(controller.phase(), DuckPhase::Stable);
        assert_eq!(controller.fade(), 1.0);

        // The pending jump to 2000 was cancelled; control continues from
        // the followed position and a new request ducks as usual.
        let followed = controller.delay_in_samples();
        assert_eq!(controller.step(followed), followed);
        assert_eq!(controller.phase(), DuckPhase::Stable);
        assert_eq!(controller.step(500.0), followed);
        assert_eq!(controller.phase(), DuckPhase::Ducking);
    }

    #[test]
    fn test_follow_from_reset_stays_open() {
        let mut controller = DuckingController::new(SAMPLE_RATE);
        controller.follow(300.0);
        assert_eq!(controller.fade(), 1.0);
        assert_eq!(controller.delay_in_samples(), 300.0);
    }

    /// Fade timing scales with the sample rate.
    #[test]
    fn test_timing_follows_sample_rate() {
        for sample_rate in [22050.0, 44100.0, 96000.0] {
            let mut controller = DuckingController::new(sample_rate);
            controller.step(10.0);

            let mut samples = 0;
            while controller.delay_in_samples() != 20.0 {
                controller.step(20.0);
                samples += 1;
            }

            let seconds = samples as f32 / sample_rate;
            assert!((seconds - WAIT_TIME_SECONDS).abs() < 3e-3, "{sample_rate} Hz: {seconds} s");
            assert!(controller.fade() < DUCK_FLOOR);
        }
    }
}
