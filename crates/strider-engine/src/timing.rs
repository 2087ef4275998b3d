//! Fixed-timestep clock.
//!
//! Converts variable frame deltas into a whole number of fixed simulation
//! steps, and optionally paces frames against the wall clock.

use std::time::{Duration, Instant};

/// Upper bound on fixed steps per frame.
const MAX_STEPS_PER_FRAME: u32 = 10;

/// Fixed-step accumulator with optional frame pacing.
#[derive(Debug)]
pub struct StepClock {
    /// Fixed step length (s)
    fixed_dt: f32,
    /// Time owed to the simulation (s)
    accumulator: f32,
    /// Wall-clock budget per frame
    frame_budget: Duration,
    /// Start of the current frame
    frame_start: Instant,
    /// Steps dropped because the simulation fell too far behind
    dropped_steps: u64,
}

impl StepClock {
    /// Create a clock stepping at `fixed_dt` for frames at `frame_rate`.
    #[must_use]
    pub fn new(fixed_dt: f32, frame_rate: u32) -> Self {
        Self {
            fixed_dt: fixed_dt.max(0.001),
            accumulator: 0.0,
            frame_budget: Duration::from_secs_f64(1.0 / f64::from(frame_rate.max(1))),
            frame_start: Instant::now(),
            dropped_steps: 0,
        }
    }

    /// Get the fixed step length.
    #[must_use]
    pub fn fixed_dt(&self) -> f32 {
        self.fixed_dt
    }

    /// Frame length implied by the frame rate (s).
    #[must_use]
    pub fn frame_dt(&self) -> f32 {
        self.frame_budget.as_secs_f32()
    }

    /// Steps dropped so far.
    #[must_use]
    pub fn dropped_steps(&self) -> u64 {
        self.dropped_steps
    }

    /// Accumulate frame time.
    /// Returns the number of fixed steps to run this frame.
    pub fn accumulate(&mut self, dt: f32) -> u32 {
        self.accumulator += dt.max(0.0);
        let mut count = 0;

        while self.accumulator >= self.fixed_dt && count < MAX_STEPS_PER_FRAME {
            self.accumulator -= self.fixed_dt;
            count += 1;
        }

        // Still behind: drop the backlog
        if self.accumulator > self.fixed_dt * 2.0 {
            self.dropped_steps += u64::from((self.accumulator / self.fixed_dt) as u32);
            self.accumulator = 0.0;
        }

        count
    }

    /// Interpolation factor between the last two fixed steps.
    #[must_use]
    #[allow(dead_code)]
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.fixed_dt).clamp(0.0, 1.0)
    }

    /// Sleep for the remainder of the frame budget, then start a new frame.
    pub fn pace(&mut self) {
        let elapsed = self.frame_start.elapsed();
        if elapsed < self.frame_budget {
            std::thread::sleep(self.frame_budget - elapsed);
        }
        self.frame_start = Instant::now();
    }
}
