//! Simulation clock driven by display frames.
//!
//! Only every `frame_divisor`-th frame advances simulated time, by
//! `speed * step_minutes`. The offset wraps back to zero past `wrap_minutes`.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FRAME_DIVISOR: u32 = 3;
pub const DEFAULT_STEP_MINUTES: f64 = 0.3;
pub const DEFAULT_WRAP_MINUTES: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    pub time_offset: f64,
    pub speed: f64,
    pub running: bool,
}

#[derive(Debug, Clone)]
pub struct SimulationClock {
    time_offset: f64,
    speed: f64,
    running: bool,
    frame_count: u64,
    frame_divisor: u32,
    step_minutes: f64,
    wrap_minutes: f64,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(DEFAULT_FRAME_DIVISOR, DEFAULT_STEP_MINUTES, DEFAULT_WRAP_MINUTES)
    }
}

impl SimulationClock {
    pub fn new(frame_divisor: u32, step_minutes: f64, wrap_minutes: f64) -> Self {
        Self {
            time_offset: 0.0,
            speed: 1.0,
            running: false,
            frame_count: 0,
            frame_divisor: frame_divisor.max(1),
            step_minutes,
            wrap_minutes,
        }
    }

    pub fn time_offset(&self) -> f64 {
        self.time_offset
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn state(&self) -> ClockState {
        ClockState {
            time_offset: self.time_offset,
            speed: self.speed,
            running: self.running,
        }
    }

    /// Start advancing. Starting a running clock is a no-op.
    pub fn start(&mut self) {
        if !self.running {
            self.running = true;
            self.frame_count = 0;
        }
    }

    /// Stop advancing. Stopping a stopped clock is a no-op.
    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.time_offset = 0.0;
        self.frame_count = 0;
    }

    /// Set the speed multiplier. Negative or non-finite values are ignored.
    pub fn set_speed(&mut self, speed: f64) -> bool {
        if speed.is_finite() && speed >= 0.0 {
            self.speed = speed;
            true
        } else {
            false
        }
    }

    /// Jump to an explicit offset, clamped into `[0, wrap_minutes]`.
    pub fn seek(&mut self, time_offset: f64) {
        if time_offset.is_finite() {
            self.time_offset = time_offset.clamp(0.0, self.wrap_minutes);
        }
    }

    /// Register one display frame. Returns the new offset when time advanced.
    pub fn on_frame(&mut self) -> Option<f64> {
        if !self.running {
            return None;
        }
        self.frame_count += 1;
        if self.frame_count % self.frame_divisor as u64 != 0 {
            return None;
        }

        let next = self.time_offset + self.speed * self.step_minutes;
        self.time_offset = if next > self.wrap_minutes { 0.0 } else { next };
        Some(self.time_offset)
    }
}
