//! Frame Timing
//!
//! Frame counting for the frame-synchronous render loop, plus a stopwatch
//! for measuring wall-clock spans.

use std::time::{Duration, Instant};

/// Delta time wrapper for type safety
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeltaTime(pub f64);

impl DeltaTime {
    /// Create a new delta time from seconds
    pub fn from_secs(secs: f64) -> Self {
        Self(secs)
    }

    /// Get the delta time in seconds
    pub fn as_secs(&self) -> f64 {
        self.0
    }

    /// Get the delta time in milliseconds
    pub fn as_millis(&self) -> f64 {
        self.0 * 1000.0
    }
}

impl Default for DeltaTime {
    fn default() -> Self {
        Self(1.0 / 60.0)
    }
}

impl From<Duration> for DeltaTime {
    fn from(duration: Duration) -> Self {
        Self(duration.as_secs_f64())
    }
}

/// Frame clock driving per-frame state.
///
/// Animation in the renderer advances by a fixed increment per frame, so the
/// frame count is the authoritative clock; elapsed time is tracked only for
/// reporting.
#[derive(Debug, Clone)]
pub struct FrameClock {
    frame_count: u64,
    total_time: f64,
    delta_time: f64,
    /// Frame time history for FPS smoothing
    frame_times: [f64; 60],
    frame_time_index: usize,
}

impl FrameClock {
    /// Create a clock that has not ticked yet
    pub fn new() -> Self {
        Self {
            frame_count: 0,
            total_time: 0.0,
            delta_time: 0.0,
            frame_times: [1.0 / 60.0; 60],
            frame_time_index: 0,
        }
    }

    /// Advance the clock by one frame
    pub fn tick(&mut self, delta: DeltaTime) {
        let delta = delta.as_secs().max(0.0);
        self.delta_time = delta;
        self.total_time += delta;
        self.frame_count += 1;

        self.frame_times[self.frame_time_index] = delta;
        self.frame_time_index = (self.frame_time_index + 1) % self.frame_times.len();
    }

    /// Number of frames ticked so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Total elapsed time in seconds
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Delta of the most recent frame
    pub fn delta_time(&self) -> DeltaTime {
        DeltaTime(self.delta_time)
    }

    /// Smoothed frame rate over the last 60 frames
    pub fn fps(&self) -> f64 {
        let avg = self.frame_times.iter().sum::<f64>() / self.frame_times.len() as f64;
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }

    /// Reset to the initial state
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Stopwatch for measuring elapsed time
#[derive(Debug, Clone)]
pub struct Stopwatch {
    start: Instant,
    elapsed: Duration,
    running: bool,
}

impl Stopwatch {
    /// Create and start a new stopwatch
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Duration::ZERO,
            running: true,
        }
    }

    /// Stop the stopwatch
    pub fn stop(&mut self) {
        if self.running {
            self.elapsed += self.start.elapsed();
            self.running = false;
        }
    }

    /// Get the elapsed time
    pub fn elapsed(&self) -> Duration {
        if self.running {
            self.elapsed + self.start.elapsed()
        } else {
            self.elapsed
        }
    }

    /// Get the elapsed time in seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }

    /// Check if the stopwatch is running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
