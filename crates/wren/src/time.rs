//! Frame timing and delta time.
//!
//! [`Time`] is updated by the application loop at the start of each frame
//! with the wall-clock duration the *previous* frame took; the first frame
//! sees a delta of zero. Systems and the game read it through
//! [`Context`](crate::app::Context).

use std::time::Duration;

/// Frame timing state. Owned by the application context and advanced once
/// per frame by the loop.
#[derive(Debug, Clone, Copy)]
pub struct Time {
    delta: Duration,
    elapsed: Duration,
    frame_count: u64,
}

impl Time {
    pub(crate) fn new() -> Self {
        Self {
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Record the measured duration of the previous frame.
    pub(crate) fn tick(&mut self, delta: Duration) {
        self.delta = delta;
        self.elapsed += delta;
        self.frame_count += 1;
    }

    /// Duration of the previous frame.
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta time in seconds (f32), the most common way to use it.
    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Total time spent inside the frame loop so far.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Total elapsed time in seconds (f32).
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Number of frames started so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Estimated FPS based on the last frame's delta.
    pub fn fps(&self) -> f32 {
        if self.delta.as_secs_f32() > 0.0 {
            1.0 / self.delta.as_secs_f32()
        } else {
            0.0
        }
    }
}
