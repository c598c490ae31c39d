//! Frame clock.
//!
//! Produces the `(elapsed, delta)` pair every animated component is stepped
//! with. Elapsed time is the sum of the deltas handed out, so pausing, scaling
//! or clamping a hitch never makes the two disagree.
//!
//! # Example
//!
//! ```ignore
//! use evergreen::time::Clock;
//!
//! let mut clock = Clock::new();
//!
//! // Once per redraw:
//! let frame = clock.update();
//! scene.frame(frame, &mut buffers);
//! ```

use std::time::{Duration, Instant};

use crate::frame::FrameTime;

/// Default upper bound on a single frame's delta, in seconds.
pub const DEFAULT_MAX_DELTA: f32 = 0.1;

/// Wall-clock driven frame timer.
#[derive(Debug)]
pub struct Clock {
    last_tick: Instant,
    elapsed: f32,
    delta: f32,
    frame_count: u64,
    fps: f32,
    fps_frames: u64,
    fps_since: Instant,
    fps_interval: Duration,
    paused: bool,
    /// Replace measured deltas with a constant.
    fixed_delta: Option<f32>,
    time_scale: f32,
    /// Longest delta handed out; longer stalls are clamped.
    max_delta: f32,
}

impl Clock {
    /// Start a clock at zero elapsed time.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            elapsed: 0.0,
            delta: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_since: now,
            fps_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
            max_delta: DEFAULT_MAX_DELTA,
        }
    }

    /// Builder: use a constant delta instead of wall-clock time.
    pub fn with_fixed_delta(mut self, delta: f32) -> Self {
        self.fixed_delta = Some(delta.max(0.0));
        self
    }

    /// Builder: set the time scale.
    pub fn with_time_scale(mut self, scale: f32) -> Self {
        self.set_time_scale(scale);
        self
    }

    /// Builder: set the per-frame delta clamp.
    pub fn with_max_delta(mut self, max_delta: f32) -> Self {
        self.max_delta = max_delta.max(0.0);
        self
    }

    /// Measure the time since the last call and advance. Call once per frame.
    pub fn update(&mut self) -> FrameTime {
        let now = Instant::now();
        let raw = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;

        let frame = self.advance(self.fixed_delta.unwrap_or(raw));

        let since = now.duration_since(self.fps_since);
        if since >= self.fps_interval {
            self.fps = (self.frame_count - self.fps_frames) as f32 / since.as_secs_f32();
            self.fps_frames = self.frame_count;
            self.fps_since = now;
        }

        log::trace!("frame {} elapsed={:.3} delta={:.4}", self.frame_count, frame.elapsed, frame.delta);
        frame
    }

    /// Advance by an explicit raw delta, applying pause, scale and clamp.
    pub fn advance(&mut self, raw_delta: f32) -> FrameTime {
        self.delta = if self.paused {
            0.0
        } else {
            (raw_delta.max(0.0) * self.time_scale).min(self.max_delta)
        };
        self.elapsed += self.delta;
        self.frame_count += 1;
        self.frame()
    }

    /// Timing of the most recent frame.
    pub fn frame(&self) -> FrameTime {
        FrameTime::new(self.elapsed, self.delta)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta
    }

    /// Frames since start.
    #[inline]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Freeze time; deltas are zero until resumed.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            // Drop the paused interval instead of replaying it as one delta
            self.last_tick = Instant::now();
            self.paused = false;
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Negative scales clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}
