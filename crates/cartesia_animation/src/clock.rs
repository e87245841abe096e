//! Deterministic frame clock
//!
//! The clock never reads wall time. It only moves when the renderer asks for
//! the next frame, so a run is reproducible frame for frame.

/// Durations this close below a whole number of frames round down to it,
/// absorbing `f32` error in script durations such as `1.2 * 60`.
const FRAME_ROUNDING_SLACK: f64 = 1e-3;

/// A fixed-rate clock counting whole frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClock {
    /// Frames per second.
    fps: f64,
    /// Frames elapsed since the clock started.
    frame: u64,
}

impl FrameClock {
    /// Create a clock at `fps` frames per second.
    ///
    /// The rate is clamped to `1.0..=1000.0`.
    pub fn new(fps: f64) -> Self {
        Self {
            fps: fps.clamp(1.0, 1000.0),
            frame: 0,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Current frame index.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Time of the current frame in seconds.
    pub fn time(&self) -> f64 {
        self.frame as f64 / self.fps
    }

    /// Length of one frame in seconds.
    pub fn frame_duration(&self) -> f64 {
        1.0 / self.fps
    }

    /// Step forward one frame and return the new frame index.
    pub fn advance(&mut self) -> u64 {
        self.frame += 1;
        self.frame
    }

    /// Number of frames a duration in seconds occupies.
    ///
    /// Partial frames round up; zero and negative durations take no frames.
    pub fn ticks_for(&self, seconds: f32) -> u64 {
        if !(seconds > 0.0) {
            return 0;
        }
        let frames = seconds as f64 * self.fps;
        (frames - FRAME_ROUNDING_SLACK).ceil().max(0.0) as u64
    }

    /// Reset the clock to frame zero.
    pub fn reset(&mut self) {
        self.frame = 0;
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}
