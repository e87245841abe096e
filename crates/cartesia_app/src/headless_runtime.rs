//! Headless runtime primitives for deterministic scene playback.

use anyhow::{bail, Result};
use cartesia_scene::{Scene, SceneConfig, DEFAULT_SPACING};
use tracing::trace;

/// Configuration for deterministic headless frame execution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessRunConfig {
    /// Render width in pixels.
    pub width: u32,
    /// Render height in pixels.
    pub height: u32,
    /// Frames per second of the scene clock.
    pub fps: f64,
    /// Initial pixels per logical unit.
    pub spacing: f32,
    /// Frame budget; a scene still running after this many frames is stalled.
    pub max_frames: u32,
    /// Probe sampling interval in frames (1 = every frame, 4 = every 4 frames).
    pub probe_every_frames: u32,
}

impl Default for HeadlessRunConfig {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 60.0,
            spacing: DEFAULT_SPACING,
            max_frames: 3600,
            probe_every_frames: 1,
        }
    }
}

impl HeadlessRunConfig {
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("headless dimensions must be non-zero");
        }
        if !(self.fps.is_finite() && self.fps > 0.0) {
            bail!("headless fps must be > 0");
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            bail!("headless spacing must be > 0");
        }
        if self.max_frames == 0 {
            bail!("headless max_frames must be > 0");
        }
        Ok(())
    }

    pub fn scene_config(&self) -> SceneConfig {
        SceneConfig {
            width: self.width as f32,
            height: self.height as f32,
            fps: self.fps,
            spacing: self.spacing,
        }
    }

    /// Milliseconds of scene time after `frames` frames.
    pub fn elapsed_ms(&self, frames: u64) -> u64 {
        (frames as f64 * 1000.0 / self.fps).round() as u64
    }
}

/// Frame context passed to headless frame callbacks.
#[derive(Debug, Clone, Copy)]
pub struct HeadlessContext {
    pub frame_index: u64,
    pub elapsed_ms: u64,
    /// No timeline is left running after this frame
    pub idle: bool,
}

/// How a headless run ended.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlessSummary {
    pub frames: u64,
    pub elapsed_ms: u64,
    /// Every timeline completed within the frame budget
    pub finished: bool,
    /// First timeline failure, if any
    pub failure: Option<String>,
}

/// Deterministic headless runtime loop.
pub struct HeadlessRuntime;

impl HeadlessRuntime {
    /// Tick `scene` until it is idle, a timeline fails, or the frame budget
    /// runs out. `on_frame` sees every sampled frame plus the last one; its
    /// errors abort the run.
    pub fn run<F>(cfg: HeadlessRunConfig, scene: &mut Scene, mut on_frame: F) -> Result<HeadlessSummary>
    where
        F: FnMut(&HeadlessContext, &Scene) -> Result<()>,
    {
        cfg.validate()?;
        let probe_every = u64::from(cfg.probe_every_frames.max(1));

        let mut frames = 0u64;
        let mut failure = None;
        while !scene.is_idle() && frames < u64::from(cfg.max_frames) {
            let result = scene.tick();
            frames += 1;
            let idle = scene.is_idle();
            if let Err(err) = result {
                failure = Some(err.to_string());
            }
            let last = idle || failure.is_some() || frames == u64::from(cfg.max_frames);
            if frames % probe_every == 0 || last {
                trace!(frame = scene.frame(), "probing frame");
                on_frame(
                    &HeadlessContext {
                        frame_index: scene.frame(),
                        elapsed_ms: cfg.elapsed_ms(scene.frame()),
                        idle,
                    },
                    scene,
                )?;
            }
            if failure.is_some() {
                break;
            }
        }

        Ok(HeadlessSummary {
            frames,
            elapsed_ms: cfg.elapsed_ms(frames),
            finished: failure.is_none() && scene.is_idle(),
            failure,
        })
    }
}
