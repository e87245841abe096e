//! Demo runner that plays a choreography headlessly and reports on it.

use crate::demos;
use crate::headless_report::HeadlessReport;
use crate::headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
use anyhow::{anyhow, Context, Result};
use cartesia_scene::{FrameSink, Scene};
use tracing::{info, warn};

/// Final outcome of a demo run.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Passed { report: HeadlessReport },
    Failed { report: HeadlessReport },
}

impl RunOutcome {
    pub fn report(&self) -> &HeadlessReport {
        match self {
            RunOutcome::Passed { report } => report,
            RunOutcome::Failed { report } => report,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, RunOutcome::Failed { .. })
    }
}

/// Counts presented frames on the way to the inner sink.
struct CountingSink<'a> {
    inner: &'a mut dyn FrameSink,
    presented: usize,
}

/// Build the named demo on a fresh scene and play it to the end, handing
/// sampled frames to `sink`.
///
/// Unknown demos, invalid configs and sink errors are errors; timeline
/// failures and stalls are reported as a failed outcome.
pub fn run_demo(name: &str, cfg: HeadlessRunConfig, sink: &mut dyn FrameSink) -> Result<RunOutcome> {
    cfg.validate()?;
    let demo = demos::find(name).ok_or_else(|| {
        anyhow!(
            "unknown demo '{name}' (available: {})",
            demos::names().collect::<Vec<_>>().join(", ")
        )
    })?;

    let mut scene = Scene::new(cfg.scene_config());
    let directive = (demo.build)(&mut scene).with_context(|| format!("failed to build demo '{name}'"))?;
    info!(
        demo = name,
        entities = scene.stage().len(),
        nominal_seconds = directive.nominal_duration(),
        "playing demo"
    );
    scene.play(directive)?;

    let mut sink = CountingSink { inner: sink, presented: 0 };
    sink.present(&scene)?;
    let summary = HeadlessRuntime::run(cfg, &mut scene, |_, scene| sink.present(scene))?;

    let report = HeadlessReport::from_summary(name, &summary, scene.stage().len(), sink.presented);
    if report.is_passed() {
        info!(demo = name, frames = report.elapsed_frames, "demo finished");
        Ok(RunOutcome::Passed { report })
    } else {
        warn!(demo = name, message = ?report.message, "demo did not finish");
        Ok(RunOutcome::Failed { report })
    }
}

impl CountingSink<'_> {
    fn present(&mut self, scene: &Scene) -> Result<()> {
        self.inner.present(scene.snapshot()?)?;
        self.presented += 1;
        Ok(())
    }
}
