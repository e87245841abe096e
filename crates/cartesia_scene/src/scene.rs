//! One animated scene: graph, stage, scheduler and transform together

use crate::coords::{CoordinateTransform, DEFAULT_SPACING};
use crate::error::SceneError;
use crate::snapshot::{FrameSink, FrameSnapshot};
use crate::stage::{EntityId, Stage};
use cartesia_animation::{Directive, Scheduler, TickReport, TimelineError, TimelineId};
use cartesia_core::ReactiveGraph;

/// Size, rate and initial scale of a scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneConfig {
    pub width: f32,
    pub height: f32,
    pub fps: f64,
    pub spacing: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            width: 1920.0,
            height: 1080.0,
            fps: 60.0,
            spacing: DEFAULT_SPACING,
        }
    }
}

pub struct Scene {
    config: SceneConfig,
    graph: ReactiveGraph,
    stage: Stage,
    scheduler: Scheduler,
    transform: CoordinateTransform,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let mut graph = ReactiveGraph::new();
        let transform = CoordinateTransform::new(&mut graph, config.spacing);
        Self {
            config,
            graph,
            stage: Stage::new(),
            scheduler: Scheduler::new(config.fps),
            transform,
        }
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn graph(&self) -> &ReactiveGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ReactiveGraph {
        &mut self.graph
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Graph and stage borrowed together, for building entities.
    pub fn parts_mut(&mut self) -> (&mut ReactiveGraph, &mut Stage) {
        (&mut self.graph, &mut self.stage)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn transform(&self) -> CoordinateTransform {
        self.transform
    }

    pub fn frame(&self) -> u64 {
        self.scheduler.frame()
    }

    /// Start a timeline at the current frame.
    pub fn play(&mut self, directive: Directive) -> Result<TimelineId, SceneError> {
        Ok(self.scheduler.run(&mut self.graph, directive)?)
    }

    pub fn tick(&mut self) -> Result<TickReport, SceneError> {
        Ok(self.scheduler.tick(&mut self.graph)?)
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Tick until idle, handing every frame including the current one to
    /// `sink`. Returns the number of ticks.
    pub fn play_out(&mut self, sink: &mut dyn FrameSink, max_ticks: u64) -> Result<u64, SceneError> {
        sink.present(self.snapshot()?)?;
        let mut ticks = 0;
        while !self.is_idle() {
            if ticks >= max_ticks {
                return Err(TimelineError::Stalled { ticks }.into());
            }
            self.tick()?;
            ticks += 1;
            sink.present(self.snapshot()?)?;
        }
        Ok(ticks)
    }

    pub fn snapshot(&self) -> Result<FrameSnapshot, SceneError> {
        self.stage.snapshot(&self.graph, self.frame())
    }

    pub fn destroy(&mut self, id: EntityId) -> Result<(), SceneError> {
        self.stage.destroy(&mut self.graph, id)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
