//! Frame-locked timeline scheduler
//!
//! Each [`Timeline`] interprets one [`Directive`] tree. The [`Scheduler`] owns
//! the [`FrameClock`] and every timeline; a tick advances the clock, settles
//! the reactive graph at the new time, then resumes each running timeline
//! once, in the order the timelines were started.
//!
//! Nothing runs on its own thread and nothing blocks. A directive either
//! finishes during a resume or stays suspended until a later tick.

use crate::clock::FrameClock;
use crate::directive::{Directive, Leaf};
use cartesia_core::{GeometryError, ReactiveError, ReactiveGraph, TransitionHandle};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, trace, warn};

new_key_type! {
    pub struct TimelineId;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Reactive(#[from] ReactiveError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    /// A directive was resumed after it completed or failed.
    #[error("directive resumed after it already finished")]
    ResumedAfterCompletion,
    /// An action gave up for a reason of its own.
    #[error("{0}")]
    Aborted(String),
    #[error("timeline {timeline:?} failed: {source}")]
    Failed {
        timeline: TimelineId,
        #[source]
        source: Box<TimelineError>,
    },
    #[error("timeline {0:?} does not exist")]
    UnknownTimeline(TimelineId),
    #[error("timelines still running after {ticks} ticks")]
    Stalled { ticks: u64 },
}

/// Lifecycle of a directive
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveState {
    Pending,
    Running,
    Completed,
    Failed,
}

impl DirectiveState {
    pub fn is_finished(&self) -> bool {
        matches!(self, DirectiveState::Completed | DirectiveState::Failed)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TraceKind {
    Started,
    Completed,
    Failed(String),
}

/// Lifecycle change of a labeled directive
#[derive(Clone, Debug, PartialEq)]
pub struct TraceEvent {
    pub frame: u64,
    pub label: String,
    pub kind: TraceKind,
}

// ─────────────────────────────────────────────────────────────────────────────
// Task interpreter
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Progress {
    Pending,
    Done,
}

struct TickContext<'a> {
    graph: &'a mut ReactiveGraph,
    clock: &'a FrameClock,
    events: Vec<TraceEvent>,
}

impl TickContext<'_> {
    fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Frame at which something lasting `seconds` and starting now ends.
    fn end_frame(&self, seconds: f32) -> u64 {
        self.clock.frame() + self.clock.ticks_for(seconds)
    }

    fn record(&mut self, label: &str, kind: TraceKind) {
        self.events.push(TraceEvent {
            frame: self.clock.frame(),
            label: label.to_string(),
            kind,
        });
    }
}

/// Running state of a started directive
enum Task {
    Done,
    Wait {
        end: u64,
    },
    Tween {
        end: u64,
        handle: Option<TransitionHandle>,
    },
    Sequential {
        queue: VecDeque<Directive>,
        current: Option<Box<Task>>,
    },
    Parallel {
        children: Vec<Task>,
    },
    Staggered {
        /// Start frame of each child not yet started
        pending: VecDeque<(u64, Directive)>,
        running: Vec<Task>,
    },
    Delay {
        end: u64,
        inner: Option<Box<Directive>>,
        running: Option<Box<Task>>,
    },
    Labeled {
        label: String,
        inner: Box<Task>,
    },
}

impl Task {
    /// Begin a directive at the current frame. Leaves take effect here.
    fn start(directive: Directive, ctx: &mut TickContext<'_>) -> Result<Task, TimelineError> {
        let task = match directive {
            Directive::Wait(seconds) => Task::Wait {
                end: ctx.end_frame(seconds),
            },
            Directive::Leaf(Leaf::Tween(tween)) => {
                let handle = tween.begin(ctx.graph)?;
                Task::Tween {
                    end: ctx.end_frame(tween.duration()),
                    handle,
                }
            }
            Directive::Leaf(Leaf::Action(action)) => {
                action(ctx.graph)?;
                Task::Done
            }
            Directive::Sequential(children) => Task::Sequential {
                queue: children.into(),
                current: None,
            },
            Directive::Parallel(children) => {
                let mut running = Vec::with_capacity(children.len());
                for child in children {
                    running.push(Task::start(child, ctx)?);
                }
                Task::Parallel { children: running }
            }
            Directive::Staggered { gap, children } => {
                let pending = children
                    .into_iter()
                    .enumerate()
                    .map(|(i, child)| (ctx.end_frame(gap * i as f32), child))
                    .collect();
                Task::Staggered {
                    pending,
                    running: Vec::new(),
                }
            }
            Directive::Delay { duration, inner } => Task::Delay {
                end: ctx.end_frame(duration),
                inner: Some(inner),
                running: None,
            },
            Directive::Labeled { label, inner } => {
                debug!(label = %label, frame = ctx.frame(), "directive started");
                ctx.record(&label, TraceKind::Started);
                match Task::start(*inner, ctx) {
                    Ok(inner) => Task::Labeled {
                        label,
                        inner: Box::new(inner),
                    },
                    Err(err) => {
                        ctx.record(&label, TraceKind::Failed(err.to_string()));
                        return Err(err);
                    }
                }
            }
        };
        Ok(task)
    }

    /// Resume until the task suspends or completes.
    fn poll(&mut self, ctx: &mut TickContext<'_>) -> Result<Progress, TimelineError> {
        let frame = ctx.frame();
        match self {
            Task::Done => Ok(Progress::Done),
            Task::Wait { end } => Ok(if frame >= *end {
                Progress::Done
            } else {
                Progress::Pending
            }),
            Task::Tween { end, handle } => {
                if frame < *end {
                    return Ok(Progress::Pending);
                }
                // Rounding to whole frames can end the tween a hair early
                if let Some(handle) = handle.take() {
                    ctx.graph.complete_transition(handle);
                }
                Ok(Progress::Done)
            }
            Task::Sequential { queue, current } => loop {
                if current.is_none() {
                    match queue.pop_front() {
                        Some(next) => *current = Some(Box::new(Task::start(next, ctx)?)),
                        None => return Ok(Progress::Done),
                    }
                }
                let progress = match current.as_mut() {
                    Some(task) => task.poll(ctx)?,
                    None => Progress::Done,
                };
                if progress == Progress::Pending {
                    return Ok(Progress::Pending);
                }
                *current = None;
            },
            Task::Parallel { children } => poll_all(children, ctx),
            Task::Staggered { pending, running } => {
                while pending.front().is_some_and(|(start, _)| *start <= frame) {
                    if let Some((_, next)) = pending.pop_front() {
                        running.push(Task::start(next, ctx)?);
                    }
                }
                let progress = poll_all(running, ctx)?;
                Ok(if pending.is_empty() {
                    progress
                } else {
                    Progress::Pending
                })
            }
            Task::Delay {
                end,
                inner,
                running,
            } => {
                if frame >= *end {
                    if let Some(directive) = inner.take() {
                        *running = Some(Box::new(Task::start(*directive, ctx)?));
                    }
                }
                if inner.is_some() {
                    return Ok(Progress::Pending);
                }
                let progress = match running.as_mut() {
                    Some(task) => task.poll(ctx)?,
                    None => Progress::Done,
                };
                if progress == Progress::Done {
                    *running = None;
                }
                Ok(progress)
            }
            Task::Labeled { label, inner } => match inner.poll(ctx) {
                Ok(Progress::Done) => {
                    debug!(label = %label, frame, "directive completed");
                    ctx.record(label, TraceKind::Completed);
                    Ok(Progress::Done)
                }
                Ok(Progress::Pending) => Ok(Progress::Pending),
                Err(err) => {
                    ctx.record(label, TraceKind::Failed(err.to_string()));
                    Err(err)
                }
            },
        }
    }
}

/// Resume every child once, in start order, dropping the ones that finish.
/// The first failure aborts the join.
fn poll_all(children: &mut Vec<Task>, ctx: &mut TickContext<'_>) -> Result<Progress, TimelineError> {
    let mut index = 0;
    while index < children.len() {
        match children[index].poll(ctx)? {
            Progress::Done => {
                children.remove(index);
            }
            Progress::Pending => index += 1,
        }
    }
    Ok(if children.is_empty() {
        Progress::Done
    } else {
        Progress::Pending
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Timeline
// ─────────────────────────────────────────────────────────────────────────────

/// One directive tree and its progress.
///
/// Usually driven by a [`Scheduler`], but can be resumed by hand against any
/// graph and clock.
pub struct Timeline {
    label: Option<String>,
    directive: Option<Directive>,
    task: Option<Task>,
    state: DirectiveState,
    started_at: Option<u64>,
    completed_at: Option<u64>,
    events: Vec<TraceEvent>,
}

impl Timeline {
    pub fn new(directive: Directive) -> Self {
        let label = match &directive {
            Directive::Labeled { label, .. } => Some(label.clone()),
            _ => None,
        };
        Self {
            label,
            directive: Some(directive),
            task: None,
            state: DirectiveState::Pending,
            started_at: None,
            completed_at: None,
            events: Vec::new(),
        }
    }

    pub fn state(&self) -> DirectiveState {
        self.state
    }

    /// Label of the root directive, if it has one
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn started_at(&self) -> Option<u64> {
        self.started_at
    }

    pub fn completed_at(&self) -> Option<u64> {
        self.completed_at
    }

    /// Resume at the clock's current frame. The first resume starts the tree.
    ///
    /// Resuming a timeline that already finished is a programming error and
    /// fails with [`TimelineError::ResumedAfterCompletion`].
    pub fn resume(
        &mut self,
        graph: &mut ReactiveGraph,
        clock: &FrameClock,
    ) -> Result<DirectiveState, TimelineError> {
        if self.state.is_finished() {
            return Err(TimelineError::ResumedAfterCompletion);
        }
        let mut ctx = TickContext {
            graph,
            clock,
            events: Vec::new(),
        };
        let result = self.step(&mut ctx);
        self.events.append(&mut ctx.events);

        match result {
            Ok(Progress::Pending) => Ok(self.state),
            Ok(Progress::Done) => {
                self.state = DirectiveState::Completed;
                self.completed_at = Some(clock.frame());
                self.task = None;
                Ok(self.state)
            }
            Err(err) => {
                self.state = DirectiveState::Failed;
                self.task = None;
                Err(err)
            }
        }
    }

    /// Take the trace events recorded since the last call.
    pub fn take_events(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.events)
    }

    fn step(&mut self, ctx: &mut TickContext<'_>) -> Result<Progress, TimelineError> {
        if self.state == DirectiveState::Pending {
            self.state = DirectiveState::Running;
            self.started_at = Some(ctx.frame());
            let directive = self
                .directive
                .take()
                .ok_or(TimelineError::ResumedAfterCompletion)?;
            self.task = Some(Task::start(directive, ctx)?);
        }
        match self.task.as_mut() {
            Some(task) => task.poll(ctx),
            None => Ok(Progress::Done),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Finished timelines remembered for [`Scheduler::state`] and friends
pub const FINISHED_HISTORY: usize = 256;

/// What is left of a timeline once it has finished
#[derive(Clone, Debug, PartialEq)]
pub struct TimelineRecord {
    pub id: TimelineId,
    pub label: Option<String>,
    pub state: DirectiveState,
    pub started_at: Option<u64>,
    pub completed_at: Option<u64>,
}

/// Outcome of one tick
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub frame: u64,
    /// Timelines still running after the tick
    pub running: usize,
    /// Timelines that completed during the tick
    pub completed: SmallVec<[TimelineId; 4]>,
    /// Reactive transitions still in flight
    pub transitions: usize,
}

/// Drives timelines in lockstep with a frame clock.
pub struct Scheduler {
    clock: FrameClock,
    /// Timelines that have not finished yet
    timelines: SlotMap<TimelineId, Timeline>,
    /// Start order; resumes follow it
    order: Vec<TimelineId>,
    /// Most recent finished timelines, oldest first
    finished: VecDeque<TimelineRecord>,
    trace: Vec<TraceEvent>,
}

impl Scheduler {
    pub fn new(fps: f64) -> Self {
        Self::with_clock(FrameClock::new(fps))
    }

    pub fn with_clock(clock: FrameClock) -> Self {
        Self {
            clock,
            timelines: SlotMap::with_key(),
            order: Vec::new(),
            finished: VecDeque::new(),
            trace: Vec::new(),
        }
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn frame(&self) -> u64 {
        self.clock.frame()
    }

    /// Start a timeline at the current frame.
    ///
    /// Instant leaves at the head of the tree run immediately. If one of them
    /// fails, the timeline is recorded as failed and the error returned.
    pub fn run(
        &mut self,
        graph: &mut ReactiveGraph,
        directive: Directive,
    ) -> Result<TimelineId, TimelineError> {
        if graph.now() != self.clock.time() {
            graph.advance_to(self.clock.time());
        }
        let id = self.timelines.insert(Timeline::new(directive));
        self.order.push(id);
        debug!(timeline = ?id, frame = self.clock.frame(), "timeline started");
        let result = self.resume(id, graph);
        self.retire_finished();
        result?;
        Ok(id)
    }

    /// Advance one frame and resume every running timeline once.
    ///
    /// All timelines are resumed even if one fails; the first failure is
    /// returned after the tick completes.
    pub fn tick(&mut self, graph: &mut ReactiveGraph) -> Result<TickReport, TimelineError> {
        let frame = self.clock.advance();
        let transitions = graph.advance_to(self.clock.time());
        trace!(frame, transitions, "tick");

        let mut report = TickReport {
            frame,
            transitions,
            ..TickReport::default()
        };
        let mut first_error = None;
        for index in 0..self.order.len() {
            let id = self.order[index];
            let running = self
                .timelines
                .get(id)
                .is_some_and(|timeline| timeline.state() == DirectiveState::Running);
            if !running {
                continue;
            }
            match self.resume(id, graph) {
                Ok(DirectiveState::Running) => report.running += 1,
                Ok(DirectiveState::Completed) => report.completed.push(id),
                Ok(_) => {}
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        self.retire_finished();
        match first_error {
            Some(err) => Err(err),
            None => Ok(report),
        }
    }

    /// Tick until every timeline has finished.
    ///
    /// Returns the number of ticks taken, or [`TimelineError::Stalled`] if
    /// timelines are still running after `max_ticks`.
    pub fn run_to_completion(
        &mut self,
        graph: &mut ReactiveGraph,
        max_ticks: u64,
    ) -> Result<u64, TimelineError> {
        let mut ticks = 0;
        while !self.is_idle() {
            if ticks >= max_ticks {
                return Err(TimelineError::Stalled { ticks });
            }
            self.tick(graph)?;
            ticks += 1;
        }
        Ok(ticks)
    }

    /// Stop resuming a timeline.
    ///
    /// Cells keep whatever the timeline last wrote; transitions it started
    /// keep running until they settle or are overwritten.
    pub fn abandon(&mut self, id: TimelineId) -> bool {
        if self.timelines.remove(id).is_none() {
            return false;
        }
        self.order.retain(|other| *other != id);
        debug!(timeline = ?id, frame = self.clock.frame(), "timeline abandoned");
        true
    }

    /// State of a live timeline, or of one of the last [`FINISHED_HISTORY`]
    /// finished ones. Older finished timelines are forgotten.
    pub fn state(&self, id: TimelineId) -> Option<DirectiveState> {
        match self.timelines.get(id) {
            Some(timeline) => Some(timeline.state()),
            None => self.record(id).map(|record| record.state),
        }
    }

    /// A timeline that has not finished yet
    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id)
    }

    pub fn record(&self, id: TimelineId) -> Option<&TimelineRecord> {
        self.finished.iter().rev().find(|record| record.id == id)
    }

    pub fn started_at(&self, id: TimelineId) -> Option<u64> {
        match self.timelines.get(id) {
            Some(timeline) => timeline.started_at(),
            None => self.record(id).and_then(|record| record.started_at),
        }
    }

    pub fn completed_at(&self, id: TimelineId) -> Option<u64> {
        match self.timelines.get(id) {
            Some(timeline) => timeline.completed_at(),
            None => self.record(id).and_then(|record| record.completed_at),
        }
    }

    /// Timelines still waiting to be resumed, in start order
    pub fn live_count(&self) -> usize {
        self.order.len()
    }

    /// No timeline is waiting to be resumed.
    pub fn is_idle(&self) -> bool {
        self.timelines
            .values()
            .all(|timeline| timeline.state().is_finished())
    }

    pub fn running_count(&self) -> usize {
        self.timelines
            .values()
            .filter(|timeline| timeline.state() == DirectiveState::Running)
            .count()
    }

    /// Labeled directive events, in the order they happened
    pub fn trace(&self) -> &[TraceEvent] {
        &self.trace
    }

    pub fn take_trace(&mut self) -> Vec<TraceEvent> {
        std::mem::take(&mut self.trace)
    }

    /// Move finished timelines out of the resume order into the history.
    fn retire_finished(&mut self) {
        let timelines = &mut self.timelines;
        let finished = &mut self.finished;
        self.order.retain(|id| {
            let done = timelines
                .get(*id)
                .map_or(true, |timeline| timeline.state().is_finished());
            if done {
                if let Some(timeline) = timelines.remove(*id) {
                    if finished.len() == FINISHED_HISTORY {
                        finished.pop_front();
                    }
                    finished.push_back(TimelineRecord {
                        id: *id,
                        label: timeline.label().map(str::to_string),
                        state: timeline.state(),
                        started_at: timeline.started_at(),
                        completed_at: timeline.completed_at(),
                    });
                }
            }
            !done
        });
    }

    fn resume(
        &mut self,
        id: TimelineId,
        graph: &mut ReactiveGraph,
    ) -> Result<DirectiveState, TimelineError> {
        let timeline = self
            .timelines
            .get_mut(id)
            .ok_or(TimelineError::UnknownTimeline(id))?;
        let result = timeline.resume(graph, &self.clock);
        self.trace.extend(timeline.take_events());
        match result {
            Ok(DirectiveState::Completed) => {
                debug!(timeline = ?id, frame = self.clock.frame(), "timeline completed");
                Ok(DirectiveState::Completed)
            }
            Ok(state) => Ok(state),
            Err(err) => {
                warn!(timeline = ?id, frame = self.clock.frame(), error = %err, "timeline failed");
                Err(TimelineError::Failed {
                    timeline: id,
                    source: Box::new(err),
                })
            }
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(60.0)
    }
}
