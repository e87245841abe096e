//! Cartesia Animation System
//!
//! Easing curves, directive trees, and the frame-locked scheduler that runs
//! them against a [`cartesia_core::ReactiveGraph`].
//!
//! # Features
//!
//! - **Directives**: wait, tween, set, action, sequential, parallel join,
//!   staggered sequence, and delay, composed into trees up front
//! - **Deterministic clock**: fixed frame rate, no wall time
//! - **Scheduler**: resumes timelines once per tick in start order and
//!   surfaces the first failure instead of hanging

pub mod clock;
pub mod directive;
pub mod easing;
pub mod scheduler;

pub use clock::FrameClock;
pub use directive::{ActionFn, Directive, Leaf, SignalTween, TweenLeaf};
pub use easing::Easing;
pub use scheduler::{
    DirectiveState, Scheduler, TickReport, Timeline, TimelineError, TimelineId, TimelineRecord,
    TraceEvent, TraceKind, FINISHED_HISTORY,
};
