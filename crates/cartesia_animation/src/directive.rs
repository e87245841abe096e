//! Directive trees
//!
//! A [`Directive`] describes timeline work without running it. Choreography
//! builds a tree of directives up front; the [`Scheduler`](crate::Scheduler)
//! interprets the tree one frame at a time.
//!
//! ```
//! use cartesia_animation::{Directive, Easing};
//! use cartesia_core::ReactiveGraph;
//!
//! let mut graph = ReactiveGraph::new();
//! let opacity = graph.create_signal(0.0f32);
//! let scale = graph.create_signal(1.0f32);
//!
//! let intro = Directive::all([
//!     Directive::tween(opacity, 1.0, 0.5, Easing::EaseOutCubic),
//!     Directive::tween(scale, 2.0, 1.0, Easing::SOFT_BACK),
//! ])
//! .then(Directive::wait(0.25))
//! .labeled("intro");
//!
//! assert_eq!(intro.nominal_duration(), 1.25);
//! ```

use crate::easing::Easing;
use crate::scheduler::TimelineError;
use cartesia_core::{Animatable, ReactiveError, ReactiveGraph, Signal, TransitionHandle};
use std::fmt;

/// Instant mutation run when its directive starts.
pub type ActionFn = Box<dyn FnOnce(&mut ReactiveGraph) -> Result<(), TimelineError>>;

/// An animated write to one cell.
pub trait TweenLeaf {
    /// Seconds the tween occupies on the timeline
    fn duration(&self) -> f32;

    /// Start the transition at the graph's current time.
    fn begin(&self, graph: &mut ReactiveGraph) -> Result<Option<TransitionHandle>, ReactiveError>;
}

/// Tween of a single signal towards a fixed target
pub struct SignalTween<T> {
    signal: Signal<T>,
    target: T,
    duration: f32,
    easing: Easing,
}

impl<T: Animatable> SignalTween<T> {
    pub fn new(signal: Signal<T>, target: T, duration: f32, easing: Easing) -> Self {
        Self {
            signal,
            target,
            duration,
            easing,
        }
    }
}

impl<T: Animatable> TweenLeaf for SignalTween<T> {
    fn duration(&self) -> f32 {
        self.duration
    }

    fn begin(&self, graph: &mut ReactiveGraph) -> Result<Option<TransitionHandle>, ReactiveError> {
        graph.animate(self.signal, self.target.clone(), self.duration, self.easing)
    }
}

/// Terminal work
pub enum Leaf {
    Tween(Box<dyn TweenLeaf>),
    Action(ActionFn),
}

/// A unit of timeline work.
pub enum Directive {
    /// Consume time without touching any cell
    Wait(f32),
    Leaf(Leaf),
    /// Each child starts when the previous one completes
    Sequential(Vec<Directive>),
    /// All children start together; completes when the last one does
    Parallel(Vec<Directive>),
    /// Child `i` starts `i * gap` seconds after the group, whatever the
    /// others are doing
    Staggered { gap: f32, children: Vec<Directive> },
    /// Holds `inner` back for `duration` seconds
    Delay { duration: f32, inner: Box<Directive> },
    /// Names a subtree in the scheduler trace
    Labeled { label: String, inner: Box<Directive> },
}

impl Directive {
    pub fn wait(seconds: f32) -> Self {
        Directive::Wait(seconds)
    }

    /// Directive that completes as soon as it starts
    pub fn empty() -> Self {
        Directive::Sequential(Vec::new())
    }

    /// Parallel join
    pub fn all(children: impl IntoIterator<Item = Directive>) -> Self {
        Directive::Parallel(children.into_iter().collect())
    }

    /// Sequential composition
    pub fn chain(children: impl IntoIterator<Item = Directive>) -> Self {
        Directive::Sequential(children.into_iter().collect())
    }

    /// Staggered start, `gap` seconds apart
    pub fn sequence(gap: f32, children: impl IntoIterator<Item = Directive>) -> Self {
        Directive::Staggered {
            gap,
            children: children.into_iter().collect(),
        }
    }

    pub fn delay(seconds: f32, inner: Directive) -> Self {
        Directive::Delay {
            duration: seconds,
            inner: Box::new(inner),
        }
    }

    /// Animated write; completes once `duration` has elapsed with the cell
    /// at `target`. A non-positive duration is an instant write.
    pub fn tween<T: Animatable>(signal: Signal<T>, target: T, duration: f32, easing: Easing) -> Self {
        Directive::Leaf(Leaf::Tween(Box::new(SignalTween::new(
            signal, target, duration, easing,
        ))))
    }

    /// Instant write
    pub fn set<T: Animatable>(signal: Signal<T>, value: T) -> Self {
        Directive::action(move |graph| Ok(graph.set(signal, value)?))
    }

    pub fn action<F>(action: F) -> Self
    where
        F: FnOnce(&mut ReactiveGraph) -> Result<(), TimelineError> + 'static,
    {
        Directive::Leaf(Leaf::Action(Box::new(action)))
    }

    /// Run `next` after `self` completes.
    pub fn then(self, next: Directive) -> Self {
        match self {
            Directive::Sequential(mut children) => {
                children.push(next);
                Directive::Sequential(children)
            }
            other => Directive::Sequential(vec![other, next]),
        }
    }

    pub fn labeled(self, label: impl Into<String>) -> Self {
        Directive::Labeled {
            label: label.into(),
            inner: Box::new(self),
        }
    }

    /// Seconds the tree takes when nothing fails.
    pub fn nominal_duration(&self) -> f32 {
        match self {
            Directive::Wait(seconds) => seconds.max(0.0),
            Directive::Leaf(Leaf::Tween(tween)) => tween.duration().max(0.0),
            Directive::Leaf(Leaf::Action(_)) => 0.0,
            Directive::Sequential(children) => children.iter().map(Directive::nominal_duration).sum(),
            Directive::Parallel(children) => children
                .iter()
                .map(Directive::nominal_duration)
                .fold(0.0, f32::max),
            Directive::Staggered { gap, children } => children
                .iter()
                .enumerate()
                .map(|(i, child)| gap.max(0.0) * i as f32 + child.nominal_duration())
                .fold(0.0, f32::max),
            Directive::Delay { duration, inner } => duration.max(0.0) + inner.nominal_duration(),
            Directive::Labeled { inner, .. } => inner.nominal_duration(),
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Wait(seconds) => f.debug_tuple("Wait").field(seconds).finish(),
            Directive::Leaf(Leaf::Tween(tween)) => {
                f.debug_struct("Tween").field("duration", &tween.duration()).finish()
            }
            Directive::Leaf(Leaf::Action(_)) => f.write_str("Action"),
            Directive::Sequential(children) => f.debug_tuple("Sequential").field(children).finish(),
            Directive::Parallel(children) => f.debug_tuple("Parallel").field(children).finish(),
            Directive::Staggered { gap, children } => f
                .debug_struct("Staggered")
                .field("gap", gap)
                .field("children", children)
                .finish(),
            Directive::Delay { duration, inner } => f
                .debug_struct("Delay")
                .field("duration", duration)
                .field("inner", inner)
                .finish(),
            Directive::Labeled { label, inner } => f
                .debug_struct("Labeled")
                .field("label", label)
                .field("inner", inner)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_durations() {
        assert_eq!(Directive::wait(2.0).nominal_duration(), 2.0);
        assert_eq!(
            Directive::all([Directive::wait(2.0), Directive::wait(5.0)]).nominal_duration(),
            5.0
        );
        assert_eq!(
            Directive::chain([Directive::wait(2.0), Directive::wait(5.0)]).nominal_duration(),
            7.0
        );
        assert_eq!(
            Directive::sequence(1.0, [Directive::wait(3.0), Directive::wait(3.0)]).nominal_duration(),
            4.0
        );
        assert_eq!(
            Directive::delay(0.5, Directive::wait(1.0)).nominal_duration(),
            1.5
        );
        assert_eq!(Directive::empty().nominal_duration(), 0.0);
        assert_eq!(Directive::wait(-1.0).nominal_duration(), 0.0);
    }

    #[test]
    fn test_then_flattens_chains() {
        let chained = Directive::wait(1.0)
            .then(Directive::wait(2.0))
            .then(Directive::wait(3.0));
        match chained {
            Directive::Sequential(children) => assert_eq!(children.len(), 3),
            other => panic!("expected a sequential directive, got {other:?}"),
        }
    }

    #[test]
    fn test_tween_and_set_durations() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        assert_eq!(Directive::tween(x, 1.0, 0.8, Easing::Linear).nominal_duration(), 0.8);
        assert_eq!(Directive::set(x, 1.0).nominal_duration(), 0.0);
        let labeled = Directive::set(x, 1.0).labeled("snap");
        assert!(format!("{labeled:?}").contains("snap"));
    }
}
