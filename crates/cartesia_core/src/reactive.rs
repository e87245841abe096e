//! Reactive cells with animated transitions
//!
//! A [`ReactiveGraph`] owns every cell in a scene. Two kinds of node exist:
//!
//! - **Signals**: mutable values. A write is either instant ([`ReactiveGraph::set`])
//!   or an animated transition ([`ReactiveGraph::animate`]) that moves from the
//!   currently resolved value to a target over a duration, shaped by an [`Ease`].
//! - **Derived values**: read-only closures over other nodes. They are never
//!   cached; every [`ReactiveGraph::get_derived`] re-runs the closure. Reads made
//!   during evaluation are recorded as dependencies so that writes can mark
//!   dependents dirty in a well-defined order.
//!
//! Time only moves through [`ReactiveGraph::advance_to`]. Between two advances
//! every read of a transitioning signal resolves to the same value, so a frame
//! always observes one consistent snapshot.

use crate::geometry::{Color, Vec2};
use rustc_hash::FxHashSet;
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Slack applied when comparing elapsed time against a duration, so that a
/// transition sampled on the frame its duration ends resolves to the target.
pub const TIME_EPSILON: f64 = 1e-6;

new_key_type! {
    /// Unique identifier for a signal
    pub struct SignalId;
    /// Unique identifier for a derived value
    pub struct DerivedId;
}

/// Identifies one animated write. Completing it through
/// [`ReactiveGraph::complete_transition`] has no effect once a later write
/// replaced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransitionHandle {
    signal: SignalId,
    generation: u64,
}

impl TransitionHandle {
    pub fn signal(&self) -> SignalId {
        self.signal
    }
}

/// Any node in the graph
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeId {
    Signal(SignalId),
    Derived(DerivedId),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReactiveError {
    #[error("signal {0:?} no longer exists")]
    MissingSignal(SignalId),
    #[error("derived value {0:?} no longer exists")]
    MissingDerived(DerivedId),
    #[error("signal {0:?} holds a value of a different type")]
    SignalTypeMismatch(SignalId),
    #[error("derived value {0:?} produces a value of a different type")]
    DerivedTypeMismatch(DerivedId),
    #[error("derived value {0:?} was read during its own evaluation")]
    Cycle(DerivedId),
}

// ─────────────────────────────────────────────────────────────────────────────
// Value traits
// ─────────────────────────────────────────────────────────────────────────────

/// Shapes the progress of a transition. `t` runs from 0.0 to 1.0; the result
/// may overshoot either end.
pub trait Ease {
    fn ease(&self, t: f32) -> f32;
}

/// Identity easing
#[derive(Clone, Copy, Debug, Default)]
pub struct LinearEase;

impl Ease for LinearEase {
    fn ease(&self, t: f32) -> f32 {
        t
    }
}

/// Values a signal can hold and transition between.
pub trait Animatable: Clone + 'static {
    /// Value at eased progress `t` on the way from `self` to `target`.
    fn interpolate(&self, target: &Self, t: f32) -> Self;
}

impl Animatable for f32 {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        self + (target - self) * t
    }
}

impl Animatable for f64 {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        self + (target - self) * t as f64
    }
}

impl Animatable for Vec2 {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        Vec2::lerp(*self, *target, t)
    }
}

impl Animatable for Color {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        Color::lerp(*self, *target, t)
    }
}

impl Animatable for bool {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        if t >= 1.0 {
            *target
        } else {
            *self
        }
    }
}

impl Animatable for String {
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        if t >= 1.0 {
            target.clone()
        } else {
            self.clone()
        }
    }
}

impl Animatable for Vec<Vec2> {
    /// Point-wise when both polylines have the same length, otherwise the
    /// target replaces the source once the transition completes.
    fn interpolate(&self, target: &Self, t: f32) -> Self {
        if self.len() == target.len() {
            self.iter()
                .zip(target)
                .map(|(a, b)| Vec2::lerp(*a, *b, t))
                .collect()
        } else if t >= 1.0 {
            target.clone()
        } else {
            self.clone()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Typed handles
// ─────────────────────────────────────────────────────────────────────────────

/// Typed handle to a signal
pub struct Signal<T> {
    id: SignalId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Signal<T> {
    pub fn id(&self) -> SignalId {
        self.id
    }
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Signal").field(&self.id).finish()
    }
}

/// Typed handle to a derived value
pub struct Derived<T> {
    id: DerivedId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Derived<T> {
    pub fn id(&self) -> DerivedId {
        self.id
    }
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Derived<T> {}

impl<T> PartialEq for Derived<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Derived<T> {}

impl<T> fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Derived").field(&self.id).finish()
    }
}

/// A property that is either written directly or computed from other cells.
pub enum Binding<T> {
    Signal(Signal<T>),
    Derived(Derived<T>),
}

impl<T> Clone for Binding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Binding<T> {}

impl<T> fmt::Debug for Binding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Binding::Signal(s) => s.fmt(f),
            Binding::Derived(d) => d.fmt(f),
        }
    }
}

impl<T> From<Signal<T>> for Binding<T> {
    fn from(signal: Signal<T>) -> Self {
        Binding::Signal(signal)
    }
}

impl<T> From<Derived<T>> for Binding<T> {
    fn from(derived: Derived<T>) -> Self {
        Binding::Derived(derived)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage
// ─────────────────────────────────────────────────────────────────────────────

struct Transition<T> {
    from: T,
    to: T,
    start: f64,
    duration: f64,
    easing: Box<dyn Ease>,
    generation: u64,
}

impl<T: Animatable> Transition<T> {
    fn is_finished(&self, now: f64) -> bool {
        now - self.start + TIME_EPSILON >= self.duration
    }

    fn sample(&self, now: f64) -> T {
        if self.is_finished(now) {
            return self.to.clone();
        }
        let progress = ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32;
        self.from.interpolate(&self.to, self.easing.ease(progress))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SettleState {
    Idle,
    InFlight,
    Finished,
}

trait CellSlot {
    fn settle(&mut self, now: f64) -> SettleState;
    /// Jump straight to the target if `generation` is the active transition.
    fn complete(&mut self, generation: u64) -> bool;
    fn is_animating(&self) -> bool;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct TypedCell<T> {
    value: T,
    transition: Option<Transition<T>>,
}

impl<T: Animatable> TypedCell<T> {
    fn resolve(&self, now: f64) -> T {
        match &self.transition {
            Some(transition) => transition.sample(now),
            None => self.value.clone(),
        }
    }
}

impl<T: Animatable> CellSlot for TypedCell<T> {
    fn settle(&mut self, now: f64) -> SettleState {
        let Some(transition) = self.transition.take() else {
            return SettleState::Idle;
        };
        if transition.is_finished(now) {
            self.value = transition.to;
            SettleState::Finished
        } else {
            self.transition = Some(transition);
            SettleState::InFlight
        }
    }

    fn complete(&mut self, generation: u64) -> bool {
        match self.transition.take() {
            Some(transition) if transition.generation == generation => {
                self.value = transition.to;
                true
            }
            other => {
                self.transition = other;
                false
            }
        }
    }

    fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct SignalNode {
    cell: Box<dyn CellSlot>,
    subscribers: RefCell<SmallVec<[DerivedId; 4]>>,
}

type ComputeFn<T> = Box<dyn Fn(&ReactiveGraph) -> T>;

struct DerivedNode {
    /// Holds a `ComputeFn<T>`
    compute: Box<dyn Any>,
    dependencies: RefCell<SmallVec<[NodeId; 4]>>,
    subscribers: RefCell<SmallVec<[DerivedId; 4]>>,
    dirty: Cell<bool>,
}

fn push_unique<A>(list: &RefCell<SmallVec<A>>, item: A::Item)
where
    A: smallvec::Array,
    A::Item: PartialEq,
{
    let mut list = list.borrow_mut();
    if !list.contains(&item) {
        list.push(item);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Graph
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of all signals and derived values of one scene.
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    derived: SlotMap<DerivedId, DerivedNode>,
    /// Clock time in seconds of the last resolved frame
    now: f64,
    /// Derived values currently being evaluated, innermost last
    evaluating: RefCell<Vec<DerivedId>>,
    /// First cycle detected during the current outermost evaluation
    cycle: Cell<Option<DerivedId>>,
    next_generation: u64,
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            derived: SlotMap::with_key(),
            now: 0.0,
            evaluating: RefCell::new(Vec::new()),
            cycle: Cell::new(None),
            next_generation: 0,
        }
    }

    /// Time in seconds at which reads are currently resolved.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn derived_count(&self) -> usize {
        self.derived.len()
    }

    // ── Signals ─────────────────────────────────────────────────────────────

    /// Create a signal holding `value`
    pub fn create_signal<T: Animatable>(&mut self, value: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            cell: Box::new(TypedCell {
                value,
                transition: None,
            }),
            subscribers: RefCell::new(SmallVec::new()),
        });
        Signal {
            id,
            _marker: PhantomData,
        }
    }

    /// Resolved value of a signal at the current time.
    ///
    /// Returns `None` if the signal was removed.
    pub fn get<T: Animatable>(&self, signal: Signal<T>) -> Option<T> {
        self.try_get(signal).ok()
    }

    pub fn try_get<T: Animatable>(&self, signal: Signal<T>) -> Result<T, ReactiveError> {
        let node = self
            .signals
            .get(signal.id)
            .ok_or(ReactiveError::MissingSignal(signal.id))?;
        let cell = node
            .cell
            .as_any()
            .downcast_ref::<TypedCell<T>>()
            .ok_or(ReactiveError::SignalTypeMismatch(signal.id))?;
        self.track(NodeId::Signal(signal.id));
        Ok(cell.resolve(self.now))
    }

    /// Instant write. Any in-flight transition is discarded.
    pub fn set<T: Animatable>(&mut self, signal: Signal<T>, value: T) -> Result<(), ReactiveError> {
        let cell = self.typed_cell_mut(signal)?;
        cell.transition = None;
        cell.value = value;
        self.invalidate(signal.id);
        Ok(())
    }

    /// Animated write from the currently resolved value to `target`.
    ///
    /// Replaces any in-flight transition; elapsed time restarts at zero. A
    /// non-positive duration is an instant write of the target and returns
    /// no handle.
    pub fn animate<T: Animatable>(
        &mut self,
        signal: Signal<T>,
        target: T,
        duration: f32,
        easing: impl Ease + 'static,
    ) -> Result<Option<TransitionHandle>, ReactiveError> {
        if !(duration > 0.0) {
            self.set(signal, target)?;
            return Ok(None);
        }
        let now = self.now;
        let generation = self.next_generation;
        self.next_generation += 1;
        let cell = self.typed_cell_mut(signal)?;
        let from = cell.resolve(now);
        cell.value = from.clone();
        cell.transition = Some(Transition {
            from,
            to: target,
            start: now,
            duration: duration as f64,
            easing: Box::new(easing),
            generation,
        });
        self.invalidate(signal.id);
        Ok(Some(TransitionHandle {
            signal: signal.id,
            generation,
        }))
    }

    /// Settle a transition at its target ahead of time.
    ///
    /// Returns `false` if the transition already settled or was replaced.
    pub fn complete_transition(&mut self, handle: TransitionHandle) -> bool {
        let Some(node) = self.signals.get_mut(handle.signal) else {
            return false;
        };
        let completed = node.cell.complete(handle.generation);
        if completed {
            self.invalidate(handle.signal);
        }
        completed
    }

    /// Whether the signal has a transition that has not settled yet.
    pub fn is_animating<T>(&self, signal: Signal<T>) -> bool {
        self.signals
            .get(signal.id)
            .is_some_and(|node| node.cell.is_animating())
    }

    pub fn has_active_transitions(&self) -> bool {
        self.signals.values().any(|node| node.cell.is_animating())
    }

    pub fn remove_signal<T>(&mut self, signal: Signal<T>) -> bool {
        self.signals.remove(signal.id).is_some()
    }

    fn typed_cell_mut<T: Animatable>(
        &mut self,
        signal: Signal<T>,
    ) -> Result<&mut TypedCell<T>, ReactiveError> {
        let node = self
            .signals
            .get_mut(signal.id)
            .ok_or(ReactiveError::MissingSignal(signal.id))?;
        node.cell
            .as_any_mut()
            .downcast_mut::<TypedCell<T>>()
            .ok_or(ReactiveError::SignalTypeMismatch(signal.id))
    }

    // ── Derived values ──────────────────────────────────────────────────────

    /// Create a derived value. The closure runs on every read.
    pub fn create_derived<T, F>(&mut self, compute: F) -> Derived<T>
    where
        T: 'static,
        F: Fn(&ReactiveGraph) -> T + 'static,
    {
        let compute: ComputeFn<T> = Box::new(compute);
        let id = self.derived.insert(DerivedNode {
            compute: Box::new(compute),
            dependencies: RefCell::new(SmallVec::new()),
            subscribers: RefCell::new(SmallVec::new()),
            dirty: Cell::new(true),
        });
        Derived {
            id,
            _marker: PhantomData,
        }
    }

    /// Evaluate a derived value.
    ///
    /// Fails with [`ReactiveError::Cycle`] if any derived value reads itself,
    /// directly or through others, while it is being evaluated. The error is
    /// reported by the outermost evaluation even if an inner closure ignored
    /// the failed read.
    pub fn get_derived<T: 'static>(&self, derived: Derived<T>) -> Result<T, ReactiveError> {
        let node = self
            .derived
            .get(derived.id)
            .ok_or(ReactiveError::MissingDerived(derived.id))?;
        let compute = node
            .compute
            .downcast_ref::<ComputeFn<T>>()
            .ok_or(ReactiveError::DerivedTypeMismatch(derived.id))?;

        if self.evaluating.borrow().contains(&derived.id) {
            tracing::warn!(derived = ?derived.id, "derived value read during its own evaluation");
            if self.cycle.get().is_none() {
                self.cycle.set(Some(derived.id));
            }
            return Err(ReactiveError::Cycle(derived.id));
        }

        self.track(NodeId::Derived(derived.id));
        node.dependencies.borrow_mut().clear();

        self.evaluating.borrow_mut().push(derived.id);
        let value = compute(self);
        self.evaluating.borrow_mut().pop();
        node.dirty.set(false);

        if self.evaluating.borrow().is_empty() {
            if let Some(cycle) = self.cycle.take() {
                return Err(ReactiveError::Cycle(cycle));
            }
        }
        Ok(value)
    }

    /// Read either kind of binding.
    pub fn read<T: Animatable>(&self, binding: Binding<T>) -> Result<T, ReactiveError> {
        match binding {
            Binding::Signal(signal) => self.try_get(signal),
            Binding::Derived(derived) => self.get_derived(derived),
        }
    }

    pub fn remove_derived<T>(&mut self, derived: Derived<T>) -> bool {
        self.derived.remove(derived.id).is_some()
    }

    /// Remove a node of either kind.
    pub fn remove_node(&mut self, node: NodeId) -> bool {
        match node {
            NodeId::Signal(id) => self.signals.remove(id).is_some(),
            NodeId::Derived(id) => self.derived.remove(id).is_some(),
        }
    }

    /// Whether an input of the derived value changed since it was last read.
    pub fn is_dirty<T>(&self, derived: Derived<T>) -> bool {
        self.derived
            .get(derived.id)
            .is_some_and(|node| node.dirty.get())
    }

    /// All derived values invalidated since their last read.
    pub fn dirty_derived(&self) -> Vec<DerivedId> {
        self.derived
            .iter()
            .filter(|(_, node)| node.dirty.get())
            .map(|(id, _)| id)
            .collect()
    }

    /// Nodes read by the most recent evaluation of a derived value.
    pub fn dependencies_of<T>(&self, derived: Derived<T>) -> Vec<NodeId> {
        self.derived
            .get(derived.id)
            .map(|node| node.dependencies.borrow().to_vec())
            .unwrap_or_default()
    }

    // ── Time ────────────────────────────────────────────────────────────────

    /// Move the graph to clock time `now` (seconds).
    ///
    /// Finished transitions settle to their exact targets; every signal that
    /// was transitioning invalidates its dependents. Returns the number of
    /// transitions still in flight.
    pub fn advance_to(&mut self, now: f64) -> usize {
        self.now = now;
        let mut touched: SmallVec<[SignalId; 16]> = SmallVec::new();
        let mut in_flight = 0;
        for (id, node) in self.signals.iter_mut() {
            match node.cell.settle(now) {
                SettleState::Idle => {}
                SettleState::InFlight => {
                    in_flight += 1;
                    touched.push(id);
                }
                SettleState::Finished => touched.push(id),
            }
        }
        for id in touched {
            self.invalidate(id);
        }
        tracing::trace!(now, in_flight, "reactive graph advanced");
        in_flight
    }

    // ── Tracking ────────────────────────────────────────────────────────────

    /// Record a read made by the innermost evaluating derived value.
    fn track(&self, node: NodeId) {
        let Some(&reader) = self.evaluating.borrow().last() else {
            return;
        };
        let Some(reader_node) = self.derived.get(reader) else {
            return;
        };
        push_unique(&reader_node.dependencies, node);
        match node {
            NodeId::Signal(id) => {
                if let Some(signal) = self.signals.get(id) {
                    push_unique(&signal.subscribers, reader);
                }
            }
            NodeId::Derived(id) => {
                if let Some(derived) = self.derived.get(id) {
                    push_unique(&derived.subscribers, reader);
                }
            }
        }
    }

    /// Mark every derived value downstream of a signal dirty, breadth first.
    fn invalidate(&self, signal: SignalId) {
        let Some(node) = self.signals.get(signal) else {
            return;
        };
        let mut queue: Vec<DerivedId> = node.subscribers.borrow().to_vec();
        let mut visited: FxHashSet<DerivedId> = FxHashSet::default();
        let mut index = 0;
        while index < queue.len() {
            let id = queue[index];
            index += 1;
            if !visited.insert(id) {
                continue;
            }
            if let Some(derived) = self.derived.get(id) {
                derived.dirty.set(true);
                queue.extend(derived.subscribers.borrow().iter().copied());
            }
        }
    }
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_signal_get_set() {
        let mut graph = ReactiveGraph::new();
        let count = graph.create_signal(0.0f32);
        assert_eq!(graph.get(count), Some(0.0));

        graph.set(count, 5.0).unwrap();
        assert_eq!(graph.get(count), Some(5.0));
    }

    #[test]
    fn test_derived_recomputes_every_read() {
        let mut graph = ReactiveGraph::new();
        let count = graph.create_signal(2.0f32);
        let runs = Rc::new(Cell::new(0));
        let runs_clone = runs.clone();
        let doubled = graph.create_derived(move |g| {
            runs_clone.set(runs_clone.get() + 1);
            g.get(count).unwrap_or(0.0) * 2.0
        });

        assert_eq!(graph.get_derived(doubled), Ok(4.0));
        assert_eq!(graph.get_derived(doubled), Ok(4.0));
        assert_eq!(runs.get(), 2);

        graph.set(count, 5.0).unwrap();
        assert_eq!(graph.get_derived(doubled), Ok(10.0));
    }

    #[test]
    fn test_dependencies_are_recorded() {
        let mut graph = ReactiveGraph::new();
        let a = graph.create_signal(1.0f32);
        let b = graph.create_signal(2.0f32);
        let sum = graph.create_derived(move |g| g.get(a).unwrap_or(0.0) + g.get(b).unwrap_or(0.0));
        let outer = graph.create_derived(move |g| g.get_derived(sum).unwrap_or(0.0) * 10.0);

        assert_eq!(graph.get_derived(outer), Ok(30.0));
        assert_eq!(
            graph.dependencies_of(sum),
            vec![NodeId::Signal(a.id()), NodeId::Signal(b.id())]
        );
        assert_eq!(graph.dependencies_of(outer), vec![NodeId::Derived(sum.id())]);
    }

    #[test]
    fn test_write_marks_transitive_dependents_dirty() {
        let mut graph = ReactiveGraph::new();
        let a = graph.create_signal(1.0f32);
        let unrelated = graph.create_signal(0.0f32);
        let inner = graph.create_derived(move |g| g.get(a).unwrap_or(0.0) + 1.0);
        let outer = graph.create_derived(move |g| g.get_derived(inner).unwrap_or(0.0) * 2.0);

        assert!(graph.is_dirty(outer));
        graph.get_derived(outer).unwrap();
        assert!(!graph.is_dirty(inner));
        assert!(!graph.is_dirty(outer));

        graph.set(unrelated, 3.0).unwrap();
        assert!(graph.dirty_derived().is_empty());

        graph.set(a, 4.0).unwrap();
        assert!(graph.is_dirty(inner));
        assert!(graph.is_dirty(outer));
        assert_eq!(graph.get_derived(outer), Ok(10.0));
    }

    #[test]
    fn test_self_read_is_a_cycle_error() {
        let mut graph = ReactiveGraph::new();
        let slot: Rc<Cell<Option<Derived<f32>>>> = Rc::new(Cell::new(None));
        let slot_clone = slot.clone();
        let looping = graph.create_derived(move |g| match slot_clone.get() {
            // Swallowing the inner error must not hide the cycle
            Some(me) => g.get_derived(me).unwrap_or(0.0) + 1.0,
            None => 0.0,
        });
        slot.set(Some(looping));

        assert_eq!(
            graph.get_derived(looping),
            Err(ReactiveError::Cycle(looping.id()))
        );
        // The graph recovers for unrelated reads
        let fine = graph.create_derived(|_| 1.0f32);
        assert_eq!(graph.get_derived(fine), Ok(1.0));
    }

    #[test]
    fn test_indirect_cycle_is_detected() {
        let mut graph = ReactiveGraph::new();
        let slot: Rc<Cell<Option<Derived<f32>>>> = Rc::new(Cell::new(None));
        let slot_clone = slot.clone();
        let first = graph.create_derived(move |g| {
            slot_clone
                .get()
                .map(|second| g.get_derived(second).unwrap_or(0.0))
                .unwrap_or(0.0)
        });
        let second = graph.create_derived(move |g| g.get_derived(first).unwrap_or(0.0));
        slot.set(Some(second));

        assert!(matches!(
            graph.get_derived(first),
            Err(ReactiveError::Cycle(_))
        ));
    }

    #[test]
    fn test_animate_resolves_with_easing_progress() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        graph.animate(x, 10.0, 2.0, LinearEase).unwrap();

        assert_eq!(graph.get(x), Some(0.0));
        graph.advance_to(0.5);
        assert_eq!(graph.get(x), Some(2.5));
        graph.advance_to(1.0);
        assert_eq!(graph.get(x), Some(5.0));
        assert!(graph.is_animating(x));

        graph.advance_to(2.0);
        assert_eq!(graph.get(x), Some(10.0));
        assert!(!graph.is_animating(x));

        // Past the end stays clamped
        graph.advance_to(5.0);
        assert_eq!(graph.get(x), Some(10.0));
    }

    #[test]
    fn test_reads_within_one_frame_are_consistent() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        graph.animate(x, 1.0, 1.0, LinearEase).unwrap();
        graph.advance_to(0.3);
        let first = graph.get(x);
        let second = graph.get(x);
        assert_eq!(first, second);
    }

    #[test]
    fn test_animate_restarts_from_resolved_value() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        graph.animate(x, 10.0, 1.0, LinearEase).unwrap();
        graph.advance_to(0.5);
        assert_eq!(graph.get(x), Some(5.0));

        graph.animate(x, 0.0, 1.0, LinearEase).unwrap();
        assert_eq!(graph.get(x), Some(5.0));
        graph.advance_to(1.0);
        assert_eq!(graph.get(x), Some(2.5));
        graph.advance_to(1.5);
        assert_eq!(graph.get(x), Some(0.0));
    }

    #[test]
    fn test_set_discards_transition() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        graph.animate(x, 10.0, 1.0, LinearEase).unwrap();
        graph.advance_to(0.5);
        graph.set(x, -1.0).unwrap();
        assert!(!graph.is_animating(x));
        graph.advance_to(2.0);
        assert_eq!(graph.get(x), Some(-1.0));
    }

    #[test]
    fn test_non_positive_duration_is_instant() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        graph.animate(x, 3.0, 0.0, LinearEase).unwrap();
        assert_eq!(graph.get(x), Some(3.0));
        graph.animate(x, 4.0, -1.0, LinearEase).unwrap();
        assert_eq!(graph.get(x), Some(4.0));
        assert!(!graph.has_active_transitions());
    }

    #[test]
    fn test_transition_invalidates_dependents_each_advance() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        let y = graph.create_derived(move |g| g.get(x).unwrap_or(0.0) + 1.0);
        graph.animate(x, 1.0, 1.0, LinearEase).unwrap();
        graph.get_derived(y).unwrap();
        assert!(!graph.is_dirty(y));

        assert_eq!(graph.advance_to(0.5), 1);
        assert!(graph.is_dirty(y));
        graph.get_derived(y).unwrap();

        assert_eq!(graph.advance_to(1.0), 0);
        assert!(graph.is_dirty(y));
        assert_eq!(graph.get_derived(y), Ok(2.0));

        // Nothing moves once settled
        graph.advance_to(2.0);
        assert!(!graph.is_dirty(y));
    }

    #[test]
    fn test_removed_nodes() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(Vec2::new(1.0, 2.0));
        let d = graph.create_derived(move |g| g.get(x));
        assert!(graph.remove_signal(x));
        assert_eq!(graph.get(x), None);
        assert_eq!(graph.set(x, Vec2::ZERO), Err(ReactiveError::MissingSignal(x.id())));
        assert_eq!(graph.get_derived(d), Ok(None));
        assert!(graph.remove_derived(d));
        assert_eq!(graph.get_derived(d), Err(ReactiveError::MissingDerived(d.id())));

        let y = graph.create_signal(0.0f32);
        assert!(graph.remove_node(NodeId::Signal(y.id())));
        assert!(!graph.remove_node(NodeId::Signal(y.id())));
    }

    #[test]
    fn test_complete_transition_only_affects_its_own_write() {
        let mut graph = ReactiveGraph::new();
        let x = graph.create_signal(0.0f32);
        let first = graph.animate(x, 10.0, 1.0, LinearEase).unwrap().unwrap();
        graph.advance_to(0.25);
        let second = graph.animate(x, 20.0, 1.0, LinearEase).unwrap().unwrap();

        assert!(!graph.complete_transition(first));
        assert!(graph.is_animating(x));

        assert!(graph.complete_transition(second));
        assert_eq!(graph.get(x), Some(20.0));
        assert!(!graph.complete_transition(second));
    }

    #[test]
    fn test_polyline_interpolation() {
        let a = vec![Vec2::ZERO, Vec2::new(10.0, 0.0)];
        let b = vec![Vec2::ZERO, Vec2::new(20.0, 10.0)];
        assert_eq!(a.interpolate(&b, 0.5), vec![Vec2::ZERO, Vec2::new(15.0, 5.0)]);

        let c = vec![Vec2::ZERO];
        assert_eq!(a.interpolate(&c, 0.5), a);
        assert_eq!(a.interpolate(&c, 1.0), c);
    }

    #[test]
    fn test_binding_read() {
        let mut graph = ReactiveGraph::new();
        let s = graph.create_signal(String::from("P(2, 1)"));
        let d = graph.create_derived(move |g| format!("{}!", g.get(s).unwrap_or_default()));
        assert_eq!(graph.read(Binding::from(s)).unwrap(), "P(2, 1)");
        assert_eq!(graph.read(Binding::from(d)).unwrap(), "P(2, 1)!");
    }
}
