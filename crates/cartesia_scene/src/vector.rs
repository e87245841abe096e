//! Managed vectors
//!
//! A [`ManagedVector`] is one mathematical vector on stage: an arrow (a line
//! entity ending in an arrowhead marker), a text label, and the logical
//! position it stands for. The logical position is plain model state that
//! vector algebra updates immediately; the visuals are reactive cells that
//! directives animate towards it.
//!
//! Tail and tip are stored in logical units and mapped to render space by a
//! derived value, so the arrow stays glued to the grid while the spacing
//! animates.

use crate::coords::CoordinateTransform;
use crate::error::SceneError;
use crate::stage::{EntityId, LineStyle, Stage, TextStyle};
use cartesia_animation::{Directive, Easing};
use cartesia_core::{Color, Derived, NodeId, ReactiveError, ReactiveGraph, Signal, Vec2};

/// Pixel offset of a vector label from the tip
pub const LABEL_OFFSET: Vec2 = Vec2::new(20.0, -20.0);

/// Horizontal and vertical components of `v`.
pub fn decompose(v: Vec2) -> [Vec2; 2] {
    [Vec2::new(v.x, 0.0), Vec2::new(0.0, v.y)]
}

/// How to build a [`ManagedVector`]
#[derive(Clone, Debug, PartialEq)]
pub struct VectorSpec {
    pub name: String,
    pub tail: Vec2,
    pub position: Vec2,
    pub color: Color,
    pub line: LineStyle,
    /// Start with the tip already at its end instead of on the tail
    pub grown: bool,
    pub label: String,
    /// Logical point the label hangs off
    pub label_anchor: Vec2,
    pub label_offset: Vec2,
    pub text: TextStyle,
}

impl VectorSpec {
    /// A vector from the origin, not yet grown, label hidden.
    pub fn new(name: impl Into<String>, position: Vec2, color: Color) -> Self {
        let name = name.into();
        Self {
            label: name.clone(),
            name,
            tail: Vec2::ZERO,
            position,
            color,
            line: LineStyle::default().stroke(color).width(6.0).arrow(20.0),
            grown: false,
            label_anchor: position,
            label_offset: LABEL_OFFSET,
            text: TextStyle::default().fill(color).opacity(0.0),
        }
    }

    /// Move the tail; the label follows the new tip.
    pub fn tail(mut self, tail: Vec2) -> Self {
        self.tail = tail;
        self.label_anchor = tail + self.position;
        self
    }

    pub fn grown(mut self) -> Self {
        self.grown = true;
        self
    }

    pub fn line(mut self, line: LineStyle) -> Self {
        self.line = line;
        self
    }

    pub fn text(mut self, text: TextStyle) -> Self {
        self.text = text;
        self
    }

    pub fn label(mut self, label: impl Into<String>, anchor: Vec2, offset: Vec2) -> Self {
        self.label = label.into();
        self.label_anchor = anchor;
        self.label_offset = offset;
        self
    }
}

pub struct ManagedVector {
    logical_position: Vec2,
    tail_position: Vec2,
    color: Color,
    transform: CoordinateTransform,
    tail: Signal<Vec2>,
    tip: Signal<Vec2>,
    points: Derived<Vec<Vec2>>,
    line: EntityId,
    label: EntityId,
    label_text: Signal<String>,
    label_anchor: Signal<Vec2>,
    label_offset: Signal<Vec2>,
    /// Helper entities destroyed together with the vector
    attachments: Vec<EntityId>,
}

impl ManagedVector {
    pub fn spawn(
        graph: &mut ReactiveGraph,
        stage: &mut Stage,
        transform: CoordinateTransform,
        spec: VectorSpec,
    ) -> Result<Self, SceneError> {
        let tip_start = if spec.grown {
            spec.tail + spec.position
        } else {
            spec.tail
        };
        let tail = graph.create_signal(spec.tail);
        let tip = graph.create_signal(tip_start);
        let points = transform.segment(graph, tail, tip);
        let line = stage.add_line(graph, format!("{}-arrow", spec.name), points, spec.line);
        stage.adopt(
            line,
            [
                NodeId::Signal(tail.id()),
                NodeId::Signal(tip.id()),
                NodeId::Derived(points.id()),
            ],
        )?;

        let label_text = graph.create_signal(spec.label);
        let label_anchor = graph.create_signal(spec.label_anchor);
        let label_offset = graph.create_signal(spec.label_offset);
        let label_position = graph.create_derived(move |g| {
            let anchor = g.get(label_anchor).unwrap_or_default();
            transform.to_render(g, anchor) + g.get(label_offset).unwrap_or_default()
        });
        let label = stage.add_text(
            graph,
            format!("{}-label", spec.name),
            label_position,
            label_text,
            spec.text,
        );
        stage.adopt(
            label,
            [
                NodeId::Signal(label_text.id()),
                NodeId::Signal(label_anchor.id()),
                NodeId::Signal(label_offset.id()),
                NodeId::Derived(label_position.id()),
            ],
        )?;

        Ok(Self {
            logical_position: spec.position,
            tail_position: spec.tail,
            color: spec.color,
            transform,
            tail,
            tip,
            points,
            line,
            label,
            label_text,
            label_anchor,
            label_offset,
            attachments: Vec::new(),
        })
    }

    /// The vector's value in logical units
    pub fn logical_position(&self) -> Vec2 {
        self.logical_position
    }

    pub fn tail_position(&self) -> Vec2 {
        self.tail_position
    }

    /// Where the tip ends up once every animation has played
    pub fn tip_position(&self) -> Vec2 {
        self.tail_position + self.logical_position
    }

    pub(crate) fn set_logical_position(&mut self, position: Vec2) {
        self.logical_position = position;
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn line(&self) -> EntityId {
        self.line
    }

    pub fn label(&self) -> EntityId {
        self.label
    }

    pub fn tail(&self) -> Signal<Vec2> {
        self.tail
    }

    pub fn tip(&self) -> Signal<Vec2> {
        self.tip
    }

    pub fn label_text(&self) -> Signal<String> {
        self.label_text
    }

    pub fn label_anchor(&self) -> Signal<Vec2> {
        self.label_anchor
    }

    pub fn label_offset(&self) -> Signal<Vec2> {
        self.label_offset
    }

    pub fn attachments(&self) -> &[EntityId] {
        &self.attachments
    }

    /// Hand a helper entity to the vector.
    pub fn attach(&mut self, entity: EntityId) {
        self.attachments.push(entity);
    }

    /// Arrow endpoints in render space at the current frame
    pub fn render_points(&self, graph: &ReactiveGraph) -> Result<Vec<Vec2>, ReactiveError> {
        graph.get_derived(self.points)
    }

    pub fn render_tip(&self, graph: &ReactiveGraph) -> Result<Vec2, ReactiveError> {
        Ok(self.transform.to_render(graph, graph.try_get(self.tip)?))
    }

    /// Grow the arrow out of its tail and fade the label in.
    pub fn grow(&self, stage: &Stage, duration: f32) -> Result<Directive, SceneError> {
        Ok(Directive::all([
            Directive::tween(self.tip, self.tip_position(), duration, Easing::SOFT_BACK),
            Directive::tween(
                stage.opacity(self.label)?,
                1.0,
                duration.min(0.5),
                Easing::EaseInOutCubic,
            ),
        ]))
    }

    /// Fade arrow and label out. The vector stays on stage for later reuse.
    pub fn hide(&self, stage: &Stage, duration: f32) -> Result<Directive, SceneError> {
        Ok(Directive::all([
            Directive::tween(stage.opacity(self.line)?, 0.0, duration, Easing::EaseInOutCubic),
            Directive::tween(stage.opacity(self.label)?, 0.0, duration, Easing::EaseInOutCubic),
        ]))
    }

    /// Remove the arrow, the label, every attachment and all their cells.
    pub fn destroy(self, graph: &mut ReactiveGraph, stage: &mut Stage) -> Result<(), SceneError> {
        stage.destroy(graph, self.line)?;
        stage.destroy(graph, self.label)?;
        for entity in self.attachments {
            if stage.contains(entity) {
                stage.destroy(graph, entity)?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ManagedVector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedVector")
            .field("logical_position", &self.logical_position)
            .field("tail", &self.tail_position)
            .field("line", &self.line)
            .field("label", &self.label)
            .finish()
    }
}
