//! Procedural sine curve between two moving endpoints
//!
//! The curve is a straight chord from `start` to `end` with a sine offset
//! along the chord's normal:
//!
//! ```text
//! offset(t) = normal * amplitude * (sin(t * frequency + phase) - sin(frequency + phase) * t)
//! ```
//!
//! The second term removes the linear drift of the sine at `t = 1`, so the
//! last point is exactly the end endpoint for every frequency and phase. The
//! whole polyline is regenerated from the current cell values on every read;
//! animating frequency or phase simply produces a different curve next frame.

use crate::coords::CoordinateTransform;
use crate::error::SceneError;
use crate::stage::{EntityId, LineStyle, Stage};
use cartesia_animation::{Directive, Easing};
use cartesia_core::{Color, Derived, NodeId, ReactiveError, ReactiveGraph, Signal, Vec2};

/// Straight pieces per curve
pub const CURVE_SEGMENTS: usize = 200;

/// Endpoints closer than this (render pixels) collapse the curve to a point
pub const DEGENERATE_DISTANCE: f32 = 1e-3;

pub const DEFAULT_AMPLITUDE: f32 = 40.0;

pub const CURVE_COLOR: u32 = 0xFF5555;

/// Unit normal of a render-space direction.
///
/// Computed as a counter-clockwise quarter turn in logical space, which in
/// render space is `(d.y, -d.x)`.
pub fn wave_normal(direction: Vec2) -> Vec2 {
    direction.flip_y().rotate_90().flip_y()
}

/// Sample the curve in render space.
///
/// Returns `CURVE_SEGMENTS + 1` points, or the single point `start` when the
/// endpoints coincide.
pub fn sample_curve(start: Vec2, end: Vec2, frequency: f32, amplitude: f32, phase: f32) -> Vec<Vec2> {
    let diff = end - start;
    if diff.length() < DEGENERATE_DISTANCE {
        return vec![start];
    }
    let Ok(direction) = diff.try_normalize() else {
        return vec![start];
    };
    let normal = wave_normal(direction);
    let error_at_end = (frequency + phase).sin();

    (0..=CURVE_SEGMENTS)
        .map(|i| {
            let t = i as f32 / CURVE_SEGMENTS as f32;
            let corrected = (t * frequency + phase).sin() - error_at_end * t;
            Vec2::lerp(start, end, t) + normal * (corrected * amplitude)
        })
        .collect()
}

/// Handles of a live curve. Endpoints are logical positions; the polyline
/// is in render space.
#[derive(Clone, Copy, Debug)]
pub struct CurveSpec {
    pub start: Signal<Vec2>,
    pub end: Signal<Vec2>,
    pub frequency: Signal<f32>,
    pub amplitude: Signal<f32>,
    pub phase: Signal<f32>,
    pub points: Derived<Vec<Vec2>>,
    /// The wave itself, drawn with `end = 0` until revealed
    pub line: EntityId,
    /// Straight chord between the endpoints, hidden by default
    pub chord: EntityId,
}

impl CurveSpec {
    pub fn create(
        graph: &mut ReactiveGraph,
        stage: &mut Stage,
        transform: CoordinateTransform,
        start: Vec2,
        end: Vec2,
        frequency: f32,
        amplitude: f32,
    ) -> Result<Self, SceneError> {
        let start = graph.create_signal(start);
        let end = graph.create_signal(end);
        let frequency = graph.create_signal(frequency);
        let amplitude = graph.create_signal(amplitude);
        let phase = graph.create_signal(0.0f32);

        let points = graph.create_derived(move |g| {
            let from = transform.to_render(g, g.get(start).unwrap_or_default());
            let to = transform.to_render(g, g.get(end).unwrap_or_default());
            sample_curve(
                from,
                to,
                g.get(frequency).unwrap_or(0.0),
                g.get(amplitude).unwrap_or(0.0),
                g.get(phase).unwrap_or(0.0),
            )
        });
        let chord_points = transform.segment(graph, start, end);

        let style = LineStyle::default()
            .stroke(Color::from_hex(CURVE_COLOR))
            .width(4.0);
        let chord = stage.add_line(graph, "curve-chord", chord_points, style.opacity(0.0));
        let line = stage.add_line(graph, "curve", points, style.span(0.0, 0.0));

        let owned = [
            NodeId::Signal(start.id()),
            NodeId::Signal(end.id()),
            NodeId::Signal(frequency.id()),
            NodeId::Signal(amplitude.id()),
            NodeId::Signal(phase.id()),
            NodeId::Derived(points.id()),
        ];
        stage.adopt(line, owned)?;
        stage.adopt(chord, [NodeId::Derived(chord_points.id())])?;

        tracing::debug!(?start, ?end, "dynamic curve created");
        Ok(Self {
            start,
            end,
            frequency,
            amplitude,
            phase,
            points,
            line,
            chord,
        })
    }

    pub fn points(&self, graph: &ReactiveGraph) -> Result<Vec<Vec2>, ReactiveError> {
        graph.get_derived(self.points)
    }

    /// Draw the wave from start to end.
    pub fn draw(&self, stage: &Stage, duration: f32) -> Result<Directive, SceneError> {
        let line = stage.line(self.line)?;
        Ok(Directive::tween(line.end, 1.0, duration, Easing::EaseInOutCubic))
    }

    pub fn destroy(self, graph: &mut ReactiveGraph, stage: &mut Stage) -> Result<(), SceneError> {
        stage.destroy(graph, self.line)?;
        stage.destroy(graph, self.chord)
    }
}
