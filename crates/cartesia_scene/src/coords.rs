//! Logical <-> render coordinate mapping
//!
//! Logical units are grid cells with y growing upward. Render space is in
//! pixels relative to the scene center with y growing downward. The scale
//! between them is the spacing cell, which choreography may animate; every
//! derived value that maps through [`CoordinateTransform::to_render`] reads
//! the spacing live and so never lags behind it.

use cartesia_animation::{Directive, Easing};
use cartesia_core::{Derived, GeometryError, ReactiveGraph, Signal, Vec2};

/// Pixels per logical unit when nothing else is configured
pub const DEFAULT_SPACING: f32 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordinateTransform {
    spacing: Signal<f32>,
}

impl CoordinateTransform {
    pub fn new(graph: &mut ReactiveGraph, spacing: f32) -> Self {
        Self {
            spacing: graph.create_signal(spacing),
        }
    }

    pub fn spacing_signal(&self) -> Signal<f32> {
        self.spacing
    }

    /// Resolved spacing, or zero if the spacing cell is gone.
    pub fn spacing(&self, graph: &ReactiveGraph) -> f32 {
        graph.get(self.spacing).unwrap_or(0.0)
    }

    /// `(x * spacing, -y * spacing)`
    pub fn map(spacing: f32, logical: Vec2) -> Vec2 {
        Vec2::new(logical.x * spacing, -logical.y * spacing)
    }

    /// Logical point to render space at the current spacing.
    pub fn to_render(&self, graph: &ReactiveGraph, logical: Vec2) -> Vec2 {
        Self::map(self.spacing(graph), logical)
    }

    /// Render point back to logical units.
    ///
    /// Only an exact inverse while the spacing is not animating. Fails with
    /// [`GeometryError::DegenerateSpacing`] when the spacing is zero.
    pub fn to_logical(&self, graph: &ReactiveGraph, render: Vec2) -> Result<Vec2, GeometryError> {
        let spacing = self.spacing(graph);
        if spacing == 0.0 || !spacing.is_finite() {
            return Err(GeometryError::DegenerateSpacing);
        }
        Ok(Vec2::new(render.x / spacing, -render.y / spacing))
    }

    /// Render position of a logical cell plus a fixed pixel offset, tracking
    /// both the cell and the spacing.
    pub fn follow(&self, graph: &mut ReactiveGraph, logical: Signal<Vec2>, offset: Vec2) -> Derived<Vec2> {
        let transform = *self;
        graph.create_derived(move |g| {
            transform.to_render(g, g.get(logical).unwrap_or_default()) + offset
        })
    }

    /// Render position of a fixed logical point plus a pixel offset.
    pub fn anchor(&self, graph: &mut ReactiveGraph, logical: Vec2, offset: Vec2) -> Derived<Vec2> {
        let transform = *self;
        graph.create_derived(move |g| transform.to_render(g, logical) + offset)
    }

    /// Render-space segment between two logical cells.
    pub fn segment(
        &self,
        graph: &mut ReactiveGraph,
        from: Signal<Vec2>,
        to: Signal<Vec2>,
    ) -> Derived<Vec<Vec2>> {
        let transform = *self;
        graph.create_derived(move |g| {
            vec![
                transform.to_render(g, g.get(from).unwrap_or_default()),
                transform.to_render(g, g.get(to).unwrap_or_default()),
            ]
        })
    }

    /// Render-space segment between two fixed logical points.
    pub fn fixed_segment(&self, graph: &mut ReactiveGraph, from: Vec2, to: Vec2) -> Derived<Vec<Vec2>> {
        let transform = *self;
        graph.create_derived(move |g| vec![transform.to_render(g, from), transform.to_render(g, to)])
    }

    pub fn animate_spacing(&self, target: f32, duration: f32, easing: Easing) -> Directive {
        Directive::tween(self.spacing, target, duration, easing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cartesia_animation::Scheduler;

    #[test]
    fn test_to_render_scales_and_flips() {
        let mut graph = ReactiveGraph::new();
        for spacing in [1.0, 40.0, 80.0, 380.0, 0.25] {
            let transform = CoordinateTransform::new(&mut graph, spacing);
            for (x, y) in [(2.0, 1.0), (-3.5, 4.0), (0.0, -7.0), (1e3, 1e-3)] {
                assert_eq!(
                    transform.to_render(&graph, Vec2::new(x, y)),
                    Vec2::new(x * spacing, -y * spacing)
                );
            }
            assert_eq!(transform.to_render(&graph, Vec2::ZERO), Vec2::ZERO);
        }
    }

    #[test]
    fn test_to_logical_inverts_fixed_spacing() {
        let mut graph = ReactiveGraph::new();
        let transform = CoordinateTransform::new(&mut graph, 80.0);
        let p = Vec2::new(2.5, -1.0);
        let back = transform
            .to_logical(&graph, transform.to_render(&graph, p))
            .unwrap();
        assert!((back.x - p.x).abs() < 1e-6 && (back.y - p.y).abs() < 1e-6);
    }

    #[test]
    fn test_zero_spacing_cannot_invert() {
        let mut graph = ReactiveGraph::new();
        let transform = CoordinateTransform::new(&mut graph, 0.0);
        assert_eq!(transform.to_render(&graph, Vec2::new(3.0, 3.0)), Vec2::new(0.0, -0.0));
        assert_eq!(
            transform.to_logical(&graph, Vec2::new(10.0, 10.0)),
            Err(GeometryError::DegenerateSpacing)
        );
    }

    #[test]
    fn test_follow_tracks_animated_spacing() {
        let mut graph = ReactiveGraph::new();
        let mut scheduler = Scheduler::new(60.0);
        let transform = CoordinateTransform::new(&mut graph, 80.0);
        let point = graph.create_signal(Vec2::new(2.0, 1.0));
        let label = transform.follow(&mut graph, point, Vec2::new(20.0, -20.0));

        scheduler
            .run(&mut graph, transform.animate_spacing(380.0, 1.2, Easing::EaseInOutCubic))
            .unwrap();
        while !scheduler.is_idle() {
            scheduler.tick(&mut graph).unwrap();
            let s = transform.spacing(&graph);
            assert_eq!(
                graph.get_derived(label),
                Ok(Vec2::new(2.0 * s + 20.0, -s - 20.0))
            );
        }
        assert_eq!(transform.spacing(&graph), 380.0);
    }
}
