//! The cartesian coordinate system
//!
//! [`CartesianSystem`] puts a grid, two axes and tick marks on stage and
//! offers the vector procedures choreography is written with. Every
//! procedure builds its entities immediately (hidden) and returns the
//! [`Directive`] that animates them; nothing moves until that directive is
//! played. Model state such as a vector's logical position is updated when
//! the procedure is called, so later procedures can build on it right away.

use crate::coords::CoordinateTransform;
use crate::curve::CurveSpec;
use crate::error::SceneError;
use crate::scene::Scene;
use crate::stage::{Appearance, CircleStyle, EntityId, LineStyle, Stage, TextStyle};
use crate::vector::{ManagedVector, VectorSpec, LABEL_OFFSET};
use cartesia_animation::{Directive, Easing};
use cartesia_core::{Color, NodeId, ReactiveGraph, Signal, Vec2};
use std::f32::consts::{FRAC_PI_2, PI, TAU};
use tracing::debug;

pub const GRID_COLOR: u32 = 0x444444;
pub const TICK_LABEL_COLOR: u32 = 0xCCCCCC;
pub const GUIDE_COLOR: u32 = 0x666666;
pub const COMPONENT_X_COLOR: u32 = 0x46D9FF;
pub const COMPONENT_Y_COLOR: u32 = 0xA6E22E;

const TICK_LENGTH: f32 = 20.0;
/// One tick per this many pixels of half the view
const TICK_STEP: f32 = 50.0;
/// Reveal delay per pixel of distance from the origin
const TICK_REVEAL_STAGGER: f32 = 0.0005;
/// Nominal length of [`CartesianSystem::explain_physical_vector`]
pub const PHYSICAL_VECTOR_DURATION: f32 = 3.3;
/// Length of the sine sweep in [`CartesianSystem::explain_normal_construction`];
/// every other step of it scales along
pub const NORMAL_CONSTRUCTION_DURATION: f32 = 2.0;
pub const NORMAL_COLOR: u32 = 0xFF5555;
const UNIT_CIRCLE_SEGMENTS: usize = 64;
/// Peak normal length during the sine sweep, in logical units
const NORMAL_SWEEP_AMPLITUDE: f32 = 1.5;
/// Side of the right-angle marker in pixels
const RIGHT_ANGLE_SIZE: f32 = 20.0;

/// Text of the tick at `index` along an axis.
pub fn tick_label(index: i32, pi: bool) -> String {
    if !pi {
        return index.to_string();
    }
    match index {
        0 => "0".to_string(),
        1 => "π".to_string(),
        -1 => "-π".to_string(),
        n => format!("{n}π"),
    }
}

#[derive(Clone, Copy, Debug)]
struct Tick {
    index: i32,
    line: EntityId,
    label: EntityId,
}

/// The two dashed component segments of a vector
#[derive(Clone, Copy, Debug)]
pub struct Decomposition {
    pub horizontal: EntityId,
    pub vertical: EntityId,
}

impl Decomposition {
    pub fn fade(&self, stage: &Stage, duration: f32) -> Result<Directive, SceneError> {
        Ok(Directive::all([
            Directive::tween(stage.opacity(self.horizontal)?, 0.0, duration, Easing::EaseInOutCubic),
            Directive::tween(stage.opacity(self.vertical)?, 0.0, duration, Easing::EaseInOutCubic),
        ]))
    }
}

/// What [`CartesianSystem::explain_normal_construction`] puts on stage
#[derive(Clone, Debug)]
pub struct NormalConstruction {
    /// Midpoint of the chord, in logical units
    pub center: Vec2,
    /// Unit direction of the chord
    pub direction: Vec2,
    /// `direction` turned a quarter counter-clockwise
    pub normal: Vec2,
    pub normal_line: EntityId,
    /// Turn of the normal arrow away from `direction`, in radians
    pub angle: Signal<f32>,
    entities: Vec<EntityId>,
}

impl NormalConstruction {
    pub fn entities(&self) -> &[EntityId] {
        &self.entities
    }

    pub fn destroy(self, graph: &mut ReactiveGraph, stage: &mut Stage) -> Result<(), SceneError> {
        for entity in self.entities {
            stage.destroy(graph, entity)?;
        }
        Ok(())
    }
}

/// Normal length in logical units: one cell until the sweep starts, then
/// `sin(sweep * π)` times the sweep amplitude.
fn normal_reach(sweeping: bool, sweep: f32) -> f32 {
    if sweeping {
        (sweep * PI).sin() * NORMAL_SWEEP_AMPLITUDE
    } else {
        1.0
    }
}

pub struct CartesianSystem {
    transform: CoordinateTransform,
    view_size: Signal<Vec2>,
    use_pi_labels: Signal<bool>,
    grid: EntityId,
    x_axis: EntityId,
    y_axis: EntityId,
    ticks: Vec<Tick>,
}

impl CartesianSystem {
    /// Build grid, axes and ticks, all collapsed until [`CartesianSystem::setup`].
    pub fn new(scene: &mut Scene) -> Result<Self, SceneError> {
        let transform = scene.transform();
        let config = *scene.config();
        let (graph, stage) = scene.parts_mut();

        let view_size = graph.create_signal(Vec2::new(config.width, config.height));
        let use_pi_labels = graph.create_signal(false);

        let grid = stage.add_grid(
            graph,
            "grid",
            view_size,
            transform.spacing_signal(),
            Color::from_hex(GRID_COLOR),
            (0.5, 0.5),
        );

        let axis = LineStyle::default().width(4.0).arrow(16.0).span(0.5, 0.5);
        let y_points = graph.create_derived(move |g| {
            let half = g.get(view_size).unwrap_or_default().y / 2.0;
            vec![Vec2::new(0.0, half), Vec2::new(0.0, -half)]
        });
        let y_axis = stage.add_line(graph, "y-axis", y_points, axis);
        stage.adopt(y_axis, [NodeId::Derived(y_points.id())])?;

        let x_points = graph.create_derived(move |g| {
            let half = g.get(view_size).unwrap_or_default().x / 2.0;
            vec![Vec2::new(-half, 0.0), Vec2::new(half, 0.0)]
        });
        let x_axis = stage.add_line(graph, "x-axis", x_points, axis);
        stage.adopt(x_axis, [NodeId::Derived(x_points.id())])?;

        let mut ticks = Vec::new();
        let steps_x = (config.width / 2.0 / TICK_STEP).ceil() as i32;
        let steps_y = (config.height / 2.0 / TICK_STEP).ceil() as i32;
        for index in (-steps_x..=steps_x).filter(|i| *i != 0) {
            ticks.push(add_tick(graph, stage, transform, view_size, use_pi_labels, index, false)?);
        }
        for index in (-steps_y..=steps_y).filter(|i| *i != 0) {
            ticks.push(add_tick(graph, stage, transform, view_size, use_pi_labels, index, true)?);
        }

        debug!(ticks = ticks.len(), "cartesian system built");
        Ok(Self {
            transform,
            view_size,
            use_pi_labels,
            grid,
            x_axis,
            y_axis,
            ticks,
        })
    }

    pub fn transform(&self) -> CoordinateTransform {
        self.transform
    }

    /// Logical point to render space at the current spacing.
    pub fn to_render(&self, scene: &Scene, x: f32, y: f32) -> Vec2 {
        self.transform.to_render(scene.graph(), Vec2::new(x, y))
    }

    pub fn view_size(&self) -> Signal<Vec2> {
        self.view_size
    }

    pub fn use_pi_labels(&self) -> Signal<bool> {
        self.use_pi_labels
    }

    pub fn grid(&self) -> EntityId {
        self.grid
    }

    pub fn x_axis(&self) -> EntityId {
        self.x_axis
    }

    pub fn y_axis(&self) -> EntityId {
        self.y_axis
    }

    pub fn tick_count(&self) -> usize {
        self.ticks.len()
    }

    /// Grid first, then axes, then ticks rippling outward from the origin.
    pub fn setup(&self, scene: &Scene) -> Result<Directive, SceneError> {
        let stage = scene.stage();
        let spacing = self.transform.spacing(scene.graph());
        let grid = stage.grid(self.grid)?;
        let x_axis = stage.line(self.x_axis)?;
        let y_axis = stage.line(self.y_axis)?;

        let mut reveals = Vec::with_capacity(self.ticks.len());
        for tick in &self.ticks {
            let distance = (tick.index as f32 * spacing).abs();
            reveals.push(Directive::delay(
                distance * TICK_REVEAL_STAGGER,
                self.scale_tick(stage, tick, 1.0, 0.3, Easing::SOFT_BACK)?,
            ));
        }

        Ok(Directive::chain([
            Directive::all([
                Directive::tween(grid.start, 0.0, 0.8, Easing::EaseInOutCubic),
                Directive::tween(grid.end, 1.0, 0.8, Easing::EaseInOutCubic),
            ]),
            Directive::all([
                Directive::tween(x_axis.start, 0.0, 0.5, Easing::EaseInOutCubic),
                Directive::tween(x_axis.end, 1.0, 0.5, Easing::EaseInOutCubic),
                Directive::tween(y_axis.start, 0.0, 0.5, Easing::EaseInOutCubic),
                Directive::tween(y_axis.end, 1.0, 0.5, Easing::EaseInOutCubic),
            ]),
            Directive::all(reveals),
        ])
        .labeled("setup"))
    }

    /// Pulse the ticks and relabel the horizontal axis in multiples of π
    /// halfway through.
    pub fn switch_to_pi(&self, scene: &Scene, duration: f32) -> Result<Directive, SceneError> {
        let stage = scene.stage();
        let half = duration / 2.0;
        let mut pulses = Vec::with_capacity(self.ticks.len() + 1);
        for tick in &self.ticks {
            pulses.push(
                self.scale_tick(stage, tick, 0.8, half, Easing::EaseInOutCubic)?
                    .then(self.scale_tick(stage, tick, 1.0, half, Easing::EaseInOutCubic)?),
            );
        }
        pulses.push(Directive::delay(half, Directive::set(self.use_pi_labels, true)));
        Ok(Directive::all(pulses).labeled("switch-to-pi"))
    }

    fn scale_tick(
        &self,
        stage: &Stage,
        tick: &Tick,
        target: f32,
        duration: f32,
        easing: Easing,
    ) -> Result<Directive, SceneError> {
        Ok(Directive::all([
            Directive::tween(stage.scale(tick.line)?, target, duration, easing),
            Directive::tween(stage.scale(tick.label)?, target, duration, easing),
        ]))
    }

    /// Plain arrow from the origin with its name as label.
    pub fn spawn_vector(
        &self,
        scene: &mut Scene,
        x: f32,
        y: f32,
        color: Color,
        name: &str,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let (graph, stage) = scene.parts_mut();
        let vector = ManagedVector::spawn(
            graph,
            stage,
            self.transform,
            VectorSpec::new(name, Vec2::new(x, y), color),
        )?;
        let directive = vector.grow(stage, 0.8)?.labeled(format!("spawn {name}"));
        Ok((vector, directive))
    }

    /// Mark the point `(x, y)` with dashed guides to both axes, then turn it
    /// into a vector from the origin. The point label becomes the vector
    /// label, renamed to `name`.
    pub fn show_point(
        &self,
        scene: &mut Scene,
        x: f32,
        y: f32,
        color: Color,
        name: &str,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let transform = self.transform;
        let (graph, stage) = scene.parts_mut();
        let p = Vec2::new(x, y);

        let guide = LineStyle::default()
            .stroke(Color::from_hex(GUIDE_COLOR))
            .dashed(10.0)
            .span(0.0, 0.0);
        let guide_x = fixed_line(graph, stage, transform, format!("{name}-guide-x"), Vec2::new(x, 0.0), p, guide)?;
        let guide_y = fixed_line(graph, stage, transform, format!("{name}-guide-y"), Vec2::new(0.0, y), p, guide)?;

        let center = transform.anchor(graph, p, Vec2::ZERO);
        let point = stage.add_circle(
            graph,
            format!("{name}-point"),
            center,
            CircleStyle::default().fill(color).scale(0.0),
        );
        stage.adopt(point, [NodeId::Derived(center.id())])?;

        let spec = VectorSpec::new(name, p, color)
            .label(format!("P({x}, {y})"), p, Vec2::new(30.0, -30.0))
            .text(TextStyle::default().fill(Color::WHITE).opacity(0.0));
        let mut vector = ManagedVector::spawn(graph, stage, transform, spec)?;
        for entity in [guide_x, guide_y, point] {
            vector.attach(entity);
        }

        let point_scale = stage.scale(point)?;
        let label = stage.text(vector.label())?;
        let directive = Directive::chain([
            Directive::all([
                Directive::tween(point_scale, 1.0, 0.5, Easing::SOFT_BACK),
                Directive::tween(stage.opacity(vector.label())?, 1.0, 0.5, Easing::EaseInOutCubic),
            ]),
            Directive::all([
                Directive::tween(stage.line(guide_x)?.end, 1.0, 0.6, Easing::EaseInOutCubic),
                Directive::tween(stage.line(guide_y)?.end, 1.0, 0.6, Easing::EaseInOutCubic),
            ]),
            Directive::sequence(
                0.1,
                [
                    Directive::tween(stage.opacity(guide_x)?, 0.3, 0.5, Easing::EaseInOutCubic),
                    Directive::tween(stage.opacity(guide_y)?, 0.3, 0.5, Easing::EaseInOutCubic),
                ],
            ),
            Directive::wait(0.3),
            Directive::all([
                Directive::tween(vector.tip(), p, 0.8, Easing::SOFT_BACK),
                Directive::tween(vector.label_text(), name.to_string(), 0.6, Easing::EaseInOutCubic),
                Directive::tween(label.fill, color, 0.6, Easing::EaseInOutCubic),
                Directive::delay(
                    0.15,
                    Directive::sequence(
                        0.1,
                        [
                            Directive::tween(point_scale, 1.3, 0.1, Easing::EaseInOutCubic),
                            Directive::tween(point_scale, 0.0, 0.3, Easing::EaseInOutCubic),
                        ],
                    ),
                ),
            ]),
        ])
        .labeled(format!("show point {name}"));
        Ok((vector, directive))
    }

    /// Dashed horizontal then vertical component segments of `(x, y)`, drawn
    /// tip to tail one after the other.
    pub fn decompose(
        &self,
        scene: &mut Scene,
        x: f32,
        y: f32,
        name: &str,
    ) -> Result<(Decomposition, Directive), SceneError> {
        let transform = self.transform;
        let (graph, stage) = scene.parts_mut();
        let corner = Vec2::new(x, 0.0);
        let style = LineStyle::default().dashed(5.0).opacity(0.6);

        let (horizontal, horizontal_tip) = growing_line(
            graph,
            stage,
            transform,
            format!("{name}-component-x"),
            Vec2::ZERO,
            style.stroke(Color::from_hex(COMPONENT_X_COLOR)),
        )?;
        let (vertical, vertical_tip) = growing_line(
            graph,
            stage,
            transform,
            format!("{name}-component-y"),
            corner,
            style.stroke(Color::from_hex(COMPONENT_Y_COLOR)),
        )?;

        let directive = Directive::chain([
            Directive::tween(horizontal_tip, corner, 0.3, Easing::EaseInOutCubic),
            Directive::tween(vertical_tip, Vec2::new(x, y), 0.3, Easing::EaseInOutCubic),
        ]);
        Ok((
            Decomposition {
                horizontal,
                vertical,
            },
            directive,
        ))
    }

    /// Draw the components of `(x, y)`, close them with the vector, then
    /// clear the construction lines.
    pub fn construct_vector(
        &self,
        scene: &mut Scene,
        x: f32,
        y: f32,
        color: Color,
        label: &str,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let (components, draw_components) = self.decompose(scene, x, y, label)?;
        let (graph, stage) = scene.parts_mut();
        let p = Vec2::new(x, y);
        let spec = VectorSpec::new(label, p, color)
            .grown()
            .line(LineStyle::default().stroke(color).width(4.0).arrow(15.0).span(0.0, 0.0))
            .label(label, p, Vec2::new(0.0, -30.0))
            .text(TextStyle::default().fill(color).font_size(24.0).opacity(0.0));
        let mut vector = ManagedVector::spawn(graph, stage, self.transform, spec)?;
        vector.attach(components.horizontal);
        vector.attach(components.vertical);

        let directive = Directive::chain([
            draw_components,
            Directive::tween(stage.line(vector.line())?.end, 1.0, 0.4, Easing::EaseInOutCubic),
            Directive::tween(stage.opacity(vector.label())?, 1.0, 0.4, Easing::EaseInOutCubic),
            components.fade(stage, 0.3)?,
        ])
        .labeled(format!("construct {label}"));
        Ok((vector, directive))
    }

    /// A dot walks the x component, then the y component, and the vector is
    /// drawn over the path it traced. Timings scale with `duration`, whose
    /// natural value is [`PHYSICAL_VECTOR_DURATION`].
    pub fn explain_physical_vector(
        &self,
        scene: &mut Scene,
        x: f32,
        y: f32,
        color: Color,
        label: &str,
        duration: f32,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let transform = self.transform;
        let s = duration / PHYSICAL_VECTOR_DURATION;
        let (graph, stage) = scene.parts_mut();
        let corner = Vec2::new(x, 0.0);
        let p = Vec2::new(x, y);
        let cyan = Color::from_hex(COMPONENT_X_COLOR);
        let green = Color::from_hex(COMPONENT_Y_COLOR);

        let component = LineStyle::default().width(4.0).span(0.0, 0.0);
        let line_x = fixed_line(graph, stage, transform, format!("{label}-path-x"), Vec2::ZERO, corner, component.stroke(cyan))?;
        let label_x = fixed_text(
            graph,
            stage,
            transform,
            format!("{label}-path-x-label"),
            format!("x: {x}"),
            (Vec2::new(x / 2.0, 0.0), Vec2::new(0.0, 40.0)),
            TextStyle::default().fill(cyan).font_size(24.0).scale(0.0),
        )?;
        let line_y = fixed_line(graph, stage, transform, format!("{label}-path-y"), corner, p, component.stroke(green))?;
        let label_y = fixed_text(
            graph,
            stage,
            transform,
            format!("{label}-path-y-label"),
            format!("y: {y}"),
            (Vec2::new(x, y / 2.0), Vec2::new(40.0, 0.0)),
            TextStyle::default().fill(green).font_size(24.0).scale(0.0),
        )?;

        let spec = VectorSpec::new(label, p, color)
            .grown()
            .line(LineStyle::default().stroke(color).width(6.0).arrow(20.0).span(0.0, 0.0))
            .label(label, p, Vec2::new(0.0, -40.0))
            .text(TextStyle::default().fill(color).scale(0.0));
        let mut vector = ManagedVector::spawn(graph, stage, transform, spec)?;

        let dot_position = graph.create_signal(Vec2::ZERO);
        let dot_center = transform.follow(graph, dot_position, Vec2::ZERO);
        let dot = stage.add_circle(
            graph,
            format!("{label}-dot"),
            dot_center,
            CircleStyle::default().radius(12.5).scale(0.0),
        );
        stage.adopt(dot, [NodeId::Signal(dot_position.id()), NodeId::Derived(dot_center.id())])?;

        for entity in [line_x, label_x, line_y, label_y, dot] {
            vector.attach(entity);
        }

        let cubic = Easing::EaseInOutCubic;
        let dot_scale = stage.scale(dot)?;
        let line_x_end = stage.line(line_x)?.end;
        let line_y_end = stage.line(line_y)?.end;
        let label_x_scale = stage.scale(label_x)?;
        let label_y_scale = stage.scale(label_y)?;

        let directive = Directive::chain([
            Directive::tween(dot_scale, 1.0, 0.3 * s, cubic),
            Directive::all([
                Directive::tween(dot_position, corner, 0.6 * s, cubic),
                Directive::tween(line_x_end, 1.0, 0.6 * s, cubic),
            ]),
            Directive::tween(label_x_scale, 1.0, 0.2 * s, Easing::POP_BACK),
            Directive::wait(0.1 * s),
            Directive::all([
                Directive::tween(dot_position, p, 0.6 * s, cubic),
                Directive::tween(line_y_end, 1.0, 0.6 * s, cubic),
            ]),
            Directive::tween(label_y_scale, 1.0, 0.2 * s, Easing::POP_BACK),
            Directive::wait(0.1 * s),
            Directive::tween(stage.line(vector.line())?.end, 1.0, 0.4 * s, cubic),
            Directive::tween(stage.scale(vector.label())?, 1.0, 0.3 * s, Easing::POP_BACK),
            Directive::all([
                Directive::tween(line_x_end, 0.0, 0.5 * s, cubic),
                Directive::tween(label_x_scale, 0.0, 0.3 * s, cubic),
                Directive::tween(line_y_end, 0.0, 0.5 * s, cubic),
                Directive::tween(label_y_scale, 0.0, 0.3 * s, cubic),
                Directive::tween(dot_scale, 0.0, 0.3 * s, cubic),
            ]),
        ])
        .labeled(format!("explain {label}"));
        Ok((vector, directive))
    }

    /// How a wave's normal comes from its chord `start -> end`.
    ///
    /// A unit circle and the chord direction appear at the chord's midpoint.
    /// A copy of the direction turns a quarter counter-clockwise into the
    /// normal `(-y, x)` and gets a right-angle marker. Its length then sweeps
    /// through `sin(t) * amplitude` before everything fades. Timings scale
    /// with `duration`, whose natural value is
    /// [`NORMAL_CONSTRUCTION_DURATION`]. Fails before creating anything when
    /// the endpoints coincide.
    pub fn explain_normal_construction(
        &self,
        scene: &mut Scene,
        start: Vec2,
        end: Vec2,
        name: &str,
        duration: f32,
    ) -> Result<(NormalConstruction, Directive), SceneError> {
        let direction = (end - start).try_normalize()?;
        let normal = direction.rotate_90();
        let center = Vec2::midpoint(start, end);
        let transform = self.transform;
        let s = duration / NORMAL_CONSTRUCTION_DURATION;
        let (graph, stage) = scene.parts_mut();
        let guide = Color::from_hex(GUIDE_COLOR);
        let cyan = Color::from_hex(COMPONENT_X_COLOR);
        let red = Color::from_hex(NORMAL_COLOR);

        let circle_points = graph.create_derived(move |g| {
            (0..=UNIT_CIRCLE_SEGMENTS)
                .map(|i| {
                    let theta = i as f32 / UNIT_CIRCLE_SEGMENTS as f32 * TAU;
                    transform.to_render(g, center + Vec2::new(theta.cos(), theta.sin()))
                })
                .collect::<Vec<_>>()
        });
        let circle = stage.add_line(
            graph,
            format!("{name}-unit-circle"),
            circle_points,
            LineStyle::default().stroke(guide).dashed(5.0).opacity(0.0),
        );
        stage.adopt(circle, [NodeId::Derived(circle_points.id())])?;
        let circle_label = fixed_text(
            graph,
            stage,
            transform,
            format!("{name}-unit-circle-label"),
            "Unit Circle (r=1)".to_string(),
            (center - Vec2::new(0.0, 1.0), Vec2::new(0.0, 30.0)),
            TextStyle::default().fill(guide).font_size(20.0).opacity(0.5).scale(0.0),
        )?;

        let direction_line = fixed_line(
            graph,
            stage,
            transform,
            format!("{name}-direction"),
            center,
            center + direction,
            LineStyle::default().stroke(cyan).width(4.0).arrow(15.0).span(0.0, 0.0),
        )?;
        let direction_label = fixed_text(
            graph,
            stage,
            transform,
            format!("{name}-direction-label"),
            "Direction".to_string(),
            (center + direction * 0.5, Vec2::new(0.0, 20.0)),
            TextStyle::default().fill(cyan).font_size(20.0).opacity(0.0),
        )?;

        let angle = graph.create_signal(0.0f32);
        let sweeping = graph.create_signal(false);
        let sweep = graph.create_signal(0.0f32);
        let reach = move |g: &ReactiveGraph| {
            normal_reach(g.get(sweeping).unwrap_or(false), g.get(sweep).unwrap_or(0.0))
        };
        let normal_points = graph.create_derived(move |g| {
            let turn = g.get(angle).unwrap_or(0.0);
            let heading = direction * turn.cos() + normal * turn.sin();
            vec![
                transform.to_render(g, center),
                transform.to_render(g, center + heading * reach(g)),
            ]
        });
        // Hidden while shorter than a pixel
        let normal_visibility = graph.create_derived(move |g| {
            if reach(g) * transform.spacing(g) < 1.0 {
                0.0f32
            } else {
                1.0
            }
        });
        let normal_line = stage.add_line(
            graph,
            format!("{name}-normal"),
            normal_points,
            LineStyle::default().stroke(red).width(4.0).arrow(15.0).opacity(0.0),
        );
        stage.adopt(
            normal_line,
            [
                NodeId::Signal(angle.id()),
                NodeId::Signal(sweeping.id()),
                NodeId::Signal(sweep.id()),
                NodeId::Derived(normal_points.id()),
            ],
        )?;
        stage.set_visibility(normal_line, normal_visibility)?;
        let normal_label = fixed_text(
            graph,
            stage,
            transform,
            format!("{name}-normal-label"),
            "Normal (-y, x)".to_string(),
            (center + normal * 0.5, LABEL_OFFSET),
            TextStyle::default().fill(red).font_size(20.0).opacity(0.0).scale(0.0),
        )?;

        let marker_points = graph.create_derived(move |g| {
            let corner = transform.to_render(g, center);
            let along = direction.flip_y() * RIGHT_ANGLE_SIZE;
            let across = normal.flip_y() * RIGHT_ANGLE_SIZE;
            vec![corner + across, corner + across + along, corner + along]
        });
        let marker = stage.add_line(
            graph,
            format!("{name}-right-angle"),
            marker_points,
            LineStyle::default().opacity(0.0),
        );
        stage.adopt(marker, [NodeId::Derived(marker_points.id())])?;
        let sine_label = fixed_text(
            graph,
            stage,
            transform,
            format!("{name}-sine-label"),
            "sin(t) * Amplitude".to_string(),
            (center + Vec2::new(0.0, 1.0), Vec2::new(0.0, -40.0)),
            TextStyle::default().fill(Color::WHITE).font_size(24.0).opacity(0.0),
        )?;

        let entities = vec![
            circle,
            circle_label,
            direction_line,
            direction_label,
            normal_line,
            normal_label,
            marker,
            sine_label,
        ];
        let cubic = Easing::EaseInOutCubic;
        let fade_out = entities
            .iter()
            .map(|&entity| Ok(Directive::tween(stage.opacity(entity)?, 0.0, 0.5 * s, cubic)))
            .collect::<Result<Vec<_>, SceneError>>()?;

        let directive = Directive::chain([
            Directive::tween(stage.scale(circle_label)?, 1.0, 0.5 * s, Easing::EASE_OUT_BACK),
            Directive::tween(stage.opacity(circle)?, 1.0, 0.5 * s, cubic),
            Directive::all([
                Directive::tween(stage.line(direction_line)?.end, 1.0, 0.5 * s, cubic),
                Directive::tween(stage.opacity(direction_label)?, 1.0, 0.5 * s, cubic),
            ]),
            Directive::wait(0.5 * s),
            Directive::set(stage.opacity(normal_line)?, 1.0),
            Directive::wait(0.3 * s),
            Directive::all([
                Directive::tween(angle, FRAC_PI_2, 1.5 * s, cubic),
                Directive::tween(stage.opacity(normal_label)?, 1.0, 0.5 * s, cubic),
                Directive::tween(stage.scale(normal_label)?, 1.0, 0.5 * s, Easing::EASE_OUT_BACK),
            ]),
            Directive::tween(stage.opacity(marker)?, 1.0, 0.3 * s, cubic),
            Directive::wait(s),
            Directive::tween(stage.opacity(sine_label)?, 1.0, 0.5 * s, cubic),
            Directive::set(sweeping, true),
            Directive::tween(sweep, 1.0, NORMAL_CONSTRUCTION_DURATION * s, Easing::Linear),
            Directive::all(fade_out),
        ])
        .labeled(format!("explain normal {name}"));

        Ok((
            NormalConstruction {
                center,
                direction,
                normal,
                normal_line,
                angle,
                entities,
            },
            directive,
        ))
    }

    /// `u + v`: a copy of `v` flies to the tip of `u`, leaving a faint
    /// ghost behind, and the sum grows from the tail of `u`. The original
    /// `v` is hidden, not destroyed.
    pub fn add(
        &self,
        scene: &mut Scene,
        u: &ManagedVector,
        v: &ManagedVector,
        color: Color,
        name: &str,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let transform = self.transform;
        let (graph, stage) = scene.parts_mut();
        let landing = u.tip_position();

        let ghost = fixed_line(
            graph,
            stage,
            transform,
            format!("{name}-ghost"),
            v.tail_position(),
            v.tip_position(),
            LineStyle::default()
                .stroke(v.color())
                .width(4.0)
                .dashed(10.0)
                .arrow(15.0)
                .opacity(0.0),
        )?;

        let flying_tail = graph.create_signal(v.tail_position());
        let flying_tip = graph.create_signal(v.tip_position());
        let flying_points = transform.segment(graph, flying_tail, flying_tip);
        let flying = stage.add_line(
            graph,
            format!("{name}-moved"),
            flying_points,
            LineStyle::default().stroke(v.color()).width(6.0).arrow(20.0).opacity(0.0),
        );
        stage.adopt(
            flying,
            [
                NodeId::Signal(flying_tail.id()),
                NodeId::Signal(flying_tip.id()),
                NodeId::Derived(flying_points.id()),
            ],
        )?;

        let sum_position = u.logical_position() + v.logical_position();
        let spec = VectorSpec::new(name, sum_position, color).tail(u.tail_position());
        let mut sum = ManagedVector::spawn(graph, stage, transform, spec)?;
        sum.attach(ghost);
        sum.attach(flying);

        let directive = Directive::chain([
            Directive::all([
                Directive::set(stage.opacity(ghost)?, 1.0),
                Directive::set(stage.opacity(flying)?, 1.0),
                Directive::set(stage.opacity(v.line())?, 0.0),
                Directive::set(stage.opacity(v.label())?, 0.0),
            ]),
            Directive::all([
                Directive::tween(stage.opacity(ghost)?, 0.3, 0.5, Easing::EaseInOutCubic),
                Directive::tween(flying_tail, landing, 1.0, Easing::EaseInOutCubic),
                Directive::tween(flying_tip, landing + v.logical_position(), 1.0, Easing::EaseInOutCubic),
            ]),
            sum.grow(stage, 0.8)?,
            Directive::tween(stage.line(flying)?.dash, 10.0, 0.5, Easing::EaseInOutCubic),
        ])
        .labeled(format!("add {name}"));
        debug!(name, ?sum_position, "vector sum built");
        Ok((sum, directive))
    }

    /// `target - origin`, drawn as a displacement arrow from the tip of
    /// `origin` with its label settling beside the midpoint.
    pub fn subtract(
        &self,
        scene: &mut Scene,
        target: &ManagedVector,
        origin: &ManagedVector,
        color: Color,
        name: &str,
    ) -> Result<(ManagedVector, Directive), SceneError> {
        let (graph, stage) = scene.parts_mut();
        let difference = target.logical_position() - origin.logical_position();
        let from = origin.tip_position();
        let to = from + difference;

        let spec = VectorSpec::new(name, difference, color)
            .tail(from)
            .label(name, from, Vec2::ZERO)
            .text(TextStyle::default().fill(color).font_size(24.0).opacity(0.0));
        let displacement = ManagedVector::spawn(graph, stage, self.transform, spec)?;

        let directive = Directive::all([
            displacement.grow(stage, 0.8)?,
            Directive::tween(
                displacement.label_anchor(),
                Vec2::midpoint(from, to),
                0.8,
                Easing::SOFT_BACK,
            ),
            Directive::tween(displacement.label_offset(), LABEL_OFFSET, 0.8, Easing::SOFT_BACK),
        ])
        .then(Directive::wait(0.5))
        .labeled(format!("subtract {name}"));
        debug!(name, ?difference, "vector difference built");
        Ok((displacement, directive))
    }

    /// Shrink or stretch `vector` to unit length, leaving a dim dashed
    /// silhouette of the old arrow underneath.
    ///
    /// Fails with [`cartesia_core::GeometryError::ZeroLength`] for a zero
    /// vector; nothing is built in that case.
    pub fn normalize(&self, scene: &mut Scene, vector: &mut ManagedVector) -> Result<Directive, SceneError> {
        let unit = vector.logical_position().try_normalize()?;
        let transform = self.transform;
        let (graph, stage) = scene.parts_mut();
        let tail = vector.tail_position();
        let name = format!("{}-silhouette", stage.entity(vector.line())?.name());
        let silhouette = fixed_line(
            graph,
            stage,
            transform,
            name,
            tail,
            vector.tip_position(),
            LineStyle::default()
                .stroke(vector.color())
                .width(4.0)
                .dashed(15.0)
                .opacity(0.0),
        )?;
        stage.place_below(silhouette, vector.line())?;
        vector.attach(silhouette);
        vector.set_logical_position(unit);

        let new_tip = tail + unit;
        Ok(Directive::set(stage.opacity(silhouette)?, 0.3)
            .then(Directive::all([
                Directive::tween(vector.tip(), new_tip, 1.0, Easing::SOFT_BACK),
                Directive::tween(vector.label_anchor(), new_tip, 1.0, Easing::SOFT_BACK),
                Directive::tween(vector.label_offset(), LABEL_OFFSET, 1.0, Easing::SOFT_BACK),
                Directive::tween(vector.label_text(), "norm".to_string(), 0.5, Easing::EaseInOutCubic),
            ]))
            .labeled("normalize"))
    }

    /// Sine curve between two logical points whose shape follows its cells
    /// every frame. The curve starts undrawn; see [`CurveSpec::draw`].
    pub fn spawn_dynamic_curve(
        &self,
        scene: &mut Scene,
        start: Vec2,
        end: Vec2,
        frequency: f32,
        amplitude: f32,
    ) -> Result<CurveSpec, SceneError> {
        let (graph, stage) = scene.parts_mut();
        CurveSpec::create(graph, stage, self.transform, start, end, frequency, amplitude)
    }
}

/// Tick mark and label at `index` steps along one axis.
fn add_tick(
    graph: &mut ReactiveGraph,
    stage: &mut Stage,
    transform: CoordinateTransform,
    view_size: Signal<Vec2>,
    use_pi_labels: Signal<bool>,
    index: i32,
    vertical: bool,
) -> Result<Tick, SceneError> {
    let spacing = transform.spacing_signal();
    let i = index as f32;
    let half = TICK_LENGTH / 2.0;

    let points = graph.create_derived(move |g| {
        let offset = i * g.get(spacing).unwrap_or(0.0);
        if vertical {
            vec![Vec2::new(-half, -offset), Vec2::new(half, -offset)]
        } else {
            vec![Vec2::new(offset, -half), Vec2::new(offset, half)]
        }
    });
    let position = graph.create_derived(move |g| {
        let offset = i * g.get(spacing).unwrap_or(0.0);
        if vertical {
            Vec2::new(-35.0, -offset)
        } else {
            Vec2::new(offset, 25.0)
        }
    });
    let text = graph.create_derived(move |g| {
        let pi = !vertical && g.get(use_pi_labels).unwrap_or(false);
        tick_label(index, pi)
    });
    // Ticks beyond the visible half of the view disappear
    let within_view = move |graph: &mut ReactiveGraph| {
        graph.create_derived(move |g| {
            let size = g.get(view_size).unwrap_or_default();
            let limit = (if vertical { size.y } else { size.x }) / 2.0;
            if (i * g.get(spacing).unwrap_or(0.0)).abs() > limit {
                0.0f32
            } else {
                1.0
            }
        })
    };

    let axis = if vertical { "y" } else { "x" };
    let line = stage.add_line(
        graph,
        format!("tick-{axis}{index}"),
        points,
        LineStyle {
            appearance: Appearance {
                opacity: 1.0,
                scale: 0.0,
            },
            ..LineStyle::default()
        },
    );
    stage.adopt(line, [NodeId::Derived(points.id())])?;
    let line_visibility = within_view(graph);
    stage.set_visibility(line, line_visibility)?;

    let label = stage.add_text(
        graph,
        format!("tick-{axis}{index}-label"),
        position,
        text,
        TextStyle::default()
            .fill(Color::from_hex(TICK_LABEL_COLOR))
            .font_size(16.0)
            .scale(0.0),
    );
    stage.adopt(label, [NodeId::Derived(position.id()), NodeId::Derived(text.id())])?;
    let label_visibility = within_view(graph);
    stage.set_visibility(label, label_visibility)?;

    Ok(Tick {
        index,
        line,
        label,
    })
}

/// Line between two fixed logical points.
fn fixed_line(
    graph: &mut ReactiveGraph,
    stage: &mut Stage,
    transform: CoordinateTransform,
    name: String,
    from: Vec2,
    to: Vec2,
    style: LineStyle,
) -> Result<EntityId, SceneError> {
    let points = transform.fixed_segment(graph, from, to);
    let line = stage.add_line(graph, name, points, style);
    stage.adopt(line, [NodeId::Derived(points.id())])?;
    Ok(line)
}

/// Line from a fixed logical point to a movable tip starting on it.
fn growing_line(
    graph: &mut ReactiveGraph,
    stage: &mut Stage,
    transform: CoordinateTransform,
    name: String,
    from: Vec2,
    style: LineStyle,
) -> Result<(EntityId, Signal<Vec2>), SceneError> {
    let tail = graph.create_signal(from);
    let tip = graph.create_signal(from);
    let points = transform.segment(graph, tail, tip);
    let line = stage.add_line(graph, name, points, style);
    stage.adopt(
        line,
        [
            NodeId::Signal(tail.id()),
            NodeId::Signal(tip.id()),
            NodeId::Derived(points.id()),
        ],
    )?;
    Ok((line, tip))
}

/// Text hanging off a fixed logical point by a pixel offset.
fn fixed_text(
    graph: &mut ReactiveGraph,
    stage: &mut Stage,
    transform: CoordinateTransform,
    name: String,
    text: String,
    (anchor, offset): (Vec2, Vec2),
    style: TextStyle,
) -> Result<EntityId, SceneError> {
    let position = transform.anchor(graph, anchor, offset);
    let text = graph.create_signal(text);
    let entity = stage.add_text(graph, name, position, text, style);
    stage.adopt(entity, [NodeId::Derived(position.id()), NodeId::Signal(text.id())])?;
    Ok(entity)
}

impl std::fmt::Debug for CartesianSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartesianSystem")
            .field("ticks", &self.ticks.len())
            .field("grid", &self.grid)
            .finish()
    }
}
