//! Entity arena
//!
//! Every visual element lives in the [`Stage`] under a stable [`EntityId`].
//! Entities hold no values of their own: each property is a reactive cell or
//! a derived value in the scene's [`ReactiveGraph`], so the graph is the only
//! way anything on stage changes. Choreography keeps ids, never references.

use crate::error::SceneError;
use crate::snapshot::{EntitySnapshot, FrameSnapshot, ShapeSnapshot};
use cartesia_core::{Binding, Color, Derived, NodeId, ReactiveGraph, Signal, Vec2};
use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;

new_key_type! {
    /// Stable identifier of a stage entity
    pub struct EntityId;
}

// ─────────────────────────────────────────────────────────────────────────────
// Shapes
// ─────────────────────────────────────────────────────────────────────────────

/// Polyline in render space. `start` and `end` select the drawn fraction of
/// its length; `dash` is the dash length in pixels, zero for solid.
#[derive(Clone, Copy, Debug)]
pub struct LineNode {
    pub points: Binding<Vec<Vec2>>,
    pub stroke: Signal<Color>,
    pub width: Signal<f32>,
    pub start: Signal<f32>,
    pub end: Signal<f32>,
    pub dash: Signal<f32>,
    /// Arrowhead at the end of the line, zero for none
    pub arrow_size: Signal<f32>,
}

#[derive(Clone, Copy, Debug)]
pub struct CircleNode {
    pub center: Binding<Vec2>,
    pub radius: Signal<f32>,
    pub fill: Signal<Color>,
}

#[derive(Clone, Copy, Debug)]
pub struct TextNode {
    pub position: Binding<Vec2>,
    pub text: Binding<String>,
    pub fill: Signal<Color>,
    pub font_size: Signal<f32>,
}

/// Background grid centered on the origin
#[derive(Clone, Copy, Debug)]
pub struct GridNode {
    pub size: Binding<Vec2>,
    pub spacing: Binding<f32>,
    pub stroke: Signal<Color>,
    pub start: Signal<f32>,
    pub end: Signal<f32>,
}

#[derive(Clone, Copy, Debug)]
pub enum Shape {
    Line(LineNode),
    Circle(CircleNode),
    Text(TextNode),
    Grid(GridNode),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Line(_) => "line",
            Shape::Circle(_) => "circle",
            Shape::Text(_) => "text",
            Shape::Grid(_) => "grid",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Styles
// ─────────────────────────────────────────────────────────────────────────────

/// Initial values shared by every entity
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Appearance {
    pub opacity: f32,
    pub scale: f32,
}

impl Default for Appearance {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            scale: 1.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineStyle {
    pub stroke: Color,
    pub width: f32,
    pub start: f32,
    pub end: f32,
    pub dash: f32,
    pub arrow_size: f32,
    pub appearance: Appearance,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            stroke: Color::WHITE,
            width: 2.0,
            start: 0.0,
            end: 1.0,
            dash: 0.0,
            arrow_size: 0.0,
            appearance: Appearance::default(),
        }
    }
}

impl LineStyle {
    pub fn stroke(mut self, stroke: Color) -> Self {
        self.stroke = stroke;
        self
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn dashed(mut self, dash: f32) -> Self {
        self.dash = dash;
        self
    }

    pub fn arrow(mut self, size: f32) -> Self {
        self.arrow_size = size;
        self
    }

    /// Drawn fraction of the line
    pub fn span(mut self, start: f32, end: f32) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.appearance.opacity = opacity;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CircleStyle {
    pub radius: f32,
    pub fill: Color,
    pub appearance: Appearance,
}

impl Default for CircleStyle {
    fn default() -> Self {
        Self {
            radius: 10.0,
            fill: Color::WHITE,
            appearance: Appearance::default(),
        }
    }
}

impl CircleStyle {
    pub fn fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    pub fn radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.appearance.scale = scale;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextStyle {
    pub fill: Color,
    pub font_size: f32,
    pub appearance: Appearance,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            font_size: 28.0,
            appearance: Appearance::default(),
        }
    }
}

impl TextStyle {
    pub fn fill(mut self, fill: Color) -> Self {
        self.fill = fill;
        self
    }

    pub fn font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn opacity(mut self, opacity: f32) -> Self {
        self.appearance.opacity = opacity;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.appearance.scale = scale;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Stage
// ─────────────────────────────────────────────────────────────────────────────

pub struct Entity {
    name: String,
    shape: Shape,
    opacity: Signal<f32>,
    scale: Signal<f32>,
    /// Extra opacity factor computed from other cells
    visibility: Option<Derived<f32>>,
    /// Graph nodes removed together with the entity
    owned: SmallVec<[NodeId; 8]>,
}

impl Entity {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn opacity(&self) -> Signal<f32> {
        self.opacity
    }

    pub fn scale(&self) -> Signal<f32> {
        self.scale
    }
}

/// Arena of all entities in draw order
#[derive(Default)]
pub struct Stage {
    entities: SlotMap<EntityId, Entity>,
    order: Vec<EntityId>,
}

impl Stage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entity ids back to front
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.order.iter().copied()
    }

    pub fn add_line(
        &mut self,
        graph: &mut ReactiveGraph,
        name: impl Into<String>,
        points: impl Into<Binding<Vec<Vec2>>>,
        style: LineStyle,
    ) -> EntityId {
        let node = LineNode {
            points: points.into(),
            stroke: graph.create_signal(style.stroke),
            width: graph.create_signal(style.width),
            start: graph.create_signal(style.start),
            end: graph.create_signal(style.end),
            dash: graph.create_signal(style.dash),
            arrow_size: graph.create_signal(style.arrow_size),
        };
        let owned = [
            NodeId::Signal(node.stroke.id()),
            NodeId::Signal(node.width.id()),
            NodeId::Signal(node.start.id()),
            NodeId::Signal(node.end.id()),
            NodeId::Signal(node.dash.id()),
            NodeId::Signal(node.arrow_size.id()),
        ];
        self.insert(graph, name.into(), Shape::Line(node), style.appearance, &owned)
    }

    pub fn add_circle(
        &mut self,
        graph: &mut ReactiveGraph,
        name: impl Into<String>,
        center: impl Into<Binding<Vec2>>,
        style: CircleStyle,
    ) -> EntityId {
        let node = CircleNode {
            center: center.into(),
            radius: graph.create_signal(style.radius),
            fill: graph.create_signal(style.fill),
        };
        let owned = [NodeId::Signal(node.radius.id()), NodeId::Signal(node.fill.id())];
        self.insert(graph, name.into(), Shape::Circle(node), style.appearance, &owned)
    }

    pub fn add_text(
        &mut self,
        graph: &mut ReactiveGraph,
        name: impl Into<String>,
        position: impl Into<Binding<Vec2>>,
        text: impl Into<Binding<String>>,
        style: TextStyle,
    ) -> EntityId {
        let node = TextNode {
            position: position.into(),
            text: text.into(),
            fill: graph.create_signal(style.fill),
            font_size: graph.create_signal(style.font_size),
        };
        let owned = [NodeId::Signal(node.fill.id()), NodeId::Signal(node.font_size.id())];
        self.insert(graph, name.into(), Shape::Text(node), style.appearance, &owned)
    }

    pub fn add_grid(
        &mut self,
        graph: &mut ReactiveGraph,
        name: impl Into<String>,
        size: impl Into<Binding<Vec2>>,
        spacing: impl Into<Binding<f32>>,
        stroke: Color,
        span: (f32, f32),
    ) -> EntityId {
        let node = GridNode {
            size: size.into(),
            spacing: spacing.into(),
            stroke: graph.create_signal(stroke),
            start: graph.create_signal(span.0),
            end: graph.create_signal(span.1),
        };
        let owned = [
            NodeId::Signal(node.stroke.id()),
            NodeId::Signal(node.start.id()),
            NodeId::Signal(node.end.id()),
        ];
        self.insert(graph, name.into(), Shape::Grid(node), Appearance::default(), &owned)
    }

    fn insert(
        &mut self,
        graph: &mut ReactiveGraph,
        name: String,
        shape: Shape,
        appearance: Appearance,
        owned: &[NodeId],
    ) -> EntityId {
        let opacity = graph.create_signal(appearance.opacity);
        let scale = graph.create_signal(appearance.scale);
        let mut nodes: SmallVec<[NodeId; 8]> = SmallVec::from_slice(owned);
        nodes.push(NodeId::Signal(opacity.id()));
        nodes.push(NodeId::Signal(scale.id()));
        tracing::trace!(name = %name, kind = shape.kind(), "entity added");
        let id = self.entities.insert(Entity {
            name,
            shape,
            opacity,
            scale,
            visibility: None,
            owned: nodes,
        });
        self.order.push(id);
        id
    }

    pub fn entity(&self, id: EntityId) -> Result<&Entity, SceneError> {
        self.entities.get(id).ok_or(SceneError::MissingEntity(id))
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(id)
    }

    pub fn opacity(&self, id: EntityId) -> Result<Signal<f32>, SceneError> {
        Ok(self.entity(id)?.opacity)
    }

    pub fn scale(&self, id: EntityId) -> Result<Signal<f32>, SceneError> {
        Ok(self.entity(id)?.scale)
    }

    pub fn line(&self, id: EntityId) -> Result<LineNode, SceneError> {
        match self.entity(id)?.shape {
            Shape::Line(node) => Ok(node),
            other => Err(wrong_shape(id, "line", &other)),
        }
    }

    pub fn circle(&self, id: EntityId) -> Result<CircleNode, SceneError> {
        match self.entity(id)?.shape {
            Shape::Circle(node) => Ok(node),
            other => Err(wrong_shape(id, "circle", &other)),
        }
    }

    pub fn text(&self, id: EntityId) -> Result<TextNode, SceneError> {
        match self.entity(id)?.shape {
            Shape::Text(node) => Ok(node),
            other => Err(wrong_shape(id, "text", &other)),
        }
    }

    pub fn grid(&self, id: EntityId) -> Result<GridNode, SceneError> {
        match self.entity(id)?.shape {
            Shape::Grid(node) => Ok(node),
            other => Err(wrong_shape(id, "grid", &other)),
        }
    }

    /// Multiply the entity's opacity by a computed factor.
    ///
    /// The entity takes ownership of `factor`, so each entity needs its own.
    pub fn set_visibility(&mut self, id: EntityId, factor: Derived<f32>) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(SceneError::MissingEntity(id))?;
        entity.visibility = Some(factor);
        entity.owned.push(NodeId::Derived(factor.id()));
        Ok(())
    }

    /// Hand graph nodes to the entity so that [`Stage::destroy`] removes them.
    pub fn adopt(&mut self, id: EntityId, nodes: impl IntoIterator<Item = NodeId>) -> Result<(), SceneError> {
        let entity = self
            .entities
            .get_mut(id)
            .ok_or(SceneError::MissingEntity(id))?;
        for node in nodes {
            if !entity.owned.contains(&node) {
                entity.owned.push(node);
            }
        }
        Ok(())
    }

    /// Draw `id` directly underneath `other`.
    pub fn place_below(&mut self, id: EntityId, other: EntityId) -> Result<(), SceneError> {
        self.entity(id)?;
        self.entity(other)?;
        self.order.retain(|entry| *entry != id);
        let index = self
            .order
            .iter()
            .position(|entry| *entry == other)
            .unwrap_or(0);
        self.order.insert(index, id);
        Ok(())
    }

    /// Remove an entity and every graph node it owns.
    pub fn destroy(&mut self, graph: &mut ReactiveGraph, id: EntityId) -> Result<(), SceneError> {
        let entity = self
            .entities
            .remove(id)
            .ok_or(SceneError::MissingEntity(id))?;
        self.order.retain(|entry| *entry != id);
        for node in entity.owned {
            graph.remove_node(node);
        }
        tracing::trace!(name = %entity.name, "entity destroyed");
        Ok(())
    }

    /// Resolve every entity at the graph's current time.
    pub fn snapshot(&self, graph: &ReactiveGraph, frame: u64) -> Result<FrameSnapshot, SceneError> {
        let mut entities = Vec::with_capacity(self.order.len());
        for &id in &self.order {
            let entity = self.entity(id)?;
            let factor = match entity.visibility {
                Some(factor) => graph.get_derived(factor)?,
                None => 1.0,
            };
            entities.push(EntitySnapshot {
                name: entity.name.clone(),
                opacity: graph.try_get(entity.opacity)? * factor,
                scale: graph.try_get(entity.scale)?,
                shape: resolve_shape(graph, &entity.shape)?,
            });
        }
        Ok(FrameSnapshot {
            frame,
            time: graph.now(),
            entities,
        })
    }
}

fn wrong_shape(id: EntityId, expected: &'static str, actual: &Shape) -> SceneError {
    SceneError::WrongShape {
        id,
        expected,
        actual: actual.kind(),
    }
}

fn resolve_shape(graph: &ReactiveGraph, shape: &Shape) -> Result<ShapeSnapshot, SceneError> {
    let snapshot = match shape {
        Shape::Line(line) => ShapeSnapshot::Line {
            points: graph.read(line.points)?,
            stroke: graph.try_get(line.stroke)?,
            width: graph.try_get(line.width)?,
            start: graph.try_get(line.start)?,
            end: graph.try_get(line.end)?,
            dash: graph.try_get(line.dash)?,
            arrow_size: graph.try_get(line.arrow_size)?,
        },
        Shape::Circle(circle) => ShapeSnapshot::Circle {
            center: graph.read(circle.center)?,
            radius: graph.try_get(circle.radius)?,
            fill: graph.try_get(circle.fill)?,
        },
        Shape::Text(text) => ShapeSnapshot::Text {
            position: graph.read(text.position)?,
            text: graph.read(text.text)?,
            fill: graph.try_get(text.fill)?,
            font_size: graph.try_get(text.font_size)?,
        },
        Shape::Grid(grid) => ShapeSnapshot::Grid {
            size: graph.read(grid.size)?,
            spacing: graph.read(grid.spacing)?,
            stroke: graph.try_get(grid.stroke)?,
            start: graph.try_get(grid.start)?,
            end: graph.try_get(grid.end)?,
        },
    };
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_snapshot_line() {
        let mut graph = ReactiveGraph::new();
        let mut stage = Stage::new();
        let points = graph.create_signal(vec![Vec2::ZERO, Vec2::new(160.0, -80.0)]);
        let id = stage.add_line(
            &mut graph,
            "arrow",
            points,
            LineStyle::default().width(6.0).arrow(20.0),
        );

        let snapshot = stage.snapshot(&graph, 0).unwrap();
        let entity = snapshot.find("arrow").unwrap();
        assert_eq!(entity.opacity, 1.0);
        match &entity.shape {
            ShapeSnapshot::Line {
                points,
                width,
                arrow_size,
                ..
            } => {
                assert_eq!(points, &vec![Vec2::ZERO, Vec2::new(160.0, -80.0)]);
                assert_eq!(*width, 6.0);
                assert_eq!(*arrow_size, 20.0);
            }
            other => panic!("expected a line, got {other:?}"),
        }
        assert!(stage.circle(id).is_err());
    }

    #[test]
    fn test_visibility_multiplies_opacity() {
        let mut graph = ReactiveGraph::new();
        let mut stage = Stage::new();
        let shown = graph.create_signal(0.0f32);
        let center = graph.create_signal(Vec2::ZERO);
        let id = stage.add_circle(&mut graph, "dot", center, CircleStyle::default());
        let factor = graph.create_derived(move |g| g.get(shown).unwrap_or(0.0));
        stage.set_visibility(id, factor).unwrap();
        graph.set(stage.opacity(id).unwrap(), 0.5).unwrap();

        assert_eq!(stage.snapshot(&graph, 0).unwrap().entities[0].opacity, 0.0);
        graph.set(shown, 1.0).unwrap();
        assert_eq!(stage.snapshot(&graph, 0).unwrap().entities[0].opacity, 0.5);
    }

    #[test]
    fn test_destroy_removes_owned_cells() {
        let mut graph = ReactiveGraph::new();
        let mut stage = Stage::new();
        let center = graph.create_signal(Vec2::ZERO);
        let id = stage.add_circle(&mut graph, "dot", center, CircleStyle::default());
        stage.adopt(id, [NodeId::Signal(center.id())]).unwrap();
        let before = graph.signal_count();
        assert_eq!(before, 5);

        stage.destroy(&mut graph, id).unwrap();
        assert_eq!(graph.signal_count(), 0);
        assert!(stage.is_empty());
        assert_eq!(stage.destroy(&mut graph, id), Err(SceneError::MissingEntity(id)));
    }

    #[test]
    fn test_place_below_changes_draw_order() {
        let mut graph = ReactiveGraph::new();
        let mut stage = Stage::new();
        let empty = graph.create_signal(Vec::<Vec2>::new());
        let a = stage.add_line(&mut graph, "a", empty, LineStyle::default());
        let b = stage.add_line(&mut graph, "b", empty, LineStyle::default());
        let c = stage.add_line(&mut graph, "c", empty, LineStyle::default());
        stage.place_below(c, b).unwrap();
        assert_eq!(stage.ids().collect::<Vec<_>>(), vec![a, c, b]);
    }
}
