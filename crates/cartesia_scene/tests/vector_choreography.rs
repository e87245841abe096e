//! Integration tests for the cartesian system and its vector procedures
//!
//! These tests verify that:
//! - Arrows stay glued to the grid while the spacing animates
//! - Vector algebra updates logical positions and lands the visuals on them
//! - Tick labels switch to multiples of π halfway through the pulse
//! - Whole choreographies play out into recorded frames
//! - The normal construction turns the chord direction a quarter turn

use cartesia_animation::Easing;
use cartesia_core::{Color, GeometryError, Vec2};
use cartesia_scene::curve::wave_normal;
use cartesia_scene::system::{NORMAL_CONSTRUCTION_DURATION, PHYSICAL_VECTOR_DURATION};
use cartesia_scene::{
    CartesianSystem, ManagedVector, Scene, SceneError, ShapeSnapshot, SnapshotRecorder, VectorSpec,
};

const MAX_TICKS: u64 = 10_000;

fn approx(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

fn text_of(scene: &Scene, name: &str) -> String {
    let snapshot = scene.snapshot().unwrap();
    match &snapshot.find(name).unwrap().shape {
        ShapeSnapshot::Text { text, .. } => text.clone(),
        other => panic!("{name} is not text: {other:?}"),
    }
}

/// Zooming from 80 to 380 pixels per cell keeps the tip of (2, 1) on its cell
#[test]
fn test_tip_tracks_spacing_zoom() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let transform = scene.transform();
    let (graph, stage) = scene.parts_mut();
    let u = ManagedVector::spawn(
        graph,
        stage,
        transform,
        VectorSpec::new("u", Vec2::new(2.0, 1.0), Color::WHITE).grown(),
    )
    .unwrap();

    scene
        .play(transform.animate_spacing(380.0, 1.2, Easing::EaseInOutCubic))
        .unwrap();
    let mut ticks = 0;
    while !scene.is_idle() {
        scene.tick().unwrap();
        ticks += 1;
        assert_eq!(
            u.render_tip(scene.graph()).unwrap(),
            system.to_render(&scene, 2.0, 1.0)
        );
    }
    assert_eq!(ticks, 72);
    assert_eq!(u.render_tip(scene.graph()).unwrap(), Vec2::new(760.0, -380.0));
}

#[test]
fn test_add_then_subtract() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (u, grow_u) = system
        .spawn_vector(&mut scene, 2.0, 1.0, Color::from_hex(0x46D9FF), "u")
        .unwrap();
    let (v, grow_v) = system
        .spawn_vector(&mut scene, 4.0, 2.0, Color::from_hex(0xA6E22E), "v")
        .unwrap();
    scene.play(grow_u.then(grow_v)).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    let (sum, add) = system
        .add(&mut scene, &u, &v, Color::from_hex(0xFF5555), "u+v")
        .unwrap();
    assert_eq!(sum.logical_position(), Vec2::new(6.0, 3.0));
    assert_eq!(sum.tail_position(), Vec2::ZERO);
    scene.play(add).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();
    assert_eq!(sum.render_tip(scene.graph()).unwrap(), Vec2::new(480.0, -240.0));

    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("v-arrow").unwrap().opacity, 0.0);
    assert!((snapshot.find("u+v-ghost").unwrap().opacity - 0.3).abs() < 1e-6);
    match &snapshot.find("u+v-moved").unwrap().shape {
        ShapeSnapshot::Line { points, dash, .. } => {
            assert_eq!(points, &vec![Vec2::new(160.0, -80.0), Vec2::new(480.0, -240.0)]);
            assert_eq!(*dash, 10.0);
        }
        other => panic!("expected a line, got {other:?}"),
    }

    let (difference, subtract) = system
        .subtract(&mut scene, &sum, &u, Color::WHITE, "d")
        .unwrap();
    assert_eq!(difference.logical_position(), Vec2::new(4.0, 2.0));
    assert_eq!(difference.tail_position(), Vec2::new(2.0, 1.0));
    scene.play(subtract).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();
    assert_eq!(
        difference.render_points(scene.graph()).unwrap(),
        vec![Vec2::new(160.0, -80.0), Vec2::new(480.0, -240.0)]
    );
    // Label settles beside the midpoint (4, 2)
    let snapshot = scene.snapshot().unwrap();
    match &snapshot.find("d-label").unwrap().shape {
        ShapeSnapshot::Text { position, .. } => {
            assert!(approx(*position, Vec2::new(340.0, -180.0)), "{position:?}")
        }
        other => panic!("expected text, got {other:?}"),
    }
}

#[test]
fn test_normalize_to_unit_length() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (mut v, grow) = system
        .spawn_vector(&mut scene, 3.0, 4.0, Color::WHITE, "v")
        .unwrap();
    scene.play(grow).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    let normalize = system.normalize(&mut scene, &mut v).unwrap();
    assert!((v.logical_position().length() - 1.0).abs() < 1e-6);
    scene.play(normalize).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    assert!(approx(v.render_tip(scene.graph()).unwrap(), Vec2::new(48.0, -64.0)));
    assert_eq!(text_of(&scene, "v-label"), "norm");
    let silhouette = scene.snapshot().unwrap();
    let silhouette = silhouette.find("v-arrow-silhouette").unwrap();
    assert!((silhouette.opacity - 0.3).abs() < 1e-6);
}

#[test]
fn test_normalize_zero_vector_fails() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (mut zero, _) = system
        .spawn_vector(&mut scene, 0.0, 0.0, Color::WHITE, "z")
        .unwrap();
    assert!(matches!(
        system.normalize(&mut scene, &mut zero),
        Err(SceneError::Geometry(GeometryError::ZeroLength { .. }))
    ));
}

#[test]
fn test_setup_reveals_ticks_and_switches_to_pi() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    // 20 ticks each side horizontally, 11 vertically, origin excluded
    assert_eq!(system.tick_count(), 40 + 22);

    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("tick-x1").unwrap().scale, 0.0);

    let setup = system.setup(&scene).unwrap();
    scene.play(setup).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("tick-x1").unwrap().scale, 1.0);
    assert_eq!(snapshot.find("tick-x12").unwrap().opacity, 1.0);
    // 13 * 80 lies beyond half of the 1920 pixel view
    assert_eq!(snapshot.find("tick-x13").unwrap().opacity, 0.0);
    match &snapshot.find("x-axis").unwrap().shape {
        ShapeSnapshot::Line { start, end, .. } => assert_eq!((*start, *end), (0.0, 1.0)),
        other => panic!("expected a line, got {other:?}"),
    }
    assert_eq!(text_of(&scene, "tick-x1-label"), "1");

    let pulse = system.switch_to_pi(&scene, 1.0).unwrap();
    scene.play(pulse).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    assert_eq!(text_of(&scene, "tick-x1-label"), "π");
    assert_eq!(text_of(&scene, "tick-x-1-label"), "-π");
    assert_eq!(text_of(&scene, "tick-x3-label"), "3π");
    assert_eq!(text_of(&scene, "tick-y2-label"), "2");
    assert_eq!(scene.snapshot().unwrap().find("tick-y2").unwrap().scale, 1.0);
}

#[test]
fn test_physical_vector_duration_scales() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (_, nominal) = system
        .explain_physical_vector(&mut scene, 3.0, 2.0, Color::WHITE, "a", PHYSICAL_VECTOR_DURATION)
        .unwrap();
    assert!((nominal.nominal_duration() - PHYSICAL_VECTOR_DURATION).abs() < 1e-4);

    let (b, doubled) = system
        .explain_physical_vector(&mut scene, 3.0, 2.0, Color::WHITE, "b", 6.6)
        .unwrap();
    assert!((doubled.nominal_duration() - 6.6).abs() < 1e-4);

    scene.play(doubled).unwrap();
    let mut recorder = SnapshotRecorder::new();
    scene.play_out(&mut recorder, MAX_TICKS).unwrap();
    let last = recorder.last().unwrap();
    assert_eq!(last.find("b-dot").unwrap().scale, 0.0);
    assert_eq!(last.find("b-label").unwrap().scale, 1.0);
    assert_eq!(b.render_tip(scene.graph()).unwrap(), Vec2::new(240.0, -160.0));
}

#[test]
fn test_show_point_becomes_vector() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (p, show) = system
        .show_point(&mut scene, 3.0, 2.0, Color::from_hex(0x46D9FF), "p")
        .unwrap();
    assert_eq!(text_of(&scene, "p-label"), "P(3, 2)");
    assert_eq!(p.attachments().len(), 3);

    scene.play(show).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();
    assert_eq!(text_of(&scene, "p-label"), "p");
    assert_eq!(p.render_tip(scene.graph()).unwrap(), Vec2::new(240.0, -160.0));
    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("p-point").unwrap().scale, 0.0);
    assert!((snapshot.find("p-guide-x").unwrap().opacity - 0.3).abs() < 1e-6);
}

#[test]
fn test_construct_vector_clears_components() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (w, construct) = system
        .construct_vector(&mut scene, -2.0, 3.0, Color::WHITE, "w")
        .unwrap();
    scene.play(construct).unwrap();
    scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();

    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("w-component-x").unwrap().opacity, 0.0);
    match &snapshot.find("w-component-y").unwrap().shape {
        ShapeSnapshot::Line { points, .. } => {
            assert_eq!(points, &vec![Vec2::new(-160.0, -0.0), Vec2::new(-160.0, -240.0)])
        }
        other => panic!("expected a line, got {other:?}"),
    }
    assert_eq!(snapshot.find("w-label").unwrap().opacity, 1.0);

    let entities = scene.stage().len();
    let (graph, stage) = scene.parts_mut();
    w.destroy(graph, stage).unwrap();
    assert_eq!(scene.stage().len(), entities - 4);
}

#[test]
fn test_dynamic_curve_follows_zoom() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let curve = system
        .spawn_dynamic_curve(&mut scene, Vec2::new(-3.0, 0.0), Vec2::new(3.0, 1.0), 12.0, 40.0)
        .unwrap();
    let draw = curve.draw(scene.stage(), 1.0).unwrap();
    let zoom = scene
        .transform()
        .animate_spacing(120.0, 1.0, Easing::EaseInOutCubic);
    scene.play(draw).unwrap();
    scene.play(zoom).unwrap();

    let mut recorder = SnapshotRecorder::with_stride(10);
    scene.play_out(&mut recorder, MAX_TICKS).unwrap();
    for frame in recorder.frames() {
        let spacing = match &frame.find("grid").unwrap().shape {
            ShapeSnapshot::Grid { spacing, .. } => *spacing,
            other => panic!("expected a grid, got {other:?}"),
        };
        match &frame.find("curve").unwrap().shape {
            ShapeSnapshot::Line { points, .. } => {
                assert_eq!(*points.last().unwrap(), Vec2::new(3.0 * spacing, -spacing));
            }
            other => panic!("expected a line, got {other:?}"),
        }
    }
}

fn line_points(scene: &Scene, name: &str) -> Vec<Vec2> {
    match &scene.snapshot().unwrap().find(name).unwrap().shape {
        ShapeSnapshot::Line { points, .. } => points.clone(),
        other => panic!("{name} is not a line: {other:?}"),
    }
}

/// After the quarter turn the normal arrow is one cell long and perpendicular
/// to the chord
#[test]
fn test_normal_construction_turns_perpendicular() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let start = Vec2::new(-3.0, -1.0);
    let end = Vec2::new(3.0, 2.0);
    let (construction, explain) = system
        .explain_normal_construction(&mut scene, start, end, "n", NORMAL_CONSTRUCTION_DURATION)
        .unwrap();
    assert_eq!(construction.normal, construction.direction.rotate_90());
    assert!((explain.nominal_duration() - 8.1).abs() < 1e-4);
    assert_eq!(line_points(&scene, "n-unit-circle")[0], Vec2::new(80.0, -40.0));

    scene.play(explain).unwrap();
    // Reveal, circle, direction, pause, ghost pause, then the 1.5 s turn
    for _ in 0..(30 + 30 + 30 + 30 + 18 + 90) {
        scene.tick().unwrap();
    }
    assert_eq!(
        scene.graph().get(construction.angle),
        Some(std::f32::consts::FRAC_PI_2)
    );

    let points = line_points(&scene, "n-normal");
    assert_eq!(points[0], Vec2::new(0.0, -40.0));
    let arrow = points[1] - points[0];
    let chord = system.to_render(&scene, end.x, end.y) - system.to_render(&scene, start.x, start.y);
    assert!(arrow.dot(chord).abs() < 1e-3 * chord.length());
    assert!((arrow.length() - 80.0).abs() < 1e-3);
    assert!(approx(arrow, wave_normal(chord.try_normalize().unwrap()) * 80.0));

    let snapshot = scene.snapshot().unwrap();
    assert_eq!(snapshot.find("n-normal").unwrap().opacity, 1.0);
    assert_eq!(snapshot.find("n-normal-label").unwrap().scale, 1.0);
    assert_eq!(snapshot.find("n-right-angle").unwrap().opacity, 0.0);

    let rest = scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();
    assert_eq!(228 + rest, 486);
    let snapshot = scene.snapshot().unwrap();
    for name in ["n-unit-circle", "n-direction", "n-normal", "n-right-angle", "n-sine-label"] {
        assert_eq!(snapshot.find(name).unwrap().opacity, 0.0, "{name}");
    }

    let entities = scene.stage().len();
    assert_eq!(construction.entities().len(), 8);
    let (graph, stage) = scene.parts_mut();
    construction.destroy(graph, stage).unwrap();
    assert_eq!(scene.stage().len(), entities - 8);
    assert!(scene.snapshot().is_ok());
}

/// Doubling the duration doubles every step, including the sine sweep
#[test]
fn test_normal_construction_duration_scales() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let (_, explain) = system
        .explain_normal_construction(&mut scene, Vec2::new(-2.0, 0.0), Vec2::new(2.0, 0.0), "n", 4.0)
        .unwrap();
    assert!((explain.nominal_duration() - 16.2).abs() < 1e-3);

    scene.play(explain).unwrap();
    // Halfway through the 4 s sweep the normal peaks at 1.5 cells
    let sweep_start = 2 * (30 + 30 + 30 + 30 + 18 + 90 + 18 + 60 + 30);
    for _ in 0..(sweep_start + 120) {
        scene.tick().unwrap();
    }
    let points = line_points(&scene, "n-normal");
    assert!(approx(points[1] - points[0], Vec2::new(0.0, -120.0)));

    let rest = scene.play_out(&mut SnapshotRecorder::new(), MAX_TICKS).unwrap();
    assert_eq!(sweep_start + 120 + rest, 972);
    // A sweep back to zero length leaves the arrow hidden
    let points = line_points(&scene, "n-normal");
    assert!((points[1] - points[0]).length() < 1.0);
}

#[test]
fn test_normal_construction_needs_distinct_endpoints() {
    let mut scene = Scene::default();
    let system = CartesianSystem::new(&mut scene).unwrap();
    let entities = scene.stage().len();
    let err = system
        .explain_normal_construction(&mut scene, Vec2::ONE, Vec2::ONE, "n", NORMAL_CONSTRUCTION_DURATION)
        .unwrap_err();
    assert_eq!(
        err,
        SceneError::Geometry(GeometryError::ZeroLength { x: 0.0, y: 0.0 })
    );
    assert_eq!(scene.stage().len(), entities);
}
