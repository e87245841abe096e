use cartesia_animation::{Directive, Easing};
use cartesia_core::Vec2;
use cartesia_scene::curve::DEFAULT_AMPLITUDE;
use cartesia_scene::system::NORMAL_CONSTRUCTION_DURATION;
use cartesia_scene::{CartesianSystem, Scene, SceneError};
use std::f32::consts::PI;

pub fn build(scene: &mut Scene) -> Result<Directive, SceneError> {
    let system = CartesianSystem::new(scene)?;
    let setup = system.setup(scene)?;
    let (_, explain) = system.explain_normal_construction(
        scene,
        Vec2::new(-4.0, 0.0),
        Vec2::new(4.0, 0.0),
        "wave",
        NORMAL_CONSTRUCTION_DURATION,
    )?;

    let curve = system.spawn_dynamic_curve(
        scene,
        Vec2::new(-4.0, 0.0),
        Vec2::new(4.0, 0.0),
        4.0 * PI,
        DEFAULT_AMPLITUDE,
    )?;
    let draw = curve.draw(scene.stage(), 1.0)?;
    let cubic = Easing::EaseInOutCubic;

    let morph = Directive::all([
        Directive::tween(curve.end, Vec2::new(4.0, 3.0), 2.0, cubic),
        Directive::tween(curve.frequency, 8.0 * PI, 2.0, cubic),
        Directive::tween(curve.phase, 2.0 * PI, 2.0, Easing::Linear),
        scene.transform().animate_spacing(120.0, 2.0, cubic),
    ]);
    let settle = Directive::all([
        Directive::tween(curve.start, Vec2::new(-4.0, -2.0), 1.0, cubic),
        Directive::tween(curve.amplitude, DEFAULT_AMPLITUDE / 2.0, 1.0, cubic),
    ]);

    Ok(Directive::chain([setup, explain, draw, morph, settle]).labeled("dynamic-sine"))
}
