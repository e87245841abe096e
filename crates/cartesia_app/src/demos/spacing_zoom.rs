use cartesia_animation::{Directive, Easing};
use cartesia_core::Color;
use cartesia_scene::system::PHYSICAL_VECTOR_DURATION;
use cartesia_scene::{CartesianSystem, Scene, SceneError, DEFAULT_SPACING};

pub fn build(scene: &mut Scene) -> Result<Directive, SceneError> {
    let system = CartesianSystem::new(scene)?;
    let setup = system.setup(scene)?;

    let (_, spawn_u) = system.spawn_vector(scene, 2.0, 1.0, Color::from_hex(0x68ABDF), "u")?;
    let (_, explain_a) = system.explain_physical_vector(
        scene,
        -3.0,
        2.0,
        Color::from_hex(0xFFA94D),
        "a",
        PHYSICAL_VECTOR_DURATION,
    )?;
    let switch = system.switch_to_pi(scene, 1.0)?;
    let transform = scene.transform();

    Ok(Directive::chain([
        setup,
        Directive::all([spawn_u, explain_a]),
        transform.animate_spacing(380.0, 1.2, Easing::EaseInOutCubic),
        switch,
        transform.animate_spacing(DEFAULT_SPACING, 1.2, Easing::EaseInOutCubic),
    ])
    .labeled("spacing-zoom"))
}
