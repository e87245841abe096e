use cartesia_animation::Directive;
use cartesia_core::Color;
use cartesia_scene::{CartesianSystem, Scene, SceneError};

const BLUE: u32 = 0x68ABDF;
const GREEN: u32 = 0xA6E22E;
const ORANGE: u32 = 0xFFA94D;
const PURPLE: u32 = 0xC678DD;

pub fn build(scene: &mut Scene) -> Result<Directive, SceneError> {
    let system = CartesianSystem::new(scene)?;
    let setup = system.setup(scene)?;

    let (u, show_u) = system.show_point(scene, 2.0, 1.0, Color::from_hex(BLUE), "u")?;
    let (v, construct_v) = system.construct_vector(scene, 1.0, 3.0, Color::from_hex(GREEN), "v")?;
    let (sum, add) = system.add(scene, &u, &v, Color::from_hex(ORANGE), "u+v")?;
    let (_, subtract) = system.subtract(scene, &sum, &u, Color::WHITE, "v'")?;

    let (mut w, spawn_w) = system.spawn_vector(scene, -3.0, 4.0, Color::from_hex(PURPLE), "w")?;
    let normalize = system.normalize(scene, &mut w)?;

    Ok(Directive::chain([
        setup,
        show_u,
        construct_v,
        add,
        subtract,
        spawn_w,
        Directive::wait(0.3),
        normalize,
    ])
    .labeled("vector-algebra"))
}
