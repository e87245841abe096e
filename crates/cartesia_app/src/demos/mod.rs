//! Demo choreographies runnable by name.

mod dynamic_sine;
mod spacing_zoom;
mod vector_algebra;

use cartesia_animation::Directive;
use cartesia_scene::{Scene, SceneError};

/// Builds the demo's entities on `scene` and returns the directive that
/// plays it from start to finish.
pub type DemoBuilder = fn(&mut Scene) -> Result<Directive, SceneError>;

#[derive(Clone, Copy)]
pub struct Demo {
    pub name: &'static str,
    pub description: &'static str,
    pub build: DemoBuilder,
}

impl std::fmt::Debug for Demo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Demo").field("name", &self.name).finish()
    }
}

pub const DEMOS: &[Demo] = &[
    Demo {
        name: "vector-algebra",
        description: "point to vector, component construction, sum, difference and normalization",
        build: vector_algebra::build,
    },
    Demo {
        name: "dynamic-sine",
        description: "normal construction, then a drift-corrected sine curve following moving endpoints through a zoom",
        build: dynamic_sine::build,
    },
    Demo {
        name: "spacing-zoom",
        description: "vectors glued to the grid while the spacing animates, π tick labels",
        build: spacing_zoom::build,
    },
];

pub fn find(name: &str) -> Option<&'static Demo> {
    DEMOS.iter().find(|demo| demo.name == name)
}

pub fn names() -> impl Iterator<Item = &'static str> {
    DEMOS.iter().map(|demo| demo.name)
}
