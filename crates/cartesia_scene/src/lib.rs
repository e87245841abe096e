//! Cartesia Scene Layer
//!
//! Everything between the reactive runtime and a renderer:
//!
//! - **Coordinates**: logical grid units to render pixels through an
//!   animatable spacing cell
//! - **Stage**: an entity arena whose every property is a reactive cell
//! - **Vectors**: arrows with labels that track their logical positions
//! - **Curves**: drift-corrected sine curves between moving endpoints
//! - **System**: grid, axes, ticks and the vector choreography built on them
//!
//! # Example
//!
//! ```rust
//! use cartesia_scene::{CartesianSystem, Scene, SnapshotRecorder};
//! use cartesia_core::Color;
//!
//! let mut scene = Scene::default();
//! let system = CartesianSystem::new(&mut scene).unwrap();
//! let intro = system.setup(&scene).unwrap();
//! scene.play(intro).unwrap();
//!
//! let (u, grow) = system.spawn_vector(&mut scene, 2.0, 1.0, Color::WHITE, "u").unwrap();
//! scene.play(grow).unwrap();
//!
//! let mut recorder = SnapshotRecorder::new();
//! scene.play_out(&mut recorder, 10_000).unwrap();
//! assert_eq!(u.render_tip(scene.graph()).unwrap(), system.to_render(&scene, 2.0, 1.0));
//! ```

pub mod coords;
pub mod curve;
pub mod error;
pub mod scene;
pub mod snapshot;
pub mod stage;
pub mod system;
pub mod vector;

pub use coords::{CoordinateTransform, DEFAULT_SPACING};
pub use curve::{sample_curve, CurveSpec};
pub use error::SceneError;
pub use scene::{Scene, SceneConfig};
pub use snapshot::{EntitySnapshot, FrameSink, FrameSnapshot, ShapeSnapshot, SnapshotRecorder};
pub use stage::{CircleStyle, EntityId, LineStyle, Shape, Stage, TextStyle};
pub use system::{tick_label, CartesianSystem, Decomposition, NormalConstruction};
pub use vector::{decompose, ManagedVector, VectorSpec};
