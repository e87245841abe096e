//! Cartesia Core Runtime
//!
//! This crate provides the foundational primitives for the Cartesia animation engine:
//!
//! - **Reactive Cells**: signals with instant and animated writes, plus derived
//!   values that recompute from their inputs on every read
//! - **Geometry**: 2D vectors and colors shared by logical and render space
//!
//! # Example
//!
//! ```rust
//! use cartesia_core::reactive::{LinearEase, ReactiveGraph};
//!
//! let mut graph = ReactiveGraph::new();
//!
//! // Create a signal
//! let spacing = graph.create_signal(80.0f32);
//!
//! // Create a derived value
//! let tip = graph.create_derived(move |g| 2.0 * g.get(spacing).unwrap_or(0.0));
//!
//! // Animate the signal over one second and sample halfway
//! graph.animate(spacing, 380.0, 1.0, LinearEase).unwrap();
//! graph.advance_to(0.5);
//! assert_eq!(graph.get_derived(tip), Ok(460.0));
//! ```

pub mod geometry;
pub mod reactive;

pub use geometry::{Color, GeometryError, Vec2};
pub use reactive::{
    Animatable, Binding, Derived, DerivedId, Ease, LinearEase, NodeId, ReactiveError,
    ReactiveGraph, Signal, SignalId, TransitionHandle,
};
