//! Cartesia Headless Runner
//!
//! Plays scene choreographies without a window: a deterministic frame loop
//! drives the scene clock, every sampled frame is resolved into a snapshot
//! for a [`cartesia_scene::FrameSink`], and the run ends in a JSON report.
//!
//! # Example
//!
//! ```rust
//! use cartesia_app::{run_demo, HeadlessRunConfig};
//! use cartesia_scene::SnapshotRecorder;
//!
//! let mut recorder = SnapshotRecorder::new();
//! let cfg = HeadlessRunConfig {
//!     probe_every_frames: 30,
//!     ..Default::default()
//! };
//! let outcome = run_demo("spacing-zoom", cfg, &mut recorder).unwrap();
//! assert!(!outcome.is_failed());
//! assert!(!recorder.is_empty());
//! ```

pub mod demos;
pub mod headless_report;
pub mod headless_runner;
pub mod headless_runtime;

#[cfg(test)]
mod tests;

pub use demos::{Demo, DEMOS};
pub use headless_report::{HeadlessReport, ReportStatus};
pub use headless_runner::{run_demo, RunOutcome};
pub use headless_runtime::{HeadlessContext, HeadlessRunConfig, HeadlessRuntime, HeadlessSummary};
