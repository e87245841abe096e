//! Resolved frames
//!
//! A [`FrameSnapshot`] is what a renderer would paint: every entity with all
//! of its properties resolved at one instant. [`FrameSink`] is the seam to
//! that renderer; [`SnapshotRecorder`] is the in-memory sink used by headless
//! runs and tests.

use crate::error::SceneError;
use cartesia_core::{Color, Vec2};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    /// Clock time in seconds
    pub time: f64,
    /// Back to front
    pub entities: Vec<EntitySnapshot>,
}

impl FrameSnapshot {
    /// First entity with the given name
    pub fn find(&self, name: &str) -> Option<&EntitySnapshot> {
        self.entities.iter().find(|entity| entity.name == name)
    }

    /// Entities with non-zero opacity and scale
    pub fn visible(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.entities.iter().filter(|entity| entity.is_visible())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub name: String,
    pub opacity: f32,
    pub scale: f32,
    #[serde(flatten)]
    pub shape: ShapeSnapshot,
}

impl EntitySnapshot {
    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0 && self.scale != 0.0
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShapeSnapshot {
    Line {
        points: Vec<Vec2>,
        stroke: Color,
        width: f32,
        start: f32,
        end: f32,
        dash: f32,
        arrow_size: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        fill: Color,
    },
    Text {
        position: Vec2,
        text: String,
        fill: Color,
        font_size: f32,
    },
    Grid {
        size: Vec2,
        spacing: f32,
        stroke: Color,
        start: f32,
        end: f32,
    },
}

/// Receives one snapshot per presented frame.
pub trait FrameSink {
    fn present(&mut self, frame: FrameSnapshot) -> Result<(), SceneError>;
}

/// Keeps presented frames in memory, optionally only every n-th one.
#[derive(Debug, Default)]
pub struct SnapshotRecorder {
    frames: Vec<FrameSnapshot>,
    stride: u64,
}

impl SnapshotRecorder {
    pub fn new() -> Self {
        Self::with_stride(1)
    }

    /// Record only frames whose index is a multiple of `stride`.
    pub fn with_stride(stride: u64) -> Self {
        Self {
            frames: Vec::new(),
            stride: stride.max(1),
        }
    }

    pub fn frames(&self) -> &[FrameSnapshot] {
        &self.frames
    }

    pub fn last(&self) -> Option<&FrameSnapshot> {
        self.frames.last()
    }

    pub fn frame(&self, index: u64) -> Option<&FrameSnapshot> {
        self.frames.iter().find(|snapshot| snapshot.frame == index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn into_frames(self) -> Vec<FrameSnapshot> {
        self.frames
    }
}

impl FrameSink for SnapshotRecorder {
    fn present(&mut self, frame: FrameSnapshot) -> Result<(), SceneError> {
        if frame.frame % self.stride.max(1) == 0 {
            self.frames.push(frame);
        }
        Ok(())
    }
}
