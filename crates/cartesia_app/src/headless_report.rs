//! Report output model for headless runs.

use crate::headless_runtime::HeadlessSummary;
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Component, Path};

/// Report status for a headless run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Passed,
    Failed,
    Stalled,
}

/// Machine-readable result of a headless run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessReport {
    pub demo: String,
    pub status: ReportStatus,
    pub message: Option<String>,
    pub elapsed_frames: u64,
    pub elapsed_ms: u64,
    /// Entities on stage after the last frame
    pub entities: usize,
    /// Frames handed to the frame sink
    pub recorded_frames: usize,
}

impl HeadlessReport {
    pub fn from_summary(demo: &str, summary: &HeadlessSummary, entities: usize, recorded_frames: usize) -> Self {
        let (status, message) = match (&summary.failure, summary.finished) {
            (Some(failure), _) => (ReportStatus::Failed, Some(failure.clone())),
            (None, true) => (ReportStatus::Passed, None),
            (None, false) => (
                ReportStatus::Stalled,
                Some(format!("still running after {} frames", summary.frames)),
            ),
        };
        Self {
            demo: demo.to_string(),
            status,
            message,
            elapsed_frames: summary.frames,
            elapsed_ms: summary.elapsed_ms,
            entities,
            recorded_frames,
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == ReportStatus::Passed
    }

    pub fn write_to_path(&self, path: &Path) -> Result<()> {
        if path.is_absolute() || path.has_root() {
            bail!("report path must be relative and must not start with a separator");
        }
        if path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
        {
            bail!("report path cannot contain '..' or drive prefixes");
        }
        let payload = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn write_to_writer<W: Write>(&self, writer: &mut W) -> Result<()> {
        let payload = serde_json::to_string_pretty(self)?;
        writer.write_all(payload.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}
