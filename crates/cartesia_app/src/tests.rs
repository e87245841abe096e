//! Tests for the headless runner

use crate::demos::{self, DEMOS};
use crate::headless_report::{HeadlessReport, ReportStatus};
use crate::headless_runner::run_demo;
use crate::headless_runtime::{HeadlessRunConfig, HeadlessRuntime};
use cartesia_animation::Directive;
use cartesia_scene::{FrameSink, FrameSnapshot, Scene, SceneError, SnapshotRecorder};
use std::path::Path;

fn sparse() -> HeadlessRunConfig {
    HeadlessRunConfig {
        probe_every_frames: 15,
        ..Default::default()
    }
}

#[test]
fn test_config_validation() {
    assert!(HeadlessRunConfig::default().validate().is_ok());
    for bad in [
        HeadlessRunConfig { width: 0, ..Default::default() },
        HeadlessRunConfig { fps: 0.0, ..Default::default() },
        HeadlessRunConfig { fps: f64::NAN, ..Default::default() },
        HeadlessRunConfig { spacing: -1.0, ..Default::default() },
        HeadlessRunConfig { max_frames: 0, ..Default::default() },
    ] {
        assert!(bad.validate().is_err(), "{bad:?}");
    }
}

#[test]
fn test_elapsed_ms_follows_fps() {
    let cfg = HeadlessRunConfig { fps: 30.0, ..Default::default() };
    assert_eq!(cfg.elapsed_ms(0), 0);
    assert_eq!(cfg.elapsed_ms(30), 1000);
    assert_eq!(cfg.elapsed_ms(45), 1500);
}

#[test]
fn test_every_demo_plays_to_completion() {
    assert_eq!(demos::names().count(), DEMOS.len());
    for demo in DEMOS {
        let mut recorder = SnapshotRecorder::new();
        let outcome = run_demo(demo.name, sparse(), &mut recorder).unwrap();
        let report = outcome.report();
        assert_eq!(report.status, ReportStatus::Passed, "{}: {:?}", demo.name, report.message);
        assert!(report.elapsed_frames > 0);
        assert_eq!(report.recorded_frames, recorder.len());
        assert!(!recorder.last().unwrap().entities.is_empty());
    }
}

#[test]
fn test_unknown_demo_is_an_error() {
    let err = run_demo("nope", sparse(), &mut SnapshotRecorder::new()).unwrap_err();
    assert!(err.to_string().contains("vector-algebra"));
}

#[test]
fn test_frame_budget_stalls() {
    let cfg = HeadlessRunConfig {
        max_frames: 10,
        ..Default::default()
    };
    let outcome = run_demo("spacing-zoom", cfg, &mut SnapshotRecorder::new()).unwrap();
    assert!(outcome.is_failed());
    assert_eq!(outcome.report().status, ReportStatus::Stalled);
    assert_eq!(outcome.report().elapsed_frames, 10);
}

#[test]
fn test_runtime_reports_timeline_failure() {
    let mut scene = Scene::default();
    let gone = scene.graph_mut().create_signal(1.0f32);
    scene.graph_mut().remove_signal(gone);
    scene
        .play(Directive::wait(0.1).then(Directive::set(gone, 2.0)))
        .unwrap();

    let mut probed = Vec::new();
    let summary = HeadlessRuntime::run(HeadlessRunConfig::default(), &mut scene, |ctx, _| {
        probed.push(ctx.frame_index);
        Ok(())
    })
    .unwrap();
    assert!(!summary.finished);
    assert!(summary.failure.is_some());
    assert_eq!(summary.frames, 6);
    assert_eq!(probed, (1..=6).collect::<Vec<_>>());

    let report = HeadlessReport::from_summary("inline", &summary, 0, probed.len());
    assert_eq!(report.status, ReportStatus::Failed);
}

struct RejectingSink;

impl FrameSink for RejectingSink {
    fn present(&mut self, frame: FrameSnapshot) -> Result<(), SceneError> {
        Err(SceneError::Sink {
            frame: frame.frame,
            message: "disk full".into(),
        })
    }
}

#[test]
fn test_sink_errors_abort_the_run() {
    let err = run_demo("dynamic-sine", sparse(), &mut RejectingSink).unwrap_err();
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn test_report_paths_are_sandboxed() {
    let report = HeadlessReport::from_summary(
        "x",
        &crate::HeadlessSummary {
            frames: 1,
            elapsed_ms: 17,
            finished: true,
            failure: None,
        },
        0,
        0,
    );
    assert!(report.write_to_path(Path::new("/tmp/report.json")).is_err());
    assert!(report.write_to_path(Path::new("../report.json")).is_err());

    let mut out = Vec::new();
    report.write_to_writer(&mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["status"], "passed");
    assert_eq!(json["elapsed_ms"], 17);
}
