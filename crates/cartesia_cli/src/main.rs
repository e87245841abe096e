//! Cartesia CLI
//!
//! Runs demo choreographies headlessly and reports on them:
//! - `cartesia run <demo>` plays a demo to completion and prints a JSON report
//! - `cartesia list` shows the available demos
//! - `cartesia config` prints the configuration a run would use

mod config;

use anyhow::{bail, Context, Result};
use cartesia_app::{demos, run_demo, HeadlessReport};
use cartesia_scene::{FrameSink, FrameSnapshot, SceneError};
use clap::{Parser, Subcommand};
use config::CartesiaConfig;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "cartesia_cli=info,cartesia_app=info";
const VERBOSE_FILTER: &str =
    "cartesia_cli=debug,cartesia_app=debug,cartesia_scene=debug,cartesia_animation=debug";

/// Headless runner for Cartesia coordinate-system animations
#[derive(Parser, Debug)]
#[command(name = "cartesia")]
#[command(about = "Headless runner for Cartesia coordinate-system animations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log debug output from every crate (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a demo to completion
    Run {
        /// Demo name, see `cartesia list`
        demo: String,

        /// Config file or directory containing cartesia.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Frame budget before the run counts as stalled
        #[arg(long)]
        frames: Option<u32>,

        /// Scene frame rate
        #[arg(long)]
        fps: Option<f64>,

        /// Sample every n-th frame
        #[arg(long)]
        probe_every: Option<u32>,

        /// Write the JSON report to this relative path
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// Write sampled frames as JSON lines to this file
        #[arg(long)]
        snapshots: Option<PathBuf>,
    },
    /// List available demos
    List,
    /// Print the effective configuration as TOML
    Config {
        /// Config file or directory containing cartesia.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Writes every presented frame as one JSON line.
struct JsonLinesSink {
    out: BufWriter<File>,
}

impl JsonLinesSink {
    fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    fn finish(mut self) -> Result<()> {
        self.out.flush().context("Failed to flush snapshots")
    }
}

impl FrameSink for JsonLinesSink {
    fn present(&mut self, frame: FrameSnapshot) -> Result<(), SceneError> {
        let index = frame.frame;
        let sink_error = |message: String| SceneError::Sink {
            frame: index,
            message,
        };
        serde_json::to_writer(&mut self.out, &frame).map_err(|err| sink_error(err.to_string()))?;
        self.out
            .write_all(b"\n")
            .map_err(|err| sink_error(err.to_string()))
    }
}

/// Drops frames when only the report is wanted.
struct Discard;

impl FrameSink for Discard {
    fn present(&mut self, _frame: FrameSnapshot) -> Result<(), SceneError> {
        Ok(())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Run {
            demo,
            config,
            frames,
            fps,
            probe_every,
            report,
            snapshots,
        } => {
            let file_config = CartesiaConfig::discover(config.as_deref())?;
            let mut run_config = file_config.run_config();
            if let Some(frames) = frames {
                run_config.max_frames = frames;
            }
            if let Some(fps) = fps {
                run_config.fps = fps;
            }
            if let Some(probe_every) = probe_every {
                run_config.probe_every_frames = probe_every;
            }
            let report_path = report.or(file_config.run.report);

            let outcome = match snapshots {
                Some(path) => {
                    let mut sink = JsonLinesSink::create(&path)?;
                    let outcome = run_demo(&demo, run_config, &mut sink)?;
                    sink.finish()?;
                    info!(path = %path.display(), "snapshots written");
                    outcome
                }
                None => run_demo(&demo, run_config, &mut Discard)?,
            };

            emit_report(outcome.report(), report_path.as_deref())?;
            if outcome.is_failed() {
                bail!(
                    "demo '{demo}' did not finish: {}",
                    outcome.report().message.as_deref().unwrap_or("unknown failure")
                );
            }
        }
        Command::List => {
            for demo in demos::DEMOS {
                println!("{:<16} {}", demo.name, demo.description);
            }
        }
        Command::Config { config } => {
            print!("{}", CartesiaConfig::discover(config.as_deref())?.to_toml()?);
        }
    }

    Ok(())
}

fn emit_report(report: &HeadlessReport, path: Option<&Path>) -> Result<()> {
    report.write_to_writer(&mut std::io::stdout().lock())?;
    if let Some(path) = path {
        report.write_to_path(path)?;
        info!(path = %path.display(), "report written");
    }
    Ok(())
}
