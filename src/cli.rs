// src/cli.rs

use clap::Parser;
use std::path::PathBuf;

/// Track a green ball in a camera feed or video file and plot its path
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ball-tracking",
    version,
    about,
    after_help = "Press the quit key (default 'q') or Ctrl-C to stop. A second Ctrl-C exits immediately, \
                  including while the path plot is open."
)]
pub struct Args {
    /// Path to the (optional) video file; the live camera is used otherwise
    #[arg(short, long)]
    pub video: Option<PathBuf>,

    /// Max buffer size of the tracked-points trail
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub buffer: Option<u32>,

    /// Path to the output video file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// YAML file with detection, video, display and plot settings
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}
