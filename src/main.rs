// src/main.rs

mod ball_detection;
mod cli;
mod config;
mod display;
mod path_plot;
mod pipeline;
mod preprocessing;
mod trail_overlay;
mod trail_tracker;
mod types;
mod video_processor;

use anyhow::Result;
use clap::Parser;
use display::DisplayWindow;
use pipeline::TrackingSession;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use types::Config;
use video_processor::{OutputSpec, VideoSink};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ball_tracking=info")),
        )
        .init();

    let args = cli::Args::parse();
    let config = Config::resolve(&args)?;

    info!("🎾 Ball tracking starting");
    info!(
        "Detection: HSV {:?}..{:?}, min radius {:.1}, trail buffer {}",
        config.detection.hsv_lower,
        config.detection.hsv_upper,
        config.tracking.min_radius,
        config.tracking.buffer_size
    );

    let stop = Arc::new(AtomicBool::new(false));
    let flag = stop.clone();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if raise_stop(&flag) {
                warn!("Second interrupt, exiting immediately");
                std::process::exit(130);
            }
            info!("Interrupt caught, stopping after the current frame (Ctrl-C again to force quit)...");
        }
    });

    let source = match video_processor::open_source(&config.video) {
        Ok(source) => source,
        Err(e) => {
            error!("Cannot open video source: {:#}", e);
            return Ok(());
        }
    };

    let sink = VideoSink::new(OutputSpec::from_config(&config.video)?);
    let screen = DisplayWindow::new(&config.display, &config.plot);

    let session = TrackingSession::new(&config, source, sink, Box::new(screen), stop);
    let report = session.run();

    info!(
        "✓ Done ({}): {} frames, {} path points, plot {}",
        report.reason,
        report.metrics.total_frames,
        report.path_points,
        if report.plotted { "shown" } else { "skipped" }
    );

    Ok(())
}

/// Raise the stop flag; `true` when it was already raised by an earlier interrupt.
fn raise_stop(flag: &AtomicBool) -> bool {
    flag.swap(true, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_interrupt_forces_exit() {
        let flag = AtomicBool::new(false);
        assert!(!raise_stop(&flag));
        assert!(flag.load(Ordering::SeqCst));
        assert!(raise_stop(&flag));
    }
}
