// src/pipeline/session.rs
//
// The frame loop and its teardown. The loop ends on end-of-stream, the quit
// key, an interrupt or a processing failure; in every case `shutdown` runs
// exactly once, in order: source, writer, windows, then the path plot.

use super::frame_pipeline::FramePipeline;
use super::metrics::{MetricsSummary, SessionMetrics};
use crate::display::Screen;
use crate::types::Config;
use crate::video_processor::{FrameSource, VideoSink};
use anyhow::Result;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndOfStream,
    QuitKey,
    Interrupted,
    Failed,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::EndOfStream => "no frame received",
            StopReason::QuitKey => "quit key pressed",
            StopReason::Interrupted => "interrupt received",
            StopReason::Failed => "processing failed",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SessionReport {
    pub reason: StopReason,
    pub path_points: usize,
    pub plotted: bool,
    pub metrics: MetricsSummary,
}

pub struct TrackingSession {
    source: Box<dyn FrameSource>,
    pipeline: FramePipeline,
    sink: VideoSink,
    screen: Box<dyn Screen>,
    stop: Arc<AtomicBool>,
    metrics: SessionMetrics,
}

impl TrackingSession {
    pub fn new(
        config: &Config,
        source: Box<dyn FrameSource>,
        sink: VideoSink,
        screen: Box<dyn Screen>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            pipeline: FramePipeline::new(config),
            sink,
            screen,
            stop,
            metrics: SessionMetrics::new(),
        }
    }

    /// Run until the stream stops, then release everything and plot.
    pub fn run(mut self) -> SessionReport {
        info!(
            "Tracking from {} (trail buffer {})",
            self.source.describe(),
            self.pipeline.tracker().capacity()
        );

        let reason = match self.process_stream() {
            Ok(reason) => reason,
            Err(e) => {
                error!("Frame loop failed: {:#}", e);
                StopReason::Failed
            }
        };
        info!("Ending loop: {}", reason);

        self.shutdown(reason)
    }

    fn process_stream(&mut self) -> Result<StopReason> {
        loop {
            if self.stop.load(Ordering::SeqCst) {
                return Ok(StopReason::Interrupted);
            }

            let Some(raw) = self.source.next_frame()? else {
                return Ok(StopReason::EndOfStream);
            };

            let ctx = self.pipeline.process(&raw)?;
            self.metrics.record(&ctx);
            if ctx.frame_id % 300 == 0 {
                info!("Processed {} frames", ctx.frame_id);
            }

            self.sink.write(&ctx.frame)?;

            if self.screen.show(&ctx.frame)? {
                return Ok(StopReason::QuitKey);
            }
        }
    }

    fn shutdown(self, reason: StopReason) -> SessionReport {
        let TrackingSession {
            mut source,
            pipeline,
            mut sink,
            mut screen,
            metrics,
            ..
        } = self;

        if let Err(e) = source.release() {
            warn!("Failed to release frame source: {:#}", e);
        }
        if sink.is_open() {
            let written = sink.frames_written();
            match sink.release() {
                Ok(_) => info!("Output video closed after {} frames", written),
                Err(e) => warn!("Failed to release video writer: {:#}", e),
            }
        }
        if let Err(e) = screen.close() {
            warn!("Failed to close windows: {:#}", e);
        }

        let summary = metrics.summary();
        info!("Frames processed: {}", summary.total_frames);
        info!(
            "Frames with detection: {} ({:.1}%)",
            summary.frames_with_detection,
            summary.detection_rate * 100.0
        );
        info!("Path points recorded: {}", summary.qualifying_detections);
        info!("Processing speed: {:.1} FPS", summary.fps);
        if let Ok(json) = serde_json::to_string(&summary) {
            debug!("Run summary: {}", json);
        }

        let path = pipeline.into_path();
        let plotted = if path.is_empty() {
            info!("No path recorded, skipping plot");
            false
        } else {
            match screen.show_plot(&path) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to plot path: {:#}", e);
                    false
                }
            }
        };

        SessionReport {
            reason,
            path_points: path.len(),
            plotted,
            metrics: summary,
        }
    }
}
