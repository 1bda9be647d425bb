// src/pipeline/metrics.rs
//
// Per-run counters, summarised once the loop ends.

use super::frame_context::FrameContext;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct SessionMetrics {
    pub total_frames: u64,
    pub frames_with_detection: u64,
    pub qualifying_detections: u64,
    pub trail_segments_drawn: u64,
    pub started_at: Instant,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: 0,
            frames_with_detection: 0,
            qualifying_detections: 0,
            trail_segments_drawn: 0,
            started_at: Instant::now(),
        }
    }

    pub fn record(&mut self, ctx: &FrameContext) {
        self.total_frames += 1;
        if ctx.has_detection() {
            self.frames_with_detection += 1;
        }
        if ctx.qualifies {
            self.qualifying_detections += 1;
        }
        if !ctx.plan.is_empty() {
            self.trail_segments_drawn += ctx.plan.len() as u64;
        }
    }

    pub fn fps(&self) -> f64 {
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            self.total_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn detection_rate(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frames_with_detection as f64 / self.total_frames as f64
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames,
            frames_with_detection: self.frames_with_detection,
            qualifying_detections: self.qualifying_detections,
            trail_segments_drawn: self.trail_segments_drawn,
            detection_rate: self.detection_rate(),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_with_detection: u64,
    pub qualifying_detections: u64,
    pub trail_segments_drawn: u64,
    pub detection_rate: f64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
