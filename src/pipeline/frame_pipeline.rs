// src/pipeline/frame_pipeline.rs

use super::frame_context::FrameContext;
use crate::ball_detection::BallDetector;
use crate::preprocessing::resize_to_width;
use crate::trail_overlay::draw_overlay;
use crate::trail_tracker::TrailTracker;
use crate::types::{Config, Position};
use anyhow::{Context, Result};
use opencv::core::Mat;
use tracing::debug;

/// Resize → detect → track → annotate, one frame at a time.
pub struct FramePipeline {
    detector: BallDetector,
    tracker: TrailTracker,
    frame_width: i32,
    frame_count: u64,
}

impl FramePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            detector: BallDetector::new(&config.detection),
            tracker: TrailTracker::new(config.tracking.buffer_size, config.tracking.min_radius),
            frame_width: config.video.frame_width,
            frame_count: 0,
        }
    }

    pub fn process(&mut self, raw: &Mat) -> Result<FrameContext> {
        self.frame_count += 1;

        let mut frame = resize_to_width(raw, self.frame_width).context("resizing frame")?;
        let detection = self.detector.detect(&frame).context("detecting ball")?;
        let qualifies = detection.as_ref().is_some_and(|d| self.tracker.qualifies(d));
        let plan = self.tracker.accept_detection(detection.as_ref());

        draw_overlay(&mut frame, detection.as_ref(), qualifies, &plan)
            .context("drawing overlay")?;

        debug!(
            "Frame {}: detection={} qualifies={} segments={} history={} path={}",
            self.frame_count,
            detection.is_some(),
            qualifies,
            plan.len(),
            self.tracker.recent_history().len(),
            self.tracker.path().len()
        );

        Ok(FrameContext {
            frame_id: self.frame_count,
            frame,
            detection,
            qualifies,
            plan,
        })
    }

    pub fn tracker(&self) -> &TrailTracker {
        &self.tracker
    }

    pub fn into_path(self) -> Vec<Position> {
        self.tracker.into_path()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::{
        core::{self, Point, Scalar},
        imgproc,
        prelude::*,
    };

    fn frame_with_ball(center: Option<(i32, i32)>, radius: i32) -> Mat {
        let mut frame =
            Mat::new_rows_cols_with_default(480, 640, core::CV_8UC3, Scalar::all(0.0)).unwrap();
        if let Some((x, y)) = center {
            imgproc::circle(
                &mut frame,
                Point::new(x, y),
                radius,
                Scalar::new(0.0, 255.0, 0.0, 0.0),
                -1,
                imgproc::LINE_8,
                0,
            )
            .unwrap();
        }
        frame
    }

    #[test]
    fn test_pipeline_tracks_moving_ball() {
        let mut config = Config::default();
        config.tracking.buffer_size = 8;
        let mut pipeline = FramePipeline::new(&config);

        let centers = [Some((160, 240)), Some((240, 240)), None, Some((400, 240))];
        let mut last = None;
        for center in centers {
            last = Some(pipeline.process(&frame_with_ball(center, 48)).unwrap());
        }
        let last = last.unwrap();

        // 640x480 scaled to 600x450
        assert_eq!(last.frame.cols(), 600);
        assert_eq!(last.frame.rows(), 450);
        assert_eq!(last.frame_id, 4);
        assert!(last.qualifies);

        let history = pipeline.tracker().recent_history();
        assert_eq!(history.len(), 4);
        assert!(history[1].is_none());

        let path = pipeline.into_path();
        assert_eq!(path.len(), 3);
        let expected_x = [150, 225, 375];
        for (p, x) in path.iter().zip(expected_x) {
            assert!((p.x - x).abs() <= 3, "x {} vs {}", p.x, x);
            assert!((p.y - 225).abs() <= 3, "y {}", p.y);
        }
    }

    #[test]
    fn test_small_blob_stays_out_of_path() {
        let mut pipeline = FramePipeline::new(&Config::default());
        // Well under the 10 px threshold even with the blur halo
        let ctx = pipeline.process(&frame_with_ball(Some((320, 240)), 4)).unwrap();

        assert!(ctx.has_detection());
        assert!(!ctx.qualifies);
        assert_eq!(pipeline.tracker().recent_history().len(), 1);
        assert!(pipeline.tracker().path().is_empty());
    }
}
