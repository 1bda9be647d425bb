// src/trail_overlay.rs

use crate::trail_tracker::DrawPlan;
use crate::types::Detection;
use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
};

/// Colors used for the overlay (BGR format for OpenCV).
pub mod colors {
    use opencv::core::Scalar;

    pub const CIRCLE_YELLOW: Scalar = Scalar::new(0.0, 255.0, 255.0, 0.0);
    pub const CENTROID_RED: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
    pub const TRAIL_RED: Scalar = Scalar::new(0.0, 0.0, 255.0, 0.0);
}

const CENTROID_DOT_RADIUS: i32 = 5;

/// Draw the enclosing circle and centroid for a qualifying detection, then
/// the trail segments.
pub fn draw_overlay(
    frame: &mut Mat,
    detection: Option<&Detection>,
    qualifies: bool,
    plan: &DrawPlan,
) -> Result<()> {
    if let Some(d) = detection.filter(|_| qualifies) {
        imgproc::circle(
            frame,
            core::Point::new(d.circle_center.0 as i32, d.circle_center.1 as i32),
            d.radius as i32,
            colors::CIRCLE_YELLOW,
            2,
            imgproc::LINE_8,
            0,
        )?;
        imgproc::circle(
            frame,
            d.centroid.into(),
            CENTROID_DOT_RADIUS,
            colors::CENTROID_RED,
            -1,
            imgproc::LINE_8,
            0,
        )?;
    }

    for segment in &plan.segments {
        imgproc::line(
            frame,
            segment.from.into(),
            segment.to.into(),
            colors::TRAIL_RED,
            segment.thickness,
            imgproc::LINE_8,
            0,
        )?;
    }

    Ok(())
}
