// src/ball_detection.rs
//
// HSV color segmentation for a single ball. The largest external contour of
// the cleaned mask is the candidate; its moments centroid is the tracked
// position and its minimum enclosing circle gives the size estimate.

use crate::types::{Detection, DetectionConfig, Position};
use anyhow::{Context, Result};
use opencv::{
    core::{self, Mat, Point, Point2f, Vector},
    imgproc,
    prelude::*,
};
use tracing::debug;

pub struct BallDetector {
    lower: core::Scalar,
    upper: core::Scalar,
    blur_kernel: core::Size,
    erode_iterations: i32,
    dilate_iterations: i32,
}

impl BallDetector {
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            lower: hsv_scalar(config.hsv_lower),
            upper: hsv_scalar(config.hsv_upper),
            blur_kernel: core::Size::new(config.blur_kernel, config.blur_kernel),
            erode_iterations: config.erode_iterations,
            dilate_iterations: config.dilate_iterations,
        }
    }

    /// Find the ball in a BGR frame. `None` when nothing in range survives
    /// the mask cleanup or the largest blob is degenerate.
    pub fn detect(&self, frame: &Mat) -> Result<Option<Detection>> {
        let mask = self.mask(frame)?;

        let mut contours = Vector::<Vector<Point>>::new();
        imgproc::find_contours(
            &mask,
            &mut contours,
            imgproc::RETR_EXTERNAL,
            imgproc::CHAIN_APPROX_SIMPLE,
            Point::new(0, 0),
        )
        .context("finding contours")?;

        locate_ball(&contours)
    }

    /// Binary in-range mask after blur and erode/dilate cleanup.
    pub fn mask(&self, frame: &Mat) -> Result<Mat> {
        let mut blurred = Mat::default();
        imgproc::gaussian_blur(
            frame,
            &mut blurred,
            self.blur_kernel,
            0.0,
            0.0,
            core::BORDER_DEFAULT,
        )?;

        let mut hsv = Mat::default();
        imgproc::cvt_color(&blurred, &mut hsv, imgproc::COLOR_BGR2HSV, 0)?;

        let mut mask = Mat::default();
        core::in_range(&hsv, &self.lower, &self.upper, &mut mask)?;

        // Empty kernel = 3x3 rectangle
        let kernel = Mat::default();

        let mut eroded = Mat::default();
        imgproc::erode(
            &mask,
            &mut eroded,
            &kernel,
            Point::new(-1, -1),
            self.erode_iterations,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        let mut dilated = Mat::default();
        imgproc::dilate(
            &eroded,
            &mut dilated,
            &kernel,
            Point::new(-1, -1),
            self.dilate_iterations,
            core::BORDER_CONSTANT,
            imgproc::morphology_default_border_value()?,
        )?;

        Ok(dilated)
    }
}

/// Pick the largest-area contour (first wins on ties) and measure it.
pub fn locate_ball(contours: &Vector<Vector<Point>>) -> Result<Option<Detection>> {
    let mut largest: Option<(f64, Vector<Point>)> = None;

    for contour in contours.iter() {
        let area = imgproc::contour_area(&contour, false)?;
        if largest.as_ref().map_or(true, |(max_area, _)| area > *max_area) {
            largest = Some((area, contour));
        }
    }

    let Some((area, contour)) = largest else {
        return Ok(None);
    };

    let moments = imgproc::moments(&contour, false)?;
    let Some(centroid) = centroid(&moments) else {
        debug!(
            "Largest contour is degenerate ({} points, area {:.1}), ignoring",
            contour.len(),
            area
        );
        return Ok(None);
    };

    let mut center = Point2f::default();
    let mut radius = 0.0f32;
    imgproc::min_enclosing_circle(&contour, &mut center, &mut radius)?;

    debug!(
        "Ball candidate: centroid=({}, {}) circle=({:.1}, {:.1}) r={:.1} area={:.0}",
        centroid.x, centroid.y, center.x, center.y, radius, area
    );

    Ok(Some(Detection::new(centroid, (center.x, center.y), radius)))
}

/// Centroid from image moments, truncated toward zero. `None` for zero area.
pub fn centroid(moments: &core::Moments) -> Option<Position> {
    if moments.m00.abs() < f64::EPSILON {
        return None;
    }
    Some(Position::new(
        (moments.m10 / moments.m00) as i32,
        (moments.m01 / moments.m00) as i32,
    ))
}

fn hsv_scalar(hsv: [u8; 3]) -> core::Scalar {
    core::Scalar::new(hsv[0] as f64, hsv[1] as f64, hsv[2] as f64, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_frame(rows: i32, cols: i32, bgr: (f64, f64, f64)) -> Mat {
        Mat::new_rows_cols_with_default(
            rows,
            cols,
            core::CV_8UC3,
            core::Scalar::new(bgr.0, bgr.1, bgr.2, 0.0),
        )
        .unwrap()
    }

    fn contour(points: &[(i32, i32)]) -> Vector<Point> {
        Vector::from_iter(points.iter().map(|&(x, y)| Point::new(x, y)))
    }

    #[test]
    fn test_detects_green_disc() {
        let mut frame = blank_frame(300, 400, (0.0, 0.0, 0.0));
        imgproc::circle(
            &mut frame,
            Point::new(200, 150),
            40,
            core::Scalar::new(0.0, 255.0, 0.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();

        let detector = BallDetector::new(&DetectionConfig::default());
        let detection = detector.detect(&frame).unwrap().expect("ball should be found");

        assert!((detection.centroid.x - 200).abs() <= 2);
        assert!((detection.centroid.y - 150).abs() <= 2);
        // Blur halo widens the mask by a few pixels
        assert!(detection.radius >= 38.0 && detection.radius <= 47.0);
        assert!((detection.circle_center.0 - 200.0).abs() < 3.0);
    }

    #[test]
    fn test_off_color_frame_is_absent() {
        let mut frame = blank_frame(200, 200, (0.0, 0.0, 0.0));
        imgproc::circle(
            &mut frame,
            Point::new(100, 100),
            30,
            core::Scalar::new(255.0, 0.0, 0.0, 0.0),
            -1,
            imgproc::LINE_8,
            0,
        )
        .unwrap();

        let detector = BallDetector::new(&DetectionConfig::default());
        assert!(detector.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_empty_mask_is_absent() {
        let frame = blank_frame(120, 160, (0.0, 0.0, 0.0));
        let detector = BallDetector::new(&DetectionConfig::default());
        let mask = detector.mask(&frame).unwrap();
        assert_eq!(core::count_non_zero(&mask).unwrap(), 0);
        assert!(detector.detect(&frame).unwrap().is_none());
    }

    #[test]
    fn test_picks_largest_contour() {
        let mut contours = Vector::<Vector<Point>>::new();
        contours.push(contour(&[(0, 0), (10, 0), (10, 10), (0, 10)]));
        contours.push(contour(&[(50, 50), (80, 50), (80, 80), (50, 80)]));

        let detection = locate_ball(&contours).unwrap().unwrap();
        assert_eq!(detection.centroid, Position::new(65, 65));
        assert!(detection.radius > 20.0);
    }

    #[test]
    fn test_zero_area_contour_is_absent() {
        let mut contours = Vector::<Vector<Point>>::new();
        contours.push(contour(&[(10, 10), (20, 10), (30, 10)]));
        assert!(locate_ball(&contours).unwrap().is_none());
    }

    #[test]
    fn test_no_contours_is_absent() {
        let contours = Vector::<Vector<Point>>::new();
        assert!(locate_ball(&contours).unwrap().is_none());
    }

    #[test]
    fn test_centroid_guards_division() {
        let line = contour(&[(0, 0), (5, 5), (10, 10)]);
        let moments = imgproc::moments(&line, false).unwrap();
        assert!(centroid(&moments).is_none());

        // Centroid (5/3, 5/3) and (-5/3, -5/3): truncated toward zero
        let triangle = contour(&[(0, 0), (5, 0), (0, 5)]);
        let moments = imgproc::moments(&triangle, false).unwrap();
        assert_eq!(centroid(&moments), Some(Position::new(1, 1)));

        let triangle = contour(&[(0, 0), (0, -5), (-5, 0)]);
        let moments = imgproc::moments(&triangle, false).unwrap();
        assert_eq!(centroid(&moments), Some(Position::new(-1, -1)));
    }
}
