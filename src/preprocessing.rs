// src/preprocessing.rs

use anyhow::Result;
use opencv::{
    core::{self, Mat},
    imgproc,
    prelude::*,
};

/// Target size for scaling a `width`×`height` frame to `target_width`,
/// keeping the aspect ratio (height truncated like an integer cast).
pub fn scaled_size(width: i32, height: i32, target_width: i32) -> core::Size {
    let ratio = target_width as f64 / width as f64;
    core::Size::new(target_width, ((height as f64 * ratio) as i32).max(1))
}

/// Resize a frame to a fixed width, preserving aspect ratio
pub fn resize_to_width(frame: &Mat, target_width: i32) -> Result<Mat> {
    if frame.cols() == target_width {
        return Ok(frame.try_clone()?);
    }

    let size = scaled_size(frame.cols(), frame.rows(), target_width);
    let mut resized = Mat::default();
    imgproc::resize(frame, &mut resized, size, 0.0, 0.0, imgproc::INTER_AREA)?;
    Ok(resized)
}
