use opencv::core;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub tracking: TrackingConfig,
    pub detection: DetectionConfig,
    pub video: VideoConfig,
    pub display: DisplayConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// Capacity of the recent-history ring used for the trail
    pub buffer_size: usize,
    /// Detections must have a strictly larger enclosing radius to enter the path
    pub min_radius: f32,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            buffer_size: 64,
            min_radius: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// HSV lower bound, OpenCV scale (H: 0-180, S/V: 0-255)
    pub hsv_lower: [u8; 3],
    pub hsv_upper: [u8; 3],
    pub blur_kernel: i32,
    pub erode_iterations: i32,
    pub dilate_iterations: i32,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            hsv_lower: [29, 86, 6],
            hsv_upper: [64, 255, 255],
            blur_kernel: 11,
            erode_iterations: 2,
            dilate_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Set from `--video`; `None` means the live camera
    pub input: Option<String>,
    /// Set from `--output`
    pub output: Option<String>,
    pub frame_width: i32,
    pub camera_index: i32,
    pub camera_warmup_ms: u64,
    pub output_fourcc: String,
    pub output_fps: f64,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            frame_width: 600,
            camera_index: 0,
            camera_warmup_ms: 2000,
            output_fourcc: "MJPG".to_string(),
            output_fps: 30.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub window_name: String,
    pub quit_key: char,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_name: "Frame".to_string(),
            quit_key: 'q',
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub title: String,
    pub width: i32,
    pub height: i32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            title: "Path of the Ball".to_string(),
            width: 800,
            height: 600,
        }
    }
}

/// Pixel coordinate of a tracked centroid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<Position> for core::Point {
    fn from(p: Position) -> Self {
        core::Point::new(p.x, p.y)
    }
}

/// One frame's candidate ball: moments centroid plus minimum enclosing circle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub centroid: Position,
    pub circle_center: (f32, f32),
    pub radius: f32,
}

impl Detection {
    pub fn new(centroid: Position, circle_center: (f32, f32), radius: f32) -> Self {
        Self {
            centroid,
            circle_center,
            radius,
        }
    }

    /// Detection whose enclosing circle is centered on the centroid.
    #[cfg(test)]
    pub fn at(x: i32, y: i32, radius: f32) -> Self {
        Self::new(Position::new(x, y), (x as f32, y as f32), radius)
    }
}
