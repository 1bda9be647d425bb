// src/pipeline/frame_context.rs
//
// Everything produced for one frame. The overlay, writer and display all
// read from this instead of re-deriving state.

use crate::trail_tracker::DrawPlan;
use crate::types::Detection;
use opencv::core::Mat;

pub struct FrameContext {
    pub frame_id: u64,
    /// Resized and annotated frame
    pub frame: Mat,
    pub detection: Option<Detection>,
    /// Detection entered the path this frame
    pub qualifies: bool,
    pub plan: DrawPlan,
}

impl FrameContext {
    pub fn has_detection(&self) -> bool {
        self.detection.is_some()
    }
}
