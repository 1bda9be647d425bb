// src/trail_tracker.rs
//
// Per-frame trail state. Keeps a bounded most-recent-first history of
// centroids (absent frames included) for the tapering overlay, and an
// unbounded path of qualifying centroids for the end-of-run plot.

use crate::types::{Detection, Position};
use std::collections::VecDeque;
use tracing::debug;

/// One trail line between two consecutive history entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    pub from: Position,
    pub to: Position,
    pub thickness: i32,
}

/// Segments to draw for a single frame, newest pair first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawPlan {
    pub segments: Vec<Segment>,
}

impl DrawPlan {
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

pub struct TrailTracker {
    history: VecDeque<Option<Position>>,
    path: Vec<Position>,
    capacity: usize,
    min_radius: f32,
}

impl TrailTracker {
    pub fn new(capacity: usize, min_radius: f32) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            path: Vec::new(),
            capacity,
            min_radius,
        }
    }

    /// Record this frame's detection and return the trail to draw.
    ///
    /// The centroid (or `None`) always enters the history; it only enters
    /// the path when the enclosing radius is above `min_radius`.
    pub fn accept_detection(&mut self, detection: Option<&Detection>) -> DrawPlan {
        if let Some(d) = detection {
            if self.qualifies(d) {
                self.path.push(d.centroid);
            } else {
                debug!(
                    "Detection at ({}, {}) below radius threshold: {:.1} <= {:.1}",
                    d.centroid.x, d.centroid.y, d.radius, self.min_radius
                );
            }
        }

        if self.history.len() >= self.capacity {
            self.history.pop_back();
        }
        if self.capacity > 0 {
            self.history.push_front(detection.map(|d| d.centroid));
        }

        self.draw_plan()
    }

    pub fn qualifies(&self, detection: &Detection) -> bool {
        detection.radius > self.min_radius
    }

    fn draw_plan(&self) -> DrawPlan {
        let segments = (1..self.history.len())
            .filter_map(|i| match (self.history[i - 1], self.history[i]) {
                (Some(from), Some(to)) => Some(Segment {
                    from,
                    to,
                    thickness: trail_thickness(self.capacity, i),
                }),
                _ => None,
            })
            .collect();

        DrawPlan { segments }
    }

    /// Most-recent-first.
    pub fn recent_history(&self) -> &VecDeque<Option<Position>> {
        &self.history
    }

    pub fn path(&self) -> &[Position] {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn into_path(self) -> Vec<Position> {
        self.path
    }
}

/// Line thickness for the pair ending at history index `index` (1-based).
pub fn trail_thickness(capacity: usize, index: usize) -> i32 {
    ((capacity as f64 / (index + 1) as f64).sqrt() * 2.5).floor() as i32
}
