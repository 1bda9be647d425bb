// src/pipeline/mod.rs

pub mod frame_context;
pub mod frame_pipeline;
pub mod metrics;
pub mod session;

pub use session::TrackingSession;
