//! Tracking service integration: frames out, player positions in

pub mod capture;
pub mod client;

pub use capture::{FrameSource, TrackingTask};
pub use client::{TrackerClient, TrackerError};
