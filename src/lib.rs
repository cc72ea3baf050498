//! Turns tracked detections from a match video into per-player movement,
//! team and possession statistics.
//!
//! [`pipeline::AnalysisJob`] is the entry point: it takes decoded frames and
//! the tracker's detection records and runs camera motion estimation,
//! positioning, pitch projection, kinematics, team classification,
//! possession assignment and aggregation in that order.

pub mod cache;
pub mod camera_motion;
pub mod cli;
pub mod config;
pub mod context;
pub mod crop;
pub mod error;
pub mod feedback;
#[cfg(feature = "vision")]
pub mod flow;
pub mod frame_processor;
pub mod frames;
pub mod geometry;
pub mod interpolate;
pub mod kinematics;
pub mod kmeans;
pub mod pipeline;
pub mod pitch;
pub mod position;
pub mod possession;
pub mod progress;
pub mod stats;
pub mod team;
pub mod tracks;
pub mod windows;

pub use error::AnalysisError;
pub use pipeline::{AnalysisJob, AnalysisReport};
