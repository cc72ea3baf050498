use anyhow::Result;
use image::RgbImage;
use serde::{Deserialize, Serialize};
#[cfg(feature = "vision")]
use tracing::{debug, trace};
#[cfg(not(feature = "vision"))]
use tracing::warn;

use crate::config::CameraMotionConfig;
use crate::context::JobContext;
#[cfg(feature = "vision")]
use crate::flow::SparseFlow;
#[cfg(feature = "vision")]
use crate::progress::StageProgress;
use crate::tracks::Point;

/// Background displacement between a frame and the one before it, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MotionVector {
    pub dx: f32,
    pub dy: f32,
}

impl MotionVector {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    pub fn magnitude(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// Estimates per-frame camera pan from features on the frame's side strips
pub struct CameraMotionEstimator {
    config: CameraMotionConfig,
}

impl CameraMotionEstimator {
    pub fn new(config: CameraMotionConfig) -> Self {
        Self { config }
    }

    /// Picks the largest valid displacement; anything at or under the
    /// minimum motion threshold counts as a static camera.
    #[cfg_attr(not(feature = "vision"), allow(dead_code))]
    fn dominant_motion(&self, from: &[Point], to: &[Option<Point>]) -> MotionVector {
        let mut best = MotionVector::default();
        let mut best_magnitude = 0.0f32;
        for (old, new) in from.iter().zip(to) {
            let Some(new) = new else { continue };
            let candidate = MotionVector::new(new.x - old.x, new.y - old.y);
            let magnitude = candidate.magnitude();
            if magnitude > best_magnitude {
                best_magnitude = magnitude;
                best = candidate;
            }
        }

        if best_magnitude > self.config.min_motion_px {
            best
        } else {
            MotionVector::default()
        }
    }

    /// Returns one motion vector per frame; the first is always zero.
    ///
    /// Features are re-detected on every frame instead of being carried
    /// forward, and each vector describes only its own frame transition.
    #[cfg(feature = "vision")]
    pub fn estimate(&self, ctx: &mut JobContext, frames: &[RgbImage]) -> Result<Vec<MotionVector>> {
        let mut motion = vec![MotionVector::default(); frames.len()];
        let Some(first) = frames.first() else {
            return Ok(motion);
        };

        let flow = SparseFlow::new(&self.config)?;
        let mut progress = StageProgress::new(
            frames.len() as u64,
            ctx.fps(),
            "camera motion",
            ctx.config.show_progress,
        );
        progress.update_frame();

        let mut prev = SparseFlow::gray(first)?;
        ctx.motion_features = flow.detect(&prev)?;

        for (frame_index, frame) in frames.iter().enumerate().skip(1) {
            let current = SparseFlow::gray(frame)?;

            if ctx.motion_features.is_empty() {
                debug!(frame = frame_index, "no trackable features, assuming static camera");
            } else {
                let tracked = flow.track(&prev, &current, &ctx.motion_features)?;
                motion[frame_index] = self.dominant_motion(&ctx.motion_features, &tracked);
                trace!(
                    frame = frame_index,
                    features = ctx.motion_features.len(),
                    tracked = tracked.iter().flatten().count(),
                    dx = motion[frame_index].dx,
                    dy = motion[frame_index].dy,
                    "camera motion"
                );
            }

            ctx.motion_features = flow.detect(&current)?;
            prev = current;
            progress.update_frame();
        }

        let moving = motion.iter().filter(|m| !m.is_zero()).count();
        debug!(frames = frames.len(), moving, "camera motion estimated");
        progress.finish();
        Ok(motion)
    }

    /// Without OpenCV every frame reports a static camera.
    #[cfg(not(feature = "vision"))]
    pub fn estimate(&self, ctx: &mut JobContext, frames: &[RgbImage]) -> Result<Vec<MotionVector>> {
        if frames.len() > 1 {
            warn!("built without the `vision` feature, camera motion is zero for every frame");
        }
        ctx.motion_features.clear();
        Ok(vec![MotionVector::default(); frames.len()])
    }
}
