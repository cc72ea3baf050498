use std::time::Instant;

use anyhow::Result;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cache;
use crate::camera_motion::{CameraMotionEstimator, MotionVector};
use crate::config::AnalysisConfig;
use crate::context::JobContext;
use crate::error::AnalysisError;
use crate::frame_processor::FrameProcessor;
use crate::interpolate::interpolate_ball;
use crate::kinematics::KinematicsEstimator;
use crate::pitch::PitchProjector;
use crate::position::PositionResolver;
use crate::possession::{PossessionAssigner, PossessionRecord};
use crate::stats::{MatchSummary, PlayerSummary, StatsAggregator};
use crate::team::TeamClassifier;
use crate::tracks::{Detection, TrackTable};

/// Fully annotated tracks together with the possession record built over them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedTracks {
    pub tracks: TrackTable,
    pub possession: PossessionRecord,
}

/// Output of one analysis job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub match_summary: MatchSummary,
    pub players: Vec<PlayerSummary>,
    pub motion: Vec<MotionVector>,
    #[serde(skip)]
    pub annotated: AnnotatedTracks,
}

/// One self-contained analysis run. All mutable state lives in a
/// [`JobContext`] created by [`AnalysisJob::run`] and dropped when it returns.
pub struct AnalysisJob {
    config: AnalysisConfig,
}

impl AnalysisJob {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Rejects inputs no stage can work with, before anything runs
    fn validate(&self, frames: &[RgbImage]) -> Result<PitchProjector, AnalysisError> {
        let Some(first) = frames.first() else {
            return Err(AnalysisError::EmptyInput);
        };
        if !(self.config.fps.is_finite() && self.config.fps > 0.0) {
            return Err(AnalysisError::InvalidFrameRate(self.config.fps));
        }
        if self.config.kinematics.window_frames == 0 {
            return Err(AnalysisError::InvalidWindow);
        }

        let (width, height) = first.dimensions();
        for (index, frame) in frames.iter().enumerate() {
            let (actual_width, actual_height) = frame.dimensions();
            if (actual_width, actual_height) != (width, height) {
                return Err(AnalysisError::FrameSizeMismatch {
                    index,
                    width,
                    height,
                    actual_width,
                    actual_height,
                });
            }
        }

        PitchProjector::new(&self.config.pitch)
    }

    pub fn run(&self, frames: &[RgbImage], detections: &[Detection]) -> Result<AnalysisReport> {
        let projector = self.validate(frames)?;
        let calibrated = projector.is_calibrated();
        let started = Instant::now();
        let mut ctx = JobContext::new(self.config.clone());
        info!(
            frames = frames.len(),
            detections = detections.len(),
            fps = self.config.fps,
            calibrated,
            "analysis started"
        );

        let motion = cache::load_or_compute(self.config.motion_cache.as_deref(), || {
            CameraMotionEstimator::new(self.config.camera.clone()).estimate(&mut ctx, frames)
        })?;

        let annotated = cache::load_or_compute(self.config.tracks_cache.as_deref(), || {
            self.annotate(&mut ctx, frames, detections, &motion, projector)
        })?;

        let (match_summary, players) = StatsAggregator::new(self.config.stats.clone(), self.config.fps)
            .calibrated(calibrated)
            .aggregate(&annotated.tracks, &annotated.possession);

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            players = players.len(),
            "analysis finished"
        );
        Ok(AnalysisReport {
            match_summary,
            players,
            motion,
            annotated,
        })
    }

    /// Runs every per-frame stage over the detections, in dependency order
    fn annotate(
        &self,
        ctx: &mut JobContext,
        frames: &[RgbImage],
        detections: &[Detection],
        motion: &[MotionVector],
        mut projector: PitchProjector,
    ) -> Result<AnnotatedTracks> {
        let mut tracks = TrackTable::from_detections(frames.len(), detections);
        if self.config.interpolate_ball {
            interpolate_ball(&mut tracks);
        }

        PositionResolver::new(motion).process_frames(ctx, &mut tracks)?;
        projector.process_frames(ctx, &mut tracks)?;
        KinematicsEstimator::new(self.config.kinematics.clone()).apply(ctx, &mut tracks)?;

        let mut teams = TeamClassifier::new(frames);
        teams.bootstrap(ctx, &tracks);
        teams.process_frames(ctx, &mut tracks)?;

        PossessionAssigner::new(self.config.possession.clone()).process_frames(ctx, &mut tracks)?;

        Ok(AnnotatedTracks {
            tracks,
            possession: std::mem::take(&mut ctx.possession),
        })
    }
}
