use std::collections::HashMap;

use crate::config::AnalysisConfig;
use crate::possession::PossessionRecord;
use crate::team::TeamAssignment;
use crate::tracks::{ObjectClass, Point, TrackId};

/// Mutable state owned by exactly one analysis job.
///
/// Created when the job starts and dropped when it ends; every stage gets it
/// passed in explicitly, so concurrent jobs never share anything.
#[derive(Debug)]
pub struct JobContext {
    pub config: AnalysisConfig,
    /// Team memo and frozen team colors, written only by the team classifier
    pub teams: TeamAssignment,
    /// Running distance per track, written only by the kinematics estimator
    pub distances: HashMap<(ObjectClass, TrackId), f32>,
    /// Features of the previous frame, written only by the camera motion estimator
    pub motion_features: Vec<Point>,
    /// Per-frame ball assignment, written only by the possession assigner
    pub possession: PossessionRecord,
}

impl JobContext {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            teams: TeamAssignment::default(),
            distances: HashMap::new(),
            motion_features: Vec::new(),
            possession: PossessionRecord::default(),
        }
    }

    pub fn fps(&self) -> f64 {
        self.config.fps
    }
}
