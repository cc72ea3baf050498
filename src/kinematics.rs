use tracing::debug;

use crate::config::KinematicsConfig;
use crate::context::JobContext;
use crate::error::AnalysisError;
use crate::progress::StageProgress;
use crate::tracks::{ObjectClass, TrackTable};

const MPS_TO_KMH: f32 = 3.6;

/// Windowed speed and cumulative distance per track.
///
/// Frames are cut into windows of `window_frames`; a window runs from its
/// first frame to the first frame of the next window (or the last frame of
/// the clip). Tracks present at both ends get one distance/speed sample,
/// written to every frame of the window where the track exists. Units follow
/// the positions: meters when the pitch is calibrated, pixels otherwise, and
/// the speed is always scaled by 3.6 as if the input were m/s.
pub struct KinematicsEstimator {
    config: KinematicsConfig,
}

impl KinematicsEstimator {
    pub fn new(config: KinematicsConfig) -> Self {
        Self { config }
    }

    pub fn apply(&self, ctx: &mut JobContext, tracks: &mut TrackTable) -> Result<(), AnalysisError> {
        let window = self.config.window_frames;
        if window == 0 {
            return Err(AnalysisError::InvalidWindow);
        }
        if tracks.is_empty() {
            return Ok(());
        }

        let fps = ctx.fps() as f32;
        let calibrated = ctx.config.pitch.vertices.is_some();
        let last_frame_index = tracks.len() - 1;
        let mut progress = StageProgress::new(tracks.len() as u64, ctx.fps(), "kinematics", ctx.config.show_progress);

        for class in [ObjectClass::Player, ObjectClass::Referee, ObjectClass::Ball] {
            if !class.has_kinematics() {
                continue;
            }

            for start in (0..tracks.len()).step_by(window) {
                let end = (start + window).min(last_frame_index);
                let elapsed = (end - start) as f32 / fps;

                let ids: Vec<_> = tracks.frames[start].of(class).keys().copied().collect();
                for id in ids {
                    let start_pos = tracks.get(start, class, id).and_then(|s| s.field_position(calibrated));
                    let end_pos = tracks.get(end, class, id).and_then(|s| s.field_position(calibrated));
                    let (Some(start_pos), Some(end_pos)) = (start_pos, end_pos) else {
                        continue;
                    };

                    let distance = start_pos.distance_to(&end_pos);
                    let speed = if elapsed > 0.0 { distance / elapsed } else { 0.0 };
                    let speed_kmh = speed * MPS_TO_KMH;

                    let total = ctx.distances.entry((class, id)).or_insert(0.0);
                    *total += distance;
                    let total = *total;

                    for frame in &mut tracks.frames[start..=end] {
                        if let Some(state) = frame.of_mut(class).get_mut(&id) {
                            state.speed_kmh = Some(speed_kmh);
                            state.distance = Some(total);
                        }
                    }
                }

                if class == ObjectClass::Player {
                    for _ in start..(start + window).min(tracks.len()) {
                        progress.update_frame();
                    }
                }
            }
        }

        debug!(tracks = ctx.distances.len(), window, "kinematics estimated");
        progress.finish();
        Ok(())
    }
}
