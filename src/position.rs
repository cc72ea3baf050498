use anyhow::Result;

use crate::camera_motion::MotionVector;
use crate::context::JobContext;
use crate::frame_processor::FrameProcessor;
use crate::tracks::FrameTracks;

/// Fills `adjusted_bbox` and the anchor `position` of every track.
///
/// Each frame is corrected by its own motion vector only; vectors are not
/// summed across frames.
pub struct PositionResolver<'a> {
    motion: &'a [MotionVector],
}

impl<'a> PositionResolver<'a> {
    pub fn new(motion: &'a [MotionVector]) -> Self {
        Self { motion }
    }
}

impl FrameProcessor for PositionResolver<'_> {
    fn stage_name(&self) -> &'static str {
        "positions"
    }

    fn process_frame(
        &mut self,
        _ctx: &mut JobContext,
        frame_index: usize,
        frame: &mut FrameTracks,
    ) -> Result<()> {
        let motion = self.motion.get(frame_index).copied().unwrap_or_default();
        for (class, _, state) in frame.iter_mut() {
            let adjusted = state.bbox.shifted_back(motion.dx, motion.dy);
            state.adjusted_bbox = Some(adjusted);
            state.position = Some(class.anchor(&adjusted));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::tracks::{BBox, Detection, ObjectClass, Point, TrackTable, BALL_TRACK_ID};

    #[test]
    fn test_positions_use_per_frame_motion() {
        let detections = vec![
            Detection {
                frame_index: 0,
                track_id: 3,
                class: ObjectClass::Player,
                bbox: [100.0, 50.0, 120.0, 110.0],
            },
            Detection {
                frame_index: 1,
                track_id: 3,
                class: ObjectClass::Player,
                bbox: [100.0, 50.0, 120.0, 110.0],
            },
            Detection {
                frame_index: 1,
                track_id: 1,
                class: ObjectClass::Ball,
                bbox: [200.0, 100.0, 210.0, 110.0],
            },
        ];
        let mut tracks = TrackTable::from_detections(2, &detections);
        let motion = vec![MotionVector::default(), MotionVector::new(10.0, -4.0)];
        let mut ctx = JobContext::new(AnalysisConfig {
            show_progress: false,
            ..AnalysisConfig::default()
        });

        PositionResolver::new(&motion)
            .process_frames(&mut ctx, &mut tracks)
            .unwrap();

        let first = tracks.get(0, ObjectClass::Player, 3).unwrap();
        assert_eq!(first.position, Some(Point::new(110.0, 110.0)));

        let second = tracks.get(1, ObjectClass::Player, 3).unwrap();
        assert_eq!(second.adjusted_bbox, Some(BBox::new(90.0, 54.0, 110.0, 114.0)));
        assert_eq!(second.position, Some(Point::new(100.0, 114.0)));

        let ball = tracks.get(1, ObjectClass::Ball, BALL_TRACK_ID).unwrap();
        assert_eq!(ball.position, Some(Point::new(195.0, 109.0)));
    }
}
