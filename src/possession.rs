use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::PossessionConfig;
use crate::context::JobContext;
use crate::frame_processor::FrameProcessor;
use crate::geometry::foot_distance;
use crate::team::DEFAULT_TEAM;
use crate::tracks::{FrameTracks, TeamId, TrackId};

/// Who had the ball in every frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PossessionRecord {
    /// Player assigned the ball, if any player was close enough
    pub assigned: Vec<Option<TrackId>>,
    /// Team in control; frames without an assignment repeat the previous frame
    pub team_control: Vec<TeamId>,
}

impl PossessionRecord {
    /// Number of frames where some player was assigned the ball
    pub fn possession_frames(&self) -> usize {
        self.assigned.iter().filter(|a| a.is_some()).count()
    }

    /// Percentage of frames controlled by `team`
    pub fn team_share(&self, team: TeamId) -> f64 {
        if self.team_control.is_empty() {
            return 0.0;
        }
        let frames = self.team_control.iter().filter(|&&t| t == team).count();
        frames as f64 / self.team_control.len() as f64 * 100.0
    }
}

/// Gives the ball to the nearest player under a distance threshold.
///
/// Distance runs from the ball center to the nearer bottom corner of the
/// player's box. Each frame is decided on its own; only the controlling
/// team carries over frames where nobody qualifies.
pub struct PossessionAssigner {
    config: PossessionConfig,
}

impl PossessionAssigner {
    pub fn new(config: PossessionConfig) -> Self {
        Self { config }
    }

    /// Nearest qualifying player to the ball in `frame`
    pub fn assign(&self, frame: &FrameTracks) -> Option<TrackId> {
        let ball = frame.ball_bbox()?.center();
        frame
            .players
            .iter()
            .map(|(&id, state)| (id, foot_distance(&state.bbox, ball)))
            .filter(|&(_, distance)| distance < self.config.max_ball_distance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }
}

impl FrameProcessor for PossessionAssigner {
    fn stage_name(&self) -> &'static str {
        "possession"
    }

    fn process_frame(&mut self, ctx: &mut JobContext, frame_index: usize, frame: &mut FrameTracks) -> Result<()> {
        if frame_index == 0 {
            ctx.possession = PossessionRecord::default();
        }

        let assigned = self.assign(frame);
        let previous = ctx.possession.team_control.last().copied().unwrap_or(DEFAULT_TEAM);
        let holder = match assigned {
            Some(id) => frame.players.get_mut(&id),
            None => None,
        };
        let team = match holder {
            Some(state) => {
                state.has_ball = true;
                state.team.unwrap_or(DEFAULT_TEAM)
            }
            None => previous,
        };

        trace!(frame = frame_index, ?assigned, team, "possession");
        ctx.possession.assigned.push(assigned);
        ctx.possession.team_control.push(team);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::tracks::{BBox, ObjectClass, TrackState, TrackTable, BALL_TRACK_ID};

    fn context() -> JobContext {
        JobContext::new(AnalysisConfig {
            show_progress: false,
            ..AnalysisConfig::default()
        })
    }

    fn put_ball(frame: &mut FrameTracks) {
        // center (105, 105)
        frame
            .ball
            .insert(BALL_TRACK_ID, TrackState::new(BBox::new(100.0, 100.0, 110.0, 110.0)));
    }

    /// Player whose bottom-left corner is `offset` px right of the ball center
    fn put_player(frame: &mut FrameTracks, id: TrackId, offset: f32, team: TeamId) {
        let x1 = 105.0 + offset;
        let mut state = TrackState::new(BBox::new(x1, 45.0, x1 + 20.0, 105.0));
        state.team = Some(team);
        frame.players.insert(id, state);
    }

    #[test]
    fn test_threshold_and_carry_forward() {
        let mut tracks = TrackTable::with_frame_count(3);
        for frame in &mut tracks.frames {
            put_ball(frame);
        }
        put_player(&mut tracks.frames[0], 1, 50.0, 1);
        put_player(&mut tracks.frames[1], 2, 200.0, 2);
        put_player(&mut tracks.frames[2], 3, 30.0, 2);

        let mut ctx = context();
        PossessionAssigner::new(PossessionConfig::default())
            .process_frames(&mut ctx, &mut tracks)
            .unwrap();

        assert_eq!(ctx.possession.assigned, vec![Some(1), None, Some(3)]);
        assert_eq!(ctx.possession.team_control, vec![1, 1, 2]);
        assert!(tracks.get(0, ObjectClass::Player, 1).unwrap().has_ball);
        assert!(!tracks.get(1, ObjectClass::Player, 2).unwrap().has_ball);
        assert_eq!(ctx.possession.possession_frames(), 2);
    }

    #[test]
    fn test_nearest_player_wins() {
        let mut frame = FrameTracks::default();
        put_ball(&mut frame);
        put_player(&mut frame, 4, 40.0, 1);
        put_player(&mut frame, 5, 10.0, 2);
        let assigner = PossessionAssigner::new(PossessionConfig::default());
        assert_eq!(assigner.assign(&frame), Some(5));
    }

    #[test]
    fn test_right_corner_counts() {
        let mut frame = FrameTracks::default();
        put_ball(&mut frame);
        // bottom-right corner sits 60 px left of the ball, bottom-left 80 px
        frame
            .players
            .insert(6, TrackState::new(BBox::new(25.0, 45.0, 45.0, 105.0)));
        let assigner = PossessionAssigner::new(PossessionConfig::default());
        assert_eq!(assigner.assign(&frame), Some(6));
    }

    #[test]
    fn test_missing_ball_keeps_previous_team() {
        let mut tracks = TrackTable::with_frame_count(3);
        put_ball(&mut tracks.frames[1]);
        put_player(&mut tracks.frames[1], 8, 5.0, 2);
        put_player(&mut tracks.frames[2], 8, 5.0, 2);

        let mut ctx = context();
        PossessionAssigner::new(PossessionConfig::default())
            .process_frames(&mut ctx, &mut tracks)
            .unwrap();

        // no team has played the ball yet in frame 0
        assert_eq!(ctx.possession.team_control, vec![DEFAULT_TEAM, 2, 2]);
        assert_eq!(ctx.possession.assigned[2], None);
        assert!((ctx.possession.team_share(2) - 200.0 / 3.0).abs() < 1e-9);
    }
}
