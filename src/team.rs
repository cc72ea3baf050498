use std::collections::HashMap;

use anyhow::Result;
use image::RgbImage;
use ndarray::{Array2, ArrayView1};
use tracing::{debug, info, warn};

use crate::context::JobContext;
use crate::crop::{crop_pixels, CropArea};
use crate::frame_processor::FrameProcessor;
use crate::kmeans::KMeans;
use crate::tracks::{BBox, FrameTracks, TeamId, TrackId, TrackTable};

/// Team given to players that cannot be classified
pub const DEFAULT_TEAM: TeamId = 1;

pub type Color = [f32; 3];

/// Frozen team colors and the memoized team of every player seen so far
#[derive(Debug, Clone, Default)]
pub struct TeamAssignment {
    assignments: HashMap<TrackId, TeamId>,
    centroids: Option<[Color; 2]>,
}

impl TeamAssignment {
    pub fn get(&self, track_id: TrackId) -> Option<TeamId> {
        self.assignments.get(&track_id).copied()
    }

    /// Records `team` for a track unless it already has one; returns the
    /// team the track ends up with.
    pub fn assign(&mut self, track_id: TrackId, team: TeamId) -> TeamId {
        *self.assignments.entry(track_id).or_insert(team)
    }

    pub fn centroids(&self) -> Option<&[Color; 2]> {
        self.centroids.as_ref()
    }

    pub fn is_bootstrapped(&self) -> bool {
        self.centroids.is_some()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

fn to_color(view: ArrayView1<f32>) -> Color {
    [view[0], view[1], view[2]]
}

fn squared_distance(a: &Color, b: &Color) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Cluster owning most of the four corner pixels; cluster 0 wins a 2-2 tie
fn background_cluster(corner_labels: [usize; 4]) -> usize {
    let votes_for_first = corner_labels.iter().filter(|&&label| label == 0).count();
    if votes_for_first >= 2 { 0 } else { 1 }
}

/// Dominant jersey color of the player in `bbox`.
///
/// The top half of the box is split into two colors; the background color
/// is picked from the corners and the other one is the jersey. `None` for
/// crops too small or uniform to split.
pub fn jersey_color(frame: &RgbImage, bbox: &BBox) -> Option<Color> {
    let area = CropArea::jersey(bbox, frame.width(), frame.height())?;
    let pixels = crop_pixels(frame, area);
    let model = KMeans::fit(pixels.view(), 2)?;

    let labels = model.labels();
    let background = background_cluster(area.corner_indices().map(|i| labels[i]));
    Some(to_color(model.centroid(1 - background)))
}

/// Splits players into two teams by jersey color.
///
/// Team colors are learned once per job from the first frame that yields
/// at least two jersey colors, then every player is matched to the nearer
/// color the first time it is seen and keeps that team for the rest of the
/// job.
pub struct TeamClassifier<'a> {
    frames: &'a [RgbImage],
}

impl<'a> TeamClassifier<'a> {
    pub fn new(frames: &'a [RgbImage]) -> Self {
        Self { frames }
    }

    /// Learns the two team colors. Does nothing if they are already known.
    pub fn bootstrap(&self, ctx: &mut JobContext, tracks: &TrackTable) {
        if ctx.teams.is_bootstrapped() {
            return;
        }

        for (frame_index, frame_tracks) in tracks.frames.iter().enumerate() {
            if frame_tracks.players.len() < 2 {
                continue;
            }
            let Some(frame) = self.frames.get(frame_index) else {
                break;
            };

            let colors: Vec<Color> = frame_tracks
                .players
                .values()
                .filter_map(|state| jersey_color(frame, &state.bbox))
                .collect();
            if colors.len() < 2 {
                debug!(frame = frame_index, usable = colors.len(), "not enough jersey crops to bootstrap teams");
                continue;
            }

            let samples = Array2::from_shape_vec((colors.len(), 3), colors.concat());
            let Some(model) = samples.ok().and_then(|s| KMeans::fit(s.view(), 2)) else {
                debug!(frame = frame_index, "jersey colors do not separate into two teams");
                continue;
            };

            let centroids = [to_color(model.centroid(0)), to_color(model.centroid(1))];
            info!(frame = frame_index, team_1 = ?centroids[0], team_2 = ?centroids[1], "team colors learned");
            ctx.teams.centroids = Some(centroids);
            return;
        }

        warn!("could not learn team colors, every player defaults to team {}", DEFAULT_TEAM);
    }

    /// Team of `track_id`, classifying it from `bbox` in `frame_index` if it
    /// has not been seen before. Unclassifiable players get the default team
    /// without it being remembered.
    pub fn classify(&self, ctx: &mut JobContext, frame_index: usize, bbox: &BBox, track_id: TrackId) -> TeamId {
        if let Some(team) = ctx.teams.get(track_id) {
            return team;
        }
        let Some(centroids) = ctx.teams.centroids().copied() else {
            return DEFAULT_TEAM;
        };
        let Some(color) = self.frames.get(frame_index).and_then(|frame| jersey_color(frame, bbox)) else {
            debug!(frame = frame_index, track_id, "degenerate jersey crop, using default team");
            return DEFAULT_TEAM;
        };

        let team = if squared_distance(&color, &centroids[0]) <= squared_distance(&color, &centroids[1]) {
            1
        } else {
            2
        };
        debug!(track_id, team, "player assigned to team");
        ctx.teams.assign(track_id, team)
    }
}

impl FrameProcessor for TeamClassifier<'_> {
    fn stage_name(&self) -> &'static str {
        "teams"
    }

    fn process_frame(&mut self, ctx: &mut JobContext, frame_index: usize, frame: &mut FrameTracks) -> Result<()> {
        for (class, track_id, state) in frame.iter_mut() {
            if class.is_team_member() {
                state.team = Some(self.classify(ctx, frame_index, &state.bbox, track_id));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::tracks::{ObjectClass, TrackState};
    use image::Rgb;

    const GRASS: Rgb<u8> = Rgb([20, 140, 20]);
    const RED: Rgb<u8> = Rgb([200, 30, 30]);
    const BLUE: Rgb<u8> = Rgb([30, 30, 200]);

    fn context() -> JobContext {
        JobContext::new(AnalysisConfig {
            show_progress: false,
            ..AnalysisConfig::default()
        })
    }

    /// Paints a player inside `bbox`, leaving a grass margin at the sides and top
    fn draw_player(frame: &mut RgbImage, bbox: &BBox, shirt: Rgb<u8>) {
        for y in (bbox.y1 as u32 + 3)..(bbox.y2 as u32) {
            for x in (bbox.x1 as u32 + 3)..(bbox.x2 as u32 - 3) {
                frame.put_pixel(x, y, shirt);
            }
        }
    }

    fn boxes() -> [BBox; 4] {
        [
            BBox::new(10.0, 10.0, 30.0, 50.0),
            BBox::new(50.0, 10.0, 70.0, 50.0),
            BBox::new(90.0, 10.0, 110.0, 50.0),
            BBox::new(130.0, 10.0, 150.0, 50.0),
        ]
    }

    /// Players 1 and 2 wear red, 3 and 4 wear blue
    fn scene() -> (Vec<RgbImage>, TrackTable) {
        let mut frame = RgbImage::from_pixel(160, 60, GRASS);
        let mut tracks = TrackTable::with_frame_count(1);
        for (i, bbox) in boxes().iter().enumerate() {
            draw_player(&mut frame, bbox, if i < 2 { RED } else { BLUE });
            tracks.frames[0].players.insert(i as TrackId + 1, TrackState::new(*bbox));
        }
        (vec![frame], tracks)
    }

    #[test]
    fn test_jersey_color_ignores_background() {
        let (frames, _) = scene();
        let color = jersey_color(&frames[0], &boxes()[0]).unwrap();
        assert!((color[0] - 200.0).abs() < 1e-3);
        assert!((color[1] - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_background_vote() {
        assert_eq!(background_cluster([0, 0, 0, 1]), 0);
        assert_eq!(background_cluster([1, 1, 0, 1]), 1);
        assert_eq!(background_cluster([1, 0, 1, 0]), 0);
        assert_eq!(background_cluster([0, 1, 1, 0]), 0);
    }

    #[test]
    fn test_uniform_crop_has_no_jersey() {
        let frame = RgbImage::from_pixel(40, 40, GRASS);
        assert!(jersey_color(&frame, &BBox::new(5.0, 5.0, 25.0, 35.0)).is_none());
    }

    #[test]
    fn test_players_split_by_shirt() {
        let (frames, mut tracks) = scene();
        let mut ctx = context();
        let mut classifier = TeamClassifier::new(&frames);
        classifier.bootstrap(&mut ctx, &tracks);
        assert!(ctx.teams.is_bootstrapped());

        classifier.process_frames(&mut ctx, &mut tracks).unwrap();
        let team = |id| tracks.get(0, ObjectClass::Player, id).unwrap().team.unwrap();
        assert_eq!(team(1), team(2));
        assert_eq!(team(3), team(4));
        assert_ne!(team(1), team(3));
        assert_eq!(ctx.teams.len(), 4);
    }

    #[test]
    fn test_assignment_is_frozen() {
        let (frames, tracks) = scene();
        let mut ctx = context();
        let classifier = TeamClassifier::new(&frames);
        classifier.bootstrap(&mut ctx, &tracks);

        // track 7 is pinned to team 2, then shows up in both shirts
        ctx.teams.assign(7, 2);
        for bbox in boxes() {
            assert_eq!(classifier.classify(&mut ctx, 0, &bbox, 7), 2);
        }
        assert_eq!(ctx.teams.assign(7, 1), 2);
    }

    #[test]
    fn test_degenerate_crop_defaults_without_memo() {
        let (frames, tracks) = scene();
        let mut ctx = context();
        let classifier = TeamClassifier::new(&frames);
        classifier.bootstrap(&mut ctx, &tracks);

        let grass_only = BBox::new(40.0, 52.0, 48.0, 60.0);
        assert_eq!(classifier.classify(&mut ctx, 0, &grass_only, 9), DEFAULT_TEAM);
        assert_eq!(ctx.teams.get(9), None);
    }

    #[test]
    fn test_single_player_frames_never_bootstrap() {
        let mut frame = RgbImage::from_pixel(60, 60, GRASS);
        let bbox = BBox::new(10.0, 10.0, 30.0, 50.0);
        draw_player(&mut frame, &bbox, BLUE);
        let frames = vec![frame.clone(), frame];
        let mut tracks = TrackTable::with_frame_count(2);
        for f in &mut tracks.frames {
            f.players.insert(4, TrackState::new(bbox));
        }

        let mut ctx = context();
        let mut classifier = TeamClassifier::new(&frames);
        classifier.bootstrap(&mut ctx, &tracks);
        classifier.process_frames(&mut ctx, &mut tracks).unwrap();

        assert!(!ctx.teams.is_bootstrapped());
        assert_eq!(tracks.get(1, ObjectClass::Player, 4).unwrap().team, Some(DEFAULT_TEAM));
    }
}
