use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::StatsConfig;
use crate::feedback::rule_notes;
use crate::geometry::round2;
use crate::possession::PossessionRecord;
use crate::tracks::{Point, TeamId, TrackId, TrackTable};
use crate::windows::{build_windows, TimeWindow};

/// Where a player sits along the pitch relative to the others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Deep,
    Mid,
    Advanced,
}

impl Role {
    pub fn from_percentile(pct: f64, config: &StatsConfig) -> Self {
        if pct >= config.advanced_cutpoint {
            Role::Advanced
        } else if pct <= config.deep_cutpoint {
            Role::Deep
        } else {
            Role::Mid
        }
    }

    fn index(self) -> usize {
        match self {
            Role::Deep => 0,
            Role::Mid => 1,
            Role::Advanced => 2,
        }
    }
}

/// Ranks `values` ascending and scales the rank linearly to 0..=100.
/// Ties keep their input order.
pub fn percentile_ranks(values: &[(TrackId, f32)]) -> Vec<(TrackId, f64)> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.1.total_cmp(&b.1));
    let denominator = sorted.len().saturating_sub(1).max(1) as f64;
    sorted
        .into_iter()
        .enumerate()
        .map(|(rank, (id, _))| (id, rank as f64 / denominator * 100.0))
        .collect()
}

/// Final per-player report entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub track_id: TrackId,
    pub team: Option<TeamId>,
    pub frames_present: usize,
    pub possession_frames: usize,
    pub possession_pct_of_present: f64,
    pub possession_pct_of_total: f64,
    pub distance: f64,
    pub avg_speed_kmh: f64,
    pub max_speed_kmh: f64,
    pub top_speed_time_s: Option<f64>,
    pub possession_windows: Vec<TimeWindow>,
    pub presence_windows: Vec<TimeWindow>,
    pub presence_total_s: f64,
    /// Rank of the player's mean x among all players, 0 (deepest) to 100
    pub position_rank_pct: Option<f64>,
    pub position_role: Option<Role>,
    pub ball_control_pct: f64,
    /// Share of presence frames spent in each zone by per-frame ranking
    pub field_control_deep_pct: f64,
    pub field_control_mid_pct: f64,
    pub field_control_adv_pct: f64,
    /// Share of presence frames with a positive speed sample
    pub movement_control_pct: f64,
    pub pressure_control_pct: f64,
    pub feedback: Vec<String>,
}

/// Match-wide totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub total_possession_frames: usize,
    pub team_1_control_pct: f64,
    pub team_2_control_pct: f64,
    pub players_seen: usize,
    pub players_reported: usize,
}

/// Everything gathered about one player while scanning the frames
#[derive(Debug, Default)]
struct PlayerAccumulator {
    team: Option<TeamId>,
    presence_frames: Vec<usize>,
    possession_frames: Vec<usize>,
    speed_samples: Vec<(f32, usize)>,
    max_distance: Option<f32>,
    pixel_positions: Vec<(usize, Point)>,
    field_xs: Vec<f32>,
    zone_counts: [usize; 3],
    moving_frames: usize,
}

impl PlayerAccumulator {
    fn mean_x(&self) -> Option<f32> {
        if self.field_xs.is_empty() {
            return None;
        }
        Some(self.field_xs.iter().sum::<f32>() / self.field_xs.len() as f32)
    }

    /// First sample at the peak speed
    fn top_speed(&self) -> Option<(f32, usize)> {
        let mut best: Option<(f32, usize)> = None;
        for &(speed, frame) in &self.speed_samples {
            if best.is_none_or(|(top, _)| speed > top) {
                best = Some((speed, frame));
            }
        }
        best
    }

    /// Frame ending the largest pixel displacement per second between two
    /// consecutive position samples
    fn fastest_displacement_frame(&self, fps: f64) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for pair in self.pixel_positions.windows(2) {
            let ((f0, p0), (f1, p1)) = (pair[0], pair[1]);
            let dt = (f1 - f0) as f64 / fps;
            if dt <= 0.0 {
                continue;
            }
            let rate = p0.distance_to(&p1) as f64 / dt;
            if rate > 0.0 && best.is_none_or(|(top, _)| rate > top) {
                best = Some((rate, f1));
            }
        }
        best.map(|(_, frame)| frame)
    }
}

/// Turns the annotated track table into per-player summaries
pub struct StatsAggregator {
    config: StatsConfig,
    fps: f64,
    calibrated: bool,
}

impl StatsAggregator {
    pub fn new(config: StatsConfig, fps: f64) -> Self {
        Self {
            config,
            fps,
            calibrated: false,
        }
    }

    /// Rank field positions in meters instead of pixels
    pub fn calibrated(mut self, calibrated: bool) -> Self {
        self.calibrated = calibrated;
        self
    }

    pub fn aggregate(&self, tracks: &TrackTable, possession: &PossessionRecord) -> (MatchSummary, Vec<PlayerSummary>) {
        let mut players: BTreeMap<TrackId, PlayerAccumulator> = BTreeMap::new();
        let mut total_possession_frames = 0usize;

        for (frame_index, frame) in tracks.frames.iter().enumerate() {
            for (&id, state) in &frame.players {
                let acc = players.entry(id).or_default();
                if acc.team.is_none() {
                    acc.team = state.team;
                }
                acc.presence_frames.push(frame_index);
                if state.has_ball {
                    acc.possession_frames.push(frame_index);
                    total_possession_frames += 1;
                }
                if let Some(speed) = state.speed_kmh {
                    acc.speed_samples.push((speed, frame_index));
                    if speed > 0.0 {
                        acc.moving_frames += 1;
                    }
                }
                if let Some(distance) = state.distance {
                    acc.max_distance = Some(acc.max_distance.map_or(distance, |d| d.max(distance)));
                }
                if let Some(position) = state.position {
                    acc.pixel_positions.push((frame_index, position));
                }
                if let Some(field) = state.field_position(self.calibrated) {
                    acc.field_xs.push(field.x);
                }
            }

            self.tally_zones(frame_index, tracks, &mut players);
        }

        let means: Vec<(TrackId, f32)> = players
            .iter()
            .filter_map(|(&id, acc)| acc.mean_x().map(|x| (id, x)))
            .collect();
        let ranks: BTreeMap<TrackId, f64> = percentile_ranks(&means).into_iter().collect();

        let players_seen = players.len();
        let mut summaries: Vec<PlayerSummary> = players
            .into_iter()
            .filter_map(|(id, acc)| {
                let summary = self.summarize(id, acc, ranks.get(&id).copied(), total_possession_frames);
                if summary.presence_total_s < self.config.min_presence_s {
                    debug!(
                        track_id = id,
                        presence_s = summary.presence_total_s,
                        "player below minimum presence, left out of the report"
                    );
                    return None;
                }
                Some(summary)
            })
            .collect();

        summaries.sort_by(|a, b| {
            b.possession_frames
                .cmp(&a.possession_frames)
                .then(b.distance.total_cmp(&a.distance))
                .then(a.track_id.cmp(&b.track_id))
        });

        let match_summary = MatchSummary {
            total_possession_frames,
            team_1_control_pct: round2(possession.team_share(1)),
            team_2_control_pct: round2(possession.team_share(2)),
            players_seen,
            players_reported: summaries.len(),
        };
        info!(
            players_seen,
            players_reported = match_summary.players_reported,
            total_possession_frames,
            "player statistics aggregated"
        );
        (match_summary, summaries)
    }

    /// Ranks the players of one frame by their current x and counts the
    /// zone each one lands in. Frames with fewer than two positioned players
    /// are skipped.
    fn tally_zones(&self, frame_index: usize, tracks: &TrackTable, players: &mut BTreeMap<TrackId, PlayerAccumulator>) {
        let xs: Vec<(TrackId, f32)> = tracks.frames[frame_index]
            .players
            .iter()
            .filter_map(|(&id, state)| state.field_position(self.calibrated).map(|p| (id, p.x)))
            .collect();
        if xs.len() < 2 {
            return;
        }
        for (id, pct) in percentile_ranks(&xs) {
            if let Some(acc) = players.get_mut(&id) {
                acc.zone_counts[Role::from_percentile(pct, &self.config).index()] += 1;
            }
        }
    }

    fn summarize(&self, track_id: TrackId, acc: PlayerAccumulator, rank: Option<f64>, total_possession: usize) -> PlayerSummary {
        let frames_present = acc.presence_frames.len();
        let possession_frames = acc.possession_frames.len();
        let present = frames_present.max(1) as f64;
        let share = |count: usize| round2(count as f64 / present * 100.0);

        let speeds: Vec<f64> = acc.speed_samples.iter().map(|&(s, _)| s as f64).collect();
        let avg_speed = if speeds.is_empty() {
            0.0
        } else {
            speeds.iter().sum::<f64>() / speeds.len() as f64
        };
        let top_speed = acc.top_speed();
        let top_speed_frame = match top_speed {
            Some((_, frame)) => Some(frame),
            None => acc.fastest_displacement_frame(self.fps),
        };

        let presence_windows = build_windows(&acc.presence_frames, self.fps);
        let presence_total_s: f64 = presence_windows.iter().map(TimeWindow::duration).sum();
        let possession_pct_of_total = if total_possession > 0 {
            possession_frames as f64 / total_possession as f64 * 100.0
        } else {
            0.0
        };
        let [deep, mid, advanced] = acc.zone_counts;

        let mut summary = PlayerSummary {
            track_id,
            team: acc.team,
            frames_present,
            possession_frames,
            possession_pct_of_present: share(possession_frames),
            possession_pct_of_total: round2(possession_pct_of_total),
            distance: round2(acc.max_distance.unwrap_or(0.0) as f64),
            avg_speed_kmh: round2(avg_speed),
            max_speed_kmh: round2(top_speed.map_or(0.0, |(s, _)| s as f64)),
            top_speed_time_s: top_speed_frame.map(|f| round2(f as f64 / self.fps)),
            possession_windows: build_windows(&acc.possession_frames, self.fps),
            presence_windows,
            presence_total_s: round2(presence_total_s),
            position_rank_pct: rank.map(round2),
            position_role: rank.map(|pct| Role::from_percentile(pct, &self.config)),
            ball_control_pct: share(possession_frames),
            field_control_deep_pct: share(deep),
            field_control_mid_pct: share(mid),
            field_control_adv_pct: share(advanced),
            movement_control_pct: share(acc.moving_frames),
            pressure_control_pct: share(deep),
            feedback: Vec::new(),
        };
        summary.feedback = rule_notes(&summary);
        summary
    }
}
