use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::geometry;

/// Identifier of a track, scoped within its object class
pub type TrackId = u32;

/// Team label produced by the team classifier (1 or 2)
pub type TeamId = u8;

/// Synthetic id every ball record is stored under (single-ball assumption)
pub const BALL_TRACK_ID: TrackId = 1;

/// Closed set of object classes coming out of the detector/tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectClass {
    Player,
    Referee,
    Ball,
}

impl ObjectClass {
    /// Speed and distance are only estimated for players
    pub fn has_kinematics(self) -> bool {
        matches!(self, ObjectClass::Player)
    }

    /// Only players are clustered into teams and can hold the ball
    pub fn is_team_member(self) -> bool {
        matches!(self, ObjectClass::Player)
    }

    /// Representative pixel point of a bbox for this class:
    /// the center for the ball, the bottom-center (feet) for people.
    pub fn anchor(self, bbox: &BBox) -> Point {
        match self {
            ObjectClass::Ball => bbox.center(),
            ObjectClass::Player | ObjectClass::Referee => bbox.foot(),
        }
    }
}

/// A 2D point in pixel or pitch units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f32 {
        geometry::measure_distance(*self, *other)
    }
}

/// Axis-aligned bounding box in `(x1, y1, x2, y2)` pixel form
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn center(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// Bottom-center of the box
    pub fn foot(&self) -> Point {
        Point::new((self.x1 + self.x2) / 2.0, self.y2)
    }

    pub fn bottom_left(&self) -> Point {
        Point::new(self.x1, self.y2)
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.x2, self.y2)
    }

    /// Returns this box moved by `(-dx, -dy)`
    pub fn shifted_back(&self, dx: f32, dy: f32) -> BBox {
        BBox::new(self.x1 - dx, self.y1 - dy, self.x2 - dx, self.y2 - dy)
    }
}

impl From<[f32; 4]> for BBox {
    fn from(v: [f32; 4]) -> Self {
        BBox::new(v[0], v[1], v[2], v[3])
    }
}

/// Per-frame state of one track. Fields after `bbox` are filled in by the
/// pipeline stages in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackState {
    pub bbox: BBox,
    #[serde(default)]
    pub adjusted_bbox: Option<BBox>,
    /// Anchor point of the camera-adjusted bbox, in pixels
    #[serde(default)]
    pub position: Option<Point>,
    /// Anchor projected onto the pitch, in meters. `None` when uncalibrated.
    #[serde(default)]
    pub metric_position: Option<Point>,
    #[serde(default)]
    pub speed_kmh: Option<f32>,
    #[serde(default)]
    pub distance: Option<f32>,
    #[serde(default)]
    pub team: Option<TeamId>,
    #[serde(default)]
    pub has_ball: bool,
}

impl TrackState {
    pub fn new(bbox: BBox) -> Self {
        Self {
            bbox,
            adjusted_bbox: None,
            position: None,
            metric_position: None,
            speed_kmh: None,
            distance: None,
            team: None,
            has_ball: false,
        }
    }

    /// Position used for kinematics and field ranking. On a calibrated pitch
    /// only the metric position counts, so a point that failed to project
    /// is missing rather than a pixel value.
    pub fn field_position(&self, calibrated: bool) -> Option<Point> {
        if calibrated { self.metric_position } else { self.position }
    }
}

/// All tracks visible in one frame, keyed by class then id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameTracks {
    pub players: BTreeMap<TrackId, TrackState>,
    pub referees: BTreeMap<TrackId, TrackState>,
    pub ball: BTreeMap<TrackId, TrackState>,
}

impl FrameTracks {
    pub fn of(&self, class: ObjectClass) -> &BTreeMap<TrackId, TrackState> {
        match class {
            ObjectClass::Player => &self.players,
            ObjectClass::Referee => &self.referees,
            ObjectClass::Ball => &self.ball,
        }
    }

    pub fn of_mut(&mut self, class: ObjectClass) -> &mut BTreeMap<TrackId, TrackState> {
        match class {
            ObjectClass::Player => &mut self.players,
            ObjectClass::Referee => &mut self.referees,
            ObjectClass::Ball => &mut self.ball,
        }
    }

    /// The single ball of this frame, if detected
    pub fn ball_bbox(&self) -> Option<BBox> {
        self.ball.values().next().map(|state| state.bbox)
    }

    /// Iterates every `(class, id, state)` in the frame
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ObjectClass, TrackId, &mut TrackState)> {
        let players = self.players.iter_mut().map(|(id, s)| (ObjectClass::Player, *id, s));
        let referees = self.referees.iter_mut().map(|(id, s)| (ObjectClass::Referee, *id, s));
        let ball = self.ball.iter_mut().map(|(id, s)| (ObjectClass::Ball, *id, s));
        players.chain(referees).chain(ball)
    }
}

/// One input record from the external detector/tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub frame_index: usize,
    pub track_id: TrackId,
    pub class: ObjectClass,
    pub bbox: [f32; 4],
}

/// Frame-indexed track structure for a whole clip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackTable {
    pub frames: Vec<FrameTracks>,
}

impl TrackTable {
    pub fn with_frame_count(frame_count: usize) -> Self {
        Self {
            frames: vec![FrameTracks::default(); frame_count],
        }
    }

    /// Builds the table from raw detections. Records pointing past the last
    /// frame are dropped; ball records are folded onto [`BALL_TRACK_ID`].
    pub fn from_detections(frame_count: usize, detections: &[Detection]) -> Self {
        let mut table = Self::with_frame_count(frame_count);
        let mut dropped = 0usize;

        for det in detections {
            let Some(frame) = table.frames.get_mut(det.frame_index) else {
                dropped += 1;
                continue;
            };
            let id = match det.class {
                ObjectClass::Ball => BALL_TRACK_ID,
                _ => det.track_id,
            };
            let previous = frame
                .of_mut(det.class)
                .insert(id, TrackState::new(BBox::from(det.bbox)));
            if previous.is_some() {
                debug!(frame = det.frame_index, track_id = id, class = ?det.class, "duplicate detection replaced");
            }
        }

        if dropped > 0 {
            warn!(dropped, frame_count, "detections outside the loaded frame range were ignored");
        }
        table
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, frame_index: usize, class: ObjectClass, id: TrackId) -> Option<&TrackState> {
        self.frames.get(frame_index)?.of(class).get(&id)
    }
}
