use tracing::{debug, info};

use crate::geometry::lerp_bbox;
use crate::tracks::{BBox, TrackState, TrackTable, BALL_TRACK_ID};

/// Fills frames where the ball was not detected.
///
/// Gaps between two detections get a linearly interpolated box; frames
/// before the first or after the last detection copy the nearest one. A clip
/// without any ball detection is left untouched. Returns the number of
/// frames filled.
pub fn interpolate_ball(tracks: &mut TrackTable) -> usize {
    let detected: Vec<(usize, BBox)> = tracks
        .frames
        .iter()
        .enumerate()
        .filter_map(|(i, frame)| frame.ball_bbox().map(|bbox| (i, bbox)))
        .collect();
    if detected.is_empty() {
        debug!("no ball detections to interpolate from");
        return 0;
    }

    let mut filled = 0;
    // index into `detected` of the first detection after the current frame
    let mut next = 0;
    for (frame_index, frame) in tracks.frames.iter_mut().enumerate() {
        while next < detected.len() && detected[next].0 <= frame_index {
            next += 1;
        }
        if !frame.ball.is_empty() {
            continue;
        }

        let before = next.checked_sub(1).map(|i| detected[i]);
        let after = detected.get(next).copied();
        let bbox = match (before, after) {
            (Some((i0, b0)), Some((i1, b1))) => {
                let t = (frame_index - i0) as f32 / (i1 - i0) as f32;
                lerp_bbox(&b0, &b1, t)
            }
            (Some((_, b)), None) | (None, Some((_, b))) => b,
            (None, None) => continue,
        };
        frame.ball.insert(BALL_TRACK_ID, TrackState::new(bbox));
        filled += 1;
    }

    info!(filled, detected = detected.len(), "ball positions interpolated");
    filled
}
