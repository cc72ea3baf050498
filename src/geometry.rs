use crate::tracks::{BBox, Point};

/// Euclidean distance between two points
pub fn measure_distance(p1: Point, p2: Point) -> f32 {
    ((p1.x - p2.x).powi(2) + (p1.y - p2.y).powi(2)).sqrt()
}

/// Distance from `target` to the nearer of the two bottom corners of `bbox`
/// (left foot / right foot)
pub fn foot_distance(bbox: &BBox, target: Point) -> f32 {
    let left = measure_distance(bbox.bottom_left(), target);
    let right = measure_distance(bbox.bottom_right(), target);
    left.min(right)
}

/// Rounds to two decimals, the precision every reported figure uses
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Linear interpolation between two boxes, `t` in `[0, 1]`
pub fn lerp_bbox(from: &BBox, to: &BBox, t: f32) -> BBox {
    let mix = |a: f32, b: f32| a + (b - a) * t;
    BBox::new(
        mix(from.x1, to.x1),
        mix(from.y1, to.y1),
        mix(from.x2, to.x2),
        mix(from.y2, to.y2),
    )
}
