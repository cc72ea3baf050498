use anyhow::Result;
use nalgebra::{Matrix3, SMatrix, SVector};
use tracing::info;

use crate::config::PitchConfig;
use crate::context::JobContext;
use crate::error::AnalysisError;
use crate::frame_processor::FrameProcessor;
use crate::tracks::{FrameTracks, Point, TrackTable};

/// Twice the signed area below which three vertices count as collinear
const COLLINEAR_EPSILON: f64 = 1e-6;

/// Maps pixel anchors onto the pitch rectangle `[(0,0), (W,0), (W,L), (0,L)]`.
///
/// Without calibration it is a pass-through and `metric_position` stays
/// `None`; kinematics then run on pixel anchors and their "km/h" figures are
/// pixel-based.
#[derive(Debug, Clone)]
pub struct PitchProjector {
    homography: Option<Matrix3<f64>>,
}

impl PitchProjector {
    pub fn uncalibrated() -> Self {
        Self { homography: None }
    }

    pub fn new(config: &PitchConfig) -> Result<Self, AnalysisError> {
        match &config.vertices {
            Some(vertices) => Self::from_vertices(vertices, config.width_m, config.length_m),
            None => Ok(Self::uncalibrated()),
        }
    }

    /// Solves the homography taking `vertices` (top-left, top-right,
    /// bottom-right, bottom-left) to the corners of a `width x length` rectangle
    pub fn from_vertices(vertices: &[Point; 4], width: f32, length: f32) -> Result<Self, AnalysisError> {
        let src: Vec<(f64, f64)> = vertices.iter().map(|p| (p.x as f64, p.y as f64)).collect();
        let (w, l) = (width as f64, length as f64);
        let dst = [(0.0, 0.0), (w, 0.0), (w, l), (0.0, l)];

        for i in 0..4 {
            let (a, b, c) = (src[i], src[(i + 1) % 4], src[(i + 2) % 4]);
            let cross = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
            if cross.abs() < COLLINEAR_EPSILON {
                return Err(AnalysisError::DegenerateCalibration);
            }
        }

        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();
        for (i, ((x, y), (u, v))) in src.iter().zip(dst.iter()).enumerate() {
            let r = 2 * i;
            a.set_row(r, &SMatrix::<f64, 1, 8>::from_row_slice(&[*x, *y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y]));
            a.set_row(r + 1, &SMatrix::<f64, 1, 8>::from_row_slice(&[0.0, 0.0, 0.0, *x, *y, 1.0, -v * x, -v * y]));
            b[r] = *u;
            b[r + 1] = *v;
        }

        let h = a.lu().solve(&b).ok_or(AnalysisError::DegenerateCalibration)?;
        if h.iter().any(|v| !v.is_finite()) {
            return Err(AnalysisError::DegenerateCalibration);
        }

        let homography = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
        Ok(Self {
            homography: Some(homography),
        })
    }

    pub fn is_calibrated(&self) -> bool {
        self.homography.is_some()
    }

    /// Projects a pixel point. Points outside the calibrated quadrilateral
    /// are projected as-is, without clamping. `None` when uncalibrated or the
    /// point maps to infinity.
    pub fn transform(&self, point: Point) -> Option<Point> {
        let h = self.homography.as_ref()?;
        let (x, y) = (point.x as f64, point.y as f64);
        let denom = h[(2, 0)] * x + h[(2, 1)] * y + h[(2, 2)];
        if denom.abs() < f64::EPSILON {
            return None;
        }
        let u = (h[(0, 0)] * x + h[(0, 1)] * y + h[(0, 2)]) / denom;
        let v = (h[(1, 0)] * x + h[(1, 1)] * y + h[(1, 2)]) / denom;
        Some(Point::new(u as f32, v as f32))
    }
}

impl FrameProcessor for PitchProjector {
    fn stage_name(&self) -> &'static str {
        "pitch projection"
    }

    fn process_frames(&mut self, ctx: &mut JobContext, tracks: &mut TrackTable) -> Result<()> {
        if !self.is_calibrated() {
            info!("no pitch calibration, positions stay in pixel space");
            return Ok(());
        }
        for (frame_index, frame) in tracks.frames.iter_mut().enumerate() {
            self.process_frame(ctx, frame_index, frame)?;
        }
        Ok(())
    }

    fn process_frame(&mut self, _ctx: &mut JobContext, _frame_index: usize, frame: &mut FrameTracks) -> Result<()> {
        for (_, _, state) in frame.iter_mut() {
            state.metric_position = state.position.and_then(|p| self.transform(p));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
    }

    #[test]
    fn test_axis_aligned_rectangle_scales() {
        let vertices = [
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 200.0),
            Point::new(0.0, 200.0),
        ];
        let projector = PitchProjector::from_vertices(&vertices, 68.0, 105.0).unwrap();
        let mid = projector.transform(Point::new(50.0, 100.0)).unwrap();
        assert!(close(mid, Point::new(34.0, 52.5)), "{:?}", mid);
    }

    #[test]
    fn test_trapezoid_corners_map_to_pitch_corners() {
        let vertices = [
            Point::new(110.0, 1035.0),
            Point::new(265.0, 275.0),
            Point::new(910.0, 260.0),
            Point::new(1640.0, 915.0),
        ];
        let projector = PitchProjector::from_vertices(&vertices, 68.0, 23.32).unwrap();
        let expected = [
            Point::new(0.0, 0.0),
            Point::new(68.0, 0.0),
            Point::new(68.0, 23.32),
            Point::new(0.0, 23.32),
        ];
        for (v, e) in vertices.iter().zip(expected) {
            let got = projector.transform(*v).unwrap();
            assert!((got.x - e.x).abs() < 1e-2 && (got.y - e.y).abs() < 1e-2, "{:?} -> {:?}", v, got);
        }
    }

    #[test]
    fn test_collinear_vertices_are_rejected() {
        let vertices = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(20.0, 20.0),
            Point::new(0.0, 50.0),
        ];
        assert!(matches!(
            PitchProjector::from_vertices(&vertices, 68.0, 105.0),
            Err(AnalysisError::DegenerateCalibration)
        ));
    }

    #[test]
    fn test_uncalibrated_is_pass_through() {
        let projector = PitchProjector::new(&PitchConfig::default()).unwrap();
        assert!(!projector.is_calibrated());
        assert_eq!(projector.transform(Point::new(1.0, 2.0)), None);
    }
}
