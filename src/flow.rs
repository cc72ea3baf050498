use anyhow::Result;
use image::RgbImage;
use opencv::core::{Mat, Point2f, Scalar, Size, TermCriteria, TermCriteria_Type, Vector, CV_8UC1};
use opencv::prelude::*;
use opencv::{imgproc, video};

use crate::config::CameraMotionConfig;
use crate::tracks::Point;

/// Shi-Tomasi corners plus pyramidal Lucas-Kanade, restricted to the left and
/// right strips of the frame.
pub struct SparseFlow {
    max_corners: i32,
    quality_level: f64,
    min_distance: f64,
    block_size: i32,
    margin: i32,
    win_size: i32,
    max_level: i32,
    max_error: f32,
    criteria: TermCriteria,
}

impl SparseFlow {
    pub fn new(config: &CameraMotionConfig) -> Result<Self> {
        Ok(Self {
            max_corners: config.max_corners as i32,
            quality_level: config.quality_level as f64,
            min_distance: config.min_corner_distance as f64,
            block_size: config.block_size as i32,
            margin: config.margin_px as i32,
            win_size: config.lk_window as i32,
            max_level: config.lk_max_level as i32,
            max_error: config.max_track_error,
            criteria: TermCriteria::new(
                TermCriteria_Type::COUNT as i32 | TermCriteria_Type::EPS as i32,
                config.lk_max_iterations as i32,
                config.lk_epsilon as f64,
            )?,
        })
    }

    /// Single channel 8-bit copy of `frame`
    pub fn gray(frame: &RgbImage) -> Result<Mat> {
        let luma = image::imageops::grayscale(frame);
        let mut gray = Mat::new_rows_cols_with_default(
            luma.height() as i32,
            luma.width() as i32,
            CV_8UC1,
            Scalar::all(0.0),
        )?;
        gray.data_bytes_mut()?.copy_from_slice(luma.as_raw());
        Ok(gray)
    }

    /// Non-zero on the `margin` columns at each side, zero elsewhere
    fn edge_mask(&self, rows: i32, cols: i32) -> Result<Mat> {
        let mut mask = Mat::new_rows_cols_with_default(rows, cols, CV_8UC1, Scalar::all(0.0))?;
        let margin = self.margin.min(cols);
        for y in 0..rows {
            for x in (0..margin).chain((cols - margin).max(margin)..cols) {
                *mask.at_2d_mut::<u8>(y, x)? = 255;
            }
        }
        Ok(mask)
    }

    pub fn detect(&self, gray: &Mat) -> Result<Vec<Point>> {
        let mask = self.edge_mask(gray.rows(), gray.cols())?;
        let mut corners = Vector::<Point2f>::new();
        imgproc::good_features_to_track(
            gray,
            &mut corners,
            self.max_corners,
            self.quality_level,
            self.min_distance,
            &mask,
            self.block_size,
            false,
            0.04,
        )?;
        Ok(corners.iter().map(|p| Point::new(p.x, p.y)).collect())
    }

    /// Where each of `points` went between `prev` and `next`. A track is
    /// `None` when OpenCV lost it or its patch residual exceeds the limit.
    pub fn track(&self, prev: &Mat, next: &Mat, points: &[Point]) -> Result<Vec<Option<Point>>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        let prev_pts: Vector<Point2f> = points.iter().map(|p| Point2f::new(p.x, p.y)).collect();
        let mut next_pts = Vector::<Point2f>::new();
        let mut status = Vector::<u8>::new();
        let mut err = Vector::<f32>::new();

        video::calc_optical_flow_pyr_lk(
            prev,
            next,
            &prev_pts,
            &mut next_pts,
            &mut status,
            &mut err,
            Size::new(self.win_size, self.win_size),
            self.max_level,
            self.criteria,
            0,
            1e-4,
        )?;

        let tracked = next_pts
            .iter()
            .zip(status.iter())
            .zip(err.iter())
            .map(|((p, ok), residual)| {
                (ok != 0 && residual.is_finite() && residual <= self.max_error).then(|| Point::new(p.x, p.y))
            })
            .collect();
        Ok(tracked)
    }
}
