use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::cli::Args;
use crate::error::AnalysisError;
use crate::tracks::Point;

/// Sparse optical flow settings for camera motion estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraMotionConfig {
    /// Width in pixels of the left and right feature strips (assumed static background)
    pub margin_px: u32,
    /// Displacements at or below this magnitude are treated as no motion
    pub min_motion_px: f32,
    pub max_corners: usize,
    /// Corners weaker than `quality_level * strongest` are discarded
    pub quality_level: f32,
    pub min_corner_distance: f32,
    /// Side of the structure tensor neighbourhood
    pub block_size: u32,
    /// Side of the Lucas-Kanade tracking window
    pub lk_window: u32,
    /// Number of pyramid levels above the base image
    pub lk_max_level: u32,
    pub lk_max_iterations: u32,
    pub lk_epsilon: f32,
    /// Tracks whose mean patch difference (0-255 scale) exceeds this are dropped
    pub max_track_error: f32,
}

impl Default for CameraMotionConfig {
    fn default() -> Self {
        Self {
            margin_px: 20,
            min_motion_px: 5.0,
            max_corners: 100,
            quality_level: 0.3,
            min_corner_distance: 3.0,
            block_size: 7,
            lk_window: 15,
            lk_max_level: 2,
            lk_max_iterations: 10,
            lk_epsilon: 0.03,
            max_track_error: 12.0,
        }
    }
}

/// Pixel-to-pitch calibration. Without vertices the projector is a pass-through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchConfig {
    /// Pixel corners ordered top-left, top-right, bottom-right, bottom-left
    pub vertices: Option<[Point; 4]>,
    pub width_m: f32,
    pub length_m: f32,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            vertices: None,
            width_m: 68.0,
            length_m: 105.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinematicsConfig {
    pub window_frames: usize,
}

impl Default for KinematicsConfig {
    fn default() -> Self {
        Self { window_frames: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PossessionConfig {
    /// Max pixel distance between the ball center and a player's nearer foot
    pub max_ball_distance: f32,
}

impl Default for PossessionConfig {
    fn default() -> Self {
        Self {
            max_ball_distance: 70.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Players whose presence windows add up to less than this are left out of the report
    pub min_presence_s: f64,
    /// Percentile at or below which a player counts as deep
    pub deep_cutpoint: f64,
    /// Percentile at or above which a player counts as advanced
    pub advanced_cutpoint: f64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            min_presence_s: 10.0,
            deep_cutpoint: 33.0,
            advanced_cutpoint: 66.0,
        }
    }
}

/// Everything one analysis job needs to know up front
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub fps: f64,
    pub camera: CameraMotionConfig,
    pub pitch: PitchConfig,
    pub kinematics: KinematicsConfig,
    pub possession: PossessionConfig,
    pub stats: StatsConfig,
    /// Fill frames without a ball detection before possession is assigned
    pub interpolate_ball: bool,
    pub show_progress: bool,
    #[serde(skip)]
    pub motion_cache: Option<PathBuf>,
    #[serde(skip)]
    pub tracks_cache: Option<PathBuf>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fps: 24.0,
            camera: CameraMotionConfig::default(),
            pitch: PitchConfig::default(),
            kinematics: KinematicsConfig::default(),
            possession: PossessionConfig::default(),
            stats: StatsConfig::default(),
            interpolate_ball: false,
            show_progress: true,
            motion_cache: None,
            tracks_cache: None,
        }
    }
}

/// Parses `"x,y;x,y;x,y;x,y"` into the four calibration vertices
pub fn parse_vertices(raw: &str) -> Result<[Point; 4]> {
    let points = raw
        .split(';')
        .filter(|s| !s.trim().is_empty())
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .with_context(|| format!("vertex '{}' is not in x,y form", pair))?;
            let x: f32 = x.trim().parse().with_context(|| format!("bad x in '{}'", pair))?;
            let y: f32 = y.trim().parse().with_context(|| format!("bad y in '{}'", pair))?;
            Ok(Point::new(x, y))
        })
        .collect::<Result<Vec<_>>>()?;

    let count = points.len();
    let vertices: [Point; 4] = points
        .try_into()
        .map_err(|_| AnalysisError::CalibrationVertexCount(count))?;
    Ok(vertices)
}

/// Builds the job configuration from command line arguments
pub fn build_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = AnalysisConfig {
        fps: args.fps,
        interpolate_ball: args.interpolate_ball,
        show_progress: !args.quiet,
        motion_cache: args.motion_cache.as_ref().map(PathBuf::from),
        tracks_cache: args.tracks_cache.as_ref().map(PathBuf::from),
        ..AnalysisConfig::default()
    };

    if let Some(raw) = &args.calibration {
        config.pitch.vertices = Some(parse_vertices(raw)?);
    }
    config.pitch.width_m = args.pitch_width;
    config.pitch.length_m = args.pitch_length;
    config.kinematics.window_frames = args.speed_window;
    config.possession.max_ball_distance = args.max_ball_distance;
    config.stats.min_presence_s = args.min_presence;

    Ok(config)
}
