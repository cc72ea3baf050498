use thiserror::Error;

/// Precondition failures that stop an analysis job before any stage runs.
/// Everything recoverable is handled inside the stages instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no frames to analyze")]
    EmptyInput,

    #[error("frame rate must be positive, got {0}")]
    InvalidFrameRate(f64),

    #[error("pitch calibration needs exactly 4 pixel vertices, got {0}")]
    CalibrationVertexCount(usize),

    #[error("pitch calibration vertices do not span a quadrilateral")]
    DegenerateCalibration,

    #[error("frame {index} is {actual_width}x{actual_height}, expected {width}x{height}")]
    FrameSizeMismatch {
        index: usize,
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("speed window must span at least one frame")]
    InvalidWindow,
}
