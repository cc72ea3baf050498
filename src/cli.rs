use argh::FromArgs;

/// Turns tracked detections from a match video into per-player movement,
/// team and possession statistics
#[derive(FromArgs, Debug)]
pub struct Args {
    /// directory holding the decoded frames, one image per frame ordered by the number in its name
    #[argh(option)]
    pub frames: String,

    /// JSON file with the tracker output: [{frame_index, track_id, class, bbox}]
    #[argh(option)]
    pub detections: String,

    /// frame rate of the source video
    #[argh(option, default = "24.0")]
    pub fps: f64,

    /// pitch corners in pixels as "x,y;x,y;x,y;x,y" (top-left, top-right, bottom-right, bottom-left)
    #[argh(option)]
    pub calibration: Option<String>,

    /// pitch width in meters
    #[argh(option, default = "68.0")]
    pub pitch_width: f32,

    /// pitch length in meters
    #[argh(option, default = "105.0")]
    pub pitch_length: f32,

    /// speed window in frames
    #[argh(option, default = "5")]
    pub speed_window: usize,

    /// max distance in pixels between ball and feet for possession
    #[argh(option, default = "70.0")]
    pub max_ball_distance: f32,

    /// minimum presence in seconds for a player to be reported
    #[argh(option, default = "10.0")]
    pub min_presence: f64,

    /// snapshot file for the camera motion sequence
    #[argh(option)]
    pub motion_cache: Option<String>,

    /// snapshot file for the annotated tracks
    #[argh(option)]
    pub tracks_cache: Option<String>,

    /// fill frames with a missing ball detection
    #[argh(switch)]
    pub interpolate_ball: bool,

    /// hide progress bars
    #[argh(switch)]
    pub quiet: bool,

    /// where to move the final report
    #[argh(option, default = "String::new()")]
    pub output_filepath: String,
}
