use indicatif::{ProgressBar, ProgressStyle};
use std::time::Instant;
use tracing::info;

/// Progress bar for one pipeline stage walking over the frames of a clip
pub struct StageProgress {
    progress_bar: ProgressBar,
    start_time: Instant,
    stage_name: &'static str,
    frame_rate: f64,
    processed_frames: u64,
}

impl StageProgress {
    /// Creates a progress tracker over `total_frames`; `visible = false` draws nothing
    pub fn new(total_frames: u64, frame_rate: f64, stage_name: &'static str, visible: bool) -> Self {
        let progress_bar = if visible {
            ProgressBar::new(total_frames)
        } else {
            ProgressBar::hidden()
        };

        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} frames ({percent}%) | {msg}")
        {
            progress_bar.set_style(style.progress_chars("#>-"));
        }
        progress_bar.set_message(stage_name);

        Self {
            progress_bar,
            start_time: Instant::now(),
            stage_name,
            frame_rate,
            processed_frames: 0,
        }
    }

    /// Updates the progress by one frame
    pub fn update_frame(&mut self) {
        self.processed_frames += 1;
        self.progress_bar.inc(1);
        if self.processed_frames % 25 == 0 {
            let clip_time = format_duration(self.processed_frames as f64 / self.frame_rate);
            self.progress_bar
                .set_message(format!("{} | clip {}", self.stage_name, clip_time));
        }
    }

    pub fn processed_frames(&self) -> u64 {
        self.processed_frames
    }

    /// Gets the processing speed (frames per second)
    pub fn processing_fps(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.processed_frames as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Finishes the bar and logs a one-line stage summary
    pub fn finish(&self) {
        self.progress_bar.finish_and_clear();
        info!(
            stage = self.stage_name,
            frames = self.processed_frames,
            clip = %format_duration(self.processed_frames as f64 / self.frame_rate),
            elapsed = %format_duration(self.start_time.elapsed().as_secs_f64()),
            fps = %format!("{:.1}", self.processing_fps()),
            "stage complete"
        );
    }
}

/// Formats a duration in seconds to h:mm:ss format
fn format_duration(seconds: f64) -> String {
    let total_seconds = seconds as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(90.0), "1:30");
        assert_eq!(format_duration(3661.0), "1:01:01");
    }

    #[test]
    fn test_hidden_progress_counts_frames() {
        let mut progress = StageProgress::new(3, 24.0, "test", false);
        progress.update_frame();
        progress.update_frame();
        assert_eq!(progress.processed_frames(), 2);
        progress.finish();
    }
}
