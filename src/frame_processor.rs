use anyhow::Result;

use crate::context::JobContext;
use crate::progress::StageProgress;
use crate::tracks::{FrameTracks, TrackTable};

/// Base trait for pipeline stages that annotate the track table one frame at a time
pub trait FrameProcessor {
    /// Name shown in progress output and logs
    fn stage_name(&self) -> &'static str;

    /// Runs the stage over every frame in order
    fn process_frames(&mut self, ctx: &mut JobContext, tracks: &mut TrackTable) -> Result<()> {
        let mut progress = StageProgress::new(
            tracks.len() as u64,
            ctx.fps(),
            self.stage_name(),
            ctx.config.show_progress,
        );

        for (frame_index, frame) in tracks.frames.iter_mut().enumerate() {
            self.process_frame(ctx, frame_index, frame)?;
            progress.update_frame();
        }

        progress.finish();
        Ok(())
    }

    /// Annotates a single frame (to be implemented by concrete stages)
    fn process_frame(
        &mut self,
        ctx: &mut JobContext,
        frame_index: usize,
        frame: &mut FrameTracks,
    ) -> Result<()>;
}
