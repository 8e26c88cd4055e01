//! The pull interface between the synthesizer and whatever sequences it.

use ts_ir::ChannelFrames;

/// Produces one tick of channel data on demand.
///
/// The synthesizer calls `next_frame` exactly once per frame boundary,
/// passing the number of frames pulled since the last restart.
/// Implementations run on the audio thread and must not allocate.
pub trait FrameSource {
    fn next_frame(&mut self, frame: u32) -> ChannelFrames;
}

impl<F> FrameSource for F
where
    F: FnMut(u32) -> ChannelFrames,
{
    fn next_frame(&mut self, frame: u32) -> ChannelFrames {
        self(frame)
    }
}
