//! Live preview of a single instrument note.

use ts_ir::{ChannelFrames, FrameEvaluator, Instrument, CHANNEL_COUNT};

use crate::source::FrameSource;

/// One instrument playing one note on one channel, evaluated against the
/// instrument as it is when each frame is pulled.
#[derive(Clone, Copy, Debug)]
pub struct NotePreview<'a> {
    evaluator: FrameEvaluator<'a>,
    channel: usize,
}

impl<'a> NotePreview<'a> {
    /// Preview on channel 0.
    pub fn new(instrument: &'a Instrument, base_frequency: f64) -> Self {
        Self::on_channel(instrument, base_frequency, 0)
    }

    /// Preview on a specific channel. Channels past the last one wrap.
    pub fn on_channel(instrument: &'a Instrument, base_frequency: f64, channel: usize) -> Self {
        Self {
            evaluator: instrument.evaluator(base_frequency),
            channel: channel % CHANNEL_COUNT,
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn base_frequency(&self) -> f64 {
        self.evaluator.base_frequency()
    }
}

impl FrameSource for NotePreview<'_> {
    fn next_frame(&mut self, frame: u32) -> ChannelFrames {
        let mut frames = [None; CHANNEL_COUNT];
        frames[self.channel] = Some(self.evaluator.evaluate(frame));
        frames
    }
}
